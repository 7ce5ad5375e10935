//! # Libro de Temas 웹 서버 진입점
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. 설정에 따라 저장소 선택 (로컬 JSON 파일 또는 관계형 DB)
//! 4. 부트스트랩 관리자 계정 생성
//! 5. API 라우터 설정
//! 6. HTTP 서버 시작

use anyhow::Result;
use libro_temas::{
    config::Config,
    routes::{self, AppState},
    storage::{self, DeviceSession},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    // RUST_LOG가 없으면 이 크레이트와 tower_http를 debug 레벨로 출력합니다.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "libro_temas=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── 3단계: 설정 로딩과 저장소 선택 ──
    let config = Config::from_env();
    tracing::info!("Starting Libro de Temas server on {}:{}", config.host, config.port);

    // 관계형 저장소 연결에 실패해도 서버는 뜹니다 (쓰기는 503).
    let storage = storage::connect(&config.storage).await;
    let device = DeviceSession::new(&config.local_data_dir);

    // ── 4단계: 부트스트랩 관리자 ──
    // 실패해도 서버는 계속 시작합니다.
    match storage.initialize_data().await {
        Ok(true) => tracing::info!("Bootstrap admin created"),
        Ok(false) => {}
        Err(e) => tracing::warn!("Could not initialize data: {}", e),
    }

    // ── 5단계: 라우터 ──
    let app = routes::app(AppState { storage, device });

    // ── 6단계: 서버 시작 ──
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
