//! # 서비스 계층
//!
//! 라우트 핸들러와 저장소 사이의 업무 규칙을 모아둔 모듈입니다.
//!
//! - `auth`: 비밀번호 해싱, 로그인/로그아웃, 사용자 생성/수정
//! - `guards`: 입력 검증과 자연키 중복 검사
//! - `sync`: 과정-과목, 교사-할당 동기화
//! - `verification`: 수업 기록, 교사/교장 검증, 대시보드 조회
//! - `export`: 기록부 xlsx 내보내기

pub mod auth;
pub mod export;
pub mod guards;
pub mod sync;
pub mod verification;
