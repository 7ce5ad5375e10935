//! # Libro de Temas 백엔드
//!
//! 학교의 수업 기록부(libro de temas)를 관리하는 서비스입니다.
//! 관리자는 사용자/과목/과정/할당을, 교사는 자신의 기록부를, 교장은 검증을 담당합니다.
//!
//! 바이너리(`main.rs`)와 통합 테스트(`tests/`)가 이 라이브러리를 함께 사용합니다.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
