//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 관계형 저장소(`storage::RelationalStorage`)가 호출하는 SQL 함수들입니다.
//! 모든 함수는 `&SqlitePool`을 빌려 쓰고 `AppError`를 반환합니다.
//!
//! 각 하위 모듈:
//! - `users`: 사용자 CRUD
//! - `subjects`: 과목과 전공 CRUD
//! - `courses`: 과정 CRUD (이름은 트리거가 계산)
//! - `assignments`: 과목-과정 연결, 교사 할당
//! - `logbooks`: 기록부와 수업 목록
//!
//! 대부분의 수정/삭제 함수는 영향받은 행 수를 반환합니다.
//! 0이면 호출하는 쪽에서 `NotFound`로 바꿉니다.

pub mod assignments;
pub mod courses;
pub mod logbooks;
pub mod subjects;
pub mod users;
