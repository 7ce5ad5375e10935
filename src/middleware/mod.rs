//! # 요청 추출기(Extractor)
//!
//! - `auth`: 현재 사용자(`CurrentUser`)와 역할별 추출기(`AdminUser`, `DirectorUser`, `TeacherUser`)

pub mod auth;
