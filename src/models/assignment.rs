use serde::{Deserialize, Serialize};

/// 과정에서 가르치는 과목 (다대다 연결)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectCourse {
    pub id: String,
    pub subject_id: String,
    pub course_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubjectCourse {
    pub subject_id: String,
    pub course_id: String,
}

/// 과정의 과목에 할당된 교사
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSubject {
    pub id: String,
    pub teacher_id: String,
    pub subject_id: String,
    pub course_id: String,
    pub created_at: String,
}

impl TeacherSubject {
    pub fn assignment_key(&self) -> AssignmentKey {
        AssignmentKey {
            subject_id: self.subject_id.clone(),
            course_id: self.course_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeacherSubject {
    pub teacher_id: String,
    pub subject_id: String,
    pub course_id: String,
}

/// 교사 할당의 (과목, 과정) 쌍. 교사는 편집 대상으로 정해져 있습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentKey {
    pub subject_id: String,
    pub course_id: String,
}

/// `PUT /api/v1/courses/{id}/subjects`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSubjectsRequest {
    pub subject_ids: Vec<String>,
}

/// `PUT /api/v1/teachers/{id}/assignments`
#[derive(Debug, Deserialize)]
pub struct TeacherAssignmentsRequest {
    pub assignments: Vec<AssignmentKey>,
}

/// `POST /api/v1/teacher-subjects/bulk-delete`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherBulkDeleteRequest {
    pub teacher_ids: Vec<String>,
}
