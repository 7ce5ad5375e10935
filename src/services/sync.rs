//! # 할당 동기화
//!
//! 편집 화면에서 고른 "원하는 집합"과 저장된 연결 목록의 차이를 계산해
//! 필요한 삭제와 생성만 실행합니다.
//!
//! ```text
//! 저장됨 {A, B, C}   원함 {B, C, D}
//!        └── diff ──┘
//!   삭제: A   생성: D   (삭제 먼저, 그다음 생성)
//! ```
//!
//! 동기화는 트랜잭션이 아닙니다. 첫 실패에서 멈추고, 이미 적용된 단계는 되돌리지 않으며
//! `AppError::PartialSync`로 몇 단계가 적용됐는지 알려줍니다.

use std::{collections::HashSet, hash::Hash};

use crate::{
    error::AppError,
    models::{
        AssignmentKey, BatchDeleteReport, NewSubjectCourse, NewTeacherSubject, SubjectCourse,
        TeacherSubject, User, UserRole,
    },
    storage::Storage,
};

/// 동기화 결과를 메모리 컬렉션에 합치기 위해 ID를 꺼내는 트레이트
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for SubjectCourse {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for TeacherSubject {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug)]
pub struct LinkDiff<'a, T, K> {
    pub removed: Vec<&'a T>,
    pub added: Vec<K>,
}

/// 복합 키 기준으로 삭제할 연결과 새로 만들 키를 계산합니다.
///
/// `desired`의 중복 키는 한 번만 생성됩니다.
pub fn diff_links<'a, T, K, F>(original: &'a [T], desired: &[K], key_of: F) -> LinkDiff<'a, T, K>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let wanted: HashSet<&K> = desired.iter().collect();
    let existing: HashSet<K> = original.iter().map(&key_of).collect();

    let removed = original
        .iter()
        .filter(|link| !wanted.contains(&key_of(*link)))
        .collect();

    let mut seen = HashSet::new();
    let added = desired
        .iter()
        .filter(|k| !existing.contains(*k) && seen.insert(*k))
        .cloned()
        .collect();

    LinkDiff { removed, added }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport<T> {
    pub removed_ids: Vec<String>,
    pub created: Vec<T>,
}

impl<T> Default for SyncReport<T> {
    fn default() -> Self {
        Self {
            removed_ids: Vec::new(),
            created: Vec::new(),
        }
    }
}

impl<T: Identified + Clone> SyncReport<T> {
    /// 삭제된 항목을 빼고 생성된 항목을 더합니다. 한 번에 적용됩니다.
    pub fn apply(&self, collection: &mut Vec<T>) {
        let removed: HashSet<&str> = self.removed_ids.iter().map(String::as_str).collect();
        collection.retain(|item| !removed.contains(item.id()));
        collection.extend(self.created.iter().cloned());
    }

    fn partial(&self, err: AppError) -> AppError {
        tracing::error!(
            removed = self.removed_ids.len(),
            created = self.created.len(),
            error = %err,
            "assignment sync aborted"
        );
        AppError::PartialSync {
            removed: self.removed_ids.len(),
            created: self.created.len(),
            message: err.to_string(),
        }
    }
}

/// 과정에 연결된 과목을 `subject_ids` 집합과 같게 만듭니다.
pub async fn sync_course_subjects(
    storage: &dyn Storage,
    course_id: &str,
    subject_ids: &[String],
) -> Result<SyncReport<SubjectCourse>, AppError> {
    let courses = storage.get_courses().await?;
    if !courses.iter().any(|c| c.id == course_id) {
        return Err(AppError::NotFound("Curso".to_string()));
    }

    let original: Vec<SubjectCourse> = storage
        .get_subject_courses()
        .await?
        .into_iter()
        .filter(|l| l.course_id == course_id)
        .collect();
    let diff = diff_links(&original, subject_ids, |l: &SubjectCourse| l.subject_id.clone());

    let mut report = SyncReport::default();
    for link in diff.removed {
        if let Err(e) = storage.delete_subject_course(&link.id).await {
            return Err(report.partial(e));
        }
        report.removed_ids.push(link.id.clone());
    }
    for subject_id in diff.added {
        let input = NewSubjectCourse {
            subject_id,
            course_id: course_id.to_string(),
        };
        match storage.add_subject_course(input).await {
            Ok(created) => report.created.push(created),
            Err(e) => return Err(report.partial(e)),
        }
    }

    tracing::info!(
        course_id,
        removed = report.removed_ids.len(),
        created = report.created.len(),
        "course subjects synced"
    );
    Ok(report)
}

/// 사용자가 존재하고 `profesor` 역할인지 확인합니다.
pub async fn ensure_teacher(storage: &dyn Storage, teacher_id: &str) -> Result<User, AppError> {
    let user = storage
        .get_user(teacher_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profesor".to_string()))?;
    if user.role != UserRole::Profesor {
        return Err(AppError::Validation(
            "Solo se pueden asignar materias a profesores".to_string(),
        ));
    }
    Ok(user)
}

/// 교사의 (과목, 과정) 할당을 `desired` 집합과 같게 만듭니다.
///
/// 할당을 모두 없애는 편집은 거부됩니다.
pub async fn sync_teacher_assignments(
    storage: &dyn Storage,
    teacher_id: &str,
    desired: &[AssignmentKey],
) -> Result<SyncReport<TeacherSubject>, AppError> {
    if desired.is_empty() {
        return Err(AppError::Validation(
            "Sin asignaciones: seleccione al menos una materia y curso".to_string(),
        ));
    }
    ensure_teacher(storage, teacher_id).await?;

    let original: Vec<TeacherSubject> = storage
        .get_teacher_subjects()
        .await?
        .into_iter()
        .filter(|a| a.teacher_id == teacher_id)
        .collect();
    let diff = diff_links(&original, desired, TeacherSubject::assignment_key);

    let mut report = SyncReport::default();
    for assignment in diff.removed {
        if let Err(e) = storage.delete_teacher_subject(&assignment.id).await {
            return Err(report.partial(e));
        }
        report.removed_ids.push(assignment.id.clone());
    }
    for key in diff.added {
        let input = NewTeacherSubject {
            teacher_id: teacher_id.to_string(),
            subject_id: key.subject_id,
            course_id: key.course_id,
        };
        match storage.add_teacher_subject(input).await {
            Ok(created) => report.created.push(created),
            Err(e) => return Err(report.partial(e)),
        }
    }

    tracing::info!(
        teacher_id,
        removed = report.removed_ids.len(),
        created = report.created.len(),
        "teacher assignments synced"
    );
    Ok(report)
}

/// 주어진 교사들의 할당을 모두 지웁니다 (최선 노력).
pub async fn remove_teacher_assignments(
    storage: &dyn Storage,
    teacher_ids: &[String],
) -> Result<BatchDeleteReport, AppError> {
    let teachers: HashSet<&str> = teacher_ids.iter().map(String::as_str).collect();
    let ids: Vec<String> = storage
        .get_teacher_subjects()
        .await?
        .into_iter()
        .filter(|a| teachers.contains(a.teacher_id.as_str()))
        .map(|a| a.id)
        .collect();
    storage.delete_multiple_teacher_subjects(&ids).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: &str, subject_id: &str) -> SubjectCourse {
        SubjectCourse {
            id: id.into(),
            subject_id: subject_id.into(),
            course_id: "c1".into(),
            created_at: String::new(),
        }
    }

    #[test]
    fn diff_removes_missing_and_adds_new_keys() {
        let original = vec![link("1", "A"), link("2", "B"), link("3", "C")];
        let desired: Vec<String> = ["B", "C", "D", "D"].iter().map(|s| s.to_string()).collect();

        let diff = diff_links(&original, &desired, |l: &SubjectCourse| l.subject_id.clone());

        let removed: Vec<&str> = diff.removed.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(removed, vec!["1"]);
        assert_eq!(diff.added, vec!["D".to_string()]);
    }

    #[test]
    fn identical_sets_produce_no_steps() {
        let original = vec![link("1", "A")];
        let diff = diff_links(&original, &["A".to_string()], |l: &SubjectCourse| {
            l.subject_id.clone()
        });
        assert!(diff.removed.is_empty());
        assert!(diff.added.is_empty());
    }

    #[test]
    fn report_apply_merges_in_one_step() {
        let mut collection = vec![link("1", "A"), link("2", "B"), link("3", "C")];
        let report = SyncReport {
            removed_ids: vec!["1".to_string()],
            created: vec![link("4", "D")],
        };
        report.apply(&mut collection);

        let mut subjects: Vec<&str> = collection.iter().map(|l| l.subject_id.as_str()).collect();
        subjects.sort();
        assert_eq!(subjects, vec!["B", "C", "D"]);
    }
}
