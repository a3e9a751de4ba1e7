use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::db::{LessonError, LessonRepository};
use super::{Lesson, LessonCandidate, LessonFilter, LessonPatch, StudentId};
use crate::middleware::paging::PageState;

/// Process local [`LessonRepository`]. Contents are lost on shutdown.
#[derive(Debug, Default)]
pub struct MemoryLessons {
    lessons: RwLock<HashMap<Uuid, Lesson>>,
}

impl MemoryLessons {
    pub async fn len(&self) -> usize {
        self.lessons.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lessons.read().await.is_empty()
    }

    async fn modify<F>(&self, id: Uuid, change: F) -> Result<Lesson, LessonError>
    where
        F: FnOnce(&mut Lesson) + Send,
    {
        let mut lessons = self.lessons.write().await;
        let lesson = lessons.get_mut(&id).ok_or(LessonError::NotFound(id))?;
        change(lesson);
        lesson.touch(Utc::now());
        Ok(lesson.clone())
    }
}

#[rocket::async_trait]
impl LessonRepository for MemoryLessons {
    async fn validate_and_persist(&self, candidate: LessonCandidate) -> Result<Lesson, LessonError> {
        let lesson = Lesson::create(candidate.validate()?, Utc::now());
        self.lessons.write().await.insert(lesson.id, lesson.clone());
        Ok(lesson)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Lesson>, LessonError> {
        Ok(self.lessons.read().await.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: &LessonFilter,
        page: PageState,
    ) -> Result<Vec<Lesson>, LessonError> {
        let lessons = self.lessons.read().await;
        let mut matching: Vec<&Lesson> = lessons.values().filter(|it| filter.matches(it)).collect();
        matching.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

        Ok(matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.page_length as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, patch: LessonPatch) -> Result<Lesson, LessonError> {
        let mut lessons = self.lessons.write().await;
        let lesson = lessons.get_mut(&id).ok_or(LessonError::NotFound(id))?;

        let fields = LessonCandidate::from(lesson.clone()).merge(patch).validate()?;
        lesson.revise(fields, Utc::now());

        Ok(lesson.clone())
    }

    async fn add_student(&self, id: Uuid, student: StudentId) -> Result<Lesson, LessonError> {
        self.modify(id, |lesson| {
            if !lesson.students.contains(&student) {
                lesson.students.push(student);
            }
        })
        .await
    }

    async fn remove_student(&self, id: Uuid, student: StudentId) -> Result<Lesson, LessonError> {
        self.modify(id, |lesson| lesson.students.retain(|it| it != &student))
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Lesson>, LessonError> {
        Ok(self.lessons.write().await.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::lesson::{LessonStatus, ValidationError, ValidationReason};

    fn candidate(title: &str, date: &str, teacher: &str) -> LessonCandidate {
        LessonCandidate {
            title: Some(title.to_string()),
            subject: Some("Science".to_string()),
            date: Some(date.to_string()),
            teacher_email: Some(teacher.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn persist_assigns_id_and_timestamps() {
        let store = MemoryLessons::default();
        let lesson = store
            .validate_and_persist(candidate("Plants", "2026-11-04T08:00:00Z", "a@example.com"))
            .await
            .expect("valid lesson");

        assert_eq!(lesson.created_at, lesson.updated_at);
        assert_eq!(lesson.status, LessonStatus::Upcoming);
        assert_eq!(store.get(lesson.id).await.unwrap(), Some(lesson));
    }

    #[tokio::test]
    async fn invalid_candidate_is_not_stored() {
        let store = MemoryLessons::default();
        let mut invalid = candidate("Plants", "2026-11-04T08:00:00Z", "a@example.com");
        invalid.status = Some("Postponed".to_string());

        let result = store.validate_and_persist(invalid).await;
        assert!(matches!(
            result,
            Err(LessonError::Validation(ValidationError {
                field: "status",
                reason: ValidationReason::InvalidEnum
            }))
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn update_keeps_created_at_and_refreshes_updated_at() {
        let store = MemoryLessons::default();
        let lesson = store
            .validate_and_persist(candidate("Plants", "2026-11-04T08:00:00Z", "a@example.com"))
            .await
            .unwrap();

        let updated = store
            .set_status(lesson.id, "In Progress".to_string())
            .await
            .unwrap();
        assert_eq!(updated.status, LessonStatus::InProgress);
        assert_eq!(updated.created_at, lesson.created_at);
        assert!(updated.updated_at >= lesson.updated_at);
        assert!(updated.updated_at >= updated.created_at);
        assert_eq!(updated.title, "Plants");
    }

    #[tokio::test]
    async fn update_revalidates_merged_lesson() {
        let store = MemoryLessons::default();
        let lesson = store
            .validate_and_persist(candidate("Plants", "2026-11-04T08:00:00Z", "a@example.com"))
            .await
            .unwrap();

        let patch = LessonPatch {
            title: Some(String::new()),
            ..Default::default()
        };
        let result = store.update(lesson.id, patch).await;
        assert!(matches!(
            result,
            Err(LessonError::Validation(ValidationError { field: "title", .. }))
        ));
        assert_eq!(store.get(lesson.id).await.unwrap(), Some(lesson));
    }

    #[tokio::test]
    async fn update_of_unknown_lesson_is_not_found() {
        let store = MemoryLessons::default();
        let id = Uuid::new_v4();
        let result = store.update(id, LessonPatch::default()).await;
        assert!(matches!(result, Err(LessonError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn roster_changes_keep_order_and_skip_duplicates() {
        let store = MemoryLessons::default();
        let lesson = store
            .validate_and_persist(candidate("Plants", "2026-11-04T08:00:00Z", "a@example.com"))
            .await
            .unwrap();
        let (first, second) = (StudentId(Uuid::new_v4()), StudentId(Uuid::new_v4()));

        store.add_student(lesson.id, first).await.unwrap();
        store.add_student(lesson.id, second).await.unwrap();
        let roster = store.add_student(lesson.id, first).await.unwrap();
        assert_eq!(roster.students, vec![first, second]);

        let roster = store.remove_student(lesson.id, first).await.unwrap();
        assert_eq!(roster.students, vec![second]);
        assert!(roster.updated_at >= roster.created_at);
    }

    #[tokio::test]
    async fn list_filters_sorts_and_pages() {
        let store = MemoryLessons::default();
        for (title, date, teacher) in [
            ("Third", "2026-11-06T08:00:00Z", "a@example.com"),
            ("First", "2026-11-04T08:00:00Z", "a@example.com"),
            ("Other", "2026-11-05T08:00:00Z", "b@example.com"),
            ("Second", "2026-11-05T08:00:00Z", "a@example.com"),
        ] {
            store
                .validate_and_persist(candidate(title, date, teacher))
                .await
                .unwrap();
        }

        let filter = LessonFilter {
            teacher_email: Some("a@example.com".to_string()),
            status: None,
        };
        let titles: Vec<String> = store
            .list(&filter, PageState::default())
            .await
            .unwrap()
            .into_iter()
            .map(|it| it.title)
            .collect();
        assert_eq!(titles, ["First", "Second", "Third"]);

        let page = PageState {
            page_length: 2,
            page: 1,
        };
        let rest = store.list(&filter, page).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].title, "Third");

        let completed = LessonFilter {
            teacher_email: None,
            status: Some(LessonStatus::Completed),
        };
        assert!(store
            .list(&completed, PageState::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn delete_returns_removed_lesson_once() {
        let store = MemoryLessons::default();
        let lesson = store
            .validate_and_persist(candidate("Plants", "2026-11-04T08:00:00Z", "a@example.com"))
            .await
            .unwrap();

        assert_eq!(store.delete(lesson.id).await.unwrap(), Some(lesson.clone()));
        assert_eq!(store.delete(lesson.id).await.unwrap(), None);
        assert_eq!(store.len().await, 0);
    }
}
