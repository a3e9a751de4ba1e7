use bson::serde_helpers::{chrono_datetime_as_bson_datetime, uuid_1_as_binary};
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{
    Lesson, LessonCandidate, LessonFilter, LessonPatch, LessonStatus, StudentId, TeacherId,
    ValidationError, LESSON_COLLECTION_NAME,
};
use crate::middleware::paging::PageState;

#[derive(Debug, Error)]
pub enum LessonError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("lesson '{0}' doesn't exist")]
    NotFound(Uuid),
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
}

pub mod problem {
    use crate::data::lesson::ValidationError;
    use crate::resp::problem::Problem;
    use rocket::http::Status;
    use uuid::Uuid;

    #[inline]
    pub fn invalid_lesson(error: ValidationError) -> Problem {
        Problem::new_untyped(Status::UnprocessableEntity, "Invalid lesson.")
            .insert_str("field", error.field)
            .insert_str("reason", error.reason)
            .detail(error)
            .to_owned()
    }

    #[inline]
    pub fn not_found(id: Uuid) -> Problem {
        Problem::new_untyped(Status::NotFound, "Lesson doesn't exist.")
            .insert_str("id", id)
            .clone()
    }
}

/// Storage of lesson records.
///
/// Every write validates first; nothing is stored when validation fails.
#[rocket::async_trait]
pub trait LessonRepository: Send + Sync {
    /// Validates `candidate` and stores it as a new lesson with fresh
    /// timestamps.
    async fn validate_and_persist(&self, candidate: LessonCandidate) -> Result<Lesson, LessonError>;

    async fn get(&self, id: Uuid) -> Result<Option<Lesson>, LessonError>;

    /// Lessons matching `filter`, ordered by date.
    async fn list(&self, filter: &LessonFilter, page: PageState)
        -> Result<Vec<Lesson>, LessonError>;

    /// Merges `patch` into the stored lesson and validates the result.
    async fn update(&self, id: Uuid, patch: LessonPatch) -> Result<Lesson, LessonError>;

    async fn set_status(&self, id: Uuid, status: String) -> Result<Lesson, LessonError> {
        self.update(
            id,
            LessonPatch {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    /// Adds `student` to the roster unless already present.
    async fn add_student(&self, id: Uuid, student: StudentId) -> Result<Lesson, LessonError>;

    async fn remove_student(&self, id: Uuid, student: StudentId) -> Result<Lesson, LessonError>;

    /// Removes the lesson. Referenced teachers and students are left alone.
    async fn delete(&self, id: Uuid) -> Result<Option<Lesson>, LessonError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LessonDocument {
    #[serde(rename = "_id", with = "uuid_1_as_binary")]
    id: Uuid,
    title: String,
    subject: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    date: DateTime<Utc>,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    teacher_id: Option<bson::Uuid>,
    teacher_email: String,
    #[serde(default)]
    status: LessonStatus,
    #[serde(default)]
    students: Vec<bson::Uuid>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl From<Lesson> for LessonDocument {
    fn from(value: Lesson) -> Self {
        LessonDocument {
            id: value.id,
            title: value.title,
            subject: value.subject,
            date: value.date,
            description: value.description,
            teacher_id: value.teacher_id.map(|it| bson::Uuid::from_uuid_1(it.0)),
            teacher_email: value.teacher_email,
            status: value.status,
            students: value
                .students
                .into_iter()
                .map(|it| bson::Uuid::from_uuid_1(it.0))
                .collect(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<LessonDocument> for Lesson {
    fn from(value: LessonDocument) -> Self {
        Lesson {
            id: value.id,
            title: value.title,
            subject: value.subject,
            date: value.date,
            description: value.description,
            teacher_id: value.teacher_id.map(|it| TeacherId(it.to_uuid_1())),
            teacher_email: value.teacher_email,
            status: value.status,
            students: value
                .students
                .into_iter()
                .map(|it| StudentId(it.to_uuid_1()))
                .collect(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

mod filter {
    use super::*;

    #[inline]
    pub fn by_id(id: Uuid) -> Document {
        doc! { "_id": bson::Uuid::from_uuid_1(id) }
    }

    pub fn listing(filter: &LessonFilter) -> Document {
        let mut document = Document::new();
        if let Some(email) = &filter.teacher_email {
            document.insert("teacherEmail", email.as_str());
        }
        if let Some(status) = filter.status {
            document.insert("status", status.as_str());
        }
        document
    }
}

/// [`LessonRepository`] backed by a MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoLessons {
    db: Database,
}

impl MongoLessons {
    pub fn new(db: Database) -> MongoLessons {
        MongoLessons { db }
    }

    fn collection(&self) -> Collection<LessonDocument> {
        self.db.collection(LESSON_COLLECTION_NAME)
    }

    /// Creates the index used by teacher schedule listings.
    pub async fn ensure_indexes(&self) -> Result<(), LessonError> {
        let index = IndexModel::builder()
            .keys(doc! { "teacherEmail": 1, "date": 1 })
            .options(
                IndexOptions::builder()
                    .name("teacher_schedule".to_string())
                    .build(),
            )
            .build();
        self.collection().create_index(index, None).await?;
        Ok(())
    }

    async fn modify_roster(&self, id: Uuid, update: Document) -> Result<Lesson, LessonError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection()
            .find_one_and_update(filter::by_id(id), update, options)
            .await?
            .map(Lesson::from)
            .ok_or(LessonError::NotFound(id))
    }
}

#[rocket::async_trait]
impl LessonRepository for MongoLessons {
    async fn validate_and_persist(&self, candidate: LessonCandidate) -> Result<Lesson, LessonError> {
        let lesson = Lesson::create(candidate.validate()?, Utc::now());

        self.collection()
            .insert_one(LessonDocument::from(lesson.clone()), None)
            .await?;
        tracing::info!("Stored lesson {} for {}", lesson.id, lesson.teacher_email);

        Ok(lesson)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Lesson>, LessonError> {
        Ok(self
            .collection()
            .find_one(filter::by_id(id), None)
            .await?
            .map(Lesson::from))
    }

    async fn list(
        &self,
        filter: &LessonFilter,
        page: PageState,
    ) -> Result<Vec<Lesson>, LessonError> {
        let options = FindOptions::builder()
            .sort(doc! { "date": 1, "_id": 1 })
            .skip(page.offset())
            .limit(i64::from(page.page_length))
            .build();

        let documents: Vec<LessonDocument> = self
            .collection()
            .find(filter::listing(filter), options)
            .await?
            .try_collect()
            .await?;

        Ok(documents.into_iter().map(Lesson::from).collect())
    }

    async fn update(&self, id: Uuid, patch: LessonPatch) -> Result<Lesson, LessonError> {
        let mut lesson = self.get(id).await?.ok_or(LessonError::NotFound(id))?;
        let fields = LessonCandidate::from(lesson.clone()).merge(patch).validate()?;
        lesson.revise(fields, Utc::now());

        let replaced = self
            .collection()
            .replace_one(filter::by_id(id), LessonDocument::from(lesson.clone()), None)
            .await?;
        if replaced.matched_count == 0 {
            return Err(LessonError::NotFound(id));
        }

        Ok(lesson)
    }

    async fn add_student(&self, id: Uuid, student: StudentId) -> Result<Lesson, LessonError> {
        self.modify_roster(
            id,
            doc! {
                "$addToSet": { "students": bson::Uuid::from_uuid_1(student.0) },
                "$max": { "updatedAt": bson::DateTime::from_chrono(Utc::now()) },
            },
        )
        .await
    }

    async fn remove_student(&self, id: Uuid, student: StudentId) -> Result<Lesson, LessonError> {
        self.modify_roster(
            id,
            doc! {
                "$pull": { "students": bson::Uuid::from_uuid_1(student.0) },
                "$max": { "updatedAt": bson::DateTime::from_chrono(Utc::now()) },
            },
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Lesson>, LessonError> {
        let removed = self
            .collection()
            .find_one_and_delete(filter::by_id(id), None)
            .await?;
        if removed.is_some() {
            tracing::info!("Deleted lesson {}", id);
        }

        Ok(removed.map(Lesson::from))
    }
}
