use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;
pub mod memory;

pub static LESSON_COLLECTION_NAME: &str = "lessons";

/// Timestamps are stored as BSON datetimes, which only hold milliseconds.
pub fn store_precision(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(3)
}

/// Subjects currently taught. [`Lesson::subject`] accepts any other text too.
pub const KNOWN_SUBJECTS: [&str; 3] = ["ISL", "Mathematics", "Science"];

/// Identifier of a teacher document. Lessons only point at teachers, they
/// never own them.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TeacherId(pub Uuid);

/// Identifier of a student document.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct StudentId(pub Uuid);

#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum LessonStatus {
    #[default]
    Upcoming,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl LessonStatus {
    pub const ALL: [LessonStatus; 3] = [
        LessonStatus::Upcoming,
        LessonStatus::InProgress,
        LessonStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LessonStatus::Upcoming => "Upcoming",
            LessonStatus::InProgress => "In Progress",
            LessonStatus::Completed => "Completed",
        }
    }
}

impl Display for LessonStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        LessonStatus::ALL
            .into_iter()
            .find(|it| it.as_str() == value)
            .ok_or(ValidationError::new("status", ValidationReason::InvalidEnum))
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    Required,
    InvalidEnum,
    InvalidDate,
}

impl ValidationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationReason::Required => "required",
            ValidationReason::InvalidEnum => "invalid_enum",
            ValidationReason::InvalidDate => "invalid_date",
        }
    }
}

impl Display for ValidationReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names the lesson field that was rejected and why.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error, Serialize)]
#[error("lesson field '{field}' is invalid: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: ValidationReason) -> ValidationError {
        ValidationError { field, reason }
    }

    #[inline]
    pub fn required(field: &'static str) -> ValidationError {
        ValidationError::new(field, ValidationReason::Required)
    }
}

/// Unchecked lesson data as it arrives from a client.
///
/// Everything is optional and `date`/`status` are plain text so that bad
/// values get reported as [`ValidationError`]s instead of parse failures.
/// The same shape doubles as a partial update, see [`LessonCandidate::merge`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonCandidate {
    pub title: Option<String>,
    pub subject: Option<String>,
    /// RFC 3339 timestamp.
    pub date: Option<String>,
    pub description: Option<String>,
    /// `null` clears the teacher, a missing key keeps it.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<TeacherId>)]
    pub teacher_id: Option<Option<TeacherId>>,
    pub teacher_email: Option<String>,
    pub status: Option<String>,
    pub students: Option<Vec<StudentId>>,
}

/// Marks a key that was sent, even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub type LessonPatch = LessonCandidate;

/// Lesson data that passed validation, without store managed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonFields {
    pub title: String,
    pub subject: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub teacher_id: Option<TeacherId>,
    pub teacher_email: String,
    pub status: LessonStatus,
    pub students: Vec<StudentId>,
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        Some(it) if !it.is_empty() => Ok(it),
        _ => Err(ValidationError::required(field)),
    }
}

impl LessonCandidate {
    /// Checks required fields in declaration order, then the status value.
    pub fn validate(self) -> Result<LessonFields, ValidationError> {
        let title = required("title", self.title)?;
        let subject = required("subject", self.subject)?;
        let date = required("date", self.date)?;
        let date = DateTime::parse_from_rfc3339(&date)
            .map(|it| store_precision(it.with_timezone(&Utc)))
            .map_err(|_| ValidationError::new("date", ValidationReason::InvalidDate))?;
        let teacher_email = required("teacherEmail", self.teacher_email)?;

        let status = match self.status {
            Some(status) => status.parse::<LessonStatus>()?,
            None => LessonStatus::default(),
        };

        Ok(LessonFields {
            title,
            subject,
            date,
            description: self.description.unwrap_or_default(),
            teacher_id: self.teacher_id.flatten(),
            teacher_email,
            status,
            students: self.students.unwrap_or_default(),
        })
    }

    /// Overlays every field `patch` sets on top of `self`.
    pub fn merge(self, patch: LessonPatch) -> LessonCandidate {
        LessonCandidate {
            title: patch.title.or(self.title),
            subject: patch.subject.or(self.subject),
            date: patch.date.or(self.date),
            description: patch.description.or(self.description),
            teacher_id: patch.teacher_id.or(self.teacher_id),
            teacher_email: patch.teacher_email.or(self.teacher_email),
            status: patch.status.or(self.status),
            students: patch.students.or(self.students),
        }
    }
}

/// A scheduled class session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    pub teacher_email: String,
    #[serde(default)]
    pub status: LessonStatus,
    #[serde(default)]
    pub students: Vec<StudentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lesson {
    pub fn create(fields: LessonFields, now: DateTime<Utc>) -> Lesson {
        let id = Uuid::new_v4();
        let now = store_precision(now);
        tracing::debug!("Creating a new lesson with UUID: {}", id);

        Lesson {
            id,
            title: fields.title,
            subject: fields.subject,
            date: fields.date,
            description: fields.description,
            teacher_id: fields.teacher_id,
            teacher_email: fields.teacher_email,
            status: fields.status,
            students: fields.students,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces all user editable fields and bumps `updated_at`.
    pub fn revise(&mut self, fields: LessonFields, now: DateTime<Utc>) {
        self.title = fields.title;
        self.subject = fields.subject;
        self.date = fields.date;
        self.description = fields.description;
        self.teacher_id = fields.teacher_id;
        self.teacher_email = fields.teacher_email;
        self.status = fields.status;
        self.students = fields.students;
        self.touch(now);
    }

    /// `updated_at` never moves before `created_at`, even with a lagging clock.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = store_precision(now).max(self.created_at);
    }
}

impl From<Lesson> for LessonCandidate {
    fn from(value: Lesson) -> Self {
        LessonCandidate {
            title: Some(value.title),
            subject: Some(value.subject),
            date: Some(value.date.to_rfc3339()),
            description: Some(value.description),
            teacher_id: Some(value.teacher_id),
            teacher_email: Some(value.teacher_email),
            status: Some(value.status.to_string()),
            students: Some(value.students),
        }
    }
}

/// Narrows lesson listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonFilter {
    pub teacher_email: Option<String>,
    pub status: Option<LessonStatus>,
}

impl LessonFilter {
    pub fn matches(&self, lesson: &Lesson) -> bool {
        self.teacher_email
            .as_ref()
            .map_or(true, |email| &lesson.teacher_email == email)
            && self.status.map_or(true, |status| lesson.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn example_candidate() -> LessonCandidate {
        LessonCandidate {
            title: Some("Fingerspelling basics".to_string()),
            subject: Some("ISL".to_string()),
            date: Some("2026-11-02T10:00:00Z".to_string()),
            teacher_email: Some("teacher@example.com".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn missing_required_fields_are_named() {
        let cases: [(&str, fn(&mut LessonCandidate)); 4] = [
            ("title", |c| c.title = None),
            ("subject", |c| c.subject = None),
            ("date", |c| c.date = None),
            ("teacherEmail", |c| c.teacher_email = None),
        ];

        for (field, strip) in cases {
            let mut candidate = example_candidate();
            strip(&mut candidate);
            assert_eq!(
                candidate.validate(),
                Err(ValidationError::required(field)),
                "missing {} should be rejected",
                field
            );
        }
    }

    #[test]
    fn empty_required_text_is_missing() {
        let mut candidate = example_candidate();
        candidate.title = Some(String::new());
        assert_eq!(candidate.validate(), Err(ValidationError::required("title")));

        let mut candidate = example_candidate();
        candidate.teacher_email = Some(String::new());
        assert_eq!(
            candidate.validate(),
            Err(ValidationError::required("teacherEmail"))
        );
    }

    #[test]
    fn unknown_status_is_invalid_enum() {
        for status in ["Cancelled", "upcoming", "InProgress", ""] {
            let mut candidate = example_candidate();
            candidate.status = Some(status.to_string());
            assert_eq!(
                candidate.validate(),
                Err(ValidationError::new("status", ValidationReason::InvalidEnum)),
                "'{}' isn't a lesson status",
                status
            );
        }
    }

    #[test]
    fn known_statuses_are_accepted() {
        for status in LessonStatus::ALL {
            let mut candidate = example_candidate();
            candidate.status = Some(status.to_string());
            let fields = candidate.validate().expect("status should be accepted");
            assert_eq!(fields.status, status);
        }
    }

    #[test]
    fn malformed_date_is_rejected() {
        let mut candidate = example_candidate();
        candidate.date = Some("next tuesday".to_string());
        assert_eq!(
            candidate.validate(),
            Err(ValidationError::new("date", ValidationReason::InvalidDate))
        );
    }

    #[test]
    fn defaults_are_applied() {
        let fields = example_candidate().validate().expect("valid candidate");
        assert_eq!(fields.status, LessonStatus::Upcoming);
        assert_eq!(fields.description, "");
        assert!(fields.students.is_empty());
        assert_eq!(fields.teacher_id, None);
    }

    #[test]
    fn subject_is_open_text() {
        let mut candidate = example_candidate();
        candidate.subject = Some("Music".to_string());
        assert!(!KNOWN_SUBJECTS.contains(&"Music"));
        assert_eq!(candidate.validate().map(|it| it.subject), Ok("Music".to_string()));
    }

    #[test]
    fn status_serializes_as_display_text() {
        let json = serde_json::to_string(&LessonStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let parsed: LessonStatus = serde_json::from_str("\"Completed\"").unwrap();
        assert_eq!(parsed, LessonStatus::Completed);
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let patch = LessonPatch {
            description: Some("Bring notebooks".to_string()),
            ..Default::default()
        };
        let merged = example_candidate().merge(patch);
        assert_eq!(merged.title.as_deref(), Some("Fingerspelling basics"));
        assert_eq!(merged.description.as_deref(), Some("Bring notebooks"));
    }

    #[test]
    fn merge_can_clear_teacher() {
        let teacher = TeacherId(Uuid::new_v4());
        let stored = LessonCandidate {
            teacher_id: Some(Some(teacher)),
            ..example_candidate()
        };

        let kept: LessonPatch = serde_json::from_str(r#"{"title": "Numbers"}"#).unwrap();
        assert_eq!(kept.teacher_id, None);
        let fields = stored.clone().merge(kept).validate().unwrap();
        assert_eq!(fields.teacher_id, Some(teacher));

        let cleared: LessonPatch = serde_json::from_str(r#"{"teacherId": null}"#).unwrap();
        assert_eq!(cleared.teacher_id, Some(None));
        let fields = stored.merge(cleared).validate().unwrap();
        assert_eq!(fields.teacher_id, None);
    }

    #[test]
    fn timestamps_keep_millisecond_precision() {
        let now = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()
            + Duration::nanoseconds(927_624_736);
        let mut candidate = example_candidate();
        candidate.date = Some("2026-11-02T10:00:00.123456Z".to_string());

        let mut lesson = Lesson::create(candidate.validate().unwrap(), now);
        assert_eq!(lesson.date.timestamp_subsec_nanos(), 123_000_000);
        assert_eq!(lesson.created_at.timestamp_subsec_nanos(), 927_000_000);
        assert_eq!(lesson.created_at, lesson.updated_at);

        lesson.touch(now + Duration::nanoseconds(500_001));
        assert_eq!(lesson.updated_at.timestamp_subsec_nanos(), 928_000_000);
    }

    #[test]
    fn touch_never_precedes_creation() {
        let created = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();
        let mut lesson = Lesson::create(example_candidate().validate().unwrap(), created);
        assert_eq!(lesson.created_at, lesson.updated_at);

        lesson.touch(created - Duration::minutes(5));
        assert_eq!(lesson.updated_at, created);

        lesson.touch(created + Duration::minutes(5));
        assert_eq!(lesson.updated_at, created + Duration::minutes(5));
        assert_eq!(lesson.created_at, created);
    }

    #[test]
    fn lesson_round_trips_through_candidate() {
        let now = Utc::now();
        let lesson = Lesson::create(example_candidate().validate().unwrap(), now);
        let fields = LessonCandidate::from(lesson.clone()).validate().unwrap();
        assert_eq!(fields.date, lesson.date);
        assert_eq!(fields.title, lesson.title);
    }
}
