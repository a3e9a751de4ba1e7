use rocket::response::status::Created;
use rocket::serde::json::{self, Json};
use rocket::State;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::lesson::db::problem as lesson_problem;
use crate::data::lesson::{
    Lesson, LessonCandidate, LessonFilter, LessonPatch, LessonStatus, StudentId,
};
use crate::middleware::paging::PageState;
use crate::resp::problem::Problem;
use crate::Lessons;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StatusChange {
    /// One of "Upcoming", "In Progress" or "Completed".
    pub status: String,
}

/// List lessons ordered by date
#[utoipa::path(
    params(
        ("teacher", description = "only lessons of teacher with this email"),
        ("status", description = "only lessons with this status")
    ),
    responses(
        (status = 200, description = "Page of lessons", body = Vec<Lesson>),
        (status = 422, description = "Unknown status filter", body = Problem),
    )
)]
#[get("/lesson?<teacher>&<status>")]
#[tracing::instrument(skip(lessons))]
pub async fn lesson_list(
    teacher: Option<String>,
    status: Option<String>,
    page: PageState,
    lessons: &State<Lessons>,
) -> Result<Json<Vec<Lesson>>, Problem> {
    let filter = LessonFilter {
        teacher_email: teacher,
        status: status
            .map(|it| it.parse::<LessonStatus>())
            .transpose()
            .map_err(lesson_problem::invalid_lesson)?,
    };

    Ok(Json(lessons.list(&filter, page).await?))
}

/// Schedule a lesson
#[utoipa::path(
    request_body = LessonCandidate,
    responses(
        (status = 201, description = "Stored lesson", body = Lesson),
        (status = 422, description = "Lesson failed validation", body = Problem),
    )
)]
#[post("/lesson", format = "application/json", data = "<candidate>")]
#[tracing::instrument(skip(lessons))]
pub async fn lesson_create(
    candidate: Result<Json<LessonCandidate>, json::Error<'_>>,
    lessons: &State<Lessons>,
) -> Result<Created<Json<Lesson>>, Problem> {
    let lesson = lessons.validate_and_persist(candidate?.into_inner()).await?;
    let location = format!("/api/v1/lesson/{}", lesson.id);

    Ok(Created::new(location).body(Json(lesson)))
}

/// Get a lesson
#[utoipa::path(
    params(
        ("id", description = "lesson ID")
    ),
    responses(
        (status = 200, description = "Requested lesson", body = Lesson),
        (status = 404, description = "Lesson doesn't exist", body = Problem),
    )
)]
#[get("/lesson/<id>")]
#[tracing::instrument(skip(lessons))]
pub async fn lesson_info(id: Uuid, lessons: &State<Lessons>) -> Result<Json<Lesson>, Problem> {
    lessons
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| lesson_problem::not_found(id))
}

/// Edit a lesson
///
/// Fields missing from the body keep their stored values.
#[utoipa::path(
    params(
        ("id", description = "lesson ID")
    ),
    request_body = LessonCandidate,
    responses(
        (status = 200, description = "Updated lesson", body = Lesson),
        (status = 404, description = "Lesson doesn't exist", body = Problem),
        (status = 422, description = "Edited lesson failed validation", body = Problem),
    )
)]
#[put("/lesson/<id>", format = "application/json", data = "<patch>")]
#[tracing::instrument(skip(lessons))]
pub async fn lesson_update(
    id: Uuid,
    patch: Result<Json<LessonPatch>, json::Error<'_>>,
    lessons: &State<Lessons>,
) -> Result<Json<Lesson>, Problem> {
    Ok(Json(lessons.update(id, patch?.into_inner()).await?))
}

/// Change lesson status
#[utoipa::path(
    params(
        ("id", description = "lesson ID")
    ),
    request_body = StatusChange,
    responses(
        (status = 200, description = "Updated lesson", body = Lesson),
        (status = 404, description = "Lesson doesn't exist", body = Problem),
        (status = 422, description = "Unknown status", body = Problem),
    )
)]
#[put("/lesson/<id>/status", format = "application/json", data = "<change>")]
#[tracing::instrument(skip(lessons))]
pub async fn lesson_status(
    id: Uuid,
    change: Result<Json<StatusChange>, json::Error<'_>>,
    lessons: &State<Lessons>,
) -> Result<Json<Lesson>, Problem> {
    Ok(Json(lessons.set_status(id, change?.into_inner().status).await?))
}

/// Add a student to the lesson roster
#[utoipa::path(
    params(
        ("id", description = "lesson ID"),
        ("student", description = "student ID")
    ),
    responses(
        (status = 200, description = "Updated lesson", body = Lesson),
        (status = 404, description = "Lesson doesn't exist", body = Problem),
    )
)]
#[put("/lesson/<id>/students/<student>")]
#[tracing::instrument(skip(lessons))]
pub async fn lesson_add_student(
    id: Uuid,
    student: Uuid,
    lessons: &State<Lessons>,
) -> Result<Json<Lesson>, Problem> {
    Ok(Json(lessons.add_student(id, StudentId(student)).await?))
}

/// Remove a student from the lesson roster
#[utoipa::path(
    params(
        ("id", description = "lesson ID"),
        ("student", description = "student ID")
    ),
    responses(
        (status = 200, description = "Updated lesson", body = Lesson),
        (status = 404, description = "Lesson doesn't exist", body = Problem),
    )
)]
#[delete("/lesson/<id>/students/<student>")]
#[tracing::instrument(skip(lessons))]
pub async fn lesson_remove_student(
    id: Uuid,
    student: Uuid,
    lessons: &State<Lessons>,
) -> Result<Json<Lesson>, Problem> {
    Ok(Json(lessons.remove_student(id, StudentId(student)).await?))
}

/// Delete a lesson
#[utoipa::path(
    params(
        ("id", description = "lesson ID")
    ),
    responses(
        (status = 200, description = "ID of the deleted lesson", body = String),
        (status = 404, description = "Lesson doesn't exist", body = Problem),
    )
)]
#[delete("/lesson/<id>")]
#[tracing::instrument(skip(lessons))]
pub async fn lesson_delete(id: Uuid, lessons: &State<Lessons>) -> Result<String, Problem> {
    match lessons.delete(id).await? {
        Some(removed) => Ok(removed.id.to_string()),
        None => Err(lesson_problem::not_found(id)),
    }
}

///////////////////////
//       TESTS
///////////////////////
