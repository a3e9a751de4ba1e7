use std::collections::BTreeMap;

use rocket::{Build, Rocket, Route};

pub mod landing;
pub mod lesson;

use landing::*;
use lesson::*;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    data::lesson::{
        Lesson, LessonCandidate, LessonStatus, StudentId, TeacherId, ValidationReason,
    },
    resp::problem::{api_problem, Problem},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        lesson_list,
        lesson_create,
        lesson_info,
        lesson_update,
        lesson_status,
        lesson_add_student,
        lesson_remove_student,
        lesson_delete
    ),
    components(schemas(
        Lesson,
        LessonCandidate,
        LessonStatus,
        StatusChange,
        StudentId,
        TeacherId,
        ValidationReason,
        Problem
    )),
    modifiers(&V1_PREFIX)
)]
pub struct ApiDocV1;

pub struct PathPrefix(pub &'static str);
static V1_PREFIX: PathPrefix = PathPrefix("/api/v1");

impl utoipa::Modify for PathPrefix {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut new_paths = BTreeMap::new();

        for (path, item) in std::mem::take(&mut openapi.paths.paths) {
            new_paths.insert(self.0.to_string() + path.as_ref(), item);
        }

        openapi.paths.paths = new_paths;
    }
}

pub fn api_v1() -> Vec<Route> {
    routes![
        lesson_list,
        lesson_create,
        lesson_info,
        lesson_update,
        lesson_status,
        lesson_add_student,
        lesson_remove_student,
        lesson_delete
    ]
}

pub fn mount_api(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/api/v1", api_v1())
        .register("/api/v1", catchers![api_problem])
        .mount(
            "/",
            SwaggerUi::new("/swagger/<_..>").url("/api/v1/openapi.json", ApiDocV1::openapi()),
        )
        .mount("/", routes![landing_page, app_path])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_paths_are_prefixed() {
        let doc = ApiDocV1::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/lesson"));
        assert!(doc.paths.paths.contains_key("/api/v1/lesson/{id}"));
        assert!(doc.paths.paths.keys().all(|it| it.starts_with("/api/v1/")));
    }
}
