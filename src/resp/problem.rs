use std::fmt::{Display, Formatter};
use std::io::Cursor;

use rocket::http::ContentType;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::{response, Request, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::data::lesson::db::{problem as lesson_problem, LessonError};

/// Implements [RFC7807](https://tools.ietf.org/html/rfc7807).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Problem {
    #[serde(skip)]
    pub status: Status,
    pub type_uri: String,
    pub title: String,

    pub detail: Option<String>,
    pub instance_uri: Option<String>,

    #[schema(value_type = Object)]
    pub body: Map<String, Value>,
}

impl Default for Problem {
    fn default() -> Self {
        Problem {
            status: Status::InternalServerError,
            type_uri: "about:blank".to_string(),
            title: "Problem".to_string(),
            detail: None,
            instance_uri: None,
            body: Map::new(),
        }
    }
}

impl Problem {
    pub fn new(status: Status, type_uri: impl ToString, title: impl ToString) -> Problem {
        Problem {
            status,
            type_uri: type_uri.to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn new_untyped(status: Status, title: impl ToString) -> Problem {
        Problem::new(status, "about:blank", title)
    }

    pub fn detail(&mut self, value: impl ToString) -> &mut Problem {
        self.detail = Some(value.to_string());
        self
    }

    pub fn insert_str(&mut self, key: impl ToString, value: impl ToString) -> &mut Problem {
        self.body
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    /// Serialized form of the response body, including the RFC7807 members.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut body = self.body.clone();

        // Following are required by rfc7807
        body.insert(String::from("type"), Value::from(self.type_uri.clone()));
        body.insert(String::from("title"), Value::from(self.title.clone()));

        // Optional parameters as specified by rfc7807
        if let Some(detail) = &self.detail {
            body.insert(String::from("detail"), Value::from(detail.clone()));
        }
        body.insert(String::from("status"), Value::from(self.status.code));
        if let Some(instance) = &self.instance_uri {
            body.insert(String::from("instance"), Value::from(instance.clone()));
        }

        body
    }
}

impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.title)
    }
}

impl std::error::Error for Problem {}

impl<'r> Responder<'r, 'static> for Problem {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let body_string = Value::Object(self.to_json()).to_string();

        Response::build()
            .status(self.status)
            .header(ContentType::new("application", "problem+json"))
            .raw_header("Content-Language", "en")
            .sized_body(body_string.len(), Cursor::new(body_string))
            .ok()
    }
}

impl From<LessonError> for Problem {
    fn from(e: LessonError) -> Self {
        match e {
            LessonError::Validation(error) => lesson_problem::invalid_lesson(error),
            LessonError::NotFound(id) => lesson_problem::not_found(id),
            LessonError::Database(error) => Problem::from(error),
        }
    }
}

impl<'a> From<rocket::serde::json::Error<'a>> for Problem {
    fn from(e: rocket::serde::json::Error<'a>) -> Self {
        use rocket::serde::json::Error;

        match e {
            Error::Parse(_, error) => {
                Problem::new_untyped(Status::UnprocessableEntity, "Malformed request body.")
                    .detail(error)
                    .clone()
            }
            Error::Io(error) => {
                tracing::warn!("Unable to read request body: {}", error);
                Problem::new_untyped(Status::BadRequest, "Unable to read request body.")
            }
        }
    }
}

/// Answers unmatched and failed API requests with a [`Problem`] instead of
/// Rocket's HTML error pages.
#[catch(default)]
pub fn api_problem(status: Status, _req: &Request) -> Problem {
    Problem::new_untyped(status, status.reason().unwrap_or("Unknown error."))
}

impl From<mongodb::error::Error> for Problem {
    fn from(e: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        tracing::error!("MongoDB error: {}", e);

        fn mongodb_problem() -> Problem {
            Problem::new_untyped(
                Status::InternalServerError,
                "MongoDB failed while processing request.",
            )
        }

        fn access_problem() -> Problem {
            Problem::new_untyped(
                Status::InternalServerError,
                "Server was unable to access MongoDB.",
            )
        }

        fn bad_db_request() -> Problem {
            Problem::new_untyped(
                Status::InternalServerError,
                "MongoDB was unable to process bad server request.",
            )
        }

        fn bson_problem() -> Problem {
            Problem::new_untyped(
                Status::InternalServerError,
                "There was a problem with handling MongoDB bson.",
            )
        }

        match e.kind.as_ref() {
            ErrorKind::InvalidArgument { .. } => bad_db_request(),
            ErrorKind::Authentication { .. } => access_problem(),
            ErrorKind::BsonDeserialization(_) => bson_problem(),
            ErrorKind::BsonSerialization(_) => bson_problem(),
            ErrorKind::BulkWrite(_) => bad_db_request(),
            ErrorKind::Command(_) => bad_db_request(),
            ErrorKind::DnsResolve { .. } => access_problem(),
            ErrorKind::Io(_) => mongodb_problem()
                .detail("An IO error occurred. Submitted data might not be properly stored.")
                .clone(),
            ErrorKind::ServerSelection { .. } => access_problem(),
            ErrorKind::InvalidTlsConfig { .. } => access_problem(),
            ErrorKind::Write(_) => mongodb_problem()
                .detail("A write error occurred. Submitted data might not be properly stored.")
                .clone(),
            ErrorKind::IncompatibleServer { .. } => access_problem(),
            _ => mongodb_problem(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::lesson::{ValidationError, ValidationReason};
    use uuid::Uuid;

    #[test]
    fn validation_error_names_field_and_reason() {
        let problem = Problem::from(LessonError::Validation(ValidationError::new(
            "status",
            ValidationReason::InvalidEnum,
        )));
        let json = problem.to_json();

        assert_eq!(problem.status, Status::UnprocessableEntity);
        assert_eq!(json["field"], "status");
        assert_eq!(json["reason"], "invalid_enum");
        assert_eq!(json["status"], 422);
        assert_eq!(json["type"], "about:blank");
    }

    #[test]
    fn mistyped_json_is_unprocessable() {
        let error = serde_json::from_str::<crate::data::lesson::LessonCandidate>(
            r#"{"title": 5}"#,
        )
        .unwrap_err();
        let problem = Problem::from(rocket::serde::json::Error::Parse("{\"title\": 5}", error));

        assert_eq!(problem.status, Status::UnprocessableEntity);
        assert!(problem.detail.is_some());
        assert_eq!(problem.to_json()["status"], 422);
    }

    #[test]
    fn missing_lesson_is_not_found() {
        let id = Uuid::new_v4();
        let problem = Problem::from(LessonError::NotFound(id));
        assert_eq!(problem.status, Status::NotFound);
        assert_eq!(problem.to_json()["id"], id.to_string());
        assert!(problem.to_json().get("detail").is_none());
    }
}
