#[macro_use]
extern crate rocket;
#[macro_use]
extern crate serde;

use std::sync::Arc;

use mongodb::Client;
use rocket::http::Method;
use rocket::Rocket;
use rocket_cors::{AllowedHeaders, AllowedOrigins};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::{Config, StorageKind};
use crate::data::lesson::db::{LessonRepository, MongoLessons};
use crate::data::lesson::memory::MemoryLessons;
use crate::error::{BackendError, ConfigurationError};
use crate::route::mount_api;

pub mod config;
pub mod data;
pub mod error;
pub mod landing;
pub mod middleware;
pub mod resp;
pub mod route;
pub mod util;

/// Lesson storage shared by all request handlers.
pub type Lessons = Arc<dyn LessonRepository>;

fn init_logging(level: Level) {
    if let Err(err) = tracing_log::LogTracer::init() {
        eprintln!("Unable to forward log records: {}", err);
    }

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Unable to set global logger: {}", err);
    };
}

async fn connect_lessons(c: &Config) -> Result<Lessons, BackendError> {
    match c.storage {
        StorageKind::Mongodb => {
            tracing::info!("Connecting to MongoDB: {}", c.mongodb_uri);
            let client = Client::with_uri_str(c.mongodb_uri.as_str()).await?;

            tracing::info!("Using MongoDB database: {}", c.mongodb_db);
            let db = client.database(c.mongodb_db.as_str());

            if let Err(err) = db.list_collection_names(None).await {
                tracing::error!("Unable to connect to MongoDB.");
                return Err(err.into());
            }

            let lessons = MongoLessons::new(db);
            lessons.ensure_indexes().await?;
            Ok(Arc::new(lessons))
        }
        StorageKind::Memory => {
            tracing::warn!("Keeping lessons in memory. They will be lost on shutdown.");
            Ok(Arc::new(MemoryLessons::default()))
        }
    }
}

/// Loads configuration, connects to lesson storage and builds the server.
pub async fn create(log_level: Option<Level>) -> Result<Rocket<rocket::Build>, BackendError> {
    if let Some(l) = log_level {
        init_logging(l);
    }

    tracing::info!("Reading .env file...");
    if dotenv::dotenv().is_err() {
        tracing::warn!("Unable to load .env file.");
    }

    tracing::info!("Loading configuration...");
    let c = match Config::load() {
        Ok(c) => {
            tracing::info!("Configuration loaded.");
            c
        }
        Err(ConfigurationError::NotFound(_)) => {
            let c = Config::default();
            if c.save().is_err() {
                tracing::warn!("Unable to save generated configuration.");
            }
            c
        }
        Err(other) => {
            tracing::error!("Configuration error: {}", other);
            return Err(other.into());
        }
    };

    let lessons = connect_lessons(&c).await?;
    build(c, lessons)
}

/// Assembles the server around already prepared configuration and storage.
pub fn build(c: Config, lessons: Lessons) -> Result<Rocket<rocket::Build>, BackendError> {
    tracing::info!("Starting HTTP server...");
    let mut r = rocket::build().manage(c).manage(lessons);

    tracing::info!("Setting up CORS...");
    let cors = rocket_cors::CorsOptions {
        allowed_origins: AllowedOrigins::All,
        allowed_methods: vec![Method::Get, Method::Put, Method::Post, Method::Delete]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: AllowedHeaders::All,
        allow_credentials: true,
        ..Default::default()
    }
    .to_cors()?;

    r = r.attach(cors);
    r = mount_api(r);

    Ok(r)
}
