use std::path::PathBuf;

use rocket::fs::NamedFile;
use rocket::response::content::RawHtml;
use rocket::State;

use crate::config::Config;
use crate::landing::{render, LandingView};

/// First path segment of the JSON API. Never served from `public_content`.
const API_ROOT: &str = "api";

/// Render the landing page
///
/// `flipped` carries the icon card state between clicks.
#[get("/?<flipped>")]
#[tracing::instrument]
pub fn landing_page(flipped: Option<bool>) -> RawHtml<String> {
    let view = LandingView::new(flipped.unwrap_or(false));
    RawHtml(render::page(&view))
}

/// Serves the client application (login, signup, ...) from `public_content`,
/// falling back to its `index.html` for client side routes. Unmatched API
/// requests are left to the API catcher.
#[get("/<path..>", rank = 10)]
#[tracing::instrument(skip(c))]
pub async fn app_path(path: PathBuf, c: &State<Config>) -> Option<NamedFile> {
    if path.starts_with(API_ROOT) {
        return None;
    }

    let root = c.public_content.as_path();
    match NamedFile::open(root.join(path.as_path())).await {
        Ok(file) => Some(file),
        Err(_) => {
            tracing::debug!("'{}' not found, serving index.html", path.display());
            NamedFile::open(root.join("index.html")).await.ok()
        }
    }
}
