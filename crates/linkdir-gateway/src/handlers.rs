mod bootstrap;
mod categories;
mod health;
mod links;
mod settings;
mod tags;
mod transfer;

pub use bootstrap::bootstrap_handler;
pub use categories::{
    create_category_handler, delete_category_handler, edit_category_handler,
    list_categories_handler,
};
pub use health::health_handler;
pub use links::{create_link_handler, delete_link_handler, list_links_handler, update_link_handler};
pub use settings::{get_settings_handler, replace_settings_handler, reset_handler};
pub use tags::{create_tag_handler, delete_tag_handler, edit_tag_handler, list_tags_handler};
pub use transfer::{
    export_bookmarks_handler, export_csv_handler, import_bookmarks_handler, import_csv_handler,
};

use axum::http::header::ETAG;
use axum::response::{IntoResponse, Response};
use axum::Json;
use linkdir_core::Revision;
use serde::Serialize;

/// JSON response carrying the document revision as a strong entity tag.
fn with_etag<T: Serialize>(revision: Revision, body: T) -> Response {
    ([(ETAG, format!("\"{revision}\""))], Json(body)).into_response()
}
