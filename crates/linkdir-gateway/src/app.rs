use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use linkdir_telemetry::http_trace_layer;
use tracing::warn;

use crate::error::AppError;
use crate::handlers::{
    bootstrap_handler, create_category_handler, create_link_handler, create_tag_handler,
    delete_category_handler, delete_link_handler, delete_tag_handler, edit_category_handler,
    edit_tag_handler, export_bookmarks_handler, export_csv_handler, get_settings_handler,
    health_handler, import_bookmarks_handler, import_csv_handler, list_categories_handler,
    list_links_handler, list_tags_handler, replace_settings_handler, reset_handler,
    update_link_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .nest("/api", Self::api(state.clone()))
            .layer(http_trace_layer())
            .with_state(state)
    }

    fn api(state: AppState) -> Router<AppState> {
        Router::new()
            .route("/bootstrap", get(bootstrap_handler))
            .route("/links", get(list_links_handler).post(create_link_handler))
            .route(
                "/links/{name}",
                put(update_link_handler).delete(delete_link_handler),
            )
            .route(
                "/categories",
                get(list_categories_handler).post(create_category_handler),
            )
            .route(
                "/categories/{name}",
                put(edit_category_handler).delete(delete_category_handler),
            )
            .route("/tags", get(list_tags_handler).post(create_tag_handler))
            .route(
                "/tags/{name}",
                put(edit_tag_handler).delete(delete_tag_handler),
            )
            .route(
                "/settings",
                get(get_settings_handler)
                    .put(replace_settings_handler)
                    .delete(reset_handler),
            )
            .route("/import/csv", post(import_csv_handler))
            .route("/import/bookmarks", post(import_bookmarks_handler))
            .route("/export/csv", get(export_csv_handler))
            .route("/export/bookmarks", get(export_bookmarks_handler))
            .route_layer(middleware::from_fn_with_state(state, mode_gate))
    }
}

fn is_mutation(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Rejects every write unless the deployment runs in development mode.
async fn mode_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if is_mutation(request.method()) && !state.mode().allows_mutations() {
        warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "rejected mutation outside development mode"
        );
        return AppError::Forbidden.into_response();
    }
    next.run(request).await
}
