use crate::error::Result;
use crate::model::BootstrapResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;

pub async fn bootstrap_handler(State(state): State<AppState>) -> Result<Json<BootstrapResponse>> {
    let created = state.directory.bootstrap(&state.seed).await?;
    Ok(Json(BootstrapResponse { created }))
}
