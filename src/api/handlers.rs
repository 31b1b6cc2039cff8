use axum::{extract::State, Json};
use serde::Serialize;

use crate::health::StateHandle;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub healthy: bool,
}

pub async fn get_status(State(state): State<StateHandle>) -> Json<StatusResponse> {
    Json(StatusResponse {
        healthy: state.is_healthy(),
    })
}
