use super::{
    form::AskForm,
    types::{AnswerResponse, ApiError, HealthResponse},
};
use crate::tutor::{Action, TurnRequest, Tutor};
use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    response::{Html, Json},
};
use std::{io::ErrorKind, path::PathBuf, sync::Arc};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub tutor: Arc<Tutor>,
    pub static_dir: PathBuf,
}

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let index_path = state.static_dir.join("index.html");

    match tokio::fs::read_to_string(&index_path).await {
        Ok(html) => Ok(Html(html)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error!("{} not found", index_path.display());
            Err(ApiError::NotFound(
                "Frontend interface not found.".to_string(),
            ))
        }
        Err(e) => {
            error!("Error reading {}: {}", index_path.display(), e);
            Err(ApiError::Internal("Server configuration error.".to_string()))
        }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Science Helper is running!".to_string(),
    })
}

pub async fn ask(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let multipart = multipart.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let form = AskForm::from_multipart(multipart).await?;

    let action: Action = form.action.as_deref().unwrap_or("ask").parse()?;
    let image = form.image.map(|upload| upload.validate()).transpose()?;

    if action == Action::Ask && form.question.is_none() && image.is_none() {
        return Err(ApiError::BadRequest(
            "Please provide a question or an image.".to_string(),
        ));
    }

    let session_id = match form.session_id {
        Some(id) => id,
        None => match action.missing_context("") {
            Some(err) => return Err(err.into()),
            None => Uuid::new_v4().to_string(),
        },
    };

    info!(
        "Received {} request for session: {}",
        action, session_id
    );

    let request = TurnRequest {
        action,
        text: form.question,
        image,
    };

    let answer = state.tutor.respond(&session_id, request).await?;

    Ok(Json(AnswerResponse { session_id, answer }))
}
