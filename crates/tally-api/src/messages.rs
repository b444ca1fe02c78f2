use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use tally_types::Message;
use tally_types::api::{Claims, SubmitMessageRequest};

use crate::auth::AppState;
use crate::error::ServiceError;

pub async fn submit_message(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitMessageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let msg = state
        .boards
        .submit_message(board_id, &claims.username, &req.body)
        .await?;
    Ok((StatusCode::CREATED, Json(msg)))
}

pub async fn get_message(
    State(state): State<AppState>,
    Path((board_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Message>, ServiceError> {
    Ok(Json(state.boards.get_message(board_id, message_id).await?))
}

pub async fn upvote(
    State(state): State<AppState>,
    Path((board_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Message>, ServiceError> {
    Ok(Json(state.boards.upvote(board_id, message_id).await?))
}

pub async fn downvote(
    State(state): State<AppState>,
    Path((board_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Message>, ServiceError> {
    Ok(Json(state.boards.downvote(board_id, message_id).await?))
}
