use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use tally_types::BoardSettings;
use tally_types::api::{BoardResponse, Claims};

use crate::auth::AppState;
use crate::error::ServiceError;

/// Boards owned by the caller.
pub async fn list_boards(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<BoardResponse>>, ServiceError> {
    let boards = state.boards.list_boards(&claims.username).await?;
    Ok(Json(boards.iter().map(BoardResponse::from).collect()))
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(settings): Json<BoardSettings>,
) -> Result<impl IntoResponse, ServiceError> {
    let board = state.boards.create_board(&claims.username, &settings).await?;
    Ok((StatusCode::CREATED, Json(BoardResponse::from(&board))))
}

pub async fn get_board(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
) -> Result<Json<BoardResponse>, ServiceError> {
    let board = state.boards.get_board(board_id).await?;
    Ok(Json(BoardResponse::from(&board)))
}

pub async fn update_board(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(settings): Json<BoardSettings>,
) -> Result<Json<BoardResponse>, ServiceError> {
    let board = state
        .boards
        .update_board(board_id, &claims.username, settings)
        .await?;
    Ok(Json(BoardResponse::from(&board)))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ServiceError> {
    state.boards.delete_board(board_id, &claims.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pop the head of the announcement queue; 204 when it is empty.
pub async fn next_announcement(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ServiceError> {
    let next = state
        .boards
        .pop_announcement(board_id, &claims.username)
        .await?;

    Ok(match next {
        Some(announcement) => Json(announcement).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
