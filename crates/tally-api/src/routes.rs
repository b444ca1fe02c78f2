use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{boards, messages};

/// Every HTTP route. CORS and tracing layers are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/api/", get(auth::index))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/login", get(auth::whoami))
        .route(
            "/api/boards",
            get(boards::list_boards).post(boards::create_board),
        )
        .route(
            "/api/boards/{board_id}",
            get(boards::get_board)
                .put(boards::update_board)
                .delete(boards::delete_board),
        )
        .route("/api/boards/{board_id}/queue", get(boards::next_announcement))
        .route(
            "/api/boards/{board_id}/messages",
            post(messages::submit_message),
        )
        .route(
            "/api/boards/{board_id}/messages/{message_id}",
            get(messages::get_message),
        )
        .route(
            "/api/boards/{board_id}/messages/{message_id}/upvote",
            post(messages::upvote),
        )
        .route(
            "/api/boards/{board_id}/messages/{message_id}/downvote",
            post(messages::downvote),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
