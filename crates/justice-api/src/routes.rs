use axum::{
    Json, Router, middleware,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, chats, facts, reports, stories, users};

/// Every route the server exposes. Transport layers (CORS, tracing) are
/// added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/stats", get(users::user_stats))
        .route("/users/find/{id}", get(users::find_user))
        .route("/users/{id}", put(users::update_user))
        .route(
            "/reports/crime-reports",
            get(reports::list_reports).post(reports::create_report),
        )
        .route("/reports/crime-reports/{id}", get(reports::get_report))
        .route(
            "/reports/crime-reports/{id}/comments",
            get(reports::list_comments).post(reports::add_comment),
        )
        .route(
            "/reports/{id}",
            put(reports::update_report).delete(reports::delete_report),
        )
        .route("/stories", get(stories::list_stories).post(stories::create_story))
        .route("/stories/{id}", get(stories::get_story).delete(stories::delete_story))
        .route("/facts", get(facts::list_facts).post(facts::create_fact))
        .route("/facts/{id}", delete(facts::delete_fact))
        .route("/chats", get(chats::list_chats).post(chats::send_chat))
        // {id} is a counterpart user id here...
        .route("/chats/{id}", get(chats::get_chat_with))
        // ...and a chat id here
        .route("/chats/{id}/read", put(chats::mark_read))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn root() -> &'static str {
    "Hello world"
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
