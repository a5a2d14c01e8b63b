use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::{self, Next},
    response::Response,
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::database::DocumentStore;
use crate::error::AppError;

mod matches;
mod menu;
mod players;
pub mod response;
mod reviews;

pub const LIVENESS_MESSAGE: &str = "Taklid Food Server is Running Successfully!";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/menu-food", get(menu::list_menu))
        .route("/reviews-food", get(reviews::list_reviews))
        .route(
            "/matches",
            get(matches::list_matches).post(matches::create_match),
        )
        .route(
            "/matches/{id}",
            put(matches::update_match).delete(matches::delete_match),
        )
        .route(
            "/players",
            get(players::list_players).post(players::create_player),
        )
        .route(
            "/players/{id}",
            put(players::update_player).delete(players::delete_player),
        )
        // Only the data routes above wait for the database
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_connection,
        ))
        .route("/", get(root_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn root_handler() -> &'static str {
    LIVENESS_MESSAGE
}

async fn require_connection(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    state.store.ensure_connected().await.map_err(|e| {
        tracing::error!("Database not ready: {e}");
        AppError::Connection
    })?;

    Ok(next.run(request).await)
}
