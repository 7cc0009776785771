use axum::Router;

use crate::state::SharedState;

pub mod description;
pub mod docs;
pub mod extract;
pub mod game;
pub mod health;

/// Prefix of the data routes.
pub const API_PREFIX: &str = "/api/v1";

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let data_router = game::router().merge(description::router());

    health::router()
        .nest(API_PREFIX, data_router)
        .merge(docs::router())
        .with_state(state)
}
