//! API endpoints.

mod auth;
mod responses;
mod results;
mod surveys;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new().merge(auth::router()).nest(
        "/surveys",
        surveys::router()
            .merge(responses::router())
            .merge(results::router()),
    )
}
