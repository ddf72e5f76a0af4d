//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use enquete_core::{ResponseService, ResultsService, SurveyService, UserService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub survey_service: SurveyService,
    pub response_service: ResponseService,
    pub results_service: ResultsService,
}

/// Authentication middleware.
///
/// Resolves a bearer token into the matching user and stores it in the
/// request extensions. Requests without a valid token pass through
/// anonymously; handlers that require a user reject them via `AuthUser`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Try to extract token from header
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
