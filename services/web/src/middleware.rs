//! Session cookie middleware

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{error::WebError, models::CurrentUser, state::AppState};

/// Resolve the session cookie into a [`CurrentUser`] request extension.
///
/// Missing, unknown, expired and tampered cookies all leave the request
/// anonymous.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(cookie) = jar.get(&state.config.session_cookie) {
        if let Some(session) = state.sessions.get_active_session(cookie.value()).await {
            req.extensions_mut().insert(CurrentUser::from(session));
        }
    }

    next.run(req).await
}

/// Reject requests that are not made by an admin
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, WebError> {
    let user = current_user(&req).ok_or(WebError::Unauthorized)?;
    if !user.is_admin() {
        tracing::warn!("User {} is not allowed to edit the catalog", user.username);
        return Err(WebError::Forbidden);
    }

    Ok(next.run(req).await)
}

/// Extract the current user from the request extensions
pub fn current_user<B>(req: &Request<B>) -> Option<CurrentUser> {
    req.extensions().get::<CurrentUser>().cloned()
}
