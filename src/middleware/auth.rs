use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;

use crate::auth::{Claims, TokenService};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, injected into request extensions by [`require_auth`]
#[derive(Clone, Debug)]
pub struct AuthUser {
    /// Magic key the token was issued for
    pub user: String,
    pub exp: i64,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user: claims.sub,
            exp: claims.exp,
        }
    }
}

/// Whether the caller of an anonymously readable route presented a valid token.
/// Never rejects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewer {
    pub authenticated: bool,
}

#[async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Viewer {
            authenticated: is_authenticated(&state.tokens, &parts.headers),
        })
    }
}

/// Middleware for write routes: 401 without calling the handler unless the
/// request carries a valid bearer token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers()).map_err(ApiError::unauthorized)?;
    let claims = state.tokens.validate_token(token).map_err(|e| {
        tracing::debug!("Rejected token on {}: {}", request.uri().path(), e);
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// True iff the request carries a bearer token that validates. Missing or
/// malformed headers yield false.
pub fn is_authenticated(tokens: &TokenService, headers: &HeaderMap) -> bool {
    match extract_bearer(headers) {
        Ok(token) => tokens.validate_token(token).is_ok(),
        Err(_) => false,
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or("Missing token")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("Empty bearer token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}

/// Records carrying a public/private flag
pub trait Visibility {
    fn is_public(&self) -> bool;
}

/// Keeps the records the caller may read, preserving their order.
pub fn visibility_filter<T: Visibility>(records: Vec<T>, authenticated: bool) -> Vec<T> {
    if authenticated {
        return records;
    }
    records.into_iter().filter(|r| r.is_public()).collect()
}
