use crate::{ApiError, AppState, Claims};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use secrecy::ExposeSecret;
use tracing::{Span, warn};

/// Decodes the bearer JWT and stores its [`Claims`] in the request extensions.
pub async fn auth_middleware(
    State(appstate): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim())
        .ok_or(ApiError::Unauthorized)
        .inspect_err(|_| warn!("missing bearer token"))?;
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(appstate.settings.secrets.hmac.expose_secret().as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!("rejecting bearer token: {}", e);
        ApiError::Unauthorized
    })?
    .claims;
    Span::current().record("user_id", tracing::field::display(claims.sub));
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
