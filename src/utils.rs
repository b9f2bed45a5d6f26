use jsonwebtoken::{EncodingKey, Header, encode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info};

use crate::{Claims, User};

/// Issues an HS256 access token for `user`, valid for `seconds`.
pub fn create_access_token(
    user: &User,
    seconds: i64,
    secret_key: &SecretString,
) -> Result<String, jsonwebtoken::errors::Error> {
    info!(
        user_id = %user.id,
        user_name = %user.username,
        expiry_seconds = seconds,
        "Creating JWT access token"
    );

    let claims = Claims::new(user.id, user.username.clone()).with_expiry(seconds);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret_key.expose_secret().as_bytes()),
    )
    .inspect_err(|e| error!("Failed to generate new JWT access token: {}", e))
}
