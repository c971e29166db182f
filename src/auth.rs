use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::{Result, ServiceError};
use crate::schemas::Id;
use crate::store::Store;

type HmacSha256 = Hmac<Sha256>;

/// Resolves the authenticated user behind a request: bearer token from the
/// Authorization header, looked up in the session table.
pub async fn authenticate(request: &HttpRequest, store: &dyn Store) -> Result<Id> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ServiceError::unauthorized("missing authorization header"))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ServiceError::unauthorized("malformed authorization header"))?;
    let session = store
        .find_session_by_token(token)
        .await?
        .ok_or_else(|| ServiceError::unauthorized("invalid session token"))?;
    Ok(session.user_id)
}

/// Argon2id password hash with a fresh random salt, stored as a PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServiceError::Internal(format!("failed to hash password: {err}")))
}

/// Checks a plaintext password against a stored PHC hash. A malformed hash
/// counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Opaque session token: HMAC over the user id and the minting instant. The
/// token only has meaning through the session table.
pub fn mint_token(secret: &str, user_id: Id) -> String {
    let now = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{user_id}:{now}").as_bytes());
    to_hex(&mac.finalize().into_bytes())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
