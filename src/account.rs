//! Sign-up, credential sign-in and OAuth-style upsert login. Passwords are
//! stored as salted Argon2id PHC strings; successful logins persist a
//! session row whose token the rest of the API authenticates against.

use crate::auth;
use crate::errors::{Result, ServiceError};
use crate::schemas::{OauthBody, SessionReply, SignInBody, SignUpBody, User, UserProfile};
use crate::store::Store;

pub async fn sign_up(store: &dyn Store, body: SignUpBody) -> Result<UserProfile> {
    if store.find_user_by_email(&body.email).await?.is_some() {
        return Err(ServiceError::conflict("email already in use"));
    }
    let hash = auth::hash_password(&body.password)?;
    let user = store
        .create_user(&body.name, &body.email, Some(hash))
        .await?;
    tracing::info!(user = user.id, "account created");
    Ok(UserProfile::from(&user))
}

pub async fn sign_in(store: &dyn Store, secret: &str, body: SignInBody) -> Result<SessionReply> {
    let user = store
        .find_user_by_email(&body.email)
        .await?
        .ok_or_else(|| ServiceError::unauthorized("invalid email or password"))?;
    match &user.password {
        Some(stored) if auth::verify_password(&body.password, stored) => {
            open_session(store, secret, &user).await
        }
        _ => Err(ServiceError::unauthorized("invalid email or password")),
    }
}

/// Login for an identity already verified by an external OAuth provider:
/// reuses the account when the email is known, otherwise creates a hashless
/// one.
pub async fn oauth_login(store: &dyn Store, secret: &str, body: OauthBody) -> Result<SessionReply> {
    let user = match store.find_user_by_email(&body.email).await? {
        Some(user) => user,
        None => store.create_user(&body.name, &body.email, None).await?,
    };
    open_session(store, secret, &user).await
}

async fn open_session(store: &dyn Store, secret: &str, user: &User) -> Result<SessionReply> {
    let token = auth::mint_token(secret, user.id);
    store.create_session(user.id, &token).await?;
    Ok(SessionReply {
        user: UserProfile::from(user),
        token,
    })
}
