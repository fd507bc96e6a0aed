use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use justice_db::queries::UserWrite;
use justice_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};
use justice_types::models::Role;

use crate::convert::parse_role;
use crate::error::ApiError;
use crate::extract::AppJson;
use crate::state::{AppState, with_db};
use crate::validate::Checks;

pub(crate) const NAME_MIN: usize = 3;
pub(crate) const NAME_MAX: usize = 32;
pub(crate) const PASSWORD_MIN: usize = 8;

pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim().to_string();
    Checks::default()
        .chars_between("name", &name, NAME_MIN, NAME_MAX, "Name must be between 3 and 32 characters long")
        .check(
            req.password.chars().count() >= PASSWORD_MIN,
            "password",
            "Password must be at least 8 characters long",
        )
        .finish()?;

    let lookup = name.clone();
    if with_db(&state, move |db| db.get_user_by_name(&lookup)).await?.is_some() {
        return Err(ApiError::Conflict("Name is already taken"));
    }

    let password_hash = hash_password(req.password).await?;
    let user_id = Uuid::new_v4();

    // A concurrent registration can claim the name while the hash is computed
    let (uid, uname) = (user_id.to_string(), name.clone());
    let written = with_db(&state, move |db| db.create_user(&uid, &uname, &password_hash, Role::User)).await?;
    if written == UserWrite::NameTaken {
        return Err(ApiError::Conflict("Name is already taken"));
    }
    info!("Registered user {} ({})", name, user_id);

    let token = create_token(&state.jwt_secret, state.token_ttl, user_id, &name, Role::User)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id,
            name,
            role: Role::User,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim().to_string();
    let user = with_db(&state, move |db| db.get_user_by_name(&name))
        .await?
        .ok_or(ApiError::Unauthorized("Invalid credentials"))?;

    let stored = user.password.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&req.password, &stored))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;
    if !valid {
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let user_id: Uuid = user.id.parse().map_err(anyhow::Error::from)?;
    let role = parse_role(&user.role);
    let token = create_token(&state.jwt_secret, state.token_ttl, user_id, &user.name, role)?;

    Ok(Json(AuthResponse {
        user_id,
        name: user.name,
        role,
        token,
    }))
}

/// Argon2id hash, computed on the blocking pool.
pub(crate) async fn hash_password(password: String) -> Result<String, ApiError> {
    let hash = tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(hash)
}

fn verify_password(password: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let parsed_hash =
        PasswordHash::new(stored_hash).map_err(|e| anyhow::anyhow!("Stored hash unreadable: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn create_token(
    secret: &str,
    ttl: chrono::Duration,
    user_id: Uuid,
    name: &str,
    role: Role,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        name: name.to_string(),
        role,
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::verify_token;

    #[test]
    fn token_roundtrip_carries_role() {
        let id = Uuid::new_v4();
        let token = create_token("s3cret", chrono::Duration::hours(1), id, "alice", Role::Admin).unwrap();

        let claims = verify_token("s3cret", &token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.name, "alice");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn wrong_secret_or_expired_token_is_rejected() {
        let id = Uuid::new_v4();
        let token = create_token("s3cret", chrono::Duration::hours(1), id, "alice", Role::User).unwrap();
        assert!(verify_token("other", &token).is_err());

        let expired = create_token("s3cret", chrono::Duration::hours(-2), id, "alice", Role::User).unwrap();
        assert!(verify_token("s3cret", &expired).is_err());
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hash = hash_password("correct horse".into()).await.unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }
}
