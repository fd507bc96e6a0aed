use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

pub use justice_types::api::Claims;

use crate::convert::parse_role;
use crate::error::ApiError;
use crate::state::{AppState, with_db};

/// Extract and validate the JWT from the Authorization header, then expose
/// the claims to handlers as `Extension<Claims>`. Name and role are re-read
/// from the users table, so a role change applies to tokens already issued.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !req.headers().contains_key(header::AUTHORIZATION) {
        return Err(ApiError::Unauthorized("Missing authentication token"));
    }

    let Authorization(bearer) = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthorized("Invalid authentication token"))?;

    let mut claims = verify_token(&state.jwt_secret, bearer.token())?;

    let user_id = claims.sub.to_string();
    let user = with_db(&state, move |db| db.get_user_by_id(&user_id))
        .await?
        .ok_or(ApiError::Unauthorized("Invalid authentication token"))?;
    claims.name = user.name;
    claims.role = parse_role(&user.role);

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Unauthorized("Invalid authentication token")
    })
}

/// Admin gate for handlers that are not about the caller's own resources.
pub(crate) fn require_admin(claims: &Claims) -> Result<(), ApiError> {
    if claims.role.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("You are not allowed to do that"))
    }
}
