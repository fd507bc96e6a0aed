use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{Datelike, Months, NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use justice_db::queries::{UserChanges, UserWrite};
use justice_types::api::{Claims, MonthlySignups, UpdateUserRequest, UserListQuery};
use justice_types::models::UserProfile;

use crate::auth::{NAME_MAX, NAME_MIN, PASSWORD_MIN, hash_password};
use crate::convert::user_profile;
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath};
use crate::middleware::require_admin;
use crate::state::{AppState, with_db};
use crate::validate::Checks;

const NEWEST_USERS: u32 = 5;
const STATS_MONTHS: u32 = 12;

/// GET /users/find/{id} (admin)
pub async fn find_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserProfile>, ApiError> {
    require_admin(&claims)?;

    let row = with_db(&state, move |db| db.get_user_by_id(&id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(user_profile(&row)))
}

/// GET /users?new=true (admin)
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    require_admin(&claims)?;

    let limit = query.new.then_some(NEWEST_USERS);
    let rows = with_db(&state, move |db| db.list_users(limit)).await?;

    Ok(Json(rows.iter().map(user_profile).collect()))
}

/// PUT /users/{id}: the user themself or an admin. Only admins may change roles.
pub async fn update_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.sub != id && !claims.role.is_admin() {
        return Err(ApiError::Forbidden("You are not allowed to do that"));
    }
    if req.role.is_some() && !claims.role.is_admin() {
        return Err(ApiError::Forbidden("Only admins can change roles"));
    }

    let name = req.name.map(|n| n.trim().to_string());
    let mut checks = Checks::default();
    if let Some(name) = &name {
        checks.chars_between("name", name, NAME_MIN, NAME_MAX, "Name must be between 3 and 32 characters long");
    }
    if let Some(password) = &req.password {
        checks.check(
            password.chars().count() >= PASSWORD_MIN,
            "password",
            "Password must be at least 8 characters long",
        );
    }
    checks.finish()?;

    if let Some(name) = name.clone() {
        let owner = with_db(&state, move |db| db.get_user_by_name(&name)).await?;
        if owner.is_some_and(|u| u.id != id.to_string()) {
            return Err(ApiError::Conflict("Name is already taken"));
        }
    }

    let password_hash = match req.password {
        Some(password) => Some(hash_password(password).await?),
        None => None,
    };
    let role = req.role;

    let row = with_db(&state, move |db| {
        let uid = id.to_string();
        let changes = UserChanges {
            name: name.as_deref(),
            password_hash: password_hash.as_deref(),
            role,
        };
        match db.update_user(&uid, &changes)? {
            UserWrite::Written => db.get_user_by_id(&uid).map(Ok),
            UserWrite::Missing => Ok(Err(ApiError::NotFound("User not found"))),
            UserWrite::NameTaken => Ok(Err(ApiError::Conflict("Name is already taken"))),
        }
    })
    .await??
    .ok_or(ApiError::NotFound("User not found"))?;

    info!("User {} updated by {}", row.id, claims.sub);
    Ok(Json(user_profile(&row)))
}

/// GET /users/stats (admin): sign-ups per month over the last year.
pub async fn user_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<MonthlySignups>>, ApiError> {
    require_admin(&claims)?;

    let since = stats_window_start(Utc::now().date_naive()).format("%Y-%m-%d").to_string();
    let counts = with_db(&state, move |db| db.signups_by_month(&since)).await?;

    Ok(Json(
        counts
            .into_iter()
            .map(|(month, total)| MonthlySignups { month, total })
            .collect(),
    ))
}

/// First day of the month `STATS_MONTHS - 1` months before `today`, so the
/// window covers the current month plus the eleven before it.
fn stats_window_start(today: NaiveDate) -> NaiveDate {
    let first_of_month = today.with_day(1).unwrap_or(today);
    first_of_month
        .checked_sub_months(Months::new(STATS_MONTHS - 1))
        .unwrap_or(first_of_month)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_window_spans_twelve_months() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        assert_eq!(stats_window_start(today), NaiveDate::from_ymd_opt(2023, 4, 1).unwrap());

        let january = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(stats_window_start(january), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }
}
