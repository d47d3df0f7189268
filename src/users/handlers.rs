use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::error::{bounded, AppError};
use crate::state::AppState;
use crate::users::dto::{NewUserRequest, UpdateUserRequest, User, UserFilter, UserListQuery};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(get_users))
        .route("/user", post(add_user))
        .route(
            "/user/:user_id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// Passport numbers must look like "NNNN NNNNNN": four digits, a space, six
/// digits.
fn is_valid_passport(passport: &str) -> bool {
    lazy_static! {
        static ref PASSPORT_RE: Regex = Regex::new(r"^\d{4} \d{6}$").unwrap();
    }
    PASSPORT_RE.is_match(passport)
}

#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    Query(q): Query<UserListQuery>,
) -> Result<Json<Vec<User>>, (StatusCode, String)> {
    if q.page < 1 || q.limit < 1 {
        warn!(page = q.page, limit = q.limit, "non-positive pagination");
        return Err((
            StatusCode::BAD_REQUEST,
            "page and limit must be >= 1".into(),
        ));
    }

    let filter = UserFilter::from(&q);
    match bounded(
        state.config.request_timeout,
        state.users.get_all_users(&filter, q.page, q.limit),
    )
    .await
    {
        Ok(users) => Ok(Json(users)),
        Err(e) => {
            error!(error = %e, "get_users failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            ))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn add_user(
    State(state): State<AppState>,
    Json(payload): Json<NewUserRequest>,
) -> Result<Json<User>, (StatusCode, String)> {
    let passport = payload.passport_number.trim().to_string();
    if !is_valid_passport(&passport) {
        warn!("invalid passport format");
        return Err((
            StatusCode::BAD_REQUEST,
            "Invalid passportNumber, expected \"NNNN NNNNNN\"".into(),
        ));
    }

    // An unreachable identity service is our failure, not the caller's.
    let profile = match state.identity.fetch(&passport).await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "identity lookup failed");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            ));
        }
    };

    match bounded(
        state.config.request_timeout,
        state.users.create_user(&passport, &profile),
    )
    .await
    {
        Ok(user) => {
            info!(user_id = user.id, "user created");
            Ok(Json(user))
        }
        Err(e) => {
            error!(error = %e, "add_user failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            ))
        }
    }
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<User>, (StatusCode, String)> {
    match bounded(
        state.config.request_timeout,
        state.users.get_user_by_id(user_id),
    )
    .await
    {
        Ok(user) => Ok(Json(user)),
        Err(AppError::UserNotFound) => {
            info!(user_id, "user not found");
            Err((StatusCode::NOT_FOUND, "User not found".into()))
        }
        Err(e) => {
            error!(error = %e, user_id, "get_user failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            ))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, (StatusCode, String)> {
    match bounded(
        state.config.request_timeout,
        state.users.update_user(&payload, user_id),
    )
    .await
    {
        Ok(user) => Ok(Json(user)),
        Err(AppError::UserNotFound) => {
            info!(user_id, "update target not found");
            Err((StatusCode::NOT_FOUND, "User not found".into()))
        }
        Err(e) => {
            error!(error = %e, user_id, "update_user failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            ))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<StatusCode, (StatusCode, String)> {
    match bounded(
        state.config.request_timeout,
        state.users.delete_user(user_id),
    )
    .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(AppError::UserNotFound) => {
            info!(user_id, "delete target not found");
            Err((StatusCode::NOT_FOUND, "User not found".into()))
        }
        Err(e) => {
            error!(error = %e, user_id, "delete_user failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_documented_passport_shape() {
        assert!(is_valid_passport("1234 567890"));
        assert!(is_valid_passport("0000 000000"));
    }

    #[test]
    fn rejects_malformed_passports() {
        assert!(!is_valid_passport(""));
        assert!(!is_valid_passport("1234567890"));
        assert!(!is_valid_passport("123 4567890"));
        assert!(!is_valid_passport("12345 67890"));
        assert!(!is_valid_passport("1234  567890"));
        assert!(!is_valid_passport("abcd efghij"));
        assert!(!is_valid_passport("1234 567890 "));
    }
}
