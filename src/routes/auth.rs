use rocket::serde::json::Json;
use rocket::tokio::task::spawn_blocking;
use rocket::{get, post, routes, State};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{ApiError, ApiResult, AuthError};
use crate::models::user::{LoginPayload, RegisterPayload, Role, User, UserProfile};
use crate::store::{SharedStore, StoreError};
use crate::utils::auth::{create_jwt, hash_password, verify_password, Session};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && domain.contains('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    }
}

/// A unique-email violation at insert time means another registration won the race.
fn registration_error(err: StoreError) -> ApiError {
    match err {
        StoreError::Duplicate(_) => AuthError::EmailInUse.into(),
        other => other.into(),
    }
}

fn issue_token(user: &User, config: &Config) -> ApiResult<AuthResponse> {
    let token = create_jwt(user, &config.jwt_secret)
        .map_err(|e| ApiError::Internal(format!("token generation failed: {e}")))?;
    Ok(AuthResponse {
        token,
        user: UserProfile::from(user),
    })
}

#[post("/register", data = "<payload>")]
pub async fn register(
    store: &State<SharedStore>,
    config: &State<Config>,
    payload: Json<RegisterPayload>,
) -> ApiResult<Json<AuthResponse>> {
    let RegisterPayload { email, password, name } = payload.into_inner();
    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        return Err(AuthError::InvalidEmail.into());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword.into());
    }
    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AuthError::EmailInUse.into());
    }

    let cost = config.bcrypt_cost;
    let password_hash = spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let name = match name.trim() {
        "" => email.split('@').next().unwrap_or_default().to_string(),
        trimmed => trimmed.to_string(),
    };

    let user = store
        .insert_user(User {
            id: None,
            email,
            name,
            role: Role::User,
            avatar: None,
            password_hash,
            created_at: chrono::Utc::now(),
        })
        .await
        .map_err(registration_error)?;
    tracing::info!(user_id = ?user.id, email = %user.email, "user registered");

    Ok(Json(issue_token(&user, config)?))
}

#[post("/login", data = "<payload>")]
pub async fn login(
    store: &State<SharedStore>,
    config: &State<Config>,
    payload: Json<LoginPayload>,
) -> ApiResult<Json<AuthResponse>> {
    let LoginPayload { email, password } = payload.into_inner();
    let user = store
        .find_user_by_email(&normalize_email(&email))
        .await?
        .ok_or(AuthError::InvalidCredential)?;

    let hash = user.password_hash.clone();
    let verified = spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !verified {
        tracing::debug!(email = %user.email, "login rejected");
        return Err(AuthError::InvalidCredential.into());
    }

    Ok(Json(issue_token(&user, config)?))
}

#[get("/me")]
pub async fn me(store: &State<SharedStore>, session: Session) -> ApiResult<Json<UserProfile>> {
    let user = store
        .get_user(session.user_id)
        .await?
        .ok_or(AuthError::Unauthenticated)?;
    Ok(Json(UserProfile::from(&user)))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![register, login, me]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_email_shape() {
        assert!(is_valid_email("ana@example.com"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana example@x.com"));
        assert!(!is_valid_email("ana@@example.com"));
        assert!(!is_valid_email("ana@.com"));
    }

    #[test]
    fn duplicate_insert_reports_email_in_use() {
        let err = registration_error(StoreError::Duplicate("email"));
        assert_eq!(err.code(), "auth/email-already-in-use");

        let err = registration_error(StoreError::MissingId("user"));
        assert_eq!(err.code(), "internal");
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }
}
