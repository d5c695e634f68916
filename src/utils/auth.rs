use bcrypt::{hash, verify};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use rocket::http::Status;
use rocket::outcome::try_outcome;
use rocket::request::{FromRequest, Outcome, Request};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AuthError;
use crate::models::user::{Role, User};
use crate::store::SharedStore;

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    exp: usize,
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    verify(password, hash).unwrap_or(false)
}

pub fn create_jwt(user: &User, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = (chrono::Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;

    let claims = Claims {
        sub: user.id.map(|id| id.to_hex()).unwrap_or_default(),
        email: user.email.clone(),
        role: user.role,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

/// The signed-in caller, decoded from the bearer token and passed to
/// handlers explicitly.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: ObjectId,
    pub email: String,
    pub role: Role,
}

impl Session {
    pub fn decode(token: &str, secret: &str) -> Result<Self, AuthError> {
        let validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &validation)
            .map_err(|_| AuthError::Unauthenticated)?;
        let user_id = ObjectId::parse_str(&data.claims.sub).map_err(|_| AuthError::Unauthenticated)?;

        Ok(Session {
            user_id,
            email: data.claims.email,
            role: data.claims.role,
        })
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Session {
    type Error = AuthError;

    /// Verifies the bearer token, then reloads the user so deleted accounts
    /// are rejected and role changes apply immediately.
    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let (config, store) = match (
            request.rocket().state::<Config>(),
            request.rocket().state::<SharedStore>(),
        ) {
            (Some(c), Some(s)) => (c, s),
            _ => return Outcome::Error((Status::InternalServerError, AuthError::Unauthenticated)),
        };

        let token = request
            .headers()
            .get_one("Authorization")
            .and_then(|header| header.strip_prefix("Bearer "));
        let Some(token) = token else {
            return Outcome::Error((Status::Unauthorized, AuthError::Unauthenticated));
        };

        let claimed = match Session::decode(token, &config.jwt_secret) {
            Ok(session) => session,
            Err(err) => return Outcome::Error((err.status(), err)),
        };

        match store.get_user(claimed.user_id).await {
            Ok(Some(user)) => Outcome::Success(Session {
                user_id: claimed.user_id,
                email: user.email,
                role: user.role,
            }),
            Ok(None) => {
                tracing::debug!(user_id = %claimed.user_id, "token for a deleted user");
                Outcome::Error((Status::Unauthorized, AuthError::Unauthenticated))
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load session user");
                Outcome::Error((Status::InternalServerError, AuthError::Unauthenticated))
            }
        }
    }
}

/// A session whose role is `ADMIN`.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let session = try_outcome!(request.guard::<Session>().await);
        if session.role == Role::Admin {
            Outcome::Success(AdminSession(session))
        } else {
            Outcome::Error((Status::Forbidden, AuthError::Forbidden))
        }
    }
}

/// A session allowed to publish events (`ORGANIZER` or `ADMIN`).
#[derive(Debug, Clone)]
pub struct OrganizerSession(pub Session);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for OrganizerSession {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let session = try_outcome!(request.guard::<Session>().await);
        if session.role.can_organize() {
            Outcome::Success(OrganizerSession(session))
        } else {
            Outcome::Error((Status::Forbidden, AuthError::Forbidden))
        }
    }
}
