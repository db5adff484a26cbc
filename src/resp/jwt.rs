use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::Status;
use rocket::request::{self, FromRequest, Request};
use rocket::outcome::Outcome::{Error, Forward, Success};
use serde::{Deserialize, Serialize};

use super::util::date_time_as_unix_seconds;
use crate::config::Config;
use crate::data::user::db::UserDbExt;
use crate::resp::error::ApiError;
use mongodb::Database;

/// Decoded bearer token attached to authenticated requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    #[serde(with = "date_time_as_unix_seconds")]
    iat: DateTime<Utc>,
    #[serde(with = "date_time_as_unix_seconds")]
    exp: DateTime<Utc>,
    pub email: String,
}

impl AuthClaims {
    pub fn new(email: impl ToString, expiry_hours: i64) -> AuthClaims {
        let now = Utc::now();
        AuthClaims {
            iat: now,
            exp: now + Duration::hours(expiry_hours),
            email: email.to_string(),
        }
    }

    pub fn encode_jwt(&self, secret: impl AsRef<str>) -> Result<String, jsonwebtoken::errors::Error> {
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(secret.as_ref().as_bytes());

        encode(&header, &self, &key)
    }
}

pub fn decode_jwt(
    token: &str,
    secret: impl AsRef<str>,
) -> Result<AuthClaims, jsonwebtoken::errors::Error> {
    decode::<AuthClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref().as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
}

pub fn auth_error(detail: impl std::fmt::Display) -> ApiError {
    tracing::debug!("unable to authorize request: {}", detail);
    ApiError::unauthorized("unauthorized access")
}

fn extract_bearer<'r>(req: &'r Request<'_>) -> Option<&'r str> {
    req.headers()
        .get_one("Authorization")
        .and_then(|header| header.strip_prefix("Bearer "))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthClaims {
    type Error = ApiError;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let config: &Config = match req.rocket().state() {
            Some(config) => config,
            None => {
                return Error((
                    Status::InternalServerError,
                    ApiError::internal("configuration state missing"),
                ))
            }
        };

        let token = match extract_bearer(req) {
            Some(token) => token,
            None => return Error((Status::Unauthorized, auth_error("no bearer token"))),
        };

        match decode_jwt(token, &config.access_token_secret) {
            Ok(claims) => {
                tracing::trace!("decoded auth claims for {}", claims.email);
                Success(claims)
            }
            Err(e) => Error((Status::Unauthorized, auth_error(e))),
        }
    }
}

/// Admin-gated requests: the caller's role is re-read from the user
/// collection on every request rather than trusted from the token.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthClaims);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ApiError;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let claims = match req.guard::<AuthClaims>().await {
            Success(claims) => claims,
            Error(e) => return Error(e),
            Forward(f) => return Forward(f),
        };

        let db: &Database = match req.rocket().state() {
            Some(db) => db,
            None => {
                return Error((
                    Status::InternalServerError,
                    ApiError::internal("database state missing"),
                ))
            }
        };

        match db.find_user_by_email(&claims.email).await {
            Ok(Some(user)) if user.role.is_admin() => Success(AdminUser(claims)),
            Ok(_) => Error((
                Status::Forbidden,
                ApiError::forbidden("forbidden access"),
            )),
            Err(e) => {
                let status = e.status();
                Error((status, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;

    static SECRET: &str = "test-secret";

    #[test]
    fn jwt_round_trip_preserves_claims() {
        let mut now = Utc::now();
        now = now.round_subsecs(0);

        let claims = AuthClaims {
            iat: now,
            exp: now + Duration::hours(5),
            email: "alice@example.com".to_string(),
        };

        let token = claims.encode_jwt(SECRET).expect("encoding should work");
        let decoded = decode_jwt(&token, SECRET).expect("decoding should work");

        assert_eq!(decoded.iat, now);
        assert_eq!(decoded.exp, now + Duration::hours(5));
        assert_eq!(decoded.email, "alice@example.com");
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let claims = AuthClaims {
            iat: now - Duration::hours(6),
            exp: now - Duration::hours(2),
            email: "alice@example.com".to_string(),
        };

        let token = claims.encode_jwt(SECRET).expect("encoding should work");
        let err = decode_jwt(&token, SECRET).expect_err("expired token must not decode");

        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = AuthClaims::new("alice@example.com", 5)
            .encode_jwt("other-secret")
            .expect("encoding should work");

        assert!(decode_jwt(&token, SECRET).is_err());
    }
}

pub mod doc {
    use utoipa::openapi::security::*;

    #[derive(Clone, Copy)]
    pub struct JWTAuth;

    impl From<JWTAuth> for SecurityScheme {
        fn from(_: JWTAuth) -> SecurityScheme {
            let mut http = Http::new(HttpAuthScheme::Bearer);
            http.bearer_format = Some("JWT".to_string());
            SecurityScheme::Http(http)
        }
    }

    impl utoipa::Modify for JWTAuth {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            if let Some(components) = openapi.components.as_mut() {
                components.add_security_scheme("jwt", *self)
            }
        }
    }
}
