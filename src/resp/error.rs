use std::fmt::{Display, Formatter};
use std::io::Cursor;

use rocket::http::ContentType;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::{response, Request, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Caller-facing error body.
///
/// Every failed request answers with `{"error": true, "message": "..."}` and
/// the HTTP status carried alongside.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ApiError {
    #[serde(skip)]
    pub status: Status,
    pub error: bool,
    pub message: String,
}

impl ApiError {
    pub fn new(status: Status, message: impl ToString) -> ApiError {
        ApiError {
            status,
            error: true,
            message: message.to_string(),
        }
    }

    #[inline]
    pub fn unauthorized(message: impl ToString) -> ApiError {
        ApiError::new(Status::Unauthorized, message)
    }

    #[inline]
    pub fn forbidden(message: impl ToString) -> ApiError {
        ApiError::new(Status::Forbidden, message)
    }

    #[inline]
    pub fn bad_request(message: impl ToString) -> ApiError {
        ApiError::new(Status::BadRequest, message)
    }

    #[inline]
    pub fn not_found(message: impl ToString) -> ApiError {
        ApiError::new(Status::NotFound, message)
    }

    #[inline]
    pub fn conflict(message: impl ToString) -> ApiError {
        ApiError::new(Status::Conflict, message)
    }

    #[inline]
    pub fn upstream(message: impl ToString) -> ApiError {
        ApiError::new(Status::BadGateway, message)
    }

    #[inline]
    pub fn internal(message: impl ToString) -> ApiError {
        ApiError::new(Status::InternalServerError, message)
    }

    pub fn status(&self) -> Status {
        self.status
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let body = serde_json::to_string(&self).map_err(|_| Status::InternalServerError)?;

        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(e: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        tracing::error!("database error: {}", e);

        let message = match e.kind.as_ref() {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::Authentication { .. } => "unable to reach the database",
            ErrorKind::Write(_) => "a write error occurred while storing data",
            ErrorKind::Transaction { .. } => "the booking transaction could not be completed",
            ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
                "stored data could not be processed"
            }
            _ => "database failed while processing request",
        };

        ApiError::internal(message)
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        tracing::debug!("token error: {}", e);
        ApiError::unauthorized("unauthorized access")
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        tracing::error!("payment gateway request error: {}", e);
        ApiError::upstream("payment gateway request failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::local::blocking::Client;

    #[get("/boom")]
    fn boom() -> Result<(), ApiError> {
        Err(ApiError::conflict("no seats available"))
    }

    #[test]
    fn error_body_shape_matches_contract() {
        let value = serde_json::to_value(ApiError::forbidden("forbidden access")).unwrap();

        assert_eq!(value["error"], serde_json::json!(true));
        assert_eq!(value["message"], serde_json::json!("forbidden access"));
        assert!(value.get("status").is_none(), "status must not leak into body");
    }

    #[test]
    fn responder_sets_status_and_json_body() {
        let client = Client::tracked(rocket::build().mount("/", routes![boom]))
            .expect("invalid test rocket");

        let response = client.get("/boom").dispatch();
        assert_eq!(response.status(), Status::Conflict);

        let body: serde_json::Value = response.into_json().expect("invalid response json");
        assert_eq!(body["error"], serde_json::json!(true));
        assert_eq!(body["message"], serde_json::json!("no seats available"));
    }
}
