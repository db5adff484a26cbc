use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::Config;
use crate::data::user::db::{ProfileUpdateData, RoleUpdateData, UserDbExt};
use crate::data::user::{User, UserResponse};
use crate::data::UpdateResponse;
use crate::resp::error::ApiError;
use crate::resp::jwt::{AdminUser, AuthClaims};
use crate::role::Role;
use crate::route::parse_object_id;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Issues a short-lived bearer token for the posted identity.
#[utoipa::path(request_body = TokenRequest)]
#[post("/jwt", format = "application/json", data = "<user>")]
#[tracing::instrument]
pub fn jwt_issue(
    user: Json<TokenRequest>,
    config: &State<Config>,
) -> Result<Json<TokenResponse>, ApiError> {
    let claims = AuthClaims::new(&user.email, config.token_expiry_hours);
    let token = claims.encode_jwt(&config.access_token_secret)?;

    Ok(Json(TokenResponse { token }))
}

#[utoipa::path(
    responses(
        (status = 200, description = "Every registered user", body = Vec<UserResponse>),
        (status = 403, description = "Caller is not an admin", body = ApiError),
    ),
    security(("jwt" = []))
)]
#[get("/users")]
#[tracing::instrument]
pub async fn user_list(
    _auth: AdminUser,
    db: &State<Database>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = db.list_users().await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Public directory of instructors.
#[utoipa::path(
    responses(
        (status = 200, description = "Users with the instructor role", body = Vec<UserResponse>),
    )
)]
#[get("/allInstructors")]
#[tracing::instrument]
pub async fn instructor_list(db: &State<Database>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let instructors = db.list_instructors().await?;

    Ok(Json(
        instructors.into_iter().map(UserResponse::from).collect(),
    ))
}

#[utoipa::path(security(("jwt" = [])))]
#[get("/users/<email>")]
#[tracing::instrument]
pub async fn user_get(
    email: &str,
    auth: AuthClaims,
    db: &State<Database>,
) -> Result<Json<Option<UserResponse>>, ApiError> {
    if auth.email != email {
        return Err(ApiError::forbidden("forbidden access"));
    }

    let user = db.find_user_by_email(email).await?;

    Ok(Json(user.map(UserResponse::from)))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminCheckResponse {
    pub admin: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InstructorCheckResponse {
    pub instructor: bool,
}

/// Role probe used by the frontend router. A token for a different identity
/// gets a definitive `false` with no directory lookup.
#[utoipa::path(security(("jwt" = [])))]
#[get("/users/admin/<email>")]
#[tracing::instrument]
pub async fn user_admin_check(
    email: &str,
    auth: AuthClaims,
    db: &State<Database>,
) -> Result<Json<AdminCheckResponse>, ApiError> {
    if auth.email != email {
        return Ok(Json(AdminCheckResponse { admin: false }));
    }

    let user = db.find_user_by_email(email).await?;

    Ok(Json(AdminCheckResponse {
        admin: user.map(|u| u.role.is_admin()).unwrap_or(false),
    }))
}

#[utoipa::path(security(("jwt" = [])))]
#[get("/users/instructor/<email>")]
#[tracing::instrument]
pub async fn user_instructor_check(
    email: &str,
    auth: AuthClaims,
    db: &State<Database>,
) -> Result<Json<InstructorCheckResponse>, ApiError> {
    if auth.email != email {
        return Ok(Json(InstructorCheckResponse { instructor: false }));
    }

    let user = db.find_user_by_email(email).await?;

    Ok(Json(InstructorCheckResponse {
        instructor: user.map(|u| u.role == Role::Instructor).unwrap_or(false),
    }))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserCreateData {
    pub email: String,
    pub name: Option<String>,
    pub photo: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
}

impl UserCreateData {
    /// Role is never taken from the body; every account starts as a student.
    fn into_user(self) -> User {
        User {
            id: bson::oid::ObjectId::new(),
            email: self.email,
            role: Role::default(),
            name: self.name,
            photo: self.photo,
            phone: self.phone,
            address: self.address,
            gender: self.gender,
            created_at: bson::DateTime::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum UserCreatedResponse {
    AlreadyExists { message: String },
    #[serde(rename_all = "camelCase")]
    Inserted { acknowledged: bool, inserted_id: String },
}

/// Idempotent first-sign-in insert keyed by email.
#[utoipa::path(request_body = UserCreateData)]
#[post("/users", format = "application/json", data = "<user>")]
#[tracing::instrument]
pub async fn user_create(
    user: Json<UserCreateData>,
    db: &State<Database>,
) -> Result<Json<UserCreatedResponse>, ApiError> {
    let response = match db.create_user_if_absent(user.into_inner().into_user()).await? {
        Some(insert) => UserCreatedResponse::Inserted {
            acknowledged: insert.acknowledged,
            inserted_id: insert.inserted_id,
        },
        None => UserCreatedResponse::AlreadyExists {
            message: "user already exists".to_string(),
        },
    };

    Ok(Json(response))
}

#[utoipa::path(request_body = ProfileUpdateData, security(("jwt" = [])))]
#[patch("/users/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument]
pub async fn user_update(
    id: &str,
    update: Json<ProfileUpdateData>,
    _auth: AuthClaims,
    db: &State<Database>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let id = parse_object_id(id)?;

    Ok(Json(db.update_profile(id, &update).await?))
}

#[utoipa::path(request_body = RoleUpdateData, security(("jwt" = [])))]
#[patch("/users/admin/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument]
pub async fn user_role_update(
    id: &str,
    update: Json<RoleUpdateData>,
    _auth: AdminUser,
    db: &State<Database>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let id = parse_object_id(id)?;

    Ok(Json(db.update_role(id, update.role).await?))
}

///////////////////////
//       TESTS
///////////////////////

#[cfg(test)]
mod user_endpoints {
    use rocket::http::{ContentType, Header, Status};
    use rocket::local::asynchronous::Client;

    use crate::config::Config;
    use crate::resp::jwt::{decode_jwt, AuthClaims};
    use crate::route::test::test_rocket;

    use super::TokenResponse;

    fn bearer(email: &str) -> Header<'static> {
        let token = AuthClaims::new(email, 5)
            .encode_jwt(&Config::default().access_token_secret)
            .expect("unable to encode test token");
        Header::new("Authorization", format!("Bearer {}", token))
    }

    #[rocket::async_test]
    async fn jwt_issue_returns_decodable_token() {
        let client = Client::tracked(test_rocket().await)
            .await
            .expect("invalid backend");

        let response = client
            .post("/jwt")
            .header(ContentType::JSON)
            .body(r#"{"email":"alice@example.com"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let body: TokenResponse = response.into_json().await.expect("invalid response json");
        let claims = decode_jwt(&body.token, &Config::default().access_token_secret)
            .expect("issued token must decode");
        assert_eq!(claims.email, "alice@example.com");
    }

    #[rocket::async_test]
    async fn missing_token_is_unauthorized() {
        let client = Client::tracked(test_rocket().await)
            .await
            .expect("invalid backend");

        let response = client.get("/users").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);

        let body: serde_json::Value = response.into_json().await.expect("invalid response json");
        assert_eq!(body["error"], serde_json::json!(true));
        assert_eq!(body["message"], serde_json::json!("unauthorized access"));
    }

    #[rocket::async_test]
    async fn garbage_token_is_unauthorized() {
        let client = Client::tracked(test_rocket().await)
            .await
            .expect("invalid backend");

        let response = client
            .get("/users")
            .header(Header::new("Authorization", "Bearer not-a-jwt"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn mismatched_identity_is_forbidden() {
        let client = Client::tracked(test_rocket().await)
            .await
            .expect("invalid backend");

        let response = client
            .get("/users/bob@example.com")
            .header(bearer("alice@example.com"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        let body: serde_json::Value = response.into_json().await.expect("invalid response json");
        assert_eq!(body["error"], serde_json::json!(true));
    }

    #[rocket::async_test]
    async fn admin_probe_answers_false_on_identity_mismatch() {
        let client = Client::tracked(test_rocket().await)
            .await
            .expect("invalid backend");

        let response = client
            .get("/users/admin/bob@example.com")
            .header(bearer("alice@example.com"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let body: serde_json::Value = response.into_json().await.expect("invalid response json");
        assert_eq!(body["admin"], serde_json::json!(false));
    }

    #[rocket::async_test]
    async fn instructor_probe_answers_false_on_identity_mismatch() {
        let client = Client::tracked(test_rocket().await)
            .await
            .expect("invalid backend");

        let response = client
            .get("/users/instructor/bob@example.com")
            .header(bearer("alice@example.com"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let body: serde_json::Value = response.into_json().await.expect("invalid response json");
        assert_eq!(body["instructor"], serde_json::json!(false));
    }
}
