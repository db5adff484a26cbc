use bson::oid::ObjectId;
use rocket::{Build, Catcher, Rocket, Route};

pub mod classes;
pub mod payments;
pub mod selections;
pub mod users;

use classes::*;
use payments::*;
use selections::*;
use users::*;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    data::class::db as class_data,
    data::class::{ClassResponse, ClassStatus},
    data::enrollment::db::BookingReceipt,
    data::selection::db::SelectionCreateData,
    data::selection::SelectionResponse,
    data::user::db as user_data,
    data::user::UserResponse,
    data::{DeleteResponse, InsertResponse, UpdateResponse},
    resp::{error::ApiError, jwt::doc::JWTAuth},
    role::Role,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        jwt_issue,
        user_list,
        instructor_list,
        user_get,
        user_admin_check,
        user_instructor_check,
        user_create,
        user_update,
        user_role_update,
        class_list,
        public_class_list,
        instructor_class_list,
        class_create,
        class_update,
        class_status_update,
        class_feedback_update,
        selection_list,
        selection_create,
        selection_delete,
        payment_intent_create,
        payment_complete
    ),
    components(schemas(
        Role,
        ClassStatus,
        UserResponse,
        ClassResponse,
        SelectionResponse,
        TokenRequest,
        TokenResponse,
        UserCreateData,
        UserCreatedResponse,
        AdminCheckResponse,
        InstructorCheckResponse,
        user_data::ProfileUpdateData,
        user_data::RoleUpdateData,
        class_data::ClassCreateData,
        class_data::ClassUpdateData,
        class_data::StatusUpdateData,
        class_data::FeedbackUpdateData,
        SelectionCreateData,
        PaymentIntentRequest,
        ClientSecretResponse,
        PaymentRecordData,
        BookingReceipt,
        InsertResponse,
        UpdateResponse,
        DeleteResponse,
        ApiError
    )),
    modifiers(&JWTAuth)
)]
pub struct ApiDoc;

pub(crate) fn parse_object_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::bad_request("malformed document id"))
}

#[get("/")]
pub fn index() -> &'static str {
    "server is running"
}

#[catch(401)]
pub fn unauthorized() -> ApiError {
    ApiError::unauthorized("unauthorized access")
}

#[catch(403)]
pub fn forbidden() -> ApiError {
    ApiError::forbidden("forbidden access")
}

pub fn api() -> Vec<Route> {
    routes![
        index,
        jwt_issue,
        user_list,
        instructor_list,
        user_get,
        user_admin_check,
        user_instructor_check,
        user_create,
        user_update,
        user_role_update,
        class_list,
        public_class_list,
        instructor_class_list,
        class_create,
        class_update,
        class_status_update,
        class_feedback_update,
        selection_list,
        selection_create,
        selection_delete,
        payment_intent_create,
        payment_complete
    ]
}

pub fn api_catchers() -> Vec<Catcher> {
    catchers![unauthorized, forbidden]
}

pub fn mount_api(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/", api())
        .mount(
            "/",
            SwaggerUi::new("/swagger/<_..>").url("/api/openapi.json", ApiDoc::openapi()),
        )
        .register("/", api_catchers())
}

#[cfg(test)]
pub mod test {
    use crate::config::Config;
    use crate::payment::PaymentGateway;
    use rocket::{Build, Rocket};

    /// Backend wired against a lazily-connecting Mongo client; tests only
    /// exercise paths that never reach the database.
    pub async fn test_rocket() -> Rocket<Build> {
        let config = Config::default();
        let client = mongodb::Client::with_uri_str(&config.mongodb_uri)
            .await
            .expect("invalid test mongodb uri");
        let db = client.database("zenbookTest");
        let gateway = PaymentGateway::new(
            "sk_test_unused".to_string(),
            config.stripe_api_base.clone(),
            config.currency.clone(),
        );

        rocket::build()
            .manage(config)
            .manage(client)
            .manage(db)
            .manage(gateway)
            .mount("/", super::api())
            .register("/", super::api_catchers())
    }
}
