use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;

use crate::data::class::db::{
    ClassCreateData, ClassDbExt, ClassUpdateData, FeedbackUpdateData, StatusUpdateData,
};
use crate::data::class::ClassResponse;
use crate::data::{InsertResponse, UpdateResponse};
use crate::resp::error::ApiError;
use crate::resp::jwt::{AdminUser, AuthClaims};
use crate::route::parse_object_id;

/// Full catalog for the admin dashboard, newest first.
#[utoipa::path(
    responses(
        (status = 200, description = "All classes, any status", body = Vec<ClassResponse>),
    ),
    security(("jwt" = []))
)]
#[get("/classes")]
#[tracing::instrument]
pub async fn class_list(
    _auth: AdminUser,
    db: &State<Database>,
) -> Result<Json<Vec<ClassResponse>>, ApiError> {
    let classes = db.list_classes().await?;

    Ok(Json(classes.into_iter().map(ClassResponse::from).collect()))
}

/// Approved classes only; the public browsing surface.
#[utoipa::path(
    responses(
        (status = 200, description = "Approved classes, newest first", body = Vec<ClassResponse>),
    )
)]
#[get("/publicClasses")]
#[tracing::instrument]
pub async fn public_class_list(db: &State<Database>) -> Result<Json<Vec<ClassResponse>>, ApiError> {
    let classes = db.list_approved_classes().await?;

    Ok(Json(classes.into_iter().map(ClassResponse::from).collect()))
}

#[utoipa::path(security(("jwt" = [])))]
#[get("/classes/instructor/<email>")]
#[tracing::instrument]
pub async fn instructor_class_list(
    email: &str,
    auth: AuthClaims,
    db: &State<Database>,
) -> Result<Json<Vec<ClassResponse>>, ApiError> {
    if auth.email != email {
        return Err(ApiError::forbidden("forbidden access"));
    }

    let classes = db.list_classes_by_instructor(email).await?;

    Ok(Json(classes.into_iter().map(ClassResponse::from).collect()))
}

#[utoipa::path(request_body = ClassCreateData, security(("jwt" = [])))]
#[post("/classes", format = "application/json", data = "<class>")]
#[tracing::instrument]
pub async fn class_create(
    class: Json<ClassCreateData>,
    auth: AuthClaims,
    db: &State<Database>,
) -> Result<Json<InsertResponse>, ApiError> {
    if class.instructor_email != auth.email {
        return Err(ApiError::forbidden("forbidden access"));
    }

    let class = class.into_inner().into_class();

    Ok(Json(db.create_class(&class).await?))
}

#[utoipa::path(request_body = ClassUpdateData, security(("jwt" = [])))]
#[patch("/classes/instructor/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument]
pub async fn class_update(
    id: &str,
    update: Json<ClassUpdateData>,
    _auth: AuthClaims,
    db: &State<Database>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let id = parse_object_id(id)?;

    Ok(Json(db.update_class_details(id, &update).await?))
}

/// Admin moderation: pending → approved/denied.
#[utoipa::path(request_body = StatusUpdateData, security(("jwt" = [])))]
#[patch("/classes/admin/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument]
pub async fn class_status_update(
    id: &str,
    update: Json<StatusUpdateData>,
    _auth: AdminUser,
    db: &State<Database>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let id = parse_object_id(id)?;

    Ok(Json(db.update_class_status(id, update.status).await?))
}

#[utoipa::path(request_body = FeedbackUpdateData, security(("jwt" = [])))]
#[patch("/classes/feedback/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument]
pub async fn class_feedback_update(
    id: &str,
    update: Json<FeedbackUpdateData>,
    _auth: AdminUser,
    db: &State<Database>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let id = parse_object_id(id)?;

    Ok(Json(db.update_class_feedback(id, &update.feedback).await?))
}

///////////////////////
//       TESTS
///////////////////////
