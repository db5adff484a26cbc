use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;

use crate::data::selection::db::{SelectionCreateData, SelectionDbExt};
use crate::data::selection::{Selection, SelectionResponse};
use crate::data::{DeleteResponse, InsertResponse};
use crate::resp::error::ApiError;
use crate::resp::jwt::AuthClaims;
use crate::route::parse_object_id;

#[utoipa::path(security(("jwt" = [])))]
#[get("/selectedClasses/<email>")]
#[tracing::instrument]
pub async fn selection_list(
    email: &str,
    auth: AuthClaims,
    db: &State<Database>,
) -> Result<Json<Vec<SelectionResponse>>, ApiError> {
    if auth.email != email {
        return Err(ApiError::forbidden("forbidden access"));
    }

    let selections = db.list_selections_for_student(email).await?;

    Ok(Json(
        selections
            .into_iter()
            .map(SelectionResponse::from)
            .collect(),
    ))
}

/// Puts a class in the caller's cart with a price snapshot.
#[utoipa::path(request_body = SelectionCreateData, security(("jwt" = [])))]
#[post("/selectedClasses", format = "application/json", data = "<selection>")]
#[tracing::instrument]
pub async fn selection_create(
    selection: Json<SelectionCreateData>,
    auth: AuthClaims,
    db: &State<Database>,
) -> Result<Json<InsertResponse>, ApiError> {
    let class_id = parse_object_id(&selection.class_id)?;

    let selection = Selection {
        id: bson::oid::ObjectId::new(),
        student_email: auth.email,
        class_id,
        price: selection.price,
        created_at: bson::DateTime::now(),
    };

    Ok(Json(db.create_selection(&selection).await?))
}

#[utoipa::path(
    responses(
        (status = 200, description = "Delete acknowledgement", body = DeleteResponse),
    )
)]
#[delete("/selectedClasses/<id>")]
#[tracing::instrument]
pub async fn selection_delete(
    id: &str,
    db: &State<Database>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_object_id(id)?;

    Ok(Json(db.delete_selection(id).await?))
}

///////////////////////
//       TESTS
///////////////////////

#[cfg(test)]
mod selection_endpoints {
    use rocket::http::{ContentType, Header, Status};
    use rocket::local::asynchronous::Client;

    use crate::config::Config;
    use crate::resp::jwt::AuthClaims;
    use crate::route::test::test_rocket;

    fn bearer(email: &str) -> Header<'static> {
        let token = AuthClaims::new(email, 5)
            .encode_jwt(&Config::default().access_token_secret)
            .expect("unable to encode test token");
        Header::new("Authorization", format!("Bearer {}", token))
    }

    #[rocket::async_test]
    async fn selection_list_is_self_scoped() {
        let client = Client::tracked(test_rocket().await)
            .await
            .expect("invalid backend");

        let response = client
            .get("/selectedClasses/bob@example.com")
            .header(bearer("alice@example.com"))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn selection_create_rejects_malformed_class_id() {
        let client = Client::tracked(test_rocket().await)
            .await
            .expect("invalid backend");

        let response = client
            .post("/selectedClasses")
            .header(ContentType::JSON)
            .header(bearer("alice@example.com"))
            .body(r#"{"classId":"not-an-object-id","price":25.0}"#)
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
    }
}
