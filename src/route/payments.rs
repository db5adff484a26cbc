use mongodb::{Client, Database};
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::data::enrollment::db::{BookingData, BookingReceipt, EnrollmentDbExt};
use crate::payment::{to_minor_units, PaymentGateway};
use crate::resp::error::ApiError;
use crate::resp::jwt::AuthClaims;
use crate::route::parse_object_id;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PaymentIntentRequest {
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientSecretResponse {
    pub client_secret: String,
}

/// Asks the gateway to authorize the amount. No local state is touched, so
/// a failure here is always retryable.
#[utoipa::path(
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Client-usable payment secret", body = ClientSecretResponse),
        (status = 400, description = "Missing or non-positive price", body = ApiError),
        (status = 502, description = "Payment gateway failure", body = ApiError),
    ),
    security(("jwt" = []))
)]
#[post("/create-payment-intent", format = "application/json", data = "<request>")]
#[tracing::instrument]
pub async fn payment_intent_create(
    request: Json<PaymentIntentRequest>,
    _auth: AuthClaims,
    gateway: &State<PaymentGateway>,
) -> Result<Json<ClientSecretResponse>, ApiError> {
    let amount = to_minor_units(request.price)
        .ok_or_else(|| ApiError::bad_request("price must be a positive amount"))?;

    let intent = gateway.create_payment_intent(amount).await?;

    Ok(Json(ClientSecretResponse {
        client_secret: intent.client_secret,
    }))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecordData {
    /// Hex id of the cart entry being consumed.
    pub selected_id: String,
    /// Hex id of the class being booked.
    pub class_id: String,
    pub amount: f64,
    pub transaction_id: String,
}

/// Converts the paid selection into an enrollment. The three writes either
/// all commit or none do; on failure the caller retries with the cart entry
/// still in place.
#[utoipa::path(
    request_body = PaymentRecordData,
    responses(
        (status = 200, description = "Booking committed", body = BookingReceipt),
        (status = 404, description = "Selection or class missing", body = ApiError),
        (status = 409, description = "Class is sold out", body = ApiError),
    ),
    security(("jwt" = []))
)]
#[post("/payments", format = "application/json", data = "<payment>")]
#[tracing::instrument]
pub async fn payment_complete(
    payment: Json<PaymentRecordData>,
    auth: AuthClaims,
    db: &State<Database>,
    client: &State<Client>,
) -> Result<Json<BookingReceipt>, ApiError> {
    let payment = payment.into_inner();

    let booking = BookingData {
        student_email: auth.email,
        class_id: parse_object_id(&payment.class_id)?,
        selection_id: parse_object_id(&payment.selected_id)?,
        amount: payment.amount,
        transaction_id: payment.transaction_id,
    };

    let receipt = db.complete_enrollment(client, booking).await?;

    Ok(Json(receipt))
}

///////////////////////
//       TESTS
///////////////////////
