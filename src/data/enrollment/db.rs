use bson::doc;
use bson::oid::ObjectId;
use mongodb::options::{Acknowledgment, ReadConcern, TransactionOptions, WriteConcern};
use mongodb::{Client, ClientSession, Database};
use serde::Serialize;
use utoipa::ToSchema;

use super::{Enrollment, ENROLLMENT_COLLECTION_NAME};
use crate::data::class::{filter as class_filter, Class, CLASS_COLLECTION_NAME};
use crate::data::selection::{filter as selection_filter, Selection, SELECTION_COLLECTION_NAME};
use crate::data::{DeleteResponse, InsertResponse, UpdateResponse};
use crate::resp::error::ApiError;

/// Verified input for a booking: identity from the token, references and
/// gateway metadata from the caller.
#[derive(Debug, Clone)]
pub struct BookingData {
    pub student_email: String,
    pub class_id: ObjectId,
    pub selection_id: ObjectId,
    pub amount: f64,
    pub transaction_id: String,
}

/// The three per-collection write acknowledgements of a completed booking.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    pub insert_result: InsertResponse,
    pub delete_result: DeleteResponse,
    pub update_result: UpdateResponse,
}

pub trait EnrollmentDbExt {
    async fn complete_enrollment(
        &self,
        client: &Client,
        booking: BookingData,
    ) -> Result<BookingReceipt, ApiError>;
}

impl EnrollmentDbExt for Database {
    /// Converts a paid selection into an enrollment.
    ///
    /// Enrollment insert, selection delete, and seat accounting run in a
    /// single multi-document transaction; the seat decrement is additionally
    /// guarded by `seats > 0`, so concurrent bookings of the last seat
    /// cannot both commit. Any failure aborts with no partial writes, and
    /// the caller retries from the untouched selection.
    async fn complete_enrollment(
        &self,
        client: &Client,
        booking: BookingData,
    ) -> Result<BookingReceipt, ApiError> {
        let mut session = client.start_session(None).await?;

        let options = TransactionOptions::builder()
            .read_concern(ReadConcern::snapshot())
            .write_concern(WriteConcern::builder().w(Acknowledgment::Majority).build())
            .build();
        session.start_transaction(options).await?;

        match book_in_session(self, &mut session, &booking).await {
            Ok(receipt) => {
                session.commit_transaction().await?;
                tracing::info!(
                    "enrolled {} in class {} (transaction {})",
                    booking.student_email,
                    booking.class_id.to_hex(),
                    booking.transaction_id
                );
                Ok(receipt)
            }
            Err(e) => {
                if let Err(abort) = session.abort_transaction().await {
                    tracing::warn!("unable to abort booking transaction: {}", abort);
                }
                Err(e)
            }
        }
    }
}

/// The selection must belong to the booking's student and reference the
/// class being paid for; anything else aborts before a write happens.
fn check_selection_ownership(selection: &Selection, booking: &BookingData) -> Result<(), ApiError> {
    if selection.student_email != booking.student_email {
        return Err(ApiError::forbidden("forbidden access"));
    }
    if selection.class_id != booking.class_id {
        return Err(ApiError::bad_request(
            "selection does not reference the given class",
        ));
    }

    Ok(())
}

/// Maps a seat decrement that matched nothing: the class is either sold
/// out or gone.
fn seat_claim_error(class_exists: bool) -> ApiError {
    if class_exists {
        ApiError::conflict("no seats available")
    } else {
        ApiError::not_found("class not found")
    }
}

async fn book_in_session(
    db: &Database,
    session: &mut ClientSession,
    booking: &BookingData,
) -> Result<BookingReceipt, ApiError> {
    let selections = db.collection::<Selection>(SELECTION_COLLECTION_NAME);

    let selection = selections
        .find_one_with_session(selection_filter::by_id(booking.selection_id), None, session)
        .await?
        .ok_or_else(|| ApiError::not_found("selected class not found"))?;

    check_selection_ownership(&selection, booking)?;

    // Conditional decrement; matches nothing once the class is sold out.
    let classes = db.collection::<Class>(CLASS_COLLECTION_NAME);
    let update_result = classes
        .update_one_with_session(
            class_filter::with_open_seat(booking.class_id),
            doc! { "$inc": { "seats": -1_i64, "enrolled": 1_i64 } },
            None,
            session,
        )
        .await?;

    if update_result.modified_count == 0 {
        let class_exists = classes
            .find_one_with_session(class_filter::by_id(booking.class_id), None, session)
            .await?
            .is_some();

        return Err(seat_claim_error(class_exists));
    }

    let enrollment = Enrollment {
        id: ObjectId::new(),
        student_email: booking.student_email.clone(),
        class_id: booking.class_id,
        selection_id: booking.selection_id,
        amount: booking.amount,
        transaction_id: booking.transaction_id.clone(),
        created_at: bson::DateTime::now(),
    };

    let insert_result = db
        .collection::<Enrollment>(ENROLLMENT_COLLECTION_NAME)
        .insert_one_with_session(&enrollment, None, session)
        .await?;

    let delete_result = selections
        .delete_one_with_session(selection_filter::by_id(booking.selection_id), None, session)
        .await?;
    if delete_result.deleted_count != 1 {
        return Err(ApiError::internal(
            "selected class vanished while booking",
        ));
    }

    Ok(BookingReceipt {
        insert_result: insert_result.into(),
        delete_result: delete_result.into(),
        update_result: update_result.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::Status;

    fn selection_for(email: &str, class_id: ObjectId) -> Selection {
        Selection {
            id: ObjectId::new(),
            student_email: email.to_string(),
            class_id,
            price: 25.0,
            created_at: bson::DateTime::now(),
        }
    }

    fn booking_for(email: &str, class_id: ObjectId, selection_id: ObjectId) -> BookingData {
        BookingData {
            student_email: email.to_string(),
            class_id,
            selection_id,
            amount: 25.0,
            transaction_id: "pi_test".to_string(),
        }
    }

    #[test]
    fn matching_selection_passes_ownership_check() {
        let class_id = ObjectId::new();
        let selection = selection_for("alice@example.com", class_id);
        let booking = booking_for("alice@example.com", class_id, selection.id);

        assert!(check_selection_ownership(&selection, &booking).is_ok());
    }

    #[test]
    fn booking_someone_elses_selection_is_forbidden() {
        let class_id = ObjectId::new();
        let selection = selection_for("alice@example.com", class_id);
        let booking = booking_for("mallory@example.com", class_id, selection.id);

        let err = check_selection_ownership(&selection, &booking)
            .expect_err("foreign selection must be rejected");
        assert_eq!(err.status(), Status::Forbidden);
    }

    #[test]
    fn selection_for_a_different_class_is_rejected() {
        let selection = selection_for("alice@example.com", ObjectId::new());
        let booking = booking_for("alice@example.com", ObjectId::new(), selection.id);

        let err = check_selection_ownership(&selection, &booking)
            .expect_err("class mismatch must be rejected");
        assert_eq!(err.status(), Status::BadRequest);
    }

    #[test]
    fn sold_out_class_answers_conflict() {
        let err = seat_claim_error(true);
        assert_eq!(err.status(), Status::Conflict);
        assert_eq!(err.message, "no seats available");
    }

    #[test]
    fn vanished_class_answers_not_found() {
        assert_eq!(seat_claim_error(false).status(), Status::NotFound);
    }

    #[test]
    fn receipt_serializes_the_three_driver_results() {
        let receipt = BookingReceipt {
            insert_result: InsertResponse {
                acknowledged: true,
                inserted_id: ObjectId::new().to_hex(),
            },
            delete_result: DeleteResponse {
                acknowledged: true,
                deleted_count: 1,
            },
            update_result: UpdateResponse {
                acknowledged: true,
                matched_count: 1,
                modified_count: 1,
            },
        };

        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["insertResult"]["acknowledged"], serde_json::json!(true));
        assert_eq!(value["deleteResult"]["deletedCount"], serde_json::json!(1));
        assert_eq!(value["updateResult"]["modifiedCount"], serde_json::json!(1));
    }
}
