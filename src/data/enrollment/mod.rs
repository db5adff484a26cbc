use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub mod db;

pub static ENROLLMENT_COLLECTION_NAME: &str = "enrollments";

/// A confirmed, paid booking. Written exactly once per successful payment,
/// never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    #[serde(rename = "_id", default = "ObjectId::new")]
    pub id: ObjectId,
    pub student_email: String,
    pub class_id: ObjectId,
    /// The consumed cart entry.
    pub selection_id: ObjectId,
    pub amount: f64,
    pub transaction_id: String,
    #[serde(default = "bson::DateTime::now")]
    pub created_at: bson::DateTime,
}
