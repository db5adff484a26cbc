use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod db;

pub static SELECTION_COLLECTION_NAME: &str = "selectedClasses";

/// A student's unpaid intent to enroll (cart entry). Consumed by a
/// successful booking or removed explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(rename = "_id", default = "ObjectId::new")]
    pub id: ObjectId,
    pub student_email: String,
    pub class_id: ObjectId,
    /// Price at the time the class was selected.
    pub price: f64,
    #[serde(default = "bson::DateTime::now")]
    pub created_at: bson::DateTime,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResponse {
    pub id: String,
    pub student_email: String,
    pub class_id: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Selection> for SelectionResponse {
    fn from(value: Selection) -> Self {
        Self {
            id: value.id.to_hex(),
            student_email: value.student_email,
            class_id: value.class_id.to_hex(),
            price: value.price,
            created_at: value.created_at.to_chrono(),
        }
    }
}

pub mod filter {
    use bson::{doc, oid::ObjectId, Document};

    #[inline]
    pub fn by_id(id: ObjectId) -> Document {
        doc! { "_id": id }
    }

    #[inline]
    pub fn by_student(email: impl ToString) -> Document {
        doc! { "studentEmail": email.to_string() }
    }
}
