use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod db;

pub static CLASS_COLLECTION_NAME: &str = "classes";

/// Moderation state, admin-gated. New classes start out pending.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    Pending,
    Approved,
    Denied,
}

impl Default for ClassStatus {
    fn default() -> Self {
        ClassStatus::Pending
    }
}

impl std::fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassStatus::Pending => write!(f, "pending"),
            ClassStatus::Approved => write!(f, "approved"),
            ClassStatus::Denied => write!(f, "denied"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    #[serde(rename = "_id", default = "ObjectId::new")]
    pub id: ObjectId,
    pub instructor_email: String,
    pub name: String,
    pub image: String,
    pub seats: i64,
    pub price: f64,
    #[serde(default)]
    pub enrolled: i64,
    #[serde(default)]
    pub status: ClassStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default = "bson::DateTime::now")]
    pub created_at: bson::DateTime,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassResponse {
    pub id: String,
    pub instructor_email: String,
    pub name: String,
    pub image: String,
    pub seats: i64,
    pub price: f64,
    pub enrolled: i64,
    pub status: ClassStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Class> for ClassResponse {
    fn from(value: Class) -> Self {
        Self {
            id: value.id.to_hex(),
            instructor_email: value.instructor_email,
            name: value.name,
            image: value.image,
            seats: value.seats,
            price: value.price,
            enrolled: value.enrolled,
            status: value.status,
            feedback: value.feedback,
            created_at: value.created_at.to_chrono(),
        }
    }
}

pub mod filter {
    use bson::{doc, oid::ObjectId, Document};

    use super::ClassStatus;

    #[inline]
    pub fn by_id(id: ObjectId) -> Document {
        doc! { "_id": id }
    }

    #[inline]
    pub fn by_instructor(email: impl ToString) -> Document {
        doc! { "instructorEmail": email.to_string() }
    }

    #[inline]
    pub fn by_status(status: ClassStatus) -> Document {
        doc! { "status": status.to_string() }
    }

    /// Matches the class only while a seat is still available, so the
    /// paired `$inc` can never drive `seats` negative.
    #[inline]
    pub fn with_open_seat(id: ObjectId) -> Document {
        doc! { "_id": id, "seats": { "$gt": 0 } }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_class_document_defaults() {
        let class: Class = bson::from_document(bson::doc! {
            "_id": ObjectId::new(),
            "instructorEmail": "yogi@example.com",
            "name": "Morning Flow",
            "image": "https://img.example.com/flow.jpg",
            "seats": 20_i64,
            "price": 49.99_f64,
        })
        .expect("class document must deserialize");

        assert_eq!(class.status, ClassStatus::Pending);
        assert_eq!(class.enrolled, 0);
        assert!(class.feedback.is_none());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ClassStatus::Approved).unwrap(),
            "\"approved\""
        );
        assert_eq!(ClassStatus::Denied.to_string(), "denied");
    }

    #[test]
    fn open_seat_filter_guards_on_positive_seats() {
        let id = ObjectId::new();
        let filter = filter::with_open_seat(id);

        assert_eq!(filter.get_object_id("_id").unwrap(), id);
        let seats = filter.get_document("seats").unwrap();
        assert_eq!(seats.get_i32("$gt").unwrap(), 0);
    }
}
