use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::role::Role;

pub mod db;

pub static USER_COLLECTION_NAME: &str = "users";

/// User profile document, keyed by email as the natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default = "ObjectId::new")]
    pub id: ObjectId,
    pub email: String,
    /// Absent on documents written before any role was assigned.
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default = "bson::DateTime::now")]
    pub created_at: bson::DateTime,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        Self {
            id: value.id.to_hex(),
            email: value.email,
            role: value.role,
            name: value.name,
            photo: value.photo,
            phone: value.phone,
            address: value.address,
            gender: value.gender,
            created_at: value.created_at.to_chrono(),
        }
    }
}

pub mod filter {
    use bson::{doc, oid::ObjectId, Document};

    use crate::role::Role;

    #[inline]
    pub fn by_id(id: ObjectId) -> Document {
        doc! { "_id": id }
    }

    #[inline]
    pub fn by_email(email: impl ToString) -> Document {
        doc! { "email": email.to_string() }
    }

    #[inline]
    pub fn by_role(role: Role) -> Document {
        doc! { "role": role.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_document_without_role_defaults_to_student() {
        let user: User = bson::from_document(bson::doc! {
            "_id": ObjectId::new(),
            "email": "alice@example.com",
            "name": "Alice",
        })
        .expect("legacy user document must deserialize");

        assert_eq!(user.role, Role::Student);
        assert_eq!(user.name.as_deref(), Some("Alice"));
        assert!(user.photo.is_none());
    }

    #[test]
    fn response_uses_hex_id_and_camel_case() {
        let id = ObjectId::new();
        let user: User = bson::from_document(bson::doc! {
            "_id": id,
            "email": "bob@example.com",
            "role": "instructor",
        })
        .expect("user document must deserialize");

        let response = UserResponse::from(user);
        assert_eq!(response.id, id.to_hex());
        assert_eq!(response.role, Role::Instructor);

        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("created_at").is_none());
    }
}
