use bson::{doc, oid::ObjectId};
use mongodb::options::FindOptions;
use mongodb::Database;
use serde::Deserialize;
use utoipa::ToSchema;

use super::{filter, Class, ClassStatus, CLASS_COLLECTION_NAME};
use crate::data::{collect_documents, InsertResponse, UpdateResponse};
use crate::resp::error::ApiError;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassCreateData {
    pub instructor_email: String,
    pub name: String,
    pub image: String,
    pub seats: i64,
    pub price: f64,
}

impl ClassCreateData {
    /// Server assigns id, timestamp, and the initial moderation state.
    pub fn into_class(self) -> Class {
        Class {
            id: ObjectId::new(),
            instructor_email: self.instructor_email,
            name: self.name,
            image: self.image,
            seats: self.seats,
            price: self.price,
            enrolled: 0,
            status: ClassStatus::Pending,
            feedback: None,
            created_at: bson::DateTime::now(),
        }
    }
}

/// Instructor-editable listing fields.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClassUpdateData {
    pub name: String,
    pub image: String,
    pub seats: i64,
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StatusUpdateData {
    pub status: ClassStatus,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FeedbackUpdateData {
    pub feedback: String,
}

fn newest_first() -> FindOptions {
    FindOptions::builder().sort(doc! { "createdAt": -1 }).build()
}

pub trait ClassDbExt {
    async fn list_classes(&self) -> Result<Vec<Class>, ApiError>;
    async fn list_approved_classes(&self) -> Result<Vec<Class>, ApiError>;
    async fn list_classes_by_instructor(&self, email: &str) -> Result<Vec<Class>, ApiError>;
    async fn create_class(&self, class: &Class) -> Result<InsertResponse, ApiError>;
    async fn update_class_details(
        &self,
        id: ObjectId,
        update: &ClassUpdateData,
    ) -> Result<UpdateResponse, ApiError>;
    async fn update_class_status(
        &self,
        id: ObjectId,
        status: ClassStatus,
    ) -> Result<UpdateResponse, ApiError>;
    async fn update_class_feedback(
        &self,
        id: ObjectId,
        feedback: &str,
    ) -> Result<UpdateResponse, ApiError>;
}

impl ClassDbExt for Database {
    async fn list_classes(&self) -> Result<Vec<Class>, ApiError> {
        let cursor = self
            .collection::<Class>(CLASS_COLLECTION_NAME)
            .find(None, newest_first())
            .await?;

        Ok(collect_documents(cursor).await)
    }

    async fn list_approved_classes(&self) -> Result<Vec<Class>, ApiError> {
        let cursor = self
            .collection::<Class>(CLASS_COLLECTION_NAME)
            .find(filter::by_status(ClassStatus::Approved), newest_first())
            .await?;

        Ok(collect_documents(cursor).await)
    }

    async fn list_classes_by_instructor(&self, email: &str) -> Result<Vec<Class>, ApiError> {
        let cursor = self
            .collection::<Class>(CLASS_COLLECTION_NAME)
            .find(filter::by_instructor(email), newest_first())
            .await?;

        Ok(collect_documents(cursor).await)
    }

    async fn create_class(&self, class: &Class) -> Result<InsertResponse, ApiError> {
        let result = self
            .collection::<Class>(CLASS_COLLECTION_NAME)
            .insert_one(class, None)
            .await?;

        tracing::info!(
            "instructor {} submitted class '{}' for review",
            class.instructor_email,
            class.name
        );
        Ok(result.into())
    }

    async fn update_class_details(
        &self,
        id: ObjectId,
        update: &ClassUpdateData,
    ) -> Result<UpdateResponse, ApiError> {
        self.collection::<Class>(CLASS_COLLECTION_NAME)
            .update_one(
                filter::by_id(id),
                doc! {
                    "$set": {
                        "name": &update.name,
                        "image": &update.image,
                        "seats": update.seats,
                        "price": update.price,
                    }
                },
                None,
            )
            .await
            .map(UpdateResponse::from)
            .map_err(ApiError::from)
    }

    async fn update_class_status(
        &self,
        id: ObjectId,
        status: ClassStatus,
    ) -> Result<UpdateResponse, ApiError> {
        self.collection::<Class>(CLASS_COLLECTION_NAME)
            .update_one(
                filter::by_id(id),
                doc! { "$set": { "status": status.to_string() } },
                None,
            )
            .await
            .map(UpdateResponse::from)
            .map_err(ApiError::from)
    }

    async fn update_class_feedback(
        &self,
        id: ObjectId,
        feedback: &str,
    ) -> Result<UpdateResponse, ApiError> {
        self.collection::<Class>(CLASS_COLLECTION_NAME)
            .update_one(
                filter::by_id(id),
                doc! { "$set": { "feedback": feedback } },
                None,
            )
            .await
            .map(UpdateResponse::from)
            .map_err(ApiError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_data_becomes_pending_class() {
        let data = ClassCreateData {
            instructor_email: "yogi@example.com".to_string(),
            name: "Evening Meditation".to_string(),
            image: "https://img.example.com/evening.jpg".to_string(),
            seats: 15,
            price: 25.0,
        };

        let class = data.into_class();
        assert_eq!(class.status, ClassStatus::Pending);
        assert_eq!(class.enrolled, 0);
        assert_eq!(class.seats, 15);
        assert!(class.feedback.is_none());
    }
}
