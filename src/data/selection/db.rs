use bson::oid::ObjectId;
use mongodb::Database;
use serde::Deserialize;
use utoipa::ToSchema;

use super::{filter, Selection, SELECTION_COLLECTION_NAME};
use crate::data::{collect_documents, DeleteResponse, InsertResponse};
use crate::resp::error::ApiError;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectionCreateData {
    /// Hex id of the class being selected.
    pub class_id: String,
    pub price: f64,
}

pub trait SelectionDbExt {
    async fn list_selections_for_student(&self, email: &str) -> Result<Vec<Selection>, ApiError>;
    async fn create_selection(&self, selection: &Selection) -> Result<InsertResponse, ApiError>;
    async fn delete_selection(&self, id: ObjectId) -> Result<DeleteResponse, ApiError>;
}

impl SelectionDbExt for Database {
    async fn list_selections_for_student(&self, email: &str) -> Result<Vec<Selection>, ApiError> {
        let cursor = self
            .collection::<Selection>(SELECTION_COLLECTION_NAME)
            .find(filter::by_student(email), None)
            .await?;

        Ok(collect_documents(cursor).await)
    }

    async fn create_selection(&self, selection: &Selection) -> Result<InsertResponse, ApiError> {
        let result = self
            .collection::<Selection>(SELECTION_COLLECTION_NAME)
            .insert_one(selection, None)
            .await?;

        Ok(result.into())
    }

    async fn delete_selection(&self, id: ObjectId) -> Result<DeleteResponse, ApiError> {
        self.collection::<Selection>(SELECTION_COLLECTION_NAME)
            .delete_one(filter::by_id(id), None)
            .await
            .map(DeleteResponse::from)
            .map_err(ApiError::from)
    }
}
