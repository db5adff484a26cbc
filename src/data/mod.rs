use mongodb::results::{DeleteResult, InsertOneResult, UpdateResult};
use mongodb::Cursor;
use rocket::futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use utoipa::ToSchema;

pub mod class;
pub mod enrollment;
pub mod selection;
pub mod user;

/// Write acknowledgements mirroring the shape of MongoDB driver results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertResponse {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl From<InsertOneResult> for InsertResponse {
    fn from(value: InsertOneResult) -> Self {
        Self {
            acknowledged: true,
            inserted_id: value
                .inserted_id
                .as_object_id()
                .map(|id| id.to_hex())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl From<UpdateResult> for UpdateResponse {
    fn from(value: UpdateResult) -> Self {
        Self {
            acknowledged: true,
            matched_count: value.matched_count,
            modified_count: value.modified_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl From<DeleteResult> for DeleteResponse {
    fn from(value: DeleteResult) -> Self {
        Self {
            acknowledged: true,
            deleted_count: value.deleted_count,
        }
    }
}

/// Drains a typed cursor, skipping documents that no longer deserialize.
pub(crate) async fn collect_documents<T>(mut cursor: Cursor<T>) -> Vec<T>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let mut documents = Vec::new();

    while let Some(next) = cursor.next().await {
        match next {
            Ok(document) => documents.push(document),
            Err(e) => {
                tracing::warn!("skipping document that failed to deserialize: {}", e)
            }
        }
    }

    documents
}
