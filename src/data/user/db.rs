use bson::oid::ObjectId;
use bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};
use serde::Deserialize;
use utoipa::ToSchema;

use super::{filter, User, USER_COLLECTION_NAME};
use crate::data::{collect_documents, InsertResponse, UpdateResponse};
use crate::resp::error::ApiError;
use crate::role::Role;

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProfileUpdateData {
    pub name: Option<String>,
    pub photo: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
}

impl ProfileUpdateData {
    pub fn update_document(&self) -> Document {
        let mut set = Document::new();

        if let Some(name) = &self.name {
            set.insert("name", name);
        }
        if let Some(photo) = &self.photo {
            set.insert("photo", photo);
        }
        if let Some(phone) = &self.phone {
            set.insert("phone", phone);
        }
        if let Some(address) = &self.address {
            set.insert("address", address);
        }
        if let Some(gender) = &self.gender {
            set.insert("gender", gender);
        }

        doc! { "$set": set }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RoleUpdateData {
    pub role: Role,
}

/// Email is the natural key; the index makes concurrent first-sign-in
/// inserts for the same address collide instead of both landing.
fn email_unique_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000
    )
}

pub trait UserDbExt {
    /// Run once at startup, before the collection takes writes.
    async fn ensure_user_indexes(&self) -> Result<(), mongodb::error::Error>;

    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    async fn list_instructors(&self) -> Result<Vec<User>, ApiError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    /// Insert-if-absent keyed by email; `None` means the user already existed.
    async fn create_user_if_absent(&self, user: User) -> Result<Option<InsertResponse>, ApiError>;

    async fn update_profile(
        &self,
        id: ObjectId,
        update: &ProfileUpdateData,
    ) -> Result<UpdateResponse, ApiError>;
    async fn update_role(&self, id: ObjectId, role: Role) -> Result<UpdateResponse, ApiError>;
}

impl UserDbExt for Database {
    async fn ensure_user_indexes(&self) -> Result<(), mongodb::error::Error> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .create_index(email_unique_index(), None)
            .await?;

        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let cursor = self
            .collection::<User>(USER_COLLECTION_NAME)
            .find(None, None)
            .await?;

        Ok(collect_documents(cursor).await)
    }

    async fn list_instructors(&self) -> Result<Vec<User>, ApiError> {
        let cursor = self
            .collection::<User>(USER_COLLECTION_NAME)
            .find(filter::by_role(Role::Instructor), None)
            .await?;

        Ok(collect_documents(cursor).await)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .find_one(filter::by_email(email), None)
            .await
            .map_err(ApiError::from)
    }

    async fn create_user_if_absent(&self, user: User) -> Result<Option<InsertResponse>, ApiError> {
        if self.find_user_by_email(&user.email).await?.is_some() {
            return Ok(None);
        }

        // The unique email index closes the window between the lookup and
        // the insert; a racing duplicate surfaces as a key collision here.
        let result = match self
            .collection::<User>(USER_COLLECTION_NAME)
            .insert_one(&user, None)
            .await
        {
            Ok(result) => result,
            Err(e) if is_duplicate_key(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        tracing::info!("created user {} ({})", user.email, user.id.to_hex());
        Ok(Some(result.into()))
    }

    async fn update_profile(
        &self,
        id: ObjectId,
        update: &ProfileUpdateData,
    ) -> Result<UpdateResponse, ApiError> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .update_one(filter::by_id(id), update.update_document(), None)
            .await
            .map(UpdateResponse::from)
            .map_err(ApiError::from)
    }

    async fn update_role(&self, id: ObjectId, role: Role) -> Result<UpdateResponse, ApiError> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .update_one(
                filter::by_id(id),
                doc! { "$set": { "role": role.to_string() } },
                None,
            )
            .await
            .map(UpdateResponse::from)
            .map_err(ApiError::from)
    }
}
