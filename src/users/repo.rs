use anyhow::Context;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{ClientOptions, FindOneAndUpdateOptions, ReturnDocument},
    Client, Collection,
};
use tracing::info;

use super::repo_types::{parse_id, NewUser, StoreError, UserDocument, UserFields};

const APP_NAME: &str = "users-service";
const DEFAULT_DATABASE: &str = "test";
const USERS_COLLECTION: &str = "users";

/// Persistence operations over the users collection.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<UserDocument, StoreError>;

    /// Never errors on an empty result.
    async fn find_users(&self, filter: &UserFields) -> Result<Vec<UserDocument>, StoreError>;

    async fn find_user_by_id(&self, id: &str) -> Result<Option<UserDocument>, StoreError>;

    /// Returns the document as it is after the update.
    async fn update_user(
        &self,
        id: &str,
        updates: &UserFields,
    ) -> Result<Option<UserDocument>, StoreError>;

    /// Deletes every matching document. An empty filter deletes the whole collection.
    async fn delete_users(&self, filter: &UserFields) -> Result<u64, StoreError>;

    async fn delete_user_by_id(&self, id: &str) -> Result<Option<UserDocument>, StoreError>;
}

#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<UserDocument>,
}

impl MongoUserStore {
    /// Connects once and pings the server so an unreachable database fails here.
    pub async fn connect(uri: &str, database: Option<&str>) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .context("parse MongoDB connection string")?;
        options.app_name = Some(APP_NAME.into());
        let client = Client::with_options(options).context("build MongoDB client")?;

        let db = match database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };
        db.run_command(doc! { "ping": 1 }, None)
            .await
            .context("could not connect to MongoDB")?;

        info!(database = %db.name(), "connected to MongoDB");
        Ok(Self {
            users: db.collection(USERS_COLLECTION),
        })
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn create_user(&self, user: NewUser) -> Result<UserDocument, StoreError> {
        let user = user.into_document();
        self.users.insert_one(&user, None).await?;
        Ok(user)
    }

    async fn find_users(&self, filter: &UserFields) -> Result<Vec<UserDocument>, StoreError> {
        let cursor = self.users.find(filter.to_document(), None).await?;
        let users: Vec<UserDocument> = cursor.try_collect().await?;
        Ok(users)
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<UserDocument>, StoreError> {
        let id = parse_id(id)?;
        Ok(self.users.find_one(doc! { "_id": id }, None).await?)
    }

    async fn update_user(
        &self,
        id: &str,
        updates: &UserFields,
    ) -> Result<Option<UserDocument>, StoreError> {
        let id = parse_id(id)?;
        // $set rejects an empty document
        if updates.is_empty() {
            return Ok(self.users.find_one(doc! { "_id": id }, None).await?);
        }
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .users
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": updates.to_document() },
                options,
            )
            .await?;
        Ok(updated)
    }

    async fn delete_users(&self, filter: &UserFields) -> Result<u64, StoreError> {
        let result = self.users.delete_many(filter.to_document(), None).await?;
        Ok(result.deleted_count)
    }

    async fn delete_user_by_id(&self, id: &str) -> Result<Option<UserDocument>, StoreError> {
        let id = parse_id(id)?;
        Ok(self
            .users
            .find_one_and_delete(doc! { "_id": id }, None)
            .await?)
    }
}
