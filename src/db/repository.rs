use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document as BsonDocument};
use mongodb::options::ReturnDocument;
use mongodb::Collection;

use crate::db::connection::{map_mongo_error, MongoConnection};
use crate::db::models::{Document, DocumentPatch, Video, VideoPatch};
use crate::error::AppError;

const DOCUMENTS: &str = "documents";
const VIDEOS: &str = "videos";

/// Repository trait for document records.
///
/// This trait allows mocking the database layer in tests.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn insert(&self, doc: Document) -> Result<(), AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError>;

    /// All documents, newest first.
    async fn list_newest_first(&self) -> Result<Vec<Document>, AppError>;

    /// Apply a partial update and return the stored result, or `None` if no such id.
    async fn update(&self, id: &str, patch: DocumentPatch) -> Result<Option<Document>, AppError>;

    /// Returns `false` if nothing was deleted.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

/// Repository trait for video records.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn insert(&self, video: Video) -> Result<(), AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Video>, AppError>;

    /// All videos, newest first.
    async fn list_newest_first(&self) -> Result<Vec<Video>, AppError>;

    async fn update(&self, id: &str, patch: VideoPatch) -> Result<Option<Video>, AppError>;

    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

/// Generic MongoDB plumbing shared by both record kinds.
struct MongoRecords<T: Send + Sync> {
    connection: Arc<MongoConnection>,
    collection_name: &'static str,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> MongoRecords<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned + Send + Sync + Unpin,
{
    fn new(connection: Arc<MongoConnection>, collection_name: &'static str) -> Self {
        Self {
            connection,
            collection_name,
            _marker: std::marker::PhantomData,
        }
    }

    async fn collection(&self) -> Result<Collection<T>, AppError> {
        Ok(self
            .connection
            .database()
            .await?
            .collection(self.collection_name))
    }

    async fn insert(&self, record: &T) -> Result<(), AppError> {
        self.collection()
            .await?
            .insert_one(record)
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<T>, AppError> {
        self.collection()
            .await?
            .find_one(doc! { "_id": id })
            .await
            .map_err(map_mongo_error)
    }

    async fn list_newest_first(&self) -> Result<Vec<T>, AppError> {
        self.collection()
            .await?
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(map_mongo_error)?
            .try_collect()
            .await
            .map_err(map_mongo_error)
    }

    /// `$set` the given fields; last write wins.
    async fn set_fields(&self, id: &str, fields: BsonDocument) -> Result<Option<T>, AppError> {
        if fields.is_empty() {
            return self.find_by_id(id).await;
        }

        self.collection()
            .await?
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": fields })
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_mongo_error)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = self
            .collection()
            .await?
            .delete_one(doc! { "_id": id })
            .await
            .map_err(map_mongo_error)?;
        Ok(result.deleted_count > 0)
    }
}

fn description_bson(description: Option<String>) -> Bson {
    description.map(Bson::String).unwrap_or(Bson::Null)
}

/// MongoDB implementation of the DocumentRepository.
pub struct MongoDocumentRepository {
    records: MongoRecords<Document>,
}

impl MongoDocumentRepository {
    pub fn new(connection: Arc<MongoConnection>) -> Self {
        Self {
            records: MongoRecords::new(connection, DOCUMENTS),
        }
    }
}

#[async_trait]
impl DocumentRepository for MongoDocumentRepository {
    async fn insert(&self, doc: Document) -> Result<(), AppError> {
        self.records.insert(&doc).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError> {
        self.records.find_by_id(id).await
    }

    async fn list_newest_first(&self) -> Result<Vec<Document>, AppError> {
        self.records.list_newest_first().await
    }

    async fn update(&self, id: &str, patch: DocumentPatch) -> Result<Option<Document>, AppError> {
        let mut fields = BsonDocument::new();
        if let Some(title) = patch.title {
            fields.insert("title", title);
        }
        if let Some(description) = patch.description {
            fields.insert("description", description_bson(description));
        }
        self.records.set_fields(id, fields).await
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        self.records.delete(id).await
    }
}

/// MongoDB implementation of the VideoRepository.
pub struct MongoVideoRepository {
    records: MongoRecords<Video>,
}

impl MongoVideoRepository {
    pub fn new(connection: Arc<MongoConnection>) -> Self {
        Self {
            records: MongoRecords::new(connection, VIDEOS),
        }
    }
}

#[async_trait]
impl VideoRepository for MongoVideoRepository {
    async fn insert(&self, video: Video) -> Result<(), AppError> {
        self.records.insert(&video).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Video>, AppError> {
        self.records.find_by_id(id).await
    }

    async fn list_newest_first(&self) -> Result<Vec<Video>, AppError> {
        self.records.list_newest_first().await
    }

    async fn update(&self, id: &str, patch: VideoPatch) -> Result<Option<Video>, AppError> {
        let mut fields = BsonDocument::new();
        if let Some(title) = patch.title {
            fields.insert("title", title);
        }
        if let Some(description) = patch.description {
            fields.insert("description", description_bson(description));
        }
        if let Some(embed_url) = patch.embed_url {
            fields.insert("embed_url", embed_url);
        }
        self.records.set_fields(id, fields).await
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        self.records.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_bson() {
        assert_eq!(description_bson(None), Bson::Null);
        assert_eq!(
            description_bson(Some("Chapter 1".to_string())),
            Bson::String("Chapter 1".to_string())
        );
    }
}
