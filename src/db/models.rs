use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded study document stored in the `documents` collection.
///
/// `external_url` and `storage_handle` are set once at upload time and are
/// never touched by updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Public URL returned by the media host.
    pub external_url: String,
    /// Media-host handle needed to delete the file later.
    pub storage_handle: String,
    /// Email of the admin who uploaded it.
    pub uploaded_by: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// A YouTube video stored in the `videos` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Always of the form `https://www.youtube.com/embed/<id>`.
    pub embed_url: String,
    pub uploaded_by: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Fields an admin may change on a document. `None` leaves a field untouched;
/// `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    pub fn apply(self, doc: &mut Document) {
        if let Some(title) = self.title {
            doc.title = title;
        }
        if let Some(description) = self.description {
            doc.description = description;
        }
    }
}

/// Fields an admin may change on a video.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    /// Already canonicalised embed URL.
    pub embed_url: Option<String>,
}

impl VideoPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.embed_url.is_none()
    }

    pub fn apply(self, video: &mut Video) {
        if let Some(title) = self.title {
            video.title = title;
        }
        if let Some(description) = self.description {
            video.description = description;
        }
        if let Some(embed_url) = self.embed_url {
            video.embed_url = embed_url;
        }
    }
}

/// Creation timestamp truncated to the millisecond precision MongoDB stores.
pub fn creation_timestamp() -> DateTime<Utc> {
    bson::DateTime::now().to_chrono()
}
