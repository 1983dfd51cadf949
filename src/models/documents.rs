use image::ImageFormat;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Page of documents as returned by the BaaS list endpoint.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DocumentList<T> {
    pub total: u64,
    pub documents: Vec<T>,
}

impl DocumentList<Value> {
    pub fn decode<T: DeserializeOwned>(self) -> Result<DocumentList<T>> {
        let documents = self
            .documents
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<T>>>()?;

        Ok(DocumentList {
            total: self.total,
            documents,
        })
    }
}

pub fn from_document<T: DeserializeOwned>(document: Value) -> Result<T> {
    Ok(serde_json::from_value(document)?)
}

/// A relationship attribute. The backend either returns the bare document id
/// or the expanded related document, depending on the query.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Relation<T> {
    Id(String),
    Expanded(T),
}

pub trait HasId {
    fn id(&self) -> &str;
}

impl<T: HasId> Relation<T> {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Expanded(doc) => doc.id(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StoredFile {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "bucketId")]
    pub bucket_id: String,
    pub name: String,
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
    #[serde(rename = "sizeOriginal", default)]
    pub size_original: u64,
}

/// File received from a form, not yet uploaded.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Accepts PNG, JPEG and SVG images only.
    pub fn ensure_image(&self) -> Result<()> {
        if self.bytes.is_empty() {
            return Err(Error::BadRequest(format!("File {} is empty", self.name)));
        }

        if self.mime_type == "image/svg+xml" {
            return Ok(());
        }

        match image::guess_format(&self.bytes) {
            Ok(ImageFormat::Png) | Ok(ImageFormat::Jpeg) => Ok(()),
            _ => Err(Error::BadRequest(format!(
                "File {} must be a png, jpg or svg image",
                self.name
            ))),
        }
    }
}
