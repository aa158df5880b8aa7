//! Core data models used throughout Lookbook.
//!
//! These types represent what flows through a submission: the image being
//! uploaded, the similarity endpoint's answer, the catalog rows it is joined
//! against, and the cards that end up in the results view.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::path::Path;

use crate::error::{LookbookError, Result};

/// Catalog column holding the image identifier.
pub const COLUMN_IMAGE: &str = "Image";
/// Catalog column holding the display image URL.
pub const COLUMN_IMAGE_URL: &str = "ImageURL";
/// Catalog column holding the product title.
pub const COLUMN_PRODUCT_TITLE: &str = "ProductTitle";

/// One row of the product catalog: column name to value.
///
/// Columns keep the header order. A value is `None` when the line had
/// fewer fields than the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow {
    fields: Vec<(String, Option<String>)>,
}

impl CatalogRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, replacing an earlier value under the same name.
    pub fn insert(&mut self, column: impl Into<String>, value: Option<String>) {
        let column = column.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Value of `column`, if the column exists and has a value.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every column is absent (the row a trailing blank line yields).
    pub fn is_blank(&self) -> bool {
        self.fields
            .iter()
            .all(|(_, value)| value.as_deref().map_or(true, str::is_empty))
    }

    pub fn image(&self) -> Option<&str> {
        self.get(COLUMN_IMAGE)
    }

    pub fn image_url(&self) -> Option<&str> {
        self.get(COLUMN_IMAGE_URL)
    }

    pub fn product_title(&self) -> Option<&str> {
        self.get(COLUMN_PRODUCT_TITLE)
    }
}

impl Serialize for CatalogRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Wire shape of the upload response, before validation.
#[derive(Debug, Deserialize)]
struct UploadResponseBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    similar_images: Option<Vec<String>>,
}

/// Decoded answer of the similarity endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimilarityResponse {
    /// The server reported an error; the message is shown verbatim.
    Error(String),
    /// Image identifiers ranked most relevant first.
    Matches(Vec<String>),
}

impl SimilarityResponse {
    /// Decode and validate an upload response body.
    ///
    /// An empty `error` string counts as no error. A body without a
    /// non-empty `error` must carry `similar_images`.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let raw: UploadResponseBody =
            serde_json::from_slice(body).map_err(|source| LookbookError::Decode {
                what: "upload response",
                source,
            })?;

        match raw {
            UploadResponseBody {
                error: Some(message),
                ..
            } if !message.is_empty() => Ok(Self::Error(message)),
            UploadResponseBody {
                similar_images: Some(images),
                ..
            } => Ok(Self::Matches(images)),
            _ => Err(LookbookError::MissingField("similar_images")),
        }
    }

    /// The ranked identifiers, or the server's error as a [`LookbookError`].
    pub fn into_matches(self) -> Result<Vec<String>> {
        match self {
            Self::Error(message) => Err(LookbookError::Server(message)),
            Self::Matches(images) => Ok(images),
        }
    }
}

/// The selected image file, ready to be sent as a multipart part.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Read an image from disk.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|source| LookbookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// One rendered result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    /// Identifier as returned by the similarity endpoint.
    pub identifier: String,
    /// Image source, either the catalog URL or a local path.
    pub image_src: String,
    /// Product title; `None` renders the card without a product-info block.
    pub title: Option<String>,
}
