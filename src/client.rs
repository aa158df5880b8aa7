//! Similarity endpoint client.
//!
//! Defines the [`SimilarityBackend`] trait, the seam between the submit
//! workflow and the network, and [`HttpBackend`], its reqwest implementation.
//!
//! # Endpoints
//!
//! | Method | Path (default) | Body |
//! |--------|----------------|------|
//! | `POST` | `/upload/` | multipart, one file part named `file` |
//! | `GET`  | `/static/fashion.csv` | none |
//!
//! Both requests are single attempts. The HTTP status is not inspected: the
//! upload body is decoded whatever the status, since the endpoint reports
//! failures through the `error` field of its JSON body.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::models::{ImageUpload, SimilarityResponse};

/// Multipart field name the upload endpoint reads the image from.
pub const UPLOAD_FIELD: &str = "file";

/// Source of similarity results and of the product catalog.
#[async_trait]
pub trait SimilarityBackend: Send + Sync {
    /// Upload an image and decode the ranked identifiers (or the server's error).
    async fn upload(&self, image: &ImageUpload) -> Result<SimilarityResponse>;

    /// Fetch the raw catalog text.
    async fn fetch_catalog(&self) -> Result<String>;
}

/// [`SimilarityBackend`] talking HTTP to the recommender service.
pub struct HttpBackend {
    client: reqwest::Client,
    upload_url: String,
    catalog_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.http.user_agent.clone());
        if let Some(secs) = config.http.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            upload_url: config.upload_url(),
            catalog_url: config.catalog_url(),
        })
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    pub fn catalog_url(&self) -> &str {
        &self.catalog_url
    }
}

#[async_trait]
impl SimilarityBackend for HttpBackend {
    async fn upload(&self, image: &ImageUpload) -> Result<SimilarityResponse> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        debug!(
            url = %self.upload_url,
            file = %image.file_name,
            bytes = image.bytes.len(),
            "uploading image"
        );
        let response = self.client.post(&self.upload_url).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(%status, bytes = body.len(), "upload response received");

        SimilarityResponse::from_json(&body)
    }

    async fn fetch_catalog(&self) -> Result<String> {
        debug!(url = %self.catalog_url, "fetching catalog");
        let response = self.client.get(&self.catalog_url).send().await?;
        let text = response.text().await?;
        Ok(text)
    }
}
