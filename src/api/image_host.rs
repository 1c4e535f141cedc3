use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;
use crate::config::ImageHostConfig;
use crate::core::{GalleryError, ImageHost, Result};
use super::client::ApiClient;

#[derive(Debug, Deserialize)]
struct HostResponse {
    data: HostImage,
}

#[derive(Debug, Deserialize)]
struct HostImage {
    url: String,
}

/// imgbb 兼容的图床客户端
#[derive(Debug, Clone)]
pub struct ImageHostClient {
    pub client: Client,
    pub endpoint: Url,
    api_key: String,
}

impl ImageHostClient {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: Url::parse(endpoint)?,
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &ImageHostConfig, timeout: Duration) -> Result<Self> {
        Self::new(&config.endpoint, &config.api_key, timeout)
    }
}

#[async_trait]
impl ImageHost for ImageHostClient {
    async fn upload(&self, file_name: &str, mime_type: &str, bytes: Bytes) -> Result<String> {
        tracing::debug!(file_name, mime_type, size = bytes.len(), "uploading to image host");

        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .multipart(form)
            .send()
            .await
            .map_err(GalleryError::from_request)?;

        let body = ApiClient::check_status(response)
            .await?
            .json::<HostResponse>()
            .await
            .map_err(GalleryError::from_request)?;

        if body.data.url.is_empty() {
            return Err(GalleryError::server_error(200, "Image host returned an empty url"));
        }

        Ok(body.data.url)
    }
}
