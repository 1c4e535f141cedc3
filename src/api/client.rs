use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, Response};
use url::Url;
use crate::config::Config;
use crate::core::{Cursor, GalleryError, ImageRecord, ImagesApi, NewImage, Page, Result};

const IMAGES_PATH: &str = "api/images";

/// `after` 为空时服务端约定传 0
const FIRST_PAGE_CURSOR: &str = "0";

/// HTTP client for the gallery API
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub client: Client,
    pub endpoint: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: Self::images_endpoint(base_url)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    fn images_endpoint(base_url: &str) -> Result<Url> {
        // join 会替换最后一段路径，先补上结尾的 '/'
        let base = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };

        Ok(base.join(IMAGES_PATH)?)
    }

    pub(crate) async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(GalleryError::server_error(status.as_u16(), message))
    }
}

#[async_trait]
impl ImagesApi for ApiClient {
    async fn fetch_page(&self, after: Option<&Cursor>) -> Result<Page> {
        let after = after.map_or(FIRST_PAGE_CURSOR, Cursor::as_str);
        tracing::debug!(after, "fetching images page");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("after", after)])
            .send()
            .await
            .map_err(GalleryError::from_request)?;

        let page = Self::check_status(response)
            .await?
            .json::<Page>()
            .await
            .map_err(GalleryError::from_request)?;

        Ok(page)
    }

    async fn create_image(&self, image: &NewImage) -> Result<ImageRecord> {
        tracing::debug!(title = %image.title, "creating image");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(image)
            .send()
            .await
            .map_err(GalleryError::from_request)?;

        let record = Self::check_status(response)
            .await?
            .json::<ImageRecord>()
            .await
            .map_err(GalleryError::from_request)?;

        Ok(record)
    }
}
