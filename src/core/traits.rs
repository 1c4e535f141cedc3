use std::sync::Arc;
use async_trait::async_trait;
use super::types::{Cursor, ImageRecord, NewImage, Notification, Page};
use super::errors::Result;

/// 图片接口 - `/api/images`
#[async_trait]
pub trait ImagesApi: Send + Sync {
    /// Fetch one page. `None` requests the first page.
    async fn fetch_page(&self, after: Option<&Cursor>) -> Result<Page>;

    /// Create an image record, returns the created record
    async fn create_image(&self, image: &NewImage) -> Result<ImageRecord>;
}

/// 图床 - 上传文件，返回可访问的远程地址
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, file_name: &str, mime_type: &str, bytes: bytes::Bytes) -> Result<String>;
}

/// 提示回调 trait
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Close callback of the modal that hosts the form, owned by the caller
pub type CloseModal = Arc<dyn Fn() + Send + Sync>;
