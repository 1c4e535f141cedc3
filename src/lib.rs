pub mod api;
pub mod config;
pub mod core;
pub mod feed;
pub mod form;
pub mod preview;
pub mod utils;

// 重新导出核心类型
pub use core::{
    Cursor,
    GalleryError,
    ImageId,
    ImageRecord,
    NewImage,
    Notification,
    NotificationStatus,
    Page,
    QueryCache,
    QueryKey,
    Result,
};

pub use api::{ApiClient, ImageHostClient};
pub use feed::{FeedCache, FeedManager, FeedView};
pub use form::{SelectedFile, SubmitOutcome, UploadForm};
pub use preview::{CardList, ImagePreview};

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod tests;
