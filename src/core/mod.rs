mod errors;
mod store;
mod traits;
mod types;

pub use errors::{GalleryError, Result};
pub use store::{CacheEntry, Invalidate, QueryCache};
pub use traits::{CloseModal, ImageHost, ImagesApi, Notifier};
pub use types::{
    Cursor,
    ImageId,
    ImageRecord,
    NewImage,
    Notification,
    NotificationStatus,
    Page,
    QueryKey,
};
