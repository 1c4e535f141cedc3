mod manager;
mod manager_worker;
mod types;

pub use manager::{FeedManager, FeedManagerHandle};
pub use types::{
    FeedCache,
    FeedEvent,
    FeedPages,
    FeedStatus,
    FeedView,
    FetchKind,
    FetchOutcome,
    LoadMoreButton,
};
