use tokio::sync::oneshot;
use crate::core::{Cursor, ImageRecord, Page, QueryCache};

/// Pages fetched so far, in fetch order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPages {
    pub pages: Vec<Page>,
}

impl FeedPages {
    pub fn first(page: Page) -> Self {
        Self { pages: vec![page] }
    }

    pub fn push(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// 所有页按拉取顺序拼接，不去重、不排序
    pub fn images(&self) -> Vec<ImageRecord> {
        self.pages
            .iter()
            .flat_map(|page| page.data.iter().cloned())
            .collect()
    }

    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.pages.last()?.after.as_ref()
    }

    pub fn has_next_page(&self) -> bool {
        self.next_cursor().is_some()
    }
}

/// Cache holding the feed listing
pub type FeedCache = QueryCache<FeedPages>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// 首次加载，还没有数据
    Loading,
    Loaded,
    /// Loaded, with a next-page request in flight
    FetchingNextPage,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Initial,
    NextPage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A page was fetched, `appended` records added
    Fetched { appended: usize },
    /// Served from a fresh cache entry, no request issued
    Cached,
    /// Another fetch is in flight, no request issued
    AlreadyFetching,
    /// No next cursor, no request issued
    Exhausted,
    /// The feed has no loaded data to continue from
    NotReady,
    Failed(String),
}

/// "Load more" control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMoreButton {
    pub label: &'static str,
    pub disabled: bool,
}

impl LoadMoreButton {
    pub const IDLE_LABEL: &'static str = "Load more";
    pub const BUSY_LABEL: &'static str = "Loading...";

    pub fn new(busy: bool) -> Self {
        Self {
            label: if busy { Self::BUSY_LABEL } else { Self::IDLE_LABEL },
            disabled: busy,
        }
    }
}

/// What the feed page renders
#[derive(Debug, Clone, PartialEq)]
pub enum FeedView {
    Loading,
    Failed { message: String },
    Loaded {
        cards: Vec<ImageRecord>,
        load_more: Option<LoadMoreButton>,
    },
}

#[derive(Debug, Clone)]
pub enum FeedEvent {
    StateChanged {
        old_state: FeedStatus,
        new_state: FeedStatus,
    },

    PageLoaded {
        kind: FetchKind,
        records: usize,
        has_next_page: bool,
    },

    Failed {
        error: String,
    },

    /// The cached listing was invalidated, the next `load` refetches
    Invalidated,
}

pub enum FeedCommand {
    /// Mount: use the cache when fresh, otherwise fetch the first page
    Load {
        reply: oneshot::Sender<FetchOutcome>,
    },

    FetchNextPage {
        reply: oneshot::Sender<FetchOutcome>,
    },

    /// Drop every page and fetch the first one again
    Refetch {
        reply: oneshot::Sender<FetchOutcome>,
    },

    View {
        reply: oneshot::Sender<FeedView>,
    },

    Status {
        reply: oneshot::Sender<FeedStatus>,
    },
}
