use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use crate::core::{GalleryError, ImagesApi, Result};
use super::manager_worker::FeedManagerWorker;
use super::types::{FeedCache, FeedCommand, FeedEvent, FeedStatus, FeedView, FetchOutcome};

/// Handle to the feed worker. Cheap to clone; the worker stops once every
/// clone is dropped.
#[derive(Clone)]
pub struct FeedManager {
    command_tx: mpsc::Sender<FeedCommand>,
    event_tx: broadcast::Sender<FeedEvent>,
}

/// 管理器句柄 - 包含管理器和工作任务
pub struct FeedManagerHandle {
    pub manager: FeedManager,
    pub worker_handle: JoinHandle<()>,
}

impl FeedManagerHandle {
    pub async fn shutdown(self) -> Result<()> {
        drop(self.manager);
        self.worker_handle
            .await
            .map_err(|err| GalleryError::internal_error(format!("Worker panic: {}", err)))
    }
}

impl FeedManager {
    pub fn new(api: Arc<dyn ImagesApi>, cache: Arc<FeedCache>) -> FeedManagerHandle {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, _) = broadcast::channel(64);

        let worker_handle = tokio::spawn(FeedManagerWorker::run(
            api,
            cache,
            command_rx,
            event_tx.clone(),
        ));

        let manager = Self {
            command_tx,
            event_tx,
        };

        FeedManagerHandle {
            manager,
            worker_handle,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> FeedCommand) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| GalleryError::ManagerShutdown)?;

        reply_rx
            .await
            .map_err(|_| GalleryError::ManagerShutdown)
    }

    /// Mount the feed. Serves the cache when fresh, otherwise fetches the
    /// first page from scratch.
    pub async fn load(&self) -> Result<FetchOutcome> {
        self.request(|reply| FeedCommand::Load { reply }).await
    }

    /// "Load more". Does nothing while another fetch is in flight.
    pub async fn fetch_next_page(&self) -> Result<FetchOutcome> {
        self.request(|reply| FeedCommand::FetchNextPage { reply }).await
    }

    pub async fn refetch(&self) -> Result<FetchOutcome> {
        self.request(|reply| FeedCommand::Refetch { reply }).await
    }

    pub async fn view(&self) -> Result<FeedView> {
        self.request(|reply| FeedCommand::View { reply }).await
    }

    pub async fn status(&self) -> Result<FeedStatus> {
        self.request(|reply| FeedCommand::Status { reply }).await
    }

    /// 订阅事件
    ///
    /// 接收过慢时可能丢失事件（lagged）
    pub fn subscribe_events(&self) -> broadcast::Receiver<FeedEvent> {
        self.event_tx.subscribe()
    }
}
