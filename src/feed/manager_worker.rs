use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use crate::core::{Cursor, ImagesApi, Page, QueryKey, Result};
use super::types::{
    FeedCache,
    FeedCommand,
    FeedEvent,
    FeedPages,
    FeedStatus,
    FeedView,
    FetchKind,
    FetchOutcome,
    LoadMoreButton,
};

/// 正在进行的请求
struct InFlight {
    kind: FetchKind,
    /// 请求发出时缓存的代数
    generation: u64,
    replies: Vec<oneshot::Sender<FetchOutcome>>,
    join_handle: JoinHandle<()>,
}

struct FetchDone {
    kind: FetchKind,
    result: Result<Page>,
}

pub struct FeedManagerWorker {
    api: Arc<dyn ImagesApi>,
    cache: Arc<FeedCache>,
    key: QueryKey,
    status: FeedStatus,
    error: Option<String>,
    in_flight: Option<InFlight>,

    event_tx: broadcast::Sender<FeedEvent>,
    completion_tx: mpsc::UnboundedSender<FetchDone>,
    completion_rx: mpsc::UnboundedReceiver<FetchDone>,
}

impl FeedManagerWorker {
    pub(crate) async fn run(
        api: Arc<dyn ImagesApi>,
        cache: Arc<FeedCache>,
        mut command_rx: mpsc::Receiver<FeedCommand>,
        event_tx: broadcast::Sender<FeedEvent>,
    ) {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let mut invalidation_rx = cache.subscribe();
        let mut worker = Self {
            api,
            cache,
            key: QueryKey::images(),
            status: FeedStatus::Loading,
            error: None,
            in_flight: None,
            event_tx,
            completion_tx,
            completion_rx,
        };

        // 主事件循环：命令、请求完成、缓存失效
        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(command) => worker.handle_command(command).await,
                    None => break,
                },
                Some(done) = worker.completion_rx.recv() => {
                    worker.handle_completion(done).await;
                }
                Ok(key) = invalidation_rx.recv() => {
                    if key == worker.key {
                        tracing::debug!("feed listing invalidated");
                        let _ = worker.event_tx.send(FeedEvent::Invalidated);
                    }
                }
            }
        }

        // 所有句柄都已释放，放弃未完成的请求
        if let Some(in_flight) = worker.in_flight.take() {
            in_flight.join_handle.abort();
        }
    }

    async fn handle_command(&mut self, command: FeedCommand) {
        match command {
            FeedCommand::Load { reply } => self.load(reply).await,
            FeedCommand::FetchNextPage { reply } => self.fetch_next_page(reply).await,
            FeedCommand::Refetch { reply } => self.refetch(reply).await,
            FeedCommand::View { reply } => {
                let _ = reply.send(self.view().await);
            }
            FeedCommand::Status { reply } => {
                let _ = reply.send(self.status);
            }
        }
    }

    async fn load(&mut self, reply: oneshot::Sender<FetchOutcome>) {
        if let Some(in_flight) = self.in_flight.as_mut() {
            // 同一个首页请求，合并等待
            if in_flight.kind == FetchKind::Initial {
                in_flight.replies.push(reply);
            } else {
                let _ = reply.send(FetchOutcome::AlreadyFetching);
            }
            return;
        }

        if self.cache.get_fresh(&self.key).await.is_some() {
            self.set_status(FeedStatus::Loaded);
            let _ = reply.send(FetchOutcome::Cached);
            return;
        }

        self.start_fetch(FetchKind::Initial, None, reply).await;
    }

    async fn fetch_next_page(&mut self, reply: oneshot::Sender<FetchOutcome>) {
        // 同时只允许一个请求
        if self.in_flight.is_some() {
            tracing::debug!("next page requested while a fetch is in flight");
            let _ = reply.send(FetchOutcome::AlreadyFetching);
            return;
        }

        if self.status != FeedStatus::Loaded {
            let _ = reply.send(FetchOutcome::NotReady);
            return;
        }

        // 列表已失效，旧游标不再可信，从头拉取
        if self.cache.is_stale(&self.key).await {
            tracing::debug!("next page requested on an invalidated listing, refetching");
            self.start_fetch(FetchKind::Initial, None, reply).await;
            return;
        }

        let cursor = match self.cache.get(&self.key).await {
            Some(entry) => entry.data.next_cursor().cloned(),
            None => {
                let _ = reply.send(FetchOutcome::NotReady);
                return;
            }
        };

        match cursor {
            Some(cursor) => self.start_fetch(FetchKind::NextPage, Some(cursor), reply).await,
            None => {
                let _ = reply.send(FetchOutcome::Exhausted);
            }
        }
    }

    async fn refetch(&mut self, reply: oneshot::Sender<FetchOutcome>) {
        if self.in_flight.is_some() {
            let _ = reply.send(FetchOutcome::AlreadyFetching);
            return;
        }

        self.start_fetch(FetchKind::Initial, None, reply).await;
    }

    async fn start_fetch(
        &mut self,
        kind: FetchKind,
        cursor: Option<Cursor>,
        reply: oneshot::Sender<FetchOutcome>,
    ) {
        let generation = self.cache.generation(&self.key).await;
        let api = self.api.clone();
        let completion_tx = self.completion_tx.clone();

        let join_handle = tokio::spawn(async move {
            let result = api.fetch_page(cursor.as_ref()).await;
            // 通知完成
            let _ = completion_tx.send(FetchDone { kind, result });
        });

        self.in_flight = Some(InFlight {
            kind,
            generation,
            replies: vec![reply],
            join_handle,
        });

        match kind {
            FetchKind::Initial => {
                self.error = None;
                self.set_status(FeedStatus::Loading);
            }
            FetchKind::NextPage => self.set_status(FeedStatus::FetchingNextPage),
        }
    }

    async fn handle_completion(&mut self, done: FetchDone) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };

        let outcome = match done.result {
            Ok(page) => {
                let appended = page.data.len();
                let has_next_page = page.after.is_some();

                match done.kind {
                    FetchKind::Initial => {
                        self.cache
                            .set_fetched(self.key.clone(), FeedPages::first(page), in_flight.generation)
                            .await;
                    }
                    FetchKind::NextPage => {
                        let mut page = Some(page);
                        let updated = self.cache
                            .update(&self.key, |pages| {
                                if let Some(page) = page.take() {
                                    pages.push(page);
                                }
                            })
                            .await;

                        if !updated {
                            if let Some(page) = page {
                                self.cache
                                    .set_fetched(self.key.clone(), FeedPages::first(page), in_flight.generation)
                                    .await;
                            }
                        }
                    }
                }

                tracing::info!(kind = ?done.kind, records = appended, has_next_page, "feed page loaded");
                let _ = self.event_tx.send(FeedEvent::PageLoaded {
                    kind: done.kind,
                    records: appended,
                    has_next_page,
                });
                self.set_status(FeedStatus::Loaded);

                FetchOutcome::Fetched { appended }
            }
            Err(err) => {
                tracing::error!(kind = ?done.kind, error = %err, "failed to fetch feed page");
                let message = err.to_string();
                self.error = Some(message.clone());
                let _ = self.event_tx.send(FeedEvent::Failed { error: message.clone() });
                self.set_status(FeedStatus::Failed);

                FetchOutcome::Failed(message)
            }
        };

        for reply in in_flight.replies {
            let _ = reply.send(outcome.clone());
        }
    }

    async fn view(&self) -> FeedView {
        match self.status {
            FeedStatus::Loading => FeedView::Loading,
            FeedStatus::Failed => FeedView::Failed {
                message: self.error.clone().unwrap_or_default(),
            },
            FeedStatus::Loaded | FeedStatus::FetchingNextPage => {
                let pages = self.cache
                    .get(&self.key)
                    .await
                    .map(|entry| entry.data)
                    .unwrap_or_default();

                let busy = self.status == FeedStatus::FetchingNextPage;
                FeedView::Loaded {
                    cards: pages.images(),
                    load_more: pages.has_next_page().then(|| LoadMoreButton::new(busy)),
                }
            }
        }
    }

    fn set_status(&mut self, new_state: FeedStatus) {
        let old_state = self.status;
        if old_state == new_state {
            return;
        }

        self.status = new_state;
        let _ = self.event_tx.send(FeedEvent::StateChanged {
            old_state,
            new_state,
        });
    }
}
