//! Mocks shared by the unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Semaphore;
use crate::core::{
    Cursor,
    GalleryError,
    ImageHost,
    ImageId,
    ImageRecord,
    ImagesApi,
    NewImage,
    Notification,
    Notifier,
    Page,
    Result,
};

pub fn record(id: &str) -> ImageRecord {
    ImageRecord {
        id: ImageId::new(id),
        title: format!("Image {id}"),
        description: format!("Description of {id}"),
        url: format!("https://i.test/{id}.png"),
        created_at: None,
    }
}

/// In-memory API. Pages are `page_size` long, cursors are `c{page}`.
pub struct MockApi {
    records: Mutex<Vec<ImageRecord>>,
    page_size: usize,
    pub fetch_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub fail_fetch: AtomicBool,
    pub fail_create: AtomicBool,
    /// 设置后每次 fetch 需要先拿到一个 permit
    gate: Option<Arc<Semaphore>>,
}

impl MockApi {
    pub fn new(records: Vec<ImageRecord>, page_size: usize) -> Self {
        Self {
            records: Mutex::new(records),
            page_size,
            fetch_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            fail_fetch: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            gate: None,
        }
    }

    pub fn gated(records: Vec<ImageRecord>, page_size: usize, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(records, page_size)
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImagesApi for MockApi {
    async fn fetch_page(&self, after: Option<&Cursor>) -> Result<Page> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let page_number = match after {
            None => 0,
            Some(cursor) => cursor
                .as_str()
                .trim_start_matches('c')
                .parse::<usize>()
                .map_err(|err| GalleryError::internal_error(err.to_string()))?,
        };

        // 按请求发出时的数据作答，gate 只推迟响应
        let page = {
            let records = self.records.lock().unwrap();
            let start = (page_number * self.page_size).min(records.len());
            let end = (start + self.page_size).min(records.len());
            let after = (end < records.len()).then(|| Cursor::new(format!("c{}", page_number + 1)));

            Page {
                data: records[start..end].to_vec(),
                after,
            }
        };

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|err| GalleryError::internal_error(err.to_string()))?;
            permit.forget();
        }

        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(GalleryError::server_error(500, "fetch failed"));
        }

        Ok(page)
    }

    async fn create_image(&self, image: &NewImage) -> Result<ImageRecord> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_create.load(Ordering::SeqCst) {
            return Err(GalleryError::server_error(500, "create failed"));
        }

        let mut records = self.records.lock().unwrap();
        let record = ImageRecord {
            id: ImageId::new(format!("new-{}", records.len())),
            title: image.title.clone(),
            description: image.description.clone(),
            url: image.url.clone(),
            created_at: Some(chrono::Utc::now()),
        };
        records.insert(0, record.clone());

        Ok(record)
    }
}

#[derive(Default)]
pub struct MockHost {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    gate: Option<Arc<Semaphore>>,
}

impl MockHost {
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }

    pub fn uploads(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageHost for MockHost {
    async fn upload(&self, file_name: &str, _mime_type: &str, _bytes: Bytes) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|err| GalleryError::internal_error(err.to_string()))?;
            permit.forget();
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(GalleryError::server_error(400, "rejected"));
        }

        Ok(format!("https://host.test/{file_name}"))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn titles(&self) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .map(|notification| notification.title.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

pub fn png(name: &str, size: usize) -> crate::form::SelectedFile {
    crate::form::SelectedFile::new(name, "image/png", Bytes::from(vec![0u8; size]))
}
