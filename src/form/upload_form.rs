use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use crate::core::{
    CloseModal,
    ImageHost,
    ImageRecord,
    ImagesApi,
    Invalidate,
    NewImage,
    Notification,
    Notifier,
    QueryKey,
};
use super::pending::{PendingUpload, SelectedFile};
use super::validation::{validate_form, validate_image, Field, FieldErrors, ValidationError};

/// Owner-side cancel switch, valid for the whole life of the form. It always
/// targets the work currently in flight, also after earlier cancellations.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    current: Arc<Mutex<CancellationToken>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token().cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token().is_cancelled()
    }

    fn token(&self) -> CancellationToken {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // 取消后换一个新的 token，持有旧句柄的一方依然生效
    fn renew(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = CancellationToken::new();
    }
}

/// Result of attaching a file to the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    /// 图床上传完成
    Uploaded(String),
    Invalid(ValidationError),
    Failed(String),
    Cancelled,
}

/// Result of a submit attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Field errors, nothing was sent and the form is untouched
    Invalid(FieldErrors),
    /// The image has not been uploaded yet, nothing was sent
    MissingImage,
    Created(ImageRecord),
    Failed(String),
    /// Abandoned through the cancel handle, no notification, modal not closed
    Cancelled,
}

/// Image upload form hosted in a modal.
///
/// Collects a file and two text fields, uploads the file to the image host
/// as soon as it is attached, and creates the image record on submit. Every
/// submit that passes validation ends with the form reset and the modal closed.
pub struct UploadForm {
    api: Arc<dyn ImagesApi>,
    host: Arc<dyn ImageHost>,
    cache: Arc<dyn Invalidate>,
    notifier: Arc<dyn Notifier>,
    close_modal: CloseModal,

    title: String,
    description: String,
    pending: Option<PendingUpload>,
    errors: FieldErrors,
    cancel: CancelHandle,
}

impl UploadForm {
    pub fn new(
        api: Arc<dyn ImagesApi>,
        host: Arc<dyn ImageHost>,
        cache: Arc<dyn Invalidate>,
        notifier: Arc<dyn Notifier>,
        close_modal: CloseModal,
    ) -> Self {
        Self {
            api,
            host,
            cache,
            notifier,
            close_modal,
            title: String::new(),
            description: String::new(),
            pending: None,
            errors: FieldErrors::new(),
            cancel: CancelHandle::default(),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Inline errors from the last validation
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn pending(&self) -> Option<&PendingUpload> {
        self.pending.as_ref()
    }

    pub fn local_preview_url(&self) -> Option<&str> {
        self.pending.as_ref()?.local_preview_url.as_deref()
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.pending
            .as_ref()
            .filter(|pending| pending.is_uploaded())?
            .remote_url
            .as_deref()
    }

    /// Handle the owner can use to abandon the in-flight host upload or
    /// create call.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Select a file: validate it, build the local preview and upload it to
    /// the image host. Replaces any previously attached file.
    pub async fn attach_image(&mut self, file: SelectedFile) -> AttachOutcome {
        let mut pending = PendingUpload::new(file);

        if let Err(err) = validate_image(Some(&pending.file)) {
            tracing::debug!(upload_id = %pending.id, error = %err, "attached file rejected");
            self.errors.insert(Field::Image, err.clone());
            self.pending = Some(pending);
            return AttachOutcome::Invalid(err);
        }

        self.errors.remove(Field::Image);
        pending.local_preview_url = Some(pending.file.local_preview_url());
        let upload_id = pending.id;
        let file = pending.file.clone();
        self.pending = Some(pending);

        let host = self.host.clone();
        let token = self.cancel.token();
        let result = tokio::select! {
            result = host.upload(&file.name, &file.mime_type, file.bytes.clone()) => result,
            _ = token.cancelled() => {
                tracing::debug!(upload_id = %upload_id, "image upload abandoned");
                self.abandon();
                return AttachOutcome::Cancelled;
            }
        };

        match result {
            Ok(url) => {
                tracing::info!(upload_id = %upload_id, url = %url, "image uploaded");
                if let Some(pending) = self.pending.as_mut() {
                    pending.remote_url = Some(url.clone());
                }
                AttachOutcome::Uploaded(url)
            }
            Err(err) => {
                tracing::warn!(upload_id = %upload_id, error = %err, "image upload failed");
                self.notifier.notify(Notification::error(
                    "Upload failed",
                    "The image could not be uploaded, please try again.",
                ));
                AttachOutcome::Failed(err.to_string())
            }
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        validate_form(
            self.pending.as_ref().map(|pending| &pending.file),
            &self.title,
            &self.description,
        )
    }

    /// Submit the form.
    ///
    /// Validation failures stop here and leave the form as is. Past
    /// validation, the form is always reset and the modal closed, whatever
    /// the create call did.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if let Err(errors) = self.validate() {
            self.errors = errors.clone();
            return SubmitOutcome::Invalid(errors);
        }
        self.errors.clear();

        let outcome = self.create_image().await;

        if matches!(outcome, SubmitOutcome::Cancelled) {
            self.abandon();
        } else {
            self.reset();
            (self.close_modal)();
        }

        outcome
    }

    async fn create_image(&mut self) -> SubmitOutcome {
        let Some(url) = self.remote_url().map(str::to_string) else {
            tracing::warn!("submit without an uploaded image");
            self.notifier.notify(Notification::error(
                "Image not added",
                "You need to add an image and wait for its upload before submitting.",
            ));
            return SubmitOutcome::MissingImage;
        };

        let image = NewImage {
            url,
            title: self.title.clone(),
            description: self.description.clone(),
        };

        let api = self.api.clone();
        let token = self.cancel.token();
        let result = tokio::select! {
            result = api.create_image(&image) => result,
            _ = token.cancelled() => return SubmitOutcome::Cancelled,
        };

        match result {
            Ok(record) => {
                tracing::info!(id = %record.id, title = %record.title, "image created");
                self.cache.invalidate(&QueryKey::images()).await;
                self.notifier.notify(Notification::success(
                    "Image created",
                    "Your image was added to the gallery.",
                ));
                SubmitOutcome::Created(record)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to create image");
                self.notifier.notify(Notification::error(
                    "Failed to create image",
                    "An error occurred while trying to create your image.",
                ));
                SubmitOutcome::Failed(err.to_string())
            }
        }
    }

    /// Owner-triggered dismissal: abandons in-flight work, clears the form
    /// and closes the modal.
    pub fn close(&mut self) {
        self.abandon();
        (self.close_modal)();
    }

    fn reset(&mut self) {
        self.title.clear();
        self.description.clear();
        self.pending = None;
        self.errors.clear();
    }

    fn abandon(&mut self) {
        self.cancel.cancel();
        self.cancel.renew();
        self.reset();
    }
}
