mod pending;
mod upload_form;
mod validation;

pub use pending::{PendingUpload, SelectedFile, UploadId};
pub use upload_form::{AttachOutcome, CancelHandle, SubmitOutcome, UploadForm};
pub use validation::{
    validate_description,
    validate_form,
    validate_image,
    validate_title,
    ErrorCategory,
    Field,
    FieldErrors,
    ValidationError,
    ACCEPTED_FORMATS,
    DESCRIPTION_MAX_LEN,
    MAX_FILE_SIZE,
    TITLE_MAX_LEN,
    TITLE_MIN_LEN,
};
