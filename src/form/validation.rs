use std::collections::BTreeMap;
use thiserror::Error;
use crate::utils::format_bytes;
use super::pending::SelectedFile;

/// 文件必须小于 10MB（十进制）
pub const MAX_FILE_SIZE: u64 = 10_000_000;
pub const ACCEPTED_FORMATS: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];
pub const TITLE_MIN_LEN: usize = 2;
pub const TITLE_MAX_LEN: usize = 20;
pub const DESCRIPTION_MAX_LEN: usize = 65;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Image,
    Title,
    Description,
}

/// Coarse failure categories shown next to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    FileMissing,
    FileTooLarge,
    UnsupportedFormat,
    TitleInvalid,
    DescriptionInvalid,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File is required")]
    FileMissing,

    #[error("File must be smaller than 10MB, got {}", format_bytes(*.size))]
    FileTooLarge { size: u64 },

    #[error("Only PNG, JPEG and GIF files are accepted, got {mime_type}")]
    UnsupportedFormat { mime_type: String },

    #[error("Title is required")]
    TitleRequired,

    #[error("Title must have at least {} characters", TITLE_MIN_LEN)]
    TitleTooShort,

    #[error("Title must have at most {} characters", TITLE_MAX_LEN)]
    TitleTooLong,

    #[error("Description is required")]
    DescriptionRequired,

    #[error("Description must have at most {} characters", DESCRIPTION_MAX_LEN)]
    DescriptionTooLong,
}

impl ValidationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileMissing => ErrorCategory::FileMissing,
            Self::FileTooLarge { .. } => ErrorCategory::FileTooLarge,
            Self::UnsupportedFormat { .. } => ErrorCategory::UnsupportedFormat,
            Self::TitleRequired | Self::TitleTooShort | Self::TitleTooLong => ErrorCategory::TitleInvalid,
            Self::DescriptionRequired | Self::DescriptionTooLong => ErrorCategory::DescriptionInvalid,
        }
    }
}

/// First failing rule per field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, ValidationError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&ValidationError> {
        self.0.get(&field)
    }

    pub fn insert(&mut self, field: Field, error: ValidationError) {
        self.0.insert(field, error);
    }

    pub fn remove(&mut self, field: Field) -> Option<ValidationError> {
        self.0.remove(&field)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &ValidationError)> {
        self.0.iter().map(|(field, error)| (*field, error))
    }
}

fn is_accepted_format(mime_type: &str) -> bool {
    // 去掉参数部分，例如 "image/png; charset=binary"
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    ACCEPTED_FORMATS.contains(&essence.as_str())
}

pub fn validate_image(file: Option<&SelectedFile>) -> Result<(), ValidationError> {
    let file = file.ok_or(ValidationError::FileMissing)?;

    if file.size() >= MAX_FILE_SIZE {
        return Err(ValidationError::FileTooLarge { size: file.size() });
    }

    if !is_accepted_format(&file.mime_type) {
        return Err(ValidationError::UnsupportedFormat {
            mime_type: file.mime_type.clone(),
        });
    }

    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let len = title.chars().count();

    if len == 0 {
        Err(ValidationError::TitleRequired)
    } else if len < TITLE_MIN_LEN {
        Err(ValidationError::TitleTooShort)
    } else if len > TITLE_MAX_LEN {
        Err(ValidationError::TitleTooLong)
    } else {
        Ok(())
    }
}

pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    let len = description.chars().count();

    if len == 0 {
        Err(ValidationError::DescriptionRequired)
    } else if len > DESCRIPTION_MAX_LEN {
        Err(ValidationError::DescriptionTooLong)
    } else {
        Ok(())
    }
}

/// Run every rule, collecting one error per failing field
pub fn validate_form(
    file: Option<&SelectedFile>,
    title: &str,
    description: &str,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Err(err) = validate_image(file) {
        errors.insert(Field::Image, err);
    }
    if let Err(err) = validate_title(title) {
        errors.insert(Field::Title, err);
    }
    if let Err(err) = validate_description(description) {
        errors.insert(Field::Description, err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
