use std::path::Path;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use bytes::Bytes;
use uuid::Uuid;
use crate::core::Result;

/// 一次文件选择的标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadId(Uuid);

impl UploadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// File picked by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing the MIME type from its extension
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();

        Ok(Self::new(name, mime_from_extension(path), Bytes::from(bytes)))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// `data:` URL that renders the file before it is uploaded
    pub fn local_preview_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64_STANDARD.encode(&self.bytes))
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Transient state of one form interaction
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub id: UploadId,
    pub file: SelectedFile,
    /// 仅在文件通过校验后生成
    pub local_preview_url: Option<String>,
    /// 图床上传完成后才有值
    pub remote_url: Option<String>,
}

impl PendingUpload {
    pub fn new(file: SelectedFile) -> Self {
        Self {
            id: UploadId::new(),
            file,
            local_preview_url: None,
            remote_url: None,
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.remote_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}
