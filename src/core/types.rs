use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// 服务端下发的不透明标识，可能是字符串也可能是数字
#[derive(Deserialize)]
#[serde(untagged)]
enum OpaqueToken {
    Text(String),
    Number(serde_json::Number),
}

impl From<OpaqueToken> for String {
    fn from(token: OpaqueToken) -> Self {
        match token {
            OpaqueToken::Text(text) => text,
            OpaqueToken::Number(number) => number.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Rfc3339(String),
    Micros(i64),
}

// createdAt 为 RFC 3339 字符串，ts 为微秒时间戳
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawTimestamp>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawTimestamp::Rfc3339(text)) => DateTime::parse_from_rfc3339(&text)
            .map(|time| Some(time.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
        Some(RawTimestamp::Micros(micros)) => Ok(DateTime::from_timestamp_micros(micros)),
    }
}

/// Opaque image identifier assigned by the API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "OpaqueToken", into = "String")]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<OpaqueToken> for ImageId {
    fn from(token: OpaqueToken) -> Self {
        Self(token.into())
    }
}

impl From<ImageId> for String {
    fn from(id: ImageId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pagination cursor. Only ever passed back to the API, never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "OpaqueToken", into = "String")]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<OpaqueToken> for Cursor {
    fn from(token: OpaqueToken) -> Self {
        Self(token.into())
    }
}

impl From<Cursor> for String {
    fn from(cursor: Cursor) -> Self {
        cursor.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 图片记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(
        rename = "createdAt",
        alias = "ts",
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// One page of the listing: `{ data, after }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub data: Vec<ImageRecord>,
    #[serde(default)]
    pub after: Option<Cursor>,
}

/// Payload of `POST /api/images`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImage {
    pub url: String,
    pub title: String,
    pub description: String,
}

/// 缓存查询的键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The feed listing
    pub fn images() -> Self {
        Self::new("images")
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStatus {
    Success,
    Error,
}

/// 提示消息 (toast)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub status: NotificationStatus,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            status: NotificationStatus::Success,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            status: NotificationStatus::Error,
        }
    }
}
