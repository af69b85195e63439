use serde::{Deserialize, Serialize};

/// Body of `GET /config/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub data: ConfigData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigData {
    pub cdn_url: String,
}

/// Body of `GET /blob/stat/`. Blobs the server does not hold are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatResponse {
    #[serde(default)]
    pub stat: Vec<StatItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatItem {
    /// `<container>/<filename>`
    pub path: String,
    pub md5: String,
}

/// Body of a `201 Created` from `POST /blob/upload/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub received: Vec<ReceivedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedItem {
    pub path: String,
}

/// Query of `POST /blob/upload/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadQuery {
    #[serde(rename = "use-filename", default)]
    pub use_filename: bool,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}
