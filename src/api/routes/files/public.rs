//! Public types for the files API
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct UploadParams {
    #[serde(rename = "fileName")]
    pub file_name: String,
}

#[derive(Deserialize)]
pub struct DeleteParams {
    #[serde(rename = "fileName")]
    pub file_name: String,
}

// The download endpoint historically uses a lowercase parameter name
// unlike upload and delete
#[derive(Deserialize)]
pub struct DownloadParams {
    pub filename: String,
}

#[derive(Serialize, Deserialize)]
pub struct FilesResponse {
    pub message: String,
}

impl FilesResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.into(),
        }
    }
}
