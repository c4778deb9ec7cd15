//! File backend surface. The backend itself is an external collaborator;
//! only the messages and the typed client the gateway and the payment
//! service consume live here.

use serde::{Deserialize, Serialize};
use tutorlink_rpc::{Channel, Metadata, Status};

pub mod methods {
    pub const INIT_UPLOAD: &str = "file.InitUpload";
    pub const GENERATE_DOWNLOAD_URL: &str = "file.GenerateDownloadUrl";
    pub const GET_FILE_META: &str = "file.GetFileMeta";
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitUploadRequest {
    #[prost(string, tag = "1")]
    pub file_name: String,
    #[prost(string, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitUploadResponse {
    #[prost(string, tag = "1")]
    pub file_id: String,
    #[prost(string, tag = "2")]
    pub upload_url: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateDownloadUrlRequest {
    #[prost(string, tag = "1")]
    pub file_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownloadUrl {
    #[prost(string, tag = "1")]
    pub url: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetFileMetaRequest {
    #[prost(string, tag = "1")]
    pub file_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileMeta {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[prost(int64, tag = "4")]
    pub size: i64,
    #[prost(int64, tag = "5")]
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct FileClient {
    channel: Channel,
}

impl FileClient {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }

    pub async fn init_upload(
        &self,
        metadata: &Metadata,
        req: InitUploadRequest,
    ) -> Result<InitUploadResponse, Status> {
        self.channel.call(methods::INIT_UPLOAD, metadata, &req).await
    }

    pub async fn generate_download_url(
        &self,
        metadata: &Metadata,
        req: GenerateDownloadUrlRequest,
    ) -> Result<DownloadUrl, Status> {
        self.channel
            .call(methods::GENERATE_DOWNLOAD_URL, metadata, &req)
            .await
    }

    pub async fn get_file_meta(
        &self,
        metadata: &Metadata,
        req: GetFileMetaRequest,
    ) -> Result<FileMeta, Status> {
        self.channel
            .call(methods::GET_FILE_META, metadata, &req)
            .await
    }
}
