mod client;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;
pub mod validate;

pub use client::ApiClient;

use crate::error::Result;
use crate::model::{GeneratedArtifact, MediaCategory, MediaListing, UploadedFile};
use async_trait::async_trait;
use bytes::Bytes;
use types::{
    EditRequest, HealthStatus, ImageRequest, ServerWorkflowReport, VideoRequest,
    WorkflowCompleteRequest,
};

/// Backend capabilities used by the pages and the workflow orchestrator.
///
/// Implementations validate their input before touching the network and map every
/// transport or server failure to [`crate::error::AppError::Api`].
#[async_trait]
pub trait MediaApi: Send + Sync {
    async fn generate_image(&self, req: &ImageRequest) -> Result<GeneratedArtifact>;

    async fn generate_video(&self, req: &VideoRequest) -> Result<GeneratedArtifact>;

    async fn edit_video(&self, req: &EditRequest) -> Result<GeneratedArtifact>;

    async fn upload(&self, file_name: &str, data: Bytes) -> Result<UploadedFile>;

    /// `None` lists every category.
    async fn list_media(&self, category: Option<MediaCategory>) -> Result<MediaListing>;

    async fn download(&self, category: MediaCategory, filename: &str) -> Result<Bytes>;

    async fn complete_workflow(&self, req: &WorkflowCompleteRequest)
        -> Result<ServerWorkflowReport>;

    async fn health(&self) -> Result<HealthStatus>;
}
