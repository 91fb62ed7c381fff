//! In-process [`MediaApi`] fake shared by the orchestrator and controller tests.

use super::types::{
    EditRequest, HealthStatus, ImageRequest, ServerWorkflowReport, VideoRequest,
    WorkflowCompleteRequest,
};
use super::MediaApi;
use crate::error::{AppError, Result};
use crate::model::{ArtifactKind, GeneratedArtifact, MediaCategory, MediaListing, UploadedFile};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Records calls and fails the stages it is told to fail.
#[derive(Default)]
pub(crate) struct FakeApi {
    pub fail_image: Option<String>,
    pub fail_video: Option<String>,
    pub fail_download: bool,
    pub video_requests: Mutex<Vec<VideoRequest>>,
    pub edit_requests: Mutex<Vec<EditRequest>>,
    pub calls: Mutex<Vec<&'static str>>,
    /// When set, `generate_image` notifies the first and waits on the second.
    pub gate: Option<(Arc<Notify>, Arc<Notify>)>,
    pub server_report: Option<ServerWorkflowReport>,
    pub media: MediaListing,
}

impl FakeApi {
    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MediaApi for FakeApi {
    async fn generate_image(&self, req: &ImageRequest) -> Result<GeneratedArtifact> {
        self.record("image");
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        if let Some(msg) = &self.fail_image {
            return Err(AppError::api(msg.clone()));
        }
        Ok(GeneratedArtifact::new(
            ArtifactKind::Image,
            MediaCategory::Images,
            "fox123.png",
            "images/fox123.png",
        )
        .with_prompt(req.prompt.clone()))
    }

    async fn generate_video(&self, req: &VideoRequest) -> Result<GeneratedArtifact> {
        self.record("video");
        self.video_requests.lock().unwrap().push(req.clone());
        if let Some(msg) = &self.fail_video {
            return Err(AppError::api(msg.clone()));
        }
        Ok(GeneratedArtifact::new(
            ArtifactKind::Video,
            MediaCategory::Videos,
            "fox_run.mp4",
            "videos/fox_run.mp4",
        ))
    }

    async fn edit_video(&self, req: &EditRequest) -> Result<GeneratedArtifact> {
        self.record("edit");
        self.edit_requests.lock().unwrap().push(req.clone());
        Ok(GeneratedArtifact::new(
            ArtifactKind::Video,
            MediaCategory::Edited,
            "subtitled.mp4",
            "edited/subtitled.mp4",
        ))
    }

    async fn upload(&self, file_name: &str, _data: Bytes) -> Result<UploadedFile> {
        self.record("upload");
        Ok(UploadedFile {
            filename: Some(file_name.to_string()),
            filepath: format!("uploads/{file_name}"),
        })
    }

    async fn list_media(&self, _category: Option<MediaCategory>) -> Result<MediaListing> {
        self.record("list");
        Ok(self.media.clone())
    }

    async fn download(&self, category: MediaCategory, filename: &str) -> Result<Bytes> {
        self.record("download");
        if self.fail_download {
            return Err(AppError::api("server returned HTTP 404"));
        }
        Ok(Bytes::from(format!("{category}/{filename}")))
    }

    async fn complete_workflow(
        &self,
        _req: &WorkflowCompleteRequest,
    ) -> Result<ServerWorkflowReport> {
        self.record("complete");
        self.server_report
            .clone()
            .ok_or_else(|| AppError::api("workflow failed"))
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.record("health");
        Ok(HealthStatus {
            status: "healthy".into(),
            message: None,
            version: None,
        })
    }
}
