use super::types::{
    EditOptions, EditRequest, EditResponse, HealthStatus, ImageRequest, ImageResponse,
    MediaListResponse, ServerWorkflowReport, VideoRequest, VideoResponse,
    WorkflowCompleteRequest, WorkflowCompleteResponse,
};
use super::validate::{validate_download_name, validate_upload, Validate};
use super::MediaApi;
use crate::error::{AppError, Result};
use crate::model::{
    ArtifactKind, ClientConfig, GeneratedArtifact, MediaCategory, MediaListing, UploadedFile,
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// HTTP implementation of [`MediaApi`] against the ImageAuto server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
    upload_timeout: Duration,
}

impl ApiClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&cfg.base_url).map_err(|e| {
            AppError::validation(format!("invalid base URL {:?}: {e}", cfg.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::validation(format!(
                "invalid base URL {:?}",
                cfg.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout)
            .connect_timeout(cfg.request_timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| AppError::api(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            request_timeout: cfg.request_timeout,
            upload_timeout: cfg.upload_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::validation(format!("invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn transport_error(&self, err: reqwest::Error, timeout: Duration) -> AppError {
        if err.is_timeout() {
            AppError::api(format!(
                "request timed out after {}",
                humantime::format_duration(timeout)
            ))
        } else if err.is_connect() {
            AppError::api(format!("could not reach {}: {err}", self.base_url))
        } else {
            AppError::api(format!("request failed: {err}"))
        }
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: &B, timeout: Duration) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!(%url, "POST");
        let resp = self
            .http
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e, timeout))?;
        self.decode(resp, timeout).await
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        timeout: Duration,
    ) -> Result<T> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| self.transport_error(e, timeout))?;
        let decoded = parse_envelope(status, &body);
        if let Err(e) = &decoded {
            warn!(%status, error = %e, "request rejected");
        }
        decoded
    }
}

/// Decode a `{success, error?, ...}` response body.
///
/// A non-2xx status or `success != true` is an API error carrying the server's `error`
/// text when there is one.
pub(crate) fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) if !status.is_success() => {
            return Err(AppError::api(format!("server returned HTTP {status}")))
        }
        Err(e) => return Err(AppError::api(format!("malformed response: {e}"))),
    };

    let success = value
        .get("success")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !status.is_success() || !success {
        let message = value
            .get("error")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| {
                if status.is_success() {
                    "server reported failure without a message".to_string()
                } else {
                    format!("server returned HTTP {status}")
                }
            });
        return Err(AppError::api(message));
    }

    serde_json::from_value(value)
        .map_err(|e| AppError::api(format!("unexpected response shape: {e}")))
}

#[async_trait]
impl MediaApi for ApiClient {
    async fn generate_image(&self, req: &ImageRequest) -> Result<GeneratedArtifact> {
        req.validate()?;
        info!(aspect_ratio = %req.aspect_ratio, "generating image");
        let resp: ImageResponse = self
            .post_json(&["api", "generate", "image"], req, self.request_timeout)
            .await?;

        let mut artifact = GeneratedArtifact::new(
            ArtifactKind::Image,
            MediaCategory::Images,
            resp.filename,
            resp.filepath,
        )
        .with_prompt(resp.prompt.unwrap_or_else(|| req.prompt.clone()))
        .with_metadata(
            "aspect_ratio",
            resp.aspect_ratio
                .unwrap_or_else(|| req.aspect_ratio.clone()),
        );
        if let Some(size) = resp.file_size {
            artifact = artifact.with_metadata("file_size", size);
        }
        if let Some(web_path) = resp.web_path {
            artifact = artifact.with_metadata("web_path", web_path);
        }
        info!(filename = artifact.filename(), "image ready");
        Ok(artifact)
    }

    async fn generate_video(&self, req: &VideoRequest) -> Result<GeneratedArtifact> {
        req.validate()?;
        info!(
            duration = req.duration,
            mode = req.mode.as_str(),
            from_image = req.image_path.is_some(),
            "generating video"
        );
        let resp: VideoResponse = self
            .post_json(&["api", "generate", "video"], req, self.request_timeout)
            .await?;

        let mut artifact = GeneratedArtifact::new(
            ArtifactKind::Video,
            MediaCategory::Videos,
            resp.filename,
            resp.filepath,
        )
        .with_prompt(resp.prompt.unwrap_or_else(|| req.prompt.clone()))
        .with_metadata(
            "duration",
            resp.duration.unwrap_or_else(|| f64::from(req.duration)),
        )
        .with_metadata("mode", req.mode.as_str());
        if let Some(image) = &req.image_path {
            artifact = artifact.with_metadata("source_image", image.as_str());
        }
        info!(filename = artifact.filename(), "video ready");
        Ok(artifact)
    }

    async fn edit_video(&self, req: &EditRequest) -> Result<GeneratedArtifact> {
        req.validate()?;
        let action = req.edit_options.action_name();
        info!(action, video = %req.video_path, "editing video");
        let resp: EditResponse = self
            .post_json(&["api", "edit", "video"], req, self.request_timeout)
            .await?;

        let storage_path = resp
            .filepath
            .unwrap_or_else(|| format!("edited/{}", resp.filename));
        let mut artifact = GeneratedArtifact::new(
            ArtifactKind::Video,
            MediaCategory::Edited,
            resp.filename,
            storage_path,
        )
        .with_metadata("action", action)
        .with_metadata("source_video", req.video_path.as_str());
        if let EditOptions::AddSubtitles(params) = &req.edit_options {
            let text: Vec<&str> = params.subtitles.iter().map(|c| c.text.as_str()).collect();
            artifact = artifact.with_prompt(text.join(" / "));
        }
        Ok(artifact)
    }

    async fn upload(&self, file_name: &str, data: Bytes) -> Result<UploadedFile> {
        validate_upload(file_name, data.len())?;
        let url = self.endpoint(&["api", "upload"])?;
        info!(file_name, bytes = data.len(), "uploading");

        let part = multipart::Part::stream(data).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        let resp = self
            .http
            .post(url)
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e, self.upload_timeout))?;
        self.decode(resp, self.upload_timeout).await
    }

    async fn list_media(&self, category: Option<MediaCategory>) -> Result<MediaListing> {
        let mut url = self.endpoint(&["api", "media", "list"])?;
        url.query_pairs_mut()
            .append_pair("type", category.map(|c| c.as_str()).unwrap_or("all"));
        debug!(%url, "GET");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e, self.request_timeout))?;
        let listing: MediaListResponse = self.decode(resp, self.request_timeout).await?;
        Ok(listing.media)
    }

    async fn download(&self, category: MediaCategory, filename: &str) -> Result<Bytes> {
        validate_download_name(filename)?;
        let url = self.endpoint(&["api", "media", "download", category.as_str(), filename])?;
        debug!(%url, "GET");
        let resp = self
            .http
            .get(url)
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e, self.upload_timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return match parse_envelope::<serde_json::Value>(status, &body) {
                Err(e) => Err(e),
                Ok(_) => Err(AppError::api(format!("server returned HTTP {status}"))),
            };
        }
        resp.bytes()
            .await
            .map_err(|e| self.transport_error(e, self.upload_timeout))
    }

    async fn complete_workflow(
        &self,
        req: &WorkflowCompleteRequest,
    ) -> Result<ServerWorkflowReport> {
        req.validate()?;
        info!("running server-side workflow");
        // One deadline for all three server-side stages.
        let timeout = self.request_timeout.saturating_mul(3);
        let resp: WorkflowCompleteResponse = self
            .post_json(&["api", "workflow", "complete"], req, timeout)
            .await?;
        Ok(resp.result)
    }

    async fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoint(&["health"])?;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e, self.request_timeout))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| self.transport_error(e, self.request_timeout))?;
        let health: HealthStatus = serde_json::from_str(&body).map_err(|_| {
            AppError::api(format!("health check returned HTTP {status} with no JSON body"))
        })?;
        if !status.is_success() {
            return Err(AppError::api(
                health
                    .message
                    .unwrap_or_else(|| format!("server returned HTTP {status}")),
            ));
        }
        Ok(health)
    }
}
