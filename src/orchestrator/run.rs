//! Workflow run record: the input a user submitted plus the status of each stage.

use crate::api::types::{
    EditOptions, ImageRequest, SubtitleParams, VideoMode, VideoOptions, VideoRequest,
    WorkflowCompleteRequest, DEFAULT_ASPECT_RATIO, DEFAULT_CFG_SCALE,
};
use crate::api::validate::Validate;
use crate::error::Result;
use crate::model::GeneratedArtifact;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Image,
    Video,
    Edit,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Image, Stage::Video, Stage::Edit];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Image => "Image",
            Stage::Video => "Video",
            Stage::Edit => "Edit",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Succeeded(GeneratedArtifact),
    Failed(String),
}

impl StageStatus {
    pub fn artifact(&self) -> Option<&GeneratedArtifact> {
        match self {
            StageStatus::Succeeded(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StageStatus::Succeeded(_) | StageStatus::Failed(_)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Succeeded(_) => "succeeded",
            StageStatus::Failed(_) => "failed",
        }
    }
}

/// What the user submitted on the workflow form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowInput {
    pub image_prompt: String,
    pub video_prompt: String,
    pub duration_seconds: u32,
    pub aspect_ratio: String,
    pub video_mode: VideoMode,
    pub cfg_scale: f64,
    pub negative_prompt: String,
    pub edit: Option<EditOptions>,
}

impl WorkflowInput {
    pub fn new(image_prompt: impl Into<String>, video_prompt: impl Into<String>) -> Self {
        Self {
            image_prompt: image_prompt.into(),
            video_prompt: video_prompt.into(),
            duration_seconds: 5,
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            video_mode: VideoMode::default(),
            cfg_scale: DEFAULT_CFG_SCALE,
            negative_prompt: String::new(),
            edit: None,
        }
    }

    /// Caption the whole generated clip with `text`. Blank text leaves the run without
    /// an edit stage.
    pub fn with_subtitle(mut self, text: &str) -> Self {
        let text = text.trim();
        self.edit = if text.is_empty() {
            None
        } else {
            Some(EditOptions::AddSubtitles(SubtitleParams::single_caption(
                text,
                self.duration_seconds,
            )))
        };
        self
    }

    pub fn image_request(&self) -> ImageRequest {
        ImageRequest::new(self.image_prompt.trim(), self.aspect_ratio.clone())
    }

    pub fn video_request(&self, image_path: &str) -> VideoRequest {
        let mut req = VideoRequest::new(
            Some(image_path.to_string()),
            self.video_prompt.trim(),
            self.duration_seconds,
        );
        req.mode = self.video_mode;
        req.cfg_scale = Some(self.cfg_scale);
        if !self.negative_prompt.trim().is_empty() {
            req.negative_prompt = Some(self.negative_prompt.trim().to_string());
        }
        req
    }

    /// Body for the server-side `/api/workflow/complete` endpoint.
    pub fn server_request(&self) -> WorkflowCompleteRequest {
        WorkflowCompleteRequest {
            image_prompt: self.image_prompt.trim().to_string(),
            video_prompt: self.video_prompt.trim().to_string(),
            video_options: VideoOptions {
                negative_prompt: self.negative_prompt.trim().to_string(),
                mode: self.video_mode,
                cfg_scale: self.cfg_scale,
                duration: self.duration_seconds,
            },
            edit_options: self.edit.clone(),
        }
    }

    /// Check everything the three stages will send before the first request.
    pub fn validate(&self) -> Result<()> {
        self.server_request().validate()?;
        self.image_request().validate()
    }
}

/// One end-to-end execution of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowRun {
    pub id: String,
    pub started_at: String,
    pub input: WorkflowInput,
    pub image: StageStatus,
    pub video: StageStatus,
    pub edit: StageStatus,
}

/// Generate a short random run id.
fn gen_run_id() -> String {
    let mut b = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut b);
    format!("{:08x}", u32::from_le_bytes(b))
}

impl WorkflowRun {
    pub fn new(input: WorkflowInput) -> Self {
        Self {
            id: gen_run_id(),
            started_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            input,
            image: StageStatus::Pending,
            video: StageStatus::Pending,
            edit: StageStatus::Pending,
        }
    }

    pub fn status(&self, stage: Stage) -> &StageStatus {
        match stage {
            Stage::Image => &self.image,
            Stage::Video => &self.video,
            Stage::Edit => &self.edit,
        }
    }

    pub(crate) fn set_status(&mut self, stage: Stage, status: StageStatus) {
        match stage {
            Stage::Image => self.image = status,
            Stage::Video => self.video = status,
            Stage::Edit => self.edit = status,
        }
    }

    pub fn edit_requested(&self) -> bool {
        self.input.edit.is_some()
    }

    /// First failed stage and its reason.
    pub fn failure(&self) -> Option<(Stage, &str)> {
        Stage::ALL.iter().find_map(|&stage| match self.status(stage) {
            StageStatus::Failed(reason) => Some((stage, reason.as_str())),
            _ => None,
        })
    }

    pub fn succeeded(&self) -> bool {
        // An edit stage nobody asked for stays Pending and does not count against the run.
        self.failure().is_none()
            && Stage::ALL.iter().all(|&s| {
                self.status(s).is_terminal() || (s == Stage::Edit && !self.edit_requested())
            })
    }

    /// Artifacts of every stage that succeeded, in stage order.
    pub fn artifacts(&self) -> Vec<(Stage, &GeneratedArtifact)> {
        Stage::ALL
            .iter()
            .filter_map(|&stage| self.status(stage).artifact().map(|a| (stage, a)))
            .collect()
    }

    /// The most finished video: the edited one when present, else the generated one.
    pub fn final_video(&self) -> Option<&GeneratedArtifact> {
        self.edit.artifact().or_else(|| self.video.artifact())
    }
}
