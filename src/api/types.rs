//! Request and response payloads of the `/api` endpoints.

use serde::{Deserialize, Serialize};

pub const ASPECT_RATIOS: [&str; 5] = ["1:1", "9:16", "16:9", "4:3", "3:4"];
pub const DEFAULT_ASPECT_RATIO: &str = "9:16";
pub const VIDEO_DURATIONS: [u32; 2] = [5, 10];
pub const DEFAULT_CFG_SCALE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub aspect_ratio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>, aspect_ratio: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: aspect_ratio.into(),
            quality: None,
            style: None,
            seed: None,
            negative_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageResponse {
    pub filename: String,
    pub filepath: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub web_path: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VideoMode {
    #[default]
    Std,
    Pro,
}

impl VideoMode {
    pub fn toggled(self) -> Self {
        match self {
            VideoMode::Std => VideoMode::Pro,
            VideoMode::Pro => VideoMode::Std,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VideoMode::Std => "std",
            VideoMode::Pro => "pro",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VideoGenerationType {
    TextToVideo,
    ImageToVideo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub mode: VideoMode,
    #[serde(rename = "type")]
    pub generation_type: VideoGenerationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfg_scale: Option<f64>,
    pub duration: u32,
}

impl VideoRequest {
    /// Image-to-video when a source image path is given, text-to-video otherwise.
    pub fn new(image_path: Option<String>, prompt: impl Into<String>, duration: u32) -> Self {
        let generation_type = if image_path.is_some() {
            VideoGenerationType::ImageToVideo
        } else {
            VideoGenerationType::TextToVideo
        };
        Self {
            image_path,
            prompt: prompt.into(),
            negative_prompt: None,
            mode: VideoMode::default(),
            generation_type,
            cfg_scale: Some(DEFAULT_CFG_SCALE),
            duration,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoResponse {
    pub filename: String,
    pub filepath: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleParams {
    pub subtitles: Vec<SubtitleCue>,
    pub font_size: u32,
    pub font_color: String,
    pub position: String,
}

impl SubtitleParams {
    pub const FONT_COLORS: [&'static str; 6] = ["white", "black", "red", "green", "blue", "yellow"];
    pub const POSITIONS: [&'static str; 3] = ["top", "center", "bottom"];

    /// A single caption spanning the whole clip, white, 24pt, at the bottom.
    pub fn single_caption(text: impl Into<String>, duration_seconds: u32) -> Self {
        Self {
            subtitles: vec![SubtitleCue {
                start: 0.0,
                end: f64::from(duration_seconds),
                text: text.into(),
            }],
            font_size: 24,
            font_color: "white".into(),
            position: "bottom".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimParams {
    pub start_time: f64,
    pub end_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeParams {
    pub additional_videos: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkParams {
    pub watermark_path: String,
    pub position: String,
    pub opacity: f64,
}

impl WatermarkParams {
    pub const POSITIONS: [&'static str; 5] =
        ["top-left", "top-right", "bottom-left", "bottom-right", "center"];
}

/// `edit_options` object: `{"action": ..., "params": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "params", rename_all = "snake_case")]
pub enum EditOptions {
    AddSubtitles(SubtitleParams),
    Trim(TrimParams),
    Merge(MergeParams),
    AddWatermark(WatermarkParams),
}

impl EditOptions {
    pub fn action_name(&self) -> &'static str {
        match self {
            EditOptions::AddSubtitles(_) => "add_subtitles",
            EditOptions::Trim(_) => "trim",
            EditOptions::Merge(_) => "merge",
            EditOptions::AddWatermark(_) => "add_watermark",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditRequest {
    pub video_path: String,
    pub edit_options: EditOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditResponse {
    pub filename: String,
    #[serde(default)]
    pub filepath: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MediaListResponse {
    pub media: crate::model::MediaListing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoOptions {
    pub negative_prompt: String,
    pub mode: VideoMode,
    pub cfg_scale: f64,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowCompleteRequest {
    pub image_prompt: String,
    pub video_prompt: String,
    pub video_options: VideoOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_options: Option<EditOptions>,
}

/// Per-stage entry of the server-side workflow result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StageReport {
    pub fn succeeded(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerWorkflowReport {
    #[serde(default)]
    pub image: Option<StageReport>,
    #[serde(default)]
    pub video: Option<StageReport>,
    #[serde(default)]
    pub edited_video: Option<StageReport>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WorkflowCompleteResponse {
    pub result: ServerWorkflowReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn edit_options_use_action_and_params_keys() {
        let opts = EditOptions::Trim(TrimParams {
            start_time: 1.5,
            end_time: 4.0,
        });
        assert_eq!(
            serde_json::to_value(&opts).unwrap(),
            json!({"action": "trim", "params": {"start_time": 1.5, "end_time": 4.0}})
        );

        let opts = EditOptions::AddWatermark(WatermarkParams {
            watermark_path: "images/logo.png".into(),
            position: "bottom-right".into(),
            opacity: 0.5,
        });
        assert_eq!(
            serde_json::to_value(&opts).unwrap(),
            json!({
                "action": "add_watermark",
                "params": {"watermark_path": "images/logo.png", "position": "bottom-right", "opacity": 0.5}
            })
        );
    }

    #[test]
    fn single_caption_spans_clip() {
        let value = serde_json::to_value(EditOptions::AddSubtitles(
            SubtitleParams::single_caption("hello", 5),
        ))
        .unwrap();
        assert_eq!(value["action"], "add_subtitles");
        assert_eq!(
            value["params"]["subtitles"],
            json!([{"start": 0.0, "end": 5.0, "text": "hello"}])
        );
        assert_eq!(value["params"]["font_size"], 24);
        assert_eq!(value["params"]["position"], "bottom");
    }

    #[test]
    fn video_request_picks_generation_type() {
        let with_image = VideoRequest::new(Some("images/fox.png".into()), "run", 5);
        let value = serde_json::to_value(&with_image).unwrap();
        assert_eq!(value["type"], "image-to-video");
        assert_eq!(value["image_path"], "images/fox.png");
        assert_eq!(value["mode"], "std");

        let text_only = serde_json::to_value(VideoRequest::new(None, "run", 10)).unwrap();
        assert_eq!(text_only["type"], "text-to-video");
        assert!(text_only.get("image_path").is_none());
    }

    #[test]
    fn image_request_omits_unset_optionals() {
        let value = serde_json::to_value(ImageRequest::new("a red fox in snow", "1:1")).unwrap();
        assert_eq!(value, json!({"prompt": "a red fox in snow", "aspect_ratio": "1:1"}));
    }
}
