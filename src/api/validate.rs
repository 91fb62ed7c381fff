//! Client-side checks run before any request leaves the process.

use super::types::{
    EditOptions, EditRequest, ImageRequest, SubtitleParams, VideoRequest, WatermarkParams,
    WorkflowCompleteRequest, ASPECT_RATIOS, VIDEO_DURATIONS,
};
use crate::error::{AppError, Result};

pub const UPLOAD_EXTENSIONS: [&str; 11] = [
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "mp4", "avi", "mov", "mkv", "webm",
];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn require_text(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(message));
    }
    Ok(())
}

fn require_unit_range(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(AppError::validation(format!(
            "{name} must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(())
}

pub(crate) fn check_duration(duration: u32) -> Result<()> {
    if !VIDEO_DURATIONS.contains(&duration) {
        return Err(AppError::validation(format!(
            "duration must be 5 or 10 seconds, got {duration}"
        )));
    }
    Ok(())
}

impl Validate for ImageRequest {
    fn validate(&self) -> Result<()> {
        require_text(&self.prompt, "prompt required")?;
        if !ASPECT_RATIOS.contains(&self.aspect_ratio.as_str()) {
            return Err(AppError::validation(format!(
                "unsupported aspect ratio {:?} (expected one of {})",
                self.aspect_ratio,
                ASPECT_RATIOS.join(", ")
            )));
        }
        Ok(())
    }
}

impl Validate for VideoRequest {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.image_path {
            require_text(path, "image required")?;
        }
        require_text(&self.prompt, "prompt required")?;
        if let Some(cfg) = self.cfg_scale {
            require_unit_range("cfg_scale", cfg)?;
        }
        check_duration(self.duration)
    }
}

impl Validate for SubtitleParams {
    fn validate(&self) -> Result<()> {
        if self.subtitles.is_empty() {
            return Err(AppError::validation("at least one subtitle required"));
        }
        for cue in &self.subtitles {
            require_text(&cue.text, "subtitle text required")?;
            if cue.start < 0.0 || cue.end <= cue.start {
                return Err(AppError::validation(format!(
                    "subtitle {:?} must satisfy 0 <= start < end (got {}..{})",
                    cue.text, cue.start, cue.end
                )));
            }
        }
        if self.font_size == 0 {
            return Err(AppError::validation("font size must be positive"));
        }
        if !Self::FONT_COLORS.contains(&self.font_color.as_str()) {
            return Err(AppError::validation(format!(
                "unsupported font colour {:?}",
                self.font_color
            )));
        }
        if !Self::POSITIONS.contains(&self.position.as_str()) {
            return Err(AppError::validation(format!(
                "unsupported subtitle position {:?}",
                self.position
            )));
        }
        Ok(())
    }
}

impl Validate for EditOptions {
    fn validate(&self) -> Result<()> {
        match self {
            EditOptions::AddSubtitles(params) => params.validate(),
            EditOptions::Trim(t) => {
                if t.start_time < 0.0 || t.end_time <= t.start_time {
                    return Err(AppError::validation(format!(
                        "trim range must satisfy 0 <= start < end (got {}..{})",
                        t.start_time, t.end_time
                    )));
                }
                Ok(())
            }
            EditOptions::Merge(m) => {
                if m.additional_videos.is_empty() {
                    return Err(AppError::validation("select at least one video to merge"));
                }
                for path in &m.additional_videos {
                    require_text(path, "merge video path must not be empty")?;
                }
                Ok(())
            }
            EditOptions::AddWatermark(w) => {
                require_text(&w.watermark_path, "watermark image required")?;
                if !WatermarkParams::POSITIONS.contains(&w.position.as_str()) {
                    return Err(AppError::validation(format!(
                        "unsupported watermark position {:?}",
                        w.position
                    )));
                }
                require_unit_range("opacity", w.opacity)
            }
        }
    }
}

impl Validate for EditRequest {
    fn validate(&self) -> Result<()> {
        require_text(&self.video_path, "video required")?;
        self.edit_options.validate()
    }
}

impl Validate for WorkflowCompleteRequest {
    fn validate(&self) -> Result<()> {
        if self.image_prompt.trim().is_empty() || self.video_prompt.trim().is_empty() {
            return Err(AppError::validation(
                "image and video prompts are both required",
            ));
        }
        require_unit_range("cfg_scale", self.video_options.cfg_scale)?;
        check_duration(self.video_options.duration)?;
        match &self.edit_options {
            Some(opts) => opts.validate(),
            None => Ok(()),
        }
    }
}

pub(crate) fn validate_upload(file_name: &str, len: usize) -> Result<()> {
    if len == 0 {
        return Err(AppError::validation("file required"));
    }
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !UPLOAD_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::validation(format!(
            "file type not allowed: {file_name}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_download_name(filename: &str) -> Result<()> {
    require_text(filename, "filename required")?;
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(AppError::validation(format!(
            "invalid media filename: {filename}"
        )));
    }
    Ok(())
}
