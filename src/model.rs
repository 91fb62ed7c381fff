use crate::error::AppError;
use crate::orchestrator::{Stage, StageStatus, WorkflowRun};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Resolved client settings (flags > config file > defaults).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
    pub user_agent: String,
    pub download_dir: Option<PathBuf>,
}

/// Logical views of the application. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageId {
    Home,
    Workflow,
    ImageGeneration,
    VideoGeneration,
    VideoEditor,
    Help,
}

impl PageId {
    /// Tab order.
    pub const ALL: [PageId; 6] = [
        PageId::Home,
        PageId::Workflow,
        PageId::ImageGeneration,
        PageId::VideoGeneration,
        PageId::VideoEditor,
        PageId::Help,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PageId::Home => "home",
            PageId::Workflow => "workflow",
            PageId::ImageGeneration => "image-generation",
            PageId::VideoGeneration => "video-generation",
            PageId::VideoEditor => "video-editor",
            PageId::Help => "help",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PageId::Home => "Home",
            PageId::Workflow => "Workflow",
            PageId::ImageGeneration => "Image",
            PageId::VideoGeneration => "Video",
            PageId::VideoEditor => "Editor",
            PageId::Help => "Help",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<PageId> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| AppError::UnknownPage(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Image,
    Video,
}

/// Server-side storage folder, used to build download URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Images,
    Videos,
    Edited,
}

impl MediaCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaCategory::Images => "images",
            MediaCategory::Videos => "videos",
            MediaCategory::Edited => "edited",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A media file produced by the backend. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    filename: String,
    storage_path: String,
    kind: ArtifactKind,
    category: MediaCategory,
    #[serde(default)]
    source_prompt: Option<String>,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl GeneratedArtifact {
    pub fn new(
        kind: ArtifactKind,
        category: MediaCategory,
        filename: impl Into<String>,
        storage_path: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            storage_path: storage_path.into(),
            kind,
            category,
            source_prompt: None,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.source_prompt = Some(prompt.into());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn storage_path(&self) -> &str {
        &self.storage_path
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn category(&self) -> MediaCategory {
        self.category
    }

    pub fn source_prompt(&self) -> Option<&str> {
        self.source_prompt.as_deref()
    }

    pub fn metadata(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.metadata
    }

    /// Path relative to the download endpoint, e.g. `images/fox123.png`.
    pub fn download_path(&self) -> String {
        format!("{}/{}", self.category, self.filename)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    #[serde(default)]
    pub filename: Option<String>,
    pub filepath: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaListing {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub edited: Vec<String>,
}

/// One row of the recent-media gallery.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEntry {
    pub kind: ArtifactKind,
    pub category: MediaCategory,
    pub filename: String,
}

impl MediaEntry {
    pub fn download_path(&self) -> String {
        format!("{}/{}", self.category, self.filename)
    }
}

/// Entries shown in the home-page gallery.
pub const RECENT_MEDIA_LIMIT: usize = 8;

const EDITED_VIDEO_EXTENSIONS: [&str; 3] = [".mp4", ".avi", ".mov"];

impl MediaListing {
    pub fn count(&self) -> usize {
        self.images.len() + self.videos.len() + self.edited.len()
    }

    /// Latest `limit` entries, newest first. The server lists in directory order, so
    /// "latest" means the tail of images, then videos, then edited videos.
    pub fn recent(&self, limit: usize) -> Vec<MediaEntry> {
        let images = self.images.iter().map(|f| MediaEntry {
            kind: ArtifactKind::Image,
            category: MediaCategory::Images,
            filename: f.clone(),
        });
        let videos = self.videos.iter().map(|f| MediaEntry {
            kind: ArtifactKind::Video,
            category: MediaCategory::Videos,
            filename: f.clone(),
        });
        let edited = self
            .edited
            .iter()
            .filter(|f| {
                let lower = f.to_ascii_lowercase();
                EDITED_VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
            })
            .map(|f| MediaEntry {
                kind: ArtifactKind::Video,
                category: MediaCategory::Edited,
                filename: f.clone(),
            });

        let all: Vec<MediaEntry> = images.chain(videos).chain(edited).collect();
        let skip = all.len().saturating_sub(limit);
        all.into_iter().skip(skip).rev().collect()
    }
}

/// Events emitted by the controller/orchestrator and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum AppEvent {
    StageStarted {
        run_id: String,
        stage: Stage,
    },
    StageFinished {
        run_id: String,
        stage: Stage,
        status: StageStatus,
    },
    WorkflowCompleted {
        // Boxed: a full run is much larger than the other variants.
        run: Box<WorkflowRun>,
    },
    ArtifactReady {
        page: PageId,
        artifact: GeneratedArtifact,
    },
    RequestFailed {
        page: PageId,
        message: String,
    },
    MediaListed {
        media: MediaListing,
    },
    Info(InfoEvent),
}

/// Structured status messages for the status line / stderr.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    Message(String),
    Requesting { what: &'static str },
    HandedOff { kind: ArtifactKind, path: String },
    Downloaded { path: PathBuf },
}

impl InfoEvent {
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Requesting { what } => format!("Requesting {what}…"),
            InfoEvent::HandedOff { kind, path } => {
                let dest = match kind {
                    ArtifactKind::Image => PageId::VideoGeneration,
                    ArtifactKind::Video => PageId::VideoEditor,
                };
                format!("{path} is ready on the {} page", dest.title())
            }
            InfoEvent::Downloaded { path } => format!("Downloaded: {}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_ids_round_trip_through_their_names() {
        for page in PageId::ALL {
            assert_eq!(page.as_str().parse::<PageId>().unwrap(), page);
            assert_eq!(PageId::from_index(page.index()), Some(page));
        }
    }

    #[test]
    fn unknown_page_name_is_an_error() {
        let err = "settings".parse::<PageId>().unwrap_err();
        assert_eq!(err, AppError::UnknownPage("settings".into()));
    }

    #[test]
    fn recent_media_is_newest_first_and_limited() {
        let listing = MediaListing {
            images: vec!["a.png".into(), "b.png".into()],
            videos: vec!["c.mp4".into()],
            edited: vec!["d.mp4".into(), "subs.srt".into()],
        };
        let recent = listing.recent(3);
        let names: Vec<&str> = recent.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, vec!["d.mp4", "c.mp4", "b.png"]);
        assert_eq!(recent[0].download_path(), "edited/d.mp4");
        assert_eq!(listing.count(), 5);
    }

    #[test]
    fn artifact_download_path_uses_category_folder() {
        let artifact = GeneratedArtifact::new(
            ArtifactKind::Video,
            MediaCategory::Edited,
            "subtitled_1.mp4",
            "/srv/uploads/edited/subtitled_1.mp4",
        )
        .with_prompt("waves")
        .with_metadata("duration", 5);
        assert_eq!(artifact.download_path(), "edited/subtitled_1.mp4");
        assert_eq!(artifact.source_prompt(), Some("waves"));
        assert_eq!(artifact.metadata()["duration"], 5);
    }
}
