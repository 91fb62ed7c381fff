use crate::api::types::{VideoMode, ASPECT_RATIOS, VIDEO_DURATIONS};
use crate::model::{
    ArtifactKind, GeneratedArtifact, MediaEntry, MediaListing, PageId, RECENT_MEDIA_LIMIT,
};
use crate::orchestrator::{Stage, StageStatus, WorkflowRun};
use crate::pages::PageInputs;
use crate::progress::SimulatedProgress;
use std::collections::HashMap;

/// Text inputs that can take keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    WorkflowImagePrompt,
    WorkflowVideoPrompt,
    WorkflowSubtitle,
    ImagePrompt,
    VideoPrompt,
    EditorSubtitle,
}

impl Field {
    /// Focus key on `page`: `i` image prompt, `v` video prompt, `s` subtitle.
    pub fn for_key(page: PageId, key: char) -> Option<Field> {
        match (page, key) {
            (PageId::Workflow, 'i') => Some(Field::WorkflowImagePrompt),
            (PageId::Workflow, 'v') => Some(Field::WorkflowVideoPrompt),
            (PageId::Workflow, 's') => Some(Field::WorkflowSubtitle),
            (PageId::ImageGeneration, 'i') => Some(Field::ImagePrompt),
            (PageId::VideoGeneration, 'v') => Some(Field::VideoPrompt),
            (PageId::VideoEditor, 's') => Some(Field::EditorSubtitle),
            _ => None,
        }
    }
}

/// Stage statuses of the run on the Workflow page.
#[derive(Debug, Clone)]
pub struct WorkflowView {
    pub run_id: Option<String>,
    pub running: bool,
    /// Whether the submitted run carries a subtitle edit.
    pub edit_requested: bool,
    pub statuses: [StageStatus; 3],
    pub current: Option<Stage>,
    pub progress: SimulatedProgress,
    pub finished: Option<WorkflowRun>,
}

impl Default for WorkflowView {
    fn default() -> Self {
        Self {
            run_id: None,
            running: false,
            edit_requested: false,
            statuses: [StageStatus::Pending, StageStatus::Pending, StageStatus::Pending],
            current: None,
            progress: SimulatedProgress::new(),
            finished: None,
        }
    }
}

impl WorkflowView {
    pub fn status(&self, stage: Stage) -> &StageStatus {
        &self.statuses[stage_index(stage)]
    }

    pub fn set_status(&mut self, stage: Stage, status: StageStatus) {
        self.statuses[stage_index(stage)] = status;
    }
}

fn stage_index(stage: Stage) -> usize {
    match stage {
        Stage::Image => 0,
        Stage::Video => 1,
        Stage::Edit => 2,
    }
}

pub struct UiState {
    pub page: PageId,
    pub info: String,
    pub server: String,
    pub editing: Option<Field>,
    pub edit_backup: String,

    // Workflow page
    pub wf_image_prompt: String,
    pub wf_video_prompt: String,
    pub wf_subtitle: String,
    pub wf_duration: u32,
    pub workflow: WorkflowView,

    // Image page
    pub image_prompt: String,
    pub aspect_ratio_idx: usize,
    pub image_result: Option<GeneratedArtifact>,

    // Video page
    pub video_prompt: String,
    pub video_duration: u32,
    pub video_mode: VideoMode,
    pub video_result: Option<GeneratedArtifact>,

    // Editor page
    pub subtitle: String,
    pub edit_result: Option<GeneratedArtifact>,

    // Home page
    pub media: Option<MediaListing>,
    pub recent: Vec<MediaEntry>,

    /// Sources handed over from other pages.
    pub inputs: PageInputs,
    /// Handoff slots not yet picked up by their destination page.
    pub waiting: Vec<(ArtifactKind, String)>,
    /// Known clip lengths in seconds, keyed by storage path.
    pub clip_seconds: HashMap<String, f64>,
    /// Pages with a request in flight. Finished entries linger one tick at 100%.
    pub pending: HashMap<PageId, SimulatedProgress>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            page: PageId::Home,
            info: String::new(),
            server: String::new(),
            editing: None,
            edit_backup: String::new(),
            wf_image_prompt: String::new(),
            wf_video_prompt: String::new(),
            wf_subtitle: String::new(),
            wf_duration: VIDEO_DURATIONS[0],
            workflow: WorkflowView::default(),
            image_prompt: String::new(),
            // 9:16 portrait, the server's default.
            aspect_ratio_idx: 1,
            image_result: None,
            video_prompt: String::new(),
            video_duration: VIDEO_DURATIONS[0],
            video_mode: VideoMode::default(),
            video_result: None,
            subtitle: String::new(),
            edit_result: None,
            media: None,
            recent: Vec::new(),
            inputs: PageInputs::default(),
            waiting: Vec::new(),
            clip_seconds: HashMap::new(),
            pending: HashMap::new(),
        }
    }
}

impl UiState {
    pub fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::WorkflowImagePrompt => &mut self.wf_image_prompt,
            Field::WorkflowVideoPrompt => &mut self.wf_video_prompt,
            Field::WorkflowSubtitle => &mut self.wf_subtitle,
            Field::ImagePrompt => &mut self.image_prompt,
            Field::VideoPrompt => &mut self.video_prompt,
            Field::EditorSubtitle => &mut self.subtitle,
        }
    }

    pub fn aspect_ratio(&self) -> &'static str {
        ASPECT_RATIOS[self.aspect_ratio_idx % ASPECT_RATIOS.len()]
    }

    pub fn cycle_aspect_ratio(&mut self) {
        self.aspect_ratio_idx = (self.aspect_ratio_idx + 1) % ASPECT_RATIOS.len();
    }

    pub fn set_media(&mut self, media: MediaListing) {
        self.recent = media.recent(RECENT_MEDIA_LIMIT);
        self.media = Some(media);
    }

    pub fn is_pending(&self, page: PageId) -> bool {
        self.pending.get(&page).is_some_and(|p| !p.is_complete())
    }

    /// Show the page's gauge full until the next progress tick.
    pub fn finish_pending(&mut self, page: PageId) {
        if let Some(p) = self.pending.get_mut(&page) {
            p.complete();
        }
    }

    /// Advance every in-flight estimate, including the running workflow stage.
    pub fn tick_progress(&mut self) {
        self.pending.retain(|_, p| !p.is_complete());
        for p in self.pending.values_mut() {
            p.tick();
        }
        if self.workflow.current.is_some() {
            self.workflow.progress.tick();
        }
    }

    /// Path `y` copies on the current page.
    pub fn current_artifact_path(&self) -> Option<String> {
        let artifact = match self.page {
            PageId::ImageGeneration => self.image_result.as_ref(),
            PageId::VideoGeneration => self.video_result.as_ref(),
            PageId::VideoEditor => self.edit_result.as_ref(),
            PageId::Workflow => self
                .workflow
                .finished
                .as_ref()
                .and_then(|run| run.final_video().or_else(|| run.image.artifact())),
            PageId::Home => return self.recent.first().map(|e| e.download_path()),
            PageId::Help => None,
        };
        artifact.map(|a| a.storage_path().to_string())
    }

    /// Remember how long a video artifact runs, when the server said so.
    pub fn note_clip_length(&mut self, artifact: &GeneratedArtifact, fallback: Option<u32>) {
        if artifact.kind() != ArtifactKind::Video {
            return;
        }
        let seconds = artifact
            .metadata()
            .get("duration")
            .and_then(|v| v.as_f64())
            .or(fallback.map(f64::from));
        if let Some(seconds) = seconds.filter(|s| *s > 0.0) {
            self.clip_seconds
                .insert(artifact.storage_path().to_string(), seconds);
        }
    }

    /// Caption length for the Editor's source video: its known length, else the Video
    /// page's duration setting.
    pub fn editor_caption_seconds(&self) -> u32 {
        self.inputs
            .editor_source_video
            .as_ref()
            .and_then(|path| self.clip_seconds.get(path))
            .map(|s| s.ceil() as u32)
            .unwrap_or(self.video_duration)
    }

    /// Forget the last workflow run unless one is still in flight.
    pub fn discard_workflow(&mut self) -> bool {
        if self.workflow.running {
            return false;
        }
        self.workflow = WorkflowView::default();
        true
    }
}

/// Toggle between the two supported clip lengths.
pub fn next_duration(current: u32) -> u32 {
    match VIDEO_DURATIONS.iter().position(|&d| d == current) {
        Some(i) => VIDEO_DURATIONS[(i + 1) % VIDEO_DURATIONS.len()],
        None => VIDEO_DURATIONS[0],
    }
}
