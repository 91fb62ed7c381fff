mod export;
mod help;
mod state;
mod views;

use crate::api::types::{EditOptions, EditRequest, ImageRequest, SubtitleParams, VideoRequest};
use crate::api::validate::Validate;
use crate::api::MediaApi;
use crate::handoff::HandoffStore;
use crate::model::{AppEvent, ArtifactKind, ClientConfig, InfoEvent, PageId};
use crate::orchestrator::{self, ControllerCtx, Stage, StageStatus, UiCommand, WorkflowInput};
use crate::pages::{NavigationEvent, PageController};
use crate::progress::SimulatedProgress;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use state::{next_duration, Field, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::debug;

pub async fn run(cfg: ClientConfig, api: Arc<dyn MediaApi>, initial_page: &str) -> Result<()> {
    let mut pages = PageController::default();
    pages
        .navigate(initial_page)
        .with_context(|| format!("cannot open the TUI on {initial_page:?}"))?;

    // Unbounded channels keep the UI thread from ever waiting on the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let handoff = HandoffStore::new();
    let ctx = ControllerCtx::new(api, handoff.clone(), cfg.download_dir.clone());

    // Fill the home gallery straight away.
    let _ = cmd_tx.send(UiCommand::RefreshMedia);

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let server = cfg.base_url.clone();
    let ui_handle =
        std::thread::spawn(move || run_threaded(server, pages, handoff, event_rx, cmd_tx));

    let res = orchestrator::run_controller(ctx, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    server: String,
    pages: PageController,
    handoff: HandoffStore,
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut app = App::new(pages, handoff, cmd_tx);
    app.state.server = server;

    let tick_rate = Duration::from_millis(100);
    let progress_rate = Duration::from_millis(700);
    let mut last_tick = Instant::now();
    let mut last_progress = Instant::now();

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            app.apply_event(ev);
        }
        app.refresh_handoff();

        if last_progress.elapsed() >= progress_rate {
            app.state.tick_progress();
            last_progress = Instant::now();
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| views::draw(f.area(), f, &app.state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(k) {
                    break Ok(());
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

/// UI-thread state plus the handles it drives.
struct App {
    state: UiState,
    pages: PageController,
    nav_rx: UnboundedReceiver<NavigationEvent>,
    handoff: HandoffStore,
    cmd_tx: UnboundedSender<UiCommand>,
}

impl App {
    fn new(
        mut pages: PageController,
        handoff: HandoffStore,
        cmd_tx: UnboundedSender<UiCommand>,
    ) -> Self {
        let nav_rx = pages.subscribe();
        let mut app = Self {
            state: UiState {
                page: pages.active(),
                ..Default::default()
            },
            pages,
            nav_rx,
            handoff,
            cmd_tx,
        };
        app.state
            .inputs
            .activate(app.state.page, &app.handoff);
        app
    }

    /// Mirror the handoff slots still waiting for their destination page.
    fn refresh_handoff(&mut self) {
        self.state.waiting = [ArtifactKind::Image, ArtifactKind::Video]
            .into_iter()
            .filter_map(|kind| self.handoff.peek(kind).map(|path| (kind, path)))
            .collect();
    }

    fn send(&mut self, page: PageId, cmd: UiCommand) {
        self.state.pending.insert(page, SimulatedProgress::new());
        let _ = self.cmd_tx.send(cmd);
    }

    /// Apply navigation notifications: switch page, pick up handed-off sources.
    fn sync_navigation(&mut self) {
        while let Ok(NavigationEvent { from, to }) = self.nav_rx.try_recv() {
            self.state.page = to;
            if from == PageId::Workflow && to != PageId::Workflow {
                self.state.discard_workflow();
            }
            if let Some(path) = self.state.inputs.activate(to, &self.handoff) {
                self.state.info = format!("Using {path}");
            }
        }
    }

    fn apply_event(&mut self, ev: AppEvent) {
        let state = &mut self.state;
        match ev {
            AppEvent::StageStarted { run_id, stage } => {
                let wf = &mut state.workflow;
                if wf.run_id.as_deref() != Some(run_id.as_str()) {
                    wf.run_id = Some(run_id);
                }
                wf.running = true;
                wf.current = Some(stage);
                wf.progress.reset();
                wf.set_status(stage, StageStatus::Running);
                state.info = format!("{stage} stage running…");
            }
            AppEvent::StageFinished { stage, status, .. } => {
                let wf = &mut state.workflow;
                if wf.current == Some(stage) {
                    wf.progress.complete();
                    wf.current = None;
                }
                if let StageStatus::Failed(reason) = &status {
                    state.info = format!("{stage} stage failed: {reason}");
                }
                wf.set_status(stage, status);
            }
            AppEvent::WorkflowCompleted { run } => {
                let clip = Some(run.input.duration_seconds);
                for video in [run.video.artifact(), run.edit.artifact()].into_iter().flatten() {
                    state.note_clip_length(video, clip);
                }
                let wf = &mut state.workflow;
                wf.running = false;
                wf.current = None;
                wf.run_id = Some(run.id.clone());
                wf.edit_requested = run.edit_requested();
                for stage in Stage::ALL {
                    wf.set_status(stage, run.status(stage).clone());
                }
                state.info = match run.failure() {
                    Some((stage, reason)) => format!("Workflow stopped at {stage}: {reason}"),
                    None => "Workflow finished".into(),
                };
                wf.finished = Some(*run);
                state.pending.remove(&PageId::Workflow);
            }
            AppEvent::ArtifactReady { page, artifact } => {
                state.finish_pending(page);
                state.info = format!("Ready: {}", artifact.storage_path());
                let fallback = match page {
                    PageId::VideoEditor => Some(state.editor_caption_seconds()),
                    _ => None,
                };
                state.note_clip_length(&artifact, fallback);
                match page {
                    PageId::ImageGeneration => state.image_result = Some(artifact),
                    PageId::VideoGeneration => state.video_result = Some(artifact),
                    PageId::VideoEditor => state.edit_result = Some(artifact),
                    _ => {}
                }
            }
            AppEvent::RequestFailed { page, message } => {
                state.pending.remove(&page);
                if page == PageId::Workflow {
                    state.workflow.running = false;
                    state.workflow.current = None;
                }
                state.info = format!("{}: {message}", page.title());
            }
            AppEvent::MediaListed { media } => {
                state.finish_pending(PageId::Home);
                state.set_media(media);
            }
            AppEvent::Info(info) => {
                state.info = info.to_message();
            }
        }
    }

    /// Handle one key press. Returns `true` when the UI should exit.
    fn handle_key(&mut self, k: KeyEvent) -> bool {
        if let Some(field) = self.state.editing {
            self.edit_field(field, k);
            return false;
        }

        let page = self.state.page;
        match (k.modifiers, k.code) {
            (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                let _ = self.cmd_tx.send(UiCommand::Quit);
                return true;
            }
            (_, KeyCode::Tab) => {
                self.pages.next();
            }
            (_, KeyCode::BackTab) => {
                self.pages.previous();
            }
            (_, KeyCode::Char(c @ '1'..='6')) => {
                let idx = c as usize - '1' as usize;
                if let Some(target) = PageId::from_index(idx) {
                    self.pages.navigate_to(target);
                }
            }
            (_, KeyCode::Char('?')) => self.pages.navigate_to(PageId::Help),
            (_, KeyCode::Char('y')) => export::copy_current_path(&mut self.state),
            (_, KeyCode::Char(c)) if Field::for_key(page, c).is_some() => {
                if let Some(field) = Field::for_key(page, c) {
                    self.state.edit_backup = self.state.field_mut(field).clone();
                    self.state.editing = Some(field);
                    self.state.info = "Editing: enter to finish, esc to cancel".into();
                }
            }
            _ => self.page_key(page, k.code),
        }
        self.sync_navigation();
        self.refresh_handoff();
        false
    }

    fn edit_field(&mut self, field: Field, k: KeyEvent) {
        match k.code {
            KeyCode::Enter => {
                self.state.editing = None;
                self.state.info.clear();
            }
            KeyCode::Esc => {
                let backup = std::mem::take(&mut self.state.edit_backup);
                *self.state.field_mut(field) = backup;
                self.state.editing = None;
                self.state.info = "Edit discarded".into();
            }
            KeyCode::Backspace => {
                self.state.field_mut(field).pop();
            }
            KeyCode::Char(c) if !k.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.field_mut(field).push(c);
            }
            _ => {}
        }
    }

    fn page_key(&mut self, page: PageId, code: KeyCode) {
        match (page, code) {
            (PageId::Home, KeyCode::Char('r')) => {
                self.send(PageId::Home, UiCommand::RefreshMedia);
                self.state.info = InfoEvent::Requesting { what: "media list" }.to_message();
            }

            (PageId::Workflow, KeyCode::Char('d')) => {
                self.state.wf_duration = next_duration(self.state.wf_duration);
            }
            (PageId::Workflow, KeyCode::Enter) => self.start_workflow(),
            (PageId::Workflow, KeyCode::Char('x')) => {
                self.state.info = if self.state.discard_workflow() {
                    self.handoff.clear();
                    self.state.inputs.reset();
                    "Workflow reset; handed-over files cleared".into()
                } else {
                    "A workflow run is still in progress".into()
                };
            }

            (PageId::ImageGeneration, KeyCode::Char('a')) => self.state.cycle_aspect_ratio(),
            (PageId::ImageGeneration, KeyCode::Enter) => {
                let req = ImageRequest::new(
                    self.state.image_prompt.trim(),
                    self.state.aspect_ratio(),
                );
                self.submit(page, req.validate().map(|_| UiCommand::GenerateImage(req)));
            }
            (PageId::ImageGeneration, KeyCode::Char('u')) => {
                let path = self
                    .state
                    .image_result
                    .as_ref()
                    .map(|a| a.storage_path().to_string());
                self.hand_off(ArtifactKind::Image, path, PageId::VideoGeneration);
            }

            (PageId::VideoGeneration, KeyCode::Char('d')) => {
                self.state.video_duration = next_duration(self.state.video_duration);
            }
            (PageId::VideoGeneration, KeyCode::Char('m')) => {
                self.state.video_mode = self.state.video_mode.toggled();
            }
            (PageId::VideoGeneration, KeyCode::Enter) => {
                let mut req = VideoRequest::new(
                    self.state.inputs.video_source_image.clone(),
                    self.state.video_prompt.trim(),
                    self.state.video_duration,
                );
                req.mode = self.state.video_mode;
                self.submit(page, req.validate().map(|_| UiCommand::GenerateVideo(req)));
            }
            (PageId::VideoGeneration, KeyCode::Char('u')) => {
                let path = self
                    .state
                    .video_result
                    .as_ref()
                    .map(|a| a.storage_path().to_string());
                self.hand_off(ArtifactKind::Video, path, PageId::VideoEditor);
            }

            (PageId::VideoEditor, KeyCode::Enter) => {
                let Some(video_path) = self.state.inputs.editor_source_video.clone() else {
                    self.state.info = "video required".into();
                    return;
                };
                let req = EditRequest {
                    video_path,
                    edit_options: EditOptions::AddSubtitles(SubtitleParams::single_caption(
                        self.state.subtitle.trim(),
                        self.state.editor_caption_seconds(),
                    )),
                };
                self.submit(page, req.validate().map(|_| UiCommand::EditVideo(req)));
            }
            _ => {}
        }
    }

    /// Send a validated command, or show why it was rejected.
    fn submit(&mut self, page: PageId, cmd: crate::error::Result<UiCommand>) {
        if self.state.is_pending(page) {
            self.state.info = "Still waiting for the previous request".into();
            return;
        }
        match cmd {
            Ok(cmd) => {
                debug!(%page, "submit");
                self.send(page, cmd);
            }
            Err(e) => self.state.info = e.user_message(),
        }
    }

    fn start_workflow(&mut self) {
        let mut input = WorkflowInput::new(
            self.state.wf_image_prompt.clone(),
            self.state.wf_video_prompt.clone(),
        );
        input.duration_seconds = self.state.wf_duration;
        let input = input.with_subtitle(&self.state.wf_subtitle);
        if let Err(e) = input.validate() {
            self.state.info = e.user_message();
            return;
        }
        // The orchestrator also rejects overlapping runs; this keeps the view intact.
        if self.state.workflow.running {
            self.state.info = crate::error::AppError::WorkflowAlreadyRunning.user_message();
            return;
        }
        self.state.workflow = state::WorkflowView {
            running: true,
            edit_requested: input.edit.is_some(),
            ..Default::default()
        };
        self.send(PageId::Workflow, UiCommand::StartWorkflow(input));
        self.state.info = "Workflow started".into();
    }

    fn hand_off(&mut self, kind: ArtifactKind, path: Option<String>, dest: PageId) {
        let Some(path) = path else {
            self.state.info = "Generate something first".into();
            return;
        };
        self.handoff.put(kind, path.clone());
        self.state.info = InfoEvent::HandedOff { kind, path }.to_message();
        self.pages.navigate_to(dest);
    }
}
