use crate::api::types::{
    EditOptions, EditRequest, ImageRequest, MergeParams, SubtitleCue, SubtitleParams, TrimParams,
    VideoMode, VideoRequest, WatermarkParams, DEFAULT_ASPECT_RATIO, DEFAULT_CFG_SCALE,
};
use crate::api::{ApiClient, MediaApi};
use crate::config::{self, Overrides};
use crate::handoff::HandoffStore;
use crate::model::{AppEvent, ClientConfig, GeneratedArtifact, MediaCategory};
use crate::orchestrator::{
    process_run_completion, save_artifact, StageStatus, WorkflowInput, WorkflowOrchestrator,
};
use crate::progress::SimulatedProgress;
use anyhow::{anyhow, Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

type OutputTx = mpsc::UnboundedSender<OutputLine>;

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (OutputTx, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "imageauto",
    version,
    about = "Image and video generation client for the ImageAuto server, with optional TUI"
)]
pub struct Cli {
    /// Base URL of the ImageAuto server [default: http://127.0.0.1:5000]
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Config file (JSON) [default: <config dir>/imageauto/config.json]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Per-request deadline, e.g. 90s or 5m [default: 5m]
    #[arg(long, global = true)]
    pub timeout: Option<humantime::Duration>,

    /// Print JSON results on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The TUI owns the terminal, so logging must go elsewhere.
    pub fn is_tui(&self) -> bool {
        matches!(self.command, None | Some(Command::Tui { .. }))
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Generate an image from a text prompt
    Image(ImageArgs),
    /// Generate a video from a prompt, optionally animating an image
    Video(VideoArgs),
    /// Apply an edit to a video
    Edit(EditArgs),
    /// Upload a local image or video to the server
    Upload {
        file: PathBuf,
    },
    /// List media stored on the server
    Media {
        #[arg(long = "type", value_enum, default_value_t = MediaFilter::All)]
        filter: MediaFilter,
        /// Show only the latest entries, newest first
        #[arg(long)]
        recent: bool,
    },
    /// Download a media file
    Download {
        #[arg(value_enum)]
        category: MediaCategory,
        filename: String,
        /// Destination file [default: ./<filename>]
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Run image → video → optional subtitles in one go
    Workflow(WorkflowArgs),
    /// Check that the server is up
    Health,
    /// Open the interactive TUI (the default with no command)
    Tui {
        /// Page to open on
        #[arg(long, default_value = "home")]
        page: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaFilter {
    All,
    Images,
    Videos,
    Edited,
}

impl MediaFilter {
    fn category(self) -> Option<MediaCategory> {
        match self {
            MediaFilter::All => None,
            MediaFilter::Images => Some(MediaCategory::Images),
            MediaFilter::Videos => Some(MediaCategory::Videos),
            MediaFilter::Edited => Some(MediaCategory::Edited),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ImageArgs {
    pub prompt: String,
    #[arg(long, default_value = DEFAULT_ASPECT_RATIO)]
    pub aspect_ratio: String,
    #[arg(long)]
    pub quality: Option<String>,
    #[arg(long)]
    pub style: Option<String>,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long)]
    pub negative_prompt: Option<String>,
    /// Save the result to the download directory (or the current directory)
    #[arg(long)]
    pub download: bool,
}

#[derive(Debug, Args, Clone)]
pub struct VideoArgs {
    pub prompt: String,
    /// Server-side path of the source image, e.g. images/fox123.png
    #[arg(long, conflicts_with = "upload")]
    pub image: Option<String>,
    /// Upload a local image first and animate it
    #[arg(long)]
    pub upload: Option<PathBuf>,
    #[arg(long)]
    pub negative_prompt: Option<String>,
    #[arg(long, value_enum, default_value_t = VideoMode::Std)]
    pub mode: VideoMode,
    #[arg(long, default_value_t = DEFAULT_CFG_SCALE)]
    pub cfg_scale: f64,
    /// Clip length in seconds (5 or 10)
    #[arg(long, default_value_t = 5)]
    pub duration: u32,
    #[arg(long)]
    pub download: bool,
}

#[derive(Debug, Args, Clone)]
#[command(group(ArgGroup::new("source").required(true).args(["video", "upload"])))]
pub struct EditArgs {
    /// Server-side path of the video to edit
    #[arg(long)]
    pub video: Option<String>,
    /// Upload a local video first and edit it
    #[arg(long)]
    pub upload: Option<PathBuf>,
    #[arg(long)]
    pub download: bool,
    #[command(subcommand)]
    pub action: EditAction,
}

#[derive(Debug, Subcommand, Clone)]
pub enum EditAction {
    /// Burn in subtitles
    Subtitles {
        /// START:END:TEXT, seconds; repeat for several cues
        #[arg(long = "cue", value_parser = parse_cue, required = true)]
        cues: Vec<SubtitleCue>,
        #[arg(long, default_value_t = 24)]
        font_size: u32,
        #[arg(long, default_value = "white")]
        font_color: String,
        #[arg(long, default_value = "bottom")]
        position: String,
    },
    /// Keep only the given time range
    Trim {
        #[arg(long)]
        start: f64,
        #[arg(long)]
        end: f64,
    },
    /// Append other server-side videos
    Merge {
        #[arg(required = true)]
        videos: Vec<String>,
    },
    /// Overlay an image
    Watermark {
        /// Server-side path of the watermark image
        watermark: String,
        #[arg(long, default_value = "bottom-right")]
        position: String,
        #[arg(long, default_value_t = 0.5)]
        opacity: f64,
    },
}

impl EditAction {
    fn into_options(self) -> EditOptions {
        match self {
            EditAction::Subtitles {
                cues,
                font_size,
                font_color,
                position,
            } => EditOptions::AddSubtitles(SubtitleParams {
                subtitles: cues,
                font_size,
                font_color,
                position,
            }),
            EditAction::Trim { start, end } => EditOptions::Trim(TrimParams {
                start_time: start,
                end_time: end,
            }),
            EditAction::Merge { videos } => EditOptions::Merge(MergeParams {
                additional_videos: videos,
            }),
            EditAction::Watermark {
                watermark,
                position,
                opacity,
            } => EditOptions::AddWatermark(WatermarkParams {
                watermark_path: watermark,
                position,
                opacity,
            }),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct WorkflowArgs {
    #[arg(long)]
    pub image_prompt: String,
    #[arg(long)]
    pub video_prompt: String,
    #[arg(long, default_value_t = 5)]
    pub duration: u32,
    #[arg(long, default_value = DEFAULT_ASPECT_RATIO)]
    pub aspect_ratio: String,
    #[arg(long, value_enum, default_value_t = VideoMode::Std)]
    pub mode: VideoMode,
    #[arg(long, default_value_t = DEFAULT_CFG_SCALE)]
    pub cfg_scale: f64,
    #[arg(long, default_value = "")]
    pub negative_prompt: String,
    /// Caption shown for the whole clip; adds an edit stage
    #[arg(long)]
    pub subtitle: Option<String>,
    /// Let the server run the whole pipeline in one request
    #[arg(long)]
    pub server: bool,
    /// Download every produced file here
    #[arg(long)]
    pub download_dir: Option<PathBuf>,
}

impl WorkflowArgs {
    fn into_input(self) -> WorkflowInput {
        let mut input = WorkflowInput::new(self.image_prompt, self.video_prompt);
        input.duration_seconds = self.duration;
        input.aspect_ratio = self.aspect_ratio;
        input.video_mode = self.mode;
        input.cfg_scale = self.cfg_scale;
        input.negative_prompt = self.negative_prompt;
        // Duration must be set before the caption is sized to it.
        match self.subtitle {
            Some(text) => input.with_subtitle(&text),
            None => input,
        }
    }
}

/// Parse a `START:END:TEXT` subtitle cue. The text may itself contain colons.
pub fn parse_cue(raw: &str) -> std::result::Result<SubtitleCue, String> {
    let mut parts = raw.splitn(3, ':');
    let (Some(start), Some(end), Some(text)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected START:END:TEXT, got {raw:?}"));
    };
    let start: f64 = start
        .trim()
        .parse()
        .map_err(|_| format!("invalid start time {start:?}"))?;
    let end: f64 = end
        .trim()
        .parse()
        .map_err(|_| format!("invalid end time {end:?}"))?;
    Ok(SubtitleCue {
        start,
        end,
        text: text.to_string(),
    })
}

/// Build a `ClientConfig` from CLI arguments and the config file.
pub fn build_config(args: &Cli) -> Result<ClientConfig> {
    let file = config::load(args.config.as_deref())?;
    let download_dir = match &args.command {
        Some(Command::Workflow(w)) => w.download_dir.clone(),
        _ => None,
    };
    Ok(config::resolve(
        file,
        Overrides {
            base_url: args.base_url.clone(),
            request_timeout: args.timeout.map(Duration::from),
            download_dir,
        },
    ))
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;
    let client = ApiClient::new(&cfg).context("invalid server address")?;
    tracing::info!(base_url = %client.base_url(), "using server");
    let api: Arc<dyn MediaApi> = Arc::new(client);

    let command = match args.command.clone() {
        None => Command::Tui {
            page: "home".into(),
        },
        Some(c) => c,
    };

    if let Command::Tui { page } = command {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(cfg, api, &page).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            let _ = page;
            return Err(anyhow!(
                "built without TUI support; run `imageauto --help` for the commands"
            ));
        }
    }

    let (out_tx, out_handle) = spawn_output_writer();
    let res = run_command(&args, &cfg, api, command, &out_tx).await;
    drop(out_tx);
    let _ = out_handle.await;
    res
}

async fn run_command(
    args: &Cli,
    cfg: &ClientConfig,
    api: Arc<dyn MediaApi>,
    command: Command,
    out: &OutputTx,
) -> Result<()> {
    let download_dir = || {
        cfg.download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    };

    match command {
        Command::Image(a) => {
            let mut req = ImageRequest::new(a.prompt, a.aspect_ratio);
            req.quality = a.quality;
            req.style = a.style;
            req.seed = a.seed;
            req.negative_prompt = a.negative_prompt;
            let artifact = with_progress(out, "Generating image", api.generate_image(&req))
                .await
                .context("image generation failed")?;
            emit_artifact(args, out, &artifact)?;
            if a.download {
                download_to(api.as_ref(), out, &artifact, &download_dir()).await?;
            }
        }
        Command::Video(a) => {
            let image_path = match (a.image, a.upload) {
                (Some(p), _) => Some(p),
                (None, Some(file)) => Some(upload_file(api.as_ref(), out, &file).await?),
                (None, None) => None,
            };
            let mut req = VideoRequest::new(image_path, a.prompt, a.duration);
            req.mode = a.mode;
            req.cfg_scale = Some(a.cfg_scale);
            req.negative_prompt = a.negative_prompt.filter(|s| !s.trim().is_empty());
            let artifact = with_progress(out, "Generating video", api.generate_video(&req))
                .await
                .context("video generation failed")?;
            emit_artifact(args, out, &artifact)?;
            if a.download {
                download_to(api.as_ref(), out, &artifact, &download_dir()).await?;
            }
        }
        Command::Edit(a) => {
            let video_path = match (a.video, a.upload) {
                (Some(p), _) => p,
                (None, Some(file)) => upload_file(api.as_ref(), out, &file).await?,
                (None, None) => return Err(anyhow!("video required")),
            };
            let req = EditRequest {
                video_path,
                edit_options: a.action.into_options(),
            };
            let what = format!("Editing video ({})", req.edit_options.action_name());
            let artifact = with_progress(out, &what, api.edit_video(&req))
                .await
                .context("video edit failed")?;
            emit_artifact(args, out, &artifact)?;
            if a.download {
                download_to(api.as_ref(), out, &artifact, &download_dir()).await?;
            }
        }
        Command::Upload { file } => {
            let (name, data) = read_upload(&file).await?;
            let uploaded = api.upload(&name, data).await.context("upload failed")?;
            if args.json {
                emit_json(out, &uploaded)?;
            } else {
                let _ = out.send(OutputLine::Stdout(format!("Uploaded: {}", uploaded.filepath)));
            }
        }
        Command::Media { filter, recent } => {
            let media = api
                .list_media(filter.category())
                .await
                .context("listing media failed")?;
            if args.json {
                emit_json(out, &media)?;
            } else {
                let limit = recent.then_some(crate::model::RECENT_MEDIA_LIMIT);
                for line in crate::text_summary::build_media_summary(&media, limit).lines {
                    let _ = out.send(OutputLine::Stdout(line));
                }
            }
        }
        Command::Download {
            category,
            filename,
            output,
        } => {
            let bytes = api
                .download(category, &filename)
                .await
                .context("download failed")?;
            let path = output.unwrap_or_else(|| PathBuf::from(&filename));
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("write {}", path.display()))?;
            if args.json {
                emit_json(out, &serde_json::json!({ "path": path, "bytes": bytes.len() }))?;
            } else {
                let _ = out.send(OutputLine::Stderr(format!(
                    "Downloaded: {} ({} bytes)",
                    path.display(),
                    bytes.len()
                )));
            }
        }
        Command::Workflow(a) => return run_workflow(args, cfg, api, a, out).await,
        Command::Health => {
            let health = api.health().await.context("health check failed")?;
            if args.json {
                emit_json(out, &health)?;
            } else {
                let mut line = format!("Server: {}", health.status);
                if let Some(msg) = health.message.as_deref() {
                    line.push_str(&format!(" ({msg})"));
                }
                if let Some(v) = health.version.as_deref() {
                    line.push_str(&format!(" version {v}"));
                }
                let _ = out.send(OutputLine::Stdout(line));
            }
        }
        Command::Tui { .. } => {}
    }
    Ok(())
}

/// Run the workflow, printing stage transitions on stderr while it runs.
async fn run_workflow(
    args: &Cli,
    cfg: &ClientConfig,
    api: Arc<dyn MediaApi>,
    wf: WorkflowArgs,
    out: &OutputTx,
) -> Result<()> {
    let server_side = wf.server;
    let input = wf.into_input();
    let orchestrator = WorkflowOrchestrator::new(api.clone());
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<AppEvent>();

    let run_fut = {
        let orchestrator = orchestrator.clone();
        async move {
            if server_side {
                orchestrator.run_on_server(input, Some(&evt_tx)).await
            } else {
                orchestrator.run(input, Some(&evt_tx)).await
            }
        }
    };
    let handle = tokio::spawn(run_fut);

    let mut progress = SimulatedProgress::new();
    let mut current = None;
    let mut ticker = tokio::time::interval(Duration::from_secs(2));
    loop {
        tokio::select! {
            ev = evt_rx.recv() => {
                let Some(ev) = ev else { break };
                match ev {
                    AppEvent::StageStarted { stage, .. } => {
                        progress.reset();
                        current = Some(stage);
                        let _ = out.send(OutputLine::Stderr(format!("== {stage} ==")));
                    }
                    AppEvent::StageFinished { stage, status, .. } => {
                        current = None;
                        if matches!(status, StageStatus::Succeeded(_)) {
                            progress.complete();
                            let _ = out.send(OutputLine::Stderr(format!("{stage}: {}", progress.label())));
                        }
                        let detail = match &status {
                            StageStatus::Succeeded(a) => a.storage_path().to_string(),
                            StageStatus::Failed(reason) => reason.clone(),
                            _ => String::new(),
                        };
                        let _ = out.send(OutputLine::Stderr(
                            format!("{stage}: {} {detail}", status.label()).trim_end().to_string(),
                        ));
                    }
                    _ => {}
                }
            }
            _ = ticker.tick(), if current.is_some() => {
                if !advance(&mut progress) {
                    continue;
                }
                if let Some(stage) = current {
                    let _ = out.send(OutputLine::Stderr(format!("{stage}: {}", progress.label())));
                }
            }
        }
    }

    let run = handle
        .await
        .context("workflow task failed")?
        .context("workflow failed")?;

    let processed = process_run_completion(
        api.as_ref(),
        &HandoffStore::new(),
        &run,
        cfg.download_dir.as_deref(),
    )
    .await;
    for path in &processed.downloaded {
        let _ = out.send(OutputLine::Stderr(format!("Saved: {}", path.display())));
    }
    for msg in processed.messages.iter().filter(|m| m.contains("failed")) {
        let _ = out.send(OutputLine::Stderr(msg.clone()));
    }

    if args.json {
        emit_json(out, &run)?;
    } else {
        for line in crate::text_summary::build_run_summary(&run).lines {
            let _ = out.send(OutputLine::Stdout(line));
        }
    }

    match run.failure() {
        Some((stage, reason)) => Err(anyhow!("{stage} stage failed: {reason}")),
        None => Ok(()),
    }
}

/// Await `fut`, printing an estimated progress line on stderr every two seconds.
async fn with_progress<F, T>(out: &OutputTx, what: &str, fut: F) -> T
where
    F: Future<Output = T>,
{
    let mut progress = SimulatedProgress::new();
    let mut ticker = tokio::time::interval(Duration::from_secs(2));
    // The first tick fires immediately.
    ticker.tick().await;
    let _ = out.send(OutputLine::Stderr(format!("{what}…")));
    tokio::pin!(fut);
    loop {
        tokio::select! {
            res = &mut fut => {
                progress.complete();
                let _ = out.send(OutputLine::Stderr(format!("{what}: {}", progress.label())));
                return res;
            }
            _ = ticker.tick() => {
                if advance(&mut progress) {
                    let _ = out.send(OutputLine::Stderr(format!("{what}: {}", progress.label())));
                }
            }
        }
    }
}

/// Tick the estimate; `false` once it has stalled at the cap.
fn advance(progress: &mut SimulatedProgress) -> bool {
    let before = progress.percent();
    progress.tick();
    progress.percent() > before
}

async fn read_upload(file: &Path) -> Result<(String, bytes::Bytes)> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("invalid file name: {}", file.display()))?
        .to_string();
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("read {}", file.display()))?;
    Ok((name, bytes::Bytes::from(data)))
}

/// Upload a local file and return its server-side path.
async fn upload_file(api: &dyn MediaApi, out: &OutputTx, file: &Path) -> Result<String> {
    let (name, data) = read_upload(file).await?;
    let uploaded = with_progress(out, "Uploading", api.upload(&name, data))
        .await
        .context("upload failed")?;
    let _ = out.send(OutputLine::Stderr(format!("Uploaded: {}", uploaded.filepath)));
    Ok(uploaded.filepath)
}

async fn download_to(
    api: &dyn MediaApi,
    out: &OutputTx,
    artifact: &GeneratedArtifact,
    dir: &Path,
) -> Result<()> {
    let path = save_artifact(api, artifact, dir).await?;
    let _ = out.send(OutputLine::Stderr(format!("Saved: {}", path.display())));
    Ok(())
}

fn emit_json<T: Serialize>(out: &OutputTx, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let _ = out.send(OutputLine::Stdout(json));
    Ok(())
}

fn emit_artifact(args: &Cli, out: &OutputTx, artifact: &GeneratedArtifact) -> Result<()> {
    if args.json {
        return emit_json(out, artifact);
    }
    for line in crate::text_summary::artifact_lines(artifact).lines {
        let _ = out.send(OutputLine::Stdout(line));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_text_may_contain_colons() {
        let cue = parse_cue("1.5:4:Note: the fox").unwrap();
        assert_eq!(cue.start, 1.5);
        assert_eq!(cue.end, 4.0);
        assert_eq!(cue.text, "Note: the fox");
        assert!(parse_cue("1:2").is_err());
        assert!(parse_cue("a:2:hi").is_err());
    }

    #[test]
    fn ticker_goes_quiet_at_the_estimate_cap() {
        let mut progress = SimulatedProgress::new();
        let mut printed = 0;
        for _ in 0..500 {
            if advance(&mut progress) {
                printed += 1;
            }
        }
        assert!(printed < 500);
        assert_eq!(progress.percent(), crate::progress::ESTIMATE_CAP);
        assert!(!advance(&mut progress));
        progress.complete();
        assert_eq!(progress.label(), "100%");
    }

    #[test]
    fn no_command_means_tui() {
        let cli = Cli::parse_from(["imageauto"]);
        assert!(cli.is_tui());
        let cli = Cli::parse_from(["imageauto", "--json", "health"]);
        assert!(!cli.is_tui());
        assert!(cli.json);
    }

    #[test]
    fn edit_requires_a_source() {
        let res = Cli::try_parse_from(["imageauto", "edit", "trim", "--start", "0", "--end", "2"]);
        assert!(res.is_err());

        let cli = Cli::try_parse_from([
            "imageauto", "edit", "--video", "videos/a.mp4", "subtitles", "--cue", "0:5:Hello",
        ])
        .unwrap();
        let Some(Command::Edit(edit)) = cli.command else {
            panic!("expected edit command");
        };
        assert_eq!(edit.video.as_deref(), Some("videos/a.mp4"));
        match edit.action.into_options() {
            EditOptions::AddSubtitles(p) => {
                assert_eq!(p.subtitles.len(), 1);
                assert_eq!(p.font_size, 24);
                assert_eq!(p.position, "bottom");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn workflow_subtitle_spans_requested_duration() {
        let cli = Cli::parse_from([
            "imageauto",
            "workflow",
            "--image-prompt",
            "a red fox in snow",
            "--video-prompt",
            "the fox runs",
            "--duration",
            "10",
            "--subtitle",
            "Run!",
        ]);
        let Some(Command::Workflow(wf)) = cli.command else {
            panic!("expected workflow command");
        };
        let input = wf.into_input();
        assert_eq!(input.duration_seconds, 10);
        match input.edit {
            Some(EditOptions::AddSubtitles(p)) => assert_eq!(p.subtitles[0].end, 10.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn timeout_flag_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("config.json");
        std::fs::write(&cfg_path, r#"{"request_timeout":"1m"}"#).unwrap();
        let cli = Cli::parse_from([
            "imageauto",
            "--config",
            cfg_path.to_str().unwrap(),
            "--timeout",
            "90s",
            "health",
        ]);
        let cfg = build_config(&cli).unwrap();
        assert_eq!(cfg.request_timeout, Duration::from_secs(90));
        assert_eq!(cfg.base_url, config::DEFAULT_BASE_URL);
    }
}
