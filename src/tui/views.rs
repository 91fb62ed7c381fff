//! Per-page rendering.

use super::export::shorten;
use super::state::{Field, UiState};
use crate::model::{ArtifactKind, GeneratedArtifact, PageId};
use crate::orchestrator::{Stage, StageStatus};
use crate::progress::SimulatedProgress;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Tabs, Wrap},
    Frame,
};

pub fn draw(area: Rect, f: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let titles: Vec<Line> = PageId::ALL
        .iter()
        .map(|p| Line::from(format!("{} {}", p.index() + 1, p.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(state.page.index())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("imageauto | {}", state.server)),
        )
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.page {
        PageId::Home => draw_home(chunks[1], f, state),
        PageId::Workflow => draw_workflow(chunks[1], f, state),
        PageId::ImageGeneration => draw_image(chunks[1], f, state),
        PageId::VideoGeneration => draw_video(chunks[1], f, state),
        PageId::VideoEditor => draw_editor(chunks[1], f, state),
        PageId::Help => super::help::draw_help(chunks[1], f),
    }

    let status = Paragraph::new(state.info.clone())
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, chunks[2]);
}

fn label(text: &str) -> Span<'static> {
    Span::styled(format!("{text}: "), Style::default().fg(Color::Gray))
}

fn key_hint(key: &str) -> Span<'static> {
    Span::styled(format!("[{key}] "), Style::default().fg(Color::Magenta))
}

/// One labelled input line; the focused field gets a cursor and highlight.
fn field_line(
    state: &UiState,
    field: Field,
    key: &str,
    name: &str,
    value: &str,
) -> Line<'static> {
    let focused = state.editing == Some(field);
    let value_span = if focused {
        Span::styled(
            format!("{value}▏"),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )
    } else if value.is_empty() {
        Span::styled("(empty)", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(value.to_string())
    };
    Line::from(vec![key_hint(key), label(name), value_span])
}

fn artifact_lines(title: &str, artifact: Option<&GeneratedArtifact>) -> Vec<Line<'static>> {
    let Some(a) = artifact else {
        return vec![Line::from(Span::styled(
            format!("No {title} yet"),
            Style::default().fg(Color::DarkGray),
        ))];
    };
    let mut lines = vec![
        Line::from(vec![
            label(title),
            Span::styled(a.filename().to_string(), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![label("Path"), Span::raw(a.storage_path().to_string())]),
    ];
    if let Some(prompt) = a.source_prompt() {
        lines.push(Line::from(vec![label("Prompt"), Span::raw(shorten(prompt, 80))]));
    }
    lines
}

fn gauge(title: &str, progress: &SimulatedProgress) -> Gauge<'static> {
    Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(progress.ratio())
        .label(progress.label())
}

/// Form on top, optional gauge, result below.
fn draw_form_page(
    area: Rect,
    f: &mut Frame,
    title: &str,
    form: Vec<Line<'static>>,
    pending: Option<&SimulatedProgress>,
    result: Vec<Line<'static>>,
) {
    let form_height = form.len() as u16 + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(form_height),
            Constraint::Length(if pending.is_some() { 3 } else { 0 }),
            Constraint::Min(0),
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(form)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(title.to_string())),
        chunks[0],
    );
    if let Some(p) = pending {
        f.render_widget(gauge("Working", p), chunks[1]);
    }
    f.render_widget(
        Paragraph::new(result).block(Block::default().borders(Borders::ALL).title("Result")),
        chunks[2],
    );
}

/// Handed-over files not yet picked up by their destination page.
fn waiting_lines(state: &UiState) -> Vec<Line<'static>> {
    state
        .waiting
        .iter()
        .map(|(kind, path)| {
            let page = match kind {
                ArtifactKind::Image => "Video page",
                ArtifactKind::Video => "Editor page",
            };
            Line::from(vec![
                label("Waiting"),
                Span::styled(path.clone(), Style::default().fg(Color::Yellow)),
                Span::raw(format!(" for the {page}")),
            ])
        })
        .collect()
}

fn draw_home(area: Rect, f: &mut Frame, state: &UiState) {
    let mut lines = waiting_lines(state);
    if !lines.is_empty() {
        lines.push(Line::from(""));
    }
    match &state.media {
        None if state.is_pending(PageId::Home) => lines.push(Line::from("Loading media…")),
        None => lines.push(Line::from("Press r to load recent media")),
        Some(media) => {
            lines.push(Line::from(vec![
                label("Stored files"),
                Span::raw(media.count().to_string()),
                Span::raw(format!(
                    "  ({} images, {} videos, {} edited)",
                    media.images.len(),
                    media.videos.len(),
                    media.edited.len()
                )),
            ]));
            lines.push(Line::from(""));
            if state.recent.is_empty() {
                lines.push(Line::from("No media yet. Start on the Workflow or Image page."));
            }
            for entry in &state.recent {
                let color = match entry.category {
                    crate::model::MediaCategory::Images => Color::Cyan,
                    crate::model::MediaCategory::Videos => Color::Green,
                    crate::model::MediaCategory::Edited => Color::Yellow,
                };
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{:<7}", entry.category.as_str()),
                        Style::default().fg(color),
                    ),
                    Span::raw(entry.filename.clone()),
                ]));
            }
        }
    }
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Recent media (r refresh)"),
        ),
        area,
    );
}

fn stage_style(status: &StageStatus) -> Style {
    match status {
        StageStatus::Pending => Style::default().fg(Color::DarkGray),
        StageStatus::Running => Style::default().fg(Color::Cyan),
        StageStatus::Succeeded(_) => Style::default().fg(Color::Green),
        StageStatus::Failed(_) => Style::default().fg(Color::Red),
    }
}

fn draw_workflow(area: Rect, f: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let form = vec![
        field_line(
            state,
            Field::WorkflowImagePrompt,
            "i",
            "Image prompt",
            &state.wf_image_prompt,
        ),
        field_line(
            state,
            Field::WorkflowVideoPrompt,
            "v",
            "Video prompt",
            &state.wf_video_prompt,
        ),
        field_line(
            state,
            Field::WorkflowSubtitle,
            "s",
            "Subtitle (optional)",
            &state.wf_subtitle,
        ),
        Line::from(vec![
            key_hint("d"),
            label("Duration"),
            Span::raw(format!("{}s", state.wf_duration)),
        ]),
    ];
    let title = match (&state.workflow.run_id, state.workflow.running) {
        (Some(id), true) => format!("Workflow {id} (running)"),
        (_, true) => "Workflow (running)".to_string(),
        _ => "Workflow (enter start, x reset)".to_string(),
    };
    f.render_widget(
        Paragraph::new(form).block(Block::default().borders(Borders::ALL).title(title)),
        chunks[0],
    );

    for (i, stage) in Stage::ALL.iter().enumerate() {
        let status = state.workflow.status(*stage);
        let rect = chunks[i + 1];
        if matches!(status, StageStatus::Running) {
            f.render_widget(
                gauge(&format!("{stage}: running"), &state.workflow.progress),
                rect,
            );
            continue;
        }
        let detail = match status {
            StageStatus::Succeeded(a) => a.storage_path().to_string(),
            StageStatus::Failed(reason) => reason.clone(),
            StageStatus::Pending
                if *stage == Stage::Edit
                    && !state.workflow.edit_requested
                    && (state.workflow.running || state.workflow.finished.is_some()) =>
            {
                "no subtitle requested".to_string()
            }
            _ => String::new(),
        };
        let line = Line::from(vec![
            Span::styled(format!("{:<10}", status.label()), stage_style(status)),
            Span::raw(detail),
        ]);
        f.render_widget(
            Paragraph::new(line).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(stage.label()),
            ),
            rect,
        );
    }

    let mut summary = Vec::new();
    if let Some(run) = &state.workflow.finished {
        summary.push(Line::from(vec![label("Run"), Span::raw(run.id.clone())]));
        match run.failure() {
            Some((stage, reason)) => summary.push(Line::from(Span::styled(
                format!("Stopped at {stage}: {reason}"),
                Style::default().fg(Color::Red),
            ))),
            None => {
                if let Some(video) = run.final_video() {
                    summary.push(Line::from(vec![
                        label("Final video"),
                        Span::styled(
                            video.storage_path().to_string(),
                            Style::default().fg(Color::Green),
                        ),
                    ]));
                }
            }
        }
    }
    summary.extend(waiting_lines(state));
    f.render_widget(
        Paragraph::new(summary).block(Block::default().borders(Borders::ALL).title("Result")),
        chunks[4],
    );
}

fn draw_image(area: Rect, f: &mut Frame, state: &UiState) {
    let form = vec![
        field_line(state, Field::ImagePrompt, "i", "Prompt", &state.image_prompt),
        Line::from(vec![
            key_hint("a"),
            label("Aspect ratio"),
            Span::raw(state.aspect_ratio()),
        ]),
    ];
    let mut result = artifact_lines("Image", state.image_result.as_ref());
    if state.image_result.is_some() {
        result.push(Line::from(vec![key_hint("u"), Span::raw("animate on the Video page")]));
    }
    draw_form_page(
        area,
        f,
        "Image generation (enter generate)",
        form,
        state.pending.get(&PageId::ImageGeneration),
        result,
    );
}

fn draw_video(area: Rect, f: &mut Frame, state: &UiState) {
    let source = match &state.inputs.video_source_image {
        Some(path) => Span::styled(path.clone(), Style::default().fg(Color::Green)),
        None => Span::styled("none (text-to-video)", Style::default().fg(Color::DarkGray)),
    };
    let form = vec![
        Line::from(vec![label("Source image"), source]),
        field_line(state, Field::VideoPrompt, "v", "Prompt", &state.video_prompt),
        Line::from(vec![
            key_hint("d"),
            label("Duration"),
            Span::raw(format!("{}s", state.video_duration)),
            Span::raw("   "),
            key_hint("m"),
            label("Mode"),
            Span::raw(state.video_mode.as_str()),
        ]),
    ];
    let mut result = artifact_lines("Video", state.video_result.as_ref());
    if state.video_result.is_some() {
        result.push(Line::from(vec![key_hint("u"), Span::raw("edit on the Editor page")]));
    }
    draw_form_page(
        area,
        f,
        "Video generation (enter generate)",
        form,
        state.pending.get(&PageId::VideoGeneration),
        result,
    );
}

fn draw_editor(area: Rect, f: &mut Frame, state: &UiState) {
    let source = match &state.inputs.editor_source_video {
        Some(path) => Span::styled(path.clone(), Style::default().fg(Color::Green)),
        None => Span::styled(
            "none (generate a video and press u)",
            Style::default().fg(Color::DarkGray),
        ),
    };
    let form = vec![
        Line::from(vec![label("Video"), source]),
        field_line(state, Field::EditorSubtitle, "s", "Subtitle", &state.subtitle),
        Line::from(vec![
            label("Shown for"),
            Span::raw(format!("0-{}s, white, bottom", state.editor_caption_seconds())),
        ]),
    ];
    draw_form_page(
        area,
        f,
        "Video editor (enter add subtitle)",
        form,
        state.pending.get(&PageId::VideoEditor),
        artifact_lines("Edited video", state.edit_result.as_ref()),
    );
}
