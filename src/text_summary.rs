//! Text summary builder for CLI output.
//!
//! Formats human-readable lines for artifacts, workflow runs and media listings.

use crate::model::{GeneratedArtifact, MediaListing};
use crate::orchestrator::{Stage, StageStatus, WorkflowRun};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn artifact_lines(artifact: &GeneratedArtifact) -> TextSummary {
    let mut lines = vec![
        format!("File: {}", artifact.filename()),
        format!("Path: {}", artifact.storage_path()),
    ];
    if let Some(prompt) = artifact.source_prompt() {
        if !prompt.trim().is_empty() {
            lines.push(format!("Prompt: {prompt}"));
        }
    }
    for (key, value) in artifact.metadata() {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        lines.push(format!("{key}: {value}"));
    }
    TextSummary { lines }
}

fn stage_line(run: &WorkflowRun, stage: Stage) -> String {
    let status = run.status(stage);
    let detail = match status {
        StageStatus::Succeeded(a) => a.storage_path().to_string(),
        StageStatus::Failed(reason) => reason.clone(),
        StageStatus::Pending if stage == Stage::Edit && !run.edit_requested() => {
            "no edit requested".to_string()
        }
        StageStatus::Pending | StageStatus::Running => "-".to_string(),
    };
    format!("{:<6} {:<10} {}", stage.label(), status.label(), detail)
}

/// One line per stage, plus the run header and outcome.
pub(crate) fn build_run_summary(run: &WorkflowRun) -> TextSummary {
    let mut lines = vec![format!("Run {} (started {})", run.id, run.started_at)];
    for stage in Stage::ALL {
        lines.push(stage_line(run, stage));
    }
    match run.failure() {
        Some((stage, _)) => lines.push(format!("Workflow stopped at the {stage} stage")),
        None if run.succeeded() => {
            if let Some(video) = run.final_video() {
                lines.push(format!("Final video: {}", video.download_path()));
            }
        }
        None => lines.push("Workflow did not finish".to_string()),
    }
    TextSummary { lines }
}

pub(crate) fn build_media_summary(media: &MediaListing, recent: Option<usize>) -> TextSummary {
    let mut lines = Vec::new();
    match recent {
        Some(limit) => {
            for entry in media.recent(limit) {
                lines.push(entry.download_path());
            }
        }
        None => {
            for (title, files) in [
                ("Images", &media.images),
                ("Videos", &media.videos),
                ("Edited", &media.edited),
            ] {
                if files.is_empty() {
                    continue;
                }
                lines.push(format!("{title} ({}):", files.len()));
                lines.extend(files.iter().map(|f| format!("  {f}")));
            }
        }
    }
    lines.push(format!("Total: {}", media.count()));
    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArtifactKind, MediaCategory};
    use crate::orchestrator::WorkflowInput;

    #[test]
    fn failed_run_names_the_stopping_stage() {
        let mut run = WorkflowRun::new(WorkflowInput::new("fox", "fox runs"));
        run.image = StageStatus::Succeeded(GeneratedArtifact::new(
            ArtifactKind::Image,
            MediaCategory::Images,
            "fox123.png",
            "images/fox123.png",
        ));
        run.video = StageStatus::Failed("quota exceeded".into());

        let lines = build_run_summary(&run).lines;
        assert_eq!(lines.len(), 5);
        assert!(lines[1].contains("images/fox123.png"));
        assert!(lines[2].contains("failed") && lines[2].contains("quota exceeded"));
        assert!(lines[3].contains("pending"));
        assert_eq!(lines[4], "Workflow stopped at the Video stage");
    }

    #[test]
    fn unrequested_edit_is_reported_as_such() {
        let mut run = WorkflowRun::new(WorkflowInput::new("fox", "fox runs"));
        run.image = StageStatus::Succeeded(GeneratedArtifact::new(
            ArtifactKind::Image,
            MediaCategory::Images,
            "fox123.png",
            "images/fox123.png",
        ));
        run.video = StageStatus::Succeeded(GeneratedArtifact::new(
            ArtifactKind::Video,
            MediaCategory::Videos,
            "fox_run.mp4",
            "videos/fox_run.mp4",
        ));

        let lines = build_run_summary(&run).lines;
        assert!(lines[3].contains("pending") && lines[3].contains("no edit requested"));
        assert_eq!(lines[4], "Final video: videos/fox_run.mp4");
    }

    #[test]
    fn artifact_lines_include_metadata() {
        let artifact = GeneratedArtifact::new(
            ArtifactKind::Video,
            MediaCategory::Videos,
            "clip.mp4",
            "videos/clip.mp4",
        )
        .with_prompt("waves")
        .with_metadata("duration", 5.0);
        let lines = artifact_lines(&artifact).lines;
        assert_eq!(
            lines,
            vec!["File: clip.mp4", "Path: videos/clip.mp4", "Prompt: waves", "duration: 5.0"]
        );
    }

    #[test]
    fn media_summary_groups_by_category() {
        let media = MediaListing {
            images: vec!["a.png".into()],
            videos: vec![],
            edited: vec!["e.mp4".into()],
        };
        let lines = build_media_summary(&media, None).lines;
        assert_eq!(
            lines,
            vec!["Images (1):", "  a.png", "Edited (1):", "  e.mp4", "Total: 2"]
        );
        let recent = build_media_summary(&media, Some(1)).lines;
        assert_eq!(recent, vec!["edited/e.mp4", "Total: 2"]);
    }
}
