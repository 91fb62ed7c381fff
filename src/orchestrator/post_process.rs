//! Post-run processing.
//!
//! Offers the run's artifacts to the handoff store and optionally downloads them.

use super::run::WorkflowRun;
use crate::api::MediaApi;
use crate::handoff::HandoffStore;
use crate::model::{ArtifactKind, GeneratedArtifact, InfoEvent};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Result of post-run processing, ready for presentation layers.
#[derive(Debug, Default)]
pub(crate) struct ProcessedRun {
    /// Slots written to the handoff store, in stage order.
    pub handed_off: Vec<(ArtifactKind, String)>,
    pub downloaded: Vec<PathBuf>,
    pub messages: Vec<String>,
}

/// Process a completed run: hand off the final image and video, then download every
/// succeeded artifact into `download_dir` when one is given.
pub(crate) async fn process_run_completion(
    api: &dyn MediaApi,
    handoff: &HandoffStore,
    run: &WorkflowRun,
    download_dir: Option<&Path>,
) -> ProcessedRun {
    let mut out = ProcessedRun::default();

    for artifact in [run.image.artifact(), run.final_video()].into_iter().flatten() {
        let path = artifact.storage_path().to_string();
        handoff.put(artifact.kind(), path.clone());
        out.handed_off.push((artifact.kind(), path));
    }

    if let Some(dir) = download_dir {
        for (_, artifact) in run.artifacts() {
            match save_artifact(api, artifact, dir).await {
                Ok(path) => {
                    out.messages
                        .push(InfoEvent::Downloaded { path: path.clone() }.to_message());
                    out.downloaded.push(path);
                }
                Err(e) => {
                    warn!(file = artifact.filename(), error = %e, "download failed");
                    out.messages
                        .push(format!("Download {} failed: {e:#}", artifact.filename()));
                }
            }
        }
    }

    out
}

/// Fetch one artifact and write it under `dir`, creating the directory if needed.
pub(crate) async fn save_artifact(
    api: &dyn MediaApi,
    artifact: &GeneratedArtifact,
    dir: &Path,
) -> anyhow::Result<PathBuf> {
    use anyhow::Context;

    let bytes = api
        .download(artifact.category(), artifact.filename())
        .await?;
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(artifact.filename());
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeApi;
    use crate::model::MediaCategory;
    use crate::orchestrator::{StageStatus, WorkflowInput};

    fn finished_run() -> WorkflowRun {
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
        run.edit = StageStatus::Succeeded(GeneratedArtifact::new(
            ArtifactKind::Video,
            MediaCategory::Edited,
            "subtitled.mp4",
            "edited/subtitled.mp4",
        ));
        run
    }

    #[tokio::test]
    async fn final_artifacts_are_handed_off() {
        let api = FakeApi::default();
        let handoff = HandoffStore::new();

        let processed = process_run_completion(&api, &handoff, &finished_run(), None).await;

        assert_eq!(
            handoff.peek(ArtifactKind::Image).as_deref(),
            Some("images/fox123.png")
        );
        // The edited video wins over the generated one.
        assert_eq!(
            handoff.peek(ArtifactKind::Video).as_deref(),
            Some("edited/subtitled.mp4")
        );
        assert_eq!(processed.handed_off.len(), 2);
        assert!(processed.downloaded.is_empty());
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_run_hands_off_only_what_succeeded() {
        let api = FakeApi::default();
        let handoff = HandoffStore::new();
        let mut run = finished_run();
        run.video = StageStatus::Failed("quota".into());
        run.edit = StageStatus::Pending;

        let processed = process_run_completion(&api, &handoff, &run, None).await;
        assert_eq!(
            processed.handed_off,
            vec![(ArtifactKind::Image, "images/fox123.png".to_string())]
        );
        assert_eq!(handoff.peek(ArtifactKind::Video), None);
    }

    #[tokio::test]
    async fn downloads_every_artifact_into_directory() {
        let api = FakeApi::default();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");

        let processed =
            process_run_completion(&api, &HandoffStore::new(), &finished_run(), Some(&target))
                .await;

        assert_eq!(processed.downloaded.len(), 3);
        let body = std::fs::read_to_string(target.join("fox_run.mp4")).unwrap();
        assert_eq!(body, "videos/fox_run.mp4");
        assert!(processed
            .messages
            .iter()
            .any(|m| m.starts_with("Downloaded: ")));
    }

    #[tokio::test]
    async fn download_failures_are_reported_not_fatal() {
        let api = FakeApi {
            fail_download: true,
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();

        let processed =
            process_run_completion(&api, &HandoffStore::new(), &finished_run(), Some(dir.path()))
                .await;

        assert!(processed.downloaded.is_empty());
        let failures = processed
            .messages
            .iter()
            .filter(|m| m.contains("failed"))
            .count();
        assert_eq!(failures, 3);
        assert_eq!(processed.handed_off.len(), 2);
    }
}
