//! Sequential image → video → edit pipeline against the backend.

use super::run::{Stage, StageStatus, WorkflowInput, WorkflowRun};
use crate::api::types::{EditRequest, StageReport};
use crate::api::MediaApi;
use crate::error::{AppError, Result};
use crate::model::{AppEvent, ArtifactKind, GeneratedArtifact, MediaCategory};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

/// Drives workflow runs. Clones share the single-run guard.
#[derive(Clone)]
pub struct WorkflowOrchestrator {
    api: Arc<dyn MediaApi>,
    running: Arc<AtomicBool>,
}

/// Releases the single-run guard however the run ends.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl WorkflowOrchestrator {
    pub fn new(api: Arc<dyn MediaApi>) -> Self {
        Self {
            api,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<RunGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::WorkflowAlreadyRunning)?;
        Ok(RunGuard(self.running.clone()))
    }

    /// Execute a run stage by stage.
    ///
    /// Stage failures are recorded in the returned run rather than returned as errors, so
    /// callers always get the partial result. `Err` means the run never started: another
    /// run is in flight, or the input failed validation.
    pub async fn run(
        &self,
        input: WorkflowInput,
        events: Option<&UnboundedSender<AppEvent>>,
    ) -> Result<WorkflowRun> {
        let _guard = self.acquire()?;
        input.validate()?;

        let mut run = WorkflowRun::new(input);
        info!(run_id = %run.id, edit = run.edit_requested(), "workflow started");

        let image_req = run.input.image_request();
        let image = self
            .stage(&mut run, Stage::Image, events, self.api.generate_image(&image_req))
            .await;

        if let Some(image) = image {
            let video_req = run.input.video_request(image.storage_path());
            let video = self
                .stage(&mut run, Stage::Video, events, self.api.generate_video(&video_req))
                .await;

            if let (Some(video), Some(edit_options)) = (video, run.input.edit.clone()) {
                let edit_req = EditRequest {
                    video_path: video.storage_path().to_string(),
                    edit_options,
                };
                self.stage(&mut run, Stage::Edit, events, self.api.edit_video(&edit_req))
                    .await;
            }
        }

        match run.failure() {
            Some((stage, reason)) => {
                warn!(run_id = %run.id, %stage, reason, "workflow halted")
            }
            None => info!(run_id = %run.id, "workflow finished"),
        }
        emit(
            events,
            AppEvent::WorkflowCompleted {
                run: Box::new(run.clone()),
            },
        );
        Ok(run)
    }

    /// Run one stage: mark it running, await the call, record the outcome.
    async fn stage<F>(
        &self,
        run: &mut WorkflowRun,
        stage: Stage,
        events: Option<&UnboundedSender<AppEvent>>,
        call: F,
    ) -> Option<GeneratedArtifact>
    where
        F: std::future::Future<Output = Result<GeneratedArtifact>>,
    {
        run.set_status(stage, StageStatus::Running);
        info!(run_id = %run.id, %stage, "stage running");
        emit(
            events,
            AppEvent::StageStarted {
                run_id: run.id.clone(),
                stage,
            },
        );

        let status = match call.await {
            Ok(artifact) => StageStatus::Succeeded(artifact),
            Err(e) => StageStatus::Failed(e.user_message()),
        };
        run.set_status(stage, status.clone());
        emit(
            events,
            AppEvent::StageFinished {
                run_id: run.id.clone(),
                stage,
                status: status.clone(),
            },
        );
        status.artifact().cloned()
    }

    /// Run the whole pipeline server-side via `/api/workflow/complete`.
    ///
    /// The server reports either full success or one error for the whole pipeline, so an
    /// API error is returned as `Err` instead of being pinned on a stage.
    pub async fn run_on_server(
        &self,
        input: WorkflowInput,
        events: Option<&UnboundedSender<AppEvent>>,
    ) -> Result<WorkflowRun> {
        let _guard = self.acquire()?;
        input.validate()?;

        let mut run = WorkflowRun::new(input);
        info!(run_id = %run.id, "server-side workflow started");
        run.image = StageStatus::Running;
        emit(
            events,
            AppEvent::StageStarted {
                run_id: run.id.clone(),
                stage: Stage::Image,
            },
        );

        let report = match self.api.complete_workflow(&run.input.server_request()).await {
            Ok(report) => report,
            Err(e) => {
                // Close the Image stage so subscribers do not keep showing it as running.
                warn!(run_id = %run.id, error = %e, "server-side workflow failed");
                run.image = StageStatus::Failed(e.user_message());
                emit(
                    events,
                    AppEvent::StageFinished {
                        run_id: run.id.clone(),
                        stage: Stage::Image,
                        status: run.image.clone(),
                    },
                );
                emit(
                    events,
                    AppEvent::WorkflowCompleted {
                        run: Box::new(run),
                    },
                );
                return Err(e);
            }
        };

        let prompts = (run.input.image_prompt.clone(), run.input.video_prompt.clone());
        run.image = report_status(
            report.image.as_ref(),
            ArtifactKind::Image,
            MediaCategory::Images,
            &prompts.0,
        );
        run.video = report_status(
            report.video.as_ref(),
            ArtifactKind::Video,
            MediaCategory::Videos,
            &prompts.1,
        );
        if run.edit_requested() {
            run.edit = report_status(
                report.edited_video.as_ref(),
                ArtifactKind::Video,
                MediaCategory::Edited,
                &prompts.1,
            );
        }

        let reported = Stage::ALL
            .into_iter()
            .filter(|&stage| stage != Stage::Edit || run.edit_requested());
        for stage in reported {
            emit(
                events,
                AppEvent::StageFinished {
                    run_id: run.id.clone(),
                    stage,
                    status: run.status(stage).clone(),
                },
            );
        }
        emit(
            events,
            AppEvent::WorkflowCompleted {
                run: Box::new(run.clone()),
            },
        );
        Ok(run)
    }
}

fn emit(events: Option<&UnboundedSender<AppEvent>>, event: AppEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

fn report_status(
    report: Option<&StageReport>,
    kind: ArtifactKind,
    category: MediaCategory,
    prompt: &str,
) -> StageStatus {
    let Some(report) = report else {
        return StageStatus::Pending;
    };
    if !report.succeeded() {
        return StageStatus::Failed(
            report
                .error
                .clone()
                .unwrap_or_else(|| format!("stage reported status {:?}", report.status)),
        );
    }
    let Some(filename) = report.filename.clone() else {
        return StageStatus::Failed("server reported success without a filename".into());
    };
    let storage_path = report
        .filepath
        .clone()
        .unwrap_or_else(|| format!("{}/{}", category, filename));
    let mut artifact = GeneratedArtifact::new(kind, category, filename, storage_path)
        .with_prompt(report.prompt.clone().unwrap_or_else(|| prompt.to_string()));
    if let Some(duration) = report.duration {
        artifact = artifact.with_metadata("duration", duration);
    }
    StageStatus::Succeeded(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeApi;
    use crate::api::types::ServerWorkflowReport;
    use tokio::sync::Notify;

    fn fox_input() -> WorkflowInput {
        let mut input = WorkflowInput::new("a red fox in snow", "the fox runs");
        input.aspect_ratio = "1:1".into();
        input
    }

    #[tokio::test]
    async fn image_artifact_feeds_video_stage() {
        let api = Arc::new(FakeApi::default());
        let orch = WorkflowOrchestrator::new(api.clone());

        let run = orch.run(fox_input(), None).await.unwrap();

        assert_eq!(
            run.image.artifact().map(|a| a.storage_path()),
            Some("images/fox123.png")
        );
        let video_reqs = api.video_requests.lock().unwrap();
        assert_eq!(video_reqs.len(), 1);
        assert_eq!(video_reqs[0].image_path.as_deref(), Some("images/fox123.png"));
        assert!(matches!(run.video, StageStatus::Succeeded(_)));
        assert_eq!(run.edit, StageStatus::Pending);
        assert!(run.succeeded());
        assert!(!orch.is_running());
    }

    #[tokio::test]
    async fn image_failure_leaves_later_stages_pending() {
        let api = Arc::new(FakeApi {
            fail_image: Some("generator offline".into()),
            ..Default::default()
        });
        let orch = WorkflowOrchestrator::new(api.clone());

        let run = orch
            .run(fox_input().with_subtitle("hello"), None)
            .await
            .unwrap();

        assert_eq!(run.image, StageStatus::Failed("generator offline".into()));
        assert_eq!(run.video, StageStatus::Pending);
        assert_eq!(run.edit, StageStatus::Pending);
        assert_eq!(*api.calls.lock().unwrap(), vec!["image"]);
    }

    #[tokio::test]
    async fn video_failure_keeps_image_result() {
        let api = Arc::new(FakeApi {
            fail_video: Some("quota exceeded".into()),
            ..Default::default()
        });
        let orch = WorkflowOrchestrator::new(api.clone());

        let run = orch
            .run(fox_input().with_subtitle("hello"), None)
            .await
            .unwrap();

        assert_eq!(
            run.image.artifact().map(|a| a.filename()),
            Some("fox123.png")
        );
        assert_eq!(run.video, StageStatus::Failed("quota exceeded".into()));
        assert_eq!(run.edit, StageStatus::Pending);
        assert_eq!(run.failure(), Some((Stage::Video, "quota exceeded")));
    }

    #[tokio::test]
    async fn edit_stage_consumes_generated_video() {
        let api = Arc::new(FakeApi::default());
        let orch = WorkflowOrchestrator::new(api.clone());

        let run = orch
            .run(fox_input().with_subtitle("Run, fox!"), None)
            .await
            .unwrap();

        let edits = api.edit_requests.lock().unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].video_path, "videos/fox_run.mp4");
        assert_eq!(
            run.final_video().map(|a| a.download_path()),
            Some("edited/subtitled.mp4".to_string())
        );
        assert_eq!(*api.calls.lock().unwrap(), vec!["image", "video", "edit"]);
    }

    #[tokio::test]
    async fn events_follow_stage_order() {
        let api = Arc::new(FakeApi::default());
        let orch = WorkflowOrchestrator::new(api);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        orch.run(fox_input(), Some(&tx)).await.unwrap();
        drop(tx);

        let mut seen = Vec::new();
        while let Some(ev) = rx.recv().await {
            seen.push(match ev {
                AppEvent::StageStarted { stage, .. } => format!("start {stage}"),
                AppEvent::StageFinished { stage, status, .. } => {
                    format!("{stage} {}", status.label())
                }
                AppEvent::WorkflowCompleted { .. } => "done".to_string(),
                other => panic!("unexpected event {other:?}"),
            });
        }
        assert_eq!(
            seen,
            vec![
                "start Image",
                "Image succeeded",
                "start Video",
                "Video succeeded",
                "done"
            ]
        );
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_without_calls() {
        let api = Arc::new(FakeApi::default());
        let orch = WorkflowOrchestrator::new(api.clone());

        let err = orch
            .run(WorkflowInput::new("", "the fox runs"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(api.calls.lock().unwrap().is_empty());
        assert!(!orch.is_running());
    }

    #[tokio::test]
    async fn second_run_is_rejected_while_first_is_in_flight() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let api = Arc::new(FakeApi {
            gate: Some((entered.clone(), release.clone())),
            ..Default::default()
        });
        let orch = WorkflowOrchestrator::new(api.clone());

        let first = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.run(fox_input(), None).await })
        };
        entered.notified().await;
        assert!(orch.is_running());

        let err = orch.run(fox_input(), None).await.unwrap_err();
        assert_eq!(err, AppError::WorkflowAlreadyRunning);
        let err = orch.run_on_server(fox_input(), None).await.unwrap_err();
        assert_eq!(err, AppError::WorkflowAlreadyRunning);

        release.notify_one();
        let run = first.await.unwrap().unwrap();
        assert!(run.succeeded());
        assert_eq!(*api.calls.lock().unwrap(), vec!["image", "video"]);
        assert!(!orch.is_running());
    }

    #[tokio::test]
    async fn server_report_maps_to_stage_statuses() {
        let api = Arc::new(FakeApi {
            server_report: Some(ServerWorkflowReport {
                image: Some(StageReport {
                    status: "success".into(),
                    filename: Some("fox123.png".into()),
                    prompt: Some("a red fox in snow".into()),
                    ..Default::default()
                }),
                video: Some(StageReport {
                    status: "success".into(),
                    filename: Some("fox_run.mp4".into()),
                    duration: Some(5.0),
                    ..Default::default()
                }),
                edited_video: None,
            }),
            ..Default::default()
        });
        let orch = WorkflowOrchestrator::new(api);

        let run = orch.run_on_server(fox_input(), None).await.unwrap();
        assert_eq!(
            run.image.artifact().map(|a| a.storage_path()),
            Some("images/fox123.png")
        );
        assert_eq!(
            run.video.artifact().map(|a| a.metadata()["duration"].clone()),
            Some(serde_json::json!(5.0))
        );
        assert_eq!(run.edit, StageStatus::Pending);
        assert!(run.succeeded());
    }

    #[tokio::test]
    async fn server_failure_is_returned_and_guard_released() {
        let api = Arc::new(FakeApi::default());
        let orch = WorkflowOrchestrator::new(api);
        let err = orch.run_on_server(fox_input(), None).await.unwrap_err();
        assert_eq!(err, AppError::api("workflow failed"));
        assert!(!orch.is_running());
    }

    #[tokio::test]
    async fn server_failure_closes_the_started_stage() {
        let api = Arc::new(FakeApi::default());
        let orch = WorkflowOrchestrator::new(api);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        assert!(orch.run_on_server(fox_input(), Some(&tx)).await.is_err());
        drop(tx);

        let mut events = Vec::new();
        while let Some(ev) = rx.recv().await {
            events.push(ev);
        }
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0],
            AppEvent::StageStarted {
                stage: Stage::Image,
                ..
            }
        ));
        match &events[1] {
            AppEvent::StageFinished { stage, status, .. } => {
                assert_eq!(*stage, Stage::Image);
                assert_eq!(*status, StageStatus::Failed("workflow failed".into()));
            }
            other => panic!("unexpected event {other:?}"),
        }
        match &events[2] {
            AppEvent::WorkflowCompleted { run } => {
                assert_eq!(run.failure(), Some((Stage::Image, "workflow failed")));
                assert_eq!(run.video, StageStatus::Pending);
                assert_eq!(run.edit, StageStatus::Pending);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn image_failure_without_edit_keeps_edit_pending() {
        let api = Arc::new(FakeApi {
            fail_image: Some("generator offline".into()),
            ..Default::default()
        });
        let orch = WorkflowOrchestrator::new(api);

        let run = orch.run(fox_input(), None).await.unwrap();

        assert_eq!(run.image, StageStatus::Failed("generator offline".into()));
        assert_eq!(run.video, StageStatus::Pending);
        assert_eq!(run.edit, StageStatus::Pending);
        assert!(!run.succeeded());
    }
}
