//! Request controller.
//!
//! Receives commands from the TUI thread, runs each one as its own task against the API,
//! and emits events for the presentation layer.

use super::post_process::process_run_completion;
use super::run::WorkflowInput;
use super::workflow::WorkflowOrchestrator;
use crate::api::types::{EditRequest, ImageRequest, VideoRequest};
use crate::api::MediaApi;
use crate::error::AppError;
use crate::handoff::HandoffStore;
use crate::model::{AppEvent, GeneratedArtifact, InfoEvent, PageId};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    GenerateImage(ImageRequest),
    GenerateVideo(VideoRequest),
    EditVideo(EditRequest),
    StartWorkflow(WorkflowInput),
    RefreshMedia,
    Quit,
}

/// Everything a spawned request task needs.
#[derive(Clone)]
pub(crate) struct ControllerCtx {
    pub api: Arc<dyn MediaApi>,
    pub orchestrator: WorkflowOrchestrator,
    pub handoff: HandoffStore,
    pub download_dir: Option<PathBuf>,
}

impl ControllerCtx {
    pub fn new(api: Arc<dyn MediaApi>, handoff: HandoffStore, download_dir: Option<PathBuf>) -> Self {
        Self {
            orchestrator: WorkflowOrchestrator::new(api.clone()),
            api,
            handoff,
            download_dir,
        }
    }
}

fn send_result(
    event_tx: &UnboundedSender<AppEvent>,
    page: PageId,
    res: crate::error::Result<GeneratedArtifact>,
) {
    let ev = match res {
        Ok(artifact) => AppEvent::ArtifactReady { page, artifact },
        Err(e) => {
            warn!(%page, error = %e, "request failed");
            AppEvent::RequestFailed {
                page,
                message: e.user_message(),
            }
        }
    };
    let _ = event_tx.send(ev);
}

/// Run one command to completion, reporting through `event_tx`.
async fn handle(ctx: ControllerCtx, event_tx: UnboundedSender<AppEvent>, cmd: UiCommand) {
    match cmd {
        UiCommand::GenerateImage(req) => {
            let _ = event_tx.send(AppEvent::Info(InfoEvent::Requesting { what: "image" }));
            let res = ctx.api.generate_image(&req).await;
            send_result(&event_tx, PageId::ImageGeneration, res);
        }
        UiCommand::GenerateVideo(req) => {
            let _ = event_tx.send(AppEvent::Info(InfoEvent::Requesting { what: "video" }));
            let res = ctx.api.generate_video(&req).await;
            send_result(&event_tx, PageId::VideoGeneration, res);
        }
        UiCommand::EditVideo(req) => {
            let _ = event_tx.send(AppEvent::Info(InfoEvent::Requesting { what: "edit" }));
            let res = ctx.api.edit_video(&req).await;
            send_result(&event_tx, PageId::VideoEditor, res);
        }
        UiCommand::StartWorkflow(input) => {
            match ctx.orchestrator.run(input, Some(&event_tx)).await {
                Ok(run) => {
                    let processed = process_run_completion(
                        ctx.api.as_ref(),
                        &ctx.handoff,
                        &run,
                        ctx.download_dir.as_deref(),
                    )
                    .await;
                    for (kind, path) in processed.handed_off {
                        let _ = event_tx.send(AppEvent::Info(InfoEvent::HandedOff { kind, path }));
                    }
                    for msg in processed.messages {
                        let _ = event_tx.send(AppEvent::Info(InfoEvent::Message(msg)));
                    }
                }
                Err(e) => {
                    let _ = event_tx.send(AppEvent::RequestFailed {
                        page: PageId::Workflow,
                        message: e.user_message(),
                    });
                }
            }
        }
        UiCommand::RefreshMedia => match ctx.api.list_media(None).await {
            Ok(media) => {
                let _ = event_tx.send(AppEvent::MediaListed { media });
            }
            Err(e) => {
                let _ = event_tx.send(AppEvent::RequestFailed {
                    page: PageId::Home,
                    message: e.user_message(),
                });
            }
        },
        UiCommand::Quit => {}
    }
}

/// Dispatch UI commands until `Quit` (or the command channel closes).
///
/// Commands run concurrently; the orchestrator's guard rejects a second workflow while
/// one is in flight. Requests still in flight at quit are aborted.
pub(crate) async fn run_controller(
    ctx: ControllerCtx,
    event_tx: UnboundedSender<AppEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut tasks: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Quit) | None => break,
                    Some(UiCommand::StartWorkflow(_)) if ctx.orchestrator.is_running() => {
                        let _ = event_tx.send(AppEvent::RequestFailed {
                            page: PageId::Workflow,
                            message: AppError::WorkflowAlreadyRunning.user_message(),
                        });
                    }
                    Some(cmd) => {
                        debug!(?cmd, "dispatch");
                        tasks.spawn(handle(ctx.clone(), event_tx.clone(), cmd));
                    }
                }
            }
            // An empty JoinSet resolves immediately; park this branch instead.
            Some(joined) = async {
                if tasks.is_empty() {
                    futures::future::pending().await
                } else {
                    tasks.join_next().await
                }
            } => {
                if let Err(e) = joined {
                    let _ = event_tx.send(AppEvent::Info(InfoEvent::Message(format!(
                        "Request task failed: {e}"
                    ))));
                }
            }
        }
    }

    tasks.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeApi;
    use crate::model::{ArtifactKind, MediaListing};
    use crate::orchestrator::StageStatus;
    use tokio::sync::mpsc::unbounded_channel;

    fn spawn_controller(
        api: FakeApi,
    ) -> (
        Arc<FakeApi>,
        HandoffStore,
        UnboundedSender<UiCommand>,
        UnboundedReceiver<AppEvent>,
        tokio::task::JoinHandle<Result<()>>,
    ) {
        let api = Arc::new(api);
        let handoff = HandoffStore::new();
        let ctx = ControllerCtx::new(api.clone(), handoff.clone(), None);
        let (cmd_tx, cmd_rx) = unbounded_channel();
        let (event_tx, event_rx) = unbounded_channel();
        let handle = tokio::spawn(run_controller(ctx, event_tx, cmd_rx));
        (api, handoff, cmd_tx, event_rx, handle)
    }

    /// Skip status chatter and return the next substantive event.
    async fn next_event(rx: &mut UnboundedReceiver<AppEvent>) -> AppEvent {
        loop {
            match rx.recv().await.expect("controller hung up") {
                AppEvent::Info(_) | AppEvent::StageStarted { .. } | AppEvent::StageFinished { .. } => {}
                ev => return ev,
            }
        }
    }

    #[tokio::test]
    async fn image_result_is_routed_to_image_page() {
        let (_api, _handoff, cmd_tx, mut rx, handle) = spawn_controller(FakeApi::default());

        cmd_tx
            .send(UiCommand::GenerateImage(ImageRequest::new("a red fox in snow", "1:1")))
            .unwrap();
        match next_event(&mut rx).await {
            AppEvent::ArtifactReady { page, artifact } => {
                assert_eq!(page, PageId::ImageGeneration);
                assert_eq!(artifact.filename(), "fox123.png");
            }
            other => panic!("unexpected event {other:?}"),
        }

        cmd_tx.send(UiCommand::Quit).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn failed_request_reports_server_message() {
        let (_api, _handoff, cmd_tx, mut rx, handle) = spawn_controller(FakeApi {
            fail_video: Some("quota exceeded".into()),
            ..Default::default()
        });

        cmd_tx
            .send(UiCommand::GenerateVideo(VideoRequest::new(None, "waves", 5)))
            .unwrap();
        match next_event(&mut rx).await {
            AppEvent::RequestFailed { page, message } => {
                assert_eq!(page, PageId::VideoGeneration);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("unexpected event {other:?}"),
        }

        drop(cmd_tx);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn workflow_completion_fills_handoff() {
        let (_api, handoff, cmd_tx, mut rx, handle) = spawn_controller(FakeApi::default());

        cmd_tx
            .send(UiCommand::StartWorkflow(WorkflowInput::new("fox", "fox runs")))
            .unwrap();
        match next_event(&mut rx).await {
            AppEvent::WorkflowCompleted { run } => {
                assert!(matches!(run.video, StageStatus::Succeeded(_)));
            }
            other => panic!("unexpected event {other:?}"),
        }
        // Post-processing reports each handoff after the completion event.
        let mut handed = Vec::new();
        while handed.len() < 2 {
            if let Some(AppEvent::Info(InfoEvent::HandedOff { kind, path })) = rx.recv().await {
                handed.push((kind, path));
            }
        }
        assert_eq!(
            handed,
            vec![
                (ArtifactKind::Image, "images/fox123.png".to_string()),
                (ArtifactKind::Video, "videos/fox_run.mp4".to_string()),
            ]
        );
        assert_eq!(
            handoff.peek(ArtifactKind::Video).as_deref(),
            Some("videos/fox_run.mp4")
        );

        cmd_tx.send(UiCommand::Quit).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn refresh_lists_media() {
        let media = MediaListing {
            images: vec!["a.png".into()],
            ..Default::default()
        };
        let (api, _handoff, cmd_tx, mut rx, handle) = spawn_controller(FakeApi {
            media: media.clone(),
            ..Default::default()
        });

        cmd_tx.send(UiCommand::RefreshMedia).unwrap();
        match next_event(&mut rx).await {
            AppEvent::MediaListed { media: listed } => assert_eq!(listed, media),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(*api.calls.lock().unwrap(), vec!["list"]);

        cmd_tx.send(UiCommand::Quit).unwrap();
        handle.await.unwrap().unwrap();
    }
}
