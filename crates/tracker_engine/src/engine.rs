use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use tokio::runtime::Runtime;
use tracker_core::{JobHandle, PollIntervals};
use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::fetch_loop::LoopHandle;
use crate::job_poller::spawn_job_poller;
use crate::live_poller::spawn_list_poller;
use crate::sink::ChannelEventSink;
use crate::{EngineEvent, EventSink, PipelineApi, UploadRequest, ViewId};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start engine: {0}")]
    Start(#[from] std::io::Error),
    #[error("engine thread has stopped")]
    Stopped,
}

enum EngineCommand {
    Submit { upload: UploadRequest },
    MountJob { view: ViewId, handle: JobHandle },
    MountList { view: ViewId },
    Unmount { view: ViewId },
}

/// Runs the pollers on a dedicated runtime thread.
///
/// Every mounted view owns exactly one poller session; unmounting the view (or
/// dropping the handle) cancels it.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    next_view: AtomicU64,
}

impl EngineHandle {
    pub fn new(api: Arc<dyn PipelineApi>, intervals: PollIntervals) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));

        thread::Builder::new()
            .name("tracker-engine".to_string())
            .spawn(move || {
                let mut mounted: HashMap<ViewId, LoopHandle> = HashMap::new();
                while let Ok(command) = cmd_rx.recv() {
                    mounted.retain(|_, session| !session.is_finished());
                    handle_command(&runtime, &api, intervals, &sink, &mut mounted, command);
                }
                tracker_debug!("engine shutting down, {} sessions mounted", mounted.len());
            })?;

        Ok(Self {
            cmd_tx,
            event_rx,
            next_view: AtomicU64::new(1),
        })
    }

    pub fn submit(&self, upload: UploadRequest) -> Result<(), EngineError> {
        self.send(EngineCommand::Submit { upload })
    }

    pub fn mount_job(&self, handle: JobHandle) -> Result<ViewId, EngineError> {
        let view = self.allocate_view();
        self.send(EngineCommand::MountJob { view, handle })?;
        Ok(view)
    }

    pub fn mount_list(&self) -> Result<ViewId, EngineError> {
        let view = self.allocate_view();
        self.send(EngineCommand::MountList { view })?;
        Ok(view)
    }

    pub fn unmount(&self, view: ViewId) -> Result<(), EngineError> {
        self.send(EngineCommand::Unmount { view })
    }

    /// `Ok(None)` when no event is pending; `Err(Stopped)` once the engine thread is gone.
    pub fn try_recv(&self) -> Result<Option<EngineEvent>, EngineError> {
        match self.event_rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(EngineError::Stopped),
        }
    }

    /// `Ok(None)` when `timeout` elapsed without an event.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineError> {
        next_event(&self.event_rx, timeout)
    }

    fn allocate_view(&self) -> ViewId {
        self.next_view.fetch_add(1, Ordering::Relaxed)
    }

    fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.cmd_tx.send(command).map_err(|_| EngineError::Stopped)
    }
}

fn next_event(
    event_rx: &mpsc::Receiver<EngineEvent>,
    timeout: Duration,
) -> Result<Option<EngineEvent>, EngineError> {
    match event_rx.recv_timeout(timeout) {
        Ok(event) => Ok(Some(event)),
        Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineError::Stopped),
    }
}

fn handle_command(
    runtime: &Runtime,
    api: &Arc<dyn PipelineApi>,
    intervals: PollIntervals,
    sink: &Arc<dyn EventSink>,
    mounted: &mut HashMap<ViewId, LoopHandle>,
    command: EngineCommand,
) {
    let _enter = runtime.enter();
    match command {
        EngineCommand::Submit { upload } => {
            let api = api.clone();
            let sink = sink.clone();
            runtime.spawn(async move {
                let file_name = upload.file_name.clone();
                match api.upload(upload).await {
                    Ok(receipt) => {
                        tracker_info!("uploaded {} as {}", file_name, receipt.doc_id);
                        sink.emit(EngineEvent::Submitted {
                            doc_id: receipt.doc_id,
                            file_name,
                        });
                    }
                    Err(error) => {
                        tracker_warn!("upload of {} failed: {}", file_name, error);
                        sink.emit(EngineEvent::SubmitFailed { file_name, error });
                    }
                }
            });
        }
        EngineCommand::MountJob { view, handle } => {
            let session = spawn_job_poller(view, api.clone(), handle, intervals, sink.clone());
            mounted.insert(view, session);
        }
        EngineCommand::MountList { view } => {
            let session = spawn_list_poller(view, api.clone(), intervals.list, sink.clone());
            mounted.insert(view, session);
        }
        EngineCommand::Unmount { view } => {
            if let Some(session) = mounted.remove(&view) {
                session.cancel();
                tracker_debug!("view {} unmounted", view);
            }
        }
    }
}
