//! Tracker engine: REST client, scheduled fetch loop and the two pollers.
mod api;
mod engine;
mod fetch_loop;
mod job_poller;
mod live_poller;
mod sink;
mod types;

pub use api::{ClientSettings, PipelineApi, ReqwestApi, UploadRequest};
pub use engine::{EngineError, EngineHandle};
pub use fetch_loop::{spawn_loop, LoopHandle, Next, Outcome, Tick};
pub use job_poller::spawn_job_poller;
pub use live_poller::spawn_list_poller;
pub use sink::{ChannelEventSink, EventSink};
pub use types::{ApiError, EngineEvent, FailureKind, ViewId};
