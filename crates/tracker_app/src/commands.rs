use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use chrono::Local;
use clap::ArgMatches;
use tracker_core::{JobHandle, ListView};
use tracker_engine::{EngineEvent, EngineHandle, ReqwestApi, UploadRequest, ViewId};
use tracker_logging::{tracker_info, tracker_warn};

use crate::config::AppConfig;
use crate::render;

const EVENT_WAIT: Duration = Duration::from_millis(250);

pub fn run_command(matches: &ArgMatches, config: &AppConfig) -> anyhow::Result<()> {
    let api = ReqwestApi::new(config.client_settings())
        .with_context(|| format!("invalid base url {:?}", config.base_url))?;
    tracker_info!(
        "Using backend at {} (request timeout {:?})",
        api.settings().base_url,
        api.settings().request_timeout
    );
    let engine = EngineHandle::new(Arc::new(api), config.intervals()?)?;

    match matches.subcommand() {
        Some(("upload", sub)) => {
            let path = sub
                .get_one::<std::path::PathBuf>("file")
                .ok_or_else(|| anyhow!("missing file"))?;
            let handle = upload(&engine, path)?;
            track(&engine, handle)
        }
        Some(("track", sub)) => {
            let doc_id = sub
                .get_one::<String>("doc-id")
                .ok_or_else(|| anyhow!("missing document id"))?;
            track(&engine, JobHandle::new(doc_id.as_str()))
        }
        Some(("dashboard", sub)) => dashboard(&engine, sub.get_one::<u64>("refreshes").copied()),
        _ => bail!("unknown command"),
    }
}

fn upload(engine: &EngineHandle, path: &Path) -> anyhow::Result<JobHandle> {
    let payload = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} is not a file", path.display()))?;

    engine.submit(UploadRequest {
        content_type: content_type_for(path).map(str::to_string),
        file_name: file_name.clone(),
        payload,
    })?;
    println!("Uploading {file_name}...");

    loop {
        match engine.recv_timeout(EVENT_WAIT)? {
            Some(EngineEvent::Submitted { doc_id, file_name }) => {
                println!("{file_name} accepted as {doc_id}");
                return Ok(doc_id);
            }
            Some(EngineEvent::SubmitFailed { file_name, error }) => {
                bail!("upload of {file_name} failed: {error}");
            }
            _ => {}
        }
    }
}

fn track(engine: &EngineHandle, handle: JobHandle) -> anyhow::Result<()> {
    let view = engine.mount_job(handle)?;

    loop {
        let Some(event) = engine.recv_timeout(EVENT_WAIT)? else {
            continue;
        };
        match event {
            EngineEvent::JobUpdated { view: v, job } if v == view => {
                println!("{}", render::job_line(&job));
            }
            EngineEvent::JobFinalized { view: v, job, result } if v == view => {
                println!("{}", render::result_summary(&result));
                for line in render::warnings(&job.warnings) {
                    println!("{line}");
                }
                return Ok(());
            }
            EngineEvent::JobFailed { view: v, error, .. } if v == view => {
                bail!("{}", render::failure(&error));
            }
            _ => {}
        }
    }
}

fn dashboard(engine: &EngineHandle, refreshes: Option<u64>) -> anyhow::Result<()> {
    let view = engine.mount_list()?;
    let mut shown: u64 = 0;

    loop {
        let Some(event) = engine.recv_timeout(EVENT_WAIT)? else {
            continue;
        };
        match event {
            EngineEvent::ListRefreshed { view: v, snapshot } if v == view => {
                println!("{}", render::list(&ListView::from_snapshot(&snapshot), Local::now()));
                shown += 1;
                if refreshes.is_some_and(|limit| shown >= limit) {
                    unmount(engine, view);
                    return Ok(());
                }
            }
            EngineEvent::ListRefreshSkipped { view: v, list, reason } if v == view => {
                eprintln!("{}", render::refresh_skipped(&list, &reason));
            }
            _ => {}
        }
    }
}

fn unmount(engine: &EngineHandle, view: ViewId) {
    if let Err(err) = engine.unmount(view) {
        tracker_warn!("Failed to unmount view {}: {}", view, err);
    }
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}
