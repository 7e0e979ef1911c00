//! Background rescan as a periodic taskvisor controller task.
//!
//! Restart policy `Always` with `success_delay` equal to the rescan interval
//! turns one pass into a fixed-interval loop. The controller slot admits one
//! run at a time, so passes never overlap.
use std::{sync::Arc, time::Duration};

use reflector_model::ReflectorConfig;
use taskvisor::{
    BackoffPolicy, ControllerSpec, JitterPolicy, RestartPolicy, TaskError, TaskFn, TaskRef,
    TaskSpec,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Rescan;
use crate::error::{CoreError, ReflectError};

/// Name of the rescan task and its controller slot.
pub const RESCAN_TASK_NAME: &str = "reflector-background-rescan";

/// Build the controller spec running `rescan` every `interval`.
pub fn rescan_controller(rescan: Arc<Rescan>, interval: Duration) -> ControllerSpec {
    let task: TaskRef = TaskFn::arc(RESCAN_TASK_NAME, move |ctx: CancellationToken| {
        let rescan = Arc::clone(&rescan);
        async move {
            match rescan.run_pass(&ctx).await {
                Ok(report) => {
                    debug!(?report, "rescan pass done");
                    Ok(())
                }
                Err(ReflectError::Canceled) => Err(TaskError::Canceled),
                Err(e @ ReflectError::InvalidSelector(_)) => Err(TaskError::Fatal {
                    reason: format!("background rescan disabled: {e}"),
                }),
                Err(e) => Err(TaskError::Fail {
                    reason: format!("background rescan failed: {e}"),
                }),
            }
        }
    });

    let backoff = BackoffPolicy {
        success_delay: Some(interval),
        jitter: JitterPolicy::None,
        factor: 1.0,

        first: interval,
        max: interval,
    };
    ControllerSpec::replace(TaskSpec::new(task, RestartPolicy::Always, backoff, None))
}

/// Controller spec for the configured interval, `None` when the rescan is disabled.
///
/// The global selector is parsed up front so a malformed value fails startup
/// instead of the first pass.
pub fn rescan_spec(
    rescan: Arc<Rescan>,
    cfg: &ReflectorConfig,
) -> Result<Option<ControllerSpec>, CoreError> {
    let Some(interval) = cfg.rescan_interval() else {
        return Ok(None);
    };
    cfg.parent_selector()?;
    Ok(Some(rescan_controller(rescan, interval)))
}
