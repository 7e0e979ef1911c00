//! High-level API over taskvisor `Supervisor` used by the reflector.
//! - Owns a `Supervisor` instance.
//! - Submits controller specs (the background rescan) via the controller.
use std::sync::Arc;

use taskvisor::{Config as SupervisorConfig, ControllerConfig, ControllerSpec, Subscribe, Supervisor};
use tracing::{debug, error, info, instrument};

use crate::{
    error::CoreError,
    rescan::{RESCAN_TASK_NAME, Rescan, rescan_spec},
};

/// Thin wrapper around taskvisor [`Supervisor`].
pub struct SupervisorApi {
    sup: Arc<Supervisor>,
}

impl SupervisorApi {
    /// Create a supervisor with explicit configs and start its run loop in background.
    ///
    /// `sup_cfg`: supervisor settings
    /// `ctrl_cfg`: controller settings
    /// `subscribers`: event subscribers
    pub async fn new(
        sup_cfg: SupervisorConfig,
        ctrl_cfg: ControllerConfig,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Result<Self, CoreError> {
        let sup = Supervisor::builder(sup_cfg)
            .with_subscribers(subscribers)
            .with_controller(ctrl_cfg)
            .build();

        let runner = Arc::clone(&sup);
        tokio::spawn(async move {
            if let Err(e) = runner.run(Vec::new()).await {
                error!(error = %e, "supervisor run loop exited with error");
            }
        });
        sup.wait_ready().await;
        info!("supervisor is ready to accept tasks");
        Ok(Self { sup })
    }

    /// Submit a controller spec to the supervisor.
    pub async fn submit(&self, spec: ControllerSpec) -> Result<(), CoreError> {
        debug!("submitting via controller");
        self.sup
            .submit(spec)
            .await
            .map_err(|e| CoreError::Supervisor(e.to_string()))
    }

    /// Start the background rescan if `rescan`'s configuration enables it.
    ///
    /// Returns `false` when the interval is zero and nothing was submitted.
    /// A malformed global selector is reported as [`CoreError::Config`].
    #[instrument(level = "debug", skip_all, fields(task = RESCAN_TASK_NAME))]
    pub async fn start_rescan(&self, rescan: Arc<Rescan>) -> Result<bool, CoreError> {
        let cfg = rescan.config().clone();
        match rescan_spec(rescan, &cfg)? {
            Some(spec) => {
                self.submit(spec).await?;
                info!(interval = ?cfg.background_interval, "background rescan started");
                Ok(true)
            }
            None => {
                info!("background rescan disabled");
                Ok(false)
            }
        }
    }
}
