use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::OnceCell;
use tracker_authz::HandlerSet;
use tracker_policy_center::{load_policy, PolicySnapshot};

use crate::app_context::{build_handler_set, create_context, AppContext};
use crate::config::Config;

pub struct CliContext {
    config: Arc<Config>,
    config_path: PathBuf,
    app_context: OnceCell<Arc<AppContext>>,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            app_context: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn handler_set(&self) -> Result<HandlerSet> {
        build_handler_set(self.config.wiring_path.as_ref()).context("Failed to build handler set")
    }

    pub fn policy(&self) -> Result<PolicySnapshot> {
        load_policy(&self.config.policy_paths).context("Failed to load policy snapshot")
    }

    pub async fn app_context(&self) -> Result<Arc<AppContext>> {
        self.app_context
            .get_or_try_init(|| async {
                create_context(self.config.as_ref().clone())
                    .await
                    .map(Arc::new)
                    .context("Failed to create application context")
            })
            .await
            .map(Arc::clone)
    }
}
