use std::path::PathBuf;
use std::sync::Arc;

use tempmail_apiok::{ApiOkAdapter, ApiOkConfig};
use tempmail_domain::TempMailPort;
use tempmail_error::MailError;
use tempmail_messaging::MailService;
use tempmail_session::{SessionStore, STATE_FILE_NAME};
use tracing::info;

pub struct PluginConfig {
    /// `None` runs the plugin unconfigured: help only.
    pub api: Option<ApiOkConfig>,
    pub data_dir: PathBuf,
}

/// Plugin lifecycle: load state on init, flush and clear on shutdown.
pub struct TempMailPlugin {
    service: Arc<MailService>,
}

impl TempMailPlugin {
    pub async fn init(config: PluginConfig) -> Result<Self, MailError> {
        let state_path = config.data_dir.join(STATE_FILE_NAME);
        let store = Arc::new(SessionStore::open(&state_path).await);
        info!(path = %state_path.display(), "session store opened");

        let port: Option<Arc<dyn TempMailPort>> = match config.api {
            Some(api) => Some(Arc::new(ApiOkAdapter::new(api)?)),
            None => None,
        };

        Ok(Self {
            service: Arc::new(MailService::new(port, store)),
        })
    }

    pub fn service(&self) -> &Arc<MailService> {
        &self.service
    }

    pub async fn shutdown(&self) {
        self.service.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_reloads_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("state");

        let plugin = TempMailPlugin::init(PluginConfig {
            api: Some(ApiOkConfig::new("k")),
            data_dir: data_dir.clone(),
        })
        .await
        .unwrap();
        assert!(plugin.service().is_configured());
        plugin
            .service()
            .store()
            .set_cached_message_ids("u1", vec!["m1".into()])
            .await;
        plugin.shutdown().await;

        let again = TempMailPlugin::init(PluginConfig {
            api: None,
            data_dir: data_dir.clone(),
        })
        .await
        .unwrap();
        assert!(!again.service().is_configured());
        assert_eq!(
            again.service().store().get_cached_message_ids("u1").await,
            Some(vec!["m1".to_string()])
        );
        assert!(data_dir.join(STATE_FILE_NAME).exists());
    }
}
