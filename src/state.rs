use std::sync::Arc;

use crate::auth::TokenAuthority;
use crate::config::AppConfig;
use crate::fileops::FileOps;
use crate::metrics::Metrics;

/// The shared application state.
///
/// Built once at startup and cloned into every handler. Everything in it is
/// either immutable or internally synchronized, so requests never share
/// mutable state.
#[derive(Clone)]
pub struct AppState {
    /// The application configuration, validated before the server starts.
    pub config: Arc<AppConfig>,
    /// The rename/move batch engine, configured with block size and thread count.
    pub files: Arc<FileOps>,
    /// Token signer/verifier. `None` when no `[auth]` section is configured,
    /// in which case the `/files` endpoints are open.
    pub auth: Option<Arc<TokenAuthority>>,
    /// Operation counters.
    pub metrics: Metrics,
}

impl AppState {
    /// Creates the state from a validated configuration.
    ///
    /// Fails when the configured signing keys cannot be loaded.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let auth = config
            .auth
            .as_ref()
            .map(TokenAuthority::from_config)
            .transpose()?
            .map(Arc::new);
        let files = Arc::new(FileOps::from_config(&config.files));

        Ok(Self { config: Arc::new(config), files, auth, metrics: Metrics::new() })
    }
}
