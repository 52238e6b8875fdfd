use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Identifier attached to every log line of one batch run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Creates a new random run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Creates the span a batch run executes in
pub fn make_span_with_run_id(run_id: &RunId) -> tracing::Span {
    tracing::info_span!("batch_run", run_id = %run_id)
}

/// Installs the global tracing subscriber
///
/// Honors `RUST_LOG`, falling back to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
