use std::{path::PathBuf, time::Duration};

/// Startup-scoped runtime configuration shared by every request.
///
/// The pac binary location is resolved once here and injected into each
/// command invocation instead of rewriting the process PATH per request.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub pac_bin: String,
    pub work_dir: PathBuf,
    pub pac_timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(pac_bin: String, work_dir: PathBuf, pac_timeout: Duration) -> Self {
        Self {
            pac_bin,
            work_dir,
            pac_timeout,
        }
    }
}
