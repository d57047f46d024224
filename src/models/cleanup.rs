use serde::{Deserialize, Serialize};

/// Aggregate outcome of one cleanup sweep
///
/// Partial failures are reported here rather than as an error so the caller
/// can log or alert on `failed > 0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Object paths (or raw queue members when undecodable) that were not cleaned
    pub failed_paths: Vec<String>,
}

impl CleanResult {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure<S: Into<String>>(&mut self, path: S) {
        self.failed += 1;
        self.failed_paths.push(path.into());
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
