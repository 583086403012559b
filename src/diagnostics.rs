use tracing::{error, info, warn};

/// Passive collector for errors and warnings raised during parsing and
/// evaluation. Nothing is dropped; everything is flushed by [`report`].
///
/// [`report`]: DiagnosticService::report
#[derive(Debug, Default)]
pub struct DiagnosticService {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl DiagnosticService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Flushes everything collected so far through the log.
    pub fn report(&self) {
        info!("=== Execution Report ===");
        if self.errors.is_empty() && self.warnings.is_empty() {
            info!("Status: Success - No issues detected");
        } else {
            if !self.errors.is_empty() {
                error!("Errors found:");
                for e in &self.errors {
                    error!("- {e}");
                }
            }
            if !self.warnings.is_empty() {
                warn!("Warnings found:");
                for w in &self.warnings {
                    warn!("- {w}");
                }
            }
        }
        info!("=====================");
    }
}
