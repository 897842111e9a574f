//! Outcome annotation while the deployer executes a release

use crate::document::ErrorRecord;
use crate::error::OutcomeError;
use crate::models::Release;

impl Release {
    /// A release is terminal once success or failure has been recorded
    pub fn is_terminal(&self) -> bool {
        self.success.is_some()
    }

    fn ensure_open(&self) -> Result<(), OutcomeError> {
        match self.success {
            Some(success) => Err(OutcomeError::AlreadyTerminal(success)),
            None => Ok(()),
        }
    }

    pub fn mark_healthy(&mut self, healthy: bool) -> Result<(), OutcomeError> {
        self.ensure_open()?;
        self.healthy = Some(healthy);
        Ok(())
    }

    /// Record the failure and finish the release
    pub fn record_error(
        &mut self,
        error: impl Into<String>,
        cause: Option<String>,
    ) -> Result<(), OutcomeError> {
        self.ensure_open()?;
        self.error = Some(ErrorRecord {
            error: Some(error.into()),
            cause,
        });
        self.success = Some(false);
        Ok(())
    }

    pub fn mark_success(&mut self) -> Result<(), OutcomeError> {
        self.ensure_open()?;
        self.healthy = Some(true);
        self.success = Some(true);
        Ok(())
    }
}
