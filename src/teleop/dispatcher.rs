//! Motion dispatcher: issues one tick's requests against the homed stage.

use crate::mapping::MotionRequest;
use crate::stage::{Homed, MoveError, Stage};
use std::time::Duration;
use tracing::warn;

pub struct MotionDispatcher {
    command_timeout: Duration,
}

impl MotionDispatcher {
    pub fn new(command_timeout: Duration) -> Self {
        Self { command_timeout }
    }

    pub fn dispatch(
        &self,
        stage: &mut Stage<Homed>,
        request: MotionRequest,
    ) -> Result<(), MoveError> {
        stage.move_relative(&request.with_timeout(self.command_timeout))
    }

    /// Dispatches every request in order. Failures are logged and skipped.
    ///
    /// Returns `(dispatched, failed)`.
    pub fn dispatch_all(
        &self,
        stage: &mut Stage<Homed>,
        requests: Vec<MotionRequest>,
    ) -> (u64, u64) {
        let mut dispatched = 0;
        let mut failed = 0;
        for request in requests {
            match self.dispatch(stage, request) {
                Ok(()) => dispatched += 1,
                Err(e) => {
                    warn!("Move failed, continuing: {}", e);
                    failed += 1;
                }
            }
        }
        (dispatched, failed)
    }
}
