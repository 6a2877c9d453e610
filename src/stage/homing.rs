//! Homing coordinator.
//!
//! Homes the axes one after another in axis order. The first failure aborts
//! the run; the control loop never starts on a partially homed stage.

use super::error::{HomingError, StartupFailure};
use super::{Homed, Initialized, Stage, HOME_TIMEOUT};
use tracing::info;

impl Stage<Initialized> {
    pub async fn home_all(mut self) -> Result<Stage<Homed>, StartupFailure> {
        info!("Homing motors");

        let result = self.home_channels();
        match result {
            Ok(()) => {
                info!("Homing complete");
                Ok(self.transition())
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    fn home_channels(&mut self) -> Result<(), HomingError> {
        for channel in self.channels_mut() {
            let axis = channel.axis();
            info!("Homing {} (timeout {:?})", axis, HOME_TIMEOUT);
            channel
                .home(HOME_TIMEOUT)
                .map_err(|source| HomingError::AxisFailed { axis, source })?;
            info!("{} homed", axis);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::channel::HomeState;
    use crate::stage::testing::{serials, Call, RecordingService};
    use crate::stage::{Axis, Connected, StartupError};

    async fn initialized(service: &mut RecordingService) -> Stage<Initialized> {
        let stage: Stage<Connected> = match Stage::connect(service, &serials()).await {
            Ok(stage) => stage,
            Err(e) => panic!("connect failed: {}", e),
        };
        match stage.initialize("MAX683/M").await {
            Ok(stage) => stage,
            Err(e) => panic!("initialize failed: {}", e),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn homes_every_axis_in_order_with_full_timeout() {
        let mut service = RecordingService::default();
        let stage = initialized(&mut service).await.home_all().await.unwrap();

        assert!(stage
            .channels()
            .all(|c| c.status().homed == HomeState::Homed));

        let homes: Vec<Call> = service
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Home(..)))
            .collect();
        assert_eq!(
            homes,
            vec![
                Call::Home("70214254-1".into(), 60_000),
                Call::Home("70214254-2".into(), 60_000),
                Call::Home("70214254-3".into(), 60_000),
                Call::Home("70205184-1".into(), 60_000),
                Call::Home("70205184-2".into(), 60_000),
                Call::Home("70205184-3".into(), 60_000),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn single_failure_aborts_remaining_axes() {
        let mut service = RecordingService::default();
        service.behavior(|b| b.failing_home.push("70205184-1".into()));

        let failure = match initialized(&mut service).await.home_all().await {
            Ok(_) => panic!("homing should fail"),
            Err(failure) => failure,
        };
        assert!(matches!(
            failure.error,
            StartupError::Homing(HomingError::AxisFailed { axis: Axis::Roll, .. })
        ));
        // X, Y, Z and the failed Roll attempt
        assert_eq!(service.count(|c| matches!(c, Call::Home(..))), 4);
        assert_eq!(service.count(|c| matches!(c, Call::Disconnect(_))), 2);
        assert_eq!(failure.shutdown.channels_stopped, 6);
    }
}
