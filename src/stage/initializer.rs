//! Channel initializer.
//!
//! Brings each channel up in axis order, one channel at a time:
//! settings initialized → polling → enable → motor configuration.

use super::error::{InitError, StartupFailure};
use super::{
    AxisChannel, Connected, Deadline, Initialized, Stage, ENABLE_SETTLE, POLLING_INTERVAL,
    POLLING_SETTLE, SETTINGS_INIT_TIMEOUT, SETTINGS_RECHECK, SETTINGS_WAIT_SLICE,
};
use tokio::time::sleep;
use tracing::{debug, info, warn};

impl Stage<Connected> {
    /// Initializes every channel and transitions to `Initialized`.
    ///
    /// `stage_model` prefixes the settings profile name, e.g. `MAX683/M` gives
    /// `MAX683/M/<device id>`.
    pub async fn initialize(
        mut self,
        stage_model: &str,
    ) -> Result<Stage<Initialized>, StartupFailure> {
        info!("Initializing stage channels");

        let result = self.initialize_channels(stage_model).await;
        match result {
            Ok(()) => {
                info!("All channels initialized");
                Ok(self.transition())
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    async fn initialize_channels(&mut self, stage_model: &str) -> Result<(), InitError> {
        for channel in self.channels_mut() {
            initialize_channel(channel, stage_model).await?;
        }
        Ok(())
    }
}

async fn initialize_channel(channel: &mut AxisChannel, stage_model: &str) -> Result<(), InitError> {
    wait_for_settings(channel).await?;

    channel
        .start_polling(POLLING_INTERVAL)
        .map_err(InitError::Polling)?;
    sleep(POLLING_SETTLE).await;

    channel.enable().map_err(InitError::Enable)?;
    sleep(ENABLE_SETTLE).await;

    info!(
        "{} ({} channel {}): {}",
        channel.axis(),
        channel.device_serial(),
        channel.index(),
        channel.description()
    );

    let settings_name = channel
        .configure(stage_model)
        .map_err(InitError::Configuration)?;
    debug!("{} configured as {}", channel.axis(), settings_name);
    Ok(())
}

async fn wait_for_settings(channel: &mut AxisChannel) -> Result<(), InitError> {
    let deadline = Deadline::after(SETTINGS_INIT_TIMEOUT);

    while !channel.refresh_settings_initialized() {
        if deadline.expired() {
            warn!(
                "{} settings not initialized after {:?}",
                channel.axis(),
                SETTINGS_INIT_TIMEOUT
            );
            return Err(InitError::SettingsTimeout(channel.axis()));
        }
        channel.wait_settings_initialized(deadline.slice(SETTINGS_WAIT_SLICE));
        sleep(SETTINGS_RECHECK).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::channel::{EnableState, PollingState};
    use crate::stage::testing::{serials, Call, RecordingService};
    use crate::stage::{Axis, StartupError};

    async fn connected(service: &mut RecordingService) -> Stage<Connected> {
        match Stage::connect(service, &serials()).await {
            Ok(stage) => stage,
            Err(e) => panic!("connect failed: {}", e),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn brings_channels_up_in_order() {
        let mut service = RecordingService::default();
        let stage = connected(&mut service).await;
        let stage = stage.initialize("MAX683/M").await.unwrap();

        for channel in stage.channels() {
            let status = channel.status();
            assert!(status.settings_initialized);
            assert_eq!(status.polling, PollingState::Polling);
            assert_eq!(status.enabled, EnableState::Enabled);
        }

        let x_calls: Vec<Call> = service
            .calls()
            .into_iter()
            .filter(|c| c.device_id() == Some("70214254-1"))
            .collect();
        assert_eq!(
            x_calls,
            vec![
                Call::WaitSettings("70214254-1".into()),
                Call::StartPolling("70214254-1".into(), 250),
                Call::Enable("70214254-1".into()),
                Call::LoadConfiguration("70214254-1".into()),
                Call::ApplySettings("70214254-1".into(), "MAX683/M/70214254-1".into()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn channels_are_processed_sequentially() {
        let mut service = RecordingService::default();
        let stage = connected(&mut service).await;
        stage.initialize("MAX683/M").await.unwrap();

        let applied: Vec<String> = service
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::ApplySettings(id, _) => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(
            applied,
            vec!["70214254-1", "70214254-2", "70214254-3", "70205184-1", "70205184-2", "70205184-3"]
        );

        // Y only starts once X is fully configured
        let calls = service.calls();
        let x_applied = calls
            .iter()
            .position(|c| matches!(c, Call::ApplySettings(id, _) if id == "70214254-1"))
            .unwrap();
        let y_waits = calls
            .iter()
            .position(|c| c.device_id() == Some("70214254-2") && !matches!(c, Call::Channel(..)))
            .unwrap();
        assert!(x_applied < y_waits);
    }

    #[tokio::test(start_paused = true)]
    async fn never_polls_before_settings_are_initialized() {
        let mut service = RecordingService::default();
        service.behavior(|b| b.uninitialized.push("70205184-2".into()));
        let stage = connected(&mut service).await;

        let started = tokio::time::Instant::now();
        let failure = match stage.initialize("MAX683/M").await {
            Ok(_) => panic!("initialize should fail"),
            Err(failure) => failure,
        };
        assert!(started.elapsed() >= SETTINGS_INIT_TIMEOUT);
        assert!(matches!(
            failure.error,
            StartupError::Init(InitError::SettingsTimeout(Axis::Pitch))
        ));
        assert_eq!(
            service.count(|c| matches!(c, Call::StartPolling(id, _) if id == "70205184-2")),
            0
        );
        assert_eq!(
            service.count(|c| matches!(c, Call::Enable(id) if id == "70205184-2")),
            0
        );
        // Yaw was never reached
        assert_eq!(
            service.count(|c| c.device_id() == Some("70205184-3") && !matches!(c, Call::Channel(..) | Call::StopPolling(_))),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failure_shuts_down_partial_stage() {
        let mut service = RecordingService::default();
        service.behavior(|b| b.uninitialized.push("70214254-3".into()));
        let stage = connected(&mut service).await;

        let failure = match stage.initialize("MAX683/M").await {
            Ok(_) => panic!("initialize should fail"),
            Err(failure) => failure,
        };
        assert_eq!(failure.shutdown.channels_stopped, 6);
        assert_eq!(failure.shutdown.controllers_disconnected, 2);
        assert_eq!(service.count(|c| matches!(c, Call::Disconnect(_))), 2);
        assert_eq!(service.count(|c| matches!(c, Call::Home(..))), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn enable_failure_is_reported_per_axis() {
        let mut service = RecordingService::default();
        service.behavior(|b| b.failing_enable.push("70214254-2".into()));
        let stage = connected(&mut service).await;

        let failure = match stage.initialize("MAX683/M").await {
            Ok(_) => panic!("initialize should fail"),
            Err(failure) => failure,
        };
        match failure.error {
            StartupError::Init(InitError::Enable(e)) => {
                assert!(e.to_string().starts_with("Y:"), "{}", e)
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
