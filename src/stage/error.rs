//! Error taxonomy for stage bring-up, motion and teardown.
//!
//! Connection, initialization and homing errors are fatal and surface as a
//! [`StartupFailure`] after the partial stage has been shut down. Move errors
//! are reported per tick and never stop the control loop. Shutdown errors are
//! only collected into the [`ShutdownReport`].

use super::axis::Axis;
use super::shutdown::ShutdownReport;
use crate::hardware::ServiceError;
use thiserror::Error;

/// Lifecycle violation or device error on a single channel
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("{operation} on {axis} requires {requirement}")]
    OutOfOrder {
        axis: Axis,
        operation: &'static str,
        requirement: &'static str,
    },

    #[error("{axis}: {source}")]
    Service {
        axis: Axis,
        #[source]
        source: ServiceError,
    },
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to build device list: {0}")]
    DeviceList(#[source] ServiceError),

    #[error("Failed to connect controller {serial}: {source}")]
    Connect {
        serial: String,
        #[source]
        source: ServiceError,
    },

    #[error("Failed to open channel {index} on controller {serial}: {source}")]
    Channel {
        serial: String,
        index: u8,
        #[source]
        source: ServiceError,
    },
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("Settings of {0} were not initialized in time")]
    SettingsTimeout(Axis),

    #[error("Failed to start polling: {0}")]
    Polling(#[source] ChannelError),

    #[error("Failed to enable channel: {0}")]
    Enable(#[source] ChannelError),

    #[error("Failed to load motor configuration: {0}")]
    Configuration(#[source] ChannelError),
}

#[derive(Debug, Error)]
pub enum HomingError {
    #[error("Homing failed on {axis}: {source}")]
    AxisFailed {
        axis: Axis,
        #[source]
        source: ChannelError,
    },
}

#[derive(Debug, Error)]
pub enum MoveError {
    #[error("{0} has not been homed")]
    NotHomed(Axis),

    #[error("{0} is not bound to a channel")]
    Unbound(Axis),

    #[error("Relative move on {axis} failed: {source}")]
    Rejected {
        axis: Axis,
        #[source]
        source: ServiceError,
    },
}

#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("Failed to stop polling on {axis}: {source}")]
    StopPolling {
        axis: Axis,
        #[source]
        source: ServiceError,
    },

    #[error("Failed to disconnect controller {serial}: {source}")]
    Disconnect {
        serial: String,
        #[source]
        source: ServiceError,
    },
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Initialization error: {0}")]
    Init(#[from] InitError),

    #[error("Homing error: {0}")]
    Homing(#[from] HomingError),
}

/// Fatal startup error together with the cleanup that already ran
#[derive(Debug, Error)]
#[error("{error}")]
pub struct StartupFailure {
    #[source]
    pub error: StartupError,
    pub shutdown: ShutdownReport,
}
