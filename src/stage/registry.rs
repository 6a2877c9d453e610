//! Axis registry: controller discovery, connection and axis binding.

use super::error::{ConnectionError, StartupFailure};
use super::{
    shutdown, Axis, Connected, Controller, Stage, CHANNELS_PER_CONTROLLER, CONNECT_SETTLE,
    CONTROLLER_COUNT,
};
use crate::hardware::MotionControllerService;
use tokio::time::sleep;
use tracing::{error, info};

impl Stage<Connected> {
    /// Connects the two controllers and binds their channels to axes.
    ///
    /// The first serial drives X, Y, Z and the second Roll, Pitch, Yaw. There is
    /// no retry; controllers connected before a failure are disconnected again.
    pub async fn connect(
        service: &mut dyn MotionControllerService,
        serials: &[String; CONTROLLER_COUNT],
    ) -> Result<Self, StartupFailure> {
        let mut controllers = Vec::with_capacity(CONTROLLER_COUNT);

        match connect_controllers(service, serials, &mut controllers).await {
            Ok(()) => {
                info!(
                    "Connected {} controllers with {} channels",
                    controllers.len(),
                    controllers.iter().map(|c| c.channels().len()).sum::<usize>()
                );
                Ok(Self::new(controllers))
            }
            Err(e) => {
                error!("Stage connection failed: {}", e);
                Err(StartupFailure {
                    error: e.into(),
                    shutdown: shutdown::run(controllers),
                })
            }
        }
    }
}

async fn connect_controllers(
    service: &mut dyn MotionControllerService,
    serials: &[String; CONTROLLER_COUNT],
    controllers: &mut Vec<Controller>,
) -> Result<(), ConnectionError> {
    info!("Building device list");
    service
        .build_device_list()
        .map_err(ConnectionError::DeviceList)?;

    for serial in serials {
        info!("Connecting controller {}", serial);
        let device = service
            .connect(serial)
            .map_err(|source| ConnectionError::Connect {
                serial: serial.clone(),
                source,
            })?;
        controllers.push(Controller::new(device));
        sleep(CONNECT_SETTLE).await;
    }

    for (slot, controller) in controllers.iter_mut().enumerate() {
        let axes = Axis::on_controller(slot).iter().copied();
        for (axis, index) in axes.zip(1..=CHANNELS_PER_CONTROLLER) {
            controller
                .bind_channel(axis, index)
                .map_err(|source| ConnectionError::Channel {
                    serial: controller.serial().to_string(),
                    index,
                    source,
                })?;
            info!("Bound {} to {} channel {}", axis, controller.serial(), index);
        }
    }

    Ok(())
}
