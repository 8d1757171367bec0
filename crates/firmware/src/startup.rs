//! Expander bring-up.

use embassy_sync::blocking_mutex::raw::RawMutex;
use platform::{BusController, GpioExpander};

use crate::config::OUTPUT_PRESET;

/// Initialize the expander and preset its output port.
///
/// Returns whether playback should be enabled. A failed initialize disables
/// it for the life of the process; a failed preset is only logged.
pub async fn bring_up<M: RawMutex, C: BusController>(expander: &GpioExpander<'_, M, C>) -> bool {
    if let Err(e) = expander.initialize().await {
        error!("startup: expander unavailable, playback disabled: {}", e);
        return false;
    }
    let output = expander.config().output_port.data();
    if let Err(e) = expander.write_register(output, OUTPUT_PRESET).await {
        warn!("startup: output preset failed: {}", e);
    }
    info!("startup: expander ready");
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_time::Duration;
    use platform::mocks::MockI2c;
    use platform::{DeviceState, Register, SharedI2cBus};

    use super::*;
    use crate::config::expander_config;

    #[tokio::test]
    async fn test_bring_up_presets_output_port() {
        let mock = MockI2c::default();
        let bus: SharedI2cBus<NoopRawMutex, _> = SharedI2cBus::new(mock.clone());
        let expander = GpioExpander::new(&bus, expander_config().with_settle(Duration::from_ticks(0)));

        assert!(bring_up(&expander).await);
        assert_eq!(expander.state(), DeviceState::Initialized);
        assert_eq!(mock.register(Register::Gp1), 0xFF);
        assert_eq!(mock.writes().last(), Some(&(Register::Gp1.addr(), 0xFF)));
    }

    #[tokio::test]
    async fn test_bring_up_fails_without_device() {
        let mock = MockI2c::new(0x21);
        let bus: SharedI2cBus<NoopRawMutex, _> = SharedI2cBus::new(mock.clone());
        let expander = GpioExpander::new(&bus, expander_config());

        assert!(!bring_up(&expander).await);
        assert_eq!(expander.state(), DeviceState::Uninitialized);
        assert!(mock.writes().is_empty());
        assert_eq!(mock.fifo_resets(), 1);
    }

    #[tokio::test]
    async fn test_failed_preset_keeps_playback_enabled() {
        let mock = MockI2c::default();
        let bus: SharedI2cBus<NoopRawMutex, _> = SharedI2cBus::new(mock.clone());
        let expander = GpioExpander::new(&bus, expander_config());
        expander.initialize().await.unwrap();

        // Already initialized: the preset write is the next transaction.
        mock.fail_next(1);
        assert!(bring_up(&expander).await);
        assert_eq!(mock.register(Register::Gp1), 0x00);
    }
}
