//! Phone application state machine.
//!
//! A pure mapping from deduplicated input events to playback commands:
//!
//! | Event                                   | Command                         |
//! |-----------------------------------------|---------------------------------|
//! | REC line rises (port or interrupt)      | `PlayOnChannel(B, caller clip)` |
//! | REC line falls                          | `Stop`                          |
//! | matrix column goes from open to closed  | `PlayOnChannel(A, ringtone)`    |
//!
//! Anything else maps to nothing. A disabled app (failed bring-up) maps
//! every event to nothing.

use platform::{InputEvent, InputOrigin};
use playback::{Channel, CommandPolicy, PlaybackCommand};

use crate::config::AppConfig;

/// The input-to-command policy handed to the arbitrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhoneApp {
    config: AppConfig,
    enabled: bool,
}

impl PhoneApp {
    /// App reacting to input.
    pub const fn new(config: AppConfig) -> Self {
        Self {
            config,
            enabled: true,
        }
    }

    /// App that ignores all input. Used when bring-up failed.
    pub const fn disabled(config: AppConfig) -> Self {
        Self {
            config,
            enabled: false,
        }
    }

    /// Enabled iff `ready`.
    pub const fn with_readiness(config: AppConfig, ready: bool) -> Self {
        Self {
            config,
            enabled: ready,
        }
    }

    /// Whether input is mapped at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Configuration in use.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Command to inject once the tasks are running.
    pub fn boot_command(&self) -> Option<PlaybackCommand> {
        (self.enabled && self.config.ring_on_boot)
            .then_some(PlaybackCommand::PlayOnChannel(Channel::A, self.config.ringtone))
    }

    fn on_rec(&self, event: &InputEvent) -> Option<PlaybackCommand> {
        let mask = self.config.rec_line.mask();
        if event.rose(mask) {
            Some(PlaybackCommand::PlayOnChannel(Channel::B, self.config.caller_clip))
        } else if event.fell(mask) {
            Some(PlaybackCommand::Stop)
        } else {
            None
        }
    }

    fn on_matrix(&self, event: &InputEvent) -> Option<PlaybackCommand> {
        (event.previous == 0 && event.value != 0)
            .then_some(PlaybackCommand::PlayOnChannel(Channel::A, self.config.ringtone))
    }
}

impl Default for PhoneApp {
    fn default() -> Self {
        Self::new(AppConfig::DEFAULT)
    }
}

impl CommandPolicy for PhoneApp {
    fn on_input(&mut self, event: &InputEvent) -> Option<PlaybackCommand> {
        if !self.enabled {
            trace!("app: disabled, input ignored");
            return None;
        }
        if !event.changed {
            return None;
        }
        let command = match event.origin {
            InputOrigin::Port(_) | InputOrigin::Line(_) => self.on_rec(event),
            InputOrigin::MatrixColumn(_) => self.on_matrix(event),
        };
        if let Some(command) = command {
            debug!("app: {} -> {}", event.value, command);
        }
        command
    }
}

#[cfg(test)]
mod tests {
    use embassy_time::Instant;
    use platform::{LineId, Register};

    use super::*;
    use crate::config::{CALLER_CLIP, RINGTONE};

    fn event(origin: InputOrigin, previous: u8, value: u8) -> InputEvent {
        InputEvent {
            origin,
            changed: previous != value,
            value,
            previous,
            timestamp: Instant::from_ticks(0),
        }
    }

    fn line(previous: u8, value: u8) -> InputEvent {
        event(InputOrigin::Line(LineId::new(3)), previous, value)
    }

    #[test]
    fn test_rec_rise_plays_caller_on_b() {
        let mut app = PhoneApp::default();
        assert_eq!(
            app.on_input(&line(0x00, 0x08)),
            Some(PlaybackCommand::PlayOnChannel(Channel::B, CALLER_CLIP))
        );
    }

    #[test]
    fn test_rec_rise_on_polled_port() {
        let mut app = PhoneApp::default();
        let polled = event(InputOrigin::Port(Register::Gp0), 0x01, 0x09);
        assert_eq!(
            app.on_input(&polled),
            Some(PlaybackCommand::PlayOnChannel(Channel::B, CALLER_CLIP))
        );
    }

    #[test]
    fn test_rec_fall_stops() {
        let mut app = PhoneApp::default();
        assert_eq!(app.on_input(&line(0x08, 0x00)), Some(PlaybackCommand::Stop));
    }

    #[test]
    fn test_other_lines_ignored() {
        let mut app = PhoneApp::default();
        assert_eq!(app.on_input(&line(0x08, 0x0C)), None);
        assert_eq!(app.on_input(&line(0x00, 0x01)), None);
    }

    #[test]
    fn test_unchanged_event_ignored() {
        let mut app = PhoneApp::default();
        assert_eq!(app.on_input(&line(0x08, 0x08)), None);
    }

    #[test]
    fn test_matrix_close_rings_on_a() {
        let mut app = PhoneApp::default();
        let closed = event(InputOrigin::MatrixColumn(1), 0x00, 0x03);
        assert_eq!(
            app.on_input(&closed),
            Some(PlaybackCommand::PlayOnChannel(Channel::A, RINGTONE))
        );
    }

    #[test]
    fn test_matrix_change_while_closed_ignored() {
        let mut app = PhoneApp::default();
        assert_eq!(app.on_input(&event(InputOrigin::MatrixColumn(0), 0x01, 0x03)), None);
        assert_eq!(app.on_input(&event(InputOrigin::MatrixColumn(0), 0x03, 0x00)), None);
    }

    #[test]
    fn test_disabled_maps_nothing() {
        let mut app = PhoneApp::disabled(AppConfig::DEFAULT);
        assert!(!app.is_enabled());
        assert_eq!(app.on_input(&line(0x00, 0x08)), None);
        assert_eq!(app.boot_command(), None);
    }

    #[test]
    fn test_boot_command() {
        let app = PhoneApp::default();
        assert_eq!(
            app.boot_command(),
            Some(PlaybackCommand::PlayOnChannel(Channel::A, RINGTONE))
        );

        let quiet = PhoneApp::new(AppConfig {
            ring_on_boot: false,
            ..AppConfig::DEFAULT
        });
        assert_eq!(quiet.boot_command(), None);
    }
}
