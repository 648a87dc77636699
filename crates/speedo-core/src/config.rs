//! Runtime configuration for the UI core.
//!
//! Values are stored as plain integers so the record can be serialized by
//! whatever persistence layer the firmware uses; accessors hand out
//! [`embassy_time::Duration`]s.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

/// Timing windows used by the component gesture state machine.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureTiming {
    /// Minimum time between two accepted clicks on the same component.
    pub debounce_ms: u32,
    /// Releases faster than this are treated as ghost touches.
    pub min_click_ms: u32,
    /// Releases slower than this are treated as stuck presses.
    pub max_click_ms: u32,
    /// Extra slack around a component's bounds accepted on release.
    pub release_tolerance_px: u16,
    /// Hold time after which a button reports a long press.
    pub long_press_ms: u32,
}

impl Default for GestureTiming {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            min_click_ms: 30,
            max_click_ms: 2000,
            release_tolerance_px: 8,
            long_press_ms: 1000,
        }
    }
}

impl GestureTiming {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms as u64)
    }

    pub fn min_click(&self) -> Duration {
        Duration::from_millis(self.min_click_ms as u64)
    }

    pub fn max_click(&self) -> Duration {
        Duration::from_millis(self.max_click_ms as u64)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms as u64)
    }
}

/// Configuration of the screen controller and everything below it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct UiConfig {
    pub gesture: GestureTiming,
    /// Idle time before the screensaver starts; zero disables it.
    pub idle_timeout_secs: u32,
    /// Speeds above this count as motion and wake the display.
    pub motion_threshold_kmh: f32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            gesture: GestureTiming::default(),
            idle_timeout_secs: 60,
            motion_threshold_kmh: 4.0,
        }
    }
}

impl UiConfig {
    /// Idle timeout, or `None` when the screensaver is switched off.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs as u64))
    }

    pub fn with_idle_timeout_secs(mut self, secs: u32) -> Self {
        self.idle_timeout_secs = secs;
        self
    }

    pub fn with_motion_threshold(mut self, kmh: f32) -> Self {
        self.motion_threshold_kmh = kmh;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gesture_windows() {
        let timing = GestureTiming::default();
        assert_eq!(timing.debounce(), Duration::from_millis(200));
        assert!(timing.min_click() < timing.long_press());
        assert!(timing.long_press() < timing.max_click());
    }

    #[test]
    fn test_zero_idle_timeout_disables_screensaver() {
        let config = UiConfig::default().with_idle_timeout_secs(0);
        assert_eq!(config.idle_timeout(), None, "zero must disable the timer");

        let config = UiConfig::default();
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(60)));
    }
}
