//! User settings and change notification
//!
//! [`SettingsStore`] is a cheap, cloneable handle to the one settings record
//! of the device. Screens read it, dialogs write it through
//! [`SettingsStore::update`], and anything that cares about changes holds a
//! [`Subscription`]. Persisting the record is left to the firmware.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;

use log::debug;
use serde::{Deserialize, Serialize};

/// Longest screensaver timeout the setup screen offers, in minutes.
pub const MAX_SCREENSAVER_TIMEOUT_MIN: u8 = 60;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Backlight follows the ambient light sensor
    pub auto_brightness: bool,
    /// Backlight level used when `auto_brightness` is off
    pub manual_brightness: u8,
    pub beeper_enabled: bool,
    /// Warn when approaching a known speed camera
    pub speed_camera_alarm: bool,
    /// Idle minutes before the screensaver starts; zero disables it
    pub screensaver_timeout_min: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_brightness: true,
            manual_brightness: u8::MAX,
            beeper_enabled: true,
            speed_camera_alarm: true,
            screensaver_timeout_min: 5,
        }
    }
}

impl Settings {
    /// Screensaver timeout in seconds, as expected by
    /// [`UiConfig::idle_timeout_secs`](crate::config::UiConfig::idle_timeout_secs).
    pub fn screensaver_timeout_secs(&self) -> u32 {
        u32::from(self.screensaver_timeout_min.min(MAX_SCREENSAVER_TIMEOUT_MIN)) * 60
    }
}

type Listener = Rc<RefCell<Box<dyn FnMut(&Settings)>>>;

struct Inner {
    settings: Settings,
    listeners: Vec<(u32, Listener)>,
    next_token: u32,
}

/// Shared handle to the settings record.
#[derive(Clone)]
pub struct SettingsStore {
    inner: Rc<RefCell<Inner>>,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                settings,
                listeners: Vec::new(),
                next_token: 0,
            })),
        }
    }

    /// Copy of the current record.
    pub fn get(&self) -> Settings {
        self.inner.borrow().settings
    }

    /// Modify the record in place. Subscribers run only if something changed.
    ///
    /// Returns whether the record changed.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut Settings),
    {
        let (settings, listeners) = {
            let mut inner = self.inner.borrow_mut();
            let before = inner.settings;
            f(&mut inner.settings);
            if inner.settings == before {
                return false;
            }
            let listeners: Vec<Listener> = inner.listeners.iter().map(|(_, l)| l.clone()).collect();
            (inner.settings, listeners)
        };

        debug!(" Settings changed, notifying {} subscriber(s)", listeners.len());
        for listener in listeners {
            // A listener that updates the store from its own callback is not
            // re-entered
            if let Ok(mut callback) = listener.try_borrow_mut() {
                (&mut **callback)(&settings);
            }
        }
        true
    }

    /// Register `callback` for change notifications until the returned token
    /// is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&Settings) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let token = inner.next_token;
        inner.next_token = inner.next_token.wrapping_add(1);
        inner
            .listeners
            .push((token, Rc::new(RefCell::new(Box::new(callback)))));
        Subscription {
            store: Rc::downgrade(&self.inner),
            token,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

/// Change-notification token; unsubscribes on drop.
pub struct Subscription {
    store: Weak<RefCell<Inner>>,
    token: u32,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.store.upgrade() {
            if let Ok(mut inner) = shared.try_borrow_mut() {
                inner.listeners.retain(|(token, _)| *token != self.token);
            }
        }
    }
}
