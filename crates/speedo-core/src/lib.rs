//! Hardware-independent core library for the speedo GPS instrument display
//!
//! This crate contains the touch UI runtime of the device: the component
//! tree, the touch dispatcher, the per-screen modal dialog stack and the
//! screen controller with its back-stack, deferred action queue and idle
//! screensaver. GPS decoding and settings persistence live outside and are
//! consumed through [`live_data::LiveData`] and [`settings::SettingsStore`].
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod error;
pub mod framebuffer;
pub mod live_data;
pub mod screens;
pub mod settings;
pub mod ui;
