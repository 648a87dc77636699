//! Desktop simulator for the speedo touch UI.
//!
//! Renders the speedo-core screens in an SDL2 window via
//! `embedded-graphics-simulator`. Generates a synthetic GPS feed so every
//! screen, dialog and the screensaver can be exercised without hardware.
//!
//! # Key bindings
//!
//! | Key   | Action                               |
//! |-------|--------------------------------------|
//! | 1     | Main screen                          |
//! | 2     | Satellites                           |
//! | 3     | Setup                                |
//! | 4     | Screensaver                          |
//! | B     | Back                                 |
//! | P     | Park / drive (speed 0 or synthetic)  |
//! | Q     | Quit                                 |
//!
//! Mouse button and drag events are forwarded as touch samples.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{info, warn};

use speedo_core::config::UiConfig;
use speedo_core::framebuffer::FrameBuffer;
use speedo_core::live_data::{
    GpsSnapshot, LiveData, MAX_SATELLITES, SatelliteInfo, SharedLiveData, TimeOfDay,
};
use speedo_core::screens::{MAIN, SATS, SCREEN_SAVER, SETUP, ScreenController};
use speedo_core::settings::SettingsStore;
use speedo_core::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, TouchSample};

// ---------------------------------------------------------------------------
// Display constants
// ---------------------------------------------------------------------------

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Interval between synthetic GPS fixes.
const MOCK_FIX_INTERVAL: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Mock data generation
// ---------------------------------------------------------------------------

/// Generates a drive that speeds up, cruises and stops again.
struct MockGpsGenerator {
    elapsed_secs: f64,
    parked: bool,
}

impl MockGpsGenerator {
    fn new() -> Self {
        Self {
            elapsed_secs: 0.0,
            parked: true,
        }
    }

    fn next_fix(&mut self, dt_secs: f64) -> GpsSnapshot {
        self.elapsed_secs += dt_secs;
        let t = self.elapsed_secs;

        let speed = if self.parked {
            0.0
        } else {
            (60.0 + 45.0 * (t / 40.0).sin() + 8.0 * (t / 7.0).cos()).max(0.0)
        };

        let mut snapshot = GpsSnapshot {
            speed_kmh: speed as f32,
            valid: t > 5.0,
            ..GpsSnapshot::EMPTY
        };

        // Satellites rise and fade on their own slow cycles
        for i in 0..12u8 {
            let phase = t / 90.0 + f64::from(i) * 0.7;
            let snr = 25.0 + 20.0 * phase.sin();
            let sat = SatelliteInfo {
                prn: 2 + i * 3,
                elevation_deg: (10.0 + 70.0 * (phase / 2.0).cos().abs()) as u8,
                azimuth_deg: ((f64::from(i) * 30.0 + t / 4.0) % 360.0) as u16,
                snr_db: (snr > 18.0).then_some(snr as u8),
            };
            if snapshot.satellites.len() < MAX_SATELLITES {
                let _ = snapshot.satellites.push(sat);
            }
        }

        let day_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            % 86_400;
        snapshot.time = Some(TimeOfDay {
            hour: (day_secs / 3600) as u8,
            minute: (day_secs / 60 % 60) as u8,
            second: (day_secs % 60) as u8,
        });
        snapshot
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Map an SDL keycode to a screen name.
fn keycode_to_screen(keycode: Keycode) -> Option<&'static str> {
    match keycode {
        Keycode::Num1 | Keycode::Kp1 => Some(MAIN),
        Keycode::Num2 | Keycode::Kp2 => Some(SATS),
        Keycode::Num3 | Keycode::Kp3 => Some(SETUP),
        Keycode::Num4 | Keycode::Kp4 => Some(SCREEN_SAVER),
        _ => None,
    }
}

fn touch_at(point: Point, pressed: bool) -> TouchSample {
    TouchSample::new(point.x.max(0), point.y.max(0), pressed)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!(" Starting speedo simulator");
    info!(
        " Display: {}×{} (scale {}×)",
        DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX, WINDOW_SCALE
    );
    info!(" Keys: 1=Main  2=Sats  3=Setup  4=Screensaver  B=Back  P=Park/Drive  Q=Quit");

    // SDL2 display and window
    let mut display =
        SimulatorDisplay::<Rgb565>::new(Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX));
    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("Speedo Simulator", &output_settings);
    let mut fb = FrameBuffer::new();

    // Collaborators
    let live = Rc::new(SharedLiveData::new());
    let settings = SettingsStore::default();
    let mut gps = MockGpsGenerator::new();

    let idle_timeout = Rc::new(Cell::new(settings.get().screensaver_timeout_secs()));
    let timeout_sink = idle_timeout.clone();
    let _settings_subscription = settings.subscribe(move |s| {
        timeout_sink.set(s.screensaver_timeout_secs());
    });

    let config = UiConfig {
        idle_timeout_secs: idle_timeout.get(),
        ..UiConfig::default()
    };
    let mut controller = ScreenController::with_default_screens(config, live.clone(), settings);
    if !controller.switch_to_screen(MAIN) {
        warn!(" Main screen missing, nothing to show");
        return;
    }

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    controller.draw(&mut fb);
    let _ = fb.flush(&mut display);
    window.update(&display);

    let mut last_fix = std::time::Instant::now();
    let mut mouse_down = false;

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let frame_start = std::time::Instant::now();
        let now = embassy_time::Instant::now();

        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::B => {
                        controller.go_back();
                    }
                    Keycode::P => {
                        gps.parked = !gps.parked;
                        info!(" {}", if gps.parked { "Parked" } else { "Driving" });
                    }
                    other => {
                        if let Some(target) = keycode_to_screen(other) {
                            info!(" Navigating to {}", target);
                            controller.switch_to_screen(target);
                        }
                    }
                },

                SimulatorEvent::MouseButtonDown { point, .. } => {
                    mouse_down = true;
                    controller.handle_touch(touch_at(point, true), now);
                }

                SimulatorEvent::MouseMove { point } if mouse_down => {
                    controller.handle_touch(touch_at(point, true), now);
                }

                SimulatorEvent::MouseButtonUp { point, .. } => {
                    mouse_down = false;
                    controller.handle_touch(touch_at(point, false), now);
                }

                _ => {}
            }
        }

        // --- Mock GPS feed ------------------------------------------------
        if last_fix.elapsed() >= MOCK_FIX_INTERVAL {
            live.publish(gps.next_fix(MOCK_FIX_INTERVAL.as_secs_f64()));
            last_fix = std::time::Instant::now();
        }

        // --- Controller tick ----------------------------------------------
        controller.set_idle_timeout_secs(idle_timeout.get());
        controller.report_speed(live.speed_kmh());
        controller.tick(now);

        // --- Render -------------------------------------------------------
        if controller.draw(&mut fb) {
            let _ = fb.flush(&mut display);
        }
        window.update(&display);

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    info!(" Simulator exiting");
}
