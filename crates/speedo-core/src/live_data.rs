//! GPS snapshots consumed by the screens
//!
//! The GPS decoder runs wherever the firmware puts it (UART interrupt, async
//! task, second core) and publishes complete [`GpsSnapshot`]s into a
//! [`SharedLiveData`]. The UI loop only ever takes copies.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Satellites tracked per snapshot.
pub const MAX_SATELLITES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatelliteInfo {
    pub prn: u8,
    pub elevation_deg: u8,
    pub azimuth_deg: u16,
    /// `None` while the satellite is in view but not tracked
    pub snr_db: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// UTC time of day from the last RMC/ZDA sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Everything the UI shows about the receiver at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsSnapshot {
    pub speed_kmh: f32,
    /// Position fix present
    pub valid: bool,
    pub satellites: heapless::Vec<SatelliteInfo, MAX_SATELLITES>,
    pub location: Option<Location>,
    pub time: Option<TimeOfDay>,
}

impl GpsSnapshot {
    /// No fix, nothing in view.
    pub const EMPTY: Self = Self {
        speed_kmh: 0.0,
        valid: false,
        satellites: heapless::Vec::new(),
        location: None,
        time: None,
    };

    /// Satellites with a usable signal.
    pub fn tracked_count(&self) -> usize {
        self.satellites.iter().filter(|s| s.snr_db.is_some()).count()
    }
}

impl Default for GpsSnapshot {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Read side of the GPS data as seen by the UI.
pub trait LiveData {
    /// A complete, internally consistent copy of the latest data.
    fn snapshot(&self) -> GpsSnapshot;

    fn speed_kmh(&self) -> f32 {
        self.snapshot().speed_kmh
    }
}

/// Snapshot cell shared between the GPS producer and the UI loop.
///
/// Can live in a `static`:
///
/// ```ignore
/// static GPS: SharedLiveData = SharedLiveData::new();
/// ```
pub struct SharedLiveData {
    inner: Mutex<CriticalSectionRawMutex, RefCell<GpsSnapshot>>,
}

impl Default for SharedLiveData {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedLiveData {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(GpsSnapshot::EMPTY)),
        }
    }

    /// Replace the whole snapshot.
    pub fn publish(&self, snapshot: GpsSnapshot) {
        self.inner.lock(|cell| *cell.borrow_mut() = snapshot);
    }

    /// Modify the snapshot in place under the lock.
    pub fn modify<F>(&self, f: F)
    where
        F: FnOnce(&mut GpsSnapshot),
    {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()));
    }
}

impl LiveData for SharedLiveData {
    fn snapshot(&self) -> GpsSnapshot {
        self.inner.lock(|cell| cell.borrow().clone())
    }

    fn speed_kmh(&self) -> f32 {
        self.inner.lock(|cell| cell.borrow().speed_kmh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sat(prn: u8, snr: Option<u8>) -> SatelliteInfo {
        SatelliteInfo {
            prn,
            elevation_deg: 45,
            azimuth_deg: 180,
            snr_db: snr,
        }
    }

    #[test]
    fn test_publish_then_snapshot() {
        let live = SharedLiveData::new();
        assert_eq!(live.snapshot(), GpsSnapshot::EMPTY);

        let mut snapshot = GpsSnapshot {
            speed_kmh: 87.5,
            valid: true,
            ..GpsSnapshot::EMPTY
        };
        snapshot.satellites.push(sat(3, Some(38))).unwrap();
        snapshot.satellites.push(sat(17, None)).unwrap();
        live.publish(snapshot.clone());

        let copy = live.snapshot();
        assert_eq!(copy, snapshot);
        assert_eq!(copy.tracked_count(), 1);
        assert_eq!(live.speed_kmh(), 87.5);
    }

    #[test]
    fn test_modify_in_place() {
        static LIVE: SharedLiveData = SharedLiveData::new();
        LIVE.modify(|s| s.speed_kmh = 12.0);
        LIVE.modify(|s| s.valid = true);
        let snapshot = LIVE.snapshot();
        assert!(snapshot.valid);
        assert_eq!(snapshot.speed_kmh, 12.0);
    }
}
