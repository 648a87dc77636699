//! Satellites in view, strongest signal first

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cmp::Reverse;
use core::fmt::Write;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::Alignment;

use crate::live_data::{GpsSnapshot, LiveData, SatelliteInfo};
use crate::screens::{SATS, Screen, ScreenCore};
use crate::ui::layouts::{ButtonSpec, GroupLayout, layout_horizontal};
use crate::ui::styling::{CYAN, GRAY, SCREEN_TEXT};
use crate::ui::text::{BODY_FONT, TITLE_FONT, line_height};
use crate::ui::{ButtonEventKind, ChildId, Label, RectExt, UiContext, screen_bounds};

const BACK_BUTTON_ID: u8 = 1;

/// Rows that fit between the header and the button bar.
pub const VISIBLE_ROWS: usize = 12;

const TABLE_LEFT: i32 = 20;
const TABLE_TOP: i32 = 62;
const ROW_WIDTH: u32 = 300;

type Row = heapless::String<32>;

pub struct SatsScreen {
    core: ScreenCore,
    live: Rc<dyn LiveData>,
    summary: ChildId,
    rows: Vec<ChildId>,
}

impl SatsScreen {
    pub fn new(live: Rc<dyn LiveData>) -> Self {
        let mut core = ScreenCore::new(SATS);
        let root = core.root_mut();
        let row_height = line_height(BODY_FONT) as i32 + 4;

        root.add(
            Label::new(Rectangle::new(Point::new(10, 6), Size::new(200, 24)), "Satellites")
                .with_font(TITLE_FONT),
        );
        let summary = root.add(
            Label::new(Rectangle::new(Point::new(270, 6), Size::new(200, 24)), "")
                .with_alignment(Alignment::Right),
        );
        root.add(
            Label::new(
                Rectangle::new(Point::new(TABLE_LEFT, 38), Size::new(ROW_WIDTH, 20)),
                "PRN  ELEV   AZ  SNR",
            )
            .with_color(CYAN),
        );

        let rows = (0..VISIBLE_ROWS)
            .map(|i| {
                let top = TABLE_TOP + i as i32 * row_height;
                root.add(Label::new(
                    Rectangle::new(Point::new(TABLE_LEFT, top), Size::new(ROW_WIDTH, row_height as u32)),
                    "",
                ))
            })
            .collect();

        let back = ButtonSpec::new(BACK_BUTTON_ID, "Back")
            .with_width(100)
            .on_event(|event, ctx| {
                if event.state == ButtonEventKind::Clicked {
                    ctx.go_back();
                }
            });
        let area = screen_bounds().inset(10);
        let bar = Rectangle::new(
            Point::new(area.top_left.x + area.size.width as i32 - 100, area.top_left.y),
            Size::new(100, area.size.height),
        );
        layout_horizontal([back], &GroupLayout::within(bar), root);

        let mut screen = Self {
            core,
            live,
            summary,
            rows,
        };
        let snapshot = screen.live.snapshot();
        screen.show(&snapshot);
        screen
    }

    fn show(&mut self, snapshot: &GpsSnapshot) {
        let mut summary: heapless::String<32> = heapless::String::new();
        let _ = write!(
            summary,
            "{} tracked / {} in view",
            snapshot.tracked_count(),
            snapshot.satellites.len()
        );

        let ordered = ordered_by_signal(snapshot);
        let root = self.core.root_mut();
        if let Some(label) = root.child_mut::<Label>(self.summary) {
            label.set_text(&summary);
        }
        for (index, id) in self.rows.iter().enumerate() {
            let Some(label) = root.child_mut::<Label>(*id) else {
                continue;
            };
            match ordered.get(index) {
                Some(sat) => {
                    label.set_text(&format_row(sat));
                    label.set_color(if sat.snr_db.is_some() { SCREEN_TEXT } else { GRAY });
                }
                None => {
                    label.set_text("");
                }
            }
        }
    }
}

/// Tracked satellites by descending SNR, then untracked ones by PRN.
fn ordered_by_signal(snapshot: &GpsSnapshot) -> Vec<SatelliteInfo> {
    let mut sats: Vec<SatelliteInfo> = snapshot.satellites.iter().copied().collect();
    sats.sort_by_key(|s| (Reverse(s.snr_db), s.prn));
    sats
}

fn format_row(sat: &SatelliteInfo) -> Row {
    let mut row = Row::new();
    let _ = write!(row, "{:>3}  {:>4}  {:>3}", sat.prn, sat.elevation_deg, sat.azimuth_deg);
    let _ = match sat.snr_db {
        Some(snr) => write!(row, "  {:>3}", snr),
        None => write!(row, "    -"),
    };
    row
}

impl Screen for SatsScreen {
    fn core(&self) -> &ScreenCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ScreenCore {
        &mut self.core
    }

    fn update_content(&mut self, _ctx: &mut UiContext) {
        let snapshot = self.live.snapshot();
        self.show(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GestureTiming;
    use crate::live_data::SharedLiveData;
    use embassy_time::Instant;

    fn sat(prn: u8, snr: Option<u8>) -> SatelliteInfo {
        SatelliteInfo {
            prn,
            elevation_deg: 30,
            azimuth_deg: 270,
            snr_db: snr,
        }
    }

    fn row_texts(screen: &SatsScreen) -> Vec<&str> {
        screen
            .rows
            .iter()
            .filter_map(|id| screen.core().root().child::<Label>(*id))
            .map(|l| l.text())
            .collect()
    }

    #[test]
    fn test_rows_sorted_by_signal() {
        let live = Rc::new(SharedLiveData::new());
        live.modify(|s| {
            let _ = s.satellites.push(sat(5, Some(20)));
            let _ = s.satellites.push(sat(9, None));
            let _ = s.satellites.push(sat(2, Some(41)));
        });
        let screen = SatsScreen::new(live);
        let rows = row_texts(&screen);
        assert!(rows[0].starts_with("  2"), "strongest first: {:?}", rows[0]);
        assert!(rows[1].starts_with("  5"));
        assert!(rows[2].starts_with("  9") && rows[2].ends_with('-'), "untracked last");
        assert_eq!(rows[3], "");
    }

    #[test]
    fn test_rows_cleared_when_satellites_drop_out() {
        let live = Rc::new(SharedLiveData::new());
        live.modify(|s| {
            let _ = s.satellites.push(sat(7, Some(33)));
        });
        let mut screen = SatsScreen::new(live.clone());
        assert_ne!(row_texts(&screen)[0], "");

        live.modify(|s| s.satellites.clear());
        screen.update(&mut UiContext::new(Instant::from_millis(0), GestureTiming::default()));
        assert!(row_texts(&screen).iter().all(|r| r.is_empty()));
    }

    #[test]
    fn test_format_row_columns() {
        assert_eq!(format_row(&sat(12, Some(38))).as_str(), " 12    30  270   38");
        assert_eq!(format_row(&sat(3, None)).as_str(), "  3    30  270    -");
    }
}
