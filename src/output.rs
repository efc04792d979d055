// PulseWatch - Output Coordinator
//
// Maps the running estimate to what the user sees and hears.  Holds no
// state of its own: the monitor asks for a frame on every sample and again
// on every beat, then hands it to the screen sink.

use std::thread;
use std::time::Duration;

use embedded_graphics::image::{Image, ImageRaw};
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use crate::config::*;
use crate::events::EstimateState;

// ---------------------------------------------------------------------------
// Heart bitmaps (1 bpp, MSB first, rows padded to whole bytes)
// ---------------------------------------------------------------------------
const HEART_IDLE_W: u32 = 24;
#[rustfmt::skip]
const HEART_IDLE: [u8; 63] = [
    0x03, 0xC0, 0xF0, 0x06, 0x71, 0x8C, 0x0C, 0x1B, 0x06, 0x18, 0x0E, 0x02, 0x10, 0x0C, 0x03, 0x10,
    0x04, 0x01, 0x10, 0x04, 0x01, 0x10, 0x40, 0x01, 0x10, 0x40, 0x01, 0x10, 0xC0, 0x03, 0x08, 0x88,
    0x02, 0x08, 0xB8, 0x04, 0xFF, 0x37, 0x08, 0x01, 0x30, 0x18, 0x01, 0x90, 0x30, 0x00, 0xC0, 0x60,
    0x00, 0x60, 0xC0, 0x00, 0x31, 0x80, 0x00, 0x1B, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x04, 0x00,
];

const HEART_BEAT_W: u32 = 32;
#[rustfmt::skip]
const HEART_BEAT: [u8; 128] = [
    0x01, 0xF0, 0x0F, 0x80, 0x06, 0x1C, 0x38, 0x60, 0x18, 0x06, 0x60, 0x18, 0x10, 0x01, 0x80, 0x08,
    0x20, 0x01, 0x80, 0x04, 0x40, 0x00, 0x00, 0x02, 0x40, 0x00, 0x00, 0x02, 0xC0, 0x00, 0x08, 0x03,
    0x80, 0x00, 0x08, 0x01, 0x80, 0x00, 0x18, 0x01, 0x80, 0x00, 0x1C, 0x01, 0x80, 0x00, 0x14, 0x00,
    0x80, 0x00, 0x14, 0x00, 0x80, 0x00, 0x14, 0x00, 0x40, 0x10, 0x12, 0x00, 0x40, 0x10, 0x12, 0x00,
    0x7E, 0x1F, 0x23, 0xFE, 0x03, 0x31, 0xA0, 0x04, 0x01, 0xA0, 0xA0, 0x0C, 0x00, 0xA0, 0xA0, 0x08,
    0x00, 0x60, 0xE0, 0x10, 0x00, 0x20, 0x60, 0x20, 0x06, 0x00, 0x40, 0x60, 0x03, 0x00, 0x40, 0xC0,
    0x01, 0x80, 0x01, 0x80, 0x00, 0xC0, 0x03, 0x00, 0x00, 0x60, 0x06, 0x00, 0x00, 0x30, 0x0C, 0x00,
    0x00, 0x08, 0x10, 0x00, 0x00, 0x06, 0x60, 0x00, 0x00, 0x03, 0xC0, 0x00, 0x00, 0x01, 0x80, 0x00,
];

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartIcon {
    /// Small heart, drawn between beats.
    Idle,
    /// Large heart, drawn on the sample a beat was detected.
    Beat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Splash,
    BootStatus { display_ok: bool, sensor_ok: bool },
    PlaceFinger,
    Reading { icon: HeartIcon, bpm: u32, spo2: i32 },
}

/// Frame for the current state.  `beat` is true on the sample where the
/// detector fired.
pub fn frame_for(state: &EstimateState, beat: bool) -> Frame {
    if !state.finger_present {
        return Frame::PlaceFinger;
    }
    Frame::Reading {
        icon: if beat { HeartIcon::Beat } else { HeartIcon::Idle },
        bpm: state.beat_avg,
        spo2: state.spo2,
    }
}

impl Frame {
    /// Clear `target` and render this frame on it.
    pub fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        target.clear(BinaryColor::Off)?;
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

        match *self {
            Frame::Splash => {
                centered(target, "PulseWatch", SCREEN_HEIGHT as i32 / 2, style)?;
            }

            Frame::BootStatus { display_ok, sensor_ok } => {
                let oled = if display_ok { "OLED: OK" } else { "OLED: FAIL" };
                let sensor = if sensor_ok { "MAX30102: OK" } else { "MAX30102: FAIL" };
                centered(target, oled, 9, style)?;
                centered(target, sensor, 23, style)?;
            }

            Frame::PlaceFinger => {
                Text::with_baseline("Please Place", Point::new(30, 5), style, Baseline::Top).draw(target)?;
                Text::with_baseline("your finger", Point::new(30, 15), style, Baseline::Top).draw(target)?;
            }

            Frame::Reading { icon, bpm, spo2 } => {
                match icon {
                    HeartIcon::Idle => {
                        let raw = ImageRaw::<BinaryColor>::new(&HEART_IDLE, HEART_IDLE_W);
                        Image::new(&raw, Point::new(5, 5)).draw(target)?;
                    }
                    HeartIcon::Beat => {
                        let raw = ImageRaw::<BinaryColor>::new(&HEART_BEAT, HEART_BEAT_W);
                        Image::new(&raw, Point::zero()).draw(target)?;
                    }
                }

                let bpm = bpm.to_string();
                let spo2 = spo2.to_string();
                Text::with_baseline("BPM", Point::new(45, 0), style, Baseline::Top).draw(target)?;
                Text::with_baseline(&bpm, Point::new(45, 18), style, Baseline::Top).draw(target)?;
                Text::with_baseline("SpO2", Point::new(95, 0), style, Baseline::Top).draw(target)?;
                Text::with_baseline(&spo2, Point::new(95, 18), style, Baseline::Top).draw(target)?;
            }
        }
        Ok(())
    }
}

fn centered<D>(target: &mut D, text: &str, y: i32, style: MonoTextStyle<'_, BinaryColor>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let layout = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();
    Text::with_text_style(text, Point::new(SCREEN_WIDTH as i32 / 2, y), style, layout).draw(target)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Anything that can put a whole frame in front of the user.
pub trait Screen {
    fn show(&mut self, frame: &Frame) -> anyhow::Result<()>;
}

/// Audible cue output.
pub trait Buzzer {
    fn tone(&mut self, hz: u32);
    fn no_tone(&mut self);

    /// Sound `hz` for `duration` (blocks the calling thread).
    fn beep(&mut self, hz: u32, duration: Duration) {
        self.tone(hz);
        thread::sleep(duration);
        self.no_tone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::FrameBuffer;

    fn render(frame: Frame) -> FrameBuffer {
        let mut fb = FrameBuffer::new();
        frame.draw(&mut fb).unwrap();
        fb
    }

    fn present(beat_avg: u32, spo2: i32) -> EstimateState {
        EstimateState {
            beat_avg,
            spo2,
            finger_present: true,
            ..EstimateState::new()
        }
    }

    #[test]
    fn no_finger_maps_to_prompt() {
        let state = EstimateState {
            beat_avg: 70,
            ..EstimateState::new()
        };
        assert_eq!(frame_for(&state, true), Frame::PlaceFinger);
    }

    #[test]
    fn beat_switches_icon() {
        let state = present(72, 98);
        assert_eq!(
            frame_for(&state, false),
            Frame::Reading { icon: HeartIcon::Idle, bpm: 72, spo2: 98 }
        );
        assert_eq!(
            frame_for(&state, true),
            Frame::Reading { icon: HeartIcon::Beat, bpm: 72, spo2: 98 }
        );
    }

    #[test]
    fn prompt_leaves_icon_area_blank() {
        let fb = render(Frame::PlaceFinger);
        assert_eq!(fb.lit_in(0, 0, 30, 32), 0);
        assert!(fb.lit_in(30, 0, 98, 32) > 0);
    }

    #[test]
    fn icons_differ() {
        let idle = render(Frame::Reading { icon: HeartIcon::Idle, bpm: 60, spo2: 97 });
        let beat = render(Frame::Reading { icon: HeartIcon::Beat, bpm: 60, spo2: 97 });

        // The small heart sits inside (5,5)-(29,26); the big one reaches the corner.
        assert_eq!(idle.lit_in(0, 0, 5, 32), 0);
        assert!(beat.lit_in(0, 0, 5, 32) > 0);
        // Text columns are identical.
        let text = |fb: &FrameBuffer| (45..128).map(|x| fb.lit_in(x, 0, 1, 32)).collect::<Vec<_>>();
        assert_eq!(text(&idle), text(&beat));
    }

    #[test]
    fn numbers_change_only_their_field() {
        let a = render(Frame::Reading { icon: HeartIcon::Idle, bpm: 60, spo2: 97 });
        let b = render(Frame::Reading { icon: HeartIcon::Idle, bpm: 61, spo2: 97 });

        let differs = |x0: u32, y0: u32, w: u32, h: u32| {
            (y0..y0 + h).any(|y| (x0..x0 + w).any(|x| a.pixel(x, y) != b.pixel(x, y)))
        };
        assert!(differs(45, 18, 50, 14));
        assert!(!differs(95, 0, 33, 32));
        assert!(!differs(45, 0, 50, 18));
    }

    #[test]
    fn boot_frames_render_text() {
        assert!(render(Frame::Splash).lit_in(0, 0, 128, 32) > 0);
        let ok = render(Frame::BootStatus { display_ok: true, sensor_ok: true });
        let fail = render(Frame::BootStatus { display_ok: true, sensor_ok: false });
        assert_ne!(ok.as_bytes(), fail.as_bytes());
    }
}
