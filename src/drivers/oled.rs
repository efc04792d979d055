// PulseWatch - SSD1306 OLED Driver
//
// 128x32 panel on the shared I2C bus.  Frames are rendered into a local
// frame buffer and pushed out in one horizontal-addressing burst.

use pulsewatch::config::*;
use pulsewatch::framebuffer::FrameBuffer;
use pulsewatch::output::{Frame, Screen};

use super::SharedBus;

const CONTROL_CMD: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;
const DATA_CHUNK: usize = 32;

#[rustfmt::skip]
const INIT_SEQUENCE: &[u8] = &[
    0xAE,       // display off
    0xD5, 0x80, // clock divide
    0xA8, 0x1F, // multiplex 32
    0xD3, 0x00, // no display offset
    0x40,       // start line 0
    0x8D, 0x14, // charge pump on
    0x20, 0x00, // horizontal addressing
    0xA1,       // segment remap
    0xC8,       // COM scan descending
    0xDA, 0x02, // COM pins for 128x32
    0x81, 0x8F, // contrast
    0xD9, 0xF1, // pre-charge
    0xDB, 0x40, // VCOMH
    0xA4,       // resume from RAM
    0xA6,       // normal (not inverted)
    0x2E,       // no scrolling
    0xAF,       // display on
];

pub struct OledDisplay {
    bus: SharedBus,
    fb: FrameBuffer,
}

impl OledDisplay {
    pub fn new(bus: SharedBus) -> Self {
        Self {
            bus,
            fb: FrameBuffer::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        let mut bus = self.bus.lock().unwrap();
        bus.write(I2C_ADDR_OLED, &[CONTROL_CMD, 0xE3], I2C_TIMEOUT_TICKS).is_ok() // NOP
    }

    pub fn init(&mut self) -> anyhow::Result<()> {
        self.commands(INIT_SEQUENCE)?;
        self.flush()?;
        log::info!("SSD1306 initialised ({}x{})", SCREEN_WIDTH, SCREEN_HEIGHT);
        Ok(())
    }

    fn commands(&self, cmds: &[u8]) -> anyhow::Result<()> {
        let mut bus = self.bus.lock().unwrap();
        for &cmd in cmds {
            bus.write(I2C_ADDR_OLED, &[CONTROL_CMD, cmd], I2C_TIMEOUT_TICKS)?;
        }
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        let last_page = (SCREEN_HEIGHT / 8 - 1) as u8;
        self.commands(&[0x21, 0, (SCREEN_WIDTH - 1) as u8, 0x22, 0, last_page])?;

        let mut bus = self.bus.lock().unwrap();
        let mut packet = [0u8; DATA_CHUNK + 1];
        packet[0] = CONTROL_DATA;
        for chunk in self.fb.as_bytes().chunks(DATA_CHUNK) {
            packet[1..=chunk.len()].copy_from_slice(chunk);
            bus.write(I2C_ADDR_OLED, &packet[..=chunk.len()], I2C_TIMEOUT_TICKS)?;
        }
        Ok(())
    }
}

impl Screen for OledDisplay {
    fn show(&mut self, frame: &Frame) -> anyhow::Result<()> {
        if let Err(e) = frame.draw(&mut self.fb) {
            match e {}
        }
        self.flush()
    }
}
