// PulseWatch - MAX30102 Pulse Oximeter Driver
//
// Register-level driver over the shared I2C bus.  Runs the part in SpO2
// mode (red + IR) and drains the on-chip FIFO into a local queue that the
// monitor consumes one sample at a time.

use std::collections::VecDeque;

use pulsewatch::acquire::PulseSensor;
use pulsewatch::config::*;
use pulsewatch::events::Sample;

use super::SharedBus;

// MAX30102 register addresses
const REG_FIFO_WR_PTR: u8 = 0x04;
const REG_OVF_COUNTER: u8 = 0x05;
const REG_FIFO_RD_PTR: u8 = 0x06;
const REG_FIFO_DATA: u8 = 0x07;
const REG_FIFO_CONFIG: u8 = 0x08;
const REG_MODE_CONFIG: u8 = 0x09;
const REG_SPO2_CONFIG: u8 = 0x0A;
const REG_LED1_PA: u8 = 0x0C; // Red
const REG_LED2_PA: u8 = 0x0D; // IR
const REG_PART_ID: u8 = 0xFF;
const PART_ID_EXPECTED: u8 = 0x15;

const MODE_RESET: u8 = 0x40;
const MODE_SPO2: u8 = 0x03;
const FIFO_ROLLOVER: u8 = 0x10;
const ADC_RANGE_4096: u8 = 0x20;
const PULSE_WIDTH_411: u8 = 0x03;

const FIFO_DEPTH: usize = 32;
const BYTES_PER_SAMPLE: usize = 6; // 3 bytes red + 3 bytes IR

pub struct Max30102 {
    bus: SharedBus,
    queue: VecDeque<Sample>,
}

impl Max30102 {
    pub fn new(bus: SharedBus) -> Self {
        Self {
            bus,
            queue: VecDeque::with_capacity(FIFO_DEPTH),
        }
    }

    /// Verify the device is reachable on the I2C bus.
    pub fn is_connected(&self) -> bool {
        match self.read_reg(REG_PART_ID) {
            Ok(id) => id == PART_ID_EXPECTED,
            Err(_) => false,
        }
    }

    /// Reset and configure: 4x averaging, SpO2 mode, 4096 nA range, 100 sps,
    /// 411 us pulses, dimmed red LED.
    pub fn init(&mut self) -> anyhow::Result<()> {
        self.write_reg(REG_MODE_CONFIG, MODE_RESET)?;
        for _ in 0..100 {
            if self.read_reg(REG_MODE_CONFIG)? & MODE_RESET == 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }

        self.write_reg(REG_FIFO_CONFIG, fifo_average_bits(SENSOR_SAMPLE_AVERAGE) | FIFO_ROLLOVER)?;
        self.write_reg(REG_MODE_CONFIG, MODE_SPO2)?;
        self.write_reg(
            REG_SPO2_CONFIG,
            ADC_RANGE_4096 | sample_rate_bits(SENSOR_SAMPLE_RATE_SPS) | PULSE_WIDTH_411,
        )?;
        self.write_reg(REG_LED1_PA, LED_AMPLITUDE_DEFAULT)?;
        self.write_reg(REG_LED2_PA, LED_AMPLITUDE_DEFAULT)?;
        self.write_reg(REG_LED1_PA, LED_AMPLITUDE_RED)?;

        self.write_reg(REG_FIFO_WR_PTR, 0)?;
        self.write_reg(REG_OVF_COUNTER, 0)?;
        self.write_reg(REG_FIFO_RD_PTR, 0)?;
        self.queue.clear();

        log::info!(
            "MAX30102 initialised ({} sps / {}x avg = {} Hz)",
            SENSOR_SAMPLE_RATE_SPS,
            SENSOR_SAMPLE_AVERAGE,
            EFFECTIVE_SAMPLE_RATE_HZ
        );
        Ok(())
    }

    fn read_reg(&self, reg: u8) -> anyhow::Result<u8> {
        let mut bus = self.bus.lock().unwrap();
        let mut buf = [0u8; 1];
        bus.write_read(I2C_ADDR_MAX30102, &[reg], &mut buf, I2C_TIMEOUT_TICKS)?;
        Ok(buf[0])
    }

    fn write_reg(&self, reg: u8, value: u8) -> anyhow::Result<()> {
        let mut bus = self.bus.lock().unwrap();
        bus.write(I2C_ADDR_MAX30102, &[reg, value], I2C_TIMEOUT_TICKS)?;
        Ok(())
    }
}

impl PulseSensor for Max30102 {
    fn available(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Burst-read every new FIFO entry.
    fn check(&mut self) -> anyhow::Result<()> {
        let write_ptr = self.read_reg(REG_FIFO_WR_PTR)? as usize;
        let read_ptr = self.read_reg(REG_FIFO_RD_PTR)? as usize;
        let count = (write_ptr + FIFO_DEPTH - read_ptr) % FIFO_DEPTH;
        if count == 0 {
            return Ok(());
        }

        let mut raw = [0u8; FIFO_DEPTH * BYTES_PER_SAMPLE];
        let raw = &mut raw[..count * BYTES_PER_SAMPLE];
        {
            let mut bus = self.bus.lock().unwrap();
            bus.write_read(I2C_ADDR_MAX30102, &[REG_FIFO_DATA], raw, I2C_TIMEOUT_TICKS)?;
        }

        for chunk in raw.chunks_exact(BYTES_PER_SAMPLE) {
            if self.queue.len() == FIFO_DEPTH {
                self.queue.pop_front();
            }
            self.queue.push_back(Sample {
                red: be24(&chunk[0..3]),
                ir: be24(&chunk[3..6]),
            });
        }
        Ok(())
    }

    fn next(&mut self) -> Option<Sample> {
        self.queue.pop_front()
    }
}

fn be24(b: &[u8]) -> u32 {
    (u32::from(b[0]) << 16 | u32::from(b[1]) << 8 | u32::from(b[2])) & SENSOR_SAMPLE_MAX
}

fn fifo_average_bits(average: u32) -> u8 {
    match average {
        1 => 0x00,
        2 => 0x20,
        4 => 0x40,
        8 => 0x60,
        16 => 0x80,
        _ => 0xA0,
    }
}

fn sample_rate_bits(sps: u32) -> u8 {
    match sps {
        50 => 0x00,
        100 => 0x04,
        200 => 0x08,
        400 => 0x0C,
        800 => 0x10,
        1000 => 0x14,
        1600 => 0x18,
        _ => 0x1C,
    }
}
