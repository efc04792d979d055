// PulseWatch - Firmware Entry Point
//
// Boot sequence:
//   1. Bring up the shared I2C bus (OLED + MAX30102).
//   2. Show the "PulseWatch" splash for 3 seconds.
//   3. Run component self-test (OLED + MAX30102) and show the result.
//   4. Configure the sensor and the buzzer.
//   5. Spawn the monitor task, which runs the sample loop forever.

#[cfg(target_os = "espidf")]
mod drivers;
#[cfg(target_os = "espidf")]
mod tasks;

#[cfg(target_os = "espidf")]
use std::sync::Mutex;
#[cfg(target_os = "espidf")]
use std::thread;
#[cfg(target_os = "espidf")]
use std::time::Duration;

#[cfg(target_os = "espidf")]
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
#[cfg(target_os = "espidf")]
use esp_idf_hal::prelude::*;

#[cfg(target_os = "espidf")]
use pulsewatch::config::*;
#[cfg(target_os = "espidf")]
use pulsewatch::output::{Frame, Screen};

#[cfg(target_os = "espidf")]
use crate::drivers::buzzer::PiezoBuzzer;
#[cfg(target_os = "espidf")]
use crate::drivers::max30102::Max30102;
#[cfg(target_os = "espidf")]
use crate::drivers::oled::OledDisplay;

// ---------------------------------------------------------------------------
// Utility: milliseconds since boot (wraps at ~49 days; beat intervals use
// wrapping arithmetic)
// ---------------------------------------------------------------------------
#[cfg(target_os = "espidf")]
pub fn now_ms() -> u32 {
    unsafe { (esp_idf_sys::esp_timer_get_time() / 1000) as u32 }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------
#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("PulseWatch firmware starting...");

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;

    // ---- I2C bus (shared between OLED and MAX30102) -----------------------
    let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio6, // SDA
        peripherals.pins.gpio7, // SCL
        &i2c_config,
    )?;
    // SAFETY: The I2C peripheral is a singleton obtained from `Peripherals::take()`.
    // It will live for the entire programme duration (embedded firmware never exits).
    let i2c_bus: &'static Mutex<I2cDriver<'static>> =
        Box::leak(Box::new(Mutex::new(unsafe { core::mem::transmute(i2c) })));

    // ---- Boot sequence (display) ------------------------------------------
    let mut display = OledDisplay::new(i2c_bus);
    if let Err(e) = display.init() {
        log::error!("OLED init failed: {}", e);
    }

    // Step 1 - splash
    show(&mut display, Frame::Splash);
    thread::sleep(Duration::from_millis(BOOT_SPLASH_MS));

    // Step 2 - component self-test
    let display_ok = display.is_connected();
    let mut sensor = Max30102::new(i2c_bus);
    let sensor_ok = sensor.is_connected();

    show(&mut display, Frame::BootStatus { display_ok, sensor_ok });
    thread::sleep(Duration::from_millis(BOOT_STATUS_MS));

    if !display_ok || !sensor_ok {
        log::error!("Boot check FAILED - OLED:{} MAX30102:{}", display_ok, sensor_ok);
        // Continue anyway so we can still debug via serial.
    }

    // Step 3 - sensor + buzzer
    if let Err(e) = sensor.init() {
        log::error!("MAX30102 init failed: {}", e);
    }
    let buzzer = PiezoBuzzer::new()?;

    show(&mut display, Frame::PlaceFinger);
    log::info!("Boot complete - entering measurement loop");

    // ---- Monitor task -----------------------------------------------------
    thread::Builder::new()
        .name("monitor".into())
        .stack_size(STACK_MONITOR)
        .spawn(move || {
            tasks::monitor::monitor_task(sensor, display, buzzer);
        })?;

    // Main thread has nothing left to do - park it forever.
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}

#[cfg(target_os = "espidf")]
fn show(display: &mut OledDisplay, frame: Frame) {
    if let Err(e) = display.show(&frame) {
        log::error!("Display error: {}", e);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("pulsewatch firmware only runs on ESP-IDF targets; the estimation engine is in the library")
}
