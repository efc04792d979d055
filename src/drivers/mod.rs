pub mod buzzer;
pub mod max30102;
pub mod oled;

use std::sync::Mutex;

use esp_idf_hal::i2c::I2cDriver;

/// Thread-safe handle to the I2C bus shared by the OLED and the sensor.
pub type SharedBus = &'static Mutex<I2cDriver<'static>>;
