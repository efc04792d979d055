// PulseWatch - Hardware & System Configuration
// Target: ESP32-C3 + MAX30102 pulse oximeter + SSD1306 128x32 OLED + buzzer

// ---------------------------------------------------------------------------
// GPIO Pin Definitions
// ---------------------------------------------------------------------------
pub const PIN_BUZZER: i32 = 3;      // Piezo buzzer (LEDC square wave)
pub const PIN_I2C_SDA: i32 = 6;     // I2C data line
pub const PIN_I2C_SCL: i32 = 7;     // I2C clock line

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_BAUDRATE_KHZ: u32 = 400;
pub const I2C_ADDR_MAX30102: u8 = 0x57;
pub const I2C_ADDR_OLED: u8 = 0x3C;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Display (SSD1306 OLED)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 128;
pub const SCREEN_HEIGHT: u32 = 32;
pub const DISPLAY_BUFFER_SIZE: usize = (SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize) / 8; // 512

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_MONITOR: usize = 8192;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const BOOT_SPLASH_MS: u64 = 3000;          // Splash before the sensor starts
pub const BOOT_STATUS_MS: u64 = 1000;          // Self-test result screen
pub const TONE_DURATION_MS: u64 = 80;          // One "bip" per detected beat
pub const POLL_BACKOFF_MS: u64 = 1;            // Sleep between idle sensor polls
pub const POLL_SPIN_LIMIT: u32 = 64;           // Empty polls before backing off

// ---------------------------------------------------------------------------
// Audible cue
// ---------------------------------------------------------------------------
pub const TONE_FREQUENCY_HZ: u32 = 1000;

// ---------------------------------------------------------------------------
// MAX30102 acquisition
// ---------------------------------------------------------------------------
pub const SENSOR_SAMPLE_RATE_SPS: u32 = 100;   // ADC rate before averaging
pub const SENSOR_SAMPLE_AVERAGE: u32 = 4;      // On-chip FIFO averaging
pub const EFFECTIVE_SAMPLE_RATE_HZ: u32 = SENSOR_SAMPLE_RATE_SPS / SENSOR_SAMPLE_AVERAGE; // 25
pub const SENSOR_SAMPLE_MAX: u32 = 0x3_FFFF;   // 18-bit ADC full scale
pub const LED_AMPLITUDE_DEFAULT: u8 = 0x1F;    // ~6.4 mA
pub const LED_AMPLITUDE_RED: u8 = 0x0A;        // Dimmed red = "sensor running"

// ---------------------------------------------------------------------------
// Estimation engine
// ---------------------------------------------------------------------------
pub const WINDOW_SIZE: usize = 100;            // Samples handed to the SpO2 estimator
pub const BATCH_SIZE: usize = 25;              // Fresh samples per recompute
pub const RATE_HISTORY_SIZE: usize = 4;        // BPM readings averaged
pub const FINGER_THRESHOLD: u32 = 7000;        // Raw IR counts; above = finger present
pub const BPM_MIN_EXCLUSIVE: f32 = 20.0;
pub const BPM_MAX_EXCLUSIVE: f32 = 255.0;

/// Value the SpO2/heart-rate estimator reports when it has nothing usable.
pub const ESTIMATE_INVALID: i32 = -999;
