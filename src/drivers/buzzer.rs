// PulseWatch - Piezo Buzzer Driver
//
// Square wave from an LEDC channel: 50 % duty while sounding, 0 % when
// silent.  Configured once through raw ESP-IDF calls.

use pulsewatch::config::*;
use pulsewatch::output::Buzzer;

const SPEED_MODE: esp_idf_sys::ledc_mode_t = esp_idf_sys::ledc_mode_t_LEDC_LOW_SPEED_MODE;
const TIMER: esp_idf_sys::ledc_timer_t = esp_idf_sys::ledc_timer_t_LEDC_TIMER_0;
const CHANNEL: esp_idf_sys::ledc_channel_t = esp_idf_sys::ledc_channel_t_LEDC_CHANNEL_0;
const DUTY_HALF: u32 = 1 << 9; // 10-bit resolution

pub struct PiezoBuzzer {
    frequency_hz: u32,
}

impl PiezoBuzzer {
    pub fn new() -> anyhow::Result<Self> {
        unsafe {
            let timer_cfg = esp_idf_sys::ledc_timer_config_t {
                speed_mode: SPEED_MODE,
                duty_resolution: esp_idf_sys::ledc_timer_bit_t_LEDC_TIMER_10_BIT,
                timer_num: TIMER,
                freq_hz: TONE_FREQUENCY_HZ,
                ..core::mem::zeroed()
            };
            esp_idf_sys::esp!(esp_idf_sys::ledc_timer_config(&timer_cfg))?;

            let chan_cfg = esp_idf_sys::ledc_channel_config_t {
                gpio_num: PIN_BUZZER,
                speed_mode: SPEED_MODE,
                channel: CHANNEL,
                timer_sel: TIMER,
                duty: 0,
                ..core::mem::zeroed()
            };
            esp_idf_sys::esp!(esp_idf_sys::ledc_channel_config(&chan_cfg))?;
        }

        log::info!("Buzzer ready on GPIO{}", PIN_BUZZER);
        Ok(Self {
            frequency_hz: TONE_FREQUENCY_HZ,
        })
    }

    fn set_duty(&mut self, duty: u32) {
        unsafe {
            let ret = esp_idf_sys::ledc_set_duty(SPEED_MODE, CHANNEL, duty);
            if ret == esp_idf_sys::ESP_OK {
                esp_idf_sys::ledc_update_duty(SPEED_MODE, CHANNEL);
            } else {
                log::warn!("LEDC duty update failed ({})", ret);
            }
        }
    }
}

impl Buzzer for PiezoBuzzer {
    fn tone(&mut self, hz: u32) {
        if hz != self.frequency_hz {
            let ret = unsafe { esp_idf_sys::ledc_set_freq(SPEED_MODE, TIMER, hz) };
            if ret == esp_idf_sys::ESP_OK {
                self.frequency_hz = hz;
            } else {
                log::warn!("LEDC cannot produce {} Hz ({})", hz, ret);
            }
        }
        self.set_duty(DUTY_HALF);
    }

    fn no_tone(&mut self) {
        self.set_duty(0);
    }
}
