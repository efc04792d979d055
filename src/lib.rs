// PulseWatch - Estimation Engine
//
// Platform-independent core of the pulse-oximeter firmware:
//   * `window`   - 100-sample IR/red sliding window
//   * `presence` - finger-presence gate
//   * `rate`     - beat timestamps -> BPM moving average
//   * `refill`   - batch collection, SpO2 recompute, window shift
//   * `output`   - frames for the OLED and the beat tone
//   * `monitor`  - per-sample control flow over all of the above
//
// Hardware drivers live in the firmware binary and plug in through the
// `PulseSensor`, `Screen` and `Buzzer` traits.

pub mod acquire;
pub mod beat;
pub mod config;
pub mod events;
pub mod framebuffer;
pub mod monitor;
pub mod output;
pub mod presence;
pub mod rate;
pub mod refill;
pub mod spo2;
pub mod window;
