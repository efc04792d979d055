// PulseWatch - Monitor Task
//
// The only working thread: waits for each MAX30102 sample, runs it through
// the estimation engine and lets the engine drive the OLED and buzzer.
// Never returns.

use pulsewatch::acquire::{self, PulseSensor};
use pulsewatch::beat::PbaBeatDetector;
use pulsewatch::config::*;
use pulsewatch::monitor::{BatchEvent, Monitor};
use pulsewatch::spo2::MaximEstimator;

use crate::drivers::buzzer::PiezoBuzzer;
use crate::drivers::max30102::Max30102;
use crate::drivers::oled::OledDisplay;

pub fn monitor_task(mut sensor: Max30102, display: OledDisplay, buzzer: PiezoBuzzer) -> ! {
    log::info!("Monitor task started");

    let mut monitor = Monitor::new(
        MaximEstimator::new(EFFECTIVE_SAMPLE_RATE_HZ),
        PbaBeatDetector::new(),
        display,
        buzzer,
    );

    // Anything that piled up in the FIFO during boot is stale.
    if let Err(e) = sensor.check() {
        log::warn!("Sensor poll error: {}", e);
    }
    while sensor.next().is_some() {}

    loop {
        let sample = acquire::next_sample(&mut sensor);
        let report = monitor.tick(sample, crate::now_ms());

        if let BatchEvent::Abandoned(n) = report.batch {
            log::info!("Finger lost after {} samples, waiting for contact", n);
        }
    }
}
