// PulseWatch - Sample Acquisition
//
// Blocking "give me the next sample" on top of a polled sensor driver.
// Spins briefly, then backs off with short sleeps so the loop does not
// starve the idle task while the sensor fills its FIFO.

use std::thread;
use std::time::Duration;

use crate::config::*;
use crate::events::Sample;

/// A polled PPG sensor with an internal sample queue.
pub trait PulseSensor {
    /// At least one sample is waiting.
    fn available(&self) -> bool;
    /// Advance the driver: pull any new samples from the device.
    fn check(&mut self) -> anyhow::Result<()>;
    /// Oldest waiting sample, if any.
    fn next(&mut self) -> Option<Sample>;
}

/// Wait for and return the next sample, in arrival order.  Driver errors are
/// logged and polling carries on.
pub fn next_sample<S: PulseSensor + ?Sized>(sensor: &mut S) -> Sample {
    let mut polls: u32 = 0;

    loop {
        if sensor.available() {
            if let Some(sample) = sensor.next() {
                return sample;
            }
        }

        if let Err(e) = sensor.check() {
            log::warn!("Sensor poll error: {}", e);
        }

        polls = polls.saturating_add(1);
        if polls > POLL_SPIN_LIMIT {
            thread::sleep(Duration::from_millis(POLL_BACKOFF_MS));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Releases one queued sample every `every` polls; fails the first poll.
    struct Scripted {
        pending: VecDeque<Sample>,
        ready: VecDeque<Sample>,
        every: u32,
        polls: u32,
    }

    impl PulseSensor for Scripted {
        fn available(&self) -> bool {
            !self.ready.is_empty()
        }

        fn check(&mut self) -> anyhow::Result<()> {
            self.polls += 1;
            if self.polls == 1 {
                anyhow::bail!("bus busy");
            }
            if self.polls % self.every == 0 {
                if let Some(s) = self.pending.pop_front() {
                    self.ready.push_back(s);
                }
            }
            Ok(())
        }

        fn next(&mut self) -> Option<Sample> {
            self.ready.pop_front()
        }
    }

    #[test]
    fn samples_come_out_in_order_despite_errors() {
        let mut sensor = Scripted {
            pending: (0..5).map(|i| Sample::new(8000 + i, 6000 + i)).collect(),
            ready: VecDeque::new(),
            every: 3,
            polls: 0,
        };

        let got: Vec<Sample> = (0..5).map(|_| next_sample(&mut sensor)).collect();
        let want: Vec<Sample> = (0..5).map(|i| Sample::new(8000 + i, 6000 + i)).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn buffered_samples_need_no_poll() {
        let mut sensor = Scripted {
            pending: VecDeque::new(),
            ready: [Sample::new(9000, 7000)].into_iter().collect(),
            every: 1,
            polls: 0,
        };
        assert_eq!(next_sample(&mut sensor), Sample::new(9000, 7000));
        assert_eq!(sensor.polls, 0);
    }
}
