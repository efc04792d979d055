// PulseWatch - Monitor
//
// One call to `tick` per acquired sample.  Between batches the sample is
// first run through the finger gate; while a batch is open every sample is
// stored, fed to the beat detector and shown, and the batch closes either
// after 25 samples (recompute + shift) or as soon as IR drops below the
// finger threshold.

use std::time::Duration;

use crate::beat::BeatDetector;
use crate::config::*;
use crate::events::{Estimate, EstimateState, Presence, Sample};
use crate::output::{frame_for, Buzzer, Frame, Screen};
use crate::presence::FingerGate;
use crate::rate::{BeatOutcome, BeatRateEstimator};
use crate::refill::RefillCoordinator;
use crate::spo2::Spo2Estimator;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BatchEvent {
    /// No finger, nothing stored.
    Idle,
    /// Sample stored; carries how many the batch holds now.
    Collected(usize),
    /// Finger lost mid-batch; carries how many had been counted.
    Abandoned(usize),
    /// 25th sample stored, estimator ran and the window shifted.
    Recomputed(Estimate),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub presence: Presence,
    pub beat: Option<BeatOutcome>,
    pub batch: BatchEvent,
}

pub struct Monitor<E, B, D, Z> {
    state: EstimateState,
    gate: FingerGate,
    rate: BeatRateEstimator,
    refill: RefillCoordinator,

    estimator: E,
    detector: B,
    screen: D,
    buzzer: Z,
}

impl<E, B, D, Z> Monitor<E, B, D, Z>
where
    E: Spo2Estimator,
    B: BeatDetector,
    D: Screen,
    Z: Buzzer,
{
    pub fn new(estimator: E, detector: B, screen: D, buzzer: Z) -> Self {
        Self {
            state: EstimateState::new(),
            gate: FingerGate::default(),
            rate: BeatRateEstimator::new(),
            refill: RefillCoordinator::new(),
            estimator,
            detector,
            screen,
            buzzer,
        }
    }

    pub fn state(&self) -> &EstimateState {
        &self.state
    }

    pub fn rate(&self) -> &BeatRateEstimator {
        &self.rate
    }

    pub fn refill(&self) -> &RefillCoordinator {
        &self.refill
    }

    pub fn screen(&self) -> &D {
        &self.screen
    }

    pub fn buzzer(&self) -> &Z {
        &self.buzzer
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Process one sample taken at `now_ms` (milliseconds since boot).
    pub fn tick(&mut self, sample: Sample, now_ms: u32) -> TickReport {
        if !RefillCoordinator::in_batch(&self.state) {
            let presence = self.gate.apply(sample.ir, &mut self.state);
            if presence == Presence::Absent {
                self.show_no_finger();
                return TickReport {
                    presence,
                    beat: None,
                    batch: BatchEvent::Idle,
                };
            }
        }

        self.refill.push(sample, &self.state);
        self.show(frame_for(&self.state, false));

        let beat = if self.detector.on_sample(sample.ir) {
            Some(self.on_beat(now_ms))
        } else {
            None
        };

        if self.gate.dropped(sample.ir) {
            let counted = self.state.acquired;
            self.refill.abandon(&mut self.state);
            let presence = self.gate.apply(sample.ir, &mut self.state);
            self.show_no_finger();
            return TickReport {
                presence,
                beat,
                batch: BatchEvent::Abandoned(counted),
            };
        }
        let presence = Presence::Present;

        self.refill.commit(&mut self.state);
        let batch = if RefillCoordinator::is_complete(&self.state) {
            let estimate = self.refill.recompute(&mut self.estimator, &mut self.state);
            BatchEvent::Recomputed(estimate)
        } else {
            BatchEvent::Collected(self.state.acquired)
        };

        TickReport { presence, beat, batch }
    }

    fn on_beat(&mut self, now_ms: u32) -> BeatOutcome {
        let outcome = self.rate.on_beat(now_ms, &mut self.state);
        self.show(frame_for(&self.state, true));
        self.buzzer
            .beep(TONE_FREQUENCY_HZ, Duration::from_millis(TONE_DURATION_MS));
        outcome
    }

    fn show_no_finger(&mut self) {
        self.show(Frame::PlaceFinger);
        self.buzzer.no_tone();
    }

    fn show(&mut self, frame: Frame) {
        if let Err(e) = self.screen.show(&frame) {
            log::error!("Display error: {}", e);
        }
    }
}
