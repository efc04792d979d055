// PulseWatch - Beat-to-BPM Estimator
//
// Turns beat-edge timestamps into an instantaneous BPM, drops implausible
// readings and keeps a 4-entry moving average.  The history starts
// zero-filled and the average always divides by the full capacity, so the
// first few readings after power-up are biased low.

use crate::config::*;
use crate::events::EstimateState;

// ---------------------------------------------------------------------------
// Rate history (circular, fixed capacity)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateHistory {
    rates: [u8; RATE_HISTORY_SIZE],
    spot: usize,
}

impl RateHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bpm: u8) {
        self.rates[self.spot] = bpm;
        self.spot = (self.spot + 1) % RATE_HISTORY_SIZE;
    }

    /// Mean of every slot, unfilled ones included.
    pub fn average(&self) -> u32 {
        let sum: u32 = self.rates.iter().map(|&r| u32::from(r)).sum();
        sum / RATE_HISTORY_SIZE as u32
    }

    pub fn slots(&self) -> &[u8; RATE_HISTORY_SIZE] {
        &self.rates
    }

    pub fn cursor(&self) -> usize {
        self.spot
    }
}

// ---------------------------------------------------------------------------
// Beat handling
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BeatOutcome {
    /// Reading stored; carries the value written to the history.
    Accepted(u8),
    /// Outside (20, 255) BPM; history untouched.
    Implausible(f32),
    /// Two beats on the same millisecond.
    ZeroInterval,
}

#[derive(Debug, Clone, Default)]
pub struct BeatRateEstimator {
    history: RateHistory,
    last_beat_ms: u32,
}

impl BeatRateEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &RateHistory {
        &self.history
    }

    pub fn last_beat_ms(&self) -> u32 {
        self.last_beat_ms
    }

    /// Register a beat detected at `now_ms` (milliseconds since boot).
    pub fn on_beat(&mut self, now_ms: u32, state: &mut EstimateState) -> BeatOutcome {
        let delta = now_ms.wrapping_sub(self.last_beat_ms);
        self.last_beat_ms = now_ms;

        if delta == 0 {
            log::debug!("Beat at {} ms repeats the previous timestamp, ignored", now_ms);
            return BeatOutcome::ZeroInterval;
        }

        let bpm = 60.0 / (delta as f32 / 1000.0);
        if !(bpm > BPM_MIN_EXCLUSIVE && bpm < BPM_MAX_EXCLUSIVE) {
            log::debug!("Skipping {:.1} BPM ({} ms between beats)", bpm, delta);
            return BeatOutcome::Implausible(bpm);
        }

        let reading = bpm as u8;
        self.history.push(reading);
        state.beat_avg = self.history.average();
        log::debug!("Beat: {} BPM, average {}", reading, state.beat_avg);

        BeatOutcome::Accepted(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_second_apart_is_sixty() {
        let mut est = BeatRateEstimator::new();
        let mut state = EstimateState::new();

        assert_eq!(est.on_beat(1000, &mut state), BeatOutcome::Accepted(60));
        assert_eq!(est.history().slots(), &[60, 0, 0, 0]);
        // Unfilled slots still count toward the mean.
        assert_eq!(state.beat_avg, 15);
    }

    #[test]
    fn cursor_wraps_after_capacity() {
        let mut est = BeatRateEstimator::new();
        let mut state = EstimateState::new();

        // 500 ms intervals -> 120 BPM
        for i in 1..=5u32 {
            est.on_beat(i * 500, &mut state);
        }
        assert_eq!(est.history().cursor(), 1);
        assert_eq!(est.history().slots(), &[120, 120, 120, 120]);
        assert_eq!(state.beat_avg, 120);
    }

    #[test]
    fn implausible_rates_never_enter_history() {
        let mut est = BeatRateEstimator::new();
        let mut state = EstimateState::new();
        est.on_beat(1000, &mut state);
        let before = (est.history().clone(), state.beat_avg);

        // 3000 ms -> 20 BPM (boundary, excluded)
        assert!(matches!(est.on_beat(4000, &mut state), BeatOutcome::Implausible(_)));
        // 200 ms -> 300 BPM
        assert!(matches!(est.on_beat(4200, &mut state), BeatOutcome::Implausible(_)));
        // 10 ms -> 6000 BPM
        assert!(matches!(est.on_beat(4210, &mut state), BeatOutcome::Implausible(_)));

        assert_eq!((est.history().clone(), state.beat_avg), before);
    }

    #[test]
    fn only_intervals_inside_the_plausible_band_are_stored() {
        let mut seeded = BeatRateEstimator::new();
        let mut seeded_state = EstimateState::new();
        seeded.on_beat(1000, &mut seeded_state);

        for delta in 1..=10_000u32 {
            let mut est = seeded.clone();
            let mut state = seeded_state.clone();
            let outcome = est.on_beat(1000 + delta, &mut state);

            // 60000 / delta strictly inside (20, 255) BPM.
            let plausible = delta * 255 > 60_000 && delta * 20 < 60_000;
            if plausible {
                assert!(matches!(outcome, BeatOutcome::Accepted(_)), "delta {} ms: {:?}", delta, outcome);
                assert_eq!(est.history().cursor(), 2, "delta {} ms", delta);
                assert_eq!(state.beat_avg, est.history().average(), "delta {} ms", delta);
            } else {
                assert!(matches!(outcome, BeatOutcome::Implausible(_)), "delta {} ms: {:?}", delta, outcome);
                assert_eq!(est.history(), seeded.history(), "delta {} ms", delta);
                assert_eq!(state.beat_avg, seeded_state.beat_avg, "delta {} ms", delta);
            }
        }
    }

    #[test]
    fn upper_bound_is_exclusive() {
        let mut est = BeatRateEstimator::new();
        let mut state = EstimateState::new();
        est.on_beat(1000, &mut state);

        // 236 ms -> 254.2 BPM, accepted and truncated
        assert_eq!(est.on_beat(1236, &mut state), BeatOutcome::Accepted(254));
        // 235 ms -> 255.3 BPM, rejected
        assert!(matches!(est.on_beat(1471, &mut state), BeatOutcome::Implausible(_)));
    }

    #[test]
    fn zero_interval_is_discarded() {
        let mut est = BeatRateEstimator::new();
        let mut state = EstimateState::new();
        est.on_beat(1000, &mut state);

        assert_eq!(est.on_beat(1000, &mut state), BeatOutcome::ZeroInterval);
        assert_eq!(est.history().slots(), &[60, 0, 0, 0]);
        assert_eq!(est.last_beat_ms(), 1000);
    }

    #[test]
    fn interval_survives_clock_wrap() {
        let mut est = BeatRateEstimator::new();
        let mut state = EstimateState::new();
        est.last_beat_ms = u32::MAX - 499;

        assert_eq!(est.on_beat(500, &mut state), BeatOutcome::Accepted(60));
    }
}
