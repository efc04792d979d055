// PulseWatch - Finger-Presence Gate
//
// Raw IR intensity above the threshold means tissue is on the sensor.
// Re-evaluated on every sample; the only memory is the flag kept in the
// running state (used to log transitions).

use crate::config::*;
use crate::events::{EstimateState, Presence};

#[derive(Debug, Clone, Copy)]
pub struct FingerGate {
    threshold: u32,
}

impl FingerGate {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn classify(&self, ir: u32) -> Presence {
        if ir > self.threshold {
            Presence::Present
        } else {
            Presence::Absent
        }
    }

    /// True when an open batch must be given up: `ir` fell below the
    /// threshold.  A sample sitting exactly on it keeps the batch going.
    pub fn dropped(&self, ir: u32) -> bool {
        ir < self.threshold
    }

    /// Classify `ir` and record the result.  Losing the finger zeroes the
    /// displayed BPM average; the rate history itself is left untouched.
    pub fn apply(&self, ir: u32, state: &mut EstimateState) -> Presence {
        let presence = self.classify(ir);

        if presence.is_present() != state.finger_present {
            match presence {
                Presence::Present => log::info!("Finger detected (IR {})", ir),
                Presence::Absent => log::info!("Finger removed (IR {})", ir),
            }
        }
        state.finger_present = presence.is_present();

        if presence == Presence::Absent {
            state.beat_avg = 0;
        }
        presence
    }
}

impl Default for FingerGate {
    fn default() -> Self {
        Self::new(FINGER_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_exclusive() {
        let gate = FingerGate::default();
        assert_eq!(gate.classify(7001), Presence::Present);
        assert_eq!(gate.classify(7000), Presence::Absent);
        assert_eq!(gate.classify(0), Presence::Absent);
    }

    #[test]
    fn batch_exit_is_strictly_below_threshold() {
        let gate = FingerGate::default();
        assert!(gate.dropped(6999));
        assert!(!gate.dropped(7000));
        assert!(!gate.dropped(7001));
    }

    #[test]
    fn absence_resets_average_only() {
        let gate = FingerGate::default();
        let mut state = EstimateState {
            beat_avg: 72,
            spo2: 97,
            spo2_valid: true,
            finger_present: true,
            ..EstimateState::new()
        };

        assert_eq!(gate.apply(5000, &mut state), Presence::Absent);
        assert_eq!(state.beat_avg, 0);
        assert!(!state.finger_present);
        assert_eq!(state.spo2, 97);
    }

    #[test]
    fn presence_keeps_average() {
        let gate = FingerGate::default();
        let mut state = EstimateState {
            beat_avg: 72,
            ..EstimateState::new()
        };

        assert_eq!(gate.apply(9000, &mut state), Presence::Present);
        assert_eq!(state.beat_avg, 72);
        assert!(state.finger_present);
    }
}
