// PulseWatch - Window-Refill Coordinator
//
// Collects batches of 25 fresh samples into the window tail.  Only a batch
// that completes without losing the finger triggers an SpO2 recompute over
// the full 100-sample window, after which the window slides by one batch.

use crate::config::*;
use crate::events::{Estimate, EstimateState, Sample};
use crate::spo2::Spo2Estimator;
use crate::window::SampleWindow;

#[derive(Debug, Clone, Default)]
pub struct RefillCoordinator {
    window: SampleWindow,
}

impl RefillCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn in_batch(state: &EstimateState) -> bool {
        state.acquired > 0
    }

    pub fn is_complete(state: &EstimateState) -> bool {
        state.acquired >= BATCH_SIZE
    }

    /// Store `sample` in the next free tail slot.  The sample only counts
    /// toward the batch once [`commit`](Self::commit) is called.  `None`
    /// means the batch is already full and nothing was stored.
    pub fn push(&mut self, sample: Sample, state: &EstimateState) -> Option<usize> {
        self.window.write_tail(state.acquired, sample)
    }

    pub fn commit(&mut self, state: &mut EstimateState) {
        state.acquired += 1;
    }

    /// Give up on a short batch.  Whatever was written stays in the tail and
    /// is overwritten by the next batch, which starts from the same slot.
    pub fn abandon(&mut self, state: &mut EstimateState) {
        if state.acquired > 0 {
            log::debug!("Batch abandoned after {} of {} samples", state.acquired, BATCH_SIZE);
        }
        state.acquired = 0;
    }

    /// Run the estimator over the whole window, publish the result and slide
    /// the window forward.
    pub fn recompute<E: Spo2Estimator + ?Sized>(
        &mut self,
        estimator: &mut E,
        state: &mut EstimateState,
    ) -> Estimate {
        let estimate = estimator.estimate(self.window.ir(), self.window.red());

        state.spo2 = if estimate.spo2_valid { estimate.spo2 } else { 0 };
        state.spo2_valid = estimate.spo2_valid;
        state.heart_rate = estimate.heart_rate;
        state.heart_rate_valid = estimate.heart_rate_valid;

        log::info!(
            "SpO2 {}% (valid: {}), HR {} (valid: {})",
            state.spo2,
            estimate.spo2_valid,
            estimate.heart_rate,
            estimate.heart_rate_valid
        );

        self.window.shift();
        state.acquired = 0;
        estimate
    }
}
