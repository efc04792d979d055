// PulseWatch - Sample Window
//
// Fixed 100-entry history of (IR, red) pairs handed to the SpO2 estimator.
// Index 0 is the oldest sample.  New batches are written into the tail
// region and the whole window slides left by one batch after every
// recompute.

use crate::config::*;
use crate::events::Sample;

/// First slot of the region a fresh batch is written into.
pub const TAIL_START: usize = WINDOW_SIZE - BATCH_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleWindow {
    ir: [u32; WINDOW_SIZE],
    red: [u32; WINDOW_SIZE],
}

impl SampleWindow {
    /// Zero-filled window, as at power-up.
    pub fn new() -> Self {
        Self {
            ir: [0; WINDOW_SIZE],
            red: [0; WINDOW_SIZE],
        }
    }

    pub const fn len(&self) -> usize {
        WINDOW_SIZE
    }

    pub fn get(&self, index: usize) -> Option<Sample> {
        if index < WINDOW_SIZE {
            Some(Sample::new(self.ir[index], self.red[index]))
        } else {
            None
        }
    }

    /// Write the `offset`-th sample of the current batch into the tail.
    /// Returns the window slot that was written, or `None` (and writes
    /// nothing) when `offset` lies past the end of a batch.
    pub fn write_tail(&mut self, offset: usize, sample: Sample) -> Option<usize> {
        if offset >= BATCH_SIZE {
            return None;
        }
        let slot = TAIL_START + offset;
        self.ir[slot] = sample.ir;
        self.red[slot] = sample.red;
        Some(slot)
    }

    /// Drop the oldest batch: slots `[BATCH_SIZE, WINDOW_SIZE)` move to
    /// `[0, TAIL_START)`.  The tail keeps its old contents until the next
    /// batch overwrites it.
    pub fn shift(&mut self) {
        self.ir.copy_within(BATCH_SIZE.., 0);
        self.red.copy_within(BATCH_SIZE.., 0);
    }

    pub fn ir(&self) -> &[u32; WINDOW_SIZE] {
        &self.ir
    }

    pub fn red(&self) -> &[u32; WINDOW_SIZE] {
        &self.red
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered() -> SampleWindow {
        let mut window = SampleWindow::new();
        for i in 0..WINDOW_SIZE {
            window.ir[i] = i as u32;
            window.red[i] = 1000 + i as u32;
        }
        window
    }

    #[test]
    fn starts_zero_filled() {
        let window = SampleWindow::new();
        assert_eq!(window.len(), WINDOW_SIZE);
        assert!(window.ir().iter().all(|&v| v == 0));
        assert!(window.red().iter().all(|&v| v == 0));
    }

    #[test]
    fn tail_writes_land_after_history() {
        let mut window = SampleWindow::new();
        assert_eq!(window.write_tail(0, Sample::new(8000, 6000)), Some(75));
        assert_eq!(window.write_tail(24, Sample::new(8100, 6100)), Some(99));
        assert_eq!(window.get(75), Some(Sample::new(8000, 6000)));
        assert_eq!(window.get(99), Some(Sample::new(8100, 6100)));
        assert_eq!(window.get(74), Some(Sample::default()));
        assert_eq!(window.get(100), None);
    }

    #[test]
    fn offset_past_batch_writes_nothing() {
        let mut window = numbered();
        let before = window.clone();
        assert_eq!(window.write_tail(BATCH_SIZE, Sample::new(1, 1)), None);
        assert_eq!(window, before);
    }

    #[test]
    fn shift_moves_newest_75_to_front() {
        let mut window = numbered();
        let before = window.clone();
        window.shift();

        assert_eq!(window.len(), WINDOW_SIZE);
        for i in 0..TAIL_START {
            assert_eq!(window.get(i), before.get(i + BATCH_SIZE));
        }
        // Tail is left as-is for the next batch to overwrite.
        for i in TAIL_START..WINDOW_SIZE {
            assert_eq!(window.get(i), before.get(i));
        }
    }
}
