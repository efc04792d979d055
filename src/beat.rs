// PulseWatch - Beat-Edge Detector
//
// Periodic beat amplitude (PBA) detector for the IR channel:
//   1. Track the DC level with a slow integer IIR.
//   2. Low-pass the AC part with a 23-tap symmetric FIR (12 unique taps).
//   3. Report a beat on each rising zero crossing whose preceding
//      peak-to-trough swing looks like a pulse rather than noise or motion.

use crate::config::SENSOR_SAMPLE_MAX;

/// Consumes IR samples one at a time and flags heartbeat edges.
pub trait BeatDetector {
    /// Returns `true` exactly on the sample where a beat edge is seen.
    fn on_sample(&mut self, ir: u32) -> bool;
}

const FIR_COEFFS: [i32; 12] = [
    172, 321, 579, 927, 1360, 1858, 2390, 2916, 3391, 3768, 4012, 4096,
];
const FIR_BUFFER_LEN: usize = 32;
const FIR_MASK: usize = FIR_BUFFER_LEN - 1;

/// Peak-to-trough swing (filtered units) accepted as a pulse, exclusive.
const SWING_MIN: i32 = 20;
const SWING_MAX: i32 = 1000;

#[derive(Debug, Clone)]
pub struct PbaBeatDetector {
    dc_reg: i64,
    fir_buf: [i32; FIR_BUFFER_LEN],
    fir_offset: usize,

    ac_current: i32,
    ac_previous: i32,
    ac_max: i32,
    ac_min: i32,
    cycle_max: i32,
    cycle_min: i32,
    positive_edge: bool,
    negative_edge: bool,
}

impl PbaBeatDetector {
    pub fn new() -> Self {
        Self {
            dc_reg: 0,
            fir_buf: [0; FIR_BUFFER_LEN],
            fir_offset: 0,
            ac_current: 0,
            ac_previous: 0,
            ac_max: SWING_MIN,
            ac_min: -SWING_MIN,
            cycle_max: 0,
            cycle_min: 0,
            positive_edge: false,
            negative_edge: false,
        }
    }

    /// Current DC estimate in raw IR counts.
    pub fn dc_level(&self) -> i64 {
        self.dc_reg >> 15
    }

    fn estimate_dc(&mut self, x: u32) -> i32 {
        self.dc_reg += ((i64::from(x) << 15) - self.dc_reg) >> 4;
        (self.dc_reg >> 15) as i32
    }

    fn low_pass(&mut self, din: i32) -> i32 {
        let o = self.fir_offset;
        self.fir_buf[o] = din;

        let at = |back: usize| self.fir_buf[(o + FIR_BUFFER_LEN - back) & FIR_MASK];
        let mut z = i64::from(FIR_COEFFS[11]) * i64::from(at(11));
        for (i, &c) in FIR_COEFFS[..11].iter().enumerate() {
            z += i64::from(c) * (i64::from(at(i)) + i64::from(at(22 - i)));
        }

        self.fir_offset = (o + 1) & FIR_MASK;
        (z >> 15) as i32
    }
}

impl Default for PbaBeatDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BeatDetector for PbaBeatDetector {
    fn on_sample(&mut self, ir: u32) -> bool {
        let mut beat = false;
        // Nothing above the ADC full scale is a real reading.
        let ir = ir.min(SENSOR_SAMPLE_MAX);

        self.ac_previous = self.ac_current;
        let dc = self.estimate_dc(ir);
        self.ac_current = self.low_pass(ir as i32 - dc);

        // Rising zero crossing: close the cycle and judge its swing.
        if self.ac_previous < 0 && self.ac_current >= 0 {
            self.ac_max = self.cycle_max;
            self.ac_min = self.cycle_min;
            self.positive_edge = true;
            self.negative_edge = false;
            self.cycle_max = 0;

            let swing = self.ac_max - self.ac_min;
            if swing > SWING_MIN && swing < SWING_MAX {
                beat = true;
            }
        }

        // Falling zero crossing.
        if self.ac_previous > 0 && self.ac_current <= 0 {
            self.positive_edge = false;
            self.negative_edge = true;
            self.cycle_min = 0;
        }

        if self.positive_edge && self.ac_current > self.ac_previous {
            self.cycle_max = self.ac_current;
        }
        if self.negative_edge && self.ac_current < self.ac_previous {
            self.cycle_min = self.ac_current;
        }

        beat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One triangle pulse period of `period` samples with the given
    /// peak-to-peak swing around `dc`.
    fn triangle(k: usize, period: usize, dc: u32, swing: u32) -> u32 {
        let phase = k % period;
        let half = period / 2;
        let rise = if phase < half { phase } else { period - phase };
        dc - swing / 2 + (swing as usize * rise / half) as u32
    }

    #[test]
    fn flat_signal_never_beats() {
        let mut det = PbaBeatDetector::new();
        let beats = (0..500).filter(|_| det.on_sample(50_000)).count();
        assert_eq!(beats, 0);
    }

    #[test]
    fn periodic_pulse_beats_once_per_period() {
        let mut det = PbaBeatDetector::new();
        let period = 25;

        // Let the DC estimator settle before counting.
        for k in 0..400 {
            det.on_sample(triangle(k, period, 50_000, 400));
        }
        let beats = (400..400 + 10 * period)
            .filter(|&k| det.on_sample(triangle(k, period, 50_000, 400)))
            .count();

        assert!((9..=11).contains(&beats), "got {} beats in 10 periods", beats);
    }

    #[test]
    fn dc_tracks_input_level() {
        let mut det = PbaBeatDetector::new();
        for _ in 0..400 {
            det.on_sample(30_000);
        }
        assert!((det.dc_level() - 30_000).abs() <= 1);
    }

    #[test]
    fn readings_past_full_scale_are_clamped() {
        let mut wide = PbaBeatDetector::new();
        let mut full = PbaBeatDetector::new();
        for k in 0..500 {
            let hi = k % 2 == 0;
            let a = wide.on_sample(if hi { u32::MAX } else { 0 });
            let b = full.on_sample(if hi { SENSOR_SAMPLE_MAX } else { 0 });
            assert_eq!(a, b, "sample {}", k);
        }
        assert_eq!(wide.dc_level(), full.dc_level());

        for _ in 0..400 {
            wide.on_sample(u32::MAX);
        }
        assert!(wide.dc_level() <= i64::from(SENSOR_SAMPLE_MAX));
        assert!(wide.dc_level() > i64::from(SENSOR_SAMPLE_MAX) - 16);
    }
}
