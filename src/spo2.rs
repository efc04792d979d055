// PulseWatch - SpO2 / Heart-Rate Estimator
//
// Window-based estimator after Maxim's reference design for the MAX3010x:
//   * heart rate from the spacing of IR valleys (found as peaks of the
//     inverted, DC-free, 4-point averaged IR signal);
//   * SpO2 from the median red/IR ratio of AC/DC components measured
//     between consecutive valleys, mapped through Maxim's calibration curve.
//
// The estimator is swappable behind `Spo2Estimator` so the monitor can be
// exercised with scripted results.

use crate::config::*;
use crate::events::Estimate;

pub trait Spo2Estimator {
    fn estimate(&mut self, ir: &[u32; WINDOW_SIZE], red: &[u32; WINDOW_SIZE]) -> Estimate;
}

const MA_SIZE: usize = 4;
const THRESHOLD_MIN: i32 = 30;
const THRESHOLD_MAX: i32 = 60;
const MIN_PEAK_DISTANCE: usize = 4;
const MAX_PEAKS: usize = 15;
const MAX_RATIOS: usize = 5;
/// Valid ratio range (ratio x 100), both ends exclusive.
const RATIO_MIN: i64 = 2;
const RATIO_MAX: i64 = 184;

#[derive(Debug, Clone, Copy)]
pub struct MaximEstimator {
    sample_rate_hz: i32,
}

impl MaximEstimator {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            sample_rate_hz: sample_rate_hz as i32,
        }
    }

    fn heart_rate(&self, valleys: &[usize]) -> (i32, bool) {
        if valleys.len() < 2 {
            return (ESTIMATE_INVALID, false);
        }
        let span: usize = valleys.windows(2).map(|w| w[1] - w[0]).sum();
        let interval = (span / (valleys.len() - 1)) as i32;
        if interval == 0 {
            return (ESTIMATE_INVALID, false);
        }
        (self.sample_rate_hz * 60 / interval, true)
    }
}

impl Default for MaximEstimator {
    fn default() -> Self {
        Self::new(EFFECTIVE_SAMPLE_RATE_HZ)
    }
}

impl Spo2Estimator for MaximEstimator {
    fn estimate(&mut self, ir: &[u32; WINDOW_SIZE], red: &[u32; WINDOW_SIZE]) -> Estimate {
        let ir = clamp_to_adc(ir);
        let red = clamp_to_adc(red);

        let valleys = ir_valleys(&ir);
        let (heart_rate, heart_rate_valid) = self.heart_rate(&valleys);
        let (spo2, spo2_valid) = match median_ratio(&ir, &red, &valleys) {
            Some(ratio) if ratio > RATIO_MIN && ratio < RATIO_MAX => (spo2_from_ratio(ratio), true),
            _ => (ESTIMATE_INVALID, false),
        };

        log::debug!(
            "Estimator: {} valleys, ratio-derived SpO2 {} ({}), HR {} ({})",
            valleys.len(),
            spo2,
            spo2_valid,
            heart_rate,
            heart_rate_valid
        );

        Estimate {
            spo2,
            spo2_valid,
            heart_rate,
            heart_rate_valid,
        }
    }
}

/// Copy of `window` limited to the 18-bit ADC range.
fn clamp_to_adc(window: &[u32; WINDOW_SIZE]) -> [u32; WINDOW_SIZE] {
    window.map(|v| v.min(SENSOR_SAMPLE_MAX))
}

// ---------------------------------------------------------------------------
// Valley detection
// ---------------------------------------------------------------------------

/// Indices of IR valleys, ascending.
fn ir_valleys(ir: &[u32; WINDOW_SIZE]) -> Vec<usize> {
    let mean = (ir.iter().map(|&v| i64::from(v)).sum::<i64>() / WINDOW_SIZE as i64) as i32;

    // Remove DC and invert so valleys become peaks.
    let mut x = [0i32; WINDOW_SIZE];
    for (dst, &v) in x.iter_mut().zip(ir.iter()) {
        *dst = mean - v as i32;
    }
    for k in 0..WINDOW_SIZE - MA_SIZE {
        x[k] = x[k..k + MA_SIZE].iter().sum::<i32>() / MA_SIZE as i32;
    }

    let threshold = (x.iter().sum::<i32>() / WINDOW_SIZE as i32).clamp(THRESHOLD_MIN, THRESHOLD_MAX);

    let peaks = peaks_above(&x, threshold, MAX_PEAKS);
    remove_close_peaks(&x, peaks, MIN_PEAK_DISTANCE)
}

/// Local maxima strictly above `min_height`; a flat top counts once, at its
/// first sample.
fn peaks_above(x: &[i32], min_height: i32, max_count: usize) -> Vec<usize> {
    let mut peaks = Vec::with_capacity(max_count);
    let mut i = 1;

    while i + 1 < x.len() {
        if x[i] > min_height && x[i] > x[i - 1] {
            let mut width = 1;
            while i + width < x.len() && x[i] == x[i + width] {
                width += 1;
            }
            if i + width < x.len() && x[i] > x[i + width] && peaks.len() < max_count {
                peaks.push(i);
                i += width + 1;
            } else {
                i += width;
            }
        } else {
            i += 1;
        }
    }
    peaks
}

/// Keep the tallest peaks, dropping any within `min_distance` samples of a
/// taller one.  Result is sorted by index.
fn remove_close_peaks(x: &[i32], mut peaks: Vec<usize>, min_distance: usize) -> Vec<usize> {
    peaks.sort_by(|&a, &b| x[b].cmp(&x[a]));

    let mut kept: Vec<usize> = Vec::with_capacity(peaks.len());
    for p in peaks {
        if kept.iter().all(|&k| p.abs_diff(k) > min_distance) {
            kept.push(p);
        }
    }
    kept.sort_unstable();
    kept
}

// ---------------------------------------------------------------------------
// SpO2 ratio
// ---------------------------------------------------------------------------

/// Median of the per-beat (AC_red / DC_red) / (AC_ir / DC_ir) ratios, x100.
fn median_ratio(ir: &[u32; WINDOW_SIZE], red: &[u32; WINDOW_SIZE], valleys: &[usize]) -> Option<i64> {
    let mut ratios: Vec<i64> = Vec::with_capacity(MAX_RATIOS);

    for pair in valleys.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo <= 3 {
            continue;
        }

        let (ir_ac, ir_dc) = ac_dc(ir, lo, hi);
        let (red_ac, red_dc) = ac_dc(red, lo, hi);

        let nume = (red_ac * ir_dc) >> 7;
        let denom = (ir_ac * red_dc) >> 7;
        if denom > 0 && nume != 0 && ratios.len() < MAX_RATIOS {
            ratios.push(nume * 100 / denom);
        }
    }

    if ratios.is_empty() {
        return None;
    }
    ratios.sort_unstable();
    let mid = ratios.len() / 2;
    if mid > 1 {
        Some((ratios[mid - 1] + ratios[mid]) / 2)
    } else {
        Some(ratios[mid])
    }
}

/// AC amplitude and DC level of one cardiac cycle between valleys `lo` and
/// `hi`: the maximum minus the straight valley-to-valley baseline under it.
fn ac_dc(signal: &[u32; WINDOW_SIZE], lo: usize, hi: usize) -> (i64, i64) {
    let (max_idx, dc) = signal[lo..hi]
        .iter()
        .enumerate()
        .fold((lo, i64::MIN), |(best_i, best), (off, &v)| {
            if i64::from(v) > best {
                (lo + off, i64::from(v))
            } else {
                (best_i, best)
            }
        });

    let start = i64::from(signal[lo]);
    let end = i64::from(signal[hi]);
    let baseline = start + (end - start) * (max_idx - lo) as i64 / (hi - lo) as i64;
    (dc - baseline, dc)
}

/// Maxim's calibration curve, `-45.060 r^2 + 30.354 r + 94.845` with
/// `r = ratio / 100`, clamped to a percentage.
fn spo2_from_ratio(ratio: i64) -> i32 {
    let r = ratio as f32 / 100.0;
    let spo2 = -45.060 * r * r + 30.354 * r + 94.845;
    spo2.clamp(0.0, 100.0) as i32
}
