// PulseWatch - Samples, Estimates & Running State

// ---------------------------------------------------------------------------
// Sensor Sample (one MAX30102 FIFO entry)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sample {
    pub ir: u32,
    pub red: u32,
}

impl Sample {
    pub const fn new(ir: u32, red: u32) -> Self {
        Self { ir, red }
    }
}

// ---------------------------------------------------------------------------
// Finger presence
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    pub fn is_present(self) -> bool {
        self == Self::Present
    }
}

// ---------------------------------------------------------------------------
// SpO2 / heart-rate estimator output
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    pub spo2: i32,
    pub spo2_valid: bool,
    pub heart_rate: i32,
    pub heart_rate_valid: bool,
}

impl Estimate {
    pub const INVALID: Self = Self {
        spo2: crate::config::ESTIMATE_INVALID,
        spo2_valid: false,
        heart_rate: crate::config::ESTIMATE_INVALID,
        heart_rate_valid: false,
    };
}

// ---------------------------------------------------------------------------
// Running estimate state - owned by the monitor, lent to every component
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EstimateState {
    /// Moving average over the rate history (0 while no finger).
    pub beat_avg: u32,
    /// Last reported SpO2; forced to 0 when the estimator flags it invalid.
    pub spo2: i32,
    pub spo2_valid: bool,
    /// Estimator heart rate (not displayed, kept for logging).
    pub heart_rate: i32,
    pub heart_rate_valid: bool,
    pub finger_present: bool,
    /// Samples collected in the current batch.
    pub acquired: usize,
}

impl EstimateState {
    pub fn new() -> Self {
        Self::default()
    }
}
