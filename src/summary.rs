//! Everything that outlives a single event

use std::ops::AddAssign;

use tracing::info;

use crate::calibration::CalibrationReport;
use crate::config::analysis::HistogramConfig;
use crate::cutflow::{group_digits, Cutflow};
use crate::histograms::Histograms;
use crate::overlap::OverlapTallies;

/// Run-level accumulators. Each worker of a parallel run owns one; they are
/// merged with `+=` at the end.
#[derive(Clone)]
pub struct RunSummary {
    pub cutflow    : Cutflow,
    pub overlap    : OverlapTallies,
    pub calibration: CalibrationReport,
    pub histograms : Histograms,
    /// Events abandoned because of an `EventError`
    pub failed     : u64,
}

impl RunSummary {

    pub fn new(histograms: &HistogramConfig) -> Self {
        Self {
            cutflow    : Cutflow::default(),
            overlap    : OverlapTallies::default(),
            calibration: CalibrationReport::default(),
            histograms : Histograms::new(histograms),
            failed     : 0,
        }
    }

    /// Write the run-end summary to the log
    pub fn report(&self) {
        for (gate, n) in self.cutflow.rows() {
            info!(gate = gate.label(), events = %group_digits(n), "cutflow");
        }
        self.overlap.report();
        let CalibrationReport { applied, out_of_range, errors } = self.calibration;
        info!(applied, out_of_range, errors, "calibration");
        info!(selected = self.cutflow.selected(), failed = self.failed, "events");
    }
}

impl AddAssign<&Self> for RunSummary {
    fn add_assign(&mut self, rhs: &Self) {
        self.cutflow     += &rhs.cutflow;
        self.overlap     += &rhs.overlap;
        self.calibration += &rhs.calibration;
        self.histograms  += &rhs.histograms;
        self.failed      += rhs.failed;
    }
}
