//! Distributions of selected events

use std::f64::consts::PI;

use ndhistogram::{axis::{Uniform, UniformCyclic as Cyclic}, Histogram, HistND, ndhistogram};
use units::{gev_, Energy};

use crate::config::analysis::{EnergyAxis, HistogramConfig};
use crate::met::MetTerm;
use crate::record::Jet;

type EnergyHist = HistND<(Uniform<f64>,), usize>;
type AngleHist  = HistND<(Cyclic <f64>,), usize>;

/// Energies are binned in GeV. Entries outside the axis range land in the
/// under/overflow bins.
#[derive(Clone)]
pub struct Histograms {
    pub jet_pt : EnergyHist,
    pub met_x  : EnergyHist,
    pub met_y  : EnergyHist,
    pub met    : EnergyHist,
    pub sumet  : EnergyHist,
    pub met_phi: AngleHist,
}

fn energy_hist(axis: &EnergyAxis) -> EnergyHist {
    ndhistogram!(Uniform::new(axis.bins, gev_(axis.min), gev_(axis.max)); usize)
}

impl Histograms {

    pub fn new(config: &HistogramConfig) -> Self {
        Self {
            jet_pt : energy_hist(&config.jet_pt),
            met_x  : energy_hist(&config.met_xy),
            met_y  : energy_hist(&config.met_xy),
            met    : energy_hist(&config.met),
            sumet  : energy_hist(&config.sumet),
            met_phi: ndhistogram!(Cyclic::new(config.met_phi_bins, -PI, PI); usize),
        }
    }

    /// One entry per signal jet, one entry per event in each MET histogram
    pub fn fill<'j>(&mut self, signal_jets: impl IntoIterator<Item = &'j Jet>, met: &MetTerm) {
        for jet in signal_jets { self.jet_pt.fill(&gev_(jet.pt())) }
        self.met_x  .fill(&gev_(met.mpx));
        self.met_y  .fill(&gev_(met.mpy));
        self.met    .fill(&gev_(met.met()));
        self.sumet  .fill(&gev_(met.sumet));
        self.met_phi.fill(&met.phi());
    }

    /// Number of events filled
    pub fn entries(&self) -> usize { total(&self.met) }
}

/// Sum of all bins, including under/overflow
pub fn total<H: Histogram<A, usize>, A: ndhistogram::axis::Axis>(h: &H) -> usize {
    h.values().sum()
}

/// Content of the bin containing `energy`
pub fn content(h: &EnergyHist, energy: Energy) -> usize { h.value(&gev_(energy)).copied().unwrap_or(0) }

impl std::ops::AddAssign<&Histograms> for Histograms {
    fn add_assign(&mut self, rhs: &Self) {
        self.jet_pt  += &rhs.jet_pt;
        self.met_x   += &rhs.met_x;
        self.met_y   += &rhs.met_y;
        self.met     += &rhs.met;
        self.sumet   += &rhs.sumet;
        self.met_phi += &rhs.met_phi;
    }
}
