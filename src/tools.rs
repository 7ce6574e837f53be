//! Interfaces to the correction and decision tools consulted by the
//! selection, plus simple concrete implementations of each.
//!
//! Closures implement both `Correction` and `Accept`, which is how tests and
//! ad-hoc studies plug in behaviour. Correction closures never draw random
//! numbers, so they ignore the event's generator.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use units::{gev, ratio_, Energy};

use crate::record::{
    ElectronInfo, Jet, JetInfo, MuonInfo, ObjectInfo, Particle, PhotonInfo, Quality, TauInfo,
};

/// Outcome of applying a correction to one object
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectionCode {
    Ok,
    /// The object lies outside the region where the correction is defined
    OutOfValidityRange,
    Error,
}

/// Modifies the kinematics of an object in place.
///
/// Stochastic corrections must draw only from `rng`, which is seeded per
/// event, so that results do not depend on how events are spread over threads.
pub trait Correction<I>: Send + Sync {
    fn name(&self) -> &str { "correction" }
    fn apply(&self, object: &mut Particle<I>, rng: &mut StdRng) -> CorrectionCode;
}

impl<I, F> Correction<I> for F
where
    F: Fn(&mut Particle<I>) -> CorrectionCode + Send + Sync,
{
    fn apply(&self, object: &mut Particle<I>, _rng: &mut StdRng) -> CorrectionCode { self(object) }
}

/// Yes/no decision about an object
pub trait Accept<I>: Send + Sync {
    fn accept(&self, object: &Particle<I>) -> bool;
}

impl<I, F> Accept<I> for F
where
    F: Fn(&Particle<I>) -> bool + Send + Sync,
{
    fn accept(&self, object: &Particle<I>) -> bool { self(object) }
}

// ----- Corrections --------------------------------------------------------------------------------

/// Multiplicative momentum-scale correction, defined in a window of pt and |η|
#[derive(Clone, Debug)]
pub struct MomentumScale {
    pub name   : String,
    pub factor : f64,
    pub pt_min : Energy,
    pub pt_max : Energy,
    pub eta_max: f64,
}

impl<I: ObjectInfo> Correction<I> for MomentumScale {
    fn name(&self) -> &str { &self.name }

    fn apply(&self, object: &mut Particle<I>, _rng: &mut StdRng) -> CorrectionCode {
        let pt = object.pt();
        if pt < self.pt_min || pt > self.pt_max || object.eta().abs() > self.eta_max {
            return CorrectionCode::OutOfValidityRange
        }
        if !self.factor.is_finite() || self.factor <= 0.0 { return CorrectionCode::Error }
        object.p4.scale(self.factor);
        CorrectionCode::Ok
    }
}

/// Gaussian smearing of the momentum, relative width `sigma`. Simulation only.
#[derive(Clone, Debug)]
pub struct ResolutionSmearing {
    pub name : String,
    pub sigma: f64,
}

impl<I: ObjectInfo> Correction<I> for ResolutionSmearing {
    fn name(&self) -> &str { &self.name }

    fn apply(&self, object: &mut Particle<I>, rng: &mut StdRng) -> CorrectionCode {
        let Ok(dist) = Normal::new(1.0, self.sigma) else { return CorrectionCode::Error };
        let factor: f64 = dist.sample(rng);
        // A non-positive factor would flip the direction
        if factor <= 0.0 { return CorrectionCode::OutOfValidityRange }
        object.p4.scale(factor);
        CorrectionCode::Ok
    }
}

// ----- Identification -----------------------------------------------------------------------------

/// Types carrying an identification working point
pub trait Identified { fn quality(&self) -> Quality; }

impl Identified for ElectronInfo { fn quality(&self) -> Quality { self.id      } }
impl Identified for MuonInfo     { fn quality(&self) -> Quality { self.quality } }
impl Identified for TauInfo      { fn quality(&self) -> Quality { self.id      } }
impl Identified for PhotonInfo   { fn quality(&self) -> Quality { self.id      } }

/// Accepts objects identified at `minimum` or tighter
#[derive(Clone, Copy, Debug)]
pub struct WorkingPoint { pub minimum: Quality }

impl<I: ObjectInfo + Identified> Accept<I> for WorkingPoint {
    fn accept(&self, object: &Particle<I>) -> bool {
        object.info.quality() >= self.minimum
    }
}

// ----- Isolation ----------------------------------------------------------------------------------

/// Types carrying track- and calorimeter-based isolation cone sums
pub trait Isolated {
    fn track_cone(&self) -> Energy;
    fn calo_cone (&self) -> Energy;
}

impl Isolated for ElectronInfo {
    fn track_cone(&self) -> Energy { self.ptvarcone20  }
    fn calo_cone (&self) -> Energy { self.topoetcone20 }
}

impl Isolated for MuonInfo {
    fn track_cone(&self) -> Energy { self.ptvarcone30  }
    fn calo_cone (&self) -> Energy { self.topoetcone20 }
}

impl Isolated for PhotonInfo {
    fn track_cone(&self) -> Energy { self.ptcone20     }
    fn calo_cone (&self) -> Energy { self.topoetcone40 }
}

/// Cuts on cone sums relative to the object's pt
#[derive(Clone, Copy, Debug)]
pub struct RelativeIsolation {
    pub track: f64,
    pub calo : f64,
}

impl<I: ObjectInfo + Isolated> Accept<I> for RelativeIsolation {
    fn accept(&self, object: &Particle<I>) -> bool {
        let pt = object.pt();
        ratio_(object.info.track_cone() / pt) < self.track &&
        ratio_(object.info.calo_cone () / pt) < self.calo
    }
}

// ----- Jets ---------------------------------------------------------------------------------------

/// Flavour-tagging decision on the tagger output
#[derive(Clone, Copy, Debug)]
pub struct BTagger { pub min_score: f64 }

impl Accept<JetInfo> for BTagger {
    fn accept(&self, jet: &Jet) -> bool { jet.info.btag_score > self.min_score }
}

/// Loose jet-quality criteria: accepts jets which do *not* look like noise
/// bursts, cosmics or beam-induced background.
#[derive(Clone, Copy, Debug, Default)]
pub struct LooseCleaning;

impl LooseCleaning {
    pub fn is_bad(jet: &Jet) -> bool {
        let c = &jet.info.cleaning;
        let eta = jet.eta().abs();
        // HEC spikes
        if c.hecf > 0.5 && c.hec_quality.abs() > 0.5 && c.avg_lar_qf > 0.8 { return true }
        if c.neg_e.abs() > gev(60.0) { return true }
        // EM coherent noise
        if c.emf > 0.95 && c.lar_quality.abs() > 0.8 && c.avg_lar_qf > 0.8 && eta < 2.8 { return true }
        // Cosmics and beam-induced background
        if c.timing.abs() > 25.0 { return true }
        if c.emf < 0.05 && c.chf < 0.05 && eta < 2.0 { return true }
        if c.emf < 0.05 && eta >= 2.0 { return true }
        c.fmax > 0.99 && eta < 2.0
    }
}

impl Accept<JetInfo> for LooseCleaning {
    fn accept(&self, jet: &Jet) -> bool { !Self::is_bad(jet) }
}

/// Provides the pile-up discriminant for a calibrated jet
pub trait JvtTool: Send + Sync {
    fn jvt(&self, jet: &Jet) -> f64;
}

/// Uses the discriminant computed during reconstruction
#[derive(Clone, Copy, Debug, Default)]
pub struct StoredJvt;

impl JvtTool for StoredJvt {
    fn jvt(&self, jet: &Jet) -> f64 { jet.info.jvt }
}

/// Jets with no tracks get the conventional -0.1; the stored value
/// otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrackAwareJvt;

impl JvtTool for TrackAwareJvt {
    fn jvt(&self, jet: &Jet) -> f64 {
        if jet.info.n_tracks == 0 { -0.1 } else { jet.info.jvt }
    }
}

/// Bundle of the decision tools used by the classifiers, one set per kind.
pub struct Tools {
    pub electron_id       : Box<dyn Accept<ElectronInfo>>,
    pub electron_isolation: Box<dyn Accept<ElectronInfo>>,
    pub muon_id           : Box<dyn Accept<MuonInfo>>,
    pub muon_isolation    : Box<dyn Accept<MuonInfo>>,
    pub tau_id            : Box<dyn Accept<TauInfo>>,
    pub photon_id         : Box<dyn Accept<PhotonInfo>>,
    pub photon_isolation  : Box<dyn Accept<PhotonInfo>>,
    pub jet_cleaning      : Box<dyn Accept<JetInfo>>,
    pub btagger           : Box<dyn Accept<JetInfo>>,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            electron_id       : Box::new(WorkingPoint { minimum: Quality::Loose }),
            electron_isolation: Box::new(RelativeIsolation { track: 0.15, calo: 0.2 }),
            muon_id           : Box::new(WorkingPoint { minimum: Quality::Loose }),
            muon_isolation    : Box::new(RelativeIsolation { track: 0.15, calo: 0.3 }),
            tau_id            : Box::new(WorkingPoint { minimum: Quality::Medium }),
            photon_id         : Box::new(WorkingPoint { minimum: Quality::Tight }),
            photon_isolation  : Box::new(RelativeIsolation { track: 0.05, calo: 0.065 }),
            jet_cleaning      : Box::new(LooseCleaning),
            btagger           : Box::new(BTagger { min_score: 0.8244 }),
        }
    }
}
