//! Classification of objects into the baseline and signal tiers.
//!
//! Both tiers are ordered conjunctions of predicates which stop at the first
//! failure, with the pt requirement first, so that identification and
//! isolation tools are never consulted for soft objects.

pub mod baseline;
pub mod signal;

pub use baseline::{Baseline, decorate_baseline};
pub use signal::{Signal, decorate_bad, decorate_signal, is_bad};

use units::{mm_, Length};
use units::todo::Significancef64;

use crate::event::BeamSpot;
use crate::record::{Particle, TrackParameters};

/// Per-event information needed by the classifiers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventContext {
    pub is_simulation: bool,
    /// z of the primary vertex
    pub pv_z: Length,
    pub beam_spot: BeamSpot,
}

/// Decides whether an object belongs to a tier
pub trait Classify<I> {
    fn accept(&self, object: &Particle<I>, ctx: &EventContext) -> bool;
}

/// Transverse impact parameter over its uncertainty, which includes the beam
/// spot size projected onto the track direction.
pub fn d0_significance(track: &TrackParameters, beam_spot: &BeamSpot) -> Significancef64 {
    let (sin, cos) = track.phi0.sin_cos();
    let sx = mm_(beam_spot.sigma_x);
    let sy = mm_(beam_spot.sigma_y);
    let beam_spot_2 = sin*sin*sx*sx + cos*cos*sy*sy - 2.0*sin*cos*beam_spot.cov_xy;
    let sigma_2 = mm_(track.d0_sigma).powi(2) + beam_spot_2;
    if sigma_2 <= 0.0 { return f64::INFINITY }
    mm_(track.d0).abs() / sigma_2.sqrt()
}

/// |Δz0 sinθ| of the track with respect to the primary vertex
pub fn z0_sin_theta(track: &TrackParameters, pv_z: Length) -> Length {
    let dz = track.z0 + track.vz - pv_z;
    (dz * track.theta.sin()).abs()
}

fn in_crack(eta: f64, crack: Option<(f64, f64)>) -> bool {
    crack.map_or(false, |(lo, hi)| { let a = eta.abs(); lo < a && a < hi })
}
