use std::ops::Add;

use units::{gev, gev_, Energy};
use units::todo::{DeltaRf64, Etaf64, Phif64};

use crate::{delta_r, Transverse};

/// Four-momentum in collider coordinates.
///
/// `pt` and `e` are kept as `Energy`, `eta` and `phi` as plain numbers. The
/// cartesian components are derived on demand, never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FourMomentum {
    pub pt : Energy,
    pub eta: Etaf64,
    pub phi: Phif64,
    pub e  : Energy,
}

impl FourMomentum {

    pub fn new(pt: Energy, eta: Etaf64, phi: Phif64, e: Energy) -> Self { Self { pt, eta, phi, e } }

    pub fn massless(pt: Energy, eta: Etaf64, phi: Phif64) -> Self {
        Self { pt, eta, phi, e: pt * eta.cosh() }
    }

    pub fn from_pt_eta_phi_m(pt: Energy, eta: Etaf64, phi: Phif64, m: Energy) -> Self {
        let (pt_, m_) = (gev_(pt), gev_(m));
        let p = pt_ * eta.cosh();
        Self { pt, eta, phi, e: gev((p * p + m_ * m_).sqrt()) }
    }

    pub fn px(&self) -> Energy { self.pt * self.phi.cos() }
    pub fn py(&self) -> Energy { self.pt * self.phi.sin() }
    pub fn pz(&self) -> Energy { self.pt * self.eta.sinh() }
    pub fn p (&self) -> Energy { self.pt * self.eta.cosh() }

    /// Polar angle
    pub fn theta(&self) -> f64 { 2.0 * (-self.eta).exp().atan() }

    /// Invariant mass; clamped to zero when rounding makes `E² < p²`
    pub fn m(&self) -> Energy {
        let (e, p) = (gev_(self.e), gev_(self.p()));
        gev((e * e - p * p).max(0.0).sqrt())
    }

    pub fn transverse(&self) -> Transverse { Transverse::new(self.px(), self.py()) }

    pub fn delta_r(&self, other: &Self) -> DeltaRf64 {
        delta_r((self.eta, self.phi), (other.eta, other.phi))
    }

    /// Multiply the momentum, and therefore the energy, by `factor`, keeping
    /// the direction fixed.
    pub fn scale(&mut self, factor: f64) {
        self.pt = self.pt * factor;
        self.e  = self.e  * factor;
    }

    fn cartesian(&self) -> [f64; 4] {
        [gev_(self.px()), gev_(self.py()), gev_(self.pz()), gev_(self.e)]
    }

    fn from_cartesian([px, py, pz, e]: [f64; 4]) -> Self {
        let pt = (px * px + py * py).sqrt();
        let eta = if pt > 0.0 { (pz / pt).asinh() } else { 0.0 };
        let phi = if pt > 0.0 { py.atan2(px)      } else { 0.0 };
        Self { pt: gev(pt), eta, phi, e: gev(e) }
    }
}

impl Add for FourMomentum {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        let [a, b, c, d] = self.cartesian();
        let [w, x, y, z] = rhs .cartesian();
        Self::from_cartesian([a + w, b + x, c + y, d + z])
    }
}

/// Invariant mass of a pair of objects
pub fn invariant_mass(a: &FourMomentum, b: &FourMomentum) -> Energy { (*a + *b).m() }
