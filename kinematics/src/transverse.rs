use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};

use units::{gev_, ConstZero, Energy};
use units::todo::Phif64;

/// Vector in the plane transverse to the beam
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transverse {
    pub x: Energy,
    pub y: Energy,
}

impl Transverse {

    pub const ZERO: Self = Self { x: Energy::ZERO, y: Energy::ZERO };

    pub fn new(x: Energy, y: Energy) -> Self { Self { x, y } }

    pub fn magnitude(&self) -> Energy {
        let &Self { x, y } = self;
        (x*x + y*y).sqrt()
    }

    pub fn phi(&self) -> Phif64 { gev_(self.y).atan2(gev_(self.x)) }
}

impl Add for Transverse {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for Transverse {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl AddAssign for Transverse {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Neg for Transverse {
    type Output = Self;
    fn neg(self) -> Self::Output { Self { x: -self.x, y: -self.y } }
}

impl Sum for Transverse {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod test_transverse {
    use super::*;
    use float_eq::assert_float_eq;
    use units::gev;
    use rstest::rstest;
    use std::f64::consts::PI;

    #[rstest(/**/   x,     y,  magnitude,  phi,
             case(  3.0,   4.0,   5.0,  4.0_f64.atan2(3.0)),
             case(  0.0,  10.0,  10.0,  PI / 2.0),
             case(-10.0,   0.0,  10.0,  PI),
             case(  0.0, -20.0,  20.0, -PI / 2.0),
    )]
    fn magnitude_and_azimuth(x: f64, y: f64, magnitude: f64, phi: f64) {
        let v = Transverse::new(gev(x), gev(y));
        assert_float_eq!(gev_(v.magnitude()), magnitude, r2nd <= 1e-12);
        assert_float_eq!(v.phi(), phi, abs <= 1e-12);
    }

    #[test]
    fn sum_and_negation() {
        let parts = vec![
            Transverse::new(gev( 1.0), gev(2.0)),
            Transverse::new(gev(-4.0), gev(0.5)),
            Transverse::new(gev( 0.0), gev(1.5)),
        ];
        let total: Transverse = parts.iter().copied().sum();
        assert_float_eq!(gev_(total.x), -3.0, abs <= 1e-9);
        assert_float_eq!(gev_(total.y),  4.0, abs <= 1e-9);
        let back = -total;
        assert_float_eq!(gev_(back.x),  3.0, abs <= 1e-9);
        assert_float_eq!(gev_((total - total).magnitude()), 0.0, abs <= 1e-12);
    }
}
