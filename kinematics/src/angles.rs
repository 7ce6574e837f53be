use std::f64::consts::{PI, TAU};
use units::todo::{DeltaRf64, Etaf64, Phif64};

/// Azimuthal separation, wrapped into `[-π, π)`
pub fn delta_phi(phi1: Phif64, phi2: Phif64) -> Phif64 {
    let d = (phi1 - phi2) % TAU;
    if      d >=  PI { d - TAU }
    else if d <  -PI { d + TAU }
    else             { d       }
}

/// Angular distance in the (η, φ) plane
pub fn delta_r((eta1, phi1): (Etaf64, Phif64), (eta2, phi2): (Etaf64, Phif64)) -> DeltaRf64 {
    let deta = eta1 - eta2;
    let dphi = delta_phi(phi1, phi2);
    (deta * deta + dphi * dphi).sqrt()
}

#[cfg(test)]
mod test_angles {
    use super::*;
    use float_eq::assert_float_eq;
    use rstest::rstest;
    use proptest::prelude::*;

    #[rstest(/**/  phi1,      phi2,   expected,
             case(  0.0,       0.0,   0.0      ),
             case(  1.0,       0.5,   0.5      ),
             case(  0.5,       1.0,  -0.5      ),
             case(  3.0,      -3.0,   6.0 - TAU),
             case( -3.0,       3.0,   TAU - 6.0),
             case(  0.1, TAU + 0.2,  -0.1      ),
    )]
    fn wrapped_delta_phi(phi1: f64, phi2: f64, expected: f64) {
        assert_float_eq!(delta_phi(phi1, phi2), expected, abs <= 1e-12);
    }

    #[test]
    fn delta_r_pythagoras() {
        assert_float_eq!(delta_r((0.0, 0.0), (0.3, 0.4)), 0.5, abs <= 1e-12);
        assert_float_eq!(delta_r((1.0, 3.1), (1.0, -3.1)), TAU - 6.2, abs <= 1e-12);
    }

    proptest! {
        #[test]
        fn delta_phi_stays_in_range(a in -20.0..20.0_f64, b in -20.0..20.0_f64) {
            let d = delta_phi(a, b);
            prop_assert!((-PI..PI).contains(&d));
        }

        #[test]
        fn delta_r_is_symmetric(e1 in -5.0..5.0_f64, p1 in -PI..PI, e2 in -5.0..5.0_f64, p2 in -PI..PI) {
            assert_float_eq!(delta_r((e1, p1), (e2, p2)), delta_r((e2, p2), (e1, p1)), abs <= 1e-12);
        }
    }
}
