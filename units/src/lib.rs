//! Physical quantities used throughout the selection.
//!
//! Energies and lengths are `uom` quantities with `f64` storage. Raw numbers
//! coming from upstream reconstruction are converted exactly once, when a
//! collection is built, using the pithy constructors below; the inverse
//! accessors (trailing underscore) turn a quantity back into a plain number in
//! the named unit.

pub mod todo;

pub use uom;
pub use uom::ConstZero;
pub use uom::si::Quantity;
pub use uom::si::f64::{Energy, Length, Ratio};

mod units {
  pub use uom::si::{energy::{megaelectronvolt, gigaelectronvolt, teraelectronvolt},
                    length::{micrometer, millimeter},
                    ratio ::ratio,
  };
}

/// Generate a function called NAME which returns QUANTITY by interpreting its
/// argument as UNIT
///
/// wrap!(NAME QUANTITY UNIT);
macro_rules! wrap {
  ($name:ident $quantity:ident $unit:ident ) => {
    pub fn $name(x: f64) -> $quantity { $quantity::new::<units::$unit>(x) }
  };
}

wrap!(mev    Energy  megaelectronvolt);
wrap!(gev    Energy  gigaelectronvolt);
wrap!(tev    Energy  teraelectronvolt);
wrap!(um     Length        micrometer);
wrap!(mm     Length        millimeter);
wrap!(ratio  Ratio              ratio);

pub fn mev_  (x: Energy) -> f64 { x.get::<units::megaelectronvolt>() }
pub fn gev_  (x: Energy) -> f64 { x.get::<units::gigaelectronvolt>() }
pub fn mm_   (x: Length) -> f64 { x.get::<units::millimeter>() }
pub fn ratio_(x: Ratio ) -> f64 { x.get::<units::ratio>() }

#[macro_export]
macro_rules! assert_uom_eq {
  ($unit:ident, $lhs:expr, $rhs:expr, $algo:ident <= $tol:expr) => {
    float_eq::assert_float_eq!($lhs.get::<$unit>(), $rhs.get::<$unit>(), $algo <= $tol)
  };
}
