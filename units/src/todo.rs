/// Quantities which are simply type aliases for `f64` rather than having an
/// implementation as a `uom` `Quantity`.
///
/// This may be because:
///
/// + They are dimensionless in `uom`'s eyes, but still deserve a name in the
///   source (pseudorapidity is not an angle, a significance is not a ratio of
///   anything we keep around).
///
/// + Wrapping them would only add `ratio_` calls at every use site in the
///   selection code, which is mostly comparisons against configured cuts.

pub type Etaf64          = f64;
pub type Phif64          = f64;
pub type DeltaRf64       = f64;
pub type Significancef64 = f64;
pub type Chi2f64         = f64;
pub type Scoref64        = f64;
