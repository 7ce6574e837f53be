//! Relativistic kinematics in the collider frame: four-momenta described by
//! transverse momentum, pseudorapidity and azimuth, and the transverse
//! vectors from which missing energy is built.

mod fourmomentum;
mod transverse;
mod angles;

pub use fourmomentum::{FourMomentum, invariant_mass};
pub use transverse::Transverse;
pub use angles::{delta_phi, delta_r};
