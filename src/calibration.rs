//! Ordered per-object corrections applied to working copies.

use std::ops::AddAssign;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::warn;
use units::gev_;

use crate::collection::Collection;
use crate::config::analysis::{CalibrationConfig, KindCalibration};
use crate::event::EventInfo;
use crate::record::{ElectronInfo, JetInfo, MuonInfo, ObjectInfo, Particle, PhotonInfo, TauInfo};
use crate::tools::{Correction, CorrectionCode, JvtTool, MomentumScale, ResolutionSmearing, StoredJvt, TrackAwareJvt};

/// Which kind of input a calibration step is meant for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppliesTo { Both, SimulationOnly, DataOnly }

impl AppliesTo {
    fn includes(self, is_simulation: bool) -> bool {
        match self {
            Self::Both           => true,
            Self::SimulationOnly =>  is_simulation,
            Self::DataOnly       => !is_simulation,
        }
    }
}

struct Step<I> {
    correction: Box<dyn Correction<I>>,
    applies_to: AppliesTo,
}

/// Counts of correction outcomes, summed over objects and steps
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CalibrationReport {
    pub applied     : usize,
    pub out_of_range: usize,
    pub errors      : usize,
}

impl AddAssign<&Self> for CalibrationReport {
    fn add_assign(&mut self, rhs: &Self) {
        self.applied      += rhs.applied;
        self.out_of_range += rhs.out_of_range;
        self.errors       += rhs.errors;
    }
}

pub struct CalibrationStage<I> {
    steps: Vec<Step<I>>,
}

impl<I> Default for CalibrationStage<I> {
    fn default() -> Self { Self { steps: vec![] } }
}

impl<I: ObjectInfo> CalibrationStage<I> {

    pub fn new() -> Self { Self::default() }

    pub fn step(mut self, correction: impl Correction<I> + 'static, applies_to: AppliesTo) -> Self {
        self.steps.push(Step { correction: Box::new(correction), applies_to });
        self
    }

    /// The nominal steps for one kind: the momentum scale for data, then the
    /// resolution smearing for simulation
    pub fn from_config(config: &KindCalibration) -> Self {
        let name = I::KIND.to_string();
        let mut stage = Self::new();
        if config.scale != 1.0 {
            stage = stage.step(MomentumScale {
                name: format!("{name} scale"), factor: config.scale,
                pt_min: config.pt_min, pt_max: config.pt_max, eta_max: config.eta_max,
            }, AppliesTo::DataOnly);
        }
        if config.smearing > 0.0 {
            let smearing = ResolutionSmearing { name: format!("{name} smearing"), sigma: config.smearing };
            stage = stage.step(Windowed { correction: smearing, config: config.clone() }, AppliesTo::SimulationOnly);
        }
        stage
    }

    pub fn len(&self) -> usize { self.steps.len() }
    pub fn is_empty(&self) -> bool { self.steps.is_empty() }

    /// Run every relevant step, in order, on every object.
    ///
    /// Kinematics are restored whenever a step does not return `Ok`; a
    /// failing correction never aborts the event.
    pub fn apply(&self, objects: &mut Collection<I>, is_simulation: bool, rng: &mut StdRng) -> CalibrationReport {
        let mut report = CalibrationReport::default();
        let steps = self.steps.iter()
            .filter(|s| s.applies_to.includes(is_simulation))
            .collect::<Vec<_>>();
        for object in objects.iter_mut() {
            for step in &steps {
                let before = object.p4;
                match step.correction.apply(object, rng) {
                    CorrectionCode::Ok => report.applied += 1,
                    CorrectionCode::OutOfValidityRange => {
                        object.p4 = before;
                        report.out_of_range += 1;
                    }
                    CorrectionCode::Error => {
                        object.p4 = before;
                        report.errors += 1;
                        warn!(
                            kind = %I::KIND, correction = step.correction.name(),
                            index = ?object.original(), pt = gev_(before.pt),
                            "calibration failed, keeping uncalibrated kinematics"
                        );
                    }
                }
            }
        }
        report
    }
}

impl CalibrationStage<JetInfo> {
    /// Calibrate, then write the pile-up discriminant on every jet
    pub fn apply_jets(&self, jets: &mut Collection<JetInfo>, is_simulation: bool, jvt: &dyn JvtTool, rng: &mut StdRng) -> CalibrationReport {
        let report = self.apply(jets, is_simulation, rng);
        for jet in jets.iter_mut() {
            jet.deco.jvt = Some(jvt.jvt(jet));
        }
        report
    }
}

/// Restricts a correction to the pt and |η| window of its configuration
struct Windowed<C> {
    correction: C,
    config    : KindCalibration,
}

impl<I: ObjectInfo, C: Correction<I>> Correction<I> for Windowed<C> {
    fn name(&self) -> &str { self.correction.name() }

    fn apply(&self, object: &mut Particle<I>, rng: &mut StdRng) -> CorrectionCode {
        let pt = object.pt();
        if pt < self.config.pt_min || pt > self.config.pt_max || object.eta().abs() > self.config.eta_max {
            return CorrectionCode::OutOfValidityRange
        }
        self.correction.apply(object, rng)
    }
}

/// One calibration stage per kind of object, and the tool providing the jet
/// pile-up discriminant
pub struct Calibrations {
    pub electrons: CalibrationStage<ElectronInfo>,
    pub muons    : CalibrationStage<MuonInfo>,
    pub jets     : CalibrationStage<JetInfo>,
    pub taus     : CalibrationStage<TauInfo>,
    pub photons  : CalibrationStage<PhotonInfo>,
    pub jvt      : Box<dyn JvtTool>,
}

impl Default for Calibrations {
    fn default() -> Self {
        Self {
            electrons: Default::default(), muons: Default::default(), jets: Default::default(),
            taus: Default::default(), photons: Default::default(), jvt: Box::new(StoredJvt),
        }
    }
}

impl Calibrations {
    pub fn from_config(config: &CalibrationConfig) -> Self {
        let jvt: Box<dyn JvtTool> = if config.track_aware_jvt { Box::new(TrackAwareJvt) } else { Box::new(StoredJvt) };
        Self {
            electrons: CalibrationStage::from_config(&config.electron),
            muons    : CalibrationStage::from_config(&config.muon),
            jets     : CalibrationStage::from_config(&config.jet),
            taus     : CalibrationStage::from_config(&config.tau),
            photons  : CalibrationStage::from_config(&config.photon),
            jvt,
        }
    }
}

/// Random numbers for the stochastic corrections of one event. Depends only on
/// the run seed and the event's identity, so results do not change with the
/// order in which events are processed.
pub fn event_rng(seed: u64, info: &EventInfo) -> StdRng {
    let identity = (u64::from(info.run_number) << 40) ^ info.event_number.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(seed ^ identity)
}
