//! Per-object records: kinematics, reconstruction details and the
//! decorations written by successive stages of the event processing.

use std::fmt;

use kinematics::FourMomentum;
use units::{ConstZero, Energy, Length};
use units::todo::{Etaf64, Phif64, Scoref64};

/// The five kinds of physics object handled by the selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind { Electron, Muon, Jet, Tau, Photon }

impl ObjectKind {
    pub const ALL: [ObjectKind; 5] = [Self::Electron, Self::Muon, Self::Jet, Self::Tau, Self::Photon];

    pub fn name(self) -> &'static str {
        match self {
            Self::Electron => "electrons",
            Self::Muon     => "muons",
            Self::Jet      => "jets",
            Self::Tau      => "taus",
            Self::Photon   => "photons",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(self.name()) }
}

/// Implemented by the type-specific part of each kind of record
pub trait ObjectInfo: Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: ObjectKind;
}

// ----- Decorations --------------------------------------------------------------------------------

/// Boolean decoration which remembers whether any stage has written it.
///
/// Every working copy starts with all flags unwritten. The stage owning a flag
/// may write it more than once: overlap removal clears `overlap` before
/// marking the losers. Reading an unwritten flag gives `false`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flag(Option<bool>);

impl Flag {
    pub fn set(&mut self, value: bool) { self.0 = Some(value) }
    pub fn get(self) -> bool { self.0.unwrap_or(false) }
    pub fn is_written(self) -> bool { self.0.is_some() }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self { Self(Some(value)) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Decorations {
    /// Written by the baseline classifier
    pub baseline: Flag,
    /// Input to the overlap resolver; mirrors `baseline`
    pub selected: Flag,
    /// Written by the overlap resolver on selected objects
    pub overlap : Flag,
    /// Written by the signal classifier
    pub signal  : Flag,
    /// Jets only, written by the signal classifier
    pub bad     : Flag,
    /// Jets only, written after calibration
    pub jvt     : Option<f64>,
}

// ----- Particle -----------------------------------------------------------------------------------

/// One reconstructed object
#[derive(Clone, Debug, PartialEq)]
pub struct Particle<I> {
    pub p4  : FourMomentum,
    pub info: I,
    pub deco: Decorations,
    original: Option<usize>,
}

impl<I: ObjectInfo> Particle<I> {

    pub fn new(p4: FourMomentum, info: I) -> Self {
        Self { p4, info, deco: Decorations::default(), original: None }
    }

    pub fn kind(&self) -> ObjectKind { I::KIND }

    pub fn pt (&self) -> Energy { self.p4.pt  }
    pub fn eta(&self) -> Etaf64 { self.p4.eta }
    pub fn phi(&self) -> Phif64 { self.p4.phi }

    /// Position of the uncalibrated object in the input collection, if this
    /// is a working copy
    pub fn original(&self) -> Option<usize> { self.original }

    pub(crate) fn copy_of(source: &Self, index: usize) -> Self {
        Self { p4: source.p4, info: source.info.clone(), deco: Decorations::default(), original: Some(index) }
    }

    pub fn is_baseline(&self) -> bool { self.deco.baseline.get() }
    pub fn is_signal  (&self) -> bool { self.deco.signal  .get() }

    /// Baseline object which survived overlap removal
    pub fn kept_after_overlap(&self) -> bool {
        self.deco.baseline.get() && !self.deco.overlap.get()
    }
}

// ----- Type-specific information ------------------------------------------------------------------

/// Identification working points, ordered from loosest to tightest
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quality { #[default] Reject, VeryLoose, Loose, Medium, Tight }

pub type TrackId = u32;

/// Perigee parameters of the inner-detector track behind an object.
///
/// `z0` is measured from `vz`, the z position of the track's reference point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackParameters {
    pub d0      : Length,
    pub d0_sigma: Length,
    pub z0      : Length,
    pub vz      : Length,
    pub theta   : f64,
    pub phi0    : Phif64,
}

impl Default for TrackParameters {
    fn default() -> Self {
        Self {
            d0: Length::ZERO, d0_sigma: units::um(10.0),
            z0: Length::ZERO, vz: Length::ZERO,
            theta: std::f64::consts::FRAC_PI_2, phi0: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElectronInfo {
    pub cluster_eta : Etaf64,
    pub id          : Quality,
    pub good_oq     : bool,
    pub track       : TrackParameters,
    pub track_id    : Option<TrackId>,
    pub ptvarcone20 : Energy,
    pub topoetcone20: Energy,
    pub charge      : i8,
}

impl Default for ElectronInfo {
    fn default() -> Self {
        Self {
            cluster_eta: 0.0, id: Quality::Reject, good_oq: true,
            track: TrackParameters::default(), track_id: None,
            ptvarcone20: Energy::ZERO, topoetcone20: Energy::ZERO, charge: -1,
        }
    }
}

impl ObjectInfo for ElectronInfo { const KIND: ObjectKind = ObjectKind::Electron; }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MuonType { #[default] Combined, SegmentTagged, CaloTagged, StandAlone }

#[derive(Clone, Debug, PartialEq)]
pub struct MuonInfo {
    pub muon_type   : MuonType,
    pub quality     : Quality,
    pub track       : TrackParameters,
    pub track_id    : Option<TrackId>,
    pub ptvarcone30 : Energy,
    pub topoetcone20: Energy,
    pub charge      : i8,
}

impl Default for MuonInfo {
    fn default() -> Self {
        Self {
            muon_type: MuonType::Combined, quality: Quality::Reject,
            track: TrackParameters::default(), track_id: None,
            ptvarcone30: Energy::ZERO, topoetcone20: Energy::ZERO, charge: -1,
        }
    }
}

impl ObjectInfo for MuonInfo { const KIND: ObjectKind = ObjectKind::Muon; }

/// Calorimeter-level variables consulted by jet cleaning
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JetCleaningVars {
    pub emf        : f64,
    pub hecf       : f64,
    pub hec_quality: f64,
    pub lar_quality: f64,
    pub avg_lar_qf : f64,
    pub neg_e      : Energy,
    pub timing     : f64,
    pub fmax       : f64,
    /// Charged fraction: scalar sum of track pt over jet pt
    pub chf        : f64,
}

impl Default for JetCleaningVars {
    fn default() -> Self {
        Self {
            emf: 0.5, hecf: 0.0, hec_quality: 0.0, lar_quality: 0.0, avg_lar_qf: 0.0,
            neg_e: Energy::ZERO, timing: 0.0, fmax: 0.3, chf: 0.5,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct JetInfo {
    /// Jet-vertex-tagger discriminant as delivered by reconstruction
    pub jvt       : f64,
    pub btag_score: Scoref64,
    pub n_tracks  : u16,
    pub cleaning  : JetCleaningVars,
}

impl ObjectInfo for JetInfo { const KIND: ObjectKind = ObjectKind::Jet; }

impl Particle<JetInfo> {
    /// The decorated discriminant once calibration has run, the reconstructed
    /// one before that
    pub fn jvt(&self) -> f64 { self.deco.jvt.unwrap_or(self.info.jvt) }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TauInfo {
    pub n_tracks: u8,
    pub charge  : i8,
    pub id      : Quality,
}

impl ObjectInfo for TauInfo { const KIND: ObjectKind = ObjectKind::Tau; }

#[derive(Clone, Debug, PartialEq)]
pub struct PhotonInfo {
    pub cluster_eta : Etaf64,
    pub id          : Quality,
    pub good_oq     : bool,
    pub ptcone20    : Energy,
    pub topoetcone40: Energy,
}

impl Default for PhotonInfo {
    fn default() -> Self {
        Self {
            cluster_eta: 0.0, id: Quality::Reject, good_oq: true,
            ptcone20: Energy::ZERO, topoetcone40: Energy::ZERO,
        }
    }
}

impl ObjectInfo for PhotonInfo { const KIND: ObjectKind = ObjectKind::Photon; }

pub type Electron = Particle<ElectronInfo>;
pub type Muon     = Particle<MuonInfo>;
pub type Jet      = Particle<JetInfo>;
pub type Tau      = Particle<TauInfo>;
pub type Photon   = Particle<PhotonInfo>;
