//! Configuration file parser for the event selection.
//!
//! Quantities with dimensions are written with their units, as strings:
//! `pt = "25 GeV"`, `z0_sin_theta = "0.5 mm"`. Every section and every field
//! has a default, so an empty file describes the nominal selection.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};
use units::{gev, mm, Energy, Length};

use crate::error::ConfigError;
use crate::quality::GoodRunsList;

fn deserialize_uom<'d, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    String::deserialize(deserializer)?
        .parse::<T>()
        .map_err(de::Error::custom)
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Determines the keys of the jet, MET core and MET association containers
    pub jet_algorithm: String,

    /// An event passes the trigger gate if any of these fired. No triggers:
    /// no requirement.
    pub triggers: Vec<String>,

    /// Certified luminosity blocks. Absent: every data event is good.
    pub good_runs: Option<GoodRunsList>,

    pub electron  : ElectronConfig,
    pub muon      : MuonConfig,
    pub jet       : JetConfig,
    pub tau       : TauConfig,
    pub photon    : PhotonConfig,
    pub overlap   : OverlapConfig,
    pub tracks    : TrackConfig,
    pub met       : MetConfig,
    pub event     : EventCuts,
    pub histograms: HistogramConfig,

    /// Nominal corrections applied to the working copies before any selection
    pub calibration: CalibrationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jet_algorithm: "AntiKt4EMTopo".into(),
            triggers     : vec![],
            good_runs    : None,
            electron     : Default::default(),
            muon         : Default::default(),
            jet          : Default::default(),
            tau          : Default::default(),
            photon       : Default::default(),
            overlap      : Default::default(),
            tracks       : Default::default(),
            met          : Default::default(),
            event        : Default::default(),
            histograms   : Default::default(),
            calibration  : Default::default(),
        }
    }
}

impl Config {
    /// Checks which cannot be expressed in the types
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Validation(msg));
        if self.jet_algorithm.is_empty() { return invalid("jet_algorithm must not be empty".into()) }
        if self.tracks.pt_low > self.tracks.pt_high {
            return invalid(format!("tracks.pt_low ({:?}) above tracks.pt_high ({:?})", self.tracks.pt_low, self.tracks.pt_high))
        }
        if self.event.sublead_jet_pt > self.event.lead_jet_pt {
            return invalid("event.sublead_jet_pt above event.lead_jet_pt".into())
        }
        for (name, crack) in [("electron", self.electron.baseline.crack),
                              ("tau"     , self.tau     .baseline.crack),
                              ("photon"  , self.photon  .baseline.crack)] {
            if let Some((lo, hi)) = crack {
                if lo >= hi { return invalid(format!("{name}.baseline.crack is empty: [{lo}, {hi}]")) }
            }
        }
        for (name, axis) in [("jet_pt", &self.histograms.jet_pt), ("met", &self.histograms.met),
                             ("met_xy", &self.histograms.met_xy), ("sumet", &self.histograms.sumet)] {
            if axis.bins == 0 || axis.min >= axis.max {
                return invalid(format!("histograms.{name}: need bins > 0 and min < max"))
            }
        }
        if self.histograms.met_phi_bins == 0 { return invalid("histograms.met_phi_bins must be > 0".into()) }
        for (name, kind) in self.calibration.kinds() {
            if !kind.scale.is_finite() || kind.scale <= 0.0 {
                return invalid(format!("calibration.{name}.scale must be positive: {}", kind.scale))
            }
            if !kind.smearing.is_finite() || kind.smearing < 0.0 {
                return invalid(format!("calibration.{name}.smearing must not be negative: {}", kind.smearing))
            }
            if kind.pt_min >= kind.pt_max { return invalid(format!("calibration.{name}: need pt_min < pt_max")) }
        }
        Ok(())
    }
}

// ----- Per-object cuts ----------------------------------------------------------------------------

/// |η| window excluded for calorimeter-based objects: barrel-endcap transition
fn default_crack() -> Option<(f64, f64)> { Some((1.37, 1.52)) }

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ElectronConfig {
    pub baseline: ElectronBaseline,
    pub signal  : LeptonSignal,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ElectronBaseline {
    #[serde(deserialize_with = "deserialize_uom")]
    pub pt: Energy,
    /// Applied to the cluster pseudorapidity
    pub eta_max: f64,
    pub crack: Option<(f64, f64)>,
    #[serde(deserialize_with = "deserialize_uom")]
    pub z0_sin_theta: Length,
    pub d0_significance: f64,
    pub isolation: bool,
}

impl Default for ElectronBaseline {
    fn default() -> Self {
        Self {
            pt: gev(7.0), eta_max: 2.47, crack: default_crack(),
            z0_sin_theta: mm(0.5), d0_significance: 5.0, isolation: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct MuonConfig {
    pub baseline: MuonBaseline,
    pub signal  : LeptonSignal,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct MuonBaseline {
    #[serde(deserialize_with = "deserialize_uom")]
    pub pt: Energy,
    pub eta_max: f64,
    #[serde(deserialize_with = "deserialize_uom")]
    pub z0_sin_theta: Length,
    pub d0_significance: f64,
    pub isolation: bool,
}

impl Default for MuonBaseline {
    fn default() -> Self {
        Self { pt: gev(7.0), eta_max: 2.5, z0_sin_theta: mm(0.5), d0_significance: 3.0, isolation: false }
    }
}

/// Second tier for leptons. In the VBF channel these are the (loose) veto
/// leptons.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct LeptonSignal {
    #[serde(deserialize_with = "deserialize_uom")]
    pub pt: Energy,
    #[serde(deserialize_with = "deserialize_uom")]
    pub z0_sin_theta: Length,
    pub d0_significance: f64,
    pub isolation: bool,
}

impl Default for LeptonSignal {
    fn default() -> Self {
        Self { pt: gev(7.0), z0_sin_theta: mm(0.5), d0_significance: 5.0, isolation: false }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct JetConfig {
    pub baseline: Kinematic,
    pub signal  : Kinematic,
    pub jvt     : JvtPolicy,
}

impl Default for JetConfig {
    fn default() -> Self {
        Self {
            baseline: Kinematic { pt: gev(20.0), eta_max: 4.5 },
            signal  : Kinematic { pt: gev(25.0), eta_max: 4.5 },
            jvt     : JvtPolicy::default(),
        }
    }
}

/// Minimum pt and maximum |η|
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Kinematic {
    #[serde(deserialize_with = "deserialize_uom")]
    pub pt: Energy,
    pub eta_max: f64,
}

impl Default for Kinematic {
    fn default() -> Self { Self { pt: gev(20.0), eta_max: 4.5 } }
}

/// Pile-up suppression window: soft central jets need `jvt > min`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct JvtPolicy {
    #[serde(deserialize_with = "deserialize_uom")]
    pub pt_max: Energy,
    pub eta_max: f64,
    pub min: f64,
}

impl Default for JvtPolicy {
    fn default() -> Self { Self { pt_max: gev(60.0), eta_max: 2.4, min: 0.59 } }
}

impl JvtPolicy {
    /// Is the jet inside the window where the discriminant is consulted?
    pub fn applies(&self, pt: Energy, eta: f64) -> bool { pt < self.pt_max && eta.abs() < self.eta_max }

    pub fn accepts(&self, pt: Energy, eta: f64, jvt: f64) -> bool { !self.applies(pt, eta) || jvt > self.min }

    /// Soft central jets failing the discriminant are not subjected to
    /// cleaning
    pub fn exempts_from_cleaning(&self, pt: Energy, eta: f64, jvt: f64) -> bool {
        self.applies(pt, eta) && jvt < self.min
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct TauConfig {
    pub baseline: TauBaseline,
    pub signal  : PtCut,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct TauBaseline {
    #[serde(deserialize_with = "deserialize_uom")]
    pub pt: Energy,
    pub eta_max: f64,
    pub crack: Option<(f64, f64)>,
    pub n_tracks: Vec<u8>,
}

impl Default for TauBaseline {
    fn default() -> Self { Self { pt: gev(20.0), eta_max: 2.5, crack: default_crack(), n_tracks: vec![1, 3] } }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct PtCut {
    #[serde(deserialize_with = "deserialize_uom")]
    pub pt: Energy,
}

impl Default for PtCut {
    fn default() -> Self { Self { pt: gev(20.0) } }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct PhotonConfig {
    pub baseline: PhotonBaseline,
    pub signal  : PtCut,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct PhotonBaseline {
    #[serde(deserialize_with = "deserialize_uom")]
    pub pt: Energy,
    pub eta_max: f64,
    pub crack: Option<(f64, f64)>,
    pub isolation: bool,
}

impl Default for PhotonBaseline {
    fn default() -> Self { Self { pt: gev(20.0), eta_max: 2.37, crack: default_crack(), isolation: true } }
}

// ----- Overlap removal ----------------------------------------------------------------------------

/// ΔR thresholds of the overlap-removal chain, named `<removed>_<reference>`
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct OverlapConfig {
    pub tau_electron   : f64,
    pub tau_muon       : f64,
    pub photon_electron: f64,
    pub photon_muon    : f64,
    pub jet_electron   : f64,
    pub electron_jet   : f64,
    pub jet_muon       : f64,
    pub muon_jet       : f64,
    pub jet_tau        : f64,
    pub jet_photon     : f64,
    /// Keep b-tagged jets close to electrons
    pub btag_exemption : bool,
    /// Only jets with fewer tracks than this are removed by nearby muons
    pub jet_muon_max_tracks: u16,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            tau_electron: 0.2, tau_muon: 0.2,
            photon_electron: 0.4, photon_muon: 0.4,
            jet_electron: 0.2, electron_jet: 0.4,
            jet_muon: 0.2, muon_jet: 0.4,
            jet_tau: 0.2, jet_photon: 0.4,
            btag_exemption: false,
            jet_muon_max_tracks: 3,
        }
    }
}

// ----- Tracks -------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct TrackConfig {
    /// Tracks above this can spoil the isolation of a seed
    #[serde(deserialize_with = "deserialize_uom")]
    pub pt_low: Energy,
    /// Seeds must be above this
    #[serde(deserialize_with = "deserialize_uom")]
    pub pt_high: Energy,
    pub cone: f64,
    pub min_silicon_hits: u8,
    pub max_chi2_per_ndof: f64,
    #[serde(deserialize_with = "deserialize_uom")]
    pub z0_sin_theta: Length,
    #[serde(deserialize_with = "deserialize_uom")]
    pub d0: Length,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            pt_low: gev(3.0), pt_high: gev(10.0), cone: 0.4,
            min_silicon_hits: 7, max_chi2_per_ndof: 3.0,
            z0_sin_theta: mm(3.0), d0: mm(1.0),
        }
    }
}

// ----- Calibration --------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct CalibrationConfig {
    pub electron: KindCalibration,
    pub muon    : KindCalibration,
    pub jet     : KindCalibration,
    pub tau     : KindCalibration,
    pub photon  : KindCalibration,
    /// Recompute the jet pile-up discriminant, treating jets without tracks as
    /// pile-up, instead of using the reconstructed value
    pub track_aware_jvt: bool,
}

impl CalibrationConfig {
    pub fn kinds(&self) -> [(&'static str, &KindCalibration); 5] {
        [("electron", &self.electron), ("muon", &self.muon), ("jet", &self.jet),
         ("tau", &self.tau), ("photon", &self.photon)]
    }
}

/// Momentum scale for data and resolution smearing for simulation, both valid
/// in a window of pt and |η|. A scale of 1 and a smearing of 0 add no step.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct KindCalibration {
    pub scale: f64,
    /// Relative width of the Gaussian smearing
    pub smearing: f64,
    #[serde(deserialize_with = "deserialize_uom")]
    pub pt_min: Energy,
    #[serde(deserialize_with = "deserialize_uom")]
    pub pt_max: Energy,
    pub eta_max: f64,
}

impl Default for KindCalibration {
    fn default() -> Self { Self { scale: 1.0, smearing: 0.0, pt_min: gev(5.0), pt_max: gev(3000.0), eta_max: 4.9 } }
}

// ----- Missing transverse energy ------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct MetConfig {
    /// Apply the jet pile-up policy to jets entering the jet term
    pub jet_jvt: bool,
    /// Subtract the energy deposited by muons from the jets containing them
    pub ghost_muons: bool,
}

impl Default for MetConfig {
    fn default() -> Self { Self { jet_jvt: true, ghost_muons: true } }
}

// ----- Event-level gates --------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct EventCuts {
    #[serde(deserialize_with = "deserialize_uom")]
    pub met: Energy,
    #[serde(deserialize_with = "deserialize_uom")]
    pub lead_jet_pt: Energy,
    #[serde(deserialize_with = "deserialize_uom")]
    pub sublead_jet_pt: Energy,
    #[serde(deserialize_with = "deserialize_uom")]
    pub mjj: Energy,
    /// Signal jets above this, between the two leading jets in η, veto the event
    #[serde(deserialize_with = "deserialize_uom")]
    pub central_jet_pt: Energy,
}

impl Default for EventCuts {
    fn default() -> Self {
        Self {
            met: gev(150.0), lead_jet_pt: gev(55.0), sublead_jet_pt: gev(45.0),
            mjj: gev(200.0), central_jet_pt: gev(25.0),
        }
    }
}

// ----- Histograms ---------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct HistogramConfig {
    pub jet_pt      : EnergyAxis,
    pub met         : EnergyAxis,
    pub met_xy      : EnergyAxis,
    pub sumet       : EnergyAxis,
    pub met_phi_bins: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            jet_pt      : EnergyAxis { bins: 100, min: gev(   0.0), max: gev(1000.0) },
            met         : EnergyAxis { bins: 100, min: gev(   0.0), max: gev(1000.0) },
            met_xy      : EnergyAxis { bins: 100, min: gev(-500.0), max: gev( 500.0) },
            sumet       : EnergyAxis { bins: 100, min: gev(   0.0), max: gev(3000.0) },
            met_phi_bins: 64,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EnergyAxis {
    pub bins: usize,
    #[serde(deserialize_with = "deserialize_uom")]
    pub min: Energy,
    #[serde(deserialize_with = "deserialize_uom")]
    pub max: Energy,
}

pub fn read_config_file(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    let config: Config = toml::from_str(&text)?;
    config.validate()?;
    Ok(config)
}
