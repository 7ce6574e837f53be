//! What the selection receives from upstream for each event: metadata plus a
//! keyed store of typed, read-only containers.

use std::collections::{BTreeSet, HashMap};

use units::{ConstZero, Length};

use crate::error::{EventError, EventResult};
use crate::met::{AssociationMap, MetCore};
use crate::quality::Vertex;
use crate::record::{Electron, Jet, Muon, Photon, Tau};
use crate::tracks::Track;

/// Keys under which the containers are stored
pub mod keys {
    pub const ELECTRONS: &str = "Electrons";
    pub const MUONS    : &str = "Muons";
    pub const TAUS     : &str = "TauJets";
    pub const PHOTONS  : &str = "Photons";
    pub const TRACKS   : &str = "InDetTrackParticles";
    pub const VERTICES : &str = "PrimaryVertices";

    pub fn jets    (algorithm: &str) -> String { format!("{algorithm}Jets") }
    pub fn met_core(algorithm: &str) -> String { format!("MET_Core_{algorithm}") }
    pub fn met_map (algorithm: &str) -> String { format!("METAssoc_{algorithm}") }
}

/// Transverse size of the luminous region, used in impact-parameter
/// significances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeamSpot {
    pub sigma_x: Length,
    pub sigma_y: Length,
    /// x-y covariance in mm²
    pub cov_xy : f64,
}

impl Default for BeamSpot {
    fn default() -> Self { Self { sigma_x: Length::ZERO, sigma_y: Length::ZERO, cov_xy: 0.0 } }
}

/// Sub-detector error states recorded for the event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetectorFlags {
    pub lar_error      : bool,
    pub tile_error     : bool,
    pub sct_error      : bool,
    pub core_incomplete: bool,
}

impl DetectorFlags {
    pub fn clean(&self) -> bool {
        !(self.lar_error || self.tile_error || self.sct_error || self.core_incomplete)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventInfo {
    pub run_number   : u32,
    pub lumi_block   : u32,
    pub event_number : u64,
    pub is_simulation: bool,
    pub detector     : DetectorFlags,
    pub triggers     : BTreeSet<String>,
    pub beam_spot    : BeamSpot,
}

impl EventInfo {
    pub fn fired(&self, trigger: &str) -> bool { self.triggers.contains(trigger) }
}

/// Anything that can be kept in an `EventStore`
#[derive(Clone, Debug)]
pub enum Container {
    Electrons(Vec<Electron>),
    Muons    (Vec<Muon>),
    Jets     (Vec<Jet>),
    Taus     (Vec<Tau>),
    Photons  (Vec<Photon>),
    Tracks   (Vec<Track>),
    Vertices (Vec<Vertex>),
    MetMap   (AssociationMap),
    MetCore  (MetCore),
}

impl Container {
    fn describe(&self) -> &'static str {
        match self {
            Self::Electrons(_) => Vec::<Electron>::DESCRIPTION,
            Self::Muons    (_) => Vec::<Muon    >::DESCRIPTION,
            Self::Jets     (_) => Vec::<Jet     >::DESCRIPTION,
            Self::Taus     (_) => Vec::<Tau     >::DESCRIPTION,
            Self::Photons  (_) => Vec::<Photon  >::DESCRIPTION,
            Self::Tracks   (_) => Vec::<Track   >::DESCRIPTION,
            Self::Vertices (_) => Vec::<Vertex  >::DESCRIPTION,
            Self::MetMap   (_) => AssociationMap::DESCRIPTION,
            Self::MetCore  (_) => MetCore::DESCRIPTION,
        }
    }
}

/// Types which can be stored in, and retrieved from, a `Container`
pub trait Stored: Sized {
    const DESCRIPTION: &'static str;
    fn peek(container: &Container) -> Option<&Self>;
    fn into_container(self) -> Container;
}

macro_rules! stored {
    ($type:ty, $variant:ident, $description:literal) => {
        impl Stored for $type {
            const DESCRIPTION: &'static str = $description;
            fn peek(container: &Container) -> Option<&Self> {
                match container { Container::$variant(x) => Some(x), _ => None }
            }
            fn into_container(self) -> Container { Container::$variant(self) }
        }
    };
}

stored!(Vec<Electron>, Electrons, "electrons");
stored!(Vec<Muon    >, Muons    , "muons");
stored!(Vec<Jet     >, Jets     , "jets");
stored!(Vec<Tau     >, Taus     , "taus");
stored!(Vec<Photon  >, Photons  , "photons");
stored!(Vec<Track   >, Tracks   , "tracks");
stored!(Vec<Vertex  >, Vertices , "vertices");
stored!(AssociationMap, MetMap  , "a MET association map");
stored!(MetCore      , MetCore  , "a MET core container");

/// Read-only input for one event
#[derive(Clone, Debug, Default)]
pub struct EventStore {
    pub info: EventInfo,
    containers: HashMap<String, Container>,
}

impl EventStore {

    pub fn new(info: EventInfo) -> Self { Self { info, containers: HashMap::new() } }

    pub fn insert<T: Stored>(&mut self, key: impl Into<String>, value: T) {
        self.containers.insert(key.into(), value.into_container());
    }

    pub fn with<T: Stored>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Container> { self.containers.remove(key) }

    pub fn retrieve<T: Stored>(&self, key: &str) -> EventResult<&T> {
        let container = self.containers.get(key)
            .ok_or_else(|| EventError::MissingContainer(key.into()))?;
        T::peek(container).ok_or_else(|| EventError::WrongContainerType {
            key: key.into(),
            expected: T::DESCRIPTION,
            found: container.describe(),
        })
    }
}
