//! Hand-made events for the integration tests
#![allow(unused)]

use std::collections::BTreeSet;

use kinematics::FourMomentum;
use units::{gev, mm, Energy};

use vbfinv::event::{keys, EventInfo, EventStore};
use vbfinv::met::{AssociationMap, Contribution, MetCore};
use vbfinv::quality::{Vertex, VertexType};
use vbfinv::record::{Electron, ElectronInfo, Jet, JetInfo, Muon, MuonInfo, ObjectKind,
                     Photon, Quality, Tau, TauInfo};
use vbfinv::tracks::Track;

pub const ALGORITHM: &str = "AntiKt4EMTopo";

/// Builds an event in which every object owns one piece of detector activity
/// matching its momentum
pub struct EventBuilder {
    pub info     : EventInfo,
    pub electrons: Vec<Electron>,
    pub muons    : Vec<Muon>,
    pub jets     : Vec<Jet>,
    pub taus     : Vec<Tau>,
    pub photons  : Vec<Photon>,
    pub tracks   : Vec<Track>,
    pub vertices : Vec<Vertex>,
    pub soft     : Vec<Contribution>,
    contributions: Vec<Contribution>,
    links        : Vec<(ObjectKind, usize, usize)>,
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self {
            info: EventInfo {
                run_number: 280950, lumi_block: 100, event_number: 1, is_simulation: true,
                triggers: BTreeSet::from(["HLT_xe70_mht".to_string()]),
                ..Default::default()
            },
            electrons: vec![], muons: vec![], jets: vec![], taus: vec![], photons: vec![], tracks: vec![],
            vertices: vec![Vertex { kind: VertexType::Primary, n_tracks: 12, z: mm(0.0) }],
            soft: vec![], contributions: vec![], links: vec![],
        }
    }
}

impl EventBuilder {

    fn own_activity(&mut self, kind: ObjectKind, index: usize, p4: &FourMomentum) {
        self.contributions.push(Contribution::new(p4.px(), p4.py(), p4.pt));
        self.links.push((kind, index, self.contributions.len() - 1));
    }

    pub fn jet(self, pt: f64, eta: f64, phi: f64) -> Self {
        let info = JetInfo { jvt: 0.9, n_tracks: 8, ..Default::default() };
        self.add_jet(Jet::new(FourMomentum::massless(gev(pt), eta, phi), info))
    }

    pub fn add_jet(mut self, jet: Jet) -> Self {
        self.own_activity(ObjectKind::Jet, self.jets.len(), &jet.p4);
        self.jets.push(jet);
        self
    }

    pub fn muon(mut self, pt: f64, eta: f64, phi: f64) -> Self {
        let info = MuonInfo { quality: Quality::Medium, ..Default::default() };
        let muon = Muon::new(FourMomentum::massless(gev(pt), eta, phi), info);
        self.own_activity(ObjectKind::Muon, self.muons.len(), &muon.p4);
        self.muons.push(muon);
        self
    }

    pub fn electron(mut self, pt: f64, eta: f64, phi: f64) -> Self {
        let info = ElectronInfo { cluster_eta: eta, id: Quality::Tight, ..Default::default() };
        let electron = Electron::new(FourMomentum::massless(gev(pt), eta, phi), info);
        self.own_activity(ObjectKind::Electron, self.electrons.len(), &electron.p4);
        self.electrons.push(electron);
        self
    }

    pub fn tau(mut self, pt: f64, eta: f64, phi: f64) -> Self {
        let info = TauInfo { n_tracks: 1, charge: -1, id: Quality::Medium };
        let tau = Tau::new(FourMomentum::massless(gev(pt), eta, phi), info);
        self.own_activity(ObjectKind::Tau, self.taus.len(), &tau.p4);
        self.taus.push(tau);
        self
    }

    pub fn track(mut self, pt: f64, eta: f64, phi: f64) -> Self {
        let id = self.tracks.len() as u32 + 1000;
        self.tracks.push(Track {
            p4: FourMomentum::massless(gev(pt), eta, phi), id,
            n_silicon_hits: 10, chi2: 10.0, ndof: 10,
            d0: mm(0.01), z0: mm(0.1), vz: mm(0.0),
        });
        self
    }

    /// Unassociated activity in the MET core
    pub fn soft(mut self, px: f64, py: f64) -> Self {
        self.soft.push(Contribution::new(gev(px), gev(py), gev((px*px + py*py).sqrt())));
        self
    }

    pub fn vertices(mut self, vertices: Vec<Vertex>) -> Self {
        self.vertices = vertices;
        self
    }

    pub fn build(self) -> EventStore {
        let mut map = AssociationMap::new(self.contributions);
        for (kind, index, id) in self.links { map.link(kind, index, [id]) }
        EventStore::new(self.info)
            .with(keys::ELECTRONS, self.electrons)
            .with(keys::MUONS    , self.muons)
            .with(keys::jets(ALGORITHM), self.jets)
            .with(keys::TAUS     , self.taus)
            .with(keys::PHOTONS  , self.photons)
            .with(keys::TRACKS   , self.tracks)
            .with(keys::VERTICES , self.vertices)
            .with(keys::met_map (ALGORITHM), map)
            .with(keys::met_core(ALGORITHM), MetCore { soft: self.soft })
    }
}

/// Half the rapidity separation giving a 300 GeV dijet mass for back-to-back
/// 60 and 50 GeV jets: `2 pt1 pt2 (cosh Δη + 1) = mjj²`
pub fn half_gap_for_mjj_300() -> f64 { 14.0_f64.acosh() / 2.0 }

/// Passes every gate: two back-to-back forward jets, 200 GeV of missing
/// energy along +x
pub fn vbf_event() -> EventBuilder {
    let eta = half_gap_for_mjj_300();
    EventBuilder::default()
        .jet(60.0,  eta, 0.0)
        .jet(50.0, -eta, std::f64::consts::PI)
        // The jets leave 10 GeV along +x; the remaining invisible recoil
        // shows up as soft activity along -x
        .soft(-210.0, 0.0)
}
