//! Toy event generator: crude but self-consistent events for exercising the
//! selection end to end without any upstream reconstruction.
//!
//! Every generated object gets its own piece of detector activity in the
//! association map. Electrons close to a jet also share that jet's activity,
//! as real electrons share calorimeter clusters with the jets they sit in. An
//! invisible system recoiling against the visible objects is added to the MET
//! core's soft activity, with opposite sign, so that the events carry genuine
//! missing energy.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use itertools::Itertools;
use rand::prelude::*;
use rand_distr::{Exp, Normal, Uniform};

use kinematics::FourMomentum;
use units::{gev, gev_, mm};

use crate::event::{keys, DetectorFlags, EventInfo, EventStore};
use crate::met::{AssociationMap, Contribution, MetCore};
use crate::quality::{Vertex, VertexType};
use crate::record::{Electron, ElectronInfo, Jet, JetInfo, Muon, MuonInfo, ObjectKind,
                    Photon, PhotonInfo, Quality, Tau, TauInfo, TrackId};
use crate::tracks::Track;

/// Knobs of the generator
#[derive(Clone, Debug)]
pub struct ToySettings {
    pub run_number   : u32,
    pub is_simulation: bool,
    pub jet_algorithm: String,
    /// Fired by every event with large true missing energy, and some others
    pub trigger      : String,
    /// Mean pt of the invisible system, in GeV
    pub invisible_pt : f64,
}

impl Default for ToySettings {
    fn default() -> Self {
        Self {
            run_number   : 280950,
            is_simulation: true,
            jet_algorithm: "AntiKt4EMTopo".into(),
            trigger      : "HLT_xe70_mht".into(),
            invisible_pt : 120.0,
        }
    }
}

pub struct ToyGenerator {
    settings: ToySettings,
    rng     : StdRng,
    next_event: u64,
}

impl ToyGenerator {

    pub fn new(settings: ToySettings, seed: u64) -> Self {
        Self { settings, rng: StdRng::seed_from_u64(seed), next_event: 0 }
    }

    pub fn events(&mut self, n: usize) -> Vec<EventStore> { (0..n).map(|_| self.event()).collect_vec() }

    pub fn event(&mut self) -> EventStore {
        let s = &self.settings;
        let (run_number, is_simulation) = (s.run_number, s.is_simulation);
        let (algorithm, trigger, invisible_pt) = (s.jet_algorithm.clone(), s.trigger.clone(), s.invisible_pt);
        let rng = &mut self.rng;
        self.next_event += 1;

        let jets: Vec<Jet> = (0..rng.gen_range(1..=5)).map(|_| toy_jet(rng)).collect();
        let electrons: Vec<Electron> = (0..rare_count(rng, 0.15)).map(|_| toy_electron(rng)).collect();
        let muons    : Vec<Muon>     = (0..rare_count(rng, 0.15)).map(|_| toy_muon(rng)).collect();
        let taus     : Vec<Tau>      = (0..rare_count(rng, 0.05)).map(|_| toy_tau(rng)).collect();
        let photons  : Vec<Photon>   = (0..rare_count(rng, 0.05)).map(|_| toy_photon(rng)).collect();

        // ----- Detector activity -----
        let mut contributions = vec![];
        let mut map_links: Vec<(ObjectKind, usize, Vec<usize>)> = vec![];
        let mut own = |kind, index, p4: &FourMomentum| {
            contributions.push(activity(p4));
            map_links.push((kind, index, vec![contributions.len() - 1]));
        };
        for (i, j) in jets     .iter().enumerate() { own(ObjectKind::Jet     , i, &j.p4) }
        for (i, e) in electrons.iter().enumerate() { own(ObjectKind::Electron, i, &e.p4) }
        for (i, m) in muons    .iter().enumerate() { own(ObjectKind::Muon    , i, &m.p4) }
        for (i, t) in taus     .iter().enumerate() { own(ObjectKind::Tau     , i, &t.p4) }
        for (i, p) in photons  .iter().enumerate() { own(ObjectKind::Photon  , i, &p.p4) }
        // Electrons inside jets share the jet's activity. Jets come first, so
        // jet `j` owns contribution `j`.
        for (i, e) in electrons.iter().enumerate() {
            let Some(j) = jets.iter().position(|j| j.p4.delta_r(&e.p4) < 0.2) else { continue };
            if let Some(link) = map_links.iter_mut().find(|(k, n, _)| *k == ObjectKind::Electron && *n == i) {
                link.2.push(j);
            }
        }
        let mut map = AssociationMap::new(contributions);
        for (kind, index, ids) in map_links { map.link(kind, index, ids) }

        // ----- Soft activity and the invisible system -----
        let invisible = FourMomentum::massless(gev(sample(rng, Exp::new(1.0 / invisible_pt))), 0.0, rng.gen_range(-PI..PI));
        let mut soft = (0..rng.gen_range(0..4))
            .map(|_| activity(&FourMomentum::massless(gev(rng.gen_range(0.5..5.0)), 0.0, rng.gen_range(-PI..PI))))
            .collect_vec();
        // Visible activity balancing the invisible system is not reconstructed
        // as an object: it shows up as a negative soft contribution.
        soft.push(Contribution::new(-invisible.px(), -invisible.py(), gev(0.0)));
        let core = MetCore { soft };

        // ----- Tracks and vertices -----
        let pv_z = mm(sample(rng, Normal::new(0.0, 40.0)));
        let mut tracks = vec![];
        for j in &jets {
            for _ in 0..rng.gen_range(2..6) {
                let eta = j.eta() + rng.gen_range(-0.1..0.1);
                let phi = j.phi() + rng.gen_range(-0.1..0.1);
                tracks.push(toy_track(rng, tracks.len() as TrackId, gev_(j.pt()) / 5.0, eta, phi, pv_z));
            }
        }
        let mut electrons = electrons;
        let mut muons = muons;
        for e in &mut electrons {
            let id = tracks.len() as TrackId;
            tracks.push(toy_track(rng, id, gev_(e.pt()), e.eta(), e.phi(), pv_z));
            e.info.track_id = Some(id);
            e.info.track.vz = pv_z;
        }
        for m in &mut muons {
            let id = tracks.len() as TrackId;
            tracks.push(toy_track(rng, id, gev_(m.pt()), m.eta(), m.phi(), pv_z));
            m.info.track_id = Some(id);
            m.info.track.vz = pv_z;
        }
        let vertices = if rng.gen_bool(0.01) { vec![] }
                       else { vec![Vertex { kind: VertexType::Primary, n_tracks: tracks.len().max(2), z: pv_z }] };

        // ----- Event information -----
        let triggers: BTreeSet<String> = if gev_(invisible.pt) > 70.0 || rng.gen_bool(0.1) {
            [trigger].into_iter().collect()
        } else { BTreeSet::new() };
        let info = EventInfo {
            run_number,
            lumi_block: rng.gen_range(1..400),
            event_number: self.next_event,
            is_simulation,
            detector: DetectorFlags { lar_error: rng.gen_bool(0.005), ..Default::default() },
            triggers,
            beam_spot: Default::default(),
        };

        EventStore::new(info)
            .with(keys::ELECTRONS, electrons)
            .with(keys::MUONS    , muons)
            .with(keys::jets(&algorithm), jets)
            .with(keys::TAUS     , taus)
            .with(keys::PHOTONS  , photons)
            .with(keys::TRACKS   , tracks)
            .with(keys::VERTICES , vertices)
            .with(keys::met_map (&algorithm), map)
            .with(keys::met_core(&algorithm), core)
    }
}

fn sample<D: Distribution<f64>>(rng: &mut StdRng, d: Result<D, impl std::fmt::Debug>) -> f64 {
    match d { Ok(d) => d.sample(rng), Err(_) => 0.0 }
}

/// Zero, one or occasionally two
fn rare_count(rng: &mut StdRng, p: f64) -> usize {
    if !rng.gen_bool(p) { 0 } else if rng.gen_bool(0.8) { 1 } else { 2 }
}

fn activity(p4: &FourMomentum) -> Contribution { Contribution::new(p4.px(), p4.py(), p4.pt) }

fn toy_p4(rng: &mut StdRng, pt_min: f64, mean_excess: f64, eta_max: f64) -> FourMomentum {
    let pt = pt_min + sample(rng, Exp::new(1.0 / mean_excess));
    FourMomentum::massless(gev(pt), rng.sample(Uniform::new(-eta_max, eta_max)), rng.gen_range(-PI..PI))
}

fn toy_jet(rng: &mut StdRng) -> Jet {
    let info = JetInfo {
        jvt       : rng.gen_range(0.0..1.0),
        btag_score: rng.gen_range(0.0..1.0),
        n_tracks  : rng.gen_range(0..20),
        cleaning  : Default::default(),
    };
    Jet::new(toy_p4(rng, 20.0, 40.0, 4.5), info)
}

fn quality(rng: &mut StdRng) -> Quality {
    *[Quality::Loose, Quality::Medium, Quality::Tight].choose(rng).unwrap_or(&Quality::Loose)
}

fn toy_electron(rng: &mut StdRng) -> Electron {
    let p4 = toy_p4(rng, 7.0, 20.0, 2.5);
    let info = ElectronInfo { cluster_eta: p4.eta, id: quality(rng), ..Default::default() };
    Electron::new(p4, info)
}

fn toy_muon(rng: &mut StdRng) -> Muon {
    let info = MuonInfo { quality: quality(rng), ..Default::default() };
    Muon::new(toy_p4(rng, 7.0, 20.0, 2.7), info)
}

fn toy_tau(rng: &mut StdRng) -> Tau {
    let info = TauInfo { n_tracks: *[1, 3].choose(rng).unwrap_or(&1), charge: 1, id: quality(rng) };
    Tau::new(toy_p4(rng, 20.0, 20.0, 2.5), info)
}

fn toy_photon(rng: &mut StdRng) -> Photon {
    let p4 = toy_p4(rng, 20.0, 20.0, 2.37);
    let info = PhotonInfo { cluster_eta: p4.eta, id: quality(rng), ..Default::default() };
    Photon::new(p4, info)
}

fn toy_track(rng: &mut StdRng, id: TrackId, pt: f64, eta: f64, phi: f64, pv_z: units::Length) -> Track {
    Track {
        p4: FourMomentum::massless(gev(pt), eta, phi),
        id,
        n_silicon_hits: rng.gen_range(6..14),
        chi2: rng.gen_range(5.0..40.0),
        ndof: 10,
        d0: mm(sample(rng, Normal::new(0.0, 0.05))),
        z0: mm(sample(rng, Normal::new(0.0, 0.5))),
        vz: pv_z,
    }
}

#[cfg(test)]
mod test_toy {
    use super::*;
    use crate::config::Config;
    use crate::pipeline::Analysis;
    use crate::tools::Tools;

    #[test]
    fn same_seed_same_events() {
        let a = ToyGenerator::new(ToySettings::default(), 42).events(20);
        let b = ToyGenerator::new(ToySettings::default(), 42).events(20);
        for (a, b) in a.iter().zip(&b) {
            assert_eq!(a.info, b.info);
            assert_eq!(a.retrieve::<Vec<Jet>>("AntiKt4EMTopoJets").unwrap(),
                       b.retrieve::<Vec<Jet>>("AntiKt4EMTopoJets").unwrap());
        }
    }

    #[test]
    fn toy_events_are_complete() {
        let analysis = Analysis::new(Config::default(), Tools::default());
        let events = ToyGenerator::new(ToySettings::default(), 1).events(200);
        let summary = analysis.run(&events);
        assert_eq!(summary.failed, 0);
        assert!(summary.cutflow.is_monotonic());
        assert_eq!(summary.cutflow.count(crate::cutflow::Gate::All), 200);
    }

    #[test]
    fn parallel_run_agrees_with_sequential() {
        let analysis = Analysis::new(Config::default(), Tools::default());
        let events = ToyGenerator::new(ToySettings::default(), 7).events(300);
        let sequential = analysis.run(&events);
        let parallel   = analysis.run_parallel(&events, 16);
        assert_eq!(sequential.cutflow, parallel.cutflow);
        assert_eq!(sequential.overlap, parallel.overlap);
        assert_eq!(sequential.histograms.entries(), parallel.histograms.entries());
    }

    #[test]
    fn smeared_parallel_run_agrees_with_sequential() {
        let mut config = Config::default();
        config.calibration.jet.smearing = 0.2;
        config.calibration.electron.smearing = 0.05;
        let analysis = Analysis::new(config, Tools::default()).with_seed(11);
        let events = ToyGenerator::new(ToySettings::default(), 7).events(300);
        let sequential = analysis.run(&events);
        let parallel   = analysis.run_parallel(&events, 16);
        assert!(sequential.calibration.applied > 0);
        assert_eq!(sequential.calibration, parallel.calibration);
        assert_eq!(sequential.cutflow, parallel.cutflow);
        assert_eq!(sequential.overlap, parallel.overlap);
        assert_eq!(sequential.histograms.entries(), parallel.histograms.entries());
    }
}
