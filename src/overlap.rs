//! Resolution of ambiguities between objects of different kinds built from
//! the same detector activity.
//!
//! Nothing is ever removed from a collection: losers get `overlap = true`.
//! Only objects flagged `selected` take part, and at each step only objects
//! which have not themselves been flagged can cause others to be flagged.

use std::collections::BTreeMap;
use std::ops::AddAssign;

use crate::collection::Collection;
use crate::config::analysis::OverlapConfig;
use crate::record::{ElectronInfo, JetInfo, MuonInfo, ObjectInfo, ObjectKind, Particle, PhotonInfo, TauInfo};
use crate::tools::Accept;

/// Mutable views of the five collections taking part in the resolution
pub struct Objects<'a> {
    pub electrons: &'a mut Collection<ElectronInfo>,
    pub muons    : &'a mut Collection<MuonInfo>,
    pub jets     : &'a mut Collection<JetInfo>,
    pub taus     : &'a mut Collection<TauInfo>,
    pub photons  : &'a mut Collection<PhotonInfo>,
}

pub struct OverlapResolver<'a> {
    config : &'a OverlapConfig,
    btagger: &'a dyn Accept<JetInfo>,
}

impl<'a> OverlapResolver<'a> {

    pub fn new(config: &'a OverlapConfig, btagger: &'a dyn Accept<JetInfo>) -> Self { Self { config, btagger } }

    /// Write `overlap` on every object of every collection
    pub fn resolve(&self, objects: Objects) -> OverlapTallies {
        let Objects { electrons, muons, jets, taus, photons } = objects;
        let c = self.config;

        reset(electrons); reset(muons); reset(jets); reset(taus); reset(photons);

        flag(taus     , electrons, |t, e| t.p4.delta_r(&e.p4) < c.tau_electron);
        flag(taus     , muons    , |t, m| t.p4.delta_r(&m.p4) < c.tau_muon);
        flag(electrons, muons    , |e, m| share_track(e.info.track_id, m.info.track_id));
        flag(photons  , electrons, |p, e| p.p4.delta_r(&e.p4) < c.photon_electron);
        flag(photons  , muons    , |p, m| p.p4.delta_r(&m.p4) < c.photon_muon);
        flag(jets     , electrons, |j, e| {
            j.p4.delta_r(&e.p4) < c.jet_electron && !(c.btag_exemption && self.btagger.accept(j))
        });
        flag(electrons, jets     , |e, j| e.p4.delta_r(&j.p4) < c.electron_jet);
        flag(jets     , muons    , |j, m| {
            j.p4.delta_r(&m.p4) < c.jet_muon && j.info.n_tracks < c.jet_muon_max_tracks
        });
        flag(muons    , jets     , |m, j| m.p4.delta_r(&j.p4) < c.muon_jet);
        flag(jets     , taus     , |j, t| j.p4.delta_r(&t.p4) < c.jet_tau);
        flag(jets     , photons  , |j, p| j.p4.delta_r(&p.p4) < c.jet_photon);

        let mut tallies = OverlapTallies::default();
        tallies.count(electrons);
        tallies.count(muons);
        tallies.count(jets);
        tallies.count(taus);
        tallies.count(photons);
        tallies
    }
}

fn share_track(a: Option<u32>, b: Option<u32>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

fn takes_part<I: ObjectInfo>(p: &Particle<I>) -> bool { p.deco.selected.get() && !p.deco.overlap.get() }

fn reset<I: ObjectInfo>(objects: &mut Collection<I>) {
    for p in objects.iter_mut() { p.deco.overlap.set(false) }
}

/// Flag every participating object in `losers` which overlaps with any
/// participating object in `winners`
fn flag<A: ObjectInfo, B: ObjectInfo>(
    losers  : &mut Collection<A>,
    winners : &Collection<B>,
    overlaps: impl Fn(&Particle<A>, &Particle<B>) -> bool,
) {
    for loser in losers.iter_mut() {
        if !takes_part(loser) { continue }
        if winners.iter().filter(|w| takes_part(w)).any(|w| overlaps(loser, w)) {
            loser.deco.overlap.set(true);
        }
    }
}

// ----- Tallies ------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KindTally {
    pub selected: usize,
    pub removed : usize,
}

/// Numbers of objects entering the resolution, and of those flagged, per kind
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverlapTallies {
    per_kind: BTreeMap<ObjectKind, KindTally>,
}

impl OverlapTallies {

    fn count<I: ObjectInfo>(&mut self, objects: &Collection<I>) {
        let tally = self.per_kind.entry(I::KIND).or_default();
        for p in objects.iter().filter(|p| p.deco.selected.get()) {
            tally.selected += 1;
            tally.removed  += p.deco.overlap.get() as usize;
        }
    }

    pub fn get(&self, kind: ObjectKind) -> KindTally { self.per_kind.get(&kind).copied().unwrap_or_default() }

    /// Write the tallies to the log
    pub fn report(&self) {
        for kind in ObjectKind::ALL {
            let KindTally { selected, removed } = self.get(kind);
            info!(%kind, selected, removed, "overlap removal");
        }
    }
}

impl AddAssign<&Self> for OverlapTallies {
    fn add_assign(&mut self, rhs: &Self) {
        for (kind, t) in &rhs.per_kind {
            let mine = self.per_kind.entry(*kind).or_default();
            mine.selected += t.selected;
            mine.removed  += t.removed;
        }
    }
}


// ----- Imports ------------------------------------------------------------------------------------
use tracing::info;
