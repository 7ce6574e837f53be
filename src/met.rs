//! Missing transverse energy, rebuilt from the calibrated objects and the
//! detector activity they were reconstructed from.
//!
//! Each piece of detector activity (`Contribution`) may enter the sum at most
//! once. The association map records which contributions each object was
//! built from; objects are processed in a fixed order of precedence and claim
//! the contributions they use, and whatever nobody claimed ends up in the
//! soft term.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, AddAssign};

use kinematics::Transverse;
use units::{ConstZero, Energy};
use units::todo::Phif64;

use crate::collection::Collection;
use crate::config::analysis::{JvtPolicy, MetConfig};
use crate::error::{EventError, EventResult};
use crate::record::{ElectronInfo, JetInfo, MuonInfo, ObjectInfo, ObjectKind, Particle, PhotonInfo, TauInfo};

// ----- Association map ----------------------------------------------------------------------------

/// A piece of detector activity: its transverse momentum and scalar
/// transverse energy
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contribution {
    pub px   : Energy,
    pub py   : Energy,
    pub sumet: Energy,
}

impl Contribution {
    pub fn new(px: Energy, py: Energy, sumet: Energy) -> Self { Self { px, py, sumet } }
    pub fn transverse(&self) -> Transverse { Transverse::new(self.px, self.py) }
}

/// Identifies an uncalibrated input object: its kind and position in the
/// input collection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub kind : ObjectKind,
    pub index: usize,
}

/// Which contributions each object was built from. Two objects linked to the
/// same contribution share that activity.
///
/// Read only: per-event bookkeeping lives in `MapUsage`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssociationMap {
    contributions: Vec<Contribution>,
    links: HashMap<ObjectKey, Vec<usize>>,
}

impl AssociationMap {

    pub fn new(contributions: Vec<Contribution>) -> Self { Self { contributions, links: HashMap::new() } }

    pub fn link(&mut self, kind: ObjectKind, index: usize, contributions: impl IntoIterator<Item = usize>) {
        self.links.entry(ObjectKey { kind, index }).or_default().extend(contributions);
    }

    pub fn with_link(mut self, kind: ObjectKind, index: usize, contributions: impl IntoIterator<Item = usize>) -> Self {
        self.link(kind, index, contributions);
        self
    }

    pub fn contributions(&self) -> &[Contribution] { &self.contributions }

    /// Contributions of the object, if it appears in the map
    pub fn links(&self, key: ObjectKey) -> Option<&[usize]> { self.links.get(&key).map(Vec::as_slice) }

    /// Every link must point at a stored contribution
    pub fn check(&self) -> EventResult<()> {
        let available = self.contributions.len();
        for (key, ids) in &self.links {
            if let Some(&contribution) = ids.iter().find(|&&id| id >= available) {
                return Err(EventError::BrokenAssociation { kind: key.kind, index: key.index, contribution, available })
            }
        }
        Ok(())
    }

    /// Fresh per-event bookkeeping: nothing used yet
    pub fn usage(&self) -> MapUsage<'_> {
        MapUsage { map: self, used: vec![None; self.contributions.len()] }
    }
}

/// Who, if anyone, has claimed each contribution of an `AssociationMap`
#[derive(Clone, Debug)]
pub struct MapUsage<'a> {
    map : &'a AssociationMap,
    used: Vec<Option<ObjectKind>>,
}

impl<'a> MapUsage<'a> {

    pub fn map(&self) -> &'a AssociationMap { self.map }

    pub fn reset(&mut self) { self.used.iter_mut().for_each(|u| *u = None) }

    pub fn consumer(&self, contribution: usize) -> Option<ObjectKind> { self.used[contribution] }

    /// Claim, for `kind`, those of `contributions` which are still free
    fn claim(&mut self, contributions: &[usize], kind: ObjectKind) {
        for &id in contributions {
            self.used[id].get_or_insert(kind);
        }
    }

    fn any_claimed(&self, contributions: &[usize]) -> bool {
        contributions.iter().any(|&id| self.used[id].is_some())
    }

    /// Sum of the listed contributions claimed by `kind`
    fn claimed_by(&self, contributions: &[usize], kind: ObjectKind) -> Contribution {
        let mut sum = Contribution::new(Energy::ZERO, Energy::ZERO, Energy::ZERO);
        for &id in contributions.iter().filter(|&&id| self.used[id] == Some(kind)) {
            let c = &self.map.contributions[id];
            sum.px += c.px;
            sum.py += c.py;
            sum.sumet += c.sumet;
        }
        sum
    }

    fn unclaimed(&self) -> impl Iterator<Item = &Contribution> + '_ {
        self.map.contributions.iter()
            .zip(&self.used)
            .filter_map(|(c, u)| u.is_none().then_some(c))
    }
}

/// Detector activity not associated with any object
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetCore {
    pub soft: Vec<Contribution>,
}

// ----- Terms --------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term { RefEle, RefGamma, RefTau, Muons, RefJet, SoftClus, Final }

impl Term {
    /// Terms which add up to `Final`
    pub const PARTS: [Term; 6] = [Self::RefEle, Self::RefGamma, Self::RefTau, Self::Muons, Self::RefJet, Self::SoftClus];

    pub fn name(self) -> &'static str {
        match self {
            Self::RefEle   => "RefEle",
            Self::RefGamma => "RefGamma",
            Self::RefTau   => "RefTau",
            Self::Muons    => "Muons",
            Self::RefJet   => "RefJet",
            Self::SoftClus => "SoftClus",
            Self::Final    => "Final",
        }
    }

    fn for_kind(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Electron => Self::RefEle,
            ObjectKind::Photon   => Self::RefGamma,
            ObjectKind::Tau      => Self::RefTau,
            ObjectKind::Muon     => Self::Muons,
            ObjectKind::Jet      => Self::RefJet,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(self.name()) }
}

/// Missing momentum components and scalar sum of one term
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetTerm {
    pub mpx  : Energy,
    pub mpy  : Energy,
    pub sumet: Energy,
}

impl MetTerm {

    pub const ZERO: Self = Self { mpx: Energy::ZERO, mpy: Energy::ZERO, sumet: Energy::ZERO };

    pub fn missing(&self) -> Transverse { Transverse::new(self.mpx, self.mpy) }
    pub fn met(&self) -> Energy { self.missing().magnitude() }
    pub fn phi(&self) -> Phif64 { self.missing().phi() }

    /// Visible momentum `p` with scalar sum `sumet` is missing in the opposite
    /// direction
    fn add_visible(&mut self, p: Transverse, sumet: Energy) {
        self.mpx   -= p.x;
        self.mpy   -= p.y;
        self.sumet += sumet;
    }
}

impl Default for MetTerm { fn default() -> Self { Self::ZERO } }

impl Add for MetTerm {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { mpx: self.mpx + rhs.mpx, mpy: self.mpy + rhs.mpy, sumet: self.sumet + rhs.sumet }
    }
}

impl AddAssign for MetTerm {
    fn add_assign(&mut self, rhs: Self) { *self = *self + rhs }
}

/// The named terms of the missing transverse energy, and their sum
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MissingEnergyRecord {
    terms: [MetTerm; 7],
}

impl MissingEnergyRecord {

    pub fn term(&self, term: Term) -> &MetTerm { &self.terms[term as usize] }

    /// Modifying a part leaves `Final` stale until `rebuild_final`
    pub fn term_mut(&mut self, term: Term) -> &mut MetTerm { &mut self.terms[term as usize] }

    /// Recompute `Final` as the sum of the other terms
    pub fn rebuild_final(&mut self) {
        self.terms[Term::Final as usize] = Term::PARTS.iter()
            .map(|&t| *self.term(t))
            .fold(MetTerm::ZERO, Add::add);
    }

    pub fn final_term(&self) -> &MetTerm { self.term(Term::Final) }
    pub fn met  (&self) -> Energy { self.final_term().met() }
    pub fn phi  (&self) -> Phif64 { self.final_term().phi() }
    pub fn sumet(&self) -> Energy { self.final_term().sumet }
}

// ----- Reconstruction -----------------------------------------------------------------------------

/// Outcome of building one term
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TermStatus {
    #[default]
    Ok,
    /// This many objects had no entry in the association map. They were
    /// added regardless.
    MissingAssociation(usize),
}

/// Calibrated objects entering the missing energy
#[derive(Clone, Copy)]
pub struct MetObjects<'a> {
    pub electrons: &'a Collection<ElectronInfo>,
    pub photons  : &'a Collection<PhotonInfo>,
    pub taus     : &'a Collection<TauInfo>,
    pub muons    : &'a Collection<MuonInfo>,
    pub jets     : &'a Collection<JetInfo>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetResult {
    pub record  : MissingEnergyRecord,
    pub statuses: Vec<(Term, TermStatus)>,
}

impl MetResult {
    /// Terms whose status was not `Ok`
    pub fn problems(&self) -> impl Iterator<Item = &(Term, TermStatus)> {
        self.statuses.iter().filter(|(_, s)| *s != TermStatus::Ok)
    }
}

pub struct MetMaker<'a> {
    pub config: &'a MetConfig,
    pub jvt   : &'a JvtPolicy,
}

impl MetMaker<'_> {

    /// Build every term from scratch. The usage of `map` is reset first, so
    /// rebuilding is idempotent.
    pub fn rebuild(&self, objects: MetObjects, usage: &mut MapUsage, core: &MetCore) -> EventResult<MetResult> {
        usage.map().check()?;
        usage.reset();
        let mut record = MissingEnergyRecord::default();
        let mut statuses = vec![];

        statuses.push(add_objects(objects.electrons, usage, &mut record));
        statuses.push(add_objects(objects.photons  , usage, &mut record));
        statuses.push(add_objects(objects.taus     , usage, &mut record));
        statuses.push(add_objects(objects.muons    , usage, &mut record));
        statuses.push(self.add_jets(objects.jets, usage, &mut record));

        let soft = record.term_mut(Term::SoftClus);
        for c in usage.unclaimed().chain(&core.soft) {
            soft.add_visible(c.transverse(), c.sumet);
        }
        statuses.push((Term::SoftClus, TermStatus::Ok));

        record.rebuild_final();
        Ok(MetResult { record, statuses })
    }

    /// Jets which share activity with a hard object, or with a jet added
    /// before them, are left out; their remaining activity ends up in the soft
    /// term. Energy deposited by muons
    /// is removed from the jets which contain it.
    fn add_jets(&self, jets: &Collection<JetInfo>, usage: &mut MapUsage, record: &mut MissingEnergyRecord) -> (Term, TermStatus) {
        let map = usage.map();
        let mut missing = 0;
        for (position, jet) in jets.iter().enumerate() {
            if !jet.is_baseline() { continue }
            if self.config.jet_jvt && !self.jvt.accepts(jet.pt(), jet.eta(), jet.jvt()) { continue }
            let links = map.links(key_of(jet, position));
            let Some(links) = links else {
                missing += 1;
                record.term_mut(Term::RefJet).add_visible(jet.p4.transverse(), jet.pt());
                continue
            };
            let shares_with_hard_object = links.iter().any(|&id| matches!(
                usage.consumer(id),
                Some(ObjectKind::Electron | ObjectKind::Photon | ObjectKind::Tau | ObjectKind::Jet)
            ));
            if shares_with_hard_object { continue }
            let p = if self.config.ghost_muons {
                jet.p4.transverse() - usage.claimed_by(links, ObjectKind::Muon).transverse()
            } else {
                jet.p4.transverse()
            };
            usage.claim(links, ObjectKind::Jet);
            record.term_mut(Term::RefJet).add_visible(p, p.magnitude());
        }
        (Term::RefJet, status(missing))
    }
}

fn key_of<I: ObjectInfo>(p: &Particle<I>, position: usize) -> ObjectKey {
    ObjectKey { kind: I::KIND, index: p.original().unwrap_or(position) }
}

fn status(missing: usize) -> TermStatus {
    if missing == 0 { TermStatus::Ok } else { TermStatus::MissingAssociation(missing) }
}

/// Add the baseline objects of one kind to their term, claiming their
/// activity. Objects sharing any activity with an object added before them
/// are skipped: their free contributions are left for the soft term.
fn add_objects<I: ObjectInfo>(objects: &Collection<I>, usage: &mut MapUsage, record: &mut MissingEnergyRecord) -> (Term, TermStatus) {
    let term = Term::for_kind(I::KIND);
    let map = usage.map();
    let mut missing = 0;
    for (position, p) in objects.iter().enumerate() {
        if !p.is_baseline() { continue }
        match map.links(key_of(p, position)) {
            None => missing += 1,
            Some(links) if usage.any_claimed(links) => continue,
            Some(links) => usage.claim(links, I::KIND),
        }
        record.term_mut(term).add_visible(p.p4.transverse(), p.pt());
    }
    (term, status(missing))
}

#[cfg(test)]
mod test_met {
    use super::*;
    use crate::record::{Electron, Jet, Muon};
    use float_eq::assert_float_eq;
    use kinematics::FourMomentum;
    use units::{gev, gev_};
    use std::f64::consts::PI;

    fn c(px: f64, py: f64) -> Contribution { Contribution::new(gev(px), gev(py), gev((px*px + py*py).sqrt())) }

    fn baseline<I: ObjectInfo>(p: Particle<I>) -> Particle<I> {
        let mut p = p;
        p.deco.baseline.set(true);
        p
    }

    struct Inputs {
        electrons: Collection<ElectronInfo>,
        photons  : Collection<PhotonInfo>,
        taus     : Collection<TauInfo>,
        muons    : Collection<MuonInfo>,
        jets     : Collection<JetInfo>,
    }

    impl Default for Inputs {
        fn default() -> Self {
            Self {
                electrons: Collection::decorated_copy(vec![]), photons: Collection::decorated_copy(vec![]), taus: Collection::decorated_copy(vec![]),
                muons: Collection::decorated_copy(vec![]), jets: Collection::decorated_copy(vec![]),
            }
        }
    }

    impl Inputs {
        fn objects(&self) -> MetObjects {
            MetObjects { electrons: &self.electrons, photons: &self.photons, taus: &self.taus,
                         muons: &self.muons, jets: &self.jets }
        }
    }

    fn rebuild(inputs: &Inputs, map: &AssociationMap, core: &MetCore) -> MetResult {
        let (config, jvt) = (MetConfig::default(), JvtPolicy::default());
        let maker = MetMaker { config: &config, jvt: &jvt };
        maker.rebuild(inputs.objects(), &mut map.usage(), core).unwrap()
    }

    fn electron(pt: f64, phi: f64) -> Electron {
        baseline(Electron::new(FourMomentum::massless(gev(pt), 0.0, phi), ElectronInfo::default()))
    }

    fn muon(pt: f64, phi: f64) -> Muon {
        baseline(Muon::new(FourMomentum::massless(gev(pt), 0.0, phi), MuonInfo::default()))
    }

    fn jet(pt: f64, phi: f64) -> Jet {
        let mut j = baseline(Jet::new(FourMomentum::massless(gev(pt), 0.0, phi), JetInfo::default()));
        j.deco.jvt = Some(0.9);
        j
    }

    #[test]
    fn empty_event() {
        let r = rebuild(&Inputs::default(), &AssociationMap::default(), &MetCore::default());
        assert_eq!(r.record, MissingEnergyRecord::default());
        assert_eq!(r.problems().count(), 0);
    }

    #[test]
    fn single_electron_balanced_by_nothing() {
        let map = AssociationMap::new(vec![c(50.0, 0.0)]).with_link(ObjectKind::Electron, 0, [0]);
        let inputs = Inputs { electrons: Collection::decorated_copy(vec![electron(55.0, 0.0)]), ..Default::default() };
        let r = rebuild(&inputs, &map, &MetCore::default());
        // Calibrated momentum enters, not the raw contribution
        assert_float_eq!(gev_(r.record.term(Term::RefEle).mpx), -55.0, abs <= 1e-9);
        assert_float_eq!(gev_(r.record.met()), 55.0, abs <= 1e-9);
        assert_float_eq!(r.record.phi().abs(), PI, abs <= 1e-9);
        assert_eq!(r.record.term(Term::SoftClus), &MetTerm::ZERO);
    }

    #[test]
    fn shared_activity_is_counted_once() {
        // The photon was built from the same cluster as the electron
        let map = AssociationMap::new(vec![c(40.0, 0.0)])
            .with_link(ObjectKind::Electron, 0, [0])
            .with_link(ObjectKind::Photon  , 0, [0]);
        let photon = baseline(crate::record::Photon::new(FourMomentum::massless(gev(40.0), 0.0, 0.0), PhotonInfo::default()));
        let inputs = Inputs {
            electrons: Collection::decorated_copy(vec![electron(40.0, 0.0)]),
            photons  : Collection::decorated_copy(vec![photon]),
            ..Default::default()
        };
        let r = rebuild(&inputs, &map, &MetCore::default());
        assert_float_eq!(gev_(r.record.term(Term::RefEle  ).mpx), -40.0, abs <= 1e-9);
        assert_float_eq!(gev_(r.record.term(Term::RefGamma).mpx),   0.0, abs <= 1e-9);
        assert_float_eq!(gev_(r.record.met()), 40.0, abs <= 1e-9);
    }

    #[test]
    fn partially_shared_activity_is_counted_once() {
        // The photon shares the electron cluster (0) and adds 5 GeV of its own (1)
        let map = AssociationMap::new(vec![c(40.0, 0.0), c(5.0, 0.0)])
            .with_link(ObjectKind::Electron, 0, [0])
            .with_link(ObjectKind::Photon  , 0, [0, 1]);
        let photon = baseline(crate::record::Photon::new(FourMomentum::massless(gev(45.0), 0.0, 0.0), PhotonInfo::default()));
        let inputs = Inputs {
            electrons: Collection::decorated_copy(vec![electron(40.0, 0.0)]),
            photons  : Collection::decorated_copy(vec![photon]),
            ..Default::default()
        };
        let r = rebuild(&inputs, &map, &MetCore::default());
        assert_float_eq!(gev_(r.record.term(Term::RefEle  ).mpx), -40.0, abs <= 1e-9);
        assert_float_eq!(gev_(r.record.term(Term::RefGamma).mpx),   0.0, abs <= 1e-9);
        assert_float_eq!(gev_(r.record.term(Term::SoftClus).mpx),  -5.0, abs <= 1e-9);
        // Only 45 GeV of activity in the event
        assert_float_eq!(gev_(r.record.met()), 45.0, abs <= 1e-9);
        assert_float_eq!(gev_(r.record.final_term().sumet), 45.0, abs <= 1e-9);
    }

    #[test]
    fn jets_sharing_with_earlier_jets_are_left_out() {
        let map = AssociationMap::new(vec![c(30.0, 0.0), c(20.0, 0.0)])
            .with_link(ObjectKind::Jet, 0, [0])
            .with_link(ObjectKind::Jet, 1, [0, 1]);
        let inputs = Inputs {
            jets: Collection::decorated_copy(vec![jet(30.0, 0.0), jet(50.0, 0.0)]),
            ..Default::default()
        };
        let r = rebuild(&inputs, &map, &MetCore::default());
        assert_float_eq!(gev_(r.record.term(Term::RefJet  ).mpx), -30.0, abs <= 1e-9);
        assert_float_eq!(gev_(r.record.term(Term::SoftClus).mpx), -20.0, abs <= 1e-9);
        assert_float_eq!(gev_(r.record.met()), 50.0, abs <= 1e-9);
    }

    #[test]
    fn missing_association_still_adds_object() {
        let inputs = Inputs { muons: Collection::decorated_copy(vec![muon(30.0, 0.0)]), ..Default::default() };
        let r = rebuild(&inputs, &AssociationMap::default(), &MetCore::default());
        assert_float_eq!(gev_(r.record.term(Term::Muons).mpx), -30.0, abs <= 1e-9);
        let problems: Vec<_> = r.problems().copied().collect();
        assert_eq!(problems, vec![(Term::Muons, TermStatus::MissingAssociation(1))]);
    }

    #[test]
    fn non_baseline_objects_are_ignored() {
        let mut e = electron(30.0, 0.0);
        e.deco.baseline.set(false);
        let map = AssociationMap::new(vec![c(30.0, 0.0)]).with_link(ObjectKind::Electron, 0, [0]);
        let inputs = Inputs { electrons: Collection::decorated_copy(vec![e]), ..Default::default() };
        let r = rebuild(&inputs, &map, &MetCore::default());
        assert_eq!(r.record.term(Term::RefEle), &MetTerm::ZERO);
        // Its activity was not claimed, so it is soft
        assert_float_eq!(gev_(r.record.term(Term::SoftClus).mpx), -30.0, abs <= 1e-9);
    }

    #[test]
    fn jets_sharing_with_electrons_are_left_out() {
        // Jet 0 contains the electron cluster (0) and some extra activity (1)
        let map = AssociationMap::new(vec![c(40.0, 0.0), c(5.0, 0.0), c(0.0, 30.0)])
            .with_link(ObjectKind::Electron, 0, [0])
            .with_link(ObjectKind::Jet     , 0, [0, 1])
            .with_link(ObjectKind::Jet     , 1, [2]);
        let inputs = Inputs {
            electrons: Collection::decorated_copy(vec![electron(40.0, 0.0)]),
            jets     : Collection::decorated_copy(vec![jet(46.0, 0.0), jet(30.0, PI / 2.0)]),
            ..Default::default()
        };
        let r = rebuild(&inputs, &map, &MetCore::default());
        let jet_term = r.record.term(Term::RefJet);
        assert_float_eq!(gev_(jet_term.mpx),   0.0, abs <= 1e-9);
        assert_float_eq!(gev_(jet_term.mpy), -30.0, abs <= 1e-9);
        assert_float_eq!(gev_(r.record.term(Term::SoftClus).mpx), -5.0, abs <= 1e-9);
    }

    #[test]
    fn muon_deposits_are_removed_from_jets() {
        let map = AssociationMap::new(vec![c(3.0, 0.0), c(50.0, 0.0)])
            .with_link(ObjectKind::Muon, 0, [0])
            .with_link(ObjectKind::Jet , 0, [0, 1]);
        let inputs = Inputs {
            muons: Collection::decorated_copy(vec![muon(20.0, 0.0)]),
            jets : Collection::decorated_copy(vec![jet(53.0, 0.0)]),
            ..Default::default()
        };
        let r = rebuild(&inputs, &map, &MetCore::default());
        assert_float_eq!(gev_(r.record.term(Term::Muons ).mpx), -20.0, abs <= 1e-9);
        assert_float_eq!(gev_(r.record.term(Term::RefJet).mpx), -50.0, abs <= 1e-9);
        assert_float_eq!(gev_(r.record.met()), 70.0, abs <= 1e-9);
    }

    #[test]
    fn jets_failing_pileup_policy_become_soft() {
        let map = AssociationMap::new(vec![c(30.0, 0.0)]).with_link(ObjectKind::Jet, 0, [0]);
        let mut pileup = jet(30.0, 0.0);
        pileup.deco.jvt = Some(0.1);
        let inputs = Inputs { jets: Collection::decorated_copy(vec![pileup]), ..Default::default() };
        let r = rebuild(&inputs, &map, &MetCore::default());
        assert_eq!(r.record.term(Term::RefJet), &MetTerm::ZERO);
        assert_float_eq!(gev_(r.record.term(Term::SoftClus).mpx), -30.0, abs <= 1e-9);
    }

    #[test]
    fn core_soft_activity_enters_soft_term() {
        let core = MetCore { soft: vec![c(-10.0, 0.0), c(0.0, -5.0)] };
        let r = rebuild(&Inputs::default(), &AssociationMap::default(), &core);
        let soft = r.record.term(Term::SoftClus);
        assert_float_eq!(gev_(soft.mpx  ), 10.0, abs <= 1e-9);
        assert_float_eq!(gev_(soft.mpy  ),  5.0, abs <= 1e-9);
        assert_float_eq!(gev_(soft.sumet), 15.0, abs <= 1e-9);
    }

    #[test]
    fn final_is_sum_of_parts_and_rebuild_is_idempotent() {
        let map = AssociationMap::new(vec![c(40.0, 0.0), c(3.0, 1.0), c(50.0, 10.0), c(-7.0, 2.0)])
            .with_link(ObjectKind::Electron, 0, [0])
            .with_link(ObjectKind::Muon    , 0, [1])
            .with_link(ObjectKind::Jet     , 0, [1, 2]);
        let inputs = Inputs {
            electrons: Collection::decorated_copy(vec![electron(41.0, 0.0)]),
            muons    : Collection::decorated_copy(vec![muon(25.0, 0.3)]),
            jets     : Collection::decorated_copy(vec![jet(52.0, 0.2)]),
            ..Default::default()
        };
        let core = MetCore { soft: vec![c(1.0, -1.0)] };
        let (config, jvt) = (MetConfig::default(), JvtPolicy::default());
        let maker = MetMaker { config: &config, jvt: &jvt };
        let mut usage = map.usage();
        let first  = maker.rebuild(inputs.objects(), &mut usage, &core).unwrap();
        let second = maker.rebuild(inputs.objects(), &mut usage, &core).unwrap();
        assert_eq!(first, second);

        let sum = Term::PARTS.iter().fold(MetTerm::ZERO, |acc, &t| acc + *first.record.term(t));
        assert_eq!(first.record.final_term(), &sum);

        // Summing in another order agrees up to rounding
        let reversed = Term::PARTS.iter().rev().fold(MetTerm::ZERO, |acc, &t| acc + *first.record.term(t));
        assert_float_eq!(gev_(reversed.mpx  ), gev_(sum.mpx  ), abs <= 1e-9);
        assert_float_eq!(gev_(reversed.mpy  ), gev_(sum.mpy  ), abs <= 1e-9);
        assert_float_eq!(gev_(reversed.sumet), gev_(sum.sumet), abs <= 1e-9);

        let mut record = first.record.clone();
        record.rebuild_final();
        record.rebuild_final();
        assert_eq!(record, first.record);
    }

    #[test]
    fn broken_link_is_fatal() {
        let map = AssociationMap::new(vec![c(1.0, 0.0)]).with_link(ObjectKind::Tau, 3, [0, 5]);
        let (config, jvt) = (MetConfig::default(), JvtPolicy::default());
        let maker = MetMaker { config: &config, jvt: &jvt };
        let error = maker.rebuild(Inputs::default().objects(), &mut map.usage(), &MetCore::default()).unwrap_err();
        assert_eq!(error, EventError::BrokenAssociation { kind: ObjectKind::Tau, index: 3, contribution: 5, available: 1 });
    }

    #[test]
    fn usage_reset() {
        let map = AssociationMap::new(vec![c(1.0, 0.0), c(2.0, 0.0)]);
        let mut usage = map.usage();
        usage.claim(&[1], ObjectKind::Muon);
        usage.claim(&[1], ObjectKind::Jet);
        assert_eq!(usage.consumer(1), Some(ObjectKind::Muon));
        assert_eq!(usage.consumer(0), None);
        usage.reset();
        assert_eq!(usage.consumer(1), None);
    }
}
