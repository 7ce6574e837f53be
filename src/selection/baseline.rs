//! Loose, per-type object definitions. Their output feeds the overlap removal.

use crate::collection::Collection;
use crate::config::Config;
use crate::record::{Electron, ElectronInfo, Jet, JetInfo, Muon, MuonInfo, ObjectInfo,
                    Photon, PhotonInfo, Tau, TauInfo};
use crate::tools::Tools;

use super::{Classify, EventContext, d0_significance, in_crack, z0_sin_theta};

/// Baseline definitions of all object kinds, for one configuration and one
/// set of tools.
pub struct Baseline<'a> {
    pub config: &'a Config,
    pub tools : &'a Tools,
}

impl Classify<ElectronInfo> for Baseline<'_> {
    fn accept(&self, e: &Electron, ctx: &EventContext) -> bool {
        let cuts = &self.config.electron.baseline;
        e.pt() >= cuts.pt
            && e.info.cluster_eta.abs() < cuts.eta_max
            && !in_crack(e.info.cluster_eta, cuts.crack)
            && e.info.good_oq
            && self.tools.electron_id.accept(e)
            && z0_sin_theta(&e.info.track, ctx.pv_z) < cuts.z0_sin_theta
            && d0_significance(&e.info.track, &ctx.beam_spot) < cuts.d0_significance
            && (!cuts.isolation || self.tools.electron_isolation.accept(e))
    }
}

impl Classify<MuonInfo> for Baseline<'_> {
    fn accept(&self, m: &Muon, ctx: &EventContext) -> bool {
        let cuts = &self.config.muon.baseline;
        m.pt() >= cuts.pt
            && m.eta().abs() < cuts.eta_max
            && self.tools.muon_id.accept(m)
            && z0_sin_theta(&m.info.track, ctx.pv_z) < cuts.z0_sin_theta
            && d0_significance(&m.info.track, &ctx.beam_spot) < cuts.d0_significance
            && (!cuts.isolation || self.tools.muon_isolation.accept(m))
    }
}

impl Classify<JetInfo> for Baseline<'_> {
    fn accept(&self, j: &Jet, _: &EventContext) -> bool {
        let cuts = &self.config.jet.baseline;
        j.pt() >= cuts.pt && j.eta().abs() < cuts.eta_max
    }
}

impl Classify<TauInfo> for Baseline<'_> {
    fn accept(&self, t: &Tau, _: &EventContext) -> bool {
        let cuts = &self.config.tau.baseline;
        t.pt() >= cuts.pt
            && t.eta().abs() < cuts.eta_max
            && !in_crack(t.eta(), cuts.crack)
            && cuts.n_tracks.contains(&t.info.n_tracks)
            && t.info.charge.abs() == 1
            && self.tools.tau_id.accept(t)
    }
}

impl Classify<PhotonInfo> for Baseline<'_> {
    fn accept(&self, p: &Photon, _: &EventContext) -> bool {
        let cuts = &self.config.photon.baseline;
        p.pt() >= cuts.pt
            && p.info.cluster_eta.abs() < cuts.eta_max
            && !in_crack(p.info.cluster_eta, cuts.crack)
            && p.info.good_oq
            && self.tools.photon_id.accept(p)
            && (!cuts.isolation || self.tools.photon_isolation.accept(p))
    }
}

/// Write `baseline`, and the overlap-removal input flag `selected`, on every
/// object. Returns the number of baseline objects.
pub fn decorate_baseline<I: ObjectInfo>(
    objects : &mut Collection<I>,
    classify: &impl Classify<I>,
    ctx     : &EventContext,
) -> usize {
    let mut n = 0;
    for object in objects.iter_mut() {
        let pass = classify.accept(object, ctx);
        object.deco.baseline.set(pass);
        object.deco.selected.set(pass);
        n += pass as usize;
    }
    n
}

#[cfg(test)]
mod test_baseline {
    use super::*;
    use crate::event::BeamSpot;
    use crate::record::{Quality, TrackParameters};
    use crate::tools::WorkingPoint;
    use kinematics::FourMomentum;
    use rstest::rstest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use units::{gev, mm, ConstZero, Length};

    fn ctx() -> EventContext {
        EventContext { is_simulation: true, pv_z: Length::ZERO, beam_spot: BeamSpot::default() }
    }

    fn electron(pt: f64, eta: f64) -> Electron {
        let info = ElectronInfo { cluster_eta: eta, id: Quality::Tight, ..Default::default() };
        Electron::new(FourMomentum::massless(gev(pt), eta, 0.0), info)
    }

    fn muon(pt: f64, eta: f64) -> Muon {
        let info = MuonInfo { quality: Quality::Medium, ..Default::default() };
        Muon::new(FourMomentum::massless(gev(pt), eta, 0.0), info)
    }

    fn tau(pt: f64, eta: f64, n_tracks: u8, charge: i8) -> Tau {
        let info = TauInfo { n_tracks, charge, id: Quality::Medium };
        Tau::new(FourMomentum::massless(gev(pt), eta, 0.0), info)
    }

    fn photon(pt: f64, eta: f64) -> Photon {
        let info = PhotonInfo { cluster_eta: eta, id: Quality::Tight, ..Default::default() };
        Photon::new(FourMomentum::massless(gev(pt), eta, 0.0), info)
    }

    #[rstest(/**/ pt, eta, expected,
             case(10.0, 0.5 , true ),
             case( 7.0, 0.5 , true ), // pt threshold is inclusive
             case( 6.9, 0.5 , false),
             case(10.0, 2.5 , false),
             case(10.0, 1.45, false), // crack
             case(10.0, 1.60, true ),
    )]
    fn electron_kinematics(pt: f64, eta: f64, expected: bool) {
        let (config, tools) = (Config::default(), Tools::default());
        let baseline = Baseline { config: &config, tools: &tools };
        assert_eq!(baseline.accept(&electron(pt, eta), &ctx()), expected);
    }

    #[test]
    fn electron_object_quality_and_id() {
        let (config, tools) = (Config::default(), Tools::default());
        let baseline = Baseline { config: &config, tools: &tools };
        let mut e = electron(20.0, 0.0);
        e.info.good_oq = false;
        assert!(!baseline.accept(&e, &ctx()));
        let mut e = electron(20.0, 0.0);
        e.info.id = Quality::VeryLoose;
        assert!(!baseline.accept(&e, &ctx()));
    }

    #[rstest(/**/ z0, d0, expected,
             case(0.1, 0.01, true ),
             case(0.6, 0.01, false), // |z0 sinθ| > 0.5 mm
             case(0.1, 0.06, false), // d0/σ = 6 > 5
    )]
    fn electron_impact_parameters(z0: f64, d0: f64, expected: bool) {
        let (config, tools) = (Config::default(), Tools::default());
        let baseline = Baseline { config: &config, tools: &tools };
        let mut e = electron(20.0, 0.0);
        e.info.track = TrackParameters { z0: mm(z0), d0: mm(d0), d0_sigma: mm(0.01), ..Default::default() };
        assert_eq!(baseline.accept(&e, &ctx()), expected);
    }

    #[test]
    fn z0_is_measured_from_the_primary_vertex() {
        let (config, tools) = (Config::default(), Tools::default());
        let baseline = Baseline { config: &config, tools: &tools };
        let mut m = muon(20.0, 0.0);
        m.info.track.z0 = mm(10.0);
        assert!(!baseline.accept(&m, &ctx()));
        let ctx = EventContext { pv_z: mm(10.1), ..ctx() };
        assert!( baseline.accept(&m, &ctx));
    }

    #[test]
    fn soft_objects_never_reach_the_tools() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let tools = Tools {
            electron_id: Box::new(move |_: &Electron| { counted.fetch_add(1, Ordering::SeqCst); true }),
            ..Tools::default()
        };
        let config = Config::default();
        let baseline = Baseline { config: &config, tools: &tools };
        assert!(!baseline.accept(&electron(3.0, 0.0), &ctx()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!( baseline.accept(&electron(30.0, 0.0), &ctx()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn isolation_is_optional() {
        let mut config = Config::default();
        let tools = Tools { muon_isolation: Box::new(|_: &Muon| false), ..Tools::default() };
        assert!( Baseline { config: &config, tools: &tools }.accept(&muon(20.0, 0.0), &ctx()));
        config.muon.baseline.isolation = true;
        assert!(!Baseline { config: &config, tools: &tools }.accept(&muon(20.0, 0.0), &ctx()));
    }

    #[rstest(/**/ n_tracks, charge, eta, expected,
             case(1,  1, 0.0 , true ),
             case(3, -1, 0.0 , true ),
             case(2,  1, 0.0 , false),
             case(1,  0, 0.0 , false),
             case(3,  3, 0.0 , false),
             case(1,  1, 1.40, false),
             case(1,  1, 2.60, false),
    )]
    fn tau_definition(n_tracks: u8, charge: i8, eta: f64, expected: bool) {
        let (config, tools) = (Config::default(), Tools::default());
        let baseline = Baseline { config: &config, tools: &tools };
        assert_eq!(baseline.accept(&tau(30.0, eta, n_tracks, charge), &ctx()), expected);
    }

    #[test]
    fn photon_needs_tight_id_and_isolation() {
        let config = Config::default();
        let tools = Tools { photon_id: Box::new(WorkingPoint { minimum: Quality::Tight }), ..Tools::default() };
        let baseline = Baseline { config: &config, tools: &tools };
        assert!(baseline.accept(&photon(30.0, 0.2), &ctx()));
        let mut p = photon(30.0, 0.2);
        p.info.id = Quality::Medium;
        assert!(!baseline.accept(&p, &ctx()));
        let mut p = photon(30.0, 0.2);
        p.info.topoetcone40 = gev(10.0);
        assert!(!baseline.accept(&p, &ctx()));
    }

    #[test]
    fn decorate_writes_baseline_and_selected() {
        let (config, tools) = (Config::default(), Tools::default());
        let baseline = Baseline { config: &config, tools: &tools };
        let input = vec![
            Jet::new(FourMomentum::massless(gev(40.0), 0.0, 0.0), JetInfo::default()),
            Jet::new(FourMomentum::massless(gev(10.0), 0.0, 0.0), JetInfo::default()),
            Jet::new(FourMomentum::massless(gev(40.0), 4.9, 0.0), JetInfo::default()),
        ];
        let mut jets = Collection::working_copy(&input);
        assert_eq!(decorate_baseline(&mut jets, &baseline, &ctx()), 1);
        let flags: Vec<_> = jets.iter().map(|j| (j.deco.baseline.get(), j.deco.selected.get())).collect();
        assert_eq!(flags, vec![(true, true), (false, false), (false, false)]);
        assert!(jets.iter().all(|j| j.deco.baseline.is_written()));
    }
}
