//! Tighter, analysis-specific definitions, applied to baseline objects which
//! survived the overlap removal.

use crate::collection::Collection;
use crate::config::Config;
use crate::config::analysis::JvtPolicy;
use crate::record::{Electron, ElectronInfo, Jet, JetInfo, Muon, MuonInfo, ObjectInfo,
                    Photon, PhotonInfo, Tau, TauInfo};
use crate::tools::{Accept, Tools};

use super::{Classify, EventContext, d0_significance, z0_sin_theta};

pub struct Signal<'a> {
    pub config: &'a Config,
    pub tools : &'a Tools,
}

impl Classify<ElectronInfo> for Signal<'_> {
    fn accept(&self, e: &Electron, ctx: &EventContext) -> bool {
        let cuts = &self.config.electron.signal;
        e.pt() >= cuts.pt
            && z0_sin_theta(&e.info.track, ctx.pv_z) < cuts.z0_sin_theta
            && d0_significance(&e.info.track, &ctx.beam_spot) < cuts.d0_significance
            && (!cuts.isolation || self.tools.electron_isolation.accept(e))
    }
}

impl Classify<MuonInfo> for Signal<'_> {
    fn accept(&self, m: &Muon, ctx: &EventContext) -> bool {
        let cuts = &self.config.muon.signal;
        m.pt() >= cuts.pt
            && z0_sin_theta(&m.info.track, ctx.pv_z) < cuts.z0_sin_theta
            && d0_significance(&m.info.track, &ctx.beam_spot) < cuts.d0_significance
            && (!cuts.isolation || self.tools.muon_isolation.accept(m))
    }
}

impl Classify<TauInfo> for Signal<'_> {
    fn accept(&self, t: &Tau, _: &EventContext) -> bool { t.pt() >= self.config.tau.signal.pt }
}

impl Classify<PhotonInfo> for Signal<'_> {
    fn accept(&self, p: &Photon, _: &EventContext) -> bool { p.pt() >= self.config.photon.signal.pt }
}

/// Relies on `bad` having been decorated: see `decorate_bad`
impl Classify<JetInfo> for Signal<'_> {
    fn accept(&self, j: &Jet, _: &EventContext) -> bool {
        let cuts = &self.config.jet.signal;
        j.pt() >= cuts.pt
            && j.eta().abs() < cuts.eta_max
            && self.config.jet.jvt.accepts(j.pt(), j.eta(), j.jvt())
            && !j.deco.bad.get()
    }
}

/// Jet quality, with an exemption: soft central jets which fail the pile-up
/// discriminant are pile-up anyway, so the cleaning tool is not consulted for
/// them and they are never bad.
pub fn is_bad(jet: &Jet, jvt: &JvtPolicy, cleaning: &dyn Accept<JetInfo>) -> bool {
    if jvt.exempts_from_cleaning(jet.pt(), jet.eta(), jet.jvt()) { return false }
    !cleaning.accept(jet)
}

/// Write `bad` on every jet: non-baseline jets are never bad. Returns the
/// number of bad jets.
pub fn decorate_bad(jets: &mut Collection<JetInfo>, jvt: &JvtPolicy, cleaning: &dyn Accept<JetInfo>) -> usize {
    let mut n = 0;
    for jet in jets.iter_mut() {
        let bad = jet.is_baseline() && is_bad(jet, jvt, cleaning);
        jet.deco.bad.set(bad);
        n += bad as usize;
    }
    n
}

/// Write `signal` on every object: only baseline objects which were not
/// removed by the overlap resolution are considered. Returns the number of
/// signal objects.
pub fn decorate_signal<I: ObjectInfo>(
    objects : &mut Collection<I>,
    classify: &impl Classify<I>,
    ctx     : &EventContext,
) -> usize {
    let mut n = 0;
    for object in objects.iter_mut() {
        let pass = object.kept_after_overlap() && classify.accept(object, ctx);
        object.deco.signal.set(pass);
        n += pass as usize;
    }
    n
}
