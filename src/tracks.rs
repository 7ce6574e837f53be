//! Counting of isolated inner-detector tracks: a veto on hadronic activity
//! which was not reconstructed as a jet or lepton.
//!
//! All searches are brute-force O(n²) over the track collection: track
//! multiplicities after the quality requirements are small.

use kinematics::FourMomentum;
use units::{Length, todo::Chi2f64};

use crate::collection::Collection;
use crate::config::analysis::TrackConfig;
use crate::record::{ElectronInfo, MuonInfo, ObjectInfo, Particle, TrackId};

#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub p4: FourMomentum,
    pub id: TrackId,
    pub n_silicon_hits: u8,
    pub chi2: Chi2f64,
    pub ndof: u16,
    pub d0: Length,
    /// Measured from `vz`
    pub z0: Length,
    pub vz: Length,
}

impl Track {
    pub fn chi2_per_ndof(&self) -> Option<f64> {
        (self.ndof > 0).then(|| self.chi2 / self.ndof as f64)
    }
}

/// The quality requirements tracks must meet to be seeds of, or spoilers of,
/// isolation
#[derive(Clone, Copy, Debug)]
pub struct TrackQuality<'a> {
    pub config: &'a TrackConfig,
    pub pv_z: Length,
}

impl TrackQuality<'_> {
    pub fn accept(&self, t: &Track) -> bool {
        let c = self.config;
        t.n_silicon_hits >= c.min_silicon_hits
            && t.chi2_per_ndof().map_or(false, |x| x <= c.max_chi2_per_ndof)
            && ((t.z0 + t.vz - self.pv_z) * t.p4.theta().sin()).abs() < c.z0_sin_theta
            && t.d0.abs() < c.d0
    }
}

/// Number of `candidates` which would spoil the isolation of a seed at `seed`
fn spoilers<'t>(seed: &FourMomentum, candidates: impl Iterator<Item = &'t Track>, config: &TrackConfig) -> usize {
    candidates
        .filter(|t| t.p4.pt > config.pt_low)
        .filter(|t| seed.delta_r(&t.p4) < config.cone)
        .count()
}

/// Number of quality tracks above `pt_high` with no other quality track above
/// `pt_low` within the isolation cone
pub fn count_isolated(tracks: &[Track], quality: &TrackQuality) -> usize {
    let config = quality.config;
    let good: Vec<&Track> = tracks.iter().filter(|t| quality.accept(t)).collect();
    good.iter()
        .enumerate()
        .filter(|(_, seed)| seed.p4.pt > config.pt_high)
        .filter(|&(i, seed)| {
            let others = good.iter().enumerate().filter(|&(j, _)| j != i).map(|(_, t)| *t);
            spoilers(&seed.p4, others, config) == 0
        })
        .count()
}

/// Leptons which carry an inner-detector track
pub trait WithTrack { fn track_id(&self) -> Option<TrackId>; }
impl WithTrack for ElectronInfo { fn track_id(&self) -> Option<TrackId> { self.track_id } }
impl WithTrack for MuonInfo     { fn track_id(&self) -> Option<TrackId> { self.track_id } }

/// Same criterion as `count_isolated`, seeded from baseline leptons which
/// survived overlap removal; the lepton's own track does not spoil its
/// isolation
fn count_isolated_leptons<I: ObjectInfo + WithTrack>(
    leptons: &Collection<I>,
    tracks : &[Track],
    quality: &TrackQuality,
) -> usize {
    let config = quality.config;
    let good: Vec<&Track> = tracks.iter().filter(|t| quality.accept(t)).collect();
    leptons.iter()
        .filter(|l: &&Particle<I>| l.kept_after_overlap() && l.pt() > config.pt_high)
        .filter(|l| {
            let own = l.info.track_id();
            let others = good.iter().copied().filter(|t| Some(t.id) != own);
            spoilers(&l.p4, others, config) == 0
        })
        .count()
}

pub fn count_isolated_muons(muons: &Collection<MuonInfo>, tracks: &[Track], quality: &TrackQuality) -> usize {
    count_isolated_leptons(muons, tracks, quality)
}

pub fn count_isolated_electrons(electrons: &Collection<ElectronInfo>, tracks: &[Track], quality: &TrackQuality) -> usize {
    count_isolated_leptons(electrons, tracks, quality)
}

/// Isolated tracks not accounted for by isolated leptons. Can be negative.
pub fn net_isolated_tracks(
    tracks   : &[Track],
    electrons: &Collection<ElectronInfo>,
    muons    : &Collection<MuonInfo>,
    quality  : &TrackQuality,
) -> i64 {
    count_isolated(tracks, quality) as i64
        - count_isolated_muons    (muons    , tracks, quality) as i64
        - count_isolated_electrons(electrons, tracks, quality) as i64
}
