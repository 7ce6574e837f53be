//! Sequential event gates and the number of events surviving each of them.

use std::fmt;
use std::ops::AddAssign;

/// The event-level requirements, in the order in which they are applied
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Gate {
    All,
    Grl,
    DetectorFlags,
    PrimaryVertex,
    JetCleaning,
    Trigger,
    Met,
    ElectronVeto,
    MuonVeto,
    TauVeto,
    JetMultiplicity,
    DijetPt,
    DijetMass,
    CentralJetVeto,
    IsolatedTrackVeto,
}

const N_GATES: usize = 15;

impl Gate {

    pub const ALL: [Gate; N_GATES] = [
        Self::All, Self::Grl, Self::DetectorFlags, Self::PrimaryVertex, Self::JetCleaning,
        Self::Trigger, Self::Met, Self::ElectronVeto, Self::MuonVeto, Self::TauVeto,
        Self::JetMultiplicity, Self::DijetPt, Self::DijetMass, Self::CentralJetVeto,
        Self::IsolatedTrackVeto,
    ];

    /// Survival of this gate means the event is selected
    pub const LAST: Gate = Self::IsolatedTrackVeto;

    pub fn label(self) -> &'static str {
        match self {
            Self::All               => "All",
            Self::Grl               => "GRL",
            Self::DetectorFlags     => "Detector flags",
            Self::PrimaryVertex     => "Primary vertex",
            Self::JetCleaning       => "Jet cleaning",
            Self::Trigger           => "Trigger",
            Self::Met               => "MET",
            Self::ElectronVeto      => "Electron veto",
            Self::MuonVeto          => "Muon veto",
            Self::TauVeto           => "Tau veto",
            Self::JetMultiplicity   => "Jet multiplicity",
            Self::DijetPt           => "Dijet pT",
            Self::DijetMass         => "Dijet mass",
            Self::CentralJetVeto    => "Central jet veto",
            Self::IsolatedTrackVeto => "Isolated track veto",
        }
    }

    fn following(self) -> Option<Gate> { Self::ALL.get(self as usize + 1).copied() }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(self.label()) }
}

/// Number of events which passed each gate, and all the gates before it.
///
/// Counts never increase along the gate sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cutflow {
    counts: [u64; N_GATES],
}

impl Cutflow {

    pub fn count(&self, gate: Gate) -> u64 { self.counts[gate as usize] }

    pub fn rows(&self) -> impl Iterator<Item = (Gate, u64)> + '_ {
        Gate::ALL.iter().map(|&g| (g, self.count(g)))
    }

    pub fn is_monotonic(&self) -> bool { self.counts.windows(2).all(|w| w[0] >= w[1]) }

    /// Number of events surviving every gate
    pub fn selected(&self) -> u64 { self.count(Gate::LAST) }

    /// Start the gate sequence of a new event
    pub fn tracker(&mut self) -> GateTracker<'_> {
        GateTracker { cutflow: self, next: Some(Gate::All), last_passed: None }
    }
}

impl AddAssign<&Self> for Cutflow {
    fn add_assign(&mut self, rhs: &Self) {
        for (mine, theirs) in self.counts.iter_mut().zip(rhs.counts) { *mine += theirs }
    }
}

impl fmt::Display for Cutflow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let all = self.count(Gate::All);
        let mut previous = all;
        writeln!(f, "{:<20} {:>14} {:>9} {:>9}", "Gate", "Events", "rel.", "abs.")?;
        for (gate, n) in self.rows() {
            writeln!(f, "{:<20} {:>14} {:>8.2}% {:>8.2}%",
                     gate.label(), group_digits(n), percent(n, previous), percent(n, all))?;
            previous = n;
        }
        Ok(())
    }
}

fn percent(n: u64, of: u64) -> f64 { if of == 0 { 0.0 } else { 100.0 * n as f64 / of as f64 } }

/// Group numeric digits to facilitate reading long numbers
pub fn group_digits<F: fmt::Display>(n: F) -> String {
    use numsep::{separate, Locale};
    separate(n, Locale::English)
}

/// Walks one event through the gates: each gate can be passed at most once,
/// and only after every gate before it.
pub struct GateTracker<'a> {
    cutflow    : &'a mut Cutflow,
    next       : Option<Gate>,
    last_passed: Option<Gate>,
}

impl GateTracker<'_> {

    /// Record the outcome of `gate`. Returns whether the event may proceed.
    ///
    /// Once a gate has failed, or when `gate` is not the next one in the
    /// sequence, nothing more is counted for this event.
    pub fn require(&mut self, gate: Gate, passed: bool) -> bool {
        if self.next != Some(gate) || !passed {
            self.next = None;
            return false
        }
        self.cutflow.counts[gate as usize] += 1;
        self.last_passed = Some(gate);
        self.next = gate.following();
        true
    }

    pub fn last_passed(&self) -> Option<Gate> { self.last_passed }

    pub fn all_passed(&self) -> bool { self.last_passed == Some(Gate::LAST) }
}
