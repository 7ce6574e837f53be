//! Per-event processing: from the read-only input containers to the cutflow
//! and the histograms.
//!
//! The stages run in a fixed order, because each reads decorations written by
//! the ones before it: calibration, baseline, overlap removal, signal, isolated
//! tracks, missing energy, and finally the event gates. All per-event state
//! lives in working copies which are dropped when `process` returns, whatever
//! the outcome.

use rayon::prelude::*;
use tracing::{debug, error, warn};

use kinematics::invariant_mass;
use units::{gev_, mm_, ConstZero, Energy, Length};

use crate::calibration::{event_rng, Calibrations};
use crate::collection::Collection;
use crate::config::Config;
use crate::cutflow::Gate;
use crate::error::EventResult;
use crate::event::{keys, EventStore};
use crate::met::{AssociationMap, MetCore, MetMaker, MetObjects, MissingEnergyRecord};
use crate::overlap::{Objects, OverlapResolver};
use crate::quality::{primary_vertex, Vertex, VertexProblem};
use crate::record::{Electron, Jet, Muon, Photon, Tau};
use crate::selection::{decorate_bad, decorate_baseline, decorate_signal, Baseline, EventContext, Signal};
use crate::summary::RunSummary;
use crate::tools::Tools;
use crate::tracks::{net_isolated_tracks, Track, TrackQuality};

/// Configuration, tools and calibrations for a whole run. Shared read-only
/// between events, and between threads.
pub struct Analysis {
    config      : Config,
    tools       : Tools,
    calibrations: Calibrations,
    /// Seeds the random numbers drawn by the calibration of each event
    seed        : u64,
}

/// Numbers of signal objects of each kind
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SignalCounts {
    pub electrons: usize,
    pub muons    : usize,
    pub taus     : usize,
    pub photons  : usize,
    pub jets     : usize,
}

/// What happened to one event
#[derive(Clone, Debug, Default)]
pub struct EventReport {
    /// Last gate the event survived
    pub last_passed: Option<Gate>,
    /// Survived every gate, and was histogrammed
    pub selected: bool,
    /// Primary vertex problem which stopped the event
    pub vertex_problem: Option<VertexProblem>,
    pub signal: SignalCounts,
    /// Signal jets, highest pt first
    pub signal_jets: Vec<Jet>,
    pub net_isolated_tracks: Option<i64>,
    pub met: Option<MissingEnergyRecord>,
    /// Calibrated and decorated objects, once the signal stage has run
    pub objects: Option<SelectedObjects>,
}

/// The working copies of one event after calibration and decoration, in input
/// order, removed objects included
#[derive(Clone, Debug, Default)]
pub struct SelectedObjects {
    pub electrons: Vec<Electron>,
    pub muons    : Vec<Muon>,
    pub jets     : Vec<Jet>,
    pub taus     : Vec<Tau>,
    pub photons  : Vec<Photon>,
}

/// Record the outcome of a gate in the cutflow, and stop processing the
/// event if it failed
macro_rules! require {
    // The gate passes if the pattern matches, binding its variables
    ($gates:ident, $report:ident, $gate:expr, let $pattern:pat = $value:expr) => {
        let $pattern = $value else {
            $gates.require($gate, false);
            $report.last_passed = $gates.last_passed();
            return Ok($report)
        };
        $gates.require($gate, true);
    };
    ($gates:ident, $report:ident, $gate:expr, $passed:expr) => {
        if !$gates.require($gate, $passed) {
            $report.last_passed = $gates.last_passed();
            return Ok($report)
        }
    };
}

impl Analysis {

    /// The calibrations are the nominal ones described by `config`
    pub fn new(config: Config, tools: Tools) -> Self {
        let calibrations = Calibrations::from_config(&config.calibration);
        Self { config, tools, calibrations, seed: 0 }
    }

    pub fn with_calibrations(mut self, calibrations: Calibrations) -> Self {
        self.calibrations = calibrations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &Config { &self.config }

    /// Empty accumulators matching this analysis' histogram binning
    pub fn new_summary(&self) -> RunSummary { RunSummary::new(&self.config.histograms) }

    /// Process one event, accumulating into `summary`.
    ///
    /// An `Err` means the event was abandoned: it is logged, counted in
    /// `summary.failed`, and the cutflow holds only the gates it passed before
    /// the failure.
    pub fn process(&self, event: &EventStore, summary: &mut RunSummary) -> EventResult<EventReport> {
        let outcome = self.select(event, summary);
        if let Err(e) = &outcome {
            let info = &event.info;
            error!(run = info.run_number, event = info.event_number, "event abandoned: {e}");
            summary.failed += 1;
        }
        outcome
    }

    fn select(&self, event: &EventStore, summary: &mut RunSummary) -> EventResult<EventReport> {
        let RunSummary { cutflow, overlap, calibration, histograms, .. } = summary;
        let mut gates = cutflow.tracker();
        let mut report = EventReport::default();
        let config = &self.config;
        let info = &event.info;

        require!(gates, report, Gate::All, true);
        let good_run = config.good_runs.as_ref().map_or(true, |grl| grl.accepts(info));
        require!(gates, report, Gate::Grl, good_run);
        require!(gates, report, Gate::DetectorFlags, info.is_simulation || info.detector.clean());

        let vertices: &Vec<Vertex> = event.retrieve(keys::VERTICES)?;
        let pv_z = match primary_vertex(vertices) {
            Ok(pv) => pv.z,
            Err(problem) => {
                warn!(run = info.run_number, event = info.event_number, ?problem, "no unique primary vertex");
                report.vertex_problem = Some(problem);
                Length::ZERO
            }
        };
        require!(gates, report, Gate::PrimaryVertex, report.vertex_problem.is_none());

        // ----- Inputs -----
        let algorithm = &config.jet_algorithm;
        let electrons: &Vec<Electron> = event.retrieve(keys::ELECTRONS)?;
        let muons    : &Vec<Muon    > = event.retrieve(keys::MUONS)?;
        let jets     : &Vec<Jet     > = event.retrieve(&keys::jets(algorithm))?;
        let taus     : &Vec<Tau     > = event.retrieve(keys::TAUS)?;
        let photons  : &Vec<Photon  > = event.retrieve(keys::PHOTONS)?;
        let tracks   : &Vec<Track   > = event.retrieve(keys::TRACKS)?;
        let met_map  : &AssociationMap = event.retrieve(&keys::met_map (algorithm))?;
        let met_core : &MetCore        = event.retrieve(&keys::met_core(algorithm))?;

        // ----- Calibration -----
        let sim = info.is_simulation;
        let mut electrons = Collection::working_copy(electrons);
        let mut muons     = Collection::working_copy(muons);
        let mut jets      = Collection::working_copy(jets);
        let mut taus      = Collection::working_copy(taus);
        let mut photons   = Collection::working_copy(photons);
        let c = &self.calibrations;
        let mut rng = event_rng(self.seed, info);
        *calibration += &c.electrons.apply(&mut electrons, sim, &mut rng);
        *calibration += &c.muons    .apply(&mut muons    , sim, &mut rng);
        *calibration += &c.jets     .apply_jets(&mut jets, sim, c.jvt.as_ref(), &mut rng);
        *calibration += &c.taus     .apply(&mut taus     , sim, &mut rng);
        *calibration += &c.photons  .apply(&mut photons  , sim, &mut rng);

        // ----- Baseline -----
        let ctx = EventContext { is_simulation: sim, pv_z, beam_spot: info.beam_spot };
        let baseline = Baseline { config, tools: &self.tools };
        decorate_baseline(&mut electrons, &baseline, &ctx);
        decorate_baseline(&mut muons    , &baseline, &ctx);
        decorate_baseline(&mut jets     , &baseline, &ctx);
        decorate_baseline(&mut taus     , &baseline, &ctx);
        decorate_baseline(&mut photons  , &baseline, &ctx);

        // ----- Overlap removal -----
        let resolver = OverlapResolver::new(&config.overlap, self.tools.btagger.as_ref());
        *overlap += &resolver.resolve(Objects {
            electrons: &mut electrons, muons: &mut muons, jets: &mut jets, taus: &mut taus, photons: &mut photons,
        });

        // ----- Signal -----
        let signal = Signal { config, tools: &self.tools };
        decorate_bad(&mut jets, &config.jet.jvt, self.tools.jet_cleaning.as_ref());
        report.signal = SignalCounts {
            electrons: decorate_signal(&mut electrons, &signal, &ctx),
            muons    : decorate_signal(&mut muons    , &signal, &ctx),
            jets     : decorate_signal(&mut jets     , &signal, &ctx),
            taus     : decorate_signal(&mut taus     , &signal, &ctx),
            photons  : decorate_signal(&mut photons  , &signal, &ctx),
        };
        let signal_jets = jets.select_by_pt(|j| j.is_signal());
        report.signal_jets = signal_jets.iter().map(|&j| j.clone()).collect();
        report.objects = Some(SelectedObjects {
            electrons: electrons.to_vec(), muons: muons.to_vec(), jets: jets.to_vec(),
            taus: taus.to_vec(), photons: photons.to_vec(),
        });

        // ----- Isolated tracks -----
        let quality = TrackQuality { config: &config.tracks, pv_z };
        let net_tracks = net_isolated_tracks(tracks, &electrons, &muons, &quality);
        report.net_isolated_tracks = Some(net_tracks);

        // ----- Missing energy -----
        let maker = MetMaker { config: &config.met, jvt: &config.jet.jvt };
        let objects = MetObjects { electrons: &electrons, photons: &photons, taus: &taus, muons: &muons, jets: &jets };
        let met = maker.rebuild(objects, &mut met_map.usage(), met_core)?;
        for (term, status) in met.problems() {
            warn!(run = info.run_number, event = info.event_number, %term, ?status, "MET term incomplete");
        }
        let met = met.record;
        report.met = Some(met.clone());

        // ----- Event gates -----
        let cuts = &config.event;
        let cleaning_ok = jets.iter().all(|j| !(j.kept_after_overlap() && j.deco.bad.get()));
        require!(gates, report, Gate::JetCleaning, cleaning_ok);
        let triggered = config.triggers.is_empty() || config.triggers.iter().any(|t| info.fired(t));
        require!(gates, report, Gate::Trigger, triggered);
        require!(gates, report, Gate::Met, met.met() > cuts.met);
        require!(gates, report, Gate::ElectronVeto, report.signal.electrons == 0);
        require!(gates, report, Gate::MuonVeto    , report.signal.muons     == 0);
        require!(gates, report, Gate::TauVeto     , report.signal.taus      == 0);
        require!(gates, report, Gate::JetMultiplicity, let [lead, sublead, others @ ..] = signal_jets.as_slice());
        require!(gates, report, Gate::DijetPt, lead.pt() > cuts.lead_jet_pt && sublead.pt() > cuts.sublead_jet_pt);
        let mjj = invariant_mass(&lead.p4, &sublead.p4);
        require!(gates, report, Gate::DijetMass, mjj > cuts.mjj);
        let central_jet = central_activity(lead, sublead, others, cuts.central_jet_pt);
        require!(gates, report, Gate::CentralJetVeto, !central_jet);
        require!(gates, report, Gate::IsolatedTrackVeto, net_tracks <= 0);

        histograms.fill(signal_jets.iter().copied(), met.final_term());
        report.last_passed = gates.last_passed();
        report.selected = gates.all_passed();
        debug!(run = info.run_number, event = info.event_number,
               met = gev_(met.met()), mjj = gev_(mjj), pv_z = mm_(pv_z), "event selected");
        Ok(report)
    }

    /// Process events in order on the current thread
    pub fn run<'e>(&self, events: impl IntoIterator<Item = &'e EventStore>) -> RunSummary {
        let mut summary = self.new_summary();
        for event in events {
            // Failures are logged and counted by `process`
            let _ = self.process(event, &mut summary);
        }
        summary
    }

    /// Process events on the rayon thread pool. Each worker accumulates
    /// `job_size` events at a time into its own summary, and the summaries are
    /// merged at the end.
    pub fn run_parallel(&self, events: &[EventStore], job_size: usize) -> RunSummary {
        events
            .par_iter()
            .fold_chunks(job_size.max(1), || self.new_summary(), |mut summary, event| {
                let _ = self.process(event, &mut summary);
                summary
            })
            .reduce(|| self.new_summary(), |mut a, b| { a += &b; a })
    }
}

/// Is there a signal jet above `pt_min` between the two tagging jets in η?
fn central_activity(lead: &Jet, sublead: &Jet, others: &[&Jet], pt_min: Energy) -> bool {
    let (lo, hi) = if lead.eta() < sublead.eta() { (lead.eta(), sublead.eta()) }
                   else                          { (sublead.eta(), lead.eta()) };
    others.iter().any(|j| j.pt() > pt_min && lo < j.eta() && j.eta() < hi)
}
