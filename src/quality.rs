//! Event-level data quality: good-runs list, and the choice of primary vertex.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::Deserialize;
use units::Length;

use crate::event::EventInfo;

/// Luminosity blocks certified for physics, per run.
///
/// In TOML, one `[[good_runs]]` table per run:
///
/// ```toml
/// [[good_runs]]
/// run = 280950
/// lumi_blocks = [[1, 100], [120, 130]]
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<GoodRun>")]
pub struct GoodRunsList {
    runs: BTreeMap<u32, Vec<(u32, u32)>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GoodRun {
    run: u32,
    lumi_blocks: Vec<(u32, u32)>,
}

impl From<Vec<GoodRun>> for GoodRunsList {
    fn from(entries: Vec<GoodRun>) -> Self {
        let mut grl = Self::new();
        for GoodRun { run, lumi_blocks } in entries {
            for (lo, hi) in lumi_blocks { grl.add(run, lo..=hi) }
        }
        grl
    }
}

impl GoodRunsList {

    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, run: u32, lumi_blocks: RangeInclusive<u32>) {
        self.runs.entry(run).or_default().push((*lumi_blocks.start(), *lumi_blocks.end()));
    }

    pub fn contains(&self, run: u32, lumi_block: u32) -> bool {
        self.runs.get(&run)
            .map_or(false, |ranges| ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&lumi_block)))
    }

    /// Simulation is always good; data must be listed.
    pub fn accepts(&self, info: &EventInfo) -> bool {
        info.is_simulation || self.contains(info.run_number, info.lumi_block)
    }
}

// ----- Vertices -----------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexType { Primary, Secondary, Pileup, NoVertex }

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub kind    : VertexType,
    pub n_tracks: usize,
    pub z       : Length,
}

/// Why no unique primary vertex could be chosen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexProblem {
    None,
    Several(usize),
}

/// The primary vertex: primary type, at least two tracks, exactly one of them.
pub fn primary_vertex(vertices: &[Vertex]) -> Result<&Vertex, VertexProblem> {
    let mut candidates = vertices.iter()
        .filter(|v| v.kind == VertexType::Primary && v.n_tracks >= 2);
    let first = candidates.next().ok_or(VertexProblem::None)?;
    match candidates.count() {
        0 => Ok(first),
        n => Err(VertexProblem::Several(n + 1)),
    }
}
