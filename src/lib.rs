pub mod error;
pub mod record;
pub mod collection;
pub mod event;
pub mod quality;
pub mod tools;
pub mod calibration;
pub mod config;
pub mod selection;
pub mod overlap;
pub mod tracks;
pub mod met;
pub mod cutflow;
pub mod histograms;
pub mod summary;
pub mod pipeline;
pub mod toy;

pub use crate::error::{ConfigError, EventError, EventResult};
pub use crate::event::{keys, EventInfo, EventStore};
pub use crate::pipeline::{Analysis, EventReport, SelectedObjects};
pub use crate::record::{Electron, Jet, Muon, Photon, Tau, ObjectKind};
pub use crate::summary::RunSummary;

pub use units::{Energy, Length};
