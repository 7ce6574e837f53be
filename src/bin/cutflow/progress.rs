/// Progress bar for `cutflow` executable
pub (super) struct Progress {
    bar: ProgressBar,
}

impl Progress {

    pub (super) fn new(n_events: usize) -> Result<Self, TemplateError> {
        let bar = ProgressBar::new(n_events as u64);
        bar.set_style(ProgressStyle::default_bar()
                      .template("Processing events: {msg}\n[{elapsed_precise}] {wide_bar} {pos}/{len} ({eta_precise})")?
        );
        bar.tick();
        Ok(Self { bar })
    }

    /// Account for a processed batch of events
    pub (super) fn batch_done(&self, n_events: usize, summary: &RunSummary) {
        let selected = summary.cutflow.selected();
        let failed = summary.failed;
        self.bar.set_message(format!("{} selected, {} failed", group_digits(selected), group_digits(failed)));
        self.bar.inc(n_events as u64);
    }

    pub (super) fn finish(&self) { self.bar.finish_with_message("<finished processing events>") }
}

// ----- Imports -----------------------------------------------------------------------------------------
use indicatif::{ProgressBar, ProgressStyle, style::TemplateError};
use vbfinv::{cutflow::group_digits, RunSummary};
