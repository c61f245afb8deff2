use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

const BAR_TEMPLATE: &str = "{spinner:.green} {prefix} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Progress bar over the uploads of one run.
///
/// Draws to stderr when it is a terminal; every tick is also logged at
/// debug level so non-interactive runs keep a trace.
#[derive(Debug, Clone)]
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    pub fn new(label: impl Into<String>, total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_prefix(label.into());
        Self { bar }
    }

    /// A bar that never draws, for direct single-block uploads.
    pub fn silent() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn tick(&mut self, what: &str) {
        self.bar.inc(1);
        debug!(
            "{} [{}/{}] {}",
            self.bar.prefix(),
            self.done(),
            self.total(),
            what
        );
        self.bar.set_message(what.to_string());
        if self.total() > 0 && self.is_complete() {
            self.bar.finish();
        }
    }

    pub fn done(&self) -> usize {
        self.bar.position() as usize
    }

    pub fn total(&self) -> usize {
        self.bar.length().unwrap_or(0) as usize
    }

    pub fn is_complete(&self) -> bool {
        self.done() >= self.total()
    }
}
