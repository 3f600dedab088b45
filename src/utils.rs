use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Logs how long a request took once it goes out of scope.
pub(crate) struct Timing {
    start: Instant,
    url: String,
}

impl Timing {
    pub(crate) fn new(url: impl Into<String>) -> Self {
        Timing {
            start: Instant::now(),
            url: url.into(),
        }
    }
}

impl Drop for Timing {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_millis();
        debug!(url = %self.url, "request finished in {}ms", elapsed);
    }
}

/// Spinner shown on stderr while a request is in flight.
pub(crate) struct Spinner(ProgressBar);

impl Spinner {
    pub(crate) fn start(message: &str) -> Self {
        let bar = ProgressBar::new_spinner().with_message(message.to_owned());
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(100));

        Spinner(bar)
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}
