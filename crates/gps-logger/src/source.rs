//! Fix sources for the producer task

use record_ring::GpsFix;

/// Supplies the next fix to publish
pub trait FixSource: Send + 'static {
    fn next_fix(&mut self) -> GpsFix;
}

/// Cycles through a fixed list of fixes
#[derive(Debug, Clone)]
pub struct SampleSource {
    samples: Vec<GpsFix>,
    cursor: usize,
    live_stamp: bool,
}

impl SampleSource {
    /// Cycle `samples`; an empty list falls back to the reference samples
    pub fn new(samples: Vec<GpsFix>) -> Self {
        if samples.is_empty() {
            return Self::reference();
        }
        Self {
            samples,
            cursor: 0,
            live_stamp: false,
        }
    }

    /// The two bench-test fixes the logger was first exercised with
    pub fn reference() -> Self {
        Self::new(vec![
            GpsFix::new("10.212", "30.212", "14072019"),
            GpsFix::new("11.221", "45.212", "15072019"),
        ])
    }

    /// Stamp every fix with today's date instead of the sample timestamp
    pub fn with_live_stamp(mut self, live_stamp: bool) -> Self {
        self.live_stamp = live_stamp;
        self
    }
}

impl FixSource for SampleSource {
    fn next_fix(&mut self) -> GpsFix {
        let mut fix = self.samples[self.cursor];
        self.cursor = (self.cursor + 1) % self.samples.len();
        if self.live_stamp {
            fix.time_stamp = today_stamp().as_str().into();
        }
        fix
    }
}

/// Today's local date as `DDMMYYYY`
pub fn today_stamp() -> String {
    chrono::Local::now().format("%d%m%Y").to_string()
}
