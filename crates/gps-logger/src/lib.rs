//! GPS Fix Logger
//!
//! Producer and consumer tasks exchanging GPS fixes through a bounded
//! record ring, with staging on a byte ring uplink.

pub mod config;
mod error;
pub mod pipeline;
pub mod priority;
mod sink;
pub mod source;
mod uplink;

pub use config::LoggerConfig;
pub use error::{ConfigError, PipelineError};
pub use pipeline::{run, PipelineReport};
pub use priority::{HandoffEvent, PriorityHandoff, TaskId};
pub use sink::MetricsSink;
pub use source::{FixSource, SampleSource};
pub use uplink::Uplink;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
///
/// Unknown levels fall back to `info`.
pub fn init_logging(level: &str, json: bool) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())
            .expect("Failed to set tracing subscriber");
    } else {
        tracing::subscriber::set_global_default(builder.finish())
            .expect("Failed to set tracing subscriber");
    }
}
