//! Load generation and metrics engine.
//!
//! A [`LoadGenerator`] runs fire-and-forget tasks on a fixed pool of tokio
//! workers. Tasks push [`Outcome`](loadmeter_common::Outcome)s into a
//! [`MetricsCollector`], which produces [`Report`] snapshots on demand for
//! SLA checks, console output, and CSV export.

pub mod collector;
pub mod export;
pub mod generator;
pub mod report;
pub mod reporter;

pub use collector::{ActiveGuard, MetricsCollector};
pub use generator::{GeneratorState, LoadGenerator, ShutdownOutcome};
pub use report::{meets_sla, percentile, Report};
pub use reporter::ConsoleReporter;
