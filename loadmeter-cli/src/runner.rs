use loadmeter_common::{LoadMeterError, Result, SuccessPolicy};
use loadmeter_engine::{LoadGenerator, MetricsCollector, Report, ShutdownOutcome};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

use crate::operation::SyntheticOperation;
use crate::workload::Plan;

/// Outcome of one full run.
pub struct RunSummary {
    pub report: Report,
    pub elapsed: Duration,
    pub sessions: usize,
    pub shutdown: ShutdownOutcome,
}

/// Drive `op` according to `plan`, recording every call into `collector`.
///
/// Returns once every submitted session has finished and the pool is shut down.
pub async fn run(
    plan: &Plan,
    op: Arc<SyntheticOperation>,
    policy: SuccessPolicy,
    collector: Arc<MetricsCollector>,
    grace_period: Duration,
) -> Result<RunSummary> {
    let generator = LoadGenerator::with_grace_period(plan.workers, grace_period);
    generator.start()?;
    info!(workers = plan.workers, expected = ?plan.expected_requests(), "run started");

    // Every session holds a sender; the channel closes when the last one finishes.
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<()>();
    let session = |permit: Option<OwnedSemaphorePermit>| {
        run_session(
            Arc::clone(&op),
            Arc::clone(&collector),
            policy,
            plan.requests_per_session,
            plan.think_time,
            done_tx.clone(),
            permit,
        )
    };

    let run_start = Instant::now();
    let mut submitted = 0usize;
    match plan.run_for {
        None => {
            for i in 0..plan.sessions {
                generator.execute(session(None))?;
                submitted += 1;
                if plan.pause.after(i) {
                    tokio::time::sleep(plan.pause.delay).await;
                }
            }
        }
        Some(run_for) => {
            // Cap outstanding sessions so the unbounded queue cannot run away.
            let in_flight = Arc::new(Semaphore::new(plan.workers.saturating_mul(2).min(Semaphore::MAX_PERMITS)));
            while run_start.elapsed() < run_for {
                let permit = Arc::clone(&in_flight)
                    .acquire_owned()
                    .await
                    .map_err(|_| LoadMeterError::illegal_state("acquire permit", "closed"))?;
                generator.execute(session(Some(permit)))?;
                submitted += 1;
            }
        }
    }
    drop(done_tx);
    debug!(submitted, "all sessions submitted");

    let mut completed = 0usize;
    while done_rx.recv().await.is_some() {
        completed += 1;
    }
    let elapsed = run_start.elapsed();
    debug!(completed, submitted, "all sessions finished");

    let shutdown = generator.shutdown().await;
    Ok(RunSummary {
        report: collector.report_with_elapsed(elapsed),
        elapsed,
        sessions: submitted,
        shutdown,
    })
}

async fn run_session(
    op: Arc<SyntheticOperation>,
    collector: Arc<MetricsCollector>,
    policy: SuccessPolicy,
    requests: usize,
    think_time: Duration,
    done: mpsc::UnboundedSender<()>,
    _permit: Option<OwnedSemaphorePermit>,
) {
    for i in 0..requests {
        {
            let _active = collector.track_active();
            let start = Instant::now();
            let status = op.call().await;
            collector.record_status(start.elapsed(), status, policy);
        }
        if i + 1 < requests && !think_time.is_zero() {
            tokio::time::sleep(think_time).await;
        }
    }
    done.send(()).ok();
}
