use loadmeter_engine::{ConsoleReporter, MetricsCollector};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_reporter_runs_until_stopped() {
    let collector = Arc::new(MetricsCollector::new("periodic"));
    collector.record_success(3);

    let reporter = ConsoleReporter::spawn(Arc::clone(&collector), Duration::from_secs(1));
    tokio::time::sleep(Duration::from_secs(3)).await;
    reporter.stop();

    // The reporter only reads.
    assert_eq!(collector.report().total_requests, 1);
    assert_eq!(collector.active_requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reporter_stops_on_drop() {
    let collector = Arc::new(MetricsCollector::new("dropped"));
    {
        let _reporter = ConsoleReporter::spawn(Arc::clone(&collector), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(35)).await;
    }
    collector.record_error(1);
    assert_eq!(collector.report().error_count, 1);
}
