use loadmeter_common::{Outcome, SuccessPolicy};
use loadmeter_engine::MetricsCollector;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_record_splits_success_and_error() {
    let c = MetricsCollector::new("split");
    c.record(Outcome::success(10));
    c.record(Outcome::success(20));
    c.record(Outcome::error(30));

    let r = c.report();
    assert_eq!(r.name, "split");
    assert_eq!(r.total_requests, 3);
    assert_eq!(r.success_count, 2);
    assert_eq!(r.error_count, 1);
    assert_eq!(r.sample_count, 3);
    assert_eq!(r.max_ms, 30.0);
}

#[test]
fn test_record_helpers() {
    let c = MetricsCollector::new("helpers");
    c.record_success(5);
    c.record_error(7);
    c.record_status(Duration::from_millis(9), 302, SuccessPolicy::Allow3xx);
    c.record_status(Duration::from_millis(11), 302, SuccessPolicy::Only2xx);

    let r = c.report();
    assert_eq!(r.success_count, 2);
    assert_eq!(r.error_count, 2);
    assert_eq!(r.error_rate_percent, 50.0);
}

#[test]
fn test_report_is_idempotent() {
    let c = MetricsCollector::new("idem");
    for ms in [3, 1, 4, 1, 5, 9, 2, 6] {
        c.record_success(ms);
    }
    assert_eq!(c.report(), c.report());
}

#[test]
fn test_reports_are_independent_snapshots() {
    let c = MetricsCollector::new("grow");
    c.record_success(10);
    let first = c.report();
    c.record_success(1000);
    let second = c.report();

    assert_eq!(first.total_requests, 1);
    assert_eq!(first.max_ms, 10.0);
    assert_eq!(second.total_requests, 2);
    assert_eq!(second.max_ms, 1000.0);
}

#[test]
fn test_empty_collector_report() {
    let r = MetricsCollector::new("empty").report();
    assert_eq!(r.total_requests, 0);
    assert_eq!(r.error_rate_percent, 0.0);
    assert_eq!(r.p99_ms, 0.0);
    assert_eq!(r.active_requests, 0);
}

#[test]
fn test_report_with_elapsed() {
    let c = MetricsCollector::new("rate");
    for _ in 0..50 {
        c.record_success(1);
    }
    assert_eq!(c.report_with_elapsed(Duration::from_secs(10)).throughput_rps, Some(5.0));
    assert_eq!(c.report().throughput_rps, None);
}

#[test]
fn test_active_gauge_and_guard() {
    let c = MetricsCollector::new("gauge");
    c.increment_active();
    c.increment_active();
    assert_eq!(c.active_requests(), 2);
    {
        let _g = c.track_active();
        assert_eq!(c.active_requests(), 3);
        assert_eq!(c.report().active_requests, 3);
    }
    c.decrement_active();
    c.decrement_active();
    assert_eq!(c.active_requests(), 0);
}

#[test]
fn test_collectors_are_independent() {
    let a = MetricsCollector::new("a");
    let b = MetricsCollector::new("b");
    a.record_success(1);
    a.increment_active();
    assert_eq!(b.report().total_requests, 0);
    assert_eq!(b.active_requests(), 0);
}

#[tokio::test]
async fn test_time_records_result() {
    let c = MetricsCollector::new("timed");

    let ok: Result<u32, String> = c.time(async { Ok(7) }).await;
    assert_eq!(ok, Ok(7));
    let err: Result<u32, String> = c.time(async { Err("boom".to_string()) }).await;
    assert!(err.is_err());

    let r = c.report();
    assert_eq!(r.success_count, 1);
    assert_eq!(r.error_count, 1);
    assert_eq!(r.active_requests, 0);
}

#[test]
fn test_concurrent_records_and_gauge_balance() {
    let c = Arc::new(MetricsCollector::new("threads"));
    let threads: Vec<_> = (0..8)
        .map(|t| {
            let c = Arc::clone(&c);
            std::thread::spawn(move || {
                for i in 0..1_000u64 {
                    let _g = c.track_active();
                    c.record(Outcome::new(i % 50, (i + t) % 10 != 0));
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    let r = c.report();
    assert_eq!(r.total_requests, 8_000);
    assert_eq!(r.success_count + r.error_count, 8_000);
    assert_eq!(r.sample_count, 8_000);
    assert_eq!(r.error_count, 800);
    assert_eq!(r.active_requests, 0);
}

#[test]
fn test_report_while_recording_is_consistent() {
    let c = Arc::new(MetricsCollector::new("live"));
    let writer = {
        let c = Arc::clone(&c);
        std::thread::spawn(move || {
            for i in 0..5_000u64 {
                c.record(Outcome::new(i, i % 3 != 0));
            }
        })
    };
    while !writer.is_finished() {
        let r = c.report();
        assert_eq!(
            r.sample_count,
            r.success_count + r.error_count,
            "sample log and counters diverged: {r:?}"
        );
    }
    writer.join().unwrap();

    let r = c.report();
    assert_eq!(r.sample_count, 5_000);
    assert_eq!(r.success_count + r.error_count, 5_000);
}
