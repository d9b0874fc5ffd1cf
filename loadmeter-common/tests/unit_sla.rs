use loadmeter_common::SlaThresholds;

#[test]
fn test_defaults() {
    let t = SlaThresholds::default();
    assert_eq!(t.max_p95_ms, 3000.0);
    assert_eq!(t.max_p99_ms, 5000.0);
    assert_eq!(t.min_success_rate_percent, 99.0);
}

#[test]
fn test_evaluate_all_met() {
    let v = SlaThresholds::new(2000.0, 5000.0, 95.0).evaluate(1500.0, 4000.0, 2.0);
    assert!(v.p95_met && v.p99_met && v.success_rate_met);
    assert_eq!(v.success_rate_percent, 98.0);
    assert!(v.passed());
}

#[test]
fn test_evaluate_success_rate_missed() {
    let v = SlaThresholds::new(2000.0, 5000.0, 99.0).evaluate(1500.0, 4000.0, 2.0);
    assert!(v.p95_met);
    assert!(v.p99_met);
    assert!(!v.success_rate_met);
    assert!(!v.passed());
}

#[test]
fn test_evaluate_boundaries_are_inclusive() {
    let v = SlaThresholds::new(100.0, 200.0, 90.0).evaluate(100.0, 200.0, 10.0);
    assert!(v.passed());
}

#[test]
fn test_evaluate_latency_missed() {
    let t = SlaThresholds::new(100.0, 200.0, 0.0);
    assert!(!t.evaluate(101.0, 150.0, 0.0).p95_met);
    assert!(!t.evaluate(90.0, 201.0, 0.0).p99_met);
}

#[test]
fn test_thresholds_from_partial_json() {
    let parsed: SlaThresholds = serde_json::from_str(r#"{"max_p95_ms":1200}"#).unwrap();
    assert_eq!(parsed.max_p95_ms, 1200.0);
    assert_eq!(parsed.max_p99_ms, 5000.0);
    assert_eq!(parsed.min_success_rate_percent, 99.0);
}
