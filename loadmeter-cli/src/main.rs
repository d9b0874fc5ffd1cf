use clap::{Parser, ValueEnum};
use loadmeter_cli::config::{load_sla_file, PerfConfig};
use loadmeter_cli::operation::SyntheticOperation;
use loadmeter_cli::runner::{self, RunSummary};
use loadmeter_cli::workload::{Pattern, Plan};
use loadmeter_common::{SlaThresholds, SlaVerdict, SuccessPolicy, DEFAULT_SHUTDOWN_GRACE};
use loadmeter_engine::{ConsoleReporter, MetricsCollector, ShutdownOutcome};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Only 2xx responses count as successes
    #[value(name = "2xx")]
    Only2xx,
    /// 2xx and 3xx responses count as successes
    #[value(name = "3xx")]
    Allow3xx,
}

#[derive(Parser)]
#[command(name = "loadmeter", about = "Concurrent load generator with SLA reporting", version)]
struct Args {
    /// Load pattern: load | stress | spike | ramp-up | throughput
    #[arg(long, env = "LOADMETER_PATTERN", default_value = "load")]
    pattern: String,

    /// Name used in reports and CSV rows (defaults to the pattern name)
    #[arg(long, env = "LOADMETER_NAME")]
    name: Option<String>,

    /// Concurrent virtual users for load, ramp-up and throughput runs
    #[arg(long, env = "LOADMETER_USERS", default_value_t = loadmeter_common::DEFAULT_USERS)]
    users: usize,

    /// Requests each session issues (defaults to the pattern's own value)
    #[arg(long, env = "LOADMETER_REQUESTS")]
    requests: Option<usize>,

    /// Workers for the spike pattern
    #[arg(long, env = "LOADMETER_SPIKE_USERS", default_value_t = loadmeter_common::DEFAULT_SPIKE_USERS)]
    spike_users: usize,

    /// Workers for the stress pattern
    #[arg(long, env = "LOADMETER_STRESS_USERS", default_value_t = loadmeter_common::DEFAULT_STRESS_USERS)]
    stress_users: usize,

    /// Seconds over which ramp-up starts its users
    #[arg(long, env = "LOADMETER_RAMP_UP", default_value_t = loadmeter_common::DEFAULT_RAMP_UP_SECS)]
    ramp_up: u64,

    /// Seconds the throughput pattern keeps submitting work
    #[arg(long, env = "LOADMETER_DURATION", default_value_t = loadmeter_common::DEFAULT_DURATION_SECS)]
    duration: u64,

    /// Lower bound of the synthetic operation's latency (ms)
    #[arg(long, env = "LOADMETER_LATENCY_MIN_MS", default_value_t = 20)]
    latency_min_ms: u64,

    /// Upper bound of the synthetic operation's latency (ms)
    #[arg(long, env = "LOADMETER_LATENCY_MAX_MS", default_value_t = 200)]
    latency_max_ms: u64,

    /// Fraction of synthetic calls that fail with a 5xx
    #[arg(long, env = "LOADMETER_ERROR_RATE", default_value_t = 0.0)]
    error_rate: f64,

    /// Which status codes count as success
    #[arg(long, env = "LOADMETER_SUCCESS_POLICY", value_enum, default_value_t = Policy::Only2xx)]
    success_policy: Policy,

    /// Fail if p95 latency exceeds this (ms)
    #[arg(long, env = "LOADMETER_MAX_P95_MS")]
    max_p95_ms: Option<f64>,

    /// Fail if p99 latency exceeds this (ms)
    #[arg(long, env = "LOADMETER_MAX_P99_MS")]
    max_p99_ms: Option<f64>,

    /// Fail if the success rate drops below this percentage
    #[arg(long, env = "LOADMETER_MIN_SUCCESS_RATE")]
    min_success_rate: Option<f64>,

    /// JSON file with SLA thresholds; individual flags override it
    #[arg(long, env = "LOADMETER_SLA_FILE")]
    sla_file: Option<PathBuf>,

    /// Append the final report to this CSV file
    #[arg(long, env = "LOADMETER_CSV")]
    csv: Option<PathBuf>,

    /// Print the final report as JSON instead of the console block
    #[arg(long, env = "LOADMETER_JSON")]
    json: bool,

    /// Log a progress snapshot every N seconds (0 disables)
    #[arg(long, env = "LOADMETER_REPORT_INTERVAL", default_value_t = 0)]
    report_interval: u64,

    /// Seconds to wait for in-flight work at shutdown before aborting it
    #[arg(long, env = "LOADMETER_GRACE", default_value_t = DEFAULT_SHUTDOWN_GRACE.as_secs())]
    grace: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let pattern = Pattern::from_name(&args.pattern).unwrap_or_else(|| {
        eprintln!(
            "Unknown pattern {:?}. Valid values: load, stress, spike, ramp-up, throughput",
            args.pattern
        );
        process::exit(3);
    });

    let sla = resolve_sla(&args).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(3);
    });

    let config = PerfConfig {
        users: args.users,
        ramp_up: Duration::from_secs(args.ramp_up),
        duration: Duration::from_secs(args.duration),
        spike_users: args.spike_users,
        stress_users: args.stress_users,
        requests_per_session: args.requests,
        sla,
    };
    if let Err(e) = config.validate() {
        eprintln!("{e}");
        process::exit(3);
    }

    let plan = Plan::for_pattern(pattern, &config);
    let op = Arc::new(SyntheticOperation::new(args.latency_min_ms, args.latency_max_ms, args.error_rate));
    let policy = match args.success_policy {
        Policy::Only2xx => SuccessPolicy::Only2xx,
        Policy::Allow3xx => SuccessPolicy::Allow3xx,
    };
    let name = args.name.clone().unwrap_or_else(|| pattern.as_name().to_string());
    let collector = Arc::new(MetricsCollector::new(name));

    let progress = (args.report_interval > 0)
        .then(|| ConsoleReporter::spawn(Arc::clone(&collector), Duration::from_secs(args.report_interval)));

    let summary = runner::run(&plan, op, policy, Arc::clone(&collector), Duration::from_secs(args.grace))
        .await
        .unwrap_or_else(|e| {
            eprintln!("Run failed: {e}");
            process::exit(3);
        });

    if let Some(p) = progress {
        p.stop();
    }

    if let Some(path) = &args.csv {
        collector.export_csv(path);
    }

    let verdict = summary.report.sla_verdict(&config.sla);
    if args.json {
        match serde_json::to_string_pretty(&summary.report) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Failed to serialize report: {e}"),
        }
    } else {
        print_report(pattern, &plan, &summary, &config.sla, &verdict);
    }

    process::exit(if verdict.passed() { 0 } else { 1 });
}

fn resolve_sla(args: &Args) -> loadmeter_common::Result<SlaThresholds> {
    let mut sla = match &args.sla_file {
        Some(path) => load_sla_file(path)?,
        None => SlaThresholds::default(),
    };
    if let Some(v) = args.max_p95_ms {
        sla.max_p95_ms = v;
    }
    if let Some(v) = args.max_p99_ms {
        sla.max_p99_ms = v;
    }
    if let Some(v) = args.min_success_rate {
        sla.min_success_rate_percent = v;
    }
    Ok(sla)
}

fn print_report(pattern: Pattern, plan: &Plan, summary: &RunSummary, sla: &SlaThresholds, verdict: &SlaVerdict) {
    let pass_fail = |met: bool| if met { "✓" } else { "✗" };
    let report = &summary.report;

    print!("{}", report.render_console());
    println!("Pattern:               {}", pattern.as_name());
    println!("Workers:               {}", plan.workers);
    println!("Sessions:              {}", summary.sessions);
    println!("Elapsed:               {:.1} s", summary.elapsed.as_secs_f64());
    println!(
        "Estimated throughput:  {:.2} req/sec  (1000 / mean × workers)",
        report.estimated_throughput_rps(plan.workers)
    );
    if let ShutdownOutcome::Forced { aborted_workers } = summary.shutdown {
        println!("Shutdown:              forced ({aborted_workers} workers aborted)");
    }
    println!();
    println!(
        "P95 latency:           {:.1} ms    [threshold: {:.1} ms]  {}",
        report.p95_ms,
        sla.max_p95_ms,
        pass_fail(verdict.p95_met),
    );
    println!(
        "P99 latency:           {:.1} ms    [threshold: {:.1} ms]  {}",
        report.p99_ms,
        sla.max_p99_ms,
        pass_fail(verdict.p99_met),
    );
    println!(
        "Success rate:          {:.2}%    [threshold: {:.2}%]  {}",
        verdict.success_rate_percent,
        sla.min_success_rate_percent,
        pass_fail(verdict.success_rate_met),
    );
    println!();
    println!("Result: {}", if verdict.passed() { "PASS" } else { "FAIL" });
}
