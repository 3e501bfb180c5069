use std::process;
use std::thread;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tracing::{Level, debug, error};
use tracing_subscriber::EnvFilter;

use hoststat_core::collector::{DEFAULT_PROC_PATH, DEFAULT_SYS_PATH, ProcfsReader, RealFs};
use hoststat_core::{CpuStats, FsInfo, HostInfo, Session, StatError};

/// Print host identity, CPU utilization and filesystem usage.
#[derive(Parser)]
#[command(name = "hoststat", about = "Sample host telemetry counters", version)]
struct Args {
    /// Milliseconds between CPU samples.
    #[arg(short, long, default_value = "100")]
    interval: u64,

    /// Number of CPU samples. The first one only sets the baseline.
    #[arg(short, long, default_value = "2", value_parser = clap::value_parser!(u32).range(1..))]
    count: u32,

    /// Path to /proc filesystem (for containers with the host /proc bind-mounted).
    #[arg(long, default_value = DEFAULT_PROC_PATH)]
    proc_path: String,

    /// Path to /sys filesystem.
    #[arg(long, default_value = DEFAULT_SYS_PATH)]
    sys_path: String,

    /// Output as JSON.
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is warn level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Serialize)]
struct Report {
    host: HostInfo,
    cpu: Vec<CpuStats>,
    filesystems: Vec<FsInfo>,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["hoststat", "hoststat_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_session(args: &Args) -> Result<Session, StatError> {
    if args.proc_path == DEFAULT_PROC_PATH && args.sys_path == DEFAULT_SYS_PATH {
        Session::open()
    } else {
        let reader = ProcfsReader::new(RealFs::new(), args.proc_path.as_str())
            .with_sys_path(args.sys_path.as_str());
        Session::with_reader(reader)
    }
}

fn collect(session: &Session, args: &Args) -> Result<Report, StatError> {
    let host = session.host_info()?;

    let mut cpu = Vec::with_capacity(args.count as usize);
    for i in 0..args.count {
        if i > 0 {
            thread::sleep(Duration::from_millis(args.interval));
        }
        let sample = session.cpu_stats()?;
        debug!(sample = i, defined = sample.is_defined(), "cpu sample taken");
        cpu.push(sample);
    }

    let filesystems = session.filesystem_info()?;
    Ok(Report {
        host,
        cpu,
        filesystems,
    })
}

fn print_text(report: &Report) {
    println!("{}", report.host);
    for (i, sample) in report.cpu.iter().enumerate() {
        println!("# cpu sample {}", i + 1);
        println!("{}", sample);
    }
    for fs in &report.filesystems {
        println!("{}", fs);
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let session = match open_session(&args) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "cannot open sampling session");
            process::exit(1);
        }
    };

    let report = match collect(&session, &args) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "sampling failed");
            process::exit(1);
        }
    };
    session.close();

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!(error = %e, "cannot encode report");
                process::exit(1);
            }
        }
    } else {
        print_text(&report);
    }
}
