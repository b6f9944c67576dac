// palisade/src/main.rs
//
// palisade — request-risk scoring engine driver.
//
// Two operational modes over a JSONL request-descriptor feed (one
// RequestDescriptor per line, as produced by an HTTP boundary layer):
//   tail    — follow a live feed file
//   replay  — replay a captured feed at scaled speed
//
// Usage:
//   palisade --mode tail --path /var/log/edge/requests.jsonl
//   palisade --mode replay --path captured.jsonl --speed 10.0
//   palisade --mode tail --config policy.json

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use palisade::{EngineConfig, RequestDescriptor, RiskAssessment, RiskBand, RiskEngine};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name    = "palisade",
    about   = "Request-risk scoring engine over a JSONL descriptor feed",
    version = env!("CARGO_PKG_VERSION"),
)]
struct Cli {
    #[arg(long, value_enum, default_value = "tail")]
    mode: Mode,

    #[arg(long, default_value = "/tmp/palisade_feed.jsonl",
          help = "JSONL request-descriptor path")]
    path: PathBuf,

    #[arg(long, default_value = "1.0", help = "Replay speed multiplier")]
    speed: f64,

    #[arg(long, help = "Engine policy JSON (defaults baked in when omitted)")]
    config: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    Tail,   // follow a live JSONL feed file
    Replay, // replay a static JSONL file at scaled speed
}

// ── Terminal output ───────────────────────────────────────────────────────────

fn print_banner() {
    println!("\x1b[1m  palisade\x1b[0m — request-risk scoring engine");
    println!("  \x1b[90mmulti-signal evidence fusion | rate windows | cloaking policy\x1b[0m\n");
}

fn print_verdict(origin: &str, assessment: &RiskAssessment) {
    let band = assessment.band();
    let color = match band {
        RiskBand::Critical => "\x1b[91;1m",
        RiskBand::High => "\x1b[93;1m",
        RiskBand::Elevated => "\x1b[96m",
        _ => "\x1b[92m",
    };
    let reset = "\x1b[0m";
    let reasons = assessment.reasons.iter().take(3).cloned().collect::<Vec<_>>().join(" | ");

    println!(
        "\n{}{} score={} allowed={}{}",
        color, band, assessment.risk_score, assessment.allowed, reset
    );
    println!("  Origin      : {}{}{}", color, origin, reset);
    println!("  Fingerprint : {}", assessment.fingerprint);
    println!("  Reasons     : {}", reasons);
    if !assessment.recommendations.is_empty() {
        println!("  Advice      : {}", assessment.recommendations.join(" | "));
    }
}

async fn print_stats_loop(engine: Arc<RiskEngine>, start: Instant) {
    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
        let s = engine.stats();
        println!(
            "\n\x1b[1m── stats  uptime={:.0}s  observed={}  origins={}  active={}  blocked={} ──\x1b[0m",
            start.elapsed().as_secs_f64(),
            s.total_observed,
            s.tracked_origins,
            s.active_origins,
            s.blocked_origins,
        );
    }
}

// ── Feed sources ──────────────────────────────────────────────────────────────

async fn tail_jsonl(
    path: PathBuf,
    tx: mpsc::Sender<RequestDescriptor>,
    seek_end: bool,
) -> Result<()> {
    let file = tokio::fs::File::open(&path).await?;
    let mut lines = BufReader::new(file).lines();

    if seek_end {
        while lines.next_line().await?.is_some() {} // consume existing
    }

    info!("Tailing {}", path.display());
    loop {
        match lines.next_line().await? {
            Some(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<RequestDescriptor>(&line) {
                    Ok(d) => {
                        if tx.send(d).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Parse error: {}", e),
                }
            }
            None => tokio::time::sleep(tokio::time::Duration::from_millis(50)).await,
        }
    }
    Ok(())
}

async fn replay_jsonl(
    path: PathBuf,
    tx: mpsc::Sender<RequestDescriptor>,
    speed: f64,
) -> Result<()> {
    let content = tokio::fs::read_to_string(&path).await?;
    let mut descriptors: Vec<(f64, RequestDescriptor)> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Ok(d) = serde_json::from_str::<RequestDescriptor>(line) {
            let ts = d.timestamp.timestamp_millis() as f64;
            descriptors.push((ts, d));
        }
    }

    if descriptors.is_empty() {
        return Ok(());
    }
    descriptors.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let base_ts = descriptors[0].0;
    let base_wall = Instant::now();

    for (ts, descriptor) in descriptors {
        let offset = (ts - base_ts) / speed / 1000.0;
        let target = base_wall + std::time::Duration::from_secs_f64(offset);
        let now = Instant::now();
        if target > now {
            tokio::time::sleep(target - now).await;
        }
        if tx.send(descriptor).await.is_err() {
            break;
        }
    }
    Ok(())
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("palisade=info".parse()?),
        )
        .compact()
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let engine = Arc::new(RiskEngine::new(config)?);
    let start = Instant::now();
    let (tx, mut rx) = mpsc::channel::<RequestDescriptor>(16384);

    print_banner();

    tokio::spawn(print_stats_loop(Arc::clone(&engine), start));
    tokio::spawn(Arc::clone(&engine).housekeeping_loop());

    match cli.mode {
        Mode::Tail => {
            println!("  Mode: \x1b[96mTAIL\x1b[0m  |  {}\n", cli.path.display());
            let path = cli.path.clone();
            tokio::spawn(async move {
                tail_jsonl(path, tx, true).await.ok();
            });
        }
        Mode::Replay => {
            println!(
                "  Mode: \x1b[93mREPLAY\x1b[0m  |  {}  speed={:.1}x\n",
                cli.path.display(),
                cli.speed
            );
            let path = cli.path.clone();
            let speed = cli.speed;
            tokio::spawn(async move {
                replay_jsonl(path, tx, speed).await.ok();
            });
        }
    }

    println!("  Press Ctrl+C to stop.\n");

    // One task per descriptor — evaluations for distinct origins don't contend.
    while let Some(descriptor) = rx.recv().await {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            let assessment = engine.evaluate(&descriptor);
            if assessment.risk_score >= 30 {
                print_verdict(&descriptor.origin, &assessment);
            }
        });
    }

    Ok(())
}
