//! CLI for the timeline stamping library.
//!
//! Provides commands for stress-testing concurrent stamping and for showing
//! what a recorded timeline looks like.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use timeline::{Event, Timeline, TimelineConfig};

/// timeline — Wait-free stamped-state timeline CLI.
#[derive(Parser)]
#[command(name = "timeline", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Stamp from many threads at once and verify every stamp landed.
    Stress {
        /// Number of stamping threads.
        #[arg(long, default_value = "32")]
        threads: u32,

        /// Stamps per thread.
        #[arg(long, default_value = "10000")]
        stamps: u32,

        /// Slots in the head segment.
        #[arg(long, default_value = "8")]
        segment_capacity: usize,
    },

    /// Record a sample request lifecycle and print it.
    Demo {
        /// Output format.
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for the demo timeline.
#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Rendered timeline plus phase durations.
    Text,
    /// JSON object with events and phase durations.
    Json,
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Stress {
            threads,
            stamps,
            segment_capacity,
        } => cmd_stress(threads, stamps, segment_capacity),
        Commands::Demo { format } => cmd_demo(&format),
    };

    if let Err(e) = result {
        tracing::error!("command failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// State stamped by the stress command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tag {
    Initial,
    Thread(u32),
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Initial => f.write_str("initial"),
            Tag::Thread(id) => write!(f, "thread-{id}"),
        }
    }
}

/// Implements `timeline stress`.
fn cmd_stress(
    threads: u32,
    stamps: u32,
    segment_capacity: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = TimelineConfig::new(segment_capacity)?;
    let timeline = Arc::new(Timeline::with_config(&config, Some(Tag::Initial))?);

    tracing::info!(threads, stamps, segment_capacity, "starting stress run");
    let start = Instant::now();

    let handles: Vec<_> = (0..threads)
        .map(|id| {
            let timeline = Arc::clone(&timeline);
            thread::spawn(move || {
                for _ in 0..stamps {
                    timeline.append(Tag::Thread(id));
                }
            })
        })
        .collect();

    for handle in handles {
        handle
            .join()
            .map_err(|_| "stamping thread panicked".to_string())?;
    }

    let elapsed = start.elapsed();

    let mut frequencies: BTreeMap<Tag, u64> = BTreeMap::new();
    for event in timeline.iter() {
        *frequencies.entry(*event.state).or_default() += 1;
    }

    println!("Frequencies:");
    for (tag, count) in &frequencies {
        println!("  {:<12} {count}", tag.to_string());
    }
    println!();

    let total = u64::from(threads) * u64::from(stamps) + 1;
    let recorded: u64 = frequencies.values().sum();
    #[allow(clippy::cast_precision_loss)]
    let rate = recorded as f64 / elapsed.as_secs_f64().max(f64::EPSILON);

    println!("Stamps:   {recorded} (expected {total})");
    println!("Segments: {:?}", timeline.segment_capacities());
    println!("Elapsed:  {elapsed:.2?}");
    println!("Rate:     {}/s", format_count(rate));

    let mismatched: Vec<String> = (0..threads)
        .map(Tag::Thread)
        .chain(std::iter::once(Tag::Initial))
        .filter_map(|tag| {
            let expected = if tag == Tag::Initial { 1 } else { u64::from(stamps) };
            let actual = frequencies.get(&tag).copied().unwrap_or(0);
            (actual != expected).then(|| format!("{tag}: {actual} != {expected}"))
        })
        .collect();

    if recorded != total || !mismatched.is_empty() {
        return Err(format!(
            "stamp counts deviate ({recorded} of {total}): {}",
            mismatched.join(", ")
        )
        .into());
    }

    Ok(())
}

/// Stages of the simulated request recorded by the demo command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Stage {
    Accepted,
    Authenticated,
    Queried,
    Rendered,
    Responded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Accepted => "accepted",
            Stage::Authenticated => "authenticated",
            Stage::Queried => "queried",
            Stage::Rendered => "rendered",
            Stage::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// Phases reported by the demo: (name, from, to).
const PHASES: &[(&str, Stage, Stage)] = &[
    ("auth", Stage::Accepted, Stage::Authenticated),
    ("query", Stage::Authenticated, Stage::Queried),
    ("render", Stage::Queried, Stage::Rendered),
    ("total", Stage::Accepted, Stage::Responded),
];

/// JSON shape of the demo output.
#[derive(Serialize)]
struct DemoReport<'a> {
    issued_at: String,
    events: Vec<Event<'a, Stage>>,
    phases_ns: BTreeMap<&'static str, i64>,
}

/// Implements `timeline demo`.
fn cmd_demo(format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let timeline = Timeline::new(Some(Stage::Accepted));

    thread::sleep(Duration::from_micros(150));
    timeline.append(Stage::Authenticated);

    // The query runs on a worker thread and stamps the shared timeline.
    thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(Duration::from_millis(3));
            timeline.append(Stage::Queried);
        });
    });

    thread::sleep(Duration::from_micros(400));
    timeline.append(Stage::Rendered).append(Stage::Responded);

    let phases_ns: BTreeMap<&'static str, i64> = PHASES
        .iter()
        .map(|&(name, from, to)| (name, timeline.time_between_nanos(&from, &to)))
        .collect();

    match format {
        OutputFormat::Text => {
            println!("{timeline}");
            println!();
            for (name, nanos) in &phases_ns {
                println!("{name:<8} {nanos}ns");
            }
        }
        OutputFormat::Json => {
            let report = DemoReport {
                issued_at: timeline.issued_at().to_rfc3339(),
                events: timeline.events(),
                phases_ns,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Formats a rate with a metric suffix.
fn format_count(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.2}K", value / 1_000.0)
    } else {
        format!("{value:.0}")
    }
}
