//! Worldgraph CLI - Command-line interface for world models of arithmetic word problems
//!
//! Usage:
//!   worldgraph validate "<lin>" [--vocab "<text>"]   # Keep well-formed clauses
//!   worldgraph solve <file> [--infer-part-whole]    # Solve an annotated problem
//!   worldgraph export <file> --format full          # smatch export
//!   worldgraph sequence <file> [--training]         # Per-span linearizations
//!   worldgraph replay <file> --lin <lins>           # Rebuild from linearizations
//!
//! Add `-o json` for machine-readable output. Logging follows `RUST_LOG`.

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use worldgraph_core::metrics::{strongly_equal, weakly_equal};
use worldgraph_core::storage::{annotation, smatch};
use worldgraph_core::{
    update_world_model, DeterministicReasoner, Problem, ReasonerConfig, UpdateConfig,
};
use worldgraph_frontend::{keep_well_formed, Vocabulary};

#[derive(Parser)]
#[command(name = "worldgraph")]
#[command(version)]
#[command(about = "Worldgraph - world models for arithmetic word problems")]
#[command(long_about = "Validate linearizations, build world models span by span, and solve them")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output format: summary or json
    #[arg(short, long, global = true, default_value = "summary", value_name = "FORMAT")]
    output: String,
}

#[derive(Subcommand)]
enum Command {
    /// Print the well-formed clauses of a linearization
    Validate {
        #[arg(value_name = "TEXT")]
        lin: String,
        /// Only admit text arguments drawn from this text
        #[arg(long, value_name = "TEXT")]
        vocab: Option<String>,
    },
    /// Solve the final state of an annotated problem
    Solve {
        #[arg(value_name = "FILE")]
        file: String,
        #[arg(long)]
        infer_part_whole: bool,
    },
    /// Export the final state in smatch format
    Export {
        #[arg(value_name = "FILE")]
        file: String,
        #[arg(long, value_enum, default_value = "topology")]
        format: ExportFormat,
    },
    /// Print the per-span linearization of an annotated problem
    Sequence {
        #[arg(value_name = "FILE")]
        file: String,
        /// Hide items the updater would generate on its own
        #[arg(long)]
        training: bool,
    },
    /// Rebuild an annotated problem from one linearization per span and
    /// compare it with the annotation
    Replay {
        #[arg(value_name = "FILE")]
        file: String,
        #[arg(long, value_name = "FILE")]
        lin: String,
        #[arg(long)]
        enforce_vocab: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Topology,
    Full,
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_output = cli.output == "json";

    match cli.command {
        Command::Validate { lin, vocab } => {
            let vocab = vocab.as_deref().map(Vocabulary::from_text);
            let clauses = keep_well_formed(&lin, vocab.as_ref());
            if json_output {
                let items: Vec<_> = clauses
                    .iter()
                    .map(|c| json!({ "type": c.keyword(), "text": c.text }))
                    .collect();
                print_json(&json!(items));
            } else if clauses.is_empty() {
                println!("No well-formed clauses");
            } else {
                for clause in &clauses {
                    println!("{}", clause.text);
                }
            }
        }
        Command::Solve {
            file,
            infer_part_whole,
        } => {
            let mut problem = load(&file);
            let reasoner = DeterministicReasoner::new(ReasonerConfig { infer_part_whole });
            let gold = problem.answer().cloned();
            match reasoner.solve_problem(&mut problem) {
                Ok(resolution) => {
                    let correct = match (&gold, resolution.value()) {
                        (Some(g), Some(v)) => Some(g == v),
                        _ => None,
                    };
                    if json_output {
                        print_json(&json!({
                            "id": problem.id(),
                            "reference": problem.reference().map(ToString::to_string),
                            "resolution": resolution.to_string(),
                            "resolved": resolution.is_resolved(),
                            "answer": gold.map(|g| g.to_string()),
                            "correct": correct,
                        }));
                    } else {
                        println!("✓ {}: {}", problem.id(), resolution);
                        if let Some(c) = correct {
                            println!("  matches annotated answer: {}", c);
                        }
                    }
                }
                Err(e) => fail(&format!("Error solving '{}': {}", file, e)),
            }
        }
        Command::Export { file, format } => {
            let problem = load(&file);
            let exported = match format {
                ExportFormat::Topology => smatch::to_topology(&problem),
                ExportFormat::Full => smatch::to_full(&problem),
            };
            match exported {
                Ok(text) => print!("{}", text),
                Err(e) => fail(&format!("Error exporting '{}': {}", file, e)),
            }
        }
        Command::Sequence { file, training } => {
            let problem = load(&file);
            let lines = (0..problem.states().len())
                .map(|i| problem.linearize_diff(i, training))
                .collect::<Result<Vec<_>, _>>();
            match lines {
                Ok(lines) if json_output => print_json(&json!(lines)),
                Ok(lines) => {
                    for line in lines {
                        println!("{}", line);
                    }
                }
                Err(e) => fail(&format!("Error linearizing '{}': {}", file, e)),
            }
        }
        Command::Replay {
            file,
            lin,
            enforce_vocab,
        } => {
            let gold = load(&file);
            let lins = match std::fs::read_to_string(&lin) {
                Ok(s) => s,
                Err(e) => fail(&format!("Error reading file '{}': {}", lin, e)),
            };
            let replayed = replay(&gold, &lins, UpdateConfig { enforce_vocab });
            let strong = strongly_equal(&gold, &replayed);
            let weak = weakly_equal(&gold, &replayed);
            if json_output {
                print_json(&json!({
                    "id": gold.id(),
                    "states": replayed.states().len(),
                    "strongly_equal": strong,
                    "weakly_equal": weak,
                }));
            } else {
                println!(
                    "{}: {}/{} states, strongly equal: {}, weakly equal: {}",
                    gold.id(),
                    replayed.states().len(),
                    replayed.num_states(),
                    strong,
                    weak
                );
            }
        }
    }
}

/// Applies one line per span; missing lines count as empty.
fn replay(gold: &Problem, lins: &str, config: UpdateConfig) -> Problem {
    let mut problem = gold.without_states();
    let mut lines = lins.lines();
    while !problem.is_parsed() {
        let line = lines.next().unwrap_or("");
        match update_world_model(&mut problem, line, &config) {
            Ok(report) => {
                for d in &report.diagnostics {
                    tracing::warn!("span {}: clause '{}' rejected: {}", problem.states().len() - 1, d.clause, d.error);
                }
            }
            Err(e) => fail(&format!("Error updating '{}': {}", gold.id(), e)),
        }
    }
    problem
}

fn load(file: &str) -> Problem {
    match annotation::load_problem(file) {
        Ok(p) => p,
        Err(e) => fail(&format!("Error loading '{}': {}", file, e)),
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(&format!("Error serializing to JSON: {}", e)),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}
