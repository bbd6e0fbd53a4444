//! # Spanline CLI
//!
//! Runs one continuous beam job and prints the governing results.
//!
//! ```text
//! beam_cli job.json        # read the job from a file
//! beam_cli < job.json      # or from stdin
//! RUST_LOG=debug beam_cli job.json
//! ```
//!
//! The summary is followed by the JSON `AnalysisSummary`. On failure the
//! error and its JSON form go to stderr and the exit code is 1.

use std::io::{self, Read};
use std::process::ExitCode;

use beam_core::calculations::superposition::{Extreme, GlobalExtreme};
use beam_core::calculations::{AnalysisJob, AnalysisSummary};
use beam_core::loads::LoadType;
use beam_core::{CalcError, CalcResult};
use log::info;

fn read_job(path: Option<&str>) -> CalcResult<String> {
    let read = match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).map(|_| text)
        }
    };
    read.map_err(|e| CalcError::invalid_input("job", path.unwrap_or("<stdin>"), e.to_string()))
}

fn run(path: Option<&str>) -> CalcResult<AnalysisSummary> {
    let text = read_job(path)?;
    let job = AnalysisJob::from_json(&text)?;
    info!(
        "analyzing '{}' ({} spans, combination set {})",
        job.beam.label,
        job.beam.span_count(),
        job.options.combination_set
    );
    Ok(job.run()?.summary())
}

fn main() -> ExitCode {
    env_logger::init();
    let path = std::env::args().nth(1);

    match run(path.as_deref()) {
        Ok(summary) => {
            print_summary(&summary);
            println!();
            println!("JSON Output:");
            if let Ok(json) = serde_json::to_string_pretty(&summary) {
                println!("{}", json);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}

fn combination_label(summary: &AnalysisSummary, combination: Option<usize>) -> String {
    match summary.governing(combination) {
        Some(info) => format!("{} [{}], pattern {}", info.combination, info.equation, info.pattern),
        None => "-".to_string(),
    }
}

fn print_extreme(summary: &AnalysisSummary, name: &str, extreme: &GlobalExtreme) {
    println!(
        "  {:<6} {:>14.4}  at x = {:<10.4} ({})",
        name,
        extreme.value,
        extreme.x,
        combination_label(summary, extreme.combination)
    );
}

fn print_reaction(summary: &AnalysisSummary, name: &str, extreme: &Extreme) {
    if extreme.combination.is_some() {
        println!(
            "    {:<6} {:>14.4}  ({})",
            name,
            extreme.value,
            combination_label(summary, extreme.combination)
        );
    }
}

fn print_summary(summary: &AnalysisSummary) {
    println!("═══════════════════════════════════════");
    println!("  CONTINUOUS BEAM: {}", if summary.label.is_empty() { "-" } else { summary.label.as_str() });
    println!("═══════════════════════════════════════");
    println!();
    println!("Model:");
    println!("  Spans:        {} ({} segments)", summary.num_spans, summary.num_segments);
    println!("  Unknowns:     {} (half-bandwidth {})", summary.num_dof, summary.half_bandwidth);
    println!("  Combinations: {} ({})", summary.num_combinations, summary.combination_set);
    println!("  Patterns:     {} ({:?})", summary.num_patterns, summary.pattern_scheme);
    println!();

    println!("Unfactored reactions:");
    for support in &summary.supports {
        let loaded: Vec<String> = LoadType::ALL
            .iter()
            .filter(|t| support.reactions.force[t.slot()] != 0.0 || support.reactions.force_min[t.slot()] != 0.0)
            .map(|t| format!("{}={:.2}", t.code(), support.reactions.force[t.slot()]))
            .collect();
        println!(
            "  Node {} ({}) x = {:.4}: {}",
            support.node,
            support.fixity,
            support.x,
            if loaded.is_empty() {
                format!("total={:.2}", support.reactions.force[0])
            } else {
                loaded.join(", ")
            }
        );
    }
    println!();

    let env = &summary.envelope;
    println!("Envelope:");
    print_extreme(summary, "V+", &env.v_max);
    print_extreme(summary, "V-", &env.v_min);
    print_extreme(summary, "M+", &env.m_max);
    print_extreme(summary, "M-", &env.m_min);
    if let Some(max) = &env.deflection_max {
        print_extreme(summary, "δ+", max);
    }
    if let Some(min) = &env.deflection_min {
        print_extreme(summary, "δ-", min);
    }
    println!();

    println!("Factored reactions:");
    for reaction in &env.reactions {
        if reaction.force_max.combination.is_none()
            && reaction.force_min.combination.is_none()
            && reaction.moment_max.combination.is_none()
            && reaction.moment_min.combination.is_none()
        {
            continue;
        }
        println!("  Node {} x = {:.4}:", reaction.node, reaction.x);
        print_reaction(summary, "R+", &reaction.force_max);
        print_reaction(summary, "R-", &reaction.force_min);
        print_reaction(summary, "MR+", &reaction.moment_max);
        print_reaction(summary, "MR-", &reaction.moment_min);
    }
}
