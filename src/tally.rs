use std::fs;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value as JSValue};
use snafu::{prelude::*, Snafu};
use text_diff::print_diff;

use stv_voting::*;

use crate::args::Args;

pub mod io_forms;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StvError {
    #[snafu(display("Error opening file {path}"))]
    OpeningInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading the CSV input"))]
    CsvParse { source: csv::Error },
    #[snafu(display("Could not determine a rank from {content:?} (line {lineno})"))]
    BadRankCell { lineno: usize, content: String },
    #[snafu(display("Could not determine a weight from {content:?} (line {lineno})"))]
    BadWeightCell { lineno: usize, content: String },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading the reference summary {path}"))]
    OpeningReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error processing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Invalid rounding mode"))]
    InvalidRounding { source: TallyError },
    #[snafu(display("Failed to tabulate race {race:?}"))]
    RaceFailed { source: TallyError, race: String },
    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type StvResult<T> = Result<T, StvError>;

/// Runs the tabulation: parses the input CSV, tabulates every race it
/// contains, prints the winners (or the full rounds with `--details`) and
/// optionally writes or checks a JSON summary.
pub fn run_tally(args: &Args) -> StvResult<()> {
    let mode: RoundingMode = match &args.round_mode {
        Some(name) => name.parse().context(InvalidRoundingSnafu {})?,
        None => RoundingMode::default(),
    };

    let file = fs::File::open(&args.input).context(OpeningInputSnafu {
        path: args.input.clone(),
    })?;
    let races = io_forms::parse_google_form_csv(file)?;
    info!("parsed {} race(s) from {}", races.len(), args.input);

    let mut summaries: Vec<JSValue> = Vec::new();
    for race in races.iter() {
        let result = match args.seed {
            Some(seed) => tabulate_with_rng(race, mode, &mut StdRng::seed_from_u64(seed)),
            None => tabulate(race, mode),
        }
        .map_err(|err| {
            if err.is_internal() {
                warn!("tabulation failed on an internal check, this is a bug: {}", err);
            }
            err
        })
        .context(RaceFailedSnafu {
            race: race.metadata.race_name.clone(),
        })?;

        if args.details {
            println!("{}", result);
        } else {
            println!("race: {}", race.metadata.race_name);
            println!("winner(s): {}", result.winner_names().join(", "));
        }
        summaries.push(race_summary_js(race, &result, mode));
    }

    let summary = json!({ "races": summaries });
    let pretty = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        Some("stdout") => println!("{}", pretty),
        Some(path) => fs::write(path, &pretty).context(WritingSummarySnafu {
            path: path.to_string(),
        })?,
        None => {}
    }

    if let Some(path) = &args.reference {
        let reference_str = fs::read_to_string(path).context(OpeningReferenceSnafu {
            path: path.clone(),
        })?;
        let reference: JSValue =
            serde_json::from_str(&reference_str).context(ParsingJsonSnafu {})?;
        let pretty_reference =
            serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
        if pretty_reference != pretty {
            warn!("found differences with the reference summary");
            print_diff(pretty_reference.as_str(), pretty.as_str(), "\n");
            whatever!("Difference detected between the tabulated summary and the reference");
        }
    }

    Ok(())
}

// The JSON summary of one race: metadata, threshold and the full round
// records with names substituted for candidate indices.
fn race_summary_js(race: &RaceData, result: &RaceResult, mode: RoundingMode) -> JSValue {
    let label = |idx: usize| -> String {
        if idx == 0 {
            "exhausted".to_string()
        } else {
            race.metadata.names[idx - 1].clone()
        }
    };

    let threshold = votes_needed(race.total_votes() as f64, race.metadata.num_winners, mode);

    let rounds: Vec<JSValue> = result
        .rounds
        .iter()
        .enumerate()
        .map(|(round_id, round)| {
            let tally: serde_json::Map<String, JSValue> = round
                .count
                .iter()
                .enumerate()
                .map(|(idx, count)| (label(idx), json!(count)))
                .collect();
            let transfers: serde_json::Map<String, JSValue> = round
                .transfers
                .iter()
                .map(|(src, targets)| {
                    let targets: serde_json::Map<String, JSValue> = targets
                        .iter()
                        .map(|(tgt, amount)| (label(*tgt), json!(amount)))
                        .collect();
                    (label(*src), JSValue::Object(targets))
                })
                .collect();
            json!({
                "round": round_id + 1,
                "tally": tally,
                "elected": round.elected.iter().map(|&c| label(c)).collect::<Vec<_>>(),
                "eliminated": round.eliminated.iter().map(|&c| label(c)).collect::<Vec<_>>(),
                "transfers": transfers,
            })
        })
        .collect();

    json!({
        "race": race.metadata.race_name,
        "num_winners": race.metadata.num_winners,
        "candidates": race.metadata.names,
        "threshold": threshold,
        "winners": result.winner_names(),
        "rounds": rounds,
    })
}
