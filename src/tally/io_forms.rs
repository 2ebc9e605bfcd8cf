// Parsing of the Google Forms CSV export into per-race ballot data.

use std::collections::BTreeMap;
use std::io::Read;
use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;
use snafu::prelude::*;

use crate::tally::*;
use stv_voting::{RaceData, RaceMetadata};

lazy_static! {
    // A race column is the question text, an optional winner count and one
    // candidate name, e.g. `City Council (4 winners) [Darth Vader]`.
    static ref QUESTION_RE: Regex = Regex::new(
        r"^(?P<question>.*?)(?:\s+\((?P<num_winners>\d+)\s+winners?\))?\s*? \[(?P<option>.*)\]$"
    )
    .unwrap();
    static ref NUMBER_RE: Regex = Regex::new(r"\d+").unwrap();
}

/// Parses race and ballot info from a Google Forms CSV results file.
///
/// The required format is one header line, followed by one line for each
/// ballot. The column headers determine the races and candidates: adjacent
/// columns sharing the same question text form one race, and any other
/// column ends the current race. A missing winner parenthetical means a
/// single-winner race.
///
/// Each cell carries the rank the voter gave to that column's candidate,
/// either as a plain number or as an ordinal (`1st`, `2nd`, ...); an empty
/// cell leaves the candidate unranked. Gaps in the rank numbers are fine.
/// An optional `weight` column multiplies the vote count of its row.
///
/// Identical ranking patterns are aggregated into one ballot entry with a
/// summed vote count, which the tabulator treats the same as repeated
/// entries.
pub fn parse_google_form_csv<R: Read>(input: R) -> StvResult<Vec<RaceData>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let header: Vec<String> = reader
        .headers()
        .context(CsvParseSnafu {})?
        .iter()
        .map(|s| s.to_string())
        .collect();
    let records: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .context(CsvParseSnafu {})?;

    let weight_col = header.iter().position(|h| h == "weight");

    let mut races: Vec<RaceData> = Vec::new();
    for (metadata, columns) in parse_header(&header) {
        // The map aggregates identical patterns and keeps the ballots in a
        // deterministic (lexicographic) order.
        let mut aggregated: BTreeMap<Vec<i32>, u64> = BTreeMap::new();
        for (idx, record) in records.iter().enumerate() {
            let lineno = idx + 2;
            let weight = match weight_col {
                Some(col) => {
                    let cell = record.get(col).unwrap_or("").trim();
                    cell.parse::<u64>().ok().context(BadWeightCellSnafu {
                        lineno,
                        content: cell.to_string(),
                    })?
                }
                None => 1,
            };
            let ballot = read_ballot(record, &columns, lineno)?;
            *aggregated.entry(ballot).or_insert(0) += weight;
        }
        let (ballots, votes) = aggregated.into_iter().unzip();
        races.push(RaceData {
            metadata,
            ballots,
            votes,
        });
    }
    Ok(races)
}

/// Parses the header row into metadata and a column range for each race.
pub fn parse_header(header: &[String]) -> Vec<(RaceMetadata, Range<usize>)> {
    let mut races: Vec<(RaceMetadata, Range<usize>)> = Vec::new();
    // Question, winner count, candidate names and start column of the race
    // block being assembled.
    let mut current: Option<(String, usize, Vec<String>, usize)> = None;

    for (col_idx, col) in header.iter().enumerate() {
        match QUESTION_RE.captures(col) {
            Some(caps) => {
                let question = caps["question"].trim().to_string();
                let num_winners = caps
                    .name("num_winners")
                    .and_then(|m| m.as_str().parse::<usize>().ok())
                    .unwrap_or(1);
                let option = caps["option"].trim().to_string();

                let same_race = matches!(&current, Some((q, _, _, _)) if *q == question);
                if same_race {
                    if let Some((_, _, options, _)) = current.as_mut() {
                        options.push(option);
                    }
                } else {
                    flush_race(&mut races, current.take(), col_idx);
                    current = Some((question, num_winners, vec![option], col_idx));
                }
            }
            None => flush_race(&mut races, current.take(), col_idx),
        }
    }
    flush_race(&mut races, current.take(), header.len());
    races
}

fn flush_race(
    races: &mut Vec<(RaceMetadata, Range<usize>)>,
    current: Option<(String, usize, Vec<String>, usize)>,
    end: usize,
) {
    if let Some((race_name, num_winners, names, start)) = current {
        races.push((
            RaceMetadata {
                race_name,
                num_winners,
                names,
            },
            start..end,
        ));
    }
}

// One CSV row restricted to one race's columns, turned into a ranking of
// candidate indices (highest preference first) padded with zeros to the race
// width. Equal ranks fall back to column order.
fn read_ballot(
    record: &csv::StringRecord,
    columns: &Range<usize>,
    lineno: usize,
) -> StvResult<Vec<i32>> {
    let mut ranked: Vec<(u32, i32)> = Vec::new();
    for (offset, col) in columns.clone().enumerate() {
        let rank = coerce_rank(record.get(col).unwrap_or(""), lineno)?;
        if rank > 0 {
            ranked.push((rank, offset as i32 + 1));
        }
    }
    ranked.sort();
    let mut ballot: Vec<i32> = ranked.iter().map(|&(_, cand)| cand).collect();
    ballot.resize(columns.len(), 0);
    Ok(ballot)
}

/// Extracts a rank number from a CSV cell. Empty means no ranking; otherwise
/// the cell must contain exactly one embedded number (`3`, `3rd`, ...).
fn coerce_rank(cell: &str, lineno: usize) -> StvResult<u32> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(0);
    }
    let mut numbers = NUMBER_RE.find_iter(cell);
    let first = numbers.next();
    match (first, numbers.next()) {
        (Some(m), None) => m.as_str().parse::<u32>().ok().context(BadRankCellSnafu {
            lineno,
            content: cell.to_string(),
        }),
        _ => BadRankCellSnafu {
            lineno,
            content: cell.to_string(),
        }
        .fail(),
    }
}
