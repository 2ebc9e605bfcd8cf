// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

/// Specification of a single race.
///
/// Candidates are identified by the indices `1..=names.len()`; `names[i - 1]`
/// is the display name for candidate index `i`. Index `0` is reserved for
/// empty rankings and exhausted ballots and never denotes a real candidate.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RaceMetadata {
    /// Unique name for this race.
    pub race_name: String,
    /// How many candidates win the race.
    pub num_winners: usize,
    /// Display names of the candidates, in index order.
    pub names: Vec<String>,
}

impl RaceMetadata {
    pub fn num_candidates(&self) -> usize {
        self.names.len()
    }
}

impl Display for RaceMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "race: {}", self.race_name)?;
        writeln!(f, "num_winners: {}", self.num_winners)?;
        write!(f, "candidates: {}", self.names.join(","))
    }
}

/// Voting data for a single race.
///
/// `votes[i]` is the number of voters who cast the ranking pattern
/// `ballots[i]`. Identical patterns may be pre-aggregated into one entry with
/// a larger count, or left as separate entries each counting one vote; the
/// tabulator treats both forms identically.
///
/// Ballot entries are plain integers on purpose: out-of-range values
/// (including negative ones) must be representable so that validation can
/// reject them with a precise message instead of the input layer silently
/// dropping them.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RaceData {
    pub metadata: RaceMetadata,
    pub ballots: Vec<Vec<i32>>,
    pub votes: Vec<u64>,
}

impl RaceData {
    /// Builds a race, checking the ballots/votes shape invariant. The
    /// tabulator re-validates ballot contents on every run regardless of how
    /// the race was constructed.
    pub fn new(
        metadata: RaceMetadata,
        ballots: Vec<Vec<i32>>,
        votes: Vec<u64>,
    ) -> Result<RaceData, TallyError> {
        if ballots.len() != votes.len() {
            return Err(TallyError::MismatchedLengths {
                ballots: ballots.len(),
                votes: votes.len(),
            });
        }
        Ok(RaceData {
            metadata,
            ballots,
            votes,
        })
    }

    /// Total number of cast votes.
    pub fn total_votes(&self) -> u64 {
        self.votes.iter().sum()
    }
}

// ******** Output data structures *********

/// The full results of a single tabulation round.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RoundResult {
    /// The vote mass held by each candidate, indexed by candidate index.
    /// Index 0 is the mass carried by exhausted ballots.
    pub count: Vec<f64>,
    /// Candidate indices newly elected this round.
    pub elected: Vec<usize>,
    /// Candidate indices newly eliminated this round.
    pub eliminated: Vec<usize>,
    /// Vote mass moved during this round, as source -> target -> amount.
    /// Target 0 collects mass that became exhausted. Zero-valued entries are
    /// omitted.
    pub transfers: BTreeMap<usize, BTreeMap<usize, f64>>,
}

/// The ordered list of round results for a single race.
///
/// Invariant: every round's `count` has `num_candidates + 1` entries, and the
/// cumulative elected list reaches `metadata.num_winners` in the final round.
#[derive(PartialEq, Debug, Clone)]
pub struct RaceResult {
    pub metadata: RaceMetadata,
    pub rounds: Vec<RoundResult>,
}

impl RaceResult {
    /// Winner indices, in the order they were elected.
    pub fn winners(&self) -> Vec<usize> {
        self.rounds
            .iter()
            .flat_map(|r| r.elected.iter().copied())
            .collect()
    }

    /// Winner display names, in the order they were elected.
    pub fn winner_names(&self) -> Vec<String> {
        self.winners()
            .iter()
            .map(|&c| self.metadata.names[c - 1].clone())
            .collect()
    }
}

impl Display for RaceResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.metadata)?;
        for (round_id, round) in self.rounds.iter().enumerate() {
            write!(f, "\nRound {}:", round_id)?;
            for (idx, cnt) in round.count.iter().enumerate() {
                let name = if idx == 0 {
                    "<exhausted>"
                } else {
                    self.metadata.names[idx - 1].as_str()
                };
                write!(f, "\n {}: {}", name, cnt)?;
                if round.elected.contains(&idx) {
                    write!(f, " +")?;
                }
                if round.eliminated.contains(&idx) {
                    write!(f, " -")?;
                }
            }
        }
        Ok(())
    }
}

// ********* Configuration **********

/// How to round the fractional vote threshold needed to win a seat.
///
/// The raw threshold is `total_votes / (num_winners + 1)`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum RoundingMode {
    /// Round up to the next integer. This matches the published FairVote
    /// worked examples, though it can produce a tie when the raw threshold is
    /// already an integer.
    Ceiling,
    /// Round down, then add one. Keeps the threshold an integer while
    /// avoiding ties: with 100 votes and one seat the threshold is 51, not
    /// 50.
    #[default]
    AddOneFloor,
    /// No rounding; a candidate needs `threshold + epsilon` votes. The most
    /// precise mode, at the price of fractional counts everywhere.
    Fractional,
}

impl FromStr for RoundingMode {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<RoundingMode, TallyError> {
        match s.to_ascii_lowercase().as_str() {
            "ceiling" => Ok(RoundingMode::Ceiling),
            "add_one_floor" => Ok(RoundingMode::AddOneFloor),
            "fractional" => Ok(RoundingMode::Fractional),
            _ => Err(TallyError::UnknownRoundingMode {
                value: s.to_string(),
            }),
        }
    }
}

// ********* Errors **********

/// Errors raised while validating race input or running a tabulation.
#[derive(PartialEq, Debug, Clone)]
pub enum TallyError {
    /// `ballots` and `votes` differ in length.
    MismatchedLengths { ballots: usize, votes: usize },
    /// Some ballot entries fall outside `0..=num_candidates`. Carries every
    /// offending row index, not just the first.
    BallotOutOfBounds { rows: Vec<usize> },
    /// A non-zero candidate index appears more than once in one ballot.
    DuplicateRanking { row: usize, ballot: Vec<i32> },
    /// `num_winners` is zero or larger than the number of candidates.
    InvalidNumWinners {
        num_winners: usize,
        num_candidates: usize,
    },
    /// A rounding mode name that does not match any [`RoundingMode`].
    UnknownRoundingMode { value: String },
    /// A round's recorded counts do not add up to the cast votes. This
    /// signals a defect in the engine, never bad input.
    CountMismatch {
        round: usize,
        tallied: f64,
        cast: f64,
    },
    /// The round loop did not settle within the candidate-count bound. Also
    /// an engine defect.
    NoConvergence { rounds: usize },
}

impl TallyError {
    /// True for internal-consistency failures, which callers should report as
    /// bugs rather than as input errors.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            TallyError::CountMismatch { .. } | TallyError::NoConvergence { .. }
        )
    }
}

impl Error for TallyError {}

impl Display for TallyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyError::MismatchedLengths { ballots, votes } => write!(
                f,
                "ballots ({}) and votes ({}) have different lengths",
                ballots, votes
            ),
            TallyError::BallotOutOfBounds { rows } => {
                write!(f, "bad value(s) on ballots: {:?}", rows)
            }
            TallyError::DuplicateRanking { row, ballot } => {
                write!(f, "ballot {} has duplicated entry: {:?}", row, ballot)
            }
            TallyError::InvalidNumWinners {
                num_winners,
                num_candidates,
            } => write!(
                f,
                "num_winners must be between 1 and the number of candidates ({}), got {}",
                num_candidates, num_winners
            ),
            TallyError::UnknownRoundingMode { value } => {
                write!(f, "unknown rounding mode: {:?}", value)
            }
            TallyError::CountMismatch {
                round,
                tallied,
                cast,
            } => write!(
                f,
                "internal error: round {} count total {} does not equal original votes {}",
                round, tallied, cast
            ),
            TallyError::NoConvergence { rounds } => write!(
                f,
                "internal error: tabulation did not converge after {} rounds",
                rounds
            ),
        }
    }
}
