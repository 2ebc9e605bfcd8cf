//! Tabulation engine for single transferable vote (STV) elections.
//!
//! A race is described by a [`RaceData`]: ranked ballots, their vote
//! multiplicities and the race metadata. [`tabulate`] runs the iterative
//! election-or-elimination algorithm to completion and returns a
//! [`RaceResult`] with the full round-by-round trace: per-candidate counts,
//! winners, losers and vote transfers. Ties among the weakest candidates are
//! broken at random; use [`tabulate_with_rng`] with a seeded generator when
//! reproducibility matters.

mod config;

use log::{debug, info};

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

pub use crate::config::*;

/// Slack added to a fractional threshold so that a candidate must strictly
/// pass it.
const EPSILON: f64 = 1e-5;

// Tolerances for the per-round vote conservation check.
const ABS_TOLERANCE: f64 = 1e-8;
const REL_TOLERANCE: f64 = 1e-5;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum CandidateStatus {
    Running,
    Elected,
    Eliminated,
}

/// Mutable per-ballot state for one tabulation run.
///
/// `choices` is one row of the normalized ballot matrix. `weights` mirrors it
/// slot for slot: the fraction of this ballot pattern currently credited to
/// the candidate in each slot. `cursor` is the slot carrying the ballot's
/// live mass; slots before it hold mass retained by elected candidates, and a
/// cursor on a sentinel slot means the ballot is exhausted.
#[derive(Debug, Clone)]
struct BallotState {
    choices: Vec<usize>,
    weights: Vec<f64>,
    cursor: usize,
    votes: u64,
}

impl BallotState {
    fn new(choices: Vec<usize>, votes: u64) -> BallotState {
        // Normalization guarantees at least one trailing sentinel slot.
        let cursor = choices
            .iter()
            .position(|&c| c != 0)
            .unwrap_or(choices.len() - 1);
        let mut weights = vec![0.0; choices.len()];
        weights[cursor] = 1.0;
        BallotState {
            choices,
            weights,
            cursor,
            votes,
        }
    }

    /// First slot after the cursor holding a candidate that is still running,
    /// falling back to the trailing sentinel when none remains.
    fn next_live_slot(&self, status: &[CandidateStatus]) -> usize {
        for slot in self.cursor + 1..self.choices.len() {
            let cand = self.choices[slot];
            if cand != 0 && status[cand] == CandidateStatus::Running {
                return slot;
            }
        }
        self.choices.len() - 1
    }
}

// **** Public API ****

/// Validates raw rankings and reshapes them into a rectangular matrix.
///
/// Rows are right-padded with the sentinel `0` to a common width, and one
/// extra sentinel column is appended so that looking up the next choice can
/// never run off the end of a row. Every entry must lie in
/// `0..=num_candidates` (all violating row indices are reported together) and
/// no non-zero entry may repeat within a row. Nothing is silently corrected
/// besides the padding.
pub fn normalize_ballots(
    ballots: &[Vec<i32>],
    num_candidates: usize,
) -> Result<Vec<Vec<usize>>, TallyError> {
    let width = ballots.iter().map(|row| row.len()).max().unwrap_or(0);

    let oob_rows: Vec<usize> = ballots
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            row.iter()
                .any(|&e| e < 0 || e as usize > num_candidates)
        })
        .map(|(row_idx, _)| row_idx)
        .collect();
    if !oob_rows.is_empty() {
        return Err(TallyError::BallotOutOfBounds { rows: oob_rows });
    }

    for (row_idx, row) in ballots.iter().enumerate() {
        let mut seen = vec![false; num_candidates + 1];
        for &e in row {
            let cand = e as usize;
            if cand == 0 {
                continue;
            }
            if seen[cand] {
                return Err(TallyError::DuplicateRanking {
                    row: row_idx,
                    ballot: row.clone(),
                });
            }
            seen[cand] = true;
        }
    }

    Ok(ballots
        .iter()
        .map(|row| {
            let mut padded: Vec<usize> = row.iter().map(|&e| e as usize).collect();
            padded.resize(width + 1, 0);
            padded
        })
        .collect())
}

/// The vote mass a candidate needs to win a seat.
pub fn votes_needed(total_votes: f64, num_winners: usize, mode: RoundingMode) -> f64 {
    let raw = total_votes / (num_winners as f64 + 1.0);
    match mode {
        RoundingMode::Ceiling => raw.ceil(),
        RoundingMode::AddOneFloor => (1.0 + raw).floor(),
        RoundingMode::Fractional => raw + EPSILON,
    }
}

/// Runs the STV tabulation for one race with an unseeded tie-break source.
///
/// Equivalent to [`tabulate_with_rng`] with [`rand::thread_rng`], so the
/// elimination order among tied candidates is not reproducible between runs.
pub fn tabulate(race: &RaceData, mode: RoundingMode) -> Result<RaceResult, TallyError> {
    tabulate_with_rng(race, mode, &mut rand::thread_rng())
}

/// Runs the STV tabulation for one race.
///
/// The race is tallied round by round until `num_winners` candidates are
/// elected. Each round either elects every undecided candidate at or above
/// the vote threshold (winners keep exactly the threshold and pass the
/// surplus to the next ranked choices), eliminates the weakest undecided
/// candidate (passing on all of its votes), or ends immediately when the
/// remaining field exactly fills the remaining seats.
///
/// `rng` is consulted only to break ties among the weakest candidates, so a
/// seeded generator makes the whole run deterministic.
pub fn tabulate_with_rng<R: Rng + ?Sized>(
    race: &RaceData,
    mode: RoundingMode,
    rng: &mut R,
) -> Result<RaceResult, TallyError> {
    let num_candidates = race.metadata.num_candidates();
    let num_slots = num_candidates + 1;

    if race.ballots.len() != race.votes.len() {
        return Err(TallyError::MismatchedLengths {
            ballots: race.ballots.len(),
            votes: race.votes.len(),
        });
    }
    if race.metadata.num_winners < 1 || race.metadata.num_winners > num_candidates {
        return Err(TallyError::InvalidNumWinners {
            num_winners: race.metadata.num_winners,
            num_candidates,
        });
    }

    // Upstream validation is not trusted: the ballot matrix is re-checked on
    // every run.
    let matrix = normalize_ballots(&race.ballots, num_candidates)?;

    let total_votes: f64 = race.votes.iter().map(|&v| v as f64).sum();
    let threshold = votes_needed(total_votes, race.metadata.num_winners, mode);
    info!(
        "race {:?}: {} ballot patterns, {} votes, threshold {} ({:?})",
        race.metadata.race_name,
        race.ballots.len(),
        total_votes,
        threshold,
        mode
    );

    let mut ballots: Vec<BallotState> = matrix
        .into_iter()
        .zip(race.votes.iter())
        .map(|(choices, &votes)| BallotState::new(choices, votes))
        .collect();

    // Index 0 is the exhausted sentinel. It is never a removal source and
    // next_live_slot never considers it, so its status is never read.
    let mut status = vec![CandidateStatus::Running; num_slots];
    status[0] = CandidateStatus::Eliminated;

    let mut elected_count: usize = 0;
    let mut rounds: Vec<RoundResult> = Vec::new();

    while elected_count < race.metadata.num_winners {
        if rounds.len() >= num_candidates {
            // Every round decides at least one of the N candidates, so more
            // than N rounds means the engine is broken.
            return Err(TallyError::NoConvergence {
                rounds: rounds.len(),
            });
        }

        let round = run_round(
            &mut ballots,
            &mut status,
            threshold,
            race.metadata.num_winners - elected_count,
            rng,
        );
        elected_count += round.elected.len();
        debug!(
            "round {}: elected {:?} eliminated {:?} transfers {:?}",
            rounds.len(),
            round.elected,
            round.eliminated,
            round.transfers
        );

        let tallied: f64 = round.count.iter().sum();
        if (tallied - total_votes).abs() > ABS_TOLERANCE + REL_TOLERANCE * total_votes.abs() {
            return Err(TallyError::CountMismatch {
                round: rounds.len(),
                tallied,
                cast: total_votes,
            });
        }
        rounds.push(round);
    }

    Ok(RaceResult {
        metadata: race.metadata.clone(),
        rounds,
    })
}

// **** Round machinery ****

fn run_round<R: Rng + ?Sized>(
    ballots: &mut [BallotState],
    status: &mut [CandidateStatus],
    threshold: f64,
    winners_needed: usize,
    rng: &mut R,
) -> RoundResult {
    let num_slots = status.len();

    // Tally every slot, not just the live ones: elected candidates keep
    // showing the mass they retained and slot 0 accumulates exhausted mass.
    let mut count = vec![0.0; num_slots];
    for ballot in ballots.iter() {
        for (slot, &cand) in ballot.choices.iter().enumerate() {
            let weight = ballot.weights[slot];
            if weight != 0.0 {
                count[cand] += weight * ballot.votes as f64;
            }
        }
    }
    debug!("tally: {:?}", count);

    let undecided: Vec<usize> = (1..num_slots)
        .filter(|&c| status[c] == CandidateStatus::Running)
        .collect();

    let mut elected: Vec<usize> = Vec::new();
    let mut eliminated: Vec<usize> = Vec::new();
    // Candidates removed from consideration this round, with the fraction of
    // their mass they keep: winners keep exactly the threshold, losers keep
    // nothing.
    let mut removed: Vec<(usize, f64)> = Vec::new();

    if undecided.len() == winners_needed {
        // The remaining field already fills the remaining seats. Elect
        // everyone left, threshold or not, and skip the transfer machinery.
        for &cand in &undecided {
            status[cand] = CandidateStatus::Elected;
        }
        elected = undecided;
    } else if undecided.iter().any(|&c| count[c] >= threshold) {
        // Elect all candidates at or above the threshold simultaneously.
        for &cand in &undecided {
            if count[cand] >= threshold {
                status[cand] = CandidateStatus::Elected;
                elected.push(cand);
                removed.push((cand, threshold / count[cand]));
            }
        }
    } else {
        // No winner this round: eliminate the candidate with the fewest
        // votes, picking uniformly at random among ties.
        let min_count = undecided
            .iter()
            .map(|&c| count[c])
            .fold(f64::INFINITY, f64::min);
        let tied: Vec<usize> = undecided
            .iter()
            .copied()
            .filter(|&c| count[c] == min_count)
            .collect();
        let loser = *tied.choose(rng).expect("at least one undecided candidate");
        if tied.len() > 1 {
            debug!("tie among {:?} at {}, eliminating {}", tied, min_count, loser);
        }
        status[loser] = CandidateStatus::Eliminated;
        eliminated.push(loser);
        removed.push((loser, 0.0));
    }

    let mut transfers: BTreeMap<usize, BTreeMap<usize, f64>> = BTreeMap::new();
    for &(source, multiplier) in &removed {
        let mut targets: BTreeMap<usize, f64> = BTreeMap::new();
        for ballot in ballots.iter_mut() {
            if ballot.choices[ballot.cursor] != source {
                continue;
            }
            let next = ballot.next_live_slot(status);
            let moved = ballot.weights[ballot.cursor] * (1.0 - multiplier);
            ballot.weights[ballot.cursor] *= multiplier;
            ballot.weights[next] += moved;
            let amount = moved * ballot.votes as f64;
            if amount != 0.0 {
                *targets.entry(ballot.choices[next]).or_insert(0.0) += amount;
            }
            ballot.cursor = next;
        }
        if !targets.is_empty() {
            transfers.insert(source, targets);
        }
    }

    RoundResult {
        count,
        elected,
        eliminated,
        transfers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn race(num_winners: usize, names: &[&str], ballots: &[&[i32]], votes: &[u64]) -> RaceData {
        RaceData {
            metadata: RaceMetadata {
                race_name: "race".to_string(),
                num_winners,
                names: names.iter().map(|s| s.to_string()).collect(),
            },
            ballots: ballots.iter().map(|b| b.to_vec()).collect(),
            votes: votes.to_vec(),
        }
    }

    fn run(race: &RaceData, mode: RoundingMode) -> RaceResult {
        tabulate_with_rng(race, mode, &mut StdRng::seed_from_u64(7)).unwrap()
    }

    fn assert_round(
        round: &RoundResult,
        count: &[f64],
        elected: &[usize],
        eliminated: &[usize],
        transfers: &[(usize, &[(usize, f64)])],
    ) {
        assert_eq!(round.count.len(), count.len());
        for (idx, (a, d)) in round.count.iter().zip(count).enumerate() {
            assert!((a - d).abs() < 1e-6, "count[{}]: {} != {}", idx, a, d);
        }
        assert_eq!(round.elected, elected);
        assert_eq!(round.eliminated, eliminated);

        let sources: Vec<usize> = round.transfers.keys().copied().collect();
        let expected_sources: Vec<usize> = transfers.iter().map(|(s, _)| *s).collect();
        assert_eq!(sources, expected_sources);
        for (source, expected_targets) in transfers {
            let targets = &round.transfers[source];
            let target_keys: Vec<usize> = targets.keys().copied().collect();
            let expected_keys: Vec<usize> = expected_targets.iter().map(|(t, _)| *t).collect();
            assert_eq!(target_keys, expected_keys, "targets of {}", source);
            for (target, amount) in expected_targets.iter() {
                let actual = targets[target];
                assert!(
                    (actual - amount).abs() < 1e-6,
                    "transfer {} -> {}: {} != {}",
                    source,
                    target,
                    actual,
                    amount
                );
            }
        }
    }

    fn assert_conserved(result: &RaceResult, total: f64) {
        for (round_id, round) in result.rounds.iter().enumerate() {
            let sum: f64 = round.count.iter().sum();
            assert!(
                (sum - total).abs() < 1e-6,
                "round {} total {} != {}",
                round_id,
                sum,
                total
            );
        }
    }

    fn assert_decisions_final(result: &RaceResult) {
        let mut decided: HashSet<usize> = HashSet::new();
        for round in &result.rounds {
            for &cand in round.elected.iter().chain(round.eliminated.iter()) {
                assert!(decided.insert(cand), "candidate {} decided twice", cand);
            }
        }
    }

    // ---- Normalizer ----

    #[test]
    fn normalize_rectangular() {
        let ballots = vec![vec![1, 0, 0], vec![1, 2, 0], vec![1, 2, 3]];
        let matrix = normalize_ballots(&ballots, 3).unwrap();
        assert_eq!(
            matrix,
            vec![vec![1, 0, 0, 0], vec![1, 2, 0, 0], vec![1, 2, 3, 0]]
        );
    }

    #[test]
    fn normalize_ragged() {
        let ballots = vec![vec![1, 0, 0], vec![1, 2], vec![1, 2, 3]];
        let matrix = normalize_ballots(&ballots, 3).unwrap();
        assert_eq!(
            matrix,
            vec![vec![1, 0, 0, 0], vec![1, 2, 0, 0], vec![1, 2, 3, 0]]
        );
    }

    #[test]
    fn normalize_out_of_bounds() {
        let ballots = vec![vec![1, 0, 0], vec![1, 2, -1], vec![1, 2, 3]];
        let err = normalize_ballots(&ballots, 2).unwrap_err();
        assert_eq!(err, TallyError::BallotOutOfBounds { rows: vec![1, 2] });

        let ballots = vec![vec![1, 0, 0], vec![1, 2, -1], vec![1, 2, 0]];
        let err = normalize_ballots(&ballots, 2).unwrap_err();
        assert_eq!(err, TallyError::BallotOutOfBounds { rows: vec![1] });
        assert_eq!(err.to_string(), "bad value(s) on ballots: [1]");
        assert!(!err.is_internal());
    }

    #[test]
    fn normalize_duplicate() {
        let err = normalize_ballots(&[vec![1, 0, 1]], 2).unwrap_err();
        assert_eq!(
            err,
            TallyError::DuplicateRanking {
                row: 0,
                ballot: vec![1, 0, 1]
            }
        );
        assert_eq!(err.to_string(), "ballot 0 has duplicated entry: [1, 0, 1]");
        // Repeated zeros are blank ranks, not duplicates.
        assert!(normalize_ballots(&[vec![1, 0, 0]], 2).is_ok());
    }

    // ---- Threshold ----

    #[test]
    fn threshold_rounding() {
        assert_eq!(votes_needed(100.0, 1, RoundingMode::Ceiling), 50.0);
        assert_eq!(votes_needed(100.0, 1, RoundingMode::AddOneFloor), 51.0);
        let fractional = votes_needed(100.0, 1, RoundingMode::Fractional);
        assert!(fractional > 50.0 && fractional < 50.001);

        assert_eq!(votes_needed(101.0, 1, RoundingMode::Ceiling), 51.0);
        assert_eq!(votes_needed(101.0, 1, RoundingMode::AddOneFloor), 51.0);
    }

    #[test]
    fn rounding_mode_names() {
        assert_eq!("ceiling".parse::<RoundingMode>(), Ok(RoundingMode::Ceiling));
        assert_eq!(
            "Add_One_Floor".parse::<RoundingMode>(),
            Ok(RoundingMode::AddOneFloor)
        );
        let err = "bad".parse::<RoundingMode>().unwrap_err();
        assert_eq!(
            err,
            TallyError::UnknownRoundingMode {
                value: "bad".to_string()
            }
        );
        assert_eq!(RoundingMode::default(), RoundingMode::AddOneFloor);
    }

    // ---- Input validation ----

    #[test]
    fn mismatched_lengths() {
        let bad = race(1, &["A", "B"], &[&[1, 2], &[2, 1]], &[1]);
        let err = run_err(&bad);
        assert_eq!(
            err,
            TallyError::MismatchedLengths {
                ballots: 2,
                votes: 1
            }
        );
    }

    #[test]
    fn invalid_num_winners() {
        let bad = race(0, &["A", "B"], &[&[1, 2]], &[1]);
        assert!(matches!(
            run_err(&bad),
            TallyError::InvalidNumWinners { .. }
        ));
        let bad = race(3, &["A", "B"], &[&[1, 2]], &[1]);
        assert!(matches!(
            run_err(&bad),
            TallyError::InvalidNumWinners { .. }
        ));
    }

    fn run_err(race: &RaceData) -> TallyError {
        tabulate_with_rng(race, RoundingMode::AddOneFloor, &mut StdRng::seed_from_u64(7))
            .unwrap_err()
    }

    #[test]
    fn internal_errors_flagged() {
        let internal = TallyError::CountMismatch {
            round: 0,
            tallied: 1.0,
            cast: 2.0,
        };
        assert!(internal.is_internal());
        assert!(TallyError::NoConvergence { rounds: 4 }.is_internal());
    }

    // ---- End-to-end scenarios ----

    #[test]
    fn two_candidates_one_seat() {
        let data = race(1, &["A", "B"], &[&[2, 1], &[1, 2]], &[2, 1]);
        let result = run(&data, RoundingMode::AddOneFloor);
        assert_eq!(result.rounds.len(), 1);
        assert_round(&result.rounds[0], &[0.0, 1.0, 2.0], &[2], &[], &[]);
        assert_eq!(result.winner_names(), vec!["B".to_string()]);
    }

    #[test]
    fn undervoted_ballots_one_round() {
        let data = race(1, &["A", "B"], &[&[2, 0], &[2, 1], &[1, 2]], &[1, 1, 1]);
        let result = run(&data, RoundingMode::AddOneFloor);
        assert_eq!(result.rounds.len(), 1);
        assert_round(&result.rounds[0], &[0.0, 1.0, 2.0], &[2], &[], &[]);
    }

    #[test]
    fn fully_blank_ballot_counts_as_exhausted() {
        let data = race(1, &["A", "B"], &[&[0, 0], &[1, 2]], &[2, 3]);
        let result = run(&data, RoundingMode::AddOneFloor);
        assert_eq!(result.rounds.len(), 1);
        assert_round(&result.rounds[0], &[2.0, 3.0, 0.0], &[1], &[], &[]);
    }

    #[test]
    fn three_candidates_one_seat_two_rounds() {
        let data = race(
            1,
            &["A", "B", "C"],
            &[&[1, 2, 3], &[2, 1, 3], &[3, 1, 2]],
            &[2, 2, 1],
        );
        let result = run(&data, RoundingMode::AddOneFloor);
        assert_eq!(result.rounds.len(), 2);
        assert_round(
            &result.rounds[0],
            &[0.0, 2.0, 2.0, 1.0],
            &[],
            &[3],
            &[(3, &[(1, 1.0)])],
        );
        assert_round(&result.rounds[1], &[0.0, 3.0, 2.0, 0.0], &[1], &[], &[]);
        assert_conserved(&result, 5.0);
        assert_decisions_final(&result);
    }

    #[test]
    fn simultaneous_election() {
        let data = race(2, &["A", "B", "C"], &[&[2, 1, 3], &[1, 2, 3]], &[3, 2]);
        let result = run(&data, RoundingMode::AddOneFloor);
        assert_eq!(result.rounds.len(), 1);
        assert_round(
            &result.rounds[0],
            &[0.0, 2.0, 3.0, 0.0],
            &[1, 2],
            &[],
            &[(2, &[(3, 1.0)])],
        );
        assert_eq!(result.winners(), vec![1, 2]);
    }

    #[test]
    fn two_seats_with_early_stop() {
        let data = race(
            2,
            &["A", "B", "C"],
            &[&[1, 3, 2], &[2, 1, 3], &[3, 1, 2], &[3, 2, 1]],
            &[2, 4, 1, 2],
        );
        let result = run(&data, RoundingMode::AddOneFloor);
        assert_eq!(result.rounds.len(), 3);
        assert_round(&result.rounds[0], &[0.0, 2.0, 4.0, 3.0], &[2], &[], &[]);
        assert_round(
            &result.rounds[1],
            &[0.0, 2.0, 4.0, 3.0],
            &[],
            &[1],
            &[(1, &[(3, 2.0)])],
        );
        // The last seat goes to the last candidate standing without a
        // threshold check.
        assert_round(&result.rounds[2], &[0.0, 0.0, 4.0, 5.0], &[3], &[], &[]);
        assert_conserved(&result, 9.0);
        assert_decisions_final(&result);
    }

    #[test]
    fn fractional_mode_surplus() {
        let data = race(
            2,
            &["A", "B", "C"],
            &[&[1, 3, 2], &[2, 1, 3], &[3, 1, 2], &[3, 2, 1]],
            &[2, 4, 1, 2],
        );
        let result = run(&data, RoundingMode::Fractional);
        assert_eq!(result.rounds.len(), 3);
        assert_round(
            &result.rounds[0],
            &[0.0, 2.0, 4.0, 3.0],
            &[2],
            &[],
            &[(2, &[(1, 0.99999)])],
        );
        assert_round(
            &result.rounds[1],
            &[0.0, 2.99999, 3.00001, 3.0],
            &[],
            &[1],
            &[(1, &[(3, 2.99999)])],
        );
        assert_round(
            &result.rounds[2],
            &[0.0, 0.0, 3.00001, 5.99999],
            &[3],
            &[],
            &[],
        );
        assert_conserved(&result, 9.0);
    }

    #[test]
    fn early_stop_can_elect_zero_vote_candidates() {
        let data = race(2, &["A", "B"], &[&[1]], &[1]);
        let result = run(&data, RoundingMode::AddOneFloor);
        assert_eq!(result.rounds.len(), 1);
        assert_round(&result.rounds[0], &[0.0, 1.0, 0.0], &[1, 2], &[], &[]);
    }

    #[test]
    fn tie_break_is_random_but_seeded() {
        let data = race(1, &["A", "B"], &[&[1], &[2]], &[1, 1]);
        let result = run(&data, RoundingMode::AddOneFloor);
        assert_eq!(result.rounds.len(), 2);
        let loser = result.rounds[0].eliminated[0];
        assert!(loser == 1 || loser == 2);
        let winner = result.rounds[1].elected[0];
        assert_eq!(winner, 3 - loser);
        // The eliminated ballot has no further choice; its vote exhausts.
        assert_round(
            &result.rounds[0],
            &[0.0, 1.0, 1.0],
            &[],
            &[loser],
            &[(loser, &[(0, 1.0)])],
        );
        assert_conserved(&result, 2.0);
        assert_decisions_final(&result);

        // Same seed, same outcome.
        let again = tabulate_with_rng(
            &data,
            RoundingMode::AddOneFloor,
            &mut StdRng::seed_from_u64(7),
        )
        .unwrap();
        assert_eq!(result, again);
    }

    // ---- FairVote worked example ----
    // https://fairvote.org/archives/multi_winner_rcv_example/

    const FAIRVOTE_BALLOTS: [(&[i32], u64); 24] = [
        (&[1, 2, 3], 625),
        (&[1, 2, 4], 125),
        (&[1, 2, 5], 250),
        (&[1, 2, 6], 250),
        (&[1, 5, 3], 500),
        (&[1, 5, 4], 500),
        (&[1, 3], 250),
        (&[2, 3, 0], 875),
        (&[2, 4], 175),
        (&[2, 5, 0], 350),
        (&[2, 6, 0], 350),
        (&[3], 1300),
        (&[4, 0, 0], 1300),
        (&[5, 2, 3], 625),
        (&[5, 2, 4], 125),
        (&[5, 2, 6], 500),
        (&[5, 3], 100),
        (&[6, 3, 0], 580),
        (&[6, 4], 300),
        (&[6, 2, 3], 50),
        (&[6, 2, 4], 10),
        (&[6, 2, 5], 40),
        (&[6, 5, 3], 10),
        (&[6, 5, 4], 10),
    ];

    #[test]
    fn fairvote_three_seats() {
        let (ballots, votes): (Vec<&[i32]>, Vec<u64>) =
            FAIRVOTE_BALLOTS.iter().copied().unzip();
        let data = race(3, &["A", "B", "C", "D", "E", "F"], &ballots, &votes);
        let result = run(&data, RoundingMode::Ceiling);

        assert_eq!(result.rounds.len(), 5);
        assert!(result.rounds.len() <= data.metadata.num_candidates());
        assert_round(
            &result.rounds[0],
            &[0.0, 2500.0, 1750.0, 1300.0, 1300.0, 1350.0, 1000.0],
            &[1],
            &[],
            &[(1, &[(2, 100.0), (3, 20.0), (5, 80.0)])],
        );
        assert_round(
            &result.rounds[1],
            &[0.0, 2300.0, 1850.0, 1320.0, 1300.0, 1430.0, 1000.0],
            &[],
            &[6],
            &[(6, &[(2, 100.0), (3, 580.0), (4, 300.0), (5, 20.0)])],
        );
        assert_round(
            &result.rounds[2],
            &[0.0, 2300.0, 1950.0, 1900.0, 1600.0, 1450.0, 0.0],
            &[],
            &[5],
            &[(5, &[(2, 1250.0), (3, 150.0), (4, 50.0)])],
        );
        assert_round(
            &result.rounds[3],
            &[0.0, 2300.0, 3200.0, 2050.0, 1650.0, 0.0, 0.0],
            &[2],
            &[],
            &[(2, &[(0, 360.0), (3, 450.0), (4, 90.0)])],
        );
        assert_round(
            &result.rounds[4],
            &[360.0, 2300.0, 2300.0, 2500.0, 1740.0, 0.0, 0.0],
            &[3],
            &[],
            &[(3, &[(0, 200.0)])],
        );
        assert_conserved(&result, 9200.0);
        assert_decisions_final(&result);
        assert_eq!(
            result.winner_names(),
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
    }

    // ---- Reporting ----

    #[test]
    fn race_result_report() {
        let data = race(1, &["A", "B"], &[&[2, 1], &[1, 2]], &[2, 1]);
        let result = run(&data, RoundingMode::AddOneFloor);
        let report = format!("{}", result);
        assert_eq!(
            report,
            "race: race\nnum_winners: 1\ncandidates: A,B\n\nRound 0:\n <exhausted>: 0\n A: 1\n B: 2 +"
        );
    }
}
