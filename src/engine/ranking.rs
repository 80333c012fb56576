use super::round_to;
use crate::models::TeamRecord;

/// Sort by vote count (descending, stable) and assign competition ranks.
///
/// Teams with equal vote counts share the rank of the first team in their
/// group; the next distinct count takes its 1-based position, leaving a gap.
pub fn assign_ranks(mut teams: Vec<TeamRecord>) -> Vec<TeamRecord> {
    teams.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));

    let team_count = teams.len();
    let mut previous: Option<(i64, usize)> = None;

    for (position, team) in teams.iter_mut().enumerate() {
        let rank = match previous {
            Some((votes, rank)) if votes == team.vote_count => rank,
            _ => position + 1,
        };

        team.rank = rank;
        team.rank_percentile = rank_percentile(rank, team_count);
        previous = Some((team.vote_count, rank));
    }

    teams
}

/// 0.0 for the best rank
pub fn rank_percentile(rank: usize, team_count: usize) -> f64 {
    if team_count == 0 {
        return 0.0;
    }
    round_to((rank - 1) as f64 / team_count as f64, 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn team(label: &str, votes: i64) -> TeamRecord {
        TeamRecord {
            team_id: json!(label),
            team_identifier: Some(label.to_string()),
            american_odds: None,
            current_vote_percentage: 0.0,
            vote_count: votes,
            original_priority: 0,
            game_id: Value::Null,
            team_db_id: Value::Null,
            multiplier: 1.0,
            is_locked: false,
            game_lock_time: None,
            implied_win_probability: 0.0,
            hours_until_game_starts: None,
            rank: 0,
            rank_percentile: 0.0,
            votes_behind_leader: 0,
            percentage_behind_leader: 0.0,
        }
    }

    fn labels(teams: &[TeamRecord]) -> Vec<&str> {
        teams.iter().filter_map(|t| t.team_identifier.as_deref()).collect()
    }

    fn ranks(teams: &[TeamRecord]) -> Vec<usize> {
        teams.iter().map(|t| t.rank).collect()
    }

    #[test]
    fn test_distinct_votes() {
        let ranked = assign_ranks(vec![team("C", 20), team("A", 50), team("B", 30)]);

        assert_eq!(labels(&ranked), vec!["A", "B", "C"]);
        assert_eq!(ranks(&ranked), vec![1, 2, 3]);
        let percentiles: Vec<f64> = ranked.iter().map(|t| t.rank_percentile).collect();
        assert_eq!(percentiles, vec![0.0, 0.3333, 0.6667]);
    }

    #[test]
    fn test_ties_share_rank_and_leave_gap() {
        let ranked = assign_ranks(vec![
            team("A", 9),
            team("B", 12),
            team("C", 9),
            team("D", 4),
            team("E", 12),
        ]);

        // stable: B before E, A before C
        assert_eq!(labels(&ranked), vec!["B", "E", "A", "C", "D"]);
        assert_eq!(ranks(&ranked), vec![1, 1, 3, 3, 5]);
        assert_eq!(ranked[4].rank_percentile, 0.8);
    }

    #[test]
    fn test_all_tied() {
        let ranked = assign_ranks(vec![team("A", 10), team("B", 10), team("C", 10)]);

        assert_eq!(ranks(&ranked), vec![1, 1, 1]);
        assert!(ranked.iter().all(|t| t.rank_percentile == 0.0));
    }

    #[test]
    fn test_single_and_empty() {
        let ranked = assign_ranks(vec![team("A", 0)]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].rank_percentile, 0.0);

        assert!(assign_ranks(Vec::new()).is_empty());
    }

    #[test]
    fn test_rank_groups_match_first_position() {
        let votes = [7, 3, 7, 7, 1, 3, 0, 1, 7];
        let teams = votes
            .iter()
            .enumerate()
            .map(|(i, v)| team(&i.to_string(), *v))
            .collect();

        let ranked = assign_ranks(teams);
        let n = ranked.len();

        for (position, t) in ranked.iter().enumerate() {
            let first_of_group = ranked
                .iter()
                .position(|other| other.vote_count == t.vote_count)
                .unwrap();
            assert_eq!(t.rank, first_of_group + 1);
            assert!((t.rank_percentile - (t.rank - 1) as f64 / n as f64).abs() < 1e-4);
            if position > 0 {
                assert!(ranked[position - 1].vote_count >= t.vote_count);
            }
        }
    }
}
