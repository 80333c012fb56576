use super::round_to;
use crate::models::TeamRecord;

/// Fill in each team's deficit to the leader.
///
/// Expects the rank-sorted output of `assign_ranks`; the leader is the first
/// element, so among co-leaders the earliest in stable order wins.
pub fn annotate_differentials(mut teams: Vec<TeamRecord>) -> Vec<TeamRecord> {
    let (leader_votes, leader_percentage) = match teams.first() {
        Some(leader) => (leader.vote_count, leader.current_vote_percentage),
        None => return teams,
    };

    for team in teams.iter_mut() {
        team.votes_behind_leader = leader_votes - team.vote_count;
        team.percentage_behind_leader =
            round_to(leader_percentage - team.current_vote_percentage, 2);
    }

    teams
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ranking::assign_ranks;
    use serde_json::Value;

    fn team(votes: i64, percentage: f64) -> TeamRecord {
        TeamRecord {
            team_id: Value::Null,
            team_identifier: None,
            american_odds: None,
            current_vote_percentage: percentage,
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

    #[test]
    fn test_deficits() {
        let teams = annotate_differentials(assign_ranks(vec![
            team(20, 16.67),
            team(60, 50.0),
            team(40, 33.33),
        ]));

        let votes: Vec<i64> = teams.iter().map(|t| t.votes_behind_leader).collect();
        let pct: Vec<f64> = teams.iter().map(|t| t.percentage_behind_leader).collect();
        assert_eq!(votes, vec![0, 20, 40]);
        assert_eq!(pct, vec![0.0, 16.67, 33.33]);
    }

    #[test]
    fn test_co_leaders_are_zero_behind() {
        let teams = annotate_differentials(assign_ranks(vec![team(10, 50.0), team(10, 50.0)]));

        assert!(teams.iter().all(|t| t.rank == 1));
        assert!(teams.iter().all(|t| t.votes_behind_leader == 0));
        assert!(teams.iter().all(|t| t.percentage_behind_leader == 0.0));
    }

    #[test]
    fn test_empty_is_untouched() {
        assert!(annotate_differentials(Vec::new()).is_empty());
    }
}
