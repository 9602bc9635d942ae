// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::Serialize;
use veil_events::{PeriodId, ProjectId};

/// `1 + the number of scores strictly greater than score`. Ties share a rank.
pub fn rank_against<I>(score: u64, others: I) -> u32
where
    I: IntoIterator<Item = u64>,
{
    let above = others.into_iter().filter(|other| *other > score).count();
    1u32.saturating_add(u32::try_from(above).unwrap_or(u32::MAX))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub project_id: ProjectId,
    pub final_score: u64,
    /// Rank against every project disclosed in the cohort so far
    pub standing: u32,
    /// Rank recorded when the project was disclosed
    pub provisional_rank: u32,
}

/// Read-only ordering of a cohort's disclosed projects
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    pub period_id: Option<PeriodId>,
    pub entries: Vec<Standing>,
}

impl Leaderboard {
    /// Entries are `(project, final score, provisional rank)` for disclosed projects
    pub fn build<I>(period_id: Option<PeriodId>, disclosed: I) -> Self
    where
        I: IntoIterator<Item = (ProjectId, u64, u32)>,
    {
        let disclosed: Vec<(ProjectId, u64, u32)> = disclosed.into_iter().collect();
        let mut entries: Vec<Standing> = disclosed
            .iter()
            .map(|(project_id, score, provisional)| Standing {
                project_id: *project_id,
                final_score: *score,
                standing: rank_against(*score, disclosed.iter().map(|(_, s, _)| *s)),
                provisional_rank: *provisional,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.final_score
                .cmp(&a.final_score)
                .then(a.project_id.cmp(&b.project_id))
        });
        Self { period_id, entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn earlier_disclosures_keep_their_rank() {
        // A=40 disclosed first, B=20 later
        assert_eq!(rank_against(40, []), 1);
        assert_eq!(rank_against(20, [40]), 2);
        // a later, better project does not touch A's stored rank, but the leaderboard shows it
        let c = rank_against(50, [40, 20]);
        assert_eq!(c, 1);

        let board = Leaderboard::build(
            Some(PeriodId::new(1)),
            [
                (ProjectId::new(1), 40, 1),
                (ProjectId::new(2), 20, 2),
                (ProjectId::new(3), 50, c),
            ],
        );
        let order: Vec<(u64, u32, u32)> = board
            .entries
            .iter()
            .map(|s| (s.project_id.value(), s.standing, s.provisional_rank))
            .collect();
        assert_eq!(order, vec![(3, 1, 1), (1, 2, 1), (2, 3, 2)]);
    }

    #[test]
    fn ties_share_rank_and_sort_by_id() {
        let board = Leaderboard::build(
            None,
            [
                (ProjectId::new(5), 30, 1),
                (ProjectId::new(2), 30, 1),
                (ProjectId::new(9), 10, 3),
            ],
        );
        let ids: Vec<u64> = board.entries.iter().map(|s| s.project_id.value()).collect();
        assert_eq!(ids, vec![2, 5, 9]);
        assert_eq!(board.entries[0].standing, board.entries[1].standing);
        assert_eq!(board.entries[2].standing, 3);
    }

    proptest! {
        #[test]
        fn rank_counts_strictly_greater_scores(score in 0u64..100, others in proptest::collection::vec(0u64..100, 0..20)) {
            let rank = rank_against(score, others.iter().copied());
            let greater = others.iter().filter(|o| **o > score).count() as u32;
            prop_assert_eq!(rank, greater + 1);
            prop_assert!(rank as usize <= others.len() + 1);
        }
    }
}
