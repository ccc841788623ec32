//! The allocation sweep.
//!
//! Matches unsettled funding requests against unsettled contributions,
//! oldest first on both sides. Two cursors walk the lists; on every step the
//! current contribution's unspent amount (`supply`) is compared with the
//! current request's missing amount (`need`):
//!
//! - `supply > need`: the request settles, the contribution keeps the
//!   leftover for the next request of the same sweep;
//! - `supply == need`: both settle;
//! - `supply < need`: the contribution settles, the request stays open with
//!   a smaller gap.
//!
//! The sweep stops as soon as one list is exhausted. It runs in
//! `O(N + M)` and only mutates the slices it is given: persisting the result
//! is the caller's job (see [`crate::store`]).

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Fundable;

/// Money moved from one contribution to one funding request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub request_id: Uuid,
    pub contribution_id: Uuid,
    pub amount: i64,
}

/// What a sweep did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepOutcome {
    /// Matches in the order they were made.
    pub allocations: Vec<Allocation>,
    /// Requests that reached their target during the sweep.
    pub settled_requests: Vec<Uuid>,
    /// Contributions fully spent during the sweep.
    pub settled_contributions: Vec<Uuid>,
}

impl SweepOutcome {
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Total amount moved from contributions to requests.
    pub fn moved(&self) -> i64 {
        self.allocations.iter().map(|a| a.amount).sum()
    }

    /// Ids of every entity whose state changed.
    pub fn touched(&self) -> BTreeSet<Uuid> {
        self.allocations
            .iter()
            .flat_map(|a| [a.request_id, a.contribution_id])
            .collect()
    }
}

/// Runs the sweep over entities already ordered by `(created_at, id)`.
///
/// Both slices must hold unsettled entities only. `now` is stamped as
/// `settled_at` on everything that settles.
pub fn sweep(
    requests: &mut [Fundable],
    contributions: &mut [Fundable],
    now: DateTime<Utc>,
) -> SweepOutcome {
    let mut outcome = SweepOutcome::default();
    let (mut request_idx, mut contribution_idx) = (0, 0);

    while request_idx < requests.len() && contribution_idx < contributions.len() {
        let request = &mut requests[request_idx];
        let contribution = &mut contributions[contribution_idx];
        let need = request.remaining();
        let supply = contribution.remaining();

        let amount = if supply > need {
            contribution.absorb(need);
            request.settle(now);
            outcome.settled_requests.push(request.id());
            request_idx += 1;
            need
        } else if supply == need {
            request.settle(now);
            contribution.settle(now);
            outcome.settled_requests.push(request.id());
            outcome.settled_contributions.push(contribution.id());
            request_idx += 1;
            contribution_idx += 1;
            need
        } else {
            request.absorb(supply);
            contribution.settle(now);
            outcome.settled_contributions.push(contribution.id());
            contribution_idx += 1;
            supply
        };

        tracing::debug!(
            request = %request.id(),
            contribution = %contribution.id(),
            amount,
            "allocated"
        );
        outcome.allocations.push(Allocation {
            request_id: request.id(),
            contribution_id: contribution.id(),
            amount,
        });
    }

    outcome
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::FundableKind;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn requests(targets: &[i64]) -> Vec<Fundable> {
        targets
            .iter()
            .enumerate()
            .map(|(i, t)| Fundable::new(FundableKind::FundingRequest, *t, at(i as i64)).unwrap())
            .collect()
    }

    fn contributions(targets: &[i64]) -> Vec<Fundable> {
        targets
            .iter()
            .enumerate()
            .map(|(i, t)| Fundable::new(FundableKind::Contribution, *t, at(i as i64)).unwrap())
            .collect()
    }

    fn assert_all_valid(entities: &[Fundable]) {
        for entity in entities {
            assert_eq!(entity.check_invariants(), Ok(()), "{entity:?}");
        }
    }

    #[test]
    fn older_request_is_served_first() {
        let mut reqs = requests(&[100, 50]);
        let mut contribs = contributions(&[120]);
        let now = at(1_000);

        let outcome = sweep(&mut reqs, &mut contribs, now);

        assert_eq!(reqs[0].allocated_amount(), 100);
        assert!(reqs[0].is_settled());
        assert_eq!(reqs[0].settled_at(), Some(now));
        assert_eq!(reqs[1].allocated_amount(), 20);
        assert!(!reqs[1].is_settled());
        assert_eq!(reqs[1].settled_at(), None);
        assert_eq!(contribs[0].allocated_amount(), 120);
        assert!(contribs[0].is_settled());
        assert_eq!(outcome.moved(), 120);
        assert_eq!(outcome.allocations.len(), 2);
        assert_all_valid(&reqs);
        assert_all_valid(&contribs);
    }

    #[test]
    fn exact_match_settles_both() {
        let mut reqs = requests(&[100]);
        let mut contribs = contributions(&[100]);
        let now = at(5);

        let outcome = sweep(&mut reqs, &mut contribs, now);

        assert_eq!(reqs[0].allocated_amount(), 100);
        assert_eq!(contribs[0].allocated_amount(), 100);
        assert_eq!(reqs[0].settled_at(), Some(now));
        assert_eq!(contribs[0].settled_at(), Some(now));
        assert_eq!(outcome.settled_requests, vec![reqs[0].id()]);
        assert_eq!(outcome.settled_contributions, vec![contribs[0].id()]);
    }

    #[test]
    fn small_contribution_leaves_request_open() {
        let mut reqs = requests(&[100]);
        let mut contribs = contributions(&[40]);

        sweep(&mut reqs, &mut contribs, at(1));

        assert!(contribs[0].is_settled());
        assert_eq!(contribs[0].allocated_amount(), 40);
        assert!(!reqs[0].is_settled());
        assert_eq!(reqs[0].allocated_amount(), 40);
        assert_eq!(reqs[0].remaining(), 60);
    }

    #[test]
    fn leftover_rolls_to_next_request_in_same_sweep() {
        let mut reqs = requests(&[30, 30, 30]);
        let mut contribs = contributions(&[70]);

        let outcome = sweep(&mut reqs, &mut contribs, at(1));

        assert!(reqs[0].is_settled());
        assert!(reqs[1].is_settled());
        assert_eq!(reqs[2].allocated_amount(), 10);
        assert!(contribs[0].is_settled());
        assert_eq!(
            outcome
                .allocations
                .iter()
                .map(|a| a.amount)
                .collect::<Vec<_>>(),
            vec![30, 30, 10]
        );
    }

    #[test]
    fn many_contributions_fill_one_request() {
        let mut reqs = requests(&[100]);
        let mut contribs = contributions(&[10, 20, 30, 50]);

        let outcome = sweep(&mut reqs, &mut contribs, at(1));

        assert!(reqs[0].is_settled());
        assert!(contribs[..3].iter().all(Fundable::is_settled));
        assert_eq!(contribs[3].allocated_amount(), 40);
        assert!(!contribs[3].is_settled());
        assert_eq!(outcome.settled_contributions.len(), 3);
        assert_eq!(outcome.touched().len(), 5);
        assert_all_valid(&contribs);
    }

    #[test]
    fn empty_side_is_a_no_op() {
        let mut reqs = requests(&[10, 20]);
        let before = reqs.clone();

        let outcome = sweep(&mut reqs, &mut [], at(1));
        assert!(outcome.is_empty());
        assert_eq!(reqs, before);

        let mut contribs = contributions(&[10]);
        let before = contribs.clone();
        let outcome = sweep(&mut [], &mut contribs, at(1));
        assert!(outcome.is_empty());
        assert_eq!(contribs, before);
    }

    #[test]
    fn partially_filled_entities_resume() {
        let mut reqs = requests(&[100]);
        reqs[0].absorb(70);
        let mut contribs = contributions(&[50]);
        contribs[0].absorb(10);

        let outcome = sweep(&mut reqs, &mut contribs, at(1));

        assert_eq!(outcome.moved(), 30);
        assert!(reqs[0].is_settled());
        assert_eq!(contribs[0].allocated_amount(), 40);
        assert_eq!(contribs[0].remaining(), 10);
    }

    #[test]
    fn second_sweep_without_new_supply_changes_nothing() {
        let mut reqs = requests(&[100, 80]);
        let mut contribs = contributions(&[150]);
        sweep(&mut reqs, &mut contribs, at(1));

        let mut open_reqs: Vec<Fundable> =
            reqs.iter().filter(|r| !r.is_settled()).cloned().collect();
        let mut open_contribs: Vec<Fundable> =
            contribs.iter().filter(|c| !c.is_settled()).cloned().collect();
        let before = open_reqs.clone();

        let outcome = sweep(&mut open_reqs, &mut open_contribs, at(2));

        assert!(outcome.is_empty());
        assert!(open_contribs.is_empty());
        assert_eq!(open_reqs, before);
    }

    #[test]
    fn money_is_conserved() {
        let mut reqs = requests(&[17, 3, 250, 40, 1, 99]);
        let mut contribs = contributions(&[5, 60, 60, 7, 200, 11, 2]);
        let req_before: i64 = reqs.iter().map(Fundable::allocated_amount).sum();
        let contrib_before: i64 = contribs.iter().map(Fundable::allocated_amount).sum();

        let outcome = sweep(&mut reqs, &mut contribs, at(1));

        let req_gain = reqs.iter().map(Fundable::allocated_amount).sum::<i64>() - req_before;
        let contrib_spent =
            contribs.iter().map(Fundable::allocated_amount).sum::<i64>() - contrib_before;
        assert_eq!(req_gain, contrib_spent);
        assert_eq!(req_gain, outcome.moved());
        // Only one list can end with open entities.
        assert!(
            reqs.iter().all(Fundable::is_settled) || contribs.iter().all(Fundable::is_settled)
        );
        assert_all_valid(&reqs);
        assert_all_valid(&contribs);
    }

    #[test]
    fn loop_is_bounded_by_both_lists() {
        let mut reqs = requests(&[1; 8]);
        let mut contribs = contributions(&[1; 5]);

        let outcome = sweep(&mut reqs, &mut contribs, at(1));

        assert!(outcome.allocations.len() <= reqs.len() + contribs.len());
        assert_eq!(outcome.settled_requests.len(), 5);
        assert!(reqs[5..].iter().all(|r| r.allocated_amount() == 0));
    }
}
