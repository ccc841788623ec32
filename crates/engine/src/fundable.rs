//! The funding capability shared by funding requests and contributions.
//!
//! A funding request needs money, a contribution supplies it. For the
//! allocation sweep the two are the same thing: an amount to reach
//! (`target_amount`), how much of it has been matched so far
//! (`allocated_amount`) and whether the two are equal (`is_settled`).
//!
//! The fields are private so the invariants below can only be changed
//! through [`Fundable::absorb`], [`Fundable::settle`] and
//! [`Fundable::settle_if_funded`]:
//!
//! - `0 <= allocated_amount <= target_amount`
//! - `is_settled == (allocated_amount == target_amount)`
//! - `settled_at.is_some() == is_settled`
//! - `target_amount > 0`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Which side of the reconciliation an entity sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundableKind {
    FundingRequest,
    Contribution,
}

impl FundableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FundingRequest => "funding_request",
            Self::Contribution => "contribution",
        }
    }
}

/// A broken [`Fundable`] invariant.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{0}: target_amount must be > 0")]
    NonPositiveTarget(Uuid),
    #[error("{id}: allocated_amount {allocated} outside 0..={target}")]
    AllocationOutOfRange { id: Uuid, allocated: i64, target: i64 },
    #[error("{0}: is_settled disagrees with allocated_amount")]
    SettledFlag(Uuid),
    #[error("{0}: settled_at disagrees with is_settled")]
    SettledAt(Uuid),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFundable")]
pub struct Fundable {
    id: Uuid,
    kind: FundableKind,
    target_amount: i64,
    allocated_amount: i64,
    is_settled: bool,
    created_at: DateTime<Utc>,
    settled_at: Option<DateTime<Utc>>,
}

/// Wire shape of [`Fundable`]. Deserialized values go through
/// [`Fundable::check_invariants`] before they are handed out.
#[derive(Deserialize)]
struct RawFundable {
    id: Uuid,
    kind: FundableKind,
    target_amount: i64,
    allocated_amount: i64,
    is_settled: bool,
    created_at: DateTime<Utc>,
    settled_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawFundable> for Fundable {
    type Error = InvariantViolation;

    fn try_from(raw: RawFundable) -> Result<Self, Self::Error> {
        let fundable = Self::from_parts(
            raw.id,
            raw.kind,
            raw.target_amount,
            raw.allocated_amount,
            raw.is_settled,
            raw.created_at,
            raw.settled_at,
        );
        fundable.check_invariants()?;
        Ok(fundable)
    }
}

impl Fundable {
    /// Creates an untouched entity.
    ///
    /// Ids are UUIDv7, so ordering by `(created_at, id)` falls back to
    /// insertion order when two entities share a timestamp.
    pub fn new(
        kind: FundableKind,
        target_amount: i64,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if target_amount <= 0 {
            return Err(EngineError::InvalidAmount(
                "target_amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::now_v7(),
            kind,
            target_amount,
            allocated_amount: 0,
            is_settled: false,
            created_at,
            settled_at: None,
        })
    }

    /// Rebuilds an entity from persisted state. No validation happens here:
    /// rows are written only by this crate.
    pub(crate) fn from_parts(
        id: Uuid,
        kind: FundableKind,
        target_amount: i64,
        allocated_amount: i64,
        is_settled: bool,
        created_at: DateTime<Utc>,
        settled_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            kind,
            target_amount,
            allocated_amount,
            is_settled,
            created_at,
            settled_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> FundableKind {
        self.kind
    }

    pub fn target_amount(&self) -> i64 {
        self.target_amount
    }

    pub fn allocated_amount(&self) -> i64 {
        self.allocated_amount
    }

    pub fn is_settled(&self) -> bool {
        self.is_settled
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        self.settled_at
    }

    /// Amount still missing (requests) or still unspent (contributions).
    pub fn remaining(&self) -> i64 {
        self.target_amount - self.allocated_amount
    }

    /// Moves `amount` into `allocated_amount` without reaching the target.
    pub(crate) fn absorb(&mut self, amount: i64) {
        debug_assert!(amount > 0 && amount < self.remaining());
        self.allocated_amount += amount;
    }

    /// Fills the entity up to its target and closes it.
    ///
    /// `settled_at` is stamped only the first time.
    pub(crate) fn settle(&mut self, now: DateTime<Utc>) {
        self.allocated_amount = self.target_amount;
        self.is_settled = true;
        if self.settled_at.is_none() {
            self.settled_at = Some(now);
        }
    }

    /// Settles the entity if its allocation already covers the target.
    ///
    /// Returns `true` only on the unsettled -> settled transition. An entity
    /// is never un-settled here.
    pub fn settle_if_funded(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_settled || self.allocated_amount != self.target_amount {
            return false;
        }
        self.settle(now);
        true
    }

    /// Replaces the target. Callers validate `target_amount >= allocated_amount`
    /// beforehand.
    pub(crate) fn set_target_amount(&mut self, target_amount: i64) {
        debug_assert!(target_amount > 0 && target_amount >= self.allocated_amount);
        self.target_amount = target_amount;
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.target_amount <= 0 {
            return Err(InvariantViolation::NonPositiveTarget(self.id));
        }
        if self.allocated_amount < 0 || self.allocated_amount > self.target_amount {
            return Err(InvariantViolation::AllocationOutOfRange {
                id: self.id,
                allocated: self.allocated_amount,
                target: self.target_amount,
            });
        }
        if self.is_settled != (self.allocated_amount == self.target_amount) {
            return Err(InvariantViolation::SettledFlag(self.id));
        }
        if self.settled_at.is_some() != self.is_settled {
            return Err(InvariantViolation::SettledAt(self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn new_starts_untouched() {
        let fundable = Fundable::new(FundableKind::FundingRequest, 100, at(0)).unwrap();

        assert_eq!(fundable.allocated_amount(), 0);
        assert_eq!(fundable.remaining(), 100);
        assert!(!fundable.is_settled());
        assert_eq!(fundable.settled_at(), None);
        assert_eq!(fundable.check_invariants(), Ok(()));
    }

    #[test]
    fn new_rejects_non_positive_target() {
        let err = Fundable::new(FundableKind::Contribution, 0, at(0)).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("target_amount must be > 0".to_string())
        );
        assert!(Fundable::new(FundableKind::Contribution, -5, at(0)).is_err());
    }

    #[test]
    fn ids_follow_creation_order() {
        let first = Fundable::new(FundableKind::Contribution, 1, at(0)).unwrap();
        let second = Fundable::new(FundableKind::Contribution, 1, at(0)).unwrap();

        assert!(first.id() < second.id());
        assert!(first.id().to_string() < second.id().to_string());
    }

    #[test]
    fn absorb_keeps_entity_open() {
        let mut fundable = Fundable::new(FundableKind::FundingRequest, 100, at(0)).unwrap();
        fundable.absorb(40);

        assert_eq!(fundable.allocated_amount(), 40);
        assert_eq!(fundable.remaining(), 60);
        assert!(!fundable.is_settled());
        assert_eq!(fundable.check_invariants(), Ok(()));
    }

    #[test]
    fn settle_stamps_once() {
        let mut fundable = Fundable::new(FundableKind::Contribution, 100, at(0)).unwrap();
        fundable.settle(at(10));
        fundable.settle(at(20));

        assert_eq!(fundable.allocated_amount(), 100);
        assert!(fundable.is_settled());
        assert_eq!(fundable.settled_at(), Some(at(10)));
        assert_eq!(fundable.check_invariants(), Ok(()));
    }

    #[test]
    fn settle_if_funded_after_target_shrinks() {
        let mut fundable = Fundable::new(FundableKind::FundingRequest, 80, at(0)).unwrap();
        fundable.absorb(60);
        fundable.set_target_amount(60);

        let now = at(0) + Duration::minutes(5);
        assert!(fundable.settle_if_funded(now));
        assert!(fundable.is_settled());
        assert_eq!(fundable.settled_at(), Some(now));
        assert_eq!(fundable.check_invariants(), Ok(()));
    }

    #[test]
    fn settle_if_funded_leaves_open_entity_alone() {
        let mut fundable = Fundable::new(FundableKind::FundingRequest, 80, at(0)).unwrap();
        fundable.absorb(60);
        fundable.set_target_amount(120);

        assert!(!fundable.settle_if_funded(at(1)));
        assert!(!fundable.is_settled());
        assert_eq!(fundable.settled_at(), None);
        assert_eq!(fundable.allocated_amount(), 60);
    }

    #[test]
    fn settle_if_funded_is_not_repeated() {
        let mut fundable = Fundable::new(FundableKind::FundingRequest, 50, at(0)).unwrap();
        fundable.settle(at(1));

        assert!(!fundable.settle_if_funded(at(2)));
        assert_eq!(fundable.settled_at(), Some(at(1)));
    }

    #[test]
    fn check_invariants_reports_mismatches() {
        let id = Uuid::now_v7();
        let over = Fundable::from_parts(
            id,
            FundableKind::Contribution,
            10,
            11,
            false,
            at(0),
            None,
        );
        assert_eq!(
            over.check_invariants(),
            Err(InvariantViolation::AllocationOutOfRange {
                id,
                allocated: 11,
                target: 10
            })
        );

        let flag = Fundable::from_parts(id, FundableKind::Contribution, 10, 10, false, at(0), None);
        assert_eq!(
            flag.check_invariants(),
            Err(InvariantViolation::SettledFlag(id))
        );

        let stamp = Fundable::from_parts(id, FundableKind::Contribution, 10, 10, true, at(0), None);
        assert_eq!(stamp.check_invariants(), Err(InvariantViolation::SettledAt(id)));
    }

    #[test]
    fn deserialize_accepts_consistent_state() {
        let id = Uuid::now_v7();
        let json = serde_json::json!({
            "id": id,
            "kind": "funding_request",
            "target_amount": 100,
            "allocated_amount": 100,
            "is_settled": true,
            "created_at": "2026-01-01T12:00:00Z",
            "settled_at": "2026-01-01T12:05:00Z",
        });

        let fundable: Fundable = serde_json::from_value(json).unwrap();
        assert_eq!(fundable.id(), id);
        assert_eq!(fundable.kind(), FundableKind::FundingRequest);
        assert!(fundable.is_settled());
        assert_eq!(fundable.remaining(), 0);
    }

    #[test]
    fn deserialize_rejects_broken_invariants() {
        let over = serde_json::json!({
            "id": Uuid::now_v7(),
            "kind": "contribution",
            "target_amount": 10,
            "allocated_amount": 11,
            "is_settled": false,
            "created_at": "2026-01-01T12:00:00Z",
            "settled_at": null,
        });
        let err = serde_json::from_value::<Fundable>(over).unwrap_err();
        assert!(err.to_string().contains("allocated_amount 11 outside 0..=10"));

        let unstamped = serde_json::json!({
            "id": Uuid::now_v7(),
            "kind": "contribution",
            "target_amount": 10,
            "allocated_amount": 10,
            "is_settled": true,
            "created_at": "2026-01-01T12:00:00Z",
            "settled_at": null,
        });
        assert!(serde_json::from_value::<Fundable>(unstamped).is_err());
    }
}
