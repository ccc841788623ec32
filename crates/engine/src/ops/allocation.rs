use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{
    EngineError, Fundable, FundableKind, ResultEngine, SweepOutcome, allocation::sweep, store,
};

use super::{Engine, with_tx};

impl Engine {
    /// Runs one allocation sweep over everything currently unsettled.
    ///
    /// All changes are committed in a single DB transaction. With nothing to
    /// match (no open request or no open contribution) the transaction is
    /// rolled back instead of committed.
    pub async fn allocate(&self) -> ResultEngine<SweepOutcome> {
        let _guard = self.allocation_lock.lock().await;
        let db_tx = self.database.begin().await?;
        let outcome = self.allocate_in(&db_tx, Utc::now()).await?;
        if outcome.is_empty() {
            db_tx.rollback().await?;
        } else {
            db_tx.commit().await?;
        }
        Ok(outcome)
    }

    /// Re-evaluates the settled state of one entity after its target changed.
    ///
    /// Returns `true` if the entity settled. A settled entity is never
    /// reopened.
    pub async fn recalculate(&self, kind: FundableKind, id: Uuid) -> ResultEngine<bool> {
        let _guard = self.allocation_lock.lock().await;
        with_tx!(self, |db_tx| self
            .recalculate_in(&db_tx, kind, id, Utc::now())
            .await)
    }

    /// Sweep body. Callers hold `allocation_lock` and own `db_tx`.
    pub(super) async fn allocate_in(
        &self,
        db_tx: &DatabaseTransaction,
        now: DateTime<Utc>,
    ) -> ResultEngine<SweepOutcome> {
        let mut requests = store::list_unsettled(db_tx, FundableKind::FundingRequest).await?;
        if requests.is_empty() {
            return Ok(SweepOutcome::default());
        }
        let mut contributions = store::list_unsettled(db_tx, FundableKind::Contribution).await?;
        if contributions.is_empty() {
            return Ok(SweepOutcome::default());
        }

        let outcome = sweep(&mut requests, &mut contributions, now);
        let touched = outcome.touched();
        let changed: Vec<&Fundable> = requests
            .iter()
            .chain(contributions.iter())
            .filter(|fundable| touched.contains(&fundable.id()))
            .collect();
        store::commit(db_tx, &changed).await?;

        tracing::info!(
            moved = outcome.moved(),
            allocations = outcome.allocations.len(),
            settled_requests = outcome.settled_requests.len(),
            settled_contributions = outcome.settled_contributions.len(),
            "allocation sweep done"
        );
        Ok(outcome)
    }

    pub(super) async fn recalculate_in(
        &self,
        db_tx: &DatabaseTransaction,
        kind: FundableKind,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<bool> {
        let mut fundable = store::find(db_tx, kind, id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("{} not exists", kind.as_str())))?;

        let settled = fundable.settle_if_funded(now);
        if settled {
            store::commit(db_tx, &[&fundable]).await?;
            tracing::info!(kind = kind.as_str(), %id, "settled after target change");
        }
        Ok(settled)
    }
}
