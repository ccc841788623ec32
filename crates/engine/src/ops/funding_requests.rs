use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, FundableKind, FundingRequest, FundingRequestUpdateCmd, NewFundingRequestCmd,
    ResultEngine, funding_requests, store,
    util::{
        normalize_name_display, normalize_name_key, normalize_required_text,
        validate_positive_amount,
    },
};

use super::{Engine, with_tx};

impl Engine {
    /// Create a funding request and spend waiting contributions on it.
    ///
    /// The insert and the sweep share one DB transaction: a failing sweep
    /// leaves no half-created request behind.
    pub async fn create_funding_request(
        &self,
        cmd: NewFundingRequestCmd,
    ) -> ResultEngine<FundingRequest> {
        let name = normalize_name_display(&cmd.name)?;
        let name_norm = normalize_name_key(&name)?;
        let description = normalize_required_text(&cmd.description, "description")?;
        validate_positive_amount(cmd.target_amount, "target_amount")?;

        let _guard = self.allocation_lock.lock().await;
        with_tx!(self, |db_tx| {
            self.require_superuser(&db_tx, &cmd.user_id).await?;
            self.require_unique_name(&db_tx, &name_norm, &name, None)
                .await?;
            // The UUIDv7 id is minted under the lock so id order follows
            // insertion order.
            let request =
                FundingRequest::new(name, description, cmd.target_amount, cmd.created_at)?;
            let request_id = request.fundable.id();
            let model: funding_requests::ActiveModel = (&request).try_into()?;
            model.insert(&db_tx).await?;
            tracing::info!(id = %request_id, name = %request.name, "funding request created");

            self.allocate_in(&db_tx, Utc::now()).await?;
            self.require_funding_request(&db_tx, request_id).await
        })
    }

    /// All funding requests, oldest first.
    pub async fn funding_requests(&self) -> ResultEngine<Vec<FundingRequest>> {
        let models = funding_requests::Entity::find()
            .order_by_asc(funding_requests::Column::CreatedAt)
            .order_by_asc(funding_requests::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(FundingRequest::try_from).collect()
    }

    pub async fn funding_request(&self, request_id: Uuid) -> ResultEngine<FundingRequest> {
        with_tx!(self, |db_tx| self
            .require_funding_request(&db_tx, request_id)
            .await)
    }

    /// Edit name, description or target of an open funding request.
    ///
    /// Lowering the target down to the allocated amount settles the request in
    /// the same DB transaction. The target can never go below what was
    /// already allocated.
    pub async fn update_funding_request(
        &self,
        cmd: FundingRequestUpdateCmd,
    ) -> ResultEngine<FundingRequest> {
        let name = cmd
            .name
            .as_deref()
            .map(|name| -> ResultEngine<(String, String)> {
                let display = normalize_name_display(name)?;
                let key = normalize_name_key(&display)?;
                Ok((display, key))
            })
            .transpose()?;
        let description = cmd
            .description
            .as_deref()
            .map(|d| normalize_required_text(d, "description"))
            .transpose()?;
        if let Some(target_amount) = cmd.target_amount {
            validate_positive_amount(target_amount, "target_amount")?;
        }

        let _guard = self.allocation_lock.lock().await;
        with_tx!(self, |db_tx| {
            self.require_superuser(&db_tx, &cmd.user_id).await?;
            let current = self
                .require_funding_request(&db_tx, cmd.request_id)
                .await?;
            if current.fundable.is_settled() {
                return Err(EngineError::FundingLocked(
                    "funding request is closed".to_string(),
                ));
            }
            if cmd.is_empty() {
                return Ok(current);
            }

            if let Some(target_amount) = cmd.target_amount {
                let allocated = current.fundable.allocated_amount();
                if target_amount < allocated {
                    return Err(EngineError::InvalidAmount(format!(
                        "target_amount must not be below allocated_amount ({allocated})"
                    )));
                }
                let mut fundable = current.fundable.clone();
                fundable.set_target_amount(target_amount);
                store::commit(&db_tx, &[&fundable]).await?;
            }

            if name.is_some() || description.is_some() {
                let mut model = funding_requests::ActiveModel {
                    id: ActiveValue::Set(cmd.request_id.to_string()),
                    ..Default::default()
                };
                if let Some((display, key)) = name {
                    self.require_unique_name(&db_tx, &key, &display, Some(cmd.request_id))
                        .await?;
                    model.name = ActiveValue::Set(display);
                    model.name_norm = ActiveValue::Set(key);
                }
                if let Some(description) = description {
                    model.description = ActiveValue::Set(description);
                }
                model.update(&db_tx).await?;
            }

            if cmd.target_amount.is_some() {
                self.recalculate_in(
                    &db_tx,
                    FundableKind::FundingRequest,
                    cmd.request_id,
                    Utc::now(),
                )
                .await?;
            }
            self.require_funding_request(&db_tx, cmd.request_id).await
        })
    }

    /// Remove a funding request that never received money.
    pub async fn delete_funding_request(
        &self,
        request_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<FundingRequest> {
        let _guard = self.allocation_lock.lock().await;
        with_tx!(self, |db_tx| {
            self.require_superuser(&db_tx, user_id).await?;
            let request = self.require_funding_request(&db_tx, request_id).await?;
            if request.fundable.is_settled() || request.fundable.allocated_amount() > 0 {
                return Err(EngineError::FundingLocked(
                    "funding request already received money".to_string(),
                ));
            }
            funding_requests::Entity::delete_by_id(request_id.to_string())
                .exec(&db_tx)
                .await?;
            tracing::info!(id = %request_id, "funding request deleted");
            Ok(request)
        })
    }

    async fn require_funding_request(
        &self,
        db: &DatabaseTransaction,
        request_id: Uuid,
    ) -> ResultEngine<FundingRequest> {
        funding_requests::Entity::find_by_id(request_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("funding request not exists".to_string()))
            .and_then(FundingRequest::try_from)
    }

    async fn require_unique_name(
        &self,
        db: &DatabaseTransaction,
        name_norm: &str,
        name: &str,
        exclude: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = funding_requests::Entity::find()
            .filter(funding_requests::Column::NameNorm.eq(name_norm.to_string()));
        if let Some(id) = exclude {
            query = query.filter(funding_requests::Column::Id.ne(id.to_string()));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }
}
