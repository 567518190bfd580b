use chrono::Utc;
use sea_orm::{
    ActiveValue, IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Account, AccountPatch, AccountWithBalance, EngineError, NewAccount, ResultEngine,
    ValidationErrors, accounts,
    util::{check_color, check_currency, check_icon, check_name, check_non_negative_amount},
};

use super::{
    Engine,
    balances::{account_balance_of, account_balances_of},
    defaults::{clear_default_account, make_default_account, reset_default_accounts},
    with_tx,
};

impl Engine {
    /// Creates an account.
    ///
    /// A positive `initial_balance_minor` is recorded as one `initial_balance`
    /// transaction dated today, in the same database transaction. When
    /// `is_default` is set every other account of the user loses the flag;
    /// that write comes first so concurrent creations queue on the lock.
    pub async fn create_account(&self, user_id: &str, cmd: NewAccount) -> ResultEngine<Account> {
        let mut errors = ValidationErrors::new();
        let name = check_name(&mut errors, "name", &cmd.name);
        let currency = check_currency(&mut errors, &cmd.currency);
        let color = check_color(&mut errors, "color", cmd.color.as_deref());
        let icon = check_icon(&mut errors, cmd.icon.as_deref());
        check_non_negative_amount(
            &mut errors,
            "initial_balance_minor",
            cmd.initial_balance_minor,
        );
        let Some(currency) = currency.filter(|_| errors.is_empty()) else {
            return Err(EngineError::Validation(errors));
        };

        let account = Account {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name,
            kind: cmd.kind,
            currency,
            color,
            icon,
            is_active: true,
            is_default: cmd.is_default,
            created_at: Utc::now(),
        };

        with_tx!(self, |db_tx| {
            if cmd.is_default {
                reset_default_accounts(&db_tx, user_id).await?;
            }
            self.require_user(&db_tx, user_id).await?;
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            if cmd.initial_balance_minor > 0 {
                self.insert_initial_balance(&db_tx, &account, cmd.initial_balance_minor)
                    .await?;
            }
            tracing::debug!(id = %account.id, user_id, "account created");
            Ok(account)
        })
    }

    /// Return an account with its live balance.
    pub async fn account(
        &self,
        user_id: &str,
        account_id: Uuid,
    ) -> ResultEngine<AccountWithBalance> {
        let model = self
            .require_account(&self.database, user_id, account_id)
            .await?;
        let balance_minor = account_balance_of(&self.database, account_id).await?;
        Ok(AccountWithBalance {
            account: Account::try_from(model)?,
            balance_minor,
        })
    }

    /// Lists the user's accounts, default first, each with its live balance.
    pub async fn list_accounts(&self, user_id: &str) -> ResultEngine<Vec<AccountWithBalance>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::DeletedAt.is_null())
            .order_by_desc(accounts::Column::IsDefault)
            .order_by_asc(accounts::Column::Name)
            .all(&self.database)
            .await?;
        let balances = account_balances_of(&self.database, user_id).await?;

        models
            .into_iter()
            .map(|model| -> ResultEngine<AccountWithBalance> {
                let balance_minor = balances.get(&model.id).copied().unwrap_or(0);
                Ok(AccountWithBalance {
                    account: Account::try_from(model)?,
                    balance_minor,
                })
            })
            .collect()
    }

    pub async fn update_account(
        &self,
        user_id: &str,
        account_id: Uuid,
        patch: AccountPatch,
    ) -> ResultEngine<Account> {
        let mut errors = ValidationErrors::new();
        let name = patch
            .name
            .as_deref()
            .map(|value| check_name(&mut errors, "name", value));
        let color = patch
            .color
            .as_ref()
            .map(|value| check_color(&mut errors, "color", value.as_deref()));
        let icon = patch
            .icon
            .as_ref()
            .map(|value| check_icon(&mut errors, value.as_deref()));
        errors.into_result()?;
        self.require_account(&self.database, user_id, account_id)
            .await?;

        with_tx!(self, |db_tx| {
            match patch.is_default {
                Some(true) => make_default_account(&db_tx, user_id, account_id).await?,
                Some(false) => clear_default_account(&db_tx, account_id).await?,
                None => {}
            }
            let model = self.require_account(&db_tx, user_id, account_id).await?;

            let mut active = model.clone().into_active_model();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(kind) = patch.kind {
                active.kind = ActiveValue::Set(kind.as_str().to_string());
            }
            if let Some(color) = color {
                active.color = ActiveValue::Set(color);
            }
            if let Some(icon) = icon {
                active.icon = ActiveValue::Set(icon);
            }
            if let Some(is_active) = patch.is_active {
                active.is_active = ActiveValue::Set(is_active);
            }
            let model = if active.is_changed() {
                active.update(&db_tx).await?
            } else {
                model
            };
            Account::try_from(model)
        })
    }

    /// Makes `account_id` the user's only default account.
    pub async fn set_default_account(&self, user_id: &str, account_id: Uuid) -> ResultEngine<()> {
        self.require_account(&self.database, user_id, account_id)
            .await?;
        with_tx!(self, |db_tx| {
            make_default_account(&db_tx, user_id, account_id).await?;
            Ok(())
        })
    }

    /// Soft-deletes an account.
    ///
    /// Its transactions stay in the ledger; a deleted default account stops
    /// being the default.
    pub async fn delete_account(&self, user_id: &str, account_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, user_id, account_id).await?;
            let mut active = model.into_active_model();
            active.is_default = ActiveValue::Set(false);
            active.deleted_at = ActiveValue::Set(Some(Utc::now()));
            active.update(&db_tx).await?;
            tracing::debug!(id = %account_id, user_id, "account deleted");
            Ok(())
        })
    }
}
