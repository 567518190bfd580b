use chrono::Utc;
use sea_orm::{
    ActiveValue, IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, NewPaymentMethod, PaymentMethod, PaymentMethodPatch, ResultEngine,
    ValidationErrors, payment_methods,
    util::{
        check_color, check_currency, check_cycle_day, check_last_four, check_name,
        check_non_negative_amount, model_currency,
    },
};

use super::{
    Engine,
    defaults::{
        clear_default_payment_method, make_default_payment_method, reset_default_payment_methods,
    },
    with_tx,
};

fn check_credit_limit(errors: &mut ValidationErrors, is_credit_card: bool, limit: Option<i64>) {
    if let Some(limit) = limit {
        check_non_negative_amount(errors, "credit_limit_minor", limit);
        errors.check(
            !is_credit_card,
            "credit_limit_minor",
            "only credit cards have a credit limit",
        );
    }
}

impl Engine {
    /// Creates a payment method.
    ///
    /// Every kind except `credit_card` must be linked to one of the user's
    /// accounts. A credit card never keeps a linked account. The currency
    /// defaults to the linked account's.
    pub async fn create_payment_method(
        &self,
        user_id: &str,
        cmd: NewPaymentMethod,
    ) -> ResultEngine<PaymentMethod> {
        let mut errors = ValidationErrors::new();
        let is_credit_card = cmd.kind.is_credit_card();
        let name = check_name(&mut errors, "name", &cmd.name);
        let color = check_color(&mut errors, "color", cmd.color.as_deref());
        let last_four = check_last_four(&mut errors, cmd.last_four.as_deref());
        check_cycle_day(&mut errors, "billing_day", cmd.billing_day);
        check_cycle_day(&mut errors, "due_day", cmd.due_day);
        check_credit_limit(&mut errors, is_credit_card, cmd.credit_limit_minor);
        let currency = cmd
            .currency
            .as_deref()
            .and_then(|code| check_currency(&mut errors, code));
        let linked_account_id = cmd.linked_account_id.filter(|_| !is_credit_card);

        with_tx!(self, |db_tx| {
            if cmd.is_default {
                reset_default_payment_methods(&db_tx, user_id).await?;
            }
            self.require_user(&db_tx, user_id).await?;
            let linked = match linked_account_id {
                Some(account_id) => {
                    let found = self
                        .find_owned_account(&db_tx, user_id, account_id)
                        .await?;
                    errors.check(found.is_none(), "linked_account_id", "does not exist");
                    found
                }
                None => {
                    errors.check(
                        cmd.kind.requires_linked_account(),
                        "linked_account_id",
                        "is required for this kind",
                    );
                    None
                }
            };
            let currency = match (currency, &linked) {
                (Some(currency), _) => Some(currency),
                (None, Some(account)) => Some(model_currency(&account.currency)?),
                (None, None) => {
                    errors.check(
                        cmd.currency.is_none() && is_credit_card,
                        "currency",
                        "is required without a linked account",
                    );
                    None
                }
            };
            let Some(currency) = currency.filter(|_| errors.is_empty()) else {
                return Err(EngineError::Validation(errors));
            };

            let method = PaymentMethod {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                name,
                kind: cmd.kind,
                linked_account_id,
                currency,
                credit_limit_minor: cmd.credit_limit_minor,
                billing_day: cmd.billing_day,
                due_day: cmd.due_day,
                last_four,
                color,
                is_active: true,
                is_default: cmd.is_default,
                created_at: Utc::now(),
            };
            payment_methods::ActiveModel::from(&method)
                .insert(&db_tx)
                .await?;
            tracing::debug!(id = %method.id, kind = method.kind.as_str(), "payment method created");
            Ok(method)
        })
    }

    /// Return a payment method.
    pub async fn payment_method(
        &self,
        user_id: &str,
        payment_method_id: Uuid,
    ) -> ResultEngine<PaymentMethod> {
        let model = self
            .require_payment_method(&self.database, user_id, payment_method_id)
            .await?;
        PaymentMethod::try_from(model)
    }

    /// Lists the user's payment methods, default first.
    pub async fn list_payment_methods(&self, user_id: &str) -> ResultEngine<Vec<PaymentMethod>> {
        payment_methods::Entity::find()
            .filter(payment_methods::Column::UserId.eq(user_id))
            .filter(payment_methods::Column::DeletedAt.is_null())
            .order_by_desc(payment_methods::Column::IsDefault)
            .order_by_asc(payment_methods::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(PaymentMethod::try_from)
            .collect()
    }

    pub async fn update_payment_method(
        &self,
        user_id: &str,
        payment_method_id: Uuid,
        patch: PaymentMethodPatch,
    ) -> ResultEngine<PaymentMethod> {
        let mut errors = ValidationErrors::new();
        let name = patch
            .name
            .as_deref()
            .map(|value| check_name(&mut errors, "name", value));
        let color = patch
            .color
            .as_ref()
            .map(|value| check_color(&mut errors, "color", value.as_deref()));
        let last_four = patch
            .last_four
            .as_ref()
            .map(|value| check_last_four(&mut errors, value.as_deref()));
        if let Some(day) = patch.billing_day {
            check_cycle_day(&mut errors, "billing_day", day);
        }
        if let Some(day) = patch.due_day {
            check_cycle_day(&mut errors, "due_day", day);
        }

        let current = self
            .require_payment_method(&self.database, user_id, payment_method_id)
            .await?;
        let is_credit_card = current.is_credit_card();
        if let Some(limit) = patch.credit_limit_minor {
            check_credit_limit(&mut errors, is_credit_card, limit);
        }

        with_tx!(self, |db_tx| {
            match patch.is_default {
                Some(true) => {
                    make_default_payment_method(&db_tx, user_id, payment_method_id).await?
                }
                Some(false) => clear_default_payment_method(&db_tx, payment_method_id).await?,
                None => {}
            }
            let model = self
                .require_payment_method(&db_tx, user_id, payment_method_id)
                .await?;

            let mut active = model.clone().into_active_model();
            match patch.linked_account_id {
                Some(_) if is_credit_card => {
                    errors.add("linked_account_id", "credit cards have no linked account");
                }
                Some(Some(account_id)) => {
                    let found = self
                        .find_owned_account(&db_tx, user_id, account_id)
                        .await?;
                    errors.check(found.is_none(), "linked_account_id", "does not exist");
                    active.linked_account_id = ActiveValue::Set(Some(account_id));
                }
                Some(None) => errors.add("linked_account_id", "is required for this kind"),
                None => {}
            }
            errors.into_result()?;

            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(color) = color {
                active.color = ActiveValue::Set(color);
            }
            if let Some(last_four) = last_four {
                active.last_four = ActiveValue::Set(last_four);
            }
            if let Some(day) = patch.billing_day {
                active.billing_day = ActiveValue::Set(day);
            }
            if let Some(day) = patch.due_day {
                active.due_day = ActiveValue::Set(day);
            }
            if let Some(limit) = patch.credit_limit_minor {
                active.credit_limit_minor = ActiveValue::Set(limit);
            }
            if let Some(is_active) = patch.is_active {
                active.is_active = ActiveValue::Set(is_active);
            }
            let model = if active.is_changed() {
                active.update(&db_tx).await?
            } else {
                model
            };
            PaymentMethod::try_from(model)
        })
    }

    /// Makes `payment_method_id` the user's only default payment method.
    pub async fn set_default_payment_method(
        &self,
        user_id: &str,
        payment_method_id: Uuid,
    ) -> ResultEngine<()> {
        self.require_payment_method(&self.database, user_id, payment_method_id)
            .await?;
        with_tx!(self, |db_tx| {
            make_default_payment_method(&db_tx, user_id, payment_method_id).await?;
            Ok(())
        })
    }

    /// Soft-deletes a payment method. Its transactions stay in the ledger.
    pub async fn delete_payment_method(
        &self,
        user_id: &str,
        payment_method_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_payment_method(&db_tx, user_id, payment_method_id)
                .await?;
            let mut active = model.into_active_model();
            active.is_default = ActiveValue::Set(false);
            active.deleted_at = ActiveValue::Set(Some(Utc::now()));
            active.update(&db_tx).await?;
            tracing::debug!(id = %payment_method_id, "payment method deleted");
            Ok(())
        })
    }
}
