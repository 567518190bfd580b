use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, IntoActiveModel, QueryFilter,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Account, CategoryKind, Currency, EngineError, NewTransaction, ResultEngine, SettlementCmd,
    Transaction, TransactionKind, TransactionPatch, TransferCmd, ValidationErrors,
    categories::{self, INITIAL_BALANCE_CATEGORY, SETTLEMENT_CATEGORY, TRANSFER_CATEGORY},
    payment_methods, transactions,
    util::{
        check_currency, check_description, check_positive_amount, model_currency,
        normalize_optional_text,
    },
};

use super::super::{Engine, with_tx};

/// Ids a transaction points at, as submitted.
#[derive(Clone, Copy, Debug)]
struct Refs {
    account_id: Option<Uuid>,
    payment_method_id: Option<Uuid>,
    category_id: Option<Uuid>,
}

/// References after ownership checks and account resolution.
struct Resolved {
    account_id: Option<Uuid>,
    payment_method_id: Option<Uuid>,
    category_id: Option<Uuid>,
    /// Currency of the account, else of the payment method.
    currency: Option<Currency>,
}

fn check_category_kind(
    errors: &mut ValidationErrors,
    kind: TransactionKind,
    category: &categories::Model,
) {
    let expected = match kind {
        TransactionKind::Expense => CategoryKind::Expense,
        TransactionKind::Income => CategoryKind::Income,
        _ => return,
    };
    let stored = category.kind.as_str();
    if stored != expected.as_str() && stored != CategoryKind::System.as_str() {
        errors.add(
            "category_id",
            format!("must be an {} category", expected.as_str()),
        );
    }
}

impl Engine {
    /// Checks every reference of a transaction and works out which account it
    /// hits.
    ///
    /// An explicit account wins. Otherwise a non-credit-card payment method
    /// lends its linked account. Expenses charged to a credit card are the
    /// only rows that live without an account: they move the card's debt
    /// instead.
    async fn resolve_refs<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        kind: TransactionKind,
        refs: Refs,
        errors: &mut ValidationErrors,
    ) -> ResultEngine<Resolved> {
        let method = match refs.payment_method_id {
            Some(id) => {
                let found = self.find_owned_payment_method(db, user_id, id).await?;
                errors.check(found.is_none(), "payment_method_id", "does not exist");
                found
            }
            None => None,
        };
        let paid_by_card = method
            .as_ref()
            .is_some_and(payment_methods::Model::is_credit_card);

        let account_id = refs.account_id.or_else(|| {
            method
                .as_ref()
                .filter(|m| !m.is_credit_card())
                .and_then(|m| m.linked_account_id)
        });
        let account = match account_id {
            Some(id) => {
                let found = self.find_owned_account(db, user_id, id).await?;
                errors.check(found.is_none(), "account_id", "does not exist");
                found
            }
            None => None,
        };

        match kind {
            TransactionKind::Expense if paid_by_card => errors.check(
                refs.account_id.is_some(),
                "account_id",
                "must be empty when paying with a credit card",
            ),
            TransactionKind::Settlement => {
                if refs.payment_method_id.is_none() {
                    errors.add("payment_method_id", "is required for settlements");
                } else if method.is_some() && !paid_by_card {
                    errors.add("payment_method_id", "must be a credit card");
                }
                errors.check(account_id.is_none(), "account_id", "account is required");
            }
            TransactionKind::TransferOut
            | TransactionKind::TransferIn
            | TransactionKind::InitialBalance => {
                errors.check(
                    refs.payment_method_id.is_some(),
                    "payment_method_id",
                    "is not allowed for this kind",
                );
                errors.check(account_id.is_none(), "account_id", "account is required");
            }
            TransactionKind::Expense | TransactionKind::Income => {
                errors.check(account_id.is_none(), "account_id", "account is required");
            }
        }

        let category_id = match refs.category_id {
            Some(id) => match self.find_visible_category(db, user_id, id).await? {
                Some(category) => {
                    check_category_kind(errors, kind, &category);
                    Some(category.id)
                }
                None => {
                    errors.add("category_id", "does not exist");
                    None
                }
            },
            None => None,
        };

        let currency = match (&account, &method) {
            (Some(account), _) => Some(model_currency(&account.currency)?),
            (None, Some(method)) => Some(model_currency(&method.currency)?),
            (None, None) => None,
        };

        Ok(Resolved {
            account_id,
            payment_method_id: refs.payment_method_id,
            category_id,
            currency,
        })
    }

    /// Records an income, expense or settlement.
    ///
    /// Transfers go through [`Engine::transfer`]; opening balances are written
    /// by [`Engine::create_account`].
    pub async fn create_transaction(
        &self,
        user_id: &str,
        cmd: NewTransaction,
    ) -> ResultEngine<Transaction> {
        let mut errors = ValidationErrors::new();
        errors.check(
            !matches!(
                cmd.kind,
                TransactionKind::Income | TransactionKind::Expense | TransactionKind::Settlement
            ),
            "kind",
            "only income, expense and settlement can be created directly",
        );
        check_positive_amount(&mut errors, "amount_minor", cmd.amount_minor);
        let description = check_description(&mut errors, &cmd.description);
        let currency = cmd
            .currency
            .as_deref()
            .and_then(|code| check_currency(&mut errors, code));
        let refs = Refs {
            account_id: cmd.account_id,
            payment_method_id: cmd.payment_method_id,
            category_id: cmd.category_id,
        };

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let resolved = self
                .resolve_refs(&db_tx, user_id, cmd.kind, refs, &mut errors)
                .await?;
            errors.into_result()?;

            let category_id = match resolved.category_id {
                Some(id) => Some(id),
                None if cmd.kind == TransactionKind::Settlement => {
                    self.system_category_id(&db_tx, SETTLEMENT_CATEGORY).await?
                }
                None => None,
            };

            let tx = Transaction {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                kind: cmd.kind,
                account_id: resolved.account_id,
                payment_method_id: resolved.payment_method_id,
                category_id,
                linked_transaction_id: None,
                amount_minor: cmd.amount_minor,
                currency: currency.or(resolved.currency).unwrap_or_default(),
                description,
                notes: normalize_optional_text(cmd.notes.as_deref()),
                occurred_on: cmd.occurred_on,
                created_at: Utc::now(),
            };
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            tracing::debug!(id = %tx.id, kind = %tx.kind, amount = tx.amount_minor, "transaction created");
            Ok(tx)
        })
    }

    /// Pays down a credit card from an account.
    ///
    /// One `settlement` row referencing both: it lowers the card's debt and
    /// debits the account.
    pub async fn settle_credit_card(
        &self,
        user_id: &str,
        cmd: SettlementCmd,
    ) -> ResultEngine<Transaction> {
        let mut new_tx = NewTransaction::new(
            TransactionKind::Settlement,
            cmd.amount_minor,
            cmd.description,
            cmd.occurred_on,
        )
        .account(cmd.account_id)
        .payment_method(cmd.payment_method_id);
        new_tx.notes = cmd.notes;
        self.create_transaction(user_id, new_tx).await
    }

    /// Moves money between two accounts.
    ///
    /// Writes a `transfer_out` on the source and a `transfer_in` on the
    /// destination, each linked to the other. Returns `(out, in)`.
    pub async fn transfer(
        &self,
        user_id: &str,
        cmd: TransferCmd,
    ) -> ResultEngine<(Transaction, Transaction)> {
        let mut errors = ValidationErrors::new();
        check_positive_amount(&mut errors, "amount_minor", cmd.amount_minor);
        let description = check_description(&mut errors, &cmd.description);
        errors.check(
            cmd.from_account_id == cmd.to_account_id,
            "to_account_id",
            "must differ from from_account_id",
        );

        with_tx!(self, |db_tx| {
            let from = self
                .find_owned_account(&db_tx, user_id, cmd.from_account_id)
                .await?;
            let to = self
                .find_owned_account(&db_tx, user_id, cmd.to_account_id)
                .await?;
            errors.check(from.is_none(), "from_account_id", "does not exist");
            errors.check(to.is_none(), "to_account_id", "does not exist");
            let Some(from) = from.filter(|_| errors.is_empty()) else {
                return Err(EngineError::Validation(errors));
            };

            let category_id = self.system_category_id(&db_tx, TRANSFER_CATEGORY).await?;
            let mut outgoing = Transaction {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                kind: TransactionKind::TransferOut,
                account_id: Some(from.id),
                payment_method_id: None,
                category_id,
                linked_transaction_id: None,
                amount_minor: cmd.amount_minor,
                currency: model_currency(&from.currency)?,
                description,
                notes: normalize_optional_text(cmd.notes.as_deref()),
                occurred_on: cmd.occurred_on,
                created_at: Utc::now(),
            };
            let incoming = Transaction {
                id: Uuid::new_v4(),
                kind: TransactionKind::TransferIn,
                account_id: Some(cmd.to_account_id),
                linked_transaction_id: Some(outgoing.id),
                ..outgoing.clone()
            };

            // The self-reference is checked immediately, so the outgoing half
            // is linked once its counterpart exists.
            transactions::ActiveModel::from(&outgoing)
                .insert(&db_tx)
                .await?;
            transactions::ActiveModel::from(&incoming)
                .insert(&db_tx)
                .await?;
            transactions::ActiveModel {
                id: ActiveValue::Set(outgoing.id),
                linked_transaction_id: ActiveValue::Set(Some(incoming.id)),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            outgoing.linked_transaction_id = Some(incoming.id);

            tracing::debug!(outgoing = %outgoing.id, incoming = %incoming.id, amount = cmd.amount_minor, "transfer created");
            Ok((outgoing, incoming))
        })
    }

    /// Return a transaction.
    pub async fn transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let model = self
            .require_transaction(&self.database, user_id, transaction_id)
            .await?;
        Transaction::try_from(model)
    }

    /// Updates a transaction.
    ///
    /// The same reference rules as on creation apply to the merged result.
    /// Moving it to another account or payment method takes that one's
    /// currency. On a transfer half, amount, date, description and notes are copied to
    /// the linked half; its accounts cannot change.
    pub async fn update_transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
        patch: TransactionPatch,
    ) -> ResultEngine<Transaction> {
        let mut errors = ValidationErrors::new();
        if let Some(amount) = patch.amount_minor {
            check_positive_amount(&mut errors, "amount_minor", amount);
        }
        let description = patch
            .description
            .as_deref()
            .map(|value| check_description(&mut errors, value));
        let notes = patch
            .notes
            .as_ref()
            .map(|value| normalize_optional_text(value.as_deref()));

        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            let kind = TransactionKind::try_from(model.kind.as_str())?;

            if kind.is_transfer() {
                errors.check(
                    patch
                        .account_id
                        .is_some_and(|account_id| account_id != model.account_id),
                    "account_id",
                    "accounts of a transfer cannot be changed",
                );
            }

            let refs = Refs {
                account_id: patch.account_id.unwrap_or(model.account_id),
                payment_method_id: patch.payment_method_id.unwrap_or(model.payment_method_id),
                category_id: patch.category_id.unwrap_or(model.category_id),
            };
            let resolved = self
                .resolve_refs(&db_tx, user_id, kind, refs, &mut errors)
                .await?;
            errors.into_result()?;

            let linked_id = model.linked_transaction_id;
            let moved = resolved.account_id != model.account_id
                || resolved.payment_method_id != model.payment_method_id;
            let mut active = model.into_active_model();
            active.account_id = ActiveValue::Set(resolved.account_id);
            active.payment_method_id = ActiveValue::Set(resolved.payment_method_id);
            active.category_id = ActiveValue::Set(resolved.category_id);
            if moved && let Some(currency) = resolved.currency {
                active.currency = ActiveValue::Set(currency.code().to_string());
            }
            if let Some(amount) = patch.amount_minor {
                active.amount_minor = ActiveValue::Set(amount);
            }
            if let Some(description) = description {
                active.description = ActiveValue::Set(description);
            }
            if let Some(notes) = notes {
                active.notes = ActiveValue::Set(notes);
            }
            if let Some(occurred_on) = patch.occurred_on {
                active.occurred_on = ActiveValue::Set(occurred_on);
            }
            let updated = active.update(&db_tx).await?;

            if kind.is_transfer()
                && let Some(linked_id) = linked_id
            {
                mirror_transfer_half(&db_tx, linked_id, &updated).await?;
            }

            tracing::debug!(id = %updated.id, "transaction updated");
            Transaction::try_from(updated)
        })
    }

    /// Soft-deletes a transaction, and its linked half for transfers.
    pub async fn delete_transaction(&self, user_id: &str, transaction_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            let mut ids = vec![model.id];
            ids.extend(model.linked_transaction_id);

            transactions::Entity::update_many()
                .col_expr(transactions::Column::DeletedAt, Expr::value(Utc::now()))
                .filter(transactions::Column::Id.is_in(ids))
                .filter(transactions::Column::DeletedAt.is_null())
                .exec(&db_tx)
                .await?;
            tracing::debug!(id = %transaction_id, "transaction deleted");
            Ok(())
        })
    }

    /// Writes the opening balance of a freshly created account.
    pub(crate) async fn insert_initial_balance(
        &self,
        db_tx: &DatabaseTransaction,
        account: &Account,
        amount_minor: i64,
    ) -> ResultEngine<Transaction> {
        let category_id = self
            .system_category_id(db_tx, INITIAL_BALANCE_CATEGORY)
            .await?;
        let now = Utc::now();
        let tx = Transaction {
            id: Uuid::new_v4(),
            user_id: account.user_id.clone(),
            kind: TransactionKind::InitialBalance,
            account_id: Some(account.id),
            payment_method_id: None,
            category_id,
            linked_transaction_id: None,
            amount_minor,
            currency: account.currency.clone(),
            description: INITIAL_BALANCE_CATEGORY.to_string(),
            notes: None,
            occurred_on: now.date_naive(),
            created_at: now,
        };
        transactions::ActiveModel::from(&tx).insert(db_tx).await?;
        Ok(tx)
    }
}

async fn mirror_transfer_half(
    db_tx: &DatabaseTransaction,
    linked_id: Uuid,
    source: &transactions::Model,
) -> ResultEngine<()> {
    transactions::Entity::update_many()
        .col_expr(
            transactions::Column::AmountMinor,
            Expr::value(source.amount_minor),
        )
        .col_expr(
            transactions::Column::Description,
            Expr::value(source.description.clone()),
        )
        .col_expr(transactions::Column::Notes, Expr::value(source.notes.clone()))
        .col_expr(
            transactions::Column::OccurredOn,
            Expr::value(source.occurred_on),
        )
        .filter(transactions::Column::Id.eq(linked_id))
        .filter(transactions::Column::DeletedAt.is_null())
        .exec(db_tx)
        .await?;
    Ok(())
}
