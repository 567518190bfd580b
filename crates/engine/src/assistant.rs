//! Tool-calling surface for conversational assistants.
//!
//! A model picks a tool by name and passes JSON arguments; [`ToolCall::parse`]
//! turns that into a typed call and [`Engine::call_tool`] runs it through the
//! same operations (and the same ownership and validation rules) as every
//! other caller.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    Engine, EngineError, MAX_AMOUNT_MINOR, NewTransaction, ResultEngine, TransactionFilter,
    TransactionKind,
};

const DEFAULT_TOOL_PAGE_SIZE: u64 = 50;

/// Descriptor handed to the model.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListTransactionsArgs {
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub payment_method_id: Option<Uuid>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub kinds: Option<Vec<TransactionKind>>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTransactionArgs {
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub description: String,
    /// Defaults to today (UTC).
    #[serde(default)]
    pub occurred_on: Option<NaiveDate>,
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub payment_method_id: Option<Uuid>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A parsed tool invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolCall {
    ListAccounts,
    ListPaymentMethods,
    ListCategories,
    ListTransactions(ListTransactionsArgs),
    CreateTransaction(CreateTransactionArgs),
}

impl ToolCall {
    /// Parses a tool call. `null` arguments count as `{}`.
    pub fn parse(name: &str, arguments: Value) -> ResultEngine<Self> {
        let arguments = if arguments.is_null() {
            json!({})
        } else {
            arguments
        };
        match name {
            "list_accounts" => Ok(Self::ListAccounts),
            "list_payment_methods" => Ok(Self::ListPaymentMethods),
            "list_categories" => Ok(Self::ListCategories),
            "list_transactions" => parse_arguments(arguments).map(Self::ListTransactions),
            "create_transaction" => parse_arguments(arguments).map(Self::CreateTransaction),
            other => Err(EngineError::invalid(
                "name",
                format!("unknown tool: {other}"),
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListAccounts => "list_accounts",
            Self::ListPaymentMethods => "list_payment_methods",
            Self::ListCategories => "list_categories",
            Self::ListTransactions(_) => "list_transactions",
            Self::CreateTransaction(_) => "create_transaction",
        }
    }
}

fn parse_arguments<T: for<'de> Deserialize<'de>>(arguments: Value) -> ResultEngine<T> {
    serde_json::from_value(arguments).map_err(|err| EngineError::invalid("arguments", err.to_string()))
}

/// Every tool the assistant may call.
pub fn tool_specs() -> Vec<ToolSpec> {
    let uuid = json!({ "type": "string", "format": "uuid" });
    let date = json!({ "type": "string", "format": "date" });
    let kinds: Vec<&str> = TransactionKind::ALL.iter().map(|k| k.as_str()).collect();
    let no_arguments = json!({ "type": "object", "properties": {}, "additionalProperties": false });

    vec![
        ToolSpec {
            name: "list_accounts",
            description: "List the user's accounts with their current balance in minor units.",
            parameters: no_arguments.clone(),
        },
        ToolSpec {
            name: "list_payment_methods",
            description: "List the user's payment methods; credit cards include debt and available credit.",
            parameters: no_arguments.clone(),
        },
        ToolSpec {
            name: "list_categories",
            description: "List the user's categories together with the system ones.",
            parameters: no_arguments,
        },
        ToolSpec {
            name: "list_transactions",
            description: "List transactions, newest first, optionally filtered.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "account_id": uuid,
                    "payment_method_id": uuid,
                    "category_id": uuid,
                    "kinds": { "type": "array", "items": { "type": "string", "enum": kinds } },
                    "from": date,
                    "to": date,
                    "limit": { "type": "integer", "minimum": 1 },
                    "cursor": { "type": "string" }
                },
                "additionalProperties": false
            }),
        },
        ToolSpec {
            name: "create_transaction",
            description: "Record an income, an expense or a credit card settlement. Amounts are positive minor units.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "kind": { "type": "string", "enum": ["income", "expense", "settlement"] },
                    "amount_minor": { "type": "integer", "minimum": 1, "maximum": MAX_AMOUNT_MINOR },
                    "description": { "type": "string" },
                    "occurred_on": date,
                    "account_id": uuid,
                    "payment_method_id": uuid,
                    "category_id": uuid,
                    "currency": { "type": "string", "minLength": 3, "maxLength": 3 },
                    "notes": { "type": "string" }
                },
                "required": ["kind", "amount_minor", "description"],
                "additionalProperties": false
            }),
        },
    ]
}

impl Engine {
    /// Runs a tool call for `user_id` and returns its JSON result.
    pub async fn call_tool(&self, user_id: &str, call: ToolCall) -> ResultEngine<Value> {
        tracing::debug!(tool = call.name(), user_id, "tool call");
        match call {
            ToolCall::ListAccounts => {
                let accounts = self.list_accounts(user_id).await?;
                Ok(json!({ "accounts": accounts }))
            }
            ToolCall::ListPaymentMethods => {
                let methods = self.list_payment_methods(user_id).await?;
                let mut out = Vec::with_capacity(methods.len());
                for method in methods {
                    let credit = self.credit_summary(user_id, method.id).await?;
                    out.push(json!({ "payment_method": method, "credit": credit }));
                }
                Ok(json!({ "payment_methods": out }))
            }
            ToolCall::ListCategories => {
                let categories = self.list_categories(user_id).await?;
                Ok(json!({ "categories": categories }))
            }
            ToolCall::ListTransactions(args) => {
                let filter = TransactionFilter {
                    account_id: args.account_id,
                    payment_method_id: args.payment_method_id,
                    category_id: args.category_id,
                    kinds: args.kinds,
                    from: args.from,
                    to: args.to,
                    include_deleted: false,
                };
                let page = self
                    .list_transactions(
                        user_id,
                        &filter,
                        args.limit.unwrap_or(DEFAULT_TOOL_PAGE_SIZE),
                        args.cursor.as_deref(),
                    )
                    .await?;
                Ok(json!({ "transactions": page.items, "next_cursor": page.next_cursor }))
            }
            ToolCall::CreateTransaction(args) => {
                let occurred_on = args.occurred_on.unwrap_or_else(|| Utc::now().date_naive());
                let mut cmd =
                    NewTransaction::new(args.kind, args.amount_minor, args.description, occurred_on);
                cmd.account_id = args.account_id;
                cmd.payment_method_id = args.payment_method_id;
                cmd.category_id = args.category_id;
                cmd.currency = args.currency;
                cmd.notes = args.notes;
                let tx = self.create_transaction(user_id, cmd).await?;
                Ok(json!({ "transaction": tx }))
            }
        }
    }
}
