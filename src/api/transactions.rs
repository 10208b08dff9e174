// /api/income and /api/expenses handlers
//
// Both resources share these handlers; the nested router injects the kind.

use super::{json_body, optional_date, query_params, AppState, IdQuery, MessageResponse};
use crate::entities::transaction::{self, Transaction, TransactionFilter, TransactionInput};
use crate::entities::TransactionKind;
use crate::error::Result;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Json, Query, State},
    http::StatusCode,
    Extension,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    pub account_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl TransactionListQuery {
    fn to_filter(&self) -> Result<TransactionFilter> {
        Ok(TransactionFilter {
            account_id: self.account_id,
            start_date: optional_date("startDate", self.start_date.as_deref())?,
            end_date: optional_date("endDate", self.end_date.as_deref())?,
        })
    }
}

/// GET - newest first, optionally narrowed by accountId / startDate / endDate
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(kind): Extension<TransactionKind>,
    query: std::result::Result<Query<TransactionListQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>> {
    let filter = query_params(query)?.to_filter()?;
    let transactions = state.run(|conn| transaction::get_transactions_filtered(conn, kind, &filter))?;

    tracing::debug!(%kind, count = transactions.len(), filtered = !filter.is_empty(), "listed transactions");
    Ok(Json(transactions))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(kind): Extension<TransactionKind>,
    payload: std::result::Result<Json<TransactionInput>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let new_tx = json_body(payload)?.validate()?;
    let id = state.run(|conn| transaction::insert_transaction(conn, kind, &new_tx))?;

    tracing::info!(%kind, id, amount = new_tx.amount, date = %new_tx.date, "transaction created");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created(format!("{} created", kind.title()), id)),
    ))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(kind): Extension<TransactionKind>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
    payload: std::result::Result<Json<TransactionInput>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let id = IdQuery::require(query)?;
    let fields = json_body(payload)?.validate()?;
    let changed = state.run(|conn| transaction::update_transaction(conn, kind, id, &fields))?;

    tracing::info!(%kind, id, changed, "transaction updated");
    Ok(Json(MessageResponse::new(format!("{} updated", kind.title()))))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(kind): Extension<TransactionKind>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>> {
    let id = IdQuery::require(query)?;
    let removed = state.run(|conn| transaction::delete_transaction(conn, kind, id))?;

    tracing::info!(%kind, id, removed, "transaction deleted");
    Ok(Json(MessageResponse::new(format!("{} deleted", kind.title()))))
}

/// POST .../duplicate?id=<id> - Copy a record into a new row
pub async fn duplicate_transaction(
    State(state): State<AppState>,
    Extension(kind): Extension<TransactionKind>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let source_id = IdQuery::require(query)?;
    let id = state.run(|conn| transaction::duplicate_transaction(conn, kind, source_id))?;

    tracing::info!(%kind, source_id, id, "transaction duplicated");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created(format!("{} duplicated", kind.title()), id)),
    ))
}
