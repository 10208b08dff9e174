// /api/categories handlers

use super::{json_body, query_params, AppState, IdQuery, MessageResponse};
use crate::entities::category::{self, Category, CategoryInput};
use crate::entities::TransactionKind;
use crate::error::Result;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Json, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct CategoryListQuery {
    pub kind: Option<String>,
}

/// GET /api/categories[?kind=income|expense]
pub async fn list_categories(
    State(state): State<AppState>,
    query: std::result::Result<Query<CategoryListQuery>, QueryRejection>,
) -> Result<Json<Vec<Category>>> {
    let params = query_params(query)?;

    let categories = match params.kind.as_deref().filter(|k| !k.is_empty()) {
        Some(kind) => {
            let kind: TransactionKind = kind.parse()?;
            state.run(|conn| category::get_categories_by_kind(conn, kind))?
        }
        None => state.run(category::get_all_categories)?,
    };

    Ok(Json(categories))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CategoryInput>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let new_category = json_body(payload)?.validate()?;
    let id = state.run(|conn| category::insert_category(conn, &new_category))?;

    tracing::info!(id, name = %new_category.name, kind = %new_category.kind, "category created");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created("Category created", id)),
    ))
}

/// PUT /api/categories?id=<id>
pub async fn update_category(
    State(state): State<AppState>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
    payload: std::result::Result<Json<CategoryInput>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let id = IdQuery::require(query)?;
    let fields = json_body(payload)?.validate()?;
    let changed = state.run(|conn| category::update_category(conn, id, &fields))?;

    tracing::info!(id, changed, "category updated");
    Ok(Json(MessageResponse::new("Category updated")))
}

/// DELETE /api/categories?id=<id>
pub async fn delete_category(
    State(state): State<AppState>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>> {
    let id = IdQuery::require(query)?;
    let removed = state.run(|conn| category::delete_category(conn, id))?;

    tracing::info!(id, removed, "category deleted");
    Ok(Json(MessageResponse::new("Category deleted")))
}
