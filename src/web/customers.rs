//! Customer endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::api::types::{CreditLimitUpdate, CustomerSearchQuery, LockStatusUpdate, MessageResponse};
use crate::fleet::FleetResults;
use crate::vos::customers::{self, CustomerDetails, CustomerSummary};
use crate::web::error::ApiResult;
use crate::web::server::AppState;

pub async fn api_search_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerSearchQuery>,
) -> Json<FleetResults<CustomerSummary>> {
    Json(
        state
            .fleet
            .search_customers(query.filter_type, &query.filter_text)
            .await,
    )
}

pub async fn api_customer_details(
    State(state): State<AppState>,
    Path((server, id)): Path<(String, String)>,
) -> ApiResult<Json<CustomerDetails>> {
    let server = state.fleet.server(&server)?;
    Ok(Json(customers::details(state.fleet.vos(), server, &id).await?))
}

pub async fn api_update_credit_limit(
    State(state): State<AppState>,
    Path((server, id)): Path<(String, String)>,
    Json(body): Json<CreditLimitUpdate>,
) -> ApiResult<Json<MessageResponse>> {
    let server = state.fleet.server(&server)?;
    let message = customers::update_limit(
        state.fleet.vos(),
        server,
        &id,
        body.new_limit,
        body.initial_hash.as_deref(),
    )
    .await?;
    Ok(Json(MessageResponse::new(message)))
}

pub async fn api_update_lock_status(
    State(state): State<AppState>,
    Path((server, id)): Path<(String, String)>,
    Json(body): Json<LockStatusUpdate>,
) -> ApiResult<Json<MessageResponse>> {
    let server = state.fleet.server(&server)?;
    let message = customers::update_lock(
        state.fleet.vos(),
        server,
        &id,
        body.new_lock_status,
        body.initial_hash.as_deref(),
    )
    .await?;
    Ok(Json(MessageResponse::new(message)))
}
