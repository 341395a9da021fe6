//! Mapping and Routing Gateway endpoints
//!
//! Both kinds share handlers; the route table binds each to its kind.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::api::types::{
    gateway_segment, GatewayDetails, GatewayListQuery, GatewayUpdate, MessageResponse, RealsUpdate,
};
use crate::rules::numbers::storage_form;
use crate::rules::RuleTarget;
use crate::vos::gateways;
use crate::vos::record::GatewayKind;
use crate::web::error::ApiResult;
use crate::web::server::AppState;

/// Register list, detail and update routes for one gateway kind
pub fn gateway_routes(router: Router<AppState>, kind: GatewayKind) -> Router<AppState> {
    let base = format!("/servers/:server/{}", gateway_segment(kind));
    router
        .route(
            &base,
            get(
                move |State(state): State<AppState>,
                      Path(server): Path<String>,
                      Query(query): Query<GatewayListQuery>| async move {
                    list_gateways(state, kind, server, query).await
                },
            ),
        )
        .route(
            &format!("{}/:name", base),
            get(
                move |State(state): State<AppState>, Path(path): Path<(String, String)>| async move {
                    gateway_details(state, kind, path).await
                },
            )
            .put(
                move |State(state): State<AppState>,
                      Path(path): Path<(String, String)>,
                      Json(body): Json<GatewayUpdate>| async move {
                    update_gateway(state, kind, path, body).await
                },
            ),
        )
}

async fn list_gateways(
    state: AppState,
    kind: GatewayKind,
    server: String,
    query: GatewayListQuery,
) -> ApiResult<Json<Vec<GatewayDetails>>> {
    let server = state.fleet.server(&server)?;
    let found = gateways::list(state.fleet.vos(), server, kind, &query.filter_text).await?;
    Ok(Json(found.into_iter().map(GatewayDetails::new).collect()))
}

async fn gateway_details(
    state: AppState,
    kind: GatewayKind,
    (server, name): (String, String),
) -> ApiResult<Json<GatewayDetails>> {
    let server = state.fleet.server(&server)?;
    let record = gateways::details(state.fleet.vos(), server, kind, &name).await?;
    Ok(Json(GatewayDetails::new(record)))
}

async fn update_gateway(
    state: AppState,
    kind: GatewayKind,
    (server, name): (String, String),
    body: GatewayUpdate,
) -> ApiResult<Json<MessageResponse>> {
    let server = state.fleet.server(&server)?;
    let message = gateways::update(
        state.fleet.vos(),
        server,
        kind,
        &name,
        &body.payload_update_data,
        body.initial_hash.as_deref(),
    )
    .await?;
    Ok(Json(MessageResponse::new(message)))
}

pub async fn api_add_rule_reals(
    State(state): State<AppState>,
    Path((server, rg, vk)): Path<(String, String, String)>,
    Json(body): Json<RealsUpdate>,
) -> ApiResult<Json<MessageResponse>> {
    let server = state.fleet.server(&server)?;
    let message = gateways::add_rule_reals(
        state.fleet.vos(),
        server,
        &rg,
        &vk,
        &body.new_reals,
        body.initial_hash.as_deref(),
    )
    .await?;
    Ok(Json(MessageResponse::new(message)))
}

/// Replace a key's target outright. `["hetso"]` blocks it, an empty list deletes it.
pub async fn api_replace_rule_reals(
    State(state): State<AppState>,
    Path((server, rg, vk)): Path<(String, String, String)>,
    Json(body): Json<RealsUpdate>,
) -> ApiResult<Json<MessageResponse>> {
    let server = state.fleet.server(&server)?;
    let reals = body.new_reals.iter().map(|n| storage_form(n)).collect();
    let message = gateways::set_rule_target(
        state.fleet.vos(),
        server,
        &rg,
        &vk,
        RuleTarget::from_reals(reals),
        body.initial_hash.as_deref(),
    )
    .await?;
    Ok(Json(MessageResponse::new(message)))
}
