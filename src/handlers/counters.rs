// src/handlers/counters.rs

//! `/promotion-counters`: reads on GET, spin bookkeeping on POST.

use crate::error::{AppError, Result};
use crate::promotion::{keys, DailyStatus, MonthlyCount, PrizeAward, SpinGate};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
pub struct CounterQuery {
    pub date: Option<String>,
    pub action: Option<String>,
    pub prizes: Option<String>,
}

#[derive(Serialize)]
struct DailyStatusResponse {
    date: String,
    #[serde(flatten)]
    status: DailyStatus,
}

#[derive(Serialize)]
struct PrizeCountsResponse {
    date: String,
    prizes: BTreeMap<String, i64>,
}

#[derive(Serialize)]
struct MonthlyCountsResponse {
    month: String,
    prizes: BTreeMap<String, MonthlyCount>,
}

#[derive(Serialize)]
struct PreSpinResponse {
    date: String,
    #[serde(flatten)]
    gate: SpinGate,
}

#[derive(Serialize)]
struct LossResponse {
    date: String,
    losses: i64,
}

#[derive(Serialize)]
struct WinResponse {
    date: String,
    ok: bool,
}

#[derive(Serialize)]
struct PrizeWinResponse {
    date: String,
    #[serde(flatten)]
    award: PrizeAward,
}

pub async fn get_counters(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CounterQuery>,
) -> Result<Response> {
    let service = &state.promotion;
    let date = service.resolve_day(query.date.as_deref());
    let prize_ids = keys::parse_prize_ids(query.prizes.as_deref().unwrap_or_default());

    // Unknown actions fall through to the daily status.
    let response = match query.action.as_deref() {
        Some("prizeCounts") => {
            let prizes = service.prize_counts(&date, &prize_ids).await?;
            Json(PrizeCountsResponse { date, prizes }).into_response()
        }
        Some("monthlyCounts") => {
            let prizes = service.monthly_counts(&prize_ids).await?;
            let month = service.current_month();
            Json(MonthlyCountsResponse { month, prizes }).into_response()
        }
        _ => {
            let status = service.daily_status(&date).await?;
            Json(DailyStatusResponse { date, status }).into_response()
        }
    };
    Ok(response)
}

/// Anything that is not a JSON object is handled as an empty one.
fn parse_body(body: &Bytes) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

pub async fn post_counters(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CounterQuery>,
    body: Bytes,
) -> Result<Response> {
    let service = &state.promotion;
    let date = service.resolve_day(query.date.as_deref());
    let body = parse_body(&body);
    let action = body.get("action").and_then(Value::as_str);
    debug!(action = ?action, date = %date, "Counter action");

    let response = match action {
        Some("preSpin") => {
            let gate = service.pre_spin(&date).await;
            Json(PreSpinResponse { date, gate }).into_response()
        }
        Some("incLoss") => {
            let losses = service.record_loss(&date).await?;
            Json(LossResponse { date, losses }).into_response()
        }
        Some("win") => {
            service.record_win(&date).await?;
            Json(WinResponse { date, ok: true }).into_response()
        }
        Some("prizeWin") => {
            let id = body
                .get("id")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| AppError::validation("id", "Missing prize id"))?;
            let award = service.record_prize_win(&date, id).await?;
            Json(PrizeWinResponse { date, award }).into_response()
        }
        _ => return Err(AppError::InvalidAction),
    };
    Ok(response)
}

/// Bare `OPTIONS` requests; real CORS preflights are answered by the CORS layer.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_object_bodies_become_empty() {
        assert!(parse_body(&Bytes::from_static(b"")).is_empty());
        assert!(parse_body(&Bytes::from_static(b"not json")).is_empty());
        assert!(parse_body(&Bytes::from_static(b"[1,2]")).is_empty());
        assert_eq!(
            parse_body(&Bytes::from_static(br#"{"action":"win"}"#))
                .get("action")
                .and_then(Value::as_str),
            Some("win")
        );
    }
}
