//! Reports API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::reports::{DailyReport, DateRangeReport};
use crate::utils::AppResult;
use crate::utils::time::{parse_date, today};

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    /// YYYY-MM-DD; defaults to today in the business timezone
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    /// YYYY-MM-DD
    pub start_date: String,
    /// YYYY-MM-DD
    pub end_date: String,
}

/// GET /api/reports/daily?date=YYYY-MM-DD
pub async fn daily(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Query(query): Query<DailyQuery>,
) -> AppResult<Json<DailyReport>> {
    let date = match &query.date {
        Some(raw) => parse_date(raw)?,
        None => today(state.config.timezone),
    };

    let report = state.reports.generate_daily_report(date).await?;
    Ok(Json(report))
}

/// GET /api/reports/range?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD
pub async fn range(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<DateRangeReport>> {
    let start = parse_date(&query.start_date)?;
    let end = parse_date(&query.end_date)?;

    let report = state.reports.generate_date_range_report(start, end).await?;
    Ok(Json(report))
}
