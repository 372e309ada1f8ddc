use anyhow::anyhow;
use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::get;
use serde::Deserialize;

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::core::{ConversionQuote, CurrencyTable};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/currencies", get(list_currencies))
        .route("/convert", get(convert))
}

/// `GET /api/currencies`: the upstream currency table, passed through as-is.
async fn list_currencies(State(state): State<AppState>) -> ApiResult<Json<CurrencyTable>> {
    let table = state
        .rates
        .currencies()
        .await
        .map_err(ApiError::CurrenciesUnavailable)?;
    Ok(Json(table))
}

/// Query parameters for `/convert`. All three are required, but absence has
/// to map to the proxy's own 400 payload rather than an axum rejection, so
/// they are optional here and checked by hand.
#[derive(Debug, Deserialize)]
struct ConvertParams {
    from: Option<String>,
    to: Option<String>,
    amount: Option<String>,
}

/// `GET /api/convert?from=&to=&amount=`: one conversion quote.
async fn convert(
    State(state): State<AppState>,
    Query(params): Query<ConvertParams>,
) -> ApiResult<Json<ConversionQuote>> {
    let (from, to, amount) = match (
        present(params.from),
        present(params.to),
        present(params.amount),
    ) {
        (Some(from), Some(to), Some(amount)) => (from, to, amount),
        _ => return Err(ApiError::MissingParams),
    };

    let amount: f64 = amount
        .parse()
        .map_err(|_| ApiError::ConversionFailed(anyhow!("Amount is not a number: {amount}")))?;

    let quote = state
        .rates
        .convert(&from, &to, amount)
        .await
        .map_err(ApiError::ConversionFailed)?;
    Ok(Json(quote))
}

/// An empty query value counts as missing.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
