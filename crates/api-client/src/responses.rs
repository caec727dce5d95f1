use core_types::{PositionUpdate, TemplateSummary};
use rust_decimal::Decimal;
use serde::Deserialize;

// The gateway speaks snake_case JSON, so field names map directly with no
// rename attributes.

/// The response from `GET /api/futures/symbols`.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolsResponse {
    pub symbols: Vec<String>,
}

/// The response from `GET /api/price?symbol=...`.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceResponse {
    pub symbol: String,
    pub price: Decimal,
}

/// The response from the mutating endpoints (submit, close, template save
/// and delete). A refused request may come back as a 2xx with `ok: false`,
/// so both halves are optional here and resolved by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The response from `GET /api/trades/fetch_roi/{account}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RoiResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub trades: Vec<PositionUpdate>,
}

/// The response from `GET /api/templates/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateListResponse {
    pub items: Vec<TemplateSummary>,
}

/// The error payload the gateway attaches to non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayErrorResponse {
    pub error: String,
}
