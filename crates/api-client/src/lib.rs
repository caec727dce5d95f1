use crate::error::ApiError;
use crate::responses::{GatewayErrorResponse, TemplateListResponse};
use async_trait::async_trait;
use configuration::settings::GatewaySettings;
use core_types::{
    AccountId, CloseRequestLeg, PositionUpdate, SubmissionLeg, TemplateSettings, TemplateSummary,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

pub mod error;
pub mod live_connector;
pub mod responses;

// --- Public API ---
pub use live_connector::LiveConnector;
pub use responses::{ActionResponse, PriceResponse, RoiResponse, SymbolsResponse};

/// The generic, abstract interface for the dashboard's backend gateway.
/// This trait is the contract the session and lifecycle layers use, allowing
/// the underlying implementation (live or mock) to be swapped out.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Fetches the tradable futures symbol list.
    async fn fetch_symbols(&self) -> Result<Vec<String>, ApiError>;

    /// Fetches the current price for a single symbol.
    async fn fetch_price(&self, symbol: &str) -> Result<Decimal, ApiError>;

    /// Submits a batch of trade legs for one account. Returns the gateway's
    /// confirmation message.
    async fn submit_trades(
        &self,
        bot_name: &str,
        account_id: AccountId,
        coins: &[SubmissionLeg],
    ) -> Result<String, ApiError>;

    /// Closes a batch of open positions in one request. Returns the
    /// gateway's confirmation message.
    async fn close_trades(
        &self,
        account_id: AccountId,
        trades: &[CloseRequestLeg],
    ) -> Result<String, ApiError>;

    /// Fetches the full open-position set with current marks and ROI.
    async fn fetch_roi(&self, account_id: AccountId) -> Result<Vec<PositionUpdate>, ApiError>;

    /// Lists the stored trade templates.
    async fn list_templates(&self) -> Result<Vec<TemplateSummary>, ApiError>;

    /// Fetches one template's full settings snapshot.
    async fn get_template(&self, id: i64) -> Result<TemplateSettings, ApiError>;

    /// Stores a template under the given name.
    async fn save_template(&self, name: &str, settings: &TemplateSettings) -> Result<(), ApiError>;

    /// Deletes a stored template.
    async fn delete_template(&self, id: i64) -> Result<(), ApiError>;
}

/// A concrete implementation of the `GatewayClient` over HTTP/JSON.
#[derive(Clone)]
pub struct HttpGatewayClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGatewayClient {
    pub fn new(config: &GatewaySettings) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .expect("Failed to build reqwest client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn _get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;
        Self::read_response(response).await
    }

    async fn _post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;
        Self::read_response(response).await
    }

    /// A 2xx body is parsed as `T`; a non-2xx body is expected to carry
    /// `{"error": ...}` and surfaces the gateway's own reason, falling back
    /// to the bare status code when it does not.
    async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else if let Ok(body) = serde_json::from_str::<GatewayErrorResponse>(&text) {
            Err(ApiError::Gateway(body.error))
        } else {
            Err(ApiError::Gateway(format!("HTTP {status}")))
        }
    }

    /// Resolves an `ActionResponse` into the gateway's message, treating
    /// `ok: false` as a refusal even when the status was 2xx.
    fn action_message(response: ActionResponse) -> Result<String, ApiError> {
        if response.ok {
            Ok(response.message.unwrap_or_default())
        } else {
            Err(ApiError::Gateway(response.error.unwrap_or_else(|| {
                "gateway refused the request".to_string()
            })))
        }
    }
}

#[async_trait]
impl GatewayClient for HttpGatewayClient {
    async fn fetch_symbols(&self) -> Result<Vec<String>, ApiError> {
        let response: SymbolsResponse = self._get("/api/futures/symbols", &[]).await?;
        Ok(response.symbols)
    }

    async fn fetch_price(&self, symbol: &str) -> Result<Decimal, ApiError> {
        let response: PriceResponse = self._get("/api/price", &[("symbol", symbol)]).await?;
        Ok(response.price)
    }

    async fn submit_trades(
        &self,
        bot_name: &str,
        account_id: AccountId,
        coins: &[SubmissionLeg],
    ) -> Result<String, ApiError> {
        let body = json!({
            "bot_name": bot_name,
            "account_id": account_id,
            "coins": coins,
        });
        let response: ActionResponse = self._post("/api/trades/submit", &body).await?;
        Self::action_message(response)
    }

    async fn close_trades(
        &self,
        account_id: AccountId,
        trades: &[CloseRequestLeg],
    ) -> Result<String, ApiError> {
        let body = json!({
            "account_id": account_id,
            "trades": trades,
        });
        let response: ActionResponse = self._post("/api/trades/close", &body).await?;
        Self::action_message(response)
    }

    async fn fetch_roi(&self, account_id: AccountId) -> Result<Vec<PositionUpdate>, ApiError> {
        let path = format!("/api/trades/fetch_roi/{account_id}");
        let response: RoiResponse = self._get(&path, &[]).await?;
        if !response.ok {
            return Err(ApiError::Gateway("ROI fetch reported failure".to_string()));
        }
        Ok(response.trades)
    }

    async fn list_templates(&self) -> Result<Vec<TemplateSummary>, ApiError> {
        let response: TemplateListResponse = self._get("/api/templates/list", &[]).await?;
        Ok(response.items)
    }

    async fn get_template(&self, id: i64) -> Result<TemplateSettings, ApiError> {
        let path = format!("/api/templates/get/{id}");
        self._get(&path, &[]).await
    }

    async fn save_template(&self, name: &str, settings: &TemplateSettings) -> Result<(), ApiError> {
        let body = json!({
            "name": name,
            "settings": settings,
        });
        let response: ActionResponse = self._post("/api/templates/save", &body).await?;
        Self::action_message(response).map(|_| ())
    }

    async fn delete_template(&self, id: i64) -> Result<(), ApiError> {
        let path = format!("/api/templates/delete/{id}");
        let response: ActionResponse = self._post(&path, &json!({})).await?;
        Self::action_message(response).map(|_| ())
    }
}
