use api_client::GatewayClient;
use api_client::error::ApiError;
use async_trait::async_trait;
use core_types::{
    AccountId, CloseRequestLeg, PositionSide, PositionUpdate, SubmissionLeg, TemplateSettings,
    TemplateSummary,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A leveraged long used as snapshot material across the engine tests.
pub(crate) fn sample_update(symbol: &str) -> PositionUpdate {
    PositionUpdate {
        symbol: symbol.to_string(),
        side: PositionSide::Long,
        entry_price: dec!(100),
        leverage: 10,
        mark_price: Some(dec!(110)),
        roi: None,
    }
}

/// A gateway double that counts calls, captures the last payloads and
/// serves canned per-account ROI snapshots.
#[derive(Default)]
pub(crate) struct RecordingGateway {
    pub snapshots: Mutex<HashMap<AccountId, Vec<PositionUpdate>>>,
    pub roi_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
    pub fail_roi: bool,
    pub submit_error: Option<String>,
    pub submit_gate: Option<Arc<Notify>>,
    pub last_submit: Mutex<Option<(String, AccountId, Vec<SubmissionLeg>)>>,
    pub last_close: Mutex<Option<(AccountId, Vec<CloseRequestLeg>)>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(self, account_id: AccountId, trades: Vec<PositionUpdate>) -> Self {
        self.snapshots.lock().unwrap().insert(account_id, trades);
        self
    }

    pub fn failing_roi() -> Self {
        Self {
            fail_roi: true,
            ..Self::default()
        }
    }

    pub fn with_submit_error(message: &str) -> Self {
        Self {
            submit_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Submissions block on `gate` until the test releases them, holding
    /// the lifecycle's in-flight guard open.
    pub fn with_submit_gate(gate: Arc<Notify>) -> Self {
        Self {
            submit_gate: Some(gate),
            ..Self::default()
        }
    }
}

#[async_trait]
impl GatewayClient for RecordingGateway {
    async fn fetch_symbols(&self) -> Result<Vec<String>, ApiError> {
        Ok(Vec::new())
    }

    async fn fetch_price(&self, _symbol: &str) -> Result<Decimal, ApiError> {
        Ok(Decimal::ZERO)
    }

    async fn submit_trades(
        &self,
        bot_name: &str,
        account_id: AccountId,
        coins: &[SubmissionLeg],
    ) -> Result<String, ApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_submit.lock().unwrap() =
            Some((bot_name.to_string(), account_id, coins.to_vec()));
        if let Some(gate) = &self.submit_gate {
            gate.notified().await;
        }
        match &self.submit_error {
            Some(message) => Err(ApiError::Gateway(message.clone())),
            None => Ok(format!("Submitted {} trades", coins.len())),
        }
    }

    async fn close_trades(
        &self,
        account_id: AccountId,
        trades: &[CloseRequestLeg],
    ) -> Result<String, ApiError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_close.lock().unwrap() = Some((account_id, trades.to_vec()));
        Ok(format!("Closed {} positions", trades.len()))
    }

    async fn fetch_roi(&self, account_id: AccountId) -> Result<Vec<PositionUpdate>, ApiError> {
        self.roi_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_roi {
            return Err(ApiError::Gateway("roi worker unavailable".to_string()));
        }
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .get(&account_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_templates(&self) -> Result<Vec<TemplateSummary>, ApiError> {
        Ok(Vec::new())
    }

    async fn get_template(&self, id: i64) -> Result<TemplateSettings, ApiError> {
        Err(ApiError::Gateway(format!("template {id} not found")))
    }

    async fn save_template(&self, _name: &str, _settings: &TemplateSettings) -> Result<(), ApiError> {
        Ok(())
    }

    async fn delete_template(&self, _id: i64) -> Result<(), ApiError> {
        Ok(())
    }
}
