use api_client::GatewayClient;
use composer::TradeComposer;
use core_types::{AccountId, CloseRequestLeg, MarginMode, PositionSide};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::EngineError;

/// Drives the submit and close halves of the trade lifecycle against the
/// gateway.
///
/// Preconditions are checked locally and a violation never reaches the
/// network. The in-flight guard rejects a second submit while one is
/// outstanding, no matter how the caller schedules its futures.
pub struct TradeLifecycle {
    gateway: Arc<dyn GatewayClient>,
    in_flight: AtomicBool,
}

impl TradeLifecycle {
    pub fn new(gateway: Arc<dyn GatewayClient>) -> Self {
        Self {
            gateway,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently outstanding.
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Submits the composer's legs as one batch for `account_id`.
    ///
    /// On success the composer is cleared and the gateway's confirmation
    /// message is returned. On failure the composer is left untouched so
    /// the operator can correct and resubmit.
    pub async fn submit(
        &self,
        composer: &mut TradeComposer,
        account_id: AccountId,
        bot_name: &str,
        side: PositionSide,
        margin_mode: MarginMode,
    ) -> Result<String, EngineError> {
        let bot_name = bot_name.trim();
        if bot_name.is_empty() {
            return Err(EngineError::Validation(
                "bot name must not be blank".to_string(),
            ));
        }
        if account_id <= 0 {
            return Err(EngineError::Validation(
                "account id must be positive".to_string(),
            ));
        }
        if composer.is_empty() {
            return Err(EngineError::Validation(
                "select at least one coin before submitting".to_string(),
            ));
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::SubmissionInFlight);
        }
        let _reset = InFlightReset(&self.in_flight);

        let payload = composer.submission_payload(side, margin_mode);
        tracing::info!(
            bot_name,
            account_id,
            legs = payload.len(),
            "Submitting trade batch."
        );
        let result = self
            .gateway
            .submit_trades(bot_name, account_id, &payload)
            .await;

        match result {
            Ok(message) => {
                composer.clear();
                Ok(message)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Closes the given legs in one batched request. An empty set is a
    /// no-op `Ok(None)`, so callers can close "everything visible" without
    /// special-casing an empty view.
    pub async fn close(
        &self,
        account_id: AccountId,
        legs: &[CloseRequestLeg],
    ) -> Result<Option<String>, EngineError> {
        if legs.is_empty() {
            return Ok(None);
        }
        tracing::info!(account_id, legs = legs.len(), "Closing positions.");
        let message = self.gateway.close_trades(account_id, legs).await?;
        Ok(Some(message))
    }
}

/// Clears the in-flight flag when dropped, so a submit future abandoned at
/// the await cannot wedge later submissions.
struct InFlightReset<'a>(&'a AtomicBool);

impl Drop for InFlightReset<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
