//! # Helm Templates
//!
//! The template service client: CRUD passthrough over the gateway's
//! template endpoints, plus the pure apply/snapshot operations that move a
//! stored settings snapshot onto (or off) the composer.

use crate::error::TemplateError;
use api_client::GatewayClient;
use composer::TradeComposer;
use core_types::{MarginMode, PositionSide, TemplateSettings, TemplateSummary};
use std::sync::Arc;

// Declare the modules that make up this crate.
pub mod error;

/// The submission-wide defaults a template restores alongside its legs.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDefaults {
    pub bot_name: String,
    pub side: PositionSide,
    pub margin_mode: MarginMode,
}

/// Applies a stored settings snapshot onto the composer. The selection is
/// fully replaced (clear-then-insert, never a merge); saved legs keep their
/// leverage, margin and price. Returns the defaults the caller should
/// restore to its own inputs.
pub fn apply_template(
    settings: TemplateSettings,
    composer: &mut TradeComposer,
) -> AppliedDefaults {
    let TemplateSettings {
        bot_name,
        side,
        margin_mode,
        coins,
    } = settings;
    composer.replace_all(coins);
    AppliedDefaults {
        bot_name,
        side,
        margin_mode,
    }
}

/// Captures the composer's current selection and the submission-wide
/// defaults as a storable settings snapshot.
pub fn settings_snapshot(
    bot_name: &str,
    side: PositionSide,
    margin_mode: MarginMode,
    composer: &TradeComposer,
) -> TemplateSettings {
    TemplateSettings {
        bot_name: bot_name.to_string(),
        side,
        margin_mode,
        coins: composer.snapshot_legs(),
    }
}

/// CRUD client for the gateway's template endpoints.
pub struct TemplateClient {
    gateway: Arc<dyn GatewayClient>,
}

impl TemplateClient {
    pub fn new(gateway: Arc<dyn GatewayClient>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<TemplateSummary>, TemplateError> {
        Ok(self.gateway.list_templates().await?)
    }

    pub async fn get(&self, id: i64) -> Result<TemplateSettings, TemplateError> {
        Ok(self.gateway.get_template(id).await?)
    }

    /// Stores a snapshot under `name`. A blank name is rejected locally and
    /// never reaches the gateway.
    pub async fn save(&self, name: &str, settings: &TemplateSettings) -> Result<(), TemplateError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TemplateError::Validation(
                "template name must not be blank".to_string(),
            ));
        }
        self.gateway.save_template(name, settings).await?;
        tracing::info!(name, legs = settings.coins.len(), "Saved template.");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), TemplateError> {
        self.gateway.delete_template(id).await?;
        tracing::info!(id, "Deleted template.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::error::ApiError;
    use async_trait::async_trait;
    use configuration::settings::ComposerSettings;
    use core_types::{AccountId, CandidateLeg, CloseRequestLeg, LegPrice, PositionUpdate, SubmissionLeg};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    /// Records template calls and serves one canned template.
    #[derive(Default)]
    struct RecordingGateway {
        saved: Mutex<Vec<String>>,
        deleted: Mutex<Vec<i64>>,
    }

    fn canned_settings() -> TemplateSettings {
        TemplateSettings {
            bot_name: "scalper".to_string(),
            side: PositionSide::Short,
            margin_mode: MarginMode::Cross,
            coins: vec![CandidateLeg {
                symbol: "SOLUSDT".to_string(),
                leverage: 20,
                margin: dec!(50),
                price: LegPrice::Quoted(dec!(145.2)),
            }],
        }
    }

    #[async_trait]
    impl GatewayClient for RecordingGateway {
        async fn fetch_symbols(&self) -> Result<Vec<String>, ApiError> {
            Ok(Vec::new())
        }
        async fn fetch_price(&self, _symbol: &str) -> Result<Decimal, ApiError> {
            Err(ApiError::Gateway("unused".to_string()))
        }
        async fn submit_trades(
            &self,
            _bot_name: &str,
            _account_id: AccountId,
            _coins: &[SubmissionLeg],
        ) -> Result<String, ApiError> {
            Ok(String::new())
        }
        async fn close_trades(
            &self,
            _account_id: AccountId,
            _trades: &[CloseRequestLeg],
        ) -> Result<String, ApiError> {
            Ok(String::new())
        }
        async fn fetch_roi(&self, _account_id: AccountId) -> Result<Vec<PositionUpdate>, ApiError> {
            Ok(Vec::new())
        }
        async fn list_templates(&self) -> Result<Vec<TemplateSummary>, ApiError> {
            Ok(vec![TemplateSummary {
                id: 1,
                name: "scalp-set".to_string(),
                created_at: 1_714_557_600,
            }])
        }
        async fn get_template(&self, _id: i64) -> Result<TemplateSettings, ApiError> {
            Ok(canned_settings())
        }
        async fn save_template(
            &self,
            name: &str,
            _settings: &TemplateSettings,
        ) -> Result<(), ApiError> {
            self.saved.lock().unwrap().push(name.to_string());
            Ok(())
        }
        async fn delete_template(&self, id: i64) -> Result<(), ApiError> {
            self.deleted.lock().unwrap().push(id);
            Ok(())
        }
    }

    fn composer() -> TradeComposer {
        TradeComposer::new(ComposerSettings {
            default_leverage: 10,
            default_margin: dec!(100),
            max_leverage: 150,
        })
    }

    #[test]
    fn apply_replaces_legs_and_returns_defaults() {
        let mut composer = composer();
        composer.add_leg("BTCUSDT");
        composer.add_leg("ETHUSDT");

        let defaults = apply_template(canned_settings(), &mut composer);

        assert_eq!(composer.len(), 1);
        let leg = composer.get("SOLUSDT").unwrap();
        assert_eq!(leg.leverage, 20);
        assert_eq!(leg.margin, dec!(50));
        assert_eq!(leg.price, LegPrice::Quoted(dec!(145.2)));

        assert_eq!(defaults.bot_name, "scalper");
        assert_eq!(defaults.side, PositionSide::Short);
        assert_eq!(defaults.margin_mode, MarginMode::Cross);
    }

    #[test]
    fn snapshot_captures_selection_and_defaults() {
        let mut composer = composer();
        composer.add_leg("BTCUSDT");

        let settings = settings_snapshot(
            "alpha",
            PositionSide::Long,
            MarginMode::Isolated,
            &composer,
        );
        assert_eq!(settings.bot_name, "alpha");
        assert_eq!(settings.coins.len(), 1);
        assert_eq!(settings.coins[0].symbol, "BTCUSDT");
    }

    #[tokio::test]
    async fn blank_name_never_reaches_the_gateway() {
        let gateway = Arc::new(RecordingGateway::default());
        let client = TemplateClient::new(gateway.clone());

        let err = client.save("   ", &canned_settings()).await.unwrap_err();
        assert!(matches!(err, TemplateError::Validation(_)));
        assert!(gateway.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_trims_and_forwards_the_name() {
        let gateway = Arc::new(RecordingGateway::default());
        let client = TemplateClient::new(gateway.clone());

        client.save(" momentum ", &canned_settings()).await.unwrap();
        assert_eq!(*gateway.saved.lock().unwrap(), vec!["momentum"]);
    }

    #[tokio::test]
    async fn list_get_delete_pass_through() {
        let gateway = Arc::new(RecordingGateway::default());
        let client = TemplateClient::new(gateway.clone());

        let items = client.list().await.unwrap();
        assert_eq!(items[0].name, "scalp-set");

        let settings = client.get(1).await.unwrap();
        assert_eq!(settings.bot_name, "scalper");

        client.delete(1).await.unwrap();
        assert_eq!(*gateway.deleted.lock().unwrap(), vec![1]);
    }
}
