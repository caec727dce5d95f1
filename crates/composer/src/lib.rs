use api_client::GatewayClient;
use configuration::settings::ComposerSettings;
use core_types::{
    CandidateLeg, CoreError, LegPrice, MarginMode, PositionSide, SubmissionLeg,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

// Declare the modules that make up this crate.
pub mod catalog;

// Re-export the core types to provide a clean public API.
pub use catalog::SymbolCatalog;

/// A per-leg sizing field addressable by name from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegField {
    Leverage,
    Margin,
}

impl FromStr for LegField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leverage" => Ok(LegField::Leverage),
            "margin" => Ok(LegField::Margin),
            _ => Err(CoreError::InvalidInput("leg field".to_string(), s.to_string())),
        }
    }
}

/// Parses operator input as a decimal, coercing anything unparseable to
/// zero. This permissive policy is deliberate: sizing fields absorb junk
/// input as zero instead of erroring.
pub fn parse_decimal(raw: &str) -> Decimal {
    Decimal::from_str(raw.trim()).unwrap_or(Decimal::ZERO)
}

/// The client-local working set of not-yet-submitted trade legs.
///
/// Its sole responsibility is to hold the selection state accurately: legs
/// are unique by symbol, keep their insertion order, and are only ever
/// mutated through these methods. Every mutation bumps `revision` so the
/// view layer knows when to re-read; nothing here performs I/O except the
/// one-shot price lookup.
#[derive(Debug, Clone)]
pub struct TradeComposer {
    legs: Vec<CandidateLeg>,
    settings: ComposerSettings,
    revision: u64,
}

impl TradeComposer {
    /// Creates an empty composer with the configured leg defaults.
    pub fn new(settings: ComposerSettings) -> Self {
        Self {
            legs: Vec::new(),
            settings,
            revision: 0,
        }
    }

    /// Adds a leg for `symbol` with the configured defaults. Returns `false`
    /// without touching anything when the symbol is already selected.
    pub fn add_leg(&mut self, symbol: &str) -> bool {
        if self.legs.iter().any(|l| l.symbol == symbol) {
            return false;
        }
        self.legs.push(CandidateLeg {
            symbol: symbol.to_string(),
            leverage: self.settings.default_leverage,
            margin: self.settings.default_margin,
            price: LegPrice::Pending,
        });
        self.revision += 1;
        true
    }

    /// Removes the leg for `symbol`. Removing an absent symbol is a no-op.
    pub fn remove_leg(&mut self, symbol: &str) {
        let before = self.legs.len();
        self.legs.retain(|l| l.symbol != symbol);
        if self.legs.len() != before {
            self.revision += 1;
        }
    }

    /// Resolves the display price for one leg with a single lookup. On
    /// failure the leg keeps its `Pending` price and is never retried; the
    /// failure is logged, not propagated.
    pub async fn resolve_price(&mut self, client: &dyn GatewayClient, symbol: &str) -> bool {
        match client.fetch_price(symbol).await {
            Ok(price) => self.set_quoted_price(symbol, price),
            Err(e) => {
                tracing::warn!(symbol, error = %e, "Price lookup failed; leg keeps a pending price.");
                false
            }
        }
    }

    fn set_quoted_price(&mut self, symbol: &str, price: Decimal) -> bool {
        let Some(leg) = self.legs.iter_mut().find(|l| l.symbol == symbol) else {
            return false;
        };
        leg.price = LegPrice::Quoted(price);
        self.revision += 1;
        true
    }

    /// Updates one sizing field from raw operator input. Unparseable input
    /// coerces to zero; leverage is truncated to an integer and clamped to
    /// the configured bound; margin is floored at zero. Returns `false`
    /// when the symbol is not selected.
    pub fn set_leg_field(&mut self, symbol: &str, field: LegField, raw: &str) -> bool {
        let max_leverage = self.settings.max_leverage;
        let Some(leg) = self.legs.iter_mut().find(|l| l.symbol == symbol) else {
            return false;
        };
        match field {
            LegField::Leverage => {
                let bounded = parse_decimal(raw)
                    .trunc()
                    .clamp(Decimal::ZERO, Decimal::from(max_leverage));
                leg.leverage = bounded.to_u32().unwrap_or(0);
            }
            LegField::Margin => {
                leg.margin = parse_decimal(raw).max(Decimal::ZERO);
            }
        }
        self.revision += 1;
        true
    }

    /// The summed estimated cost (margin / leverage) across all legs.
    /// Zero-leverage legs are excluded rather than dividing by zero.
    pub fn total_estimated_cost(&self) -> Decimal {
        self.legs
            .iter()
            .filter_map(CandidateLeg::estimated_cost)
            .sum()
    }

    /// Builds the ordered submission payload, stamping every leg with the
    /// submission-wide side and margin mode.
    pub fn submission_payload(
        &self,
        side: PositionSide,
        margin_mode: MarginMode,
    ) -> Vec<SubmissionLeg> {
        self.legs
            .iter()
            .map(|leg| SubmissionLeg {
                symbol: leg.symbol.clone(),
                side,
                leverage: leg.leverage,
                margin: leg.margin,
                margin_mode,
            })
            .collect()
    }

    /// Replaces the whole selection (clear-then-insert). Used by template
    /// application, which never merges into an existing selection.
    pub fn replace_all(&mut self, legs: Vec<CandidateLeg>) {
        self.legs = legs;
        self.revision += 1;
    }

    pub fn clear(&mut self) {
        if !self.legs.is_empty() {
            self.legs.clear();
            self.revision += 1;
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&CandidateLeg> {
        self.legs.iter().find(|l| l.symbol == symbol)
    }

    pub fn legs(&self) -> &[CandidateLeg] {
        &self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Monotonic change counter. The view layer re-reads the legs whenever
    /// this moves.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Hands out the leg set for a snapshot (template save) without
    /// disturbing the revision.
    pub fn snapshot_legs(&self) -> Vec<CandidateLeg> {
        self.legs.clone()
    }
}
