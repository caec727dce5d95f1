use api_client::GatewayClient;
use api_client::error::ApiError;

/// The tradable futures symbol list, fetched once at startup and held for
/// the lifetime of the process. Selection is validated against this set
/// before a leg ever reaches the composer.
#[derive(Debug, Clone)]
pub struct SymbolCatalog {
    symbols: Vec<String>,
}

impl SymbolCatalog {
    /// Fetches the catalog from the gateway. A malformed response is a
    /// transport error, never an empty catalog.
    pub async fn fetch(client: &dyn GatewayClient) -> Result<Self, ApiError> {
        let symbols = client.fetch_symbols().await?;
        tracing::info!(count = symbols.len(), "Loaded futures symbol catalog.");
        Ok(Self { symbols })
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
