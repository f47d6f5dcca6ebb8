//! VaultWolf Bloomberg Manager — async front for the blocking BlpClient.
//!
//! Every request runs the library's blocking session loop on
//! `tokio::task::spawn_blocking`, bounded by the configured request timeout,
//! so HTTP handlers never block the runtime. Sessions are per request; the
//! manager keeps no provider state of its own.

use std::sync::Arc;
use std::time::Duration;

use vault_wolf_blpapi::{
    BlpApiError, BlpClient, ClientConfig, HistoricalRequest, IntradayBarRequest,
    ReferenceRequest, ReplaySessionProvider, Response,
};

type Client = BlpClient<ReplaySessionProvider>;

// ============================================================================
// BbgManager
// ============================================================================

pub struct BbgManager {
    client: Arc<Client>,
    request_timeout: Duration,
}

impl BbgManager {
    /// The request timeout bounds both the async wait and the blocking
    /// event loop, so a timed-out request also releases its session.
    pub fn new(provider: ReplaySessionProvider, mut config: ClientConfig, request_timeout: Duration) -> Self {
        config.request_timeout = Some(request_timeout);
        Self {
            client: Arc::new(BlpClient::with_config(provider, config)),
            request_timeout,
        }
    }

    pub fn endpoint(&self) -> String {
        self.client.config().session.endpoint()
    }

    pub fn sessions_started(&self) -> usize {
        self.client.provider().sessions_started()
    }

    // ========================================================================
    // Requests
    // ========================================================================

    pub async fn historical(&self, params: HistoricalRequest) -> Result<Response, BlpApiError> {
        tracing::info!(
            "historical request: {} tickers, {} fields, {} to {}",
            params.tickers.len(),
            params.fields.len(),
            params.start_date,
            params.end_date
        );
        self.run("historical", move |client| client.historical(&params)).await
    }

    pub async fn reference(&self, params: ReferenceRequest) -> Result<Response, BlpApiError> {
        tracing::info!(
            "reference request: {} tickers, {} fields, {} overrides",
            params.tickers.len(),
            params.fields.len(),
            params.overrides.len()
        );
        self.run("reference", move |client| client.reference(&params)).await
    }

    pub async fn intraday(&self, params: IntradayBarRequest) -> Result<Response, BlpApiError> {
        tracing::info!(
            "intraday request: {} {} every {}m",
            params.ticker,
            params.event_type,
            params.interval
        );
        self.run("intraday", move |client| client.intraday(&params)).await
    }

    async fn run<F>(&self, label: &'static str, call: F) -> Result<Response, BlpApiError>
    where
        F: FnOnce(&Client) -> Result<Response, BlpApiError> + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        let task = tokio::task::spawn_blocking(move || call(&client));

        match tokio::time::timeout(self.request_timeout, task).await {
            Ok(Ok(result)) => {
                if let Err(e) = &result {
                    tracing::warn!("{label} request failed: {e}");
                }
                result
            }
            Ok(Err(join_err)) => {
                tracing::error!("{label} request task panicked: {join_err}");
                Err(BlpApiError::UnknownError(format!("{label} request task failed: {join_err}")))
            }
            Err(_) => {
                tracing::warn!("{label} request timed out after {:?}", self.request_timeout);
                Err(BlpApiError::Timeout(format!(
                    "{label} request did not complete within {:?}",
                    self.request_timeout
                )))
            }
        }
    }
}
