//! Unload-time exit patch.

use analytics_core::{BeaconTransport, Error, Result, VisitExit, VisitId};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Client;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::config::RestConfig;
use crate::status::{from_status, from_transport, Operation};

/// Fire-and-forget `PATCH visits?id=eq.<id>`.
///
/// Uses its own client with a short timeout and attaches the auth header to
/// each request, so it does not depend on the state of the awaited client.
#[derive(Clone)]
pub struct BeaconClient {
    http: Client,
    url: String,
    api_key: Option<HeaderValue>,
    bearer: Option<HeaderValue>,
}

impl BeaconClient {
    pub fn new(config: &RestConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.beacon_timeout())
            .build()
            .map_err(|e| Error::internal(format!("Failed to create beacon client: {}", e)))?;

        let header = |value: String| {
            HeaderValue::from_str(&value)
                .map_err(|_| Error::internal("API key is not a valid header value"))
        };
        let (api_key, bearer) = if config.api_key.is_empty() {
            (None, None)
        } else {
            (
                Some(header(config.api_key.clone())?),
                Some(header(format!("Bearer {}", config.api_key))?),
            )
        };

        Ok(Self {
            http,
            url: config.table_url(&config.visits_table),
            api_key,
            bearer,
        })
    }

    fn request(&self, visit_id: &VisitId, exit: &VisitExit) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .patch(&self.url)
            .query(&[("id", format!("eq.{}", visit_id))])
            .header("Prefer", "return=minimal")
            .json(exit);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key.clone());
        }
        if let Some(bearer) = &self.bearer {
            request = request.header(AUTHORIZATION, bearer.clone());
        }
        request
    }
}

impl BeaconTransport for BeaconClient {
    fn send_exit(&self, visit_id: &VisitId, exit: &VisitExit) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            warn!(visit_id = %visit_id, "No async runtime, exit not sent");
            return false;
        };

        let request = self.request(visit_id, exit);
        let visit_id = visit_id.clone();
        runtime.spawn(async move {
            let result = match request.send().await {
                Ok(response) if response.status().is_success() => Ok(()),
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    Err(from_status(Operation::Write, status, &body))
                }
                Err(e) => Err(from_transport(Operation::Write, &e)),
            };

            match result {
                Ok(()) => debug!(visit_id = %visit_id, "Exit delivered"),
                Err(e) => warn!(visit_id = %visit_id, error = %e, "Exit delivery failed"),
            }
        });
        true
    }
}
