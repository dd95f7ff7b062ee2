//! HTTP client for the WhatsApp bridge.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    ClientError, ConnectionEvent, ConnectionSource, ConnectionState, ConnectionTracker,
    ExistenceResult, MessagingClient, StatusRecord,
};
use crate::config::WhatsAppConfig;
use crate::numbers::{Address, mask_phone};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionResponse {
    state: String,
    #[serde(default)]
    logged_out: bool,
}

#[derive(Debug, Serialize)]
struct ConnectRequest<'a> {
    session: &'a str,
}

#[derive(Debug, Serialize)]
struct ExistsRequest<'a> {
    jids: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ExistsEntry {
    jid: String,
    #[serde(default)]
    exists: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    set_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct PairingRequest<'a> {
    phone: &'a str,
}

#[derive(Debug, Deserialize)]
struct PairingResponse {
    code: String,
}

/// Messaging client backed by the WhatsApp HTTP bridge.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: String,
    session_name: String,
    tracker: ConnectionTracker,
}

impl GatewayClient {
    /// Creates a client for the configured bridge.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &WhatsAppConfig, tracker: ConnectionTracker) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.gateway_url.trim_end_matches('/').to_owned(),
            session_name: config.session_name.clone(),
            tracker,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Turns non-2xx responses into [`ClientError::Status`].
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl MessagingClient for GatewayClient {
    fn connection_state(&self) -> ConnectionState {
        self.tracker.current()
    }

    async fn check_exists(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<ExistenceResult>, ClientError> {
        debug!("Checking registration for {} addresses", addresses.len());

        let request = ExistsRequest {
            jids: addresses.iter().map(Address::as_str).collect(),
        };
        let response = self
            .http
            .post(self.url("/on-whatsapp"))
            .json(&request)
            .send()
            .await?;
        let entries: Vec<ExistsEntry> = ensure_success(response).await?.json().await?;

        Ok(entries
            .into_iter()
            .map(|entry| ExistenceResult {
                address: Address::for_number(
                    entry.jid.split('@').next().unwrap_or(&entry.jid),
                ),
                exists: entry.exists,
            })
            .collect())
    }

    async fn fetch_status(&self, address: &Address) -> Result<StatusRecord, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/status/{address}")))
            .send()
            .await?;
        let status: StatusResponse = ensure_success(response).await?.json().await?;

        Ok(StatusRecord {
            text: status.status,
            set_at: status.set_at,
        })
    }

    async fn request_pairing_code(&self, phone: &str) -> Result<String, ClientError> {
        info!("Requesting pairing code for {}", mask_phone(phone));

        let response = self
            .http
            .post(self.url("/pairing-code"))
            .json(&PairingRequest { phone })
            .send()
            .await?;
        let pairing: PairingResponse = ensure_success(response).await?.json().await?;
        Ok(pairing.code)
    }
}

#[async_trait]
impl ConnectionSource for GatewayClient {
    async fn poll(&self) -> Result<ConnectionEvent, ClientError> {
        let response = self.http.get(self.url("/connection")).send().await?;
        let body: ConnectionResponse = ensure_success(response).await?.json().await?;
        connection_event(&body)
    }

    async fn reconnect(&self) -> Result<(), ClientError> {
        info!("Asking bridge to reconnect session '{}'", self.session_name);

        let response = self
            .http
            .post(self.url("/connect"))
            .json(&ConnectRequest {
                session: &self.session_name,
            })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

fn connection_event(body: &ConnectionResponse) -> Result<ConnectionEvent, ClientError> {
    let state = ConnectionState::from_bridge(&body.state).ok_or_else(|| {
        ClientError::InvalidResponse(format!("unknown connection state '{}'", body.state))
    })?;

    Ok(match state {
        ConnectionState::Open => ConnectionEvent::Opened,
        ConnectionState::Connecting => ConnectionEvent::Connecting,
        ConnectionState::Closed => ConnectionEvent::Closed {
            logged_out: body.logged_out,
        },
    })
}
