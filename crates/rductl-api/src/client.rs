// Batch gateway HTTP client
//
// Wraps `reqwest::Client` with session-token handling, endpoint URL
// construction and reply decoding. One client holds at most one gateway
// session; the token is dropped on release.

use std::sync::{PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{Credentials, SessionInfo};
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::wire::{BatchReply, BatchRequest, GatewayErrorBody, LoginReply, LoginRequest};

const SESSION_PATH: &str = "/api/v1/session";
const BATCH_PATH: &str = "/api/v1/batch";
const TOKEN_HEADER: &str = "X-Session-Token";

/// Raw HTTP client for the RDU batch gateway.
///
/// `login` opens a session and stores its token; `post_batch` sends one
/// batch and returns the undecoded reply; `release` ends the session.
pub struct RduClient {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
}

impl RduClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the gateway root, e.g. `https://rdu.example.net:49187`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            token: RwLock::new(None),
        }
    }

    /// Whether a session token is currently held.
    pub fn has_session(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Authenticate and open a gateway session.
    ///
    /// `POST /api/v1/session` with `{"username", "password"}`.
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionInfo, Error> {
        let url = self.endpoint(SESSION_PATH)?;
        debug!(%url, username = %credentials.username, "logging in");

        let body = LoginRequest {
            username: &credentials.username,
            password: credentials.password.expose_secret(),
        };

        let resp = self.http.post(url).json(&body).send().await?;
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: gateway_message(&body)
                    .unwrap_or_else(|| format!("login rejected (HTTP {status})")),
            });
        }

        let reply: LoginReply = Self::decode(resp).await?;
        *self.token.write().unwrap_or_else(PoisonError::into_inner) =
            Some(SecretString::from(reply.token));

        debug!(server_version = ?reply.server_version, "login successful");
        Ok(SessionInfo {
            server_version: reply.server_version,
        })
    }

    /// End the current session.
    ///
    /// `DELETE /api/v1/session`. The local token is dropped even when the
    /// gateway call fails, so a client is never released twice.
    pub async fn release(&self) -> Result<(), Error> {
        let Some(token) = self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return Err(Error::SessionReleased);
        };

        let url = self.endpoint(SESSION_PATH)?;
        debug!(%url, "releasing session");

        let resp = self
            .http
            .delete(url)
            .header(TOKEN_HEADER, token.expose_secret())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Gateway {
                message: gateway_message(&body).unwrap_or_else(|| truncate(&body)),
                status: status.as_u16(),
            });
        }

        debug!("session released");
        Ok(())
    }

    // ── Batches ──────────────────────────────────────────────────────

    /// Post one batch and return the gateway's reply.
    ///
    /// `POST /api/v1/batch`. A reply is returned whenever the gateway
    /// processed the batch, including batches whose status reports errors.
    pub async fn post_batch(&self, request: &BatchRequest) -> Result<BatchReply, Error> {
        let token = self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::SessionReleased)?;

        let url = self.endpoint(BATCH_PATH)?;
        debug!(
            batch_id = %request.batch_id,
            commands = request.commands.len(),
            activation = ?request.activation,
            "posting batch"
        );

        let resp = self
            .http
            .post(url)
            .header(TOKEN_HEADER, token.expose_secret())
            .json(request)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }

        let reply: BatchReply = Self::decode(resp).await?;
        trace!(batch_id = %reply.batch_id, error = reply.status.error, "batch reply");
        Ok(reply)
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    /// Check the status and decode a JSON body, keeping the raw body
    /// around for diagnostics when decoding fails.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Gateway {
                message: gateway_message(&body).unwrap_or_else(|| truncate(&body)),
                status: status.as_u16(),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", truncate(&body)),
            body,
        })
    }
}

/// Pull a human-readable message out of a `{"error": {...}}` body.
fn gateway_message(body: &str) -> Option<String> {
    let inner = serde_json::from_str::<GatewayErrorBody>(body).ok()?.error?;
    match (inner.code, inner.message) {
        (Some(code), Some(message)) => Some(format!("{code}: {message}")),
        (None, Some(message)) => Some(message),
        (Some(code), None) => Some(code),
        (None, None) => None,
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}
