//! Remote gateway API client
//!
//! Speaks a small JSON API:
//!
//! - `POST {base}/login` with `{"username", "password"}` returns `{"token"}`
//! - `GET {base}/gateways/{id}/mode` returns `{"mode": <name or code>}`
//! - `PUT {base}/gateways/{id}/mode` with `{"mode": <canonical name>}`
//!
//! Errors are mapped onto the reconciliation taxonomy at this boundary:
//! login problems become [`SwitcherError::Auth`], unreadable mode payloads
//! [`SwitcherError::ModeDecode`], and failed writes [`SwitcherError::Switch`].

use crate::config::DeviceConfig;
use crate::device::{DeviceClient, DeviceConnector, ModeReport};
use crate::error::{Result, SwitcherError};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::mode::Mode;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const USER_AGENT_VALUE: &str = concat!("modeswitch/", env!("APP_VERSION"));

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

#[derive(Deserialize)]
struct ModeResponse {
    mode: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct SetModeRequest {
    mode: Mode,
}

/// Builds authenticated sessions against the gateway API
pub struct CloudConnector {
    http: reqwest::Client,
    device: DeviceConfig,
}

impl CloudConnector {
    /// Create a connector; no network traffic happens until [`DeviceConnector::connect`]
    pub fn new(device: DeviceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(device.timeout_secs.max(1)))
            .build()?;
        Ok(Self { http, device })
    }

    fn base_url(&self) -> &str {
        self.device.base_url.trim_end_matches('/')
    }
}

#[async_trait::async_trait]
impl DeviceConnector for CloudConnector {
    async fn connect(&self) -> Result<Box<dyn DeviceClient>> {
        self.device.check_credentials()?;

        let logger = get_logger_with_context(
            LogContext::new("cloud").with_field("gateway", self.device.gateway_id.clone()),
        );
        logger.debug("Logging in to the gateway API");

        let url = format!("{}/login", self.base_url());
        let resp = self
            .http
            .post(&url)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, "application/json")
            .json(&LoginRequest {
                username: self.device.username.trim(),
                password: &self.device.password,
            })
            .send()
            .await
            .map_err(|e| SwitcherError::auth(format!("login request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(SwitcherError::auth(format!(
                "login rejected with status {}",
                resp.status()
            )));
        }

        let body: LoginResponse = resp
            .json()
            .await
            .map_err(|e| SwitcherError::auth(format!("unreadable login response: {}", e)))?;
        let token = body
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SwitcherError::auth("login response carried no token"))?;

        logger.info("Authenticated with the gateway API");
        Ok(Box::new(CloudGatewayClient {
            http: self.http.clone(),
            mode_url: format!("{}/gateways/{}/mode", self.base_url(), self.device.gateway_id.trim()),
            token,
            logger,
        }))
    }
}

/// An authenticated gateway session
pub struct CloudGatewayClient {
    http: reqwest::Client,
    mode_url: String,
    token: String,
    logger: StructuredLogger,
}

#[async_trait::async_trait]
impl DeviceClient for CloudGatewayClient {
    async fn get_mode(&self) -> Result<ModeReport> {
        let resp = self
            .http
            .get(&self.mode_url)
            .bearer_auth(&self.token)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;

        let body: ModeResponse = resp
            .json()
            .await
            .map_err(|e| SwitcherError::mode_decode(format!("malformed mode payload: {}", e)))?;
        let report = decode_mode_value(body.mode)?;
        self.logger.debug(&format!("Gateway reported mode {}", report));
        Ok(report)
    }

    async fn set_mode(&self, mode: Mode) -> Result<()> {
        self.logger.info(&format!("Requesting mode {}", mode));
        let resp = self
            .http
            .put(&self.mode_url)
            .bearer_auth(&self.token)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .json(&SetModeRequest { mode })
            .send()
            .await
            .map_err(|e| SwitcherError::switch(format!("request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(SwitcherError::switch(format!(
                "gateway answered {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

/// Interpret the `mode` field of a mode response
pub fn decode_mode_value(value: Option<serde_json::Value>) -> Result<ModeReport> {
    match value {
        Some(serde_json::Value::String(name)) => Ok(ModeReport::Name(name)),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .map(ModeReport::Code)
            .ok_or_else(|| SwitcherError::mode_decode(format!("non-integer mode code {}", n))),
        Some(other) => Err(SwitcherError::mode_decode(format!(
            "unexpected mode value {}",
            other
        ))),
        None => Err(SwitcherError::mode_decode("mode field missing")),
    }
}
