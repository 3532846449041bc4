//! Client configuration.

use std::time::Duration;

use base64::Engine;
use serde::Deserialize;

use crate::error::ClientError;
use crate::format::Format;
use crate::http::{ClientCert, TransportOptions};

/// Settings shared by every request a `RestClient` sends.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix for every request URL.
    pub base_url: Option<String>,
    /// Body format for outgoing parameters.
    pub request_format: Option<Format>,
    /// Expected response format; detected from `content-type` when unset.
    pub response_format: Option<Format>,
    /// Keep numeric list indices in undeclared-format encodings.
    pub build_indexed_queries: bool,
    /// Headers sent with every request; per-call headers override by name.
    pub default_headers: Vec<(String, String)>,
    pub user_agent: Option<String>,
    /// Header that carries a fresh idempotency key on every request.
    pub idempotency_header: Option<String>,
    pub transport: TransportOptions,
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Check the fields that can be wrong on their own.
    pub fn validate(&self) -> Result<(), ClientError> {
        if let Some(base) = &self.base_url {
            url::Url::parse(base).map_err(|e| ClientError::InvalidUrl(format!("{base}: {e}")))?;
        }
        Ok(())
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Base URL to compose all endpoints with.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn request_format(mut self, format: impl Into<Format>) -> Self {
        self.config.request_format = Some(format.into());
        self
    }

    pub fn response_format(mut self, format: impl Into<Format>) -> Self {
        self.config.response_format = Some(format.into());
        self
    }

    pub fn build_indexed_queries(mut self, enable: bool) -> Self {
        self.config.build_indexed_queries = enable;
        self
    }

    /// Add a header for all requests. Setting the same name twice replaces
    /// the earlier value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.config
            .default_headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.config.default_headers.push((name, value.into()));
        self
    }

    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        let credentials = format!("{username}:{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        self.header("Authorization", format!("Basic {encoded}"))
    }

    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Send a fresh idempotency key in `header` with every request.
    pub fn idempotency_header(mut self, header: impl Into<String>) -> Self {
        self.config.idempotency_header = Some(header.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.transport.connect_timeout = timeout;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.transport.timeout = Some(timeout);
        self
    }

    pub fn verify_tls(mut self, enable: bool) -> Self {
        self.config.transport.verify_tls = enable;
        self
    }

    pub fn client_cert(mut self, cert_path: impl Into<String>, key_path: Option<String>) -> Self {
        self.config.transport.client_cert = Some(ClientCert {
            cert_path: cert_path.into(),
            key_path,
        });
        self
    }

    /// Credentials for the transport's own authentication.
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.transport.credentials = Some((user.into(), password.into()));
        self
    }

    /// Build the configuration, rejecting an unparseable base URL.
    pub fn build(self) -> Result<ClientConfig, ClientError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
