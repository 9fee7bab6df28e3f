use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope returned by every gateway endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    /// Error kind, e.g. "pillar not found".
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub violations: Vec<String>,
    #[serde(default)]
    pub details: Option<Value>,
    pub request_id: String,
    pub timestamp: String,
    pub api_version: String,
    pub ui_state: String,
    #[serde(default)]
    pub next_actions: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
}

pub struct GatewayClient {
    client: Client,
    gateway_url: String,
    prefix: String,
    headers: Vec<(String, String)>,
}

impl GatewayClient {
    pub fn new(gateway_url: &str) -> Self {
        Self {
            client: Client::new(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            prefix: "/api".to_string(),
            headers: Vec::new(),
        }
    }

    /// Use a non-default endpoint prefix (e.g. "/api/v1").
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    /// Send a header on every call, e.g. `X-User-Id`.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Call `{prefix}/{pillar}/{path}` with `params` as the JSON body.
    ///
    /// Non-2xx responses still return the envelope; only transport and
    /// decoding failures are errors.
    pub async fn call(
        &self,
        method: &str,
        pillar: &str,
        path: &str,
        params: Value,
    ) -> Result<ApiEnvelope, Box<dyn std::error::Error>> {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
        let url = format!("{}{}/{}/{}", self.gateway_url, self.prefix, pillar, path);

        let mut request = self.client.request(method, url).json(&params);
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        match serde_json::from_str::<ApiEnvelope>(&text) {
            Ok(envelope) => Ok(envelope),
            Err(e) => Err(format!("Gateway returned status {} with undecodable body: {} ({})", status, text, e).into()),
        }
    }

    pub async fn get(
        &self,
        pillar: &str,
        path: &str,
    ) -> Result<ApiEnvelope, Box<dyn std::error::Error>> {
        self.call("GET", pillar, path, Value::Object(Default::default()))
            .await
    }

    pub async fn post(
        &self,
        pillar: &str,
        path: &str,
        params: Value,
    ) -> Result<ApiEnvelope, Box<dyn std::error::Error>> {
        self.call("POST", pillar, path, params).await
    }
}
