//! Kubernetes API server client.
//!
//! Talks to the core/v1 Node endpoint over HTTPS using the pod's service
//! account credentials. The node is fetched and written back as a whole
//! JSON object, so fields this agent does not know about survive the update
//! and the `resourceVersion` guards against overwriting a newer object.

use super::api::{NodeApi, PublishError};
use crate::models::Node;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Default service account mount inside a pod.
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Settings for reaching the API server.
#[derive(Debug, Clone)]
pub struct KubeConfig {
    /// API server base URL. Falls back to the in-cluster service env vars.
    pub api_server: Option<String>,
    /// Name of the node to label.
    pub node_name: Option<String>,
    /// Bearer token file.
    pub token_path: PathBuf,
    /// CA bundle used to verify the API server.
    pub ca_path: PathBuf,
    /// Request timeout.
    pub timeout: Duration,
}

impl From<&crate::config::KubernetesConfig> for KubeConfig {
    fn from(config: &crate::config::KubernetesConfig) -> Self {
        Self {
            api_server: config.api_server.clone(),
            node_name: config.node_name.clone(),
            token_path: config.token_path.clone(),
            ca_path: config.ca_path.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

/// Connection to the API server, created once per synchronization.
pub struct KubeClient {
    http: reqwest::Client,
    node_url: String,
    node_name: String,
    token: Option<String>,
}

impl KubeClient {
    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        let request = self.http.request(method, &self.node_url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// [`NodeApi`] backed by the Kubernetes REST API.
pub struct KubeApi {
    config: KubeConfig,
}

impl KubeApi {
    pub fn new(config: KubeConfig) -> Self {
        Self { config }
    }

    fn api_server(&self) -> Result<String, PublishError> {
        if let Some(server) = &self.config.api_server {
            return Ok(server.trim_end_matches('/').to_string());
        }

        server_from_env(
            std::env::var("KUBERNETES_SERVICE_HOST").ok(),
            std::env::var("KUBERNETES_SERVICE_PORT").ok(),
        )
        .ok_or_else(|| {
            PublishError::Client(
                "no API server configured and KUBERNETES_SERVICE_HOST is not set".to_string(),
            )
        })
    }

    fn read_token(&self) -> Result<Option<String>, PublishError> {
        let path = &self.config.token_path;
        if !path.exists() {
            debug!("No service account token at {}", path.display());
            return Ok(None);
        }

        std::fs::read_to_string(path)
            .map(|token| Some(token.trim().to_string()))
            .map_err(|e| {
                PublishError::Client(format!("failed to read token {}: {}", path.display(), e))
            })
    }

    fn build_http_client(&self) -> Result<reqwest::Client, PublishError> {
        let mut builder = reqwest::Client::builder().timeout(self.config.timeout);

        let ca_path = &self.config.ca_path;
        if ca_path.exists() {
            let pem = std::fs::read(ca_path).map_err(|e| {
                PublishError::Client(format!("failed to read CA {}: {}", ca_path.display(), e))
            })?;
            let certificate = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| PublishError::Client(format!("invalid CA bundle: {}", e)))?;
            builder = builder.add_root_certificate(certificate);
        }

        builder
            .build()
            .map_err(|e| PublishError::Client(e.to_string()))
    }
}

/// Build the in-cluster API server URL from the service env vars.
fn server_from_env(host: Option<String>, port: Option<String>) -> Option<String> {
    let host = host.filter(|h| !h.is_empty())?;
    let port = port.unwrap_or_else(|| "443".to_string());

    if host.contains(':') {
        Some(format!("https://[{}]:{}", host, port))
    } else {
        Some(format!("https://{}:{}", host, port))
    }
}

fn node_url(server: &str, node_name: &str) -> String {
    format!("{}/api/v1/nodes/{}", server, node_name)
}

/// Turn a non-success response into an error message with the body.
async fn response_error(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, body.trim())
    }
}

#[async_trait]
impl NodeApi for KubeApi {
    type Client = KubeClient;

    async fn client(&self) -> Result<KubeClient, PublishError> {
        let node_name = self
            .config
            .node_name
            .clone()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| PublishError::Client("node name is not set (NODE_NAME)".to_string()))?;

        let server = self.api_server()?;
        let token = self.read_token()?;
        let http = self.build_http_client()?;

        debug!("Using API server {}", server);

        Ok(KubeClient {
            http,
            node_url: node_url(&server, &node_name),
            node_name,
            token,
        })
    }

    async fn fetch_node(&self, client: &KubeClient) -> Result<Node, PublishError> {
        let fetch_error = |reason: String| PublishError::FetchNode {
            node: client.node_name.clone(),
            reason,
        };

        let response = client
            .request(reqwest::Method::GET)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_error(response_error(response).await));
        }

        let object: Value = response
            .json()
            .await
            .map_err(|e| fetch_error(format!("failed to decode response: {}", e)))?;

        Node::from_object(object).ok_or_else(|| PublishError::InvalidNode {
            node: client.node_name.clone(),
            reason: "missing metadata.name".to_string(),
        })
    }

    async fn persist(&self, client: &KubeClient, node: &Node) -> Result<(), PublishError> {
        let persist_error = |reason: String| PublishError::Persist {
            node: node.name.clone(),
            reason,
        };

        let response = client
            .request(reqwest::Method::PUT)
            .json(&node.to_object())
            .send()
            .await
            .map_err(|e| persist_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(persist_error(response_error(response).await));
        }

        info!("Node {} updated", node.name);
        Ok(())
    }
}
