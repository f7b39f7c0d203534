//! Control-plane collaborator contract.

use crate::models::{Labels, Node};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while publishing labels to the control plane.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The API client could not be created.
    #[error("failed to create API client: {0}")]
    Client(String),

    /// The node object could not be fetched.
    #[error("failed to get node {node}: {reason}")]
    FetchNode { node: String, reason: String },

    /// The API returned something that is not a node.
    #[error("invalid node object for {node}: {reason}")]
    InvalidNode { node: String, reason: String },

    /// Writing the updated node back failed.
    #[error("failed to update node {node}: {reason}")]
    Persist { node: String, reason: String },
}

/// Access to this agent's node object in the control plane.
///
/// Label edits are in-memory mutations of a fetched node; only
/// [`NodeApi::persist`] writes anything.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Connection handle obtained once per synchronization.
    type Client: Send + Sync;

    /// Create a client for the control plane.
    async fn client(&self) -> Result<Self::Client, PublishError>;

    /// Fetch the node this agent runs on.
    async fn fetch_node(&self, client: &Self::Client) -> Result<Node, PublishError>;

    /// Remove every label whose key starts with `prefix`.
    fn remove_labels(&self, node: &mut Node, prefix: &str) {
        node.remove_labels(prefix);
    }

    /// Set or overwrite the given labels.
    fn add_labels(&self, node: &mut Node, labels: &Labels) {
        node.add_labels(labels);
    }

    /// Write the node back.
    async fn persist(&self, client: &Self::Client, node: &Node) -> Result<(), PublishError>;
}
