//! In-memory [`NodeApi`] that records every call.

use super::api::{NodeApi, PublishError};
use crate::models::{Labels, Node};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Client,
    FetchNode,
    RemoveLabels(String),
    AddLabels(Labels),
    Persist,
}

pub struct MockNodeApi {
    stored: Mutex<Node>,
    calls: Mutex<Vec<Call>>,
    fail_client: bool,
    fail_fetch: bool,
    fail_persist: bool,
}

impl MockNodeApi {
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self {
            stored: Mutex::new(Node::new("worker-1", labels)),
            calls: Mutex::new(Vec::new()),
            fail_client: false,
            fail_fetch: false,
            fail_persist: false,
        }
    }

    pub fn fail_client(mut self) -> Self {
        self.fail_client = true;
        self
    }

    pub fn fail_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn fail_persist(mut self) -> Self {
        self.fail_persist = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stored_labels(&self) -> BTreeMap<String, String> {
        self.stored.lock().unwrap().labels.clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl NodeApi for MockNodeApi {
    type Client = ();

    async fn client(&self) -> Result<(), PublishError> {
        self.record(Call::Client);
        if self.fail_client {
            return Err(PublishError::Client("fake error".to_string()));
        }
        Ok(())
    }

    async fn fetch_node(&self, _client: &()) -> Result<Node, PublishError> {
        self.record(Call::FetchNode);
        if self.fail_fetch {
            return Err(PublishError::FetchNode {
                node: "worker-1".to_string(),
                reason: "fake error".to_string(),
            });
        }
        Ok(self.stored.lock().unwrap().clone())
    }

    fn remove_labels(&self, node: &mut Node, prefix: &str) {
        self.record(Call::RemoveLabels(prefix.to_string()));
        node.remove_labels(prefix);
    }

    fn add_labels(&self, node: &mut Node, labels: &Labels) {
        self.record(Call::AddLabels(labels.clone()));
        node.add_labels(labels);
    }

    async fn persist(&self, _client: &(), node: &Node) -> Result<(), PublishError> {
        self.record(Call::Persist);
        if self.fail_persist {
            return Err(PublishError::Persist {
                node: node.name.clone(),
                reason: "fake error".to_string(),
            });
        }
        *self.stored.lock().unwrap() = node.clone();
        Ok(())
    }
}
