//! Node label synchronization.
//!
//! Reconciles the freshly discovered labels against the labels stored on the
//! node: every label in the reserved namespace is dropped, the new set is
//! added, and the node is written back once.

use super::api::{NodeApi, PublishError};
use crate::models::{Labels, LABEL_PREFIX};
use tracing::{debug, info};

/// Replace the node's reserved-namespace labels with `labels`.
///
/// Steps run in a fixed order: client, fetch, remove, add, persist. Any
/// failure stops the sequence before the write, so the node is either fully
/// updated or left as it was.
pub async fn advertise_labels<A: NodeApi>(api: &A, labels: &Labels) -> Result<(), PublishError> {
    let client = api.client().await?;
    let mut node = api.fetch_node(&client).await?;

    let before = node.labels.len();
    api.remove_labels(&mut node, LABEL_PREFIX);
    debug!(
        "Removed {} stale labels from node {}",
        before - node.labels.len(),
        node.name
    );

    api.add_labels(&mut node, labels);
    api.persist(&client, &node).await?;

    info!("Published {} labels to node {}", labels.len(), node.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{label_key, LABEL_VALUE};
    use crate::publish::mock::{Call, MockNodeApi};
    use std::collections::BTreeMap;

    fn fake_labels() -> Labels {
        ["testfeature1", "testfeature2", "testfeature3"]
            .iter()
            .map(|f| (label_key("testSource", f), LABEL_VALUE.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_advertise_success() {
        let api = MockNodeApi::new(BTreeMap::new());
        advertise_labels(&api, &fake_labels()).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![
                Call::Client,
                Call::FetchNode,
                Call::RemoveLabels(LABEL_PREFIX.to_string()),
                Call::AddLabels(fake_labels()),
                Call::Persist,
            ]
        );
        assert_eq!(api.stored_labels(), fake_labels());
    }

    #[tokio::test]
    async fn test_client_failure() {
        let api = MockNodeApi::new(BTreeMap::new()).fail_client();
        let err = advertise_labels(&api, &fake_labels()).await.unwrap_err();

        assert!(matches!(err, PublishError::Client(_)));
        assert_eq!(api.calls(), vec![Call::Client]);
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let api = MockNodeApi::new(BTreeMap::new()).fail_fetch();
        let err = advertise_labels(&api, &fake_labels()).await.unwrap_err();

        assert!(matches!(err, PublishError::FetchNode { .. }));
        assert_eq!(api.calls(), vec![Call::Client, Call::FetchNode]);
    }

    #[tokio::test]
    async fn test_persist_failure_commits_nothing() {
        let old: BTreeMap<String, String> = [(label_key("cpuid", "AVX"), "true".to_string())]
            .into_iter()
            .collect();
        let api = MockNodeApi::new(old.clone()).fail_persist();
        let err = advertise_labels(&api, &fake_labels()).await.unwrap_err();

        assert!(matches!(err, PublishError::Persist { .. }));
        assert_eq!(api.calls().last(), Some(&Call::Persist));
        assert_eq!(api.stored_labels(), old);
    }

    #[tokio::test]
    async fn test_reconciliation_replaces_reserved_namespace() {
        let old: BTreeMap<String, String> = [
            ("kubernetes.io/hostname", "worker-1"),
            ("team", "infra"),
            ("node.alpha.kubernetes-incubator.io/nfd-cpuid-AVX", "true"),
            ("node.alpha.kubernetes-incubator.io/nfd-gpu-present", "true"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let new: Labels = [label_key("cpuid", "AVX2"), label_key("cpuid", "AVX")]
            .into_iter()
            .map(|k| (k, LABEL_VALUE.to_string()))
            .collect();

        let api = MockNodeApi::new(old.clone());
        advertise_labels(&api, &new).await.unwrap();

        let mut expected: BTreeMap<String, String> = old
            .into_iter()
            .filter(|(k, _)| !k.starts_with(LABEL_PREFIX))
            .collect();
        expected.extend(new.clone());

        let stored = api.stored_labels();
        assert_eq!(stored, expected);
        assert!(!stored.contains_key(&label_key("gpu", "present")));
        assert_eq!(stored.get("team").map(String::as_str), Some("infra"));
    }

    #[tokio::test]
    async fn test_repeated_reconciliation_is_stable() {
        let api = MockNodeApi::new(BTreeMap::new());
        advertise_labels(&api, &fake_labels()).await.unwrap();
        let first = api.stored_labels();
        advertise_labels(&api, &fake_labels()).await.unwrap();
        assert_eq!(api.stored_labels(), first);
    }
}
