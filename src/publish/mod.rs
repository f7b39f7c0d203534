//! Publishing labels to the cluster control plane.
//!
//! This module provides the node access contract, its Kubernetes
//! implementation and the label synchronizer built on top of it.

pub mod api;
pub mod kube;
pub mod sync;

#[cfg(test)]
pub mod mock;

pub use api::{NodeApi, PublishError};
pub use kube::{KubeApi, KubeConfig};
pub use sync::advertise_labels;
