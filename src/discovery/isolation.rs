//! Fault isolation for detector invocations.
//!
//! Each detector runs in its own blocking task. If it panics, the panic
//! stays inside that task and comes back to the caller as a
//! [`DetectorError::Panicked`] instead of unwinding through the agent.

use crate::detector::{Detector, DetectorError};
use crate::models::FeatureSet;
use std::any::Any;
use std::sync::Arc;
use tokio::task::JoinError;

/// Run `detector.discover()` in an isolated task.
pub async fn discover_isolated(detector: Arc<dyn Detector>) -> Result<FeatureSet, DetectorError> {
    let task = tokio::task::spawn_blocking(move || detector.discover());

    match task.await {
        Ok(result) => result,
        Err(e) => Err(join_error_to_detector_error(e)),
    }
}

fn join_error_to_detector_error(error: JoinError) -> DetectorError {
    if error.is_panic() {
        DetectorError::Panicked(panic_message(error.into_panic()))
    } else {
        DetectorError::Failed(format!("detector task did not complete: {}", error))
    }
}

/// Extract the message from a panic payload.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
