//! Approve/deny gate
//!
//! Polls for a pending image and, once one is shown, stops asking until the
//! user approves or denies it. A successful decision clears the image and
//! triggers exactly one immediate fetch; a failed decision leaves it in place.

use std::future::Future;
use std::time::Duration;

use super::{ArtifactSource, PollState, PollTarget, Poller};
use crate::auth::validate_approval;
use crate::error::{ClientError, ValidationError};
use crate::models::{ApprovalForm, ArtifactReference, Decision};

/// Endpoint pair that resolves a pending image
pub trait ApprovalResolver: Send + Sync + 'static {
    fn approve(
        &self,
        form: &ApprovalForm,
        image_url: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn deny(&self) -> impl Future<Output = Result<(), ClientError>> + Send;
}

pub struct ApprovalGate<S: ArtifactSource + ApprovalResolver> {
    poller: Poller<S>,
    interval: Duration,
    // one decision at a time
    resolving: tokio::sync::Mutex<()>,
}

impl<S: ArtifactSource + ApprovalResolver> ApprovalGate<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        ApprovalGate {
            poller: Poller::with_hold(source),
            interval,
            resolving: tokio::sync::Mutex::new(()),
        }
    }

    pub fn start(&self) {
        self.poller.start(PollTarget::Image, self.interval);
    }

    pub fn stop(&self) {
        self.poller.stop();
    }

    /// Called whenever a new image starts waiting for a decision
    pub fn on_pending<F>(&self, observer: F)
    where
        F: Fn(&ArtifactReference) + Send + Sync + 'static,
    {
        self.poller.on_update(observer);
    }

    /// The image waiting for a decision, if any
    pub fn pending(&self) -> Option<ArtifactReference> {
        let state = self.poller.state();
        if state.held {
            state.current
        } else {
            None
        }
    }

    pub fn state(&self) -> PollState {
        self.poller.state()
    }

    pub async fn approve(&self, form: &ApprovalForm) -> Result<(), ClientError> {
        validate_approval(form)?;
        let _guard = self.resolving.lock().await;
        let pending = self.pending().ok_or(ValidationError::NothingPending)?;

        self.poller
            .source()
            .approve(form, &pending.locator)
            .await?;
        self.resolved(Decision::Approved, &pending);
        Ok(())
    }

    pub async fn deny(&self) -> Result<(), ClientError> {
        let _guard = self.resolving.lock().await;
        let pending = self.pending().ok_or(ValidationError::NothingPending)?;

        self.poller.source().deny().await?;
        self.resolved(Decision::Denied, &pending);
        Ok(())
    }

    fn resolved(&self, decision: Decision, artifact: &ArtifactReference) {
        tracing::info!(decision = decision.as_str(), locator = %artifact.locator, "Approval resolved");
        self.poller.release();
    }
}
