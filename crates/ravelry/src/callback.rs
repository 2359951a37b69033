//! Single-shot delivery of an `AuthorizationResult` from the authorization
//! surface back to whoever is waiting on the flow.

use crate::request::AuthorizationResult;
use tokio::sync::oneshot;

pub struct CompletionSender {
    tx: oneshot::Sender<AuthorizationResult>,
}

pub struct CompletionReceiver {
    rx: oneshot::Receiver<AuthorizationResult>,
}

pub fn completion_channel() -> (CompletionSender, CompletionReceiver) {
    let (tx, rx) = oneshot::channel();
    (CompletionSender { tx }, CompletionReceiver { rx })
}

impl CompletionSender {
    /// Delivers the result. Consumes the sender so a flow completes once.
    pub fn complete(self, result: AuthorizationResult) {
        if self.tx.send(result).is_err() {
            tracing::debug!("Authorization result dropped, nobody is waiting");
        }
    }
}

impl CompletionReceiver {
    /// Resolves to `Cancelled` if the sender is dropped without completing.
    pub async fn wait(self) -> AuthorizationResult {
        self.rx.await.unwrap_or(AuthorizationResult::Cancelled)
    }
}
