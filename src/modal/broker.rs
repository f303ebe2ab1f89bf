use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::{DialogKind, ModalOutcome, ModalRequest, ModalResultChannel};

const MODAL_CHANNEL_DEPTH: usize = 8;

/// A dialog waiting for the host to show it and report back.
#[derive(Debug)]
pub struct PendingModal {
    pub kind: DialogKind,
    pub request: ModalRequest,
    responder: oneshot::Sender<ModalOutcome>,
}

impl PendingModal {
    pub fn resolve(self, outcome: ModalOutcome) {
        if self.responder.send(outcome).is_err() {
            tracing::debug!(kind = ?self.kind, "modal requester went away before resolution");
        }
    }

    pub fn cancel(self) {
        self.resolve(ModalOutcome::Cancelled);
    }
}

/// Host side of a [`ModalBroker`]: receives dialogs to display.
#[derive(Debug)]
pub struct ModalHost {
    receiver: mpsc::Receiver<PendingModal>,
}

impl ModalHost {
    pub async fn next(&mut self) -> Option<PendingModal> {
        self.receiver.recv().await
    }

    pub fn try_next(&mut self) -> Option<PendingModal> {
        self.receiver.try_recv().ok()
    }
}

/// Session side of a request/response dialog channel. Each `open` sends one request and
/// waits on its own oneshot reply; a dropped reply or a closed host resolves as
/// [`ModalOutcome::Cancelled`].
#[derive(Debug, Clone)]
pub struct ModalBroker {
    sender: mpsc::Sender<PendingModal>,
}

impl ModalBroker {
    pub fn channel() -> (ModalBroker, ModalHost) {
        let (sender, receiver) = mpsc::channel(MODAL_CHANNEL_DEPTH);
        (ModalBroker { sender }, ModalHost { receiver })
    }
}

#[async_trait]
impl ModalResultChannel for ModalBroker {
    async fn open(&self, kind: DialogKind, request: ModalRequest) -> ModalOutcome {
        let (responder, reply) = oneshot::channel();
        let pending = PendingModal {
            kind,
            request,
            responder,
        };
        if self.sender.send(pending).await.is_err() {
            tracing::warn!(?kind, "modal host is gone; treating dialog as cancelled");
            return ModalOutcome::Cancelled;
        }
        reply.await.unwrap_or(ModalOutcome::Cancelled)
    }
}
