// Outbound side of the engine
// The engine never opens sockets; it hands requests to whatever transport it
// was constructed with.

use log::{debug, warn};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::models::UserId;
use crate::protocol::ClientRequest;

/// Handle the engine uses to reach the server.
///
/// `dispatch` must not block; replies come back later as inbound events.
pub trait Transport {
    fn dispatch(&self, request: ClientRequest);

    fn request_conversation(&self, other_user_id: UserId) {
        self.dispatch(ClientRequest::GetConversation(other_user_id));
    }

    fn request_contacts_refresh(&self) {
        self.dispatch(ClientRequest::GetContacts);
    }
}

/// Transport that queues requests on a bounded channel for a writer task.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<ClientRequest>,
}

impl ChannelTransport {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ClientRequest>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn dispatch(&self, request: ClientRequest) {
        let kind = request.kind();
        // try_send so a slow writer never stalls event handling
        match self.tx.try_send(request) {
            Ok(()) => debug!("Queued {} request", kind),
            Err(TrySendError::Full(_)) => warn!("Outbound queue full, dropping {} request", kind),
            Err(TrySendError::Closed(_)) => {
                warn!("Outbound queue closed, dropping {} request", kind)
            }
        }
    }
}
