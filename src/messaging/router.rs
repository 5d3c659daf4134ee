use super::event::RealtimeEvent;
use super::listeners::EventBus;
use super::packet::Packet;
use crate::client::ConnectionManager;
use crate::infrastructure::{Notification, Notifier, deliver};
use std::sync::Arc;

/// What the read loop should do after a packet was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Continue,
    /// The server ended the session
    Closed,
}

/// Routes inbound packets: heartbeats are answered, events go to
/// listeners and to the notifier.
pub struct MessageRouter {
    connection: Arc<ConnectionManager>,
    listeners: Arc<EventBus>,
    notifier: Arc<dyn Notifier>,
}

impl MessageRouter {
    pub fn new(
        connection: Arc<ConnectionManager>,
        listeners: Arc<EventBus>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            connection,
            listeners,
            notifier,
        }
    }

    pub async fn route(&self, packet: Packet) -> Routed {
        match packet {
            Packet::Ping => {
                if let Err(e) = self.connection.send_packet(&Packet::Pong).await {
                    tracing::warn!("Failed to answer heartbeat: {}", e);
                }
                Routed::Continue
            }
            Packet::Event { name, data } => {
                tracing::debug!(event = %name, "Received event");
                self.dispatch(&RealtimeEvent::from_wire(&name, data));
                Routed::Continue
            }
            Packet::Close => {
                tracing::info!("Server closed the Engine.IO session");
                Routed::Closed
            }
            Packet::Disconnect => {
                tracing::info!("Server disconnected the socket");
                Routed::Closed
            }
            Packet::ConnectError(message) => {
                tracing::warn!("Server rejected the socket: {}", message);
                Routed::Closed
            }
            other => {
                tracing::debug!("Ignoring packet {:?}", other);
                Routed::Continue
            }
        }
    }

    /// Shows the event's notification, if it has one, then runs listeners.
    pub fn dispatch(&self, event: &RealtimeEvent) {
        if let Some(notification) = Notification::for_event(event) {
            deliver(self.notifier.as_ref(), notification);
        }
        let handled = self.listeners.emit(event);
        tracing::trace!(event = %event.kind(), handled, "Event dispatched");
    }
}
