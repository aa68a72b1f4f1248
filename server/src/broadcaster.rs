use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use common::{ClientId, RoomId};
use tokio::sync::{Mutex, mpsc};
use tracing::warn;

use crate::protocol::ServerEvent;

pub type ClientSender = mpsc::Sender<ServerEvent>;

#[derive(Default)]
struct Registry {
    clients: HashMap<ClientId, ClientSender>,
    rooms: HashMap<RoomId, HashSet<ClientId>>,
}

/// Connected clients and the rooms they watch.
#[derive(Clone, Default)]
pub struct Broadcaster {
    registry: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster").finish()
    }
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, client_id: ClientId, sender: ClientSender) {
        self.registry.lock().await.clients.insert(client_id, sender);
    }

    /// Forgets the client and every room subscription it held.
    pub async fn unregister(&self, client_id: &ClientId) {
        let mut registry = self.registry.lock().await;
        registry.clients.remove(client_id);
        registry.rooms.retain(|_, members| {
            members.remove(client_id);
            !members.is_empty()
        });
    }

    pub async fn subscribe(&self, room_id: &RoomId, client_id: &ClientId) {
        self.registry
            .lock()
            .await
            .rooms
            .entry(room_id.clone())
            .or_default()
            .insert(client_id.clone());
    }

    pub async fn unsubscribe(&self, room_id: &RoomId, client_id: &ClientId) {
        let mut registry = self.registry.lock().await;
        if let Some(members) = registry.rooms.get_mut(room_id) {
            members.remove(client_id);
            if members.is_empty() {
                registry.rooms.remove(room_id);
            }
        }
    }

    pub async fn subscribers(&self, room_id: &RoomId) -> Vec<ClientId> {
        self.registry
            .lock()
            .await
            .rooms
            .get(room_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn subscriber_count(&self, room_id: &RoomId) -> usize {
        self.registry
            .lock()
            .await
            .rooms
            .get(room_id)
            .map_or(0, HashSet::len)
    }

    pub async fn send_to_client(&self, client_id: &ClientId, event: ServerEvent) {
        let sender = self.registry.lock().await.clients.get(client_id).cloned();
        if let Some(sender) = sender
            && let Err(e) = sender.send(event).await
        {
            warn!(client_id = %client_id, error = %e, "failed to send to client");
        }
    }

    pub async fn broadcast_to_room(&self, room_id: &RoomId, event: ServerEvent) {
        self.broadcast_to_room_with(room_id, |_| event.clone()).await;
    }

    /// Sends each subscriber its own event, e.g. `game_start` carrying the recipient's token.
    pub async fn broadcast_to_room_with<F>(&self, room_id: &RoomId, make_event: F)
    where
        F: Fn(&ClientId) -> ServerEvent,
    {
        let recipients: Vec<(ClientId, ClientSender)> = {
            let registry = self.registry.lock().await;
            let Some(members) = registry.rooms.get(room_id) else {
                return;
            };
            members
                .iter()
                .filter_map(|id| registry.clients.get(id).map(|tx| (id.clone(), tx.clone())))
                .collect()
        };

        for (client_id, sender) in recipients {
            if let Err(e) = sender.send(make_event(&client_id)).await {
                warn!(
                    room_id = %room_id,
                    client_id = %client_id,
                    error = %e,
                    "failed to send to subscriber"
                );
            }
        }
    }
}
