use std::collections::HashMap;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::pubsub::protocol::ContractEvent;

#[derive(Debug, Clone)]
struct Subscriber {
    role_id: Uuid,
    sender: mpsc::UnboundedSender<ContractEvent>,
}

/// In-process fan-out of contract events, one room per contract.
#[derive(Default)]
pub struct Hub {
    rooms: RwLock<HashMap<Uuid, Vec<Subscriber>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `role_id` to the contract's room.
    pub async fn join(
        &self,
        contract_id: Uuid,
        role_id: Uuid,
    ) -> mpsc::UnboundedReceiver<ContractEvent> {
        let (sender, rx) = mpsc::unbounded_channel();

        let mut rooms = self.rooms.write().await;
        rooms
            .entry(contract_id)
            .or_default()
            .push(Subscriber { role_id, sender });

        rx
    }

    /// Drop one subscription of `role_id` (a role may hold several) and any
    /// subscriber whose receiver is gone. Returns how many remain in the room.
    pub async fn leave(&self, contract_id: Uuid, role_id: Uuid) -> usize {
        let mut rooms = self.rooms.write().await;

        let Some(room) = rooms.get_mut(&contract_id) else {
            return 0;
        };
        if let Some(pos) = room.iter().position(|s| s.role_id == role_id) {
            room.remove(pos);
        }
        room.retain(|s| !s.sender.is_closed());

        let remaining = room.len();
        if remaining == 0 {
            rooms.remove(&contract_id);
        }
        remaining
    }

    /// Deliver the event to its contract's room. Returns how many subscribers
    /// received it.
    pub async fn publish(&self, event: ContractEvent) -> usize {
        let rooms = self.rooms.read().await;
        let Some(room) = rooms.get(&event.contract_id()) else {
            return 0;
        };

        room.iter()
            .filter(|s| s.sender.send(event.clone()).is_ok())
            .count()
    }
}
