use std::time::Duration;

use tracing::info;

use crate::room_manager::RoomManager;

/// Periodically evicts rooms that nobody watches and nothing has touched for a while.
/// Evicted rooms stay in the store and come back on the next `join_room`.
pub struct CleanupTask {
    room_manager: RoomManager,
    check_interval: Duration,
    idle_timeout: Duration,
}

impl CleanupTask {
    pub fn new(
        room_manager: RoomManager,
        check_interval: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            room_manager,
            check_interval,
            idle_timeout,
        }
    }

    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.check_interval);

        loop {
            interval.tick().await;
            self.cleanup_idle_rooms().await;
        }
    }

    async fn cleanup_idle_rooms(&self) -> usize {
        let evicted = self.room_manager.evict_idle(self.idle_timeout).await;
        for room_id in &evicted {
            info!(room_id = %room_id, "evicted idle room");
        }
        evicted.len()
    }
}
