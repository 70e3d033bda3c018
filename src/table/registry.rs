//! Registry mapping room ids to their table actors.

use std::collections::HashMap;

use log::info;
use thiserror::Error;
use tokio::{sync::RwLock, time::Duration};

use super::actor::{DEFAULT_RESET_DELAY, RoomClosed, TableActor, TableHandle};
use super::messages::TableMessage;
use crate::game::entities::{
    Action, Blinds, Chips, HandResult, RoomId, SeatIndex, TableSnapshot, UserId,
};
use crate::game::table::TableError;

/// Errors from registry-level operations. Engine failures pass through
/// transparently.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum RegistryError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    #[error(transparent)]
    RoomClosed(#[from] RoomClosed),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Owns every table actor. Rooms are fully independent; the registry
/// only guards its own map, never a table.
pub struct Registry {
    tables: RwLock<HashMap<RoomId, TableHandle>>,
    reset_delay: Duration,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_reset_delay(DEFAULT_RESET_DELAY)
    }

    /// Mostly for tests, which don't want to wait out the viewing delay.
    #[must_use]
    pub fn with_reset_delay(reset_delay: Duration) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            reset_delay,
        }
    }

    /// Create and spawn a table for `room_id`, replacing (and closing)
    /// any existing one.
    pub async fn create(&self, room_id: RoomId, small_blind: Chips, big_blind: Chips) -> TableHandle {
        let blinds = Blinds {
            small: small_blind,
            big: big_blind,
        };
        let (actor, handle) = TableActor::new(room_id, blinds, self.reset_delay);
        tokio::spawn(actor.run());

        let previous = {
            let mut tables = self.tables.write().await;
            tables.insert(room_id, handle.clone())
        };
        if let Some(old) = previous {
            let _ = old.send(TableMessage::Close).await;
        }

        info!("registry: created table for room {room_id} ({blinds})");
        handle
    }

    pub async fn get(&self, room_id: RoomId) -> Option<TableHandle> {
        let tables = self.tables.read().await;
        tables.get(&room_id).cloned()
    }

    /// Close and forget the table for `room_id`, if any.
    pub async fn remove(&self, room_id: RoomId) {
        let handle = {
            let mut tables = self.tables.write().await;
            tables.remove(&room_id)
        };
        if let Some(handle) = handle {
            let _ = handle.send(TableMessage::Close).await;
            info!("registry: removed table for room {room_id}");
        }
    }

    pub async fn room_count(&self) -> usize {
        let tables = self.tables.read().await;
        tables.len()
    }

    async fn handle(&self, room_id: RoomId) -> Result<TableHandle, RegistryError> {
        self.get(room_id)
            .await
            .ok_or(RegistryError::RoomNotFound(room_id))
    }

    // Typed wrappers over the message protocol, one per engine
    // operation, so transport code never builds oneshot plumbing.

    pub async fn add_player(
        &self,
        room_id: RoomId,
        id: UserId,
        name: &str,
        stack: Chips,
        seat: Option<SeatIndex>,
    ) -> Result<(), RegistryError> {
        let name = name.to_string();
        let result = self
            .handle(room_id)
            .await?
            .request(|reply| TableMessage::AddPlayer {
                id,
                name,
                stack,
                seat,
                reply,
            })
            .await?;
        Ok(result?)
    }

    pub async fn remove_player(&self, room_id: RoomId, id: UserId) -> Result<(), RegistryError> {
        let result = self
            .handle(room_id)
            .await?
            .request(|reply| TableMessage::RemovePlayer { id, reply })
            .await?;
        Ok(result?)
    }

    pub async fn change_seat(
        &self,
        room_id: RoomId,
        id: UserId,
        seat: SeatIndex,
    ) -> Result<(), RegistryError> {
        let result = self
            .handle(room_id)
            .await?
            .request(|reply| TableMessage::ChangeSeat { id, seat, reply })
            .await?;
        Ok(result?)
    }

    pub async fn set_ready(
        &self,
        room_id: RoomId,
        id: UserId,
        ready: bool,
    ) -> Result<(), RegistryError> {
        let result = self
            .handle(room_id)
            .await?
            .request(|reply| TableMessage::SetReady { id, ready, reply })
            .await?;
        Ok(result?)
    }

    pub async fn start_hand(&self, room_id: RoomId) -> Result<(), RegistryError> {
        let result = self
            .handle(room_id)
            .await?
            .request(|reply| TableMessage::StartHand { reply })
            .await?;
        Ok(result?)
    }

    pub async fn act(
        &self,
        room_id: RoomId,
        id: UserId,
        action: Action,
    ) -> Result<(), RegistryError> {
        let result = self
            .handle(room_id)
            .await?
            .request(|reply| TableMessage::Act { id, action, reply })
            .await?;
        Ok(result?)
    }

    pub async fn snapshot(
        &self,
        room_id: RoomId,
        for_user: Option<UserId>,
    ) -> Result<TableSnapshot, RegistryError> {
        Ok(self
            .handle(room_id)
            .await?
            .request(|reply| TableMessage::Snapshot { for_user, reply })
            .await?)
    }

    pub async fn last_result(
        &self,
        room_id: RoomId,
    ) -> Result<Option<HandResult>, RegistryError> {
        Ok(self
            .handle(room_id)
            .await?
            .request(|reply| TableMessage::LastResult { reply })
            .await?)
    }
}
