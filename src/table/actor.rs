//! Table actor: owns one table and serializes every operation on it.
//!
//! All mutation of a table flows through its actor's inbox, so the
//! betting-round and turn-order invariants never see interleaved writes.
//! Different rooms run as independent tasks with nothing shared.

use log::{info, warn};
use tokio::{
    sync::{mpsc, oneshot},
    time::Duration,
};

use super::messages::TableMessage;
use crate::game::entities::{Blinds, RoomId, Stage};
use crate::game::table::Table;

/// How long finished-hand state stays visible before the table resets.
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(8);

const INBOX_CAPACITY: usize = 100;

/// Cloneable sender half of a table actor.
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    room_id: RoomId,
}

/// The receiving side reports a closed table this way.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("room {0} is closed")]
pub struct RoomClosed(pub RoomId);

impl TableHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Queue a message for the actor. Fails only when the actor has
    /// stopped.
    pub async fn send(&self, message: TableMessage) -> Result<(), RoomClosed> {
        self.sender
            .send(message)
            .await
            .map_err(|_| RoomClosed(self.room_id))
    }

    /// Send a message built around a oneshot responder and await the
    /// reply.
    pub(crate) async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> TableMessage,
    ) -> Result<T, RoomClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_| RoomClosed(self.room_id))
    }
}

/// Actor wrapping a [`Table`]. Spawn with `tokio::spawn(actor.run())`.
pub struct TableActor {
    table: Table,
    inbox: mpsc::Receiver<TableMessage>,
    /// Clone of our own sender, used to schedule the delayed reset.
    sender: mpsc::Sender<TableMessage>,
    reset_delay: Duration,
    reset_pending: bool,
}

impl TableActor {
    #[must_use]
    pub fn new(room_id: RoomId, blinds: Blinds, reset_delay: Duration) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let actor = Self {
            table: Table::new(room_id, blinds),
            inbox,
            sender: sender.clone(),
            reset_delay,
            reset_pending: false,
        };
        let handle = TableHandle { sender, room_id };
        (actor, handle)
    }

    /// Drain the inbox until the table is closed.
    pub async fn run(mut self) {
        let room_id = self.table.room_id();
        info!("room {room_id}: table actor started ({})", self.table.blinds());

        while let Some(message) = self.inbox.recv().await {
            if self.handle_message(message) {
                break;
            }
            // A finished hand stays on display for a while, then the
            // timer below sends the reset. The actor keeps serving
            // snapshots and seat changes in the meantime.
            if self.table.stage() == Stage::Finished && !self.reset_pending {
                self.schedule_reset();
            }
        }

        info!("room {room_id}: table actor stopped");
    }

    /// Returns true when the actor should shut down.
    fn handle_message(&mut self, message: TableMessage) -> bool {
        match message {
            TableMessage::AddPlayer {
                id,
                name,
                stack,
                seat,
                reply,
            } => {
                let _ = reply.send(self.table.add_player(id, &name, stack, seat));
            }

            TableMessage::RemovePlayer { id, reply } => {
                let _ = reply.send(self.table.remove_player(id));
            }

            TableMessage::ChangeSeat { id, seat, reply } => {
                let _ = reply.send(self.table.change_seat(id, seat));
            }

            TableMessage::SetReady { id, ready, reply } => {
                let result = self.table.set_ready(id, ready);
                if result.is_ok() {
                    self.maybe_start_hand();
                }
                let _ = reply.send(result);
            }

            TableMessage::StartHand { reply } => {
                let _ = reply.send(self.table.start_hand());
            }

            TableMessage::Act { id, action, reply } => {
                let _ = reply.send(self.table.act(id, action));
            }

            TableMessage::Snapshot { for_user, reply } => {
                let _ = reply.send(self.table.snapshot(for_user));
            }

            TableMessage::LastResult { reply } => {
                let _ = reply.send(self.table.last_result().cloned());
            }

            TableMessage::ResetForNextHand => {
                self.reset_pending = false;
                if self.table.stage() == Stage::Finished {
                    self.table.reset_for_next_hand();
                }
            }

            TableMessage::Close => return true,
        }
        false
    }

    /// Start a hand once everyone at a 2+ player table is ready.
    fn maybe_start_hand(&mut self) {
        if self.table.stage() == Stage::Waiting
            && self.table.all_ready()
            && let Err(e) = self.table.start_hand()
        {
            warn!(
                "room {}: auto-start failed: {e}",
                self.table.room_id()
            );
        }
    }

    /// Spawn a timer that sends the reset message later. The table stays
    /// fully available while the timer runs; nothing holds it.
    fn schedule_reset(&mut self) {
        self.reset_pending = true;
        let sender = self.sender.clone();
        let delay = self.reset_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(TableMessage::ResetForNextHand).await;
        });
    }
}
