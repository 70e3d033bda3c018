//! Table actor message types.

use tokio::sync::oneshot;

use crate::game::entities::{Action, Chips, HandResult, SeatIndex, TableSnapshot, UserId};
use crate::game::table::TableError;

type Reply<T> = oneshot::Sender<T>;

/// Commands a table actor understands. Every mutating command carries a
/// responder so the caller sees the engine's typed result.
#[derive(Debug)]
pub enum TableMessage {
    AddPlayer {
        id: UserId,
        name: String,
        stack: Chips,
        seat: Option<SeatIndex>,
        reply: Reply<Result<(), TableError>>,
    },

    RemovePlayer {
        id: UserId,
        reply: Reply<Result<(), TableError>>,
    },

    ChangeSeat {
        id: UserId,
        seat: SeatIndex,
        reply: Reply<Result<(), TableError>>,
    },

    /// Marks readiness; the actor auto-starts a hand once every player at
    /// a 2+ player table is ready.
    SetReady {
        id: UserId,
        ready: bool,
        reply: Reply<Result<(), TableError>>,
    },

    StartHand {
        reply: Reply<Result<(), TableError>>,
    },

    Act {
        id: UserId,
        action: Action,
        reply: Reply<Result<(), TableError>>,
    },

    /// Consistent state copy; hole cards only for `for_user`'s own row.
    Snapshot {
        for_user: Option<UserId>,
        reply: Reply<TableSnapshot>,
    },

    /// The most recent showdown payload, if a hand has finished and the
    /// table hasn't been reset yet.
    LastResult {
        reply: Reply<Option<HandResult>>,
    },

    /// Internal: sent by the actor's own timer after the post-hand
    /// viewing delay.
    ResetForNextHand,

    /// Stop the actor. The registry sends this on removal or overwrite.
    Close,
}
