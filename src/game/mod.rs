//! Core poker engine: entities, hand evaluation, and the table state
//! machine. Everything in here is synchronous and pure — no I/O, no
//! blocking — so it can sit behind whatever serialization discipline the
//! host picks (see the crate-level `table` module for the actor-based one).

pub mod constants;
pub mod entities;
pub mod eval;
pub mod table;

pub use entities::{
    Action, Blinds, Card, Chips, Deck, HandRank, HandResult, HandValue, Player, PlayerSnapshot,
    ResultEntry, RoomId, SeatIndex, Stage, Suit, TableSnapshot, UserId, Value,
};
pub use eval::evaluate;
pub use table::{Table, TableError};
