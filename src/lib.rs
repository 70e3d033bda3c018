//! # Hold'em Core
//!
//! A multiplayer Texas Hold'em rules engine. It tracks one table's cards,
//! seats, pot, and betting state, enforces legal actions, drives the stage
//! machine from blind posting through showdown, and evaluates best-5-of-7
//! hands to decide a winner.
//!
//! ## Architecture
//!
//! - [`game`]: the synchronous, pure engine — cards, players, hand
//!   evaluation, and the table state machine. No I/O, no blocking.
//! - [`table`]: the per-room serialization layer — one actor task per
//!   table plus a [`Registry`] mapping room ids to actors.
//!
//! Transport concerns (authentication, persistence, broadcasting
//! snapshots to participants) belong to the caller; the engine returns
//! typed results and serializable state copies and nothing else.
//!
//! ## Example
//!
//! ```
//! use holdem_core::{Action, Blinds, Stage, Table};
//!
//! let mut table = Table::new(1, Blinds { small: 10, big: 20 });
//! table.add_player(1, "alice", 1000, Some(0)).unwrap();
//! table.add_player(2, "bob", 1000, Some(1)).unwrap();
//! table.start_hand().unwrap();
//!
//! // Heads-up: the dealer posts the small blind and acts first.
//! assert_eq!(table.stage(), Stage::Preflop);
//! table.act(1, Action::Call).unwrap();
//! table.act(2, Action::Check).unwrap();
//! assert_eq!(table.stage(), Stage::Flop);
//! ```

/// Core game logic, entities, and the table state machine.
pub mod game;
pub use game::{
    Action, Blinds, Card, Chips, Deck, HandRank, HandResult, HandValue, Player, PlayerSnapshot,
    ResultEntry, RoomId, SeatIndex, Stage, Suit, Table, TableError, TableSnapshot, UserId, Value,
    constants, evaluate,
};

/// Per-room actors and the room registry.
pub mod table;
pub use table::{Registry, RegistryError, TableActor, TableHandle, TableMessage};
