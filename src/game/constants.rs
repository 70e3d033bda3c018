//! Table-wide constants.

/// Maximum number of seats at a table.
pub const MAX_SEATS: usize = 9;

/// Number of cards in a standard deck.
pub const DECK_SIZE: usize = 52;

/// Community cards dealt over a full hand (flop + turn + river).
pub const BOARD_SIZE: usize = 5;

/// Hole cards dealt to each player.
pub const HOLE_CARDS: usize = 2;
