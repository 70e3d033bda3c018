use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

pub const SUITS: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Hearts => "♥",
            Self::Diamonds => "♦",
            Self::Clubs => "♣",
            Self::Spades => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Card values. 2..=14, where 14 is the ace (always high except in the
/// wheel straight).
pub type Value = u8;

/// A card is a tuple of a value and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            14 => "A",
            13 => "K",
            12 => "Q",
            11 => "J",
            v => &v.to_string(),
        };
        write!(f, "{value}{}", self.1)
    }
}

/// A deck holds all 52 cards and deals them off a cursor. `reset`
/// reshuffles in place and rewinds the cursor, so the full deck is
/// available again without reallocating.
#[derive(Debug)]
pub struct Deck {
    cards: [Card; constants::DECK_SIZE],
    next: usize,
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards = [Card(2, Suit::Hearts); constants::DECK_SIZE];
        for (i, value) in (2..=14u8).enumerate() {
            for (j, suit) in SUITS.into_iter().enumerate() {
                cards[4 * i + j] = Card(value, suit);
            }
        }
        Self { cards, next: 0 }
    }
}

impl Deck {
    /// Restore all 52 cards and shuffle uniformly.
    pub fn reset(&mut self) {
        self.cards.shuffle(&mut rand::rng());
        self.next = 0;
    }

    /// Deal the top card, if any remain.
    pub fn deal_card(&mut self) -> Option<Card> {
        let card = self.cards.get(self.next).copied();
        if card.is_some() {
            self.next += 1;
        }
        card
    }

    /// Deal up to `n` cards. Returns fewer only on exhaustion, which is a
    /// caller bug during normal play rather than a recoverable condition.
    pub fn deal(&mut self, n: usize) -> Vec<Card> {
        let take = n.min(constants::DECK_SIZE - self.next);
        let cards = self.cards[self.next..self.next + take].to_vec();
        self.next += take;
        cards
    }

    pub fn remaining(&self) -> usize {
        constants::DECK_SIZE - self.next
    }
}

/// Type alias for whole chips. Stacks and bets are unsigned, so they can
/// never go negative by construction.
pub type Chips = u32;

/// Caller-assigned user identifier, unique within a table.
pub type UserId = i64;

/// Room identifier, unique within a registry.
pub type RoomId = i64;

/// Seat positions around the table, `0..MAX_SEATS`.
pub type SeatIndex = usize;

pub const DEFAULT_SMALL_BLIND: Chips = 10;
pub const DEFAULT_BIG_BLIND: Chips = 2 * DEFAULT_SMALL_BLIND;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Blinds {
    pub small: Chips,
    pub big: Chips,
}

impl Default for Blinds {
    fn default() -> Self {
        Self {
            small: DEFAULT_SMALL_BLIND,
            big: DEFAULT_BIG_BLIND,
        }
    }
}

impl fmt::Display for Blinds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "${}/{}", self.small, self.big)
    }
}

/// Betting stages a hand moves through. `Waiting` and `Finished` bracket
/// the hand; the engine loops back to `Waiting` on reset.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Waiting,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Finished,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// A player's move when it is their turn. `Raise` carries the total bet
/// the raiser wants to be at, not the increment.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Fold,
    Check,
    Call,
    Raise(Chips),
    AllIn,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Fold => "folds".to_string(),
            Self::Check => "checks".to_string(),
            Self::Call => "calls".to_string(),
            Self::Raise(amount) => format!("raises to ${amount}"),
            Self::AllIn => "goes all-in".to_string(),
        };
        write!(f, "{repr}")
    }
}

/// Hand categories, weakest to strongest. The derived ordering is the
/// strength order.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum HandRank {
    HighCard = 1,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
            Self::RoyalFlush => "royal flush",
        };
        write!(f, "{repr}")
    }
}

/// A ranked five-card hand: the category plus its tie-break key. The
/// derived ordering compares `(rank, tiebreak)` lexicographically, which
/// is exactly the strength comparison between two hands.
#[derive(Clone, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HandValue {
    pub rank: HandRank,
    pub tiebreak: Vec<Value>,
}

/// Per-seat state for one player. Everything except `stack`, `seat`, and
/// `ready` is per-hand state, cleared by `reset_for_hand`.
#[derive(Clone, Debug)]
pub struct Player {
    pub id: UserId,
    pub name: String,
    pub stack: Chips,
    /// `None` means the player joined without picking a seat; they sort
    /// after every seated player.
    pub seat: Option<SeatIndex>,
    pub hole_cards: Vec<Card>,
    pub current_bet: Chips,
    pub total_bet: Chips,
    pub folded: bool,
    pub all_in: bool,
    pub active: bool,
    pub ready: bool,
    pub acted_this_round: bool,
}

impl Player {
    #[must_use]
    pub fn new(id: UserId, name: &str, stack: Chips, seat: Option<SeatIndex>) -> Self {
        Self {
            id,
            name: name.to_string(),
            stack,
            seat,
            hole_cards: Vec::with_capacity(constants::HOLE_CARDS),
            current_bet: 0,
            total_bet: 0,
            folded: false,
            all_in: false,
            active: true,
            ready: false,
            acted_this_round: false,
        }
    }

    /// Move up to `amount` chips from the stack into the bet counters,
    /// clamped so the stack never goes negative. Running out of chips
    /// marks the player all-in. Returns the amount actually moved.
    pub fn bet(&mut self, amount: Chips) -> Chips {
        let actual = amount.min(self.stack);
        self.stack -= actual;
        self.current_bet += actual;
        self.total_bet += actual;
        if self.stack == 0 {
            self.all_in = true;
        }
        actual
    }

    /// Terminal for the hand; seat and stack are kept.
    pub fn fold(&mut self) {
        self.folded = true;
        self.active = false;
    }

    /// Called at each stage transition, not at hand end.
    pub fn reset_for_round(&mut self) {
        self.current_bet = 0;
        self.acted_this_round = false;
    }

    /// Clear per-hand state. Stack, seat, and readiness survive.
    pub fn reset_for_hand(&mut self) {
        self.hole_cards.clear();
        self.current_bet = 0;
        self.total_bet = 0;
        self.folded = false;
        self.all_in = false;
        self.active = true;
        self.acted_this_round = false;
    }
}

/// One player's row in a table snapshot. `hole_cards` is populated only
/// for the player the snapshot was produced for.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PlayerSnapshot {
    pub id: UserId,
    pub name: String,
    pub stack: Chips,
    pub seat: Option<SeatIndex>,
    pub current_bet: Chips,
    pub total_bet: Chips,
    pub folded: bool,
    pub all_in: bool,
    pub active: bool,
    pub ready: bool,
    pub hole_cards: Vec<Card>,
}

/// A consistent copy of one table's public state, safe to serialize and
/// broadcast.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TableSnapshot {
    pub room_id: RoomId,
    pub stage: Stage,
    pub pot: Chips,
    pub current_bet: Chips,
    pub current_player: Option<UserId>,
    pub board: Vec<Card>,
    pub players: Vec<PlayerSnapshot>,
    pub finished: bool,
}

/// One contender's line in a hand result, strongest hand first.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResultEntry {
    pub id: UserId,
    pub name: String,
    pub hole_cards: Vec<Card>,
    pub rank: HandRank,
    pub tiebreak: Vec<Value>,
    pub winnings: Chips,
    pub stack: Chips,
    pub place: usize,
}

/// The outcome of one completed hand.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HandResult {
    pub pot: Chips,
    pub winner: UserId,
    pub entries: Vec<ResultEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_has_52_unique_cards() {
        use std::collections::BTreeSet;
        let mut deck = Deck::default();
        let cards: BTreeSet<Card> = deck.deal(52).into_iter().collect();
        assert_eq!(cards.len(), 52);
        assert_eq!(deck.remaining(), 0);
    }

    #[test]
    fn test_deck_deal_past_exhaustion_returns_remainder() {
        let mut deck = Deck::default();
        deck.deal(50);
        let tail = deck.deal(5);
        assert_eq!(tail.len(), 2);
        assert!(deck.deal(1).is_empty());
    }

    #[test]
    fn test_deck_reset_restores_all_cards() {
        let mut deck = Deck::default();
        deck.deal(20);
        deck.reset();
        assert_eq!(deck.remaining(), 52);
    }

    #[test]
    fn test_deck_values_in_range() {
        let mut deck = Deck::default();
        for card in deck.deal(52) {
            assert!((2..=14).contains(&card.0));
        }
    }

    #[test]
    fn test_card_display() {
        assert_eq!(Card(14, Suit::Spades).to_string(), "A♠");
        assert_eq!(Card(13, Suit::Hearts).to_string(), "K♥");
        assert_eq!(Card(12, Suit::Diamonds).to_string(), "Q♦");
        assert_eq!(Card(11, Suit::Clubs).to_string(), "J♣");
        assert_eq!(Card(10, Suit::Spades).to_string(), "10♠");
        assert_eq!(Card(2, Suit::Hearts).to_string(), "2♥");
    }

    #[test]
    fn test_card_serde_round_trip() {
        let card = Card(14, Suit::Spades);
        let json = serde_json::to_string(&card).unwrap();
        let back: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(card, back);
    }

    #[test]
    fn test_stage_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Stage::Preflop).unwrap(),
            "\"preflop\""
        );
        assert_eq!(
            serde_json::to_string(&Stage::Waiting).unwrap(),
            "\"waiting\""
        );
    }

    #[test]
    fn test_hand_rank_ordering() {
        assert!(HandRank::HighCard < HandRank::OnePair);
        assert!(HandRank::OnePair < HandRank::TwoPair);
        assert!(HandRank::TwoPair < HandRank::ThreeOfAKind);
        assert!(HandRank::ThreeOfAKind < HandRank::Straight);
        assert!(HandRank::Straight < HandRank::Flush);
        assert!(HandRank::Flush < HandRank::FullHouse);
        assert!(HandRank::FullHouse < HandRank::FourOfAKind);
        assert!(HandRank::FourOfAKind < HandRank::StraightFlush);
        assert!(HandRank::StraightFlush < HandRank::RoyalFlush);
    }

    #[test]
    fn test_hand_value_rank_dominates_tiebreak() {
        let two_pair = HandValue {
            rank: HandRank::TwoPair,
            tiebreak: vec![5, 4, 3],
        };
        let one_pair = HandValue {
            rank: HandRank::OnePair,
            tiebreak: vec![14, 13, 12, 11],
        };
        assert!(two_pair > one_pair);
    }

    #[test]
    fn test_hand_value_tiebreak_is_lexicographic() {
        let aces = HandValue {
            rank: HandRank::OnePair,
            tiebreak: vec![14, 13, 12, 11],
        };
        let kings = HandValue {
            rank: HandRank::OnePair,
            tiebreak: vec![13, 14, 12, 11],
        };
        assert!(aces > kings);
    }

    #[test]
    fn test_player_bet_moves_chips() {
        let mut player = Player::new(1, "alice", 100, Some(0));
        let moved = player.bet(30);
        assert_eq!(moved, 30);
        assert_eq!(player.stack, 70);
        assert_eq!(player.current_bet, 30);
        assert_eq!(player.total_bet, 30);
        assert!(!player.all_in);
    }

    #[test]
    fn test_player_bet_clamps_to_stack() {
        let mut player = Player::new(1, "bob", 25, Some(1));
        let moved = player.bet(100);
        assert_eq!(moved, 25);
        assert_eq!(player.stack, 0);
        assert!(player.all_in);
    }

    #[test]
    fn test_player_bet_conserves_chips() {
        let mut player = Player::new(1, "carol", 500, None);
        player.bet(120);
        player.bet(80);
        assert_eq!(player.stack + player.total_bet, 500);
    }

    #[test]
    fn test_player_fold_is_terminal() {
        let mut player = Player::new(1, "dave", 100, Some(2));
        player.fold();
        assert!(player.folded);
        assert!(!player.active);
        assert_eq!(player.stack, 100);
    }

    #[test]
    fn test_player_reset_for_round_keeps_total_bet() {
        let mut player = Player::new(1, "erin", 100, Some(3));
        player.bet(40);
        player.acted_this_round = true;
        player.reset_for_round();
        assert_eq!(player.current_bet, 0);
        assert!(!player.acted_this_round);
        assert_eq!(player.total_bet, 40);
    }

    #[test]
    fn test_player_reset_for_hand_keeps_stack_seat_ready() {
        let mut player = Player::new(7, "frank", 100, Some(4));
        player.ready = true;
        player.bet(60);
        player.fold();
        player.hole_cards = vec![Card(14, Suit::Spades), Card(13, Suit::Spades)];
        player.reset_for_hand();
        assert!(player.hole_cards.is_empty());
        assert_eq!(player.current_bet, 0);
        assert_eq!(player.total_bet, 0);
        assert!(!player.folded);
        assert!(!player.all_in);
        assert!(player.active);
        assert!(player.ready);
        assert_eq!(player.stack, 40);
        assert_eq!(player.seat, Some(4));
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Fold.to_string(), "folds");
        assert_eq!(Action::Raise(80).to_string(), "raises to $80");
    }

    #[test]
    fn test_action_serde() {
        assert_eq!(serde_json::to_string(&Action::Fold).unwrap(), "\"fold\"");
        assert_eq!(
            serde_json::to_string(&Action::Raise(40)).unwrap(),
            "{\"raise\":40}"
        );
        let back: Action = serde_json::from_str("{\"raise\":40}").unwrap();
        assert_eq!(back, Action::Raise(40));
    }

    #[test]
    fn test_blinds_display() {
        let blinds = Blinds { small: 5, big: 10 };
        assert_eq!(blinds.to_string(), "$5/10");
    }
}
