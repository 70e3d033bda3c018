//! The table state machine: seating, blinds, turn order, betting rounds,
//! stage advancement, showdown, and dealer rotation.

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{BOARD_SIZE, HOLE_CARDS, MAX_SEATS};
use super::entities::{
    Action, Blinds, Card, Chips, Deck, HandResult, HandValue, Player, PlayerSnapshot, ResultEntry,
    RoomId, SeatIndex, Stage, TableSnapshot, UserId,
};
use super::eval;

/// Errors returned by table operations. Every failure leaves the table
/// untouched.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum TableError {
    #[error("not your turn")]
    OutOfTurn,
    #[error("already folded or not in the hand")]
    NotInHand,
    #[error("raise must be at least ${min}")]
    IllegalRaise { min: Chips },
    #[error("can't check with ${owed} outstanding")]
    IllegalCheck { owed: Chips },
    #[error("seat is taken or out of range")]
    SeatUnavailable,
    #[error("table is full")]
    TableFull,
    #[error("no such player")]
    UnknownPlayer,
    #[error("need 2+ players")]
    NotEnoughPlayers,
    #[error("not allowed during the {0} stage")]
    WrongStage(Stage),
}

/// One poker table. All mutation goes through the operation methods, which
/// never block and never perform I/O; callers are responsible for
/// serializing access per room (see the `table` actor module).
#[derive(Debug)]
pub struct Table {
    room_id: RoomId,
    blinds: Blinds,
    /// Sorted by (seat-or-last, id); unseated players trail.
    players: Vec<Player>,
    deck: Deck,
    board: Vec<Card>,
    pot: Chips,
    current_bet: Chips,
    /// Index into `players`, not a seat number.
    current_player_idx: usize,
    /// The dealer marker is a seat position, not an index, so it survives
    /// seat-list reordering between hands.
    dealer_seat: Option<SeatIndex>,
    stage: Stage,
    finished: bool,
    last_result: Option<HandResult>,
    /// Set until the first hand ever pins the initial dealer.
    first_hand: bool,
}

impl Table {
    #[must_use]
    pub fn new(room_id: RoomId, blinds: Blinds) -> Self {
        Self {
            room_id,
            blinds,
            players: Vec::with_capacity(MAX_SEATS),
            deck: Deck::default(),
            board: Vec::with_capacity(BOARD_SIZE),
            pot: 0,
            current_bet: 0,
            current_player_idx: 0,
            dealer_seat: None,
            stage: Stage::Waiting,
            finished: false,
            last_result: None,
            first_hand: true,
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn blinds(&self) -> Blinds {
        self.blinds
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn pot(&self) -> Chips {
        self.pot
    }

    pub fn current_bet(&self) -> Chips {
        self.current_bet
    }

    pub fn board(&self) -> &[Card] {
        &self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn dealer_seat(&self) -> Option<SeatIndex> {
        self.dealer_seat
    }

    pub fn last_result(&self) -> Option<&HandResult> {
        self.last_result.as_ref()
    }

    /// True when at least two players are present and everyone is ready.
    /// The serialization layer uses this to auto-start hands.
    pub fn all_ready(&self) -> bool {
        self.players.len() >= 2 && self.players.iter().all(|p| p.ready)
    }

    // ---- seating ----------------------------------------------------------

    /// Seat a player. Joining twice is a no-op success. `seat` of `None`
    /// appends the player after every seated one.
    pub fn add_player(
        &mut self,
        id: UserId,
        name: &str,
        stack: Chips,
        seat: Option<SeatIndex>,
    ) -> Result<(), TableError> {
        if self.stage != Stage::Waiting {
            return Err(TableError::WrongStage(self.stage));
        }
        if self.players.iter().any(|p| p.id == id) {
            return Ok(());
        }
        if self.players.len() >= MAX_SEATS {
            return Err(TableError::TableFull);
        }
        if let Some(seat) = seat {
            if seat >= MAX_SEATS {
                return Err(TableError::SeatUnavailable);
            }
            if self.players.iter().any(|p| p.seat == Some(seat)) {
                return Err(TableError::SeatUnavailable);
            }
        }
        self.players.push(Player::new(id, name, stack, seat));
        self.sort_players();
        info!(
            "room {}: {name} joined with ${stack} (seat {seat:?})",
            self.room_id
        );
        Ok(())
    }

    /// Remove a player by id. Remaining seats are not renumbered.
    pub fn remove_player(&mut self, id: UserId) -> Result<(), TableError> {
        if self.stage != Stage::Waiting {
            return Err(TableError::WrongStage(self.stage));
        }
        let idx = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(TableError::UnknownPlayer)?;
        let player = self.players.remove(idx);
        info!("room {}: {} left the table", self.room_id, player.name);
        Ok(())
    }

    /// Move a player to a different seat; only valid between hands.
    pub fn change_seat(&mut self, id: UserId, seat: SeatIndex) -> Result<(), TableError> {
        if self.stage != Stage::Waiting {
            return Err(TableError::WrongStage(self.stage));
        }
        if seat >= MAX_SEATS {
            return Err(TableError::SeatUnavailable);
        }
        if self
            .players
            .iter()
            .any(|p| p.seat == Some(seat) && p.id != id)
        {
            return Err(TableError::SeatUnavailable);
        }
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(TableError::UnknownPlayer)?;
        player.seat = Some(seat);
        self.sort_players();
        debug!("room {}: player {id} moved to seat {seat}", self.room_id);
        Ok(())
    }

    pub fn set_ready(&mut self, id: UserId, ready: bool) -> Result<(), TableError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(TableError::UnknownPlayer)?;
        player.ready = ready;
        Ok(())
    }

    fn sort_players(&mut self) {
        self.players
            .sort_by_key(|p| (p.seat.unwrap_or(MAX_SEATS), p.id));
    }

    // ---- hand lifecycle ---------------------------------------------------

    /// Start a new hand: reset per-hand state, pin or carry the dealer,
    /// shuffle, deal hole cards, post blinds, and hand the turn to the
    /// first player to act.
    pub fn start_hand(&mut self) -> Result<(), TableError> {
        if self.players.len() < 2 {
            return Err(TableError::NotEnoughPlayers);
        }

        for player in &mut self.players {
            player.reset_for_hand();
        }

        // The very first hand pins the dealer to the first listed seat;
        // later hands inherit it from the previous rotation.
        if self.first_hand {
            self.dealer_seat = self.players[0].seat;
            self.first_hand = false;
        }

        self.deck.reset();
        self.board.clear();
        self.pot = 0;
        self.current_bet = 0;
        self.stage = Stage::Preflop;
        self.finished = false;
        self.last_result = None;

        info!(
            "room {}: hand started with {} players, dealer at seat {:?}",
            self.room_id,
            self.players.len(),
            self.dealer_seat
        );

        // One card per player per pass.
        for _ in 0..HOLE_CARDS {
            for player in &mut self.players {
                if !player.folded
                    && let Some(card) = self.deck.deal_card()
                {
                    player.hole_cards.push(card);
                }
            }
        }

        self.post_blinds();

        // Preflop the first to act sits after the big blind; heads-up that
        // wraps around to the dealer (the small blind).
        let n = self.players.len();
        self.current_player_idx = match self.dealer_index() {
            Some(dealer) => {
                let big_blind = if n == 2 {
                    (dealer + 1) % n
                } else {
                    (dealer + 2) % n
                };
                (big_blind + 1) % n
            }
            None => 0,
        };
        self.seek_active_player();

        Ok(())
    }

    /// Locate the dealer in the (possibly reordered) seat list.
    fn dealer_index(&self) -> Option<usize> {
        self.players.iter().position(|p| p.seat == self.dealer_seat)
    }

    fn post_blinds(&mut self) {
        let n = self.players.len();
        let Some(dealer) = self.dealer_index() else {
            return;
        };
        // Heads-up the dealer posts the small blind; otherwise the two
        // seats after the dealer post in order.
        let (small_idx, big_idx) = if n == 2 {
            (dealer, (dealer + 1) % n)
        } else {
            ((dealer + 1) % n, (dealer + 2) % n)
        };

        let small = self.players[small_idx].bet(self.blinds.small);
        self.pot += small;
        let big = self.players[big_idx].bet(self.blinds.big);
        self.pot += big;
        self.current_bet = self.blinds.big;

        debug!(
            "room {}: {} posts small blind ${small}, {} posts big blind ${big}",
            self.room_id, self.players[small_idx].name, self.players[big_idx].name
        );
    }

    // ---- actions ----------------------------------------------------------

    /// Apply one player action. Fails without side effects unless it is
    /// exactly that player's turn and the action is legal.
    pub fn act(&mut self, id: UserId, action: Action) -> Result<(), TableError> {
        if !matches!(
            self.stage,
            Stage::Preflop | Stage::Flop | Stage::Turn | Stage::River
        ) {
            return Err(TableError::WrongStage(self.stage));
        }
        let idx = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(TableError::UnknownPlayer)?;
        if idx != self.current_player_idx {
            return Err(TableError::OutOfTurn);
        }
        if self.players[idx].folded || !self.players[idx].active {
            return Err(TableError::NotInHand);
        }

        // Validate up front so a rejected action is a strict no-op.
        match action {
            Action::Raise(total) if total < self.current_bet * 2 => {
                return Err(TableError::IllegalRaise {
                    min: self.current_bet * 2,
                });
            }
            Action::Check if self.players[idx].current_bet < self.current_bet => {
                return Err(TableError::IllegalCheck {
                    owed: self.current_bet - self.players[idx].current_bet,
                });
            }
            _ => {}
        }

        self.players[idx].acted_this_round = true;
        info!("room {}: {} {action}", self.room_id, self.players[idx].name);

        match action {
            Action::Fold => {
                self.players[idx].fold();
                // Folding down to one live player ends the hand at once.
                if self.active_count() <= 1 {
                    self.stage = Stage::Showdown;
                    self.resolve_showdown();
                    return Ok(());
                }
            }
            Action::Call => {
                let owed = self
                    .current_bet
                    .saturating_sub(self.players[idx].current_bet);
                let paid = self.players[idx].bet(owed);
                self.pot += paid;
            }
            Action::Raise(total) => {
                let needed = total.saturating_sub(self.players[idx].current_bet);
                let paid = self.players[idx].bet(needed);
                self.pot += paid;
                self.current_bet = self.players[idx].current_bet;
            }
            Action::Check => {}
            Action::AllIn => {
                let stack = self.players[idx].stack;
                let paid = self.players[idx].bet(stack);
                self.pot += paid;
                if self.players[idx].current_bet > self.current_bet {
                    self.current_bet = self.players[idx].current_bet;
                }
            }
        }

        debug!(
            "room {}: pot=${}, current bet=${}",
            self.room_id, self.pot, self.current_bet
        );
        self.advance_turn();
        Ok(())
    }

    fn active_count(&self) -> usize {
        self.active_players().count()
    }

    fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.active && !p.folded)
    }

    // ---- turn order -------------------------------------------------------

    /// Scan forward for the next player who needs to act; when nobody
    /// does, close out the betting round.
    fn advance_turn(&mut self) {
        let n = self.players.len();
        for _ in 0..n {
            self.current_player_idx = (self.current_player_idx + 1) % n;
            let player = &self.players[self.current_player_idx];
            if player.active && !player.folded {
                if !player.all_in && player.current_bet < self.current_bet {
                    return;
                }
                // Matched the bet but hasn't had their option yet.
                if !player.all_in
                    && !player.acted_this_round
                    && player.current_bet == self.current_bet
                {
                    return;
                }
            }
        }

        if self.active_count() <= 1 {
            self.stage = Stage::Showdown;
            self.resolve_showdown();
            return;
        }

        // Heads-up preflop: once the small blind has called (one player
        // acted, bets level) the big blind always gets the option, even
        // though the forward scan found nobody owing chips.
        if n == 2 && self.stage == Stage::Preflop {
            let acted = self
                .active_players()
                .filter(|p| p.acted_this_round)
                .count();
            let bets_level = self
                .active_players()
                .all(|p| p.current_bet == self.current_bet || p.all_in);
            if acted == 1
                && bets_level
                && let Some(idx) = self
                    .players
                    .iter()
                    .position(|p| p.seat != self.dealer_seat && p.active && !p.folded)
            {
                self.current_player_idx = idx;
                debug!("room {}: big blind gets the option", self.room_id);
                return;
            }
        }

        if self.round_complete() {
            self.next_stage();
        } else {
            // Internal-consistency fault: nobody needs to act yet the
            // round is judged incomplete. Recover on the first live seat.
            error!(
                "room {}: no player needs to act but the betting round is incomplete",
                self.room_id
            );
            if let Some(idx) = self.players.iter().position(|p| p.active && !p.folded) {
                self.current_player_idx = idx;
            }
        }
    }

    fn round_complete(&self) -> bool {
        let active: Vec<&Player> = self.active_players().collect();
        if active.len() <= 1 {
            return true;
        }
        if active.iter().all(|p| p.all_in) {
            return true;
        }

        let bets_level = active
            .iter()
            .all(|p| p.current_bet == self.current_bet || p.all_in);

        // Heads-up preflop needs both players to have acted: the big blind
        // keeps the option after a flat call from the small blind.
        if active.len() == 2 && self.stage == Stage::Preflop {
            let acted = active.iter().filter(|p| p.acted_this_round).count();
            if acted == 0 {
                return false;
            }
            return acted == 2 && bets_level;
        }

        if active
            .iter()
            .any(|p| !p.all_in && p.current_bet < self.current_bet)
        {
            return false;
        }
        if active.iter().any(|p| !p.all_in && !p.acted_this_round) {
            return false;
        }
        bets_level
    }

    /// Deal the next street, or run the hand out when everyone is all-in.
    fn next_stage(&mut self) {
        if self.active_count() <= 1 {
            self.stage = Stage::Showdown;
            self.resolve_showdown();
            return;
        }

        if self.active_players().all(|p| p.all_in) {
            // Nobody can act again; complete the board in one step and
            // resolve immediately.
            let missing = BOARD_SIZE - self.board.len();
            let cards = self.deck.deal(missing);
            self.board.extend(cards);
            info!(
                "room {}: all active players all-in, running out the board",
                self.room_id
            );
            self.stage = Stage::Showdown;
            self.resolve_showdown();
            return;
        }

        for player in &mut self.players {
            player.reset_for_round();
        }
        self.current_bet = 0;

        self.stage = match self.stage {
            Stage::Preflop => {
                let cards = self.deck.deal(3);
                self.board.extend(cards);
                Stage::Flop
            }
            Stage::Flop => {
                let cards = self.deck.deal(1);
                self.board.extend(cards);
                Stage::Turn
            }
            Stage::Turn => {
                let cards = self.deck.deal(1);
                self.board.extend(cards);
                Stage::River
            }
            Stage::River => {
                self.stage = Stage::Showdown;
                self.resolve_showdown();
                return;
            }
            other => other,
        };

        info!(
            "room {}: dealt the {}, board is now {} cards",
            self.room_id,
            self.stage,
            self.board.len()
        );

        // Postflop action starts at the small blind seat: the dealer when
        // heads-up, the seat after the dealer otherwise.
        let n = self.players.len();
        self.current_player_idx = match self.dealer_index() {
            Some(dealer) if n == 2 => dealer,
            Some(dealer) => (dealer + 1) % n,
            None => 0,
        };
        self.seek_active_player();
    }

    /// Leave `current_player_idx` on the next seated, live player, or
    /// force the hand to resolve when none exists.
    fn seek_active_player(&mut self) {
        let n = self.players.len();
        for _ in 0..n {
            let player = &self.players[self.current_player_idx];
            if player.active && !player.folded {
                return;
            }
            self.current_player_idx = (self.current_player_idx + 1) % n;
        }
        error!("room {}: no live players, forcing showdown", self.room_id);
        self.stage = Stage::Showdown;
        self.resolve_showdown();
        self.stage = Stage::Finished;
    }

    // ---- showdown ---------------------------------------------------------

    /// Award the pot. A single non-folded player wins uncontested;
    /// otherwise hands are ranked and the best one takes the whole pot.
    /// Ties are not split: the first player in sort order is paid.
    fn resolve_showdown(&mut self) {
        let contenders: Vec<usize> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.folded)
            .map(|(i, _)| i)
            .collect();

        if contenders.is_empty() {
            // Unreachable in correct play; never leave the hand unresolved.
            error!("room {}: showdown with no contenders", self.room_id);
            self.finished = true;
            self.stage = Stage::Finished;
            return;
        }

        let pot = self.pot;
        if let [winner_idx] = contenders.as_slice() {
            let winner_idx = *winner_idx;
            self.players[winner_idx].stack += pot;
            self.finished = true;
            self.stage = Stage::Finished;
            info!(
                "room {}: {} takes ${pot} uncontested",
                self.room_id, self.players[winner_idx].name
            );
            self.last_result = Some(self.build_result(&contenders, winner_idx, pot, None));
            self.rotate_dealer();
            return;
        }

        let mut ranked: Vec<(usize, HandValue)> = contenders
            .iter()
            .map(|&i| {
                let mut cards = self.players[i].hole_cards.clone();
                cards.extend_from_slice(&self.board);
                (i, eval::evaluate(&cards))
            })
            .collect();
        // Stable sort: tied hands keep seat order and the first one wins.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let winner_idx = ranked[0].0;
        self.players[winner_idx].stack += pot;
        self.finished = true;
        self.stage = Stage::Finished;
        info!(
            "room {}: {} wins ${pot} with {}",
            self.room_id, self.players[winner_idx].name, ranked[0].1.rank
        );
        self.last_result = Some(self.build_result(&contenders, winner_idx, pot, Some(&ranked)));
        self.rotate_dealer();
    }

    fn build_result(
        &self,
        contenders: &[usize],
        winner_idx: usize,
        pot: Chips,
        ranked: Option<&[(usize, HandValue)]>,
    ) -> HandResult {
        let entries: Vec<ResultEntry> = match ranked {
            Some(ranked) => ranked
                .iter()
                .enumerate()
                .map(|(place, (i, value))| {
                    let player = &self.players[*i];
                    ResultEntry {
                        id: player.id,
                        name: player.name.clone(),
                        hole_cards: player.hole_cards.clone(),
                        rank: value.rank,
                        tiebreak: value.tiebreak.clone(),
                        winnings: if *i == winner_idx { pot } else { 0 },
                        stack: player.stack,
                        place: place + 1,
                    }
                })
                .collect(),
            None => contenders
                .iter()
                .map(|&i| {
                    let player = &self.players[i];
                    let mut cards = player.hole_cards.clone();
                    cards.extend_from_slice(&self.board);
                    let value = eval::evaluate(&cards);
                    ResultEntry {
                        id: player.id,
                        name: player.name.clone(),
                        hole_cards: player.hole_cards.clone(),
                        rank: value.rank,
                        tiebreak: value.tiebreak,
                        winnings: if i == winner_idx { pot } else { 0 },
                        stack: player.stack,
                        place: if i == winner_idx { 1 } else { 2 },
                    }
                })
                .collect(),
        };
        HandResult {
            pot,
            winner: self.players[winner_idx].id,
            entries,
        }
    }

    /// Move the dealer marker one seat forward in list order.
    fn rotate_dealer(&mut self) {
        if self.players.len() < 2 {
            return;
        }
        match self.dealer_index() {
            Some(idx) => {
                let next = (idx + 1) % self.players.len();
                self.dealer_seat = self.players[next].seat;
                debug!(
                    "room {}: dealer marker moves to seat {:?}",
                    self.room_id, self.dealer_seat
                );
            }
            None => {
                self.dealer_seat = self.players[0].seat;
            }
        }
    }

    // ---- reset ------------------------------------------------------------

    /// Clear per-hand state and return to `Waiting`. Stacks and seat
    /// assignments survive. Driven by the serialization layer after the
    /// post-hand viewing delay, never by the engine itself.
    pub fn reset_for_next_hand(&mut self) {
        for player in &mut self.players {
            player.ready = false;
            player.reset_for_hand();
        }
        self.stage = Stage::Waiting;
        self.finished = false;
        self.pot = 0;
        self.current_bet = 0;
        self.current_player_idx = 0;
        self.board.clear();
        self.last_result = None;
        debug!("room {}: reset for the next hand", self.room_id);
    }

    // ---- queries ----------------------------------------------------------

    /// A consistent copy of the table for broadcast. Hole cards are shown
    /// only on `for_user`'s own row.
    #[must_use]
    pub fn snapshot(&self, for_user: Option<UserId>) -> TableSnapshot {
        let current_player = match self.stage {
            Stage::Waiting | Stage::Showdown | Stage::Finished => None,
            _ => self.players.get(self.current_player_idx).map(|p| p.id),
        };
        TableSnapshot {
            room_id: self.room_id,
            stage: self.stage,
            pot: self.pot,
            current_bet: self.current_bet,
            current_player,
            board: self.board.clone(),
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    id: p.id,
                    name: p.name.clone(),
                    stack: p.stack,
                    seat: p.seat,
                    current_bet: p.current_bet,
                    total_bet: p.total_bet,
                    folded: p.folded,
                    all_in: p.all_in,
                    active: p.active,
                    ready: p.ready,
                    hole_cards: if for_user == Some(p.id) {
                        p.hole_cards.clone()
                    } else {
                        Vec::new()
                    },
                })
                .collect(),
            finished: self.finished,
        }
    }
}
