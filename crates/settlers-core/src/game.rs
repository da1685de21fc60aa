//! Core game state machine.
//!
//! `GameEngine` never mutates the state it is given. Every entry point clones
//! the input into a draft, applies the action to the draft and hands it back,
//! so a rejected action leaves the caller's snapshot exactly as it was.

use crate::actions::{GameAction, TradeOffer};
use crate::board::{Board, PlayerId, Resource, VertexBuilding};
use crate::config::GameConfig;
use crate::generator::BoardGenerator;
use crate::graph::BoardGraph;
use crate::ledger::{
    self, apply_transfer, can_afford, distribute_production, initial_handout,
    production_for_roll, trade_ratio, Bank, Party,
};
use crate::player::{costs, DevelopmentCard, Player, ResourceHand};
use crate::rules::{RuleValidator, RuleViolation};
use crate::topology::{EdgeId, TileId, VertexId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Minimum road length for Longest Road
const MIN_LONGEST_ROAD: u32 = 5;

/// Minimum knights for Largest Army
const MIN_LARGEST_ARMY: u32 = 3;

/// Victory points carried by Longest Road and Largest Army
const AWARD_POINTS: u32 = 2;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Initial placements, two per player
    Setup,
    /// Regular turns
    Main,
    /// Someone reached the target; no further actions
    GameOver,
}

/// Step within the current player's turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Setup placement
    Placement,
    /// Before rolling dice at start of turn
    RollingDice,
    /// Rolled 7, players in `pending_discards` must give up half their cards
    Discarding,
    /// After a 7 or a knight, the current player must move the robber
    MovingRobber,
    /// Build, trade, play cards, end turn
    MainActions,
}

/// Seat order of the current setup round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupDirection {
    Forward,
    Backward,
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Illegal action: {0}")]
    IllegalAction(#[from] RuleViolation),

    #[error("Not your turn")]
    NotYourTurn,

    #[error("No player with id {0}")]
    UnknownPlayer(PlayerId),

    #[error("Cannot afford this")]
    InsufficientResources,

    #[error("Invalid action for current phase")]
    InvalidPhase,

    #[error("The bank cannot supply this")]
    ExhaustedSupply,

    #[error("No pieces remaining")]
    NoPiecesRemaining,

    #[error("A game needs 3 or 4 players, got {0}")]
    InvalidPlayerCount(usize),

    #[error("Invalid dice roll ({0}, {1})")]
    InvalidDice(u8, u8),

    #[error("Invalid trade")]
    InvalidTrade,

    #[error("No active trade")]
    NoActiveTrade,

    #[error("Game is over")]
    GameOver,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Tiles plus the ownership overlay
    pub board: Board,
    /// Seated in id order
    pub players: Vec<Player>,
    pub bank: Bank,
    pub current_player: PlayerId,
    pub phase: GamePhase,
    pub turn_phase: TurnPhase,
    /// 0 during setup, 1 for the first regular turn
    pub turn_number: u32,
    /// Dice of the current turn, `None` before rolling
    pub last_roll: Option<(u8, u8)>,
    /// 1 or 2 while in setup
    pub setup_round: u8,
    pub setup_direction: SetupDirection,
    /// Players who still owe a discard after a 7
    pub pending_discards: Vec<PlayerId>,
    pub pending_trade: Option<TradeOffer>,
    pub longest_road_holder: Option<PlayerId>,
    pub largest_army_holder: Option<PlayerId>,
    pub winner: Option<PlayerId>,
    pub config: GameConfig,
    /// Seed for the next random draw
    rng_state: u64,
}

impl GameState {
    pub(crate) fn new(
        board: Board,
        players: Vec<Player>,
        bank: Bank,
        config: GameConfig,
        rng_state: u64,
    ) -> Self {
        Self {
            board,
            players,
            bank,
            current_player: 0,
            phase: GamePhase::Setup,
            turn_phase: TurnPhase::Placement,
            turn_number: 0,
            last_roll: None,
            setup_round: 1,
            setup_direction: SetupDirection::Forward,
            pending_discards: Vec::new(),
            pending_trade: None,
            longest_road_holder: None,
            largest_army_holder: None,
            winner: None,
            config,
            rng_state,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    pub fn current(&self) -> &Player {
        &self.players[self.current_player as usize]
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Public points plus held victory point cards; 0 for an unknown id
    pub fn total_victory_points(&self, id: PlayerId) -> u32 {
        self.player(id).map_or(0, Player::total_victory_points)
    }

    /// Run `draw` on an RNG seeded from the snapshot, then advance the seed.
    fn with_rng<T>(&mut self, draw: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = StdRng::seed_from_u64(self.rng_state);
        let out = draw(&mut rng);
        self.rng_state = rng.gen();
        out
    }
}

/// Applies actions to snapshots
#[derive(Debug, Clone, Copy, Default)]
pub struct GameEngine {
    graph: BoardGraph,
    rules: RuleValidator,
    generator: BoardGenerator,
}

impl GameEngine {
    pub fn new(graph: BoardGraph) -> Self {
        Self {
            graph,
            rules: RuleValidator::new(graph),
            generator: BoardGenerator::new(graph),
        }
    }

    pub fn graph(&self) -> &BoardGraph {
        &self.graph
    }

    pub fn rules(&self) -> &RuleValidator {
        &self.rules
    }

    // ==================== Entry Points ====================

    /// New game with the default configuration and a random seed
    pub fn start_game<I, S>(&self, names: I) -> Result<GameState, GameError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.start_game_with_config(names, GameConfig::default())
    }

    pub fn start_game_with_config<I, S>(
        &self,
        names: I,
        config: GameConfig,
    ) -> Result<GameState, GameError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let mut rng = StdRng::seed_from_u64(seed);
        let state = self.generator.generate(names, config, &mut rng)?;
        info!(seed, players = state.player_count(), "game started");
        Ok(state)
    }

    /// Apply `action` on behalf of `player`, returning the next snapshot.
    pub fn handle_action(
        &self,
        state: &GameState,
        player: PlayerId,
        action: GameAction,
    ) -> Result<GameState, GameError> {
        let mut draft = state.clone();
        match self.apply(&mut draft, player, action.clone()) {
            Ok(()) => {
                debug!(player, ?action, "action applied");
                Ok(draft)
            }
            Err(err) => {
                debug!(player, ?action, %err, "action rejected");
                Err(err)
            }
        }
    }

    pub fn place_initial_settlement_and_road(
        &self,
        state: &GameState,
        player: PlayerId,
        vertex: VertexId,
        edge: EdgeId,
    ) -> Result<GameState, GameError> {
        self.handle_action(
            state,
            player,
            GameAction::PlaceInitialSettlementAndRoad { vertex, edge },
        )
    }

    /// Pay the player who settled `vertex` one card per productive tile
    /// around it.
    ///
    /// Only valid during the second setup round. Second-round placements
    /// already do this; the standalone form is for hosts that drive setup
    /// themselves.
    pub fn process_initial_resource_handout(
        &self,
        state: &GameState,
        vertex: VertexId,
    ) -> Result<GameState, GameError> {
        if state.phase != GamePhase::Setup || state.setup_round != 2 {
            return Err(GameError::InvalidPhase);
        }
        let VertexBuilding::Settlement(owner) = state.board.vertex(vertex).building else {
            return Err(RuleViolation::VertexUnoccupied(vertex).into());
        };
        let mut draft = state.clone();
        let given = self.hand_out(&mut draft, owner, vertex);
        debug!(player = owner, vertex, ?given, "setup handout");
        Ok(draft)
    }

    /// End the current turn without an `EndTurn` action.
    ///
    /// Pending discards and an unmoved robber are dropped, so hosts can use
    /// this to skip a player who is no longer responding.
    pub fn next_turn(&self, state: &GameState) -> Result<GameState, GameError> {
        match state.phase {
            GamePhase::Setup => Err(GameError::InvalidPhase),
            GamePhase::GameOver => Err(GameError::GameOver),
            GamePhase::Main => {
                let mut draft = state.clone();
                self.finish_turn(&mut draft);
                Ok(draft)
            }
        }
    }

    /// Apply dice rolled outside the engine.
    pub fn resolve_roll(
        &self,
        state: &GameState,
        player: PlayerId,
        dice: (u8, u8),
    ) -> Result<GameState, GameError> {
        let (a, b) = dice;
        if !(1..=6).contains(&a) || !(1..=6).contains(&b) {
            return Err(GameError::InvalidDice(a, b));
        }
        if state.is_over() {
            return Err(GameError::GameOver);
        }
        require_turn(state, player, TurnPhase::RollingDice)?;
        let mut draft = state.clone();
        self.apply_roll(&mut draft, dice);
        Ok(draft)
    }

    // ==================== Dispatch ====================

    fn apply(
        &self,
        state: &mut GameState,
        player: PlayerId,
        action: GameAction,
    ) -> Result<(), GameError> {
        if state.is_over() {
            return Err(GameError::GameOver);
        }
        if state.player(player).is_none() {
            return Err(GameError::UnknownPlayer(player));
        }

        match action {
            GameAction::PlaceInitialSettlementAndRoad { vertex, edge } => {
                self.setup_placement(state, player, vertex, edge)
            }
            GameAction::RollDice => {
                require_turn(state, player, TurnPhase::RollingDice)?;
                let dice: (u8, u8) =
                    state.with_rng(|rng| (rng.gen_range(1..=6), rng.gen_range(1..=6)));
                self.apply_roll(state, dice);
                Ok(())
            }
            GameAction::DiscardCards(cards) => self.discard(state, player, cards),
            GameAction::MoveRobber { tile, steal_from } => {
                self.move_robber(state, player, tile, steal_from)
            }
            GameAction::BuildRoad(edge) => self.build_road(state, player, edge),
            GameAction::BuildSettlement(vertex) => self.build_settlement(state, player, vertex),
            GameAction::BuildCity(vertex) => self.build_city(state, player, vertex),
            GameAction::BuyDevelopmentCard => self.buy_development_card(state, player),
            GameAction::PlayKnight => self.play_knight(state, player),
            GameAction::PlayRoadBuilding(first, second) => {
                self.play_road_building(state, player, first, second)
            }
            GameAction::PlayYearOfPlenty(a, b) => self.play_year_of_plenty(state, player, a, b),
            GameAction::PlayMonopoly(resource) => self.play_monopoly(state, player, resource),
            GameAction::BankTrade { give, receive } => {
                self.trade_with_bank(state, player, give, receive)
            }
            GameAction::ProposeTrade(offer) => self.propose_trade(state, player, offer),
            GameAction::AcceptTrade => self.accept_trade(state, player),
            GameAction::CancelTrade => self.cancel_trade(state, player),
            GameAction::EndTurn => {
                require_turn(state, player, TurnPhase::MainActions)?;
                self.finish_turn(state);
                Ok(())
            }
        }
    }

    // ==================== Setup Phase ====================

    fn setup_placement(
        &self,
        state: &mut GameState,
        player: PlayerId,
        vertex: VertexId,
        edge: EdgeId,
    ) -> Result<(), GameError> {
        if state.phase != GamePhase::Setup {
            return Err(GameError::InvalidPhase);
        }
        if player != state.current_player {
            return Err(GameError::NotYourTurn);
        }
        self.rules.check_settlement(&state.board, player, vertex, true)?;
        self.rules.check_setup_road(&state.board, vertex, edge)?;

        place_settlement(state, player, vertex);
        place_road(state, player, edge);

        if state.setup_round == 2 {
            let given = self.hand_out(state, player, vertex);
            debug!(player, vertex, ?given, "setup handout");
        }
        self.advance_setup(state);
        Ok(())
    }

    fn hand_out(&self, state: &mut GameState, player: PlayerId, vertex: VertexId) -> ResourceHand {
        initial_handout(
            &self.graph,
            &state.board,
            &mut state.players,
            &mut state.bank,
            player,
            vertex,
        )
    }

    /// Snake order: 0..n-1 forward, then n-1..0 backward.
    fn advance_setup(&self, state: &mut GameState) {
        let last = (state.player_count() - 1) as PlayerId;
        match state.setup_direction {
            SetupDirection::Forward if state.current_player < last => state.current_player += 1,
            SetupDirection::Forward => {
                state.setup_round = 2;
                state.setup_direction = SetupDirection::Backward;
            }
            SetupDirection::Backward if state.current_player > 0 => state.current_player -= 1,
            SetupDirection::Backward => {
                state.phase = GamePhase::Main;
                state.turn_phase = TurnPhase::RollingDice;
                state.current_player = 0;
                state.turn_number = 1;
                info!("setup complete");
            }
        }
    }

    // ==================== Dice Rolling ====================

    fn apply_roll(&self, state: &mut GameState, dice: (u8, u8)) {
        state.last_roll = Some(dice);
        let total = dice.0 + dice.1;

        if total == 7 {
            let limit = state.config.discard_limit;
            state.pending_discards = state
                .players
                .iter()
                .filter(|p| self.rules.must_discard(&p.resources, limit))
                .map(|p| p.id)
                .collect();
            state.turn_phase = if state.pending_discards.is_empty() {
                TurnPhase::MovingRobber
            } else {
                TurnPhase::Discarding
            };
            debug!(discards = ?state.pending_discards, "rolled 7");
        } else {
            let owed = production_for_roll(&self.graph, &state.board, total);
            let paid = distribute_production(&mut state.players, &mut state.bank, &owed);
            debug!(total, ?paid, "production");
            state.turn_phase = TurnPhase::MainActions;
        }
    }

    // ==================== Discard ====================

    fn discard(
        &self,
        state: &mut GameState,
        player: PlayerId,
        cards: ResourceHand,
    ) -> Result<(), GameError> {
        if state.turn_phase != TurnPhase::Discarding {
            return Err(GameError::InvalidPhase);
        }
        if !state.pending_discards.contains(&player) {
            return Err(RuleViolation::DiscardNotRequired.into());
        }
        let hand = state.players[player as usize].resources;
        self.rules
            .check_discard(&hand, &cards, state.config.discard_limit)?;

        apply_transfer(
            &mut state.players,
            &mut state.bank,
            Party::Player(player),
            Party::Bank,
            &cards,
        );
        state.pending_discards.retain(|&p| p != player);
        if state.pending_discards.is_empty() {
            state.turn_phase = TurnPhase::MovingRobber;
        }
        Ok(())
    }

    // ==================== Robber ====================

    fn move_robber(
        &self,
        state: &mut GameState,
        player: PlayerId,
        tile: TileId,
        steal_from: Option<PlayerId>,
    ) -> Result<(), GameError> {
        require_turn(state, player, TurnPhase::MovingRobber)?;
        self.rules.check_robber_move(&state.board, tile)?;
        if let Some(victim) = steal_from {
            self.rules
                .check_robber_victim(&state.board, player, victim, tile)?;
        }

        state.board.move_robber(tile);

        if let Some(victim) = steal_from {
            let hand = state.players[victim as usize].resources;
            if let Some(resource) = state.with_rng(|rng| hand.random_card(rng)) {
                apply_transfer(
                    &mut state.players,
                    &mut state.bank,
                    Party::Player(victim),
                    Party::Player(player),
                    &ResourceHand::single(resource, 1),
                );
                debug!(player, victim, ?resource, "robber steal");
            }
        }

        // A knight played before rolling still owes the roll.
        state.turn_phase = if state.last_roll.is_none() {
            TurnPhase::RollingDice
        } else {
            TurnPhase::MainActions
        };
        Ok(())
    }

    // ==================== Building ====================

    fn build_road(
        &self,
        state: &mut GameState,
        player: PlayerId,
        edge: EdgeId,
    ) -> Result<(), GameError> {
        require_turn(state, player, TurnPhase::MainActions)?;
        let cost = costs::road();
        let p = &state.players[player as usize];
        if !can_afford(&p.resources, &cost) {
            return Err(GameError::InsufficientResources);
        }
        if p.roads_remaining == 0 {
            return Err(GameError::NoPiecesRemaining);
        }
        self.rules.check_road(&state.board, player, edge)?;

        pay(state, player, &cost);
        place_road(state, player, edge);
        self.update_longest_road(state);
        Ok(())
    }

    fn build_settlement(
        &self,
        state: &mut GameState,
        player: PlayerId,
        vertex: VertexId,
    ) -> Result<(), GameError> {
        require_turn(state, player, TurnPhase::MainActions)?;
        let cost = costs::settlement();
        let p = &state.players[player as usize];
        if !can_afford(&p.resources, &cost) {
            return Err(GameError::InsufficientResources);
        }
        if p.settlements_remaining == 0 {
            return Err(GameError::NoPiecesRemaining);
        }
        self.rules
            .check_settlement(&state.board, player, vertex, false)?;

        pay(state, player, &cost);
        place_settlement(state, player, vertex);
        Ok(())
    }

    fn build_city(
        &self,
        state: &mut GameState,
        player: PlayerId,
        vertex: VertexId,
    ) -> Result<(), GameError> {
        require_turn(state, player, TurnPhase::MainActions)?;
        let cost = costs::city();
        let p = &state.players[player as usize];
        if !can_afford(&p.resources, &cost) {
            return Err(GameError::InsufficientResources);
        }
        if p.cities_remaining == 0 {
            return Err(GameError::NoPiecesRemaining);
        }
        self.rules.check_city(&state.board, player, vertex)?;

        pay(state, player, &cost);
        state.board.upgrade_to_city(vertex, player);
        let p = &mut state.players[player as usize];
        p.cities_remaining -= 1;
        p.settlements_remaining += 1;
        p.victory_points += 1;
        Ok(())
    }

    fn buy_development_card(
        &self,
        state: &mut GameState,
        player: PlayerId,
    ) -> Result<(), GameError> {
        require_turn(state, player, TurnPhase::MainActions)?;
        let cost = costs::development_card();
        if !can_afford(&state.players[player as usize].resources, &cost) {
            return Err(GameError::InsufficientResources);
        }
        let Some(card) = state.bank.draw_development_card() else {
            return Err(GameError::ExhaustedSupply);
        };

        pay(state, player, &cost);
        state.players[player as usize]
            .dev_cards_bought_this_turn
            .push(card);
        Ok(())
    }

    // ==================== Development Cards ====================

    fn play_knight(&self, state: &mut GameState, player: PlayerId) -> Result<(), GameError> {
        if player != state.current_player {
            return Err(GameError::NotYourTurn);
        }
        if !matches!(
            state.turn_phase,
            TurnPhase::RollingDice | TurnPhase::MainActions
        ) {
            return Err(GameError::InvalidPhase);
        }
        self.use_card(state, player, DevelopmentCard::Knight)?;

        state.players[player as usize].knights_played += 1;
        self.update_largest_army(state);
        state.turn_phase = TurnPhase::MovingRobber;
        Ok(())
    }

    fn play_road_building(
        &self,
        state: &mut GameState,
        player: PlayerId,
        first: EdgeId,
        second: EdgeId,
    ) -> Result<(), GameError> {
        require_turn(state, player, TurnPhase::MainActions)?;
        self.rules
            .check_development_card(&state.players[player as usize], DevelopmentCard::RoadBuilding)?;
        if state.players[player as usize].roads_remaining < 2 {
            return Err(GameError::NoPiecesRemaining);
        }

        for edge in [first, second] {
            self.rules.check_road(&state.board, player, edge)?;
            place_road(state, player, edge);
        }
        self.use_card(state, player, DevelopmentCard::RoadBuilding)?;
        self.update_longest_road(state);
        Ok(())
    }

    fn play_year_of_plenty(
        &self,
        state: &mut GameState,
        player: PlayerId,
        first: Resource,
        second: Resource,
    ) -> Result<(), GameError> {
        require_turn(state, player, TurnPhase::MainActions)?;
        self.use_card(state, player, DevelopmentCard::YearOfPlenty)?;

        let mut wanted = ResourceHand::single(first, 1);
        wanted.add(second, 1);
        if !state.bank.resources.can_afford(&wanted) {
            return Err(GameError::ExhaustedSupply);
        }
        apply_transfer(
            &mut state.players,
            &mut state.bank,
            Party::Bank,
            Party::Player(player),
            &wanted,
        );
        Ok(())
    }

    fn play_monopoly(
        &self,
        state: &mut GameState,
        player: PlayerId,
        resource: Resource,
    ) -> Result<(), GameError> {
        require_turn(state, player, TurnPhase::MainActions)?;
        self.use_card(state, player, DevelopmentCard::Monopoly)?;

        let mut collected = 0;
        for other in 0..state.player_count() as PlayerId {
            if other == player {
                continue;
            }
            let amount = state.players[other as usize].resources.get(resource);
            apply_transfer(
                &mut state.players,
                &mut state.bank,
                Party::Player(other),
                Party::Player(player),
                &ResourceHand::single(resource, amount),
            );
            collected += amount;
        }
        debug!(player, ?resource, collected, "monopoly");
        Ok(())
    }

    /// Validate and spend one playable copy of `card`.
    fn use_card(
        &self,
        state: &mut GameState,
        player: PlayerId,
        card: DevelopmentCard,
    ) -> Result<(), GameError> {
        let p = &mut state.players[player as usize];
        self.rules.check_development_card(p, card)?;
        p.remove_dev_card(card);
        p.dev_card_played_this_turn = Some(card);
        Ok(())
    }

    // ==================== Trading ====================

    fn trade_with_bank(
        &self,
        state: &mut GameState,
        player: PlayerId,
        give: Resource,
        receive: Resource,
    ) -> Result<(), GameError> {
        require_turn(state, player, TurnPhase::MainActions)?;
        if give == receive {
            return Err(GameError::InvalidTrade);
        }
        let ratio = trade_ratio(&state.board, player, give);
        let p = &state.players[player as usize];
        if p.resources.get(give) < ratio {
            return Err(GameError::InsufficientResources);
        }
        let (p, bank) = ledger::bank_trade(p, &state.bank, give, receive, ratio)
            .ok_or(GameError::ExhaustedSupply)?;
        state.players[player as usize] = p;
        state.bank = bank;
        Ok(())
    }

    fn propose_trade(
        &self,
        state: &mut GameState,
        player: PlayerId,
        offer: TradeOffer,
    ) -> Result<(), GameError> {
        require_turn(state, player, TurnPhase::MainActions)?;
        if offer.from != player || !offer.is_valid() {
            return Err(GameError::InvalidTrade);
        }
        if offer.to.is_some_and(|to| state.player(to).is_none()) {
            return Err(GameError::InvalidTrade);
        }
        if !can_afford(&state.players[player as usize].resources, &offer.offering) {
            return Err(GameError::InsufficientResources);
        }
        state.pending_trade = Some(offer);
        Ok(())
    }

    fn accept_trade(&self, state: &mut GameState, player: PlayerId) -> Result<(), GameError> {
        if state.turn_phase != TurnPhase::MainActions {
            return Err(GameError::InvalidPhase);
        }
        let Some(offer) = state.pending_trade.take() else {
            return Err(GameError::NoActiveTrade);
        };
        if !offer.is_open_to(player) {
            return Err(GameError::InvalidTrade);
        }
        if !can_afford(&state.players[offer.from as usize].resources, &offer.offering)
            || !can_afford(&state.players[player as usize].resources, &offer.requesting)
        {
            return Err(GameError::InsufficientResources);
        }

        apply_transfer(
            &mut state.players,
            &mut state.bank,
            Party::Player(offer.from),
            Party::Player(player),
            &offer.offering,
        );
        apply_transfer(
            &mut state.players,
            &mut state.bank,
            Party::Player(player),
            Party::Player(offer.from),
            &offer.requesting,
        );
        debug!(from = offer.from, to = player, "trade completed");
        Ok(())
    }

    fn cancel_trade(&self, state: &mut GameState, player: PlayerId) -> Result<(), GameError> {
        require_turn(state, player, TurnPhase::MainActions)?;
        if state.pending_trade.take().is_none() {
            return Err(GameError::NoActiveTrade);
        }
        Ok(())
    }

    // ==================== Turn Management ====================

    fn finish_turn(&self, state: &mut GameState) {
        let current = state.current_player;
        state.players[current as usize].end_turn();
        state.pending_trade = None;
        state.pending_discards.clear();

        let points = state.current().total_victory_points();
        if points >= state.config.victory_points_to_win {
            state.phase = GamePhase::GameOver;
            state.winner = Some(current);
            info!(winner = current, points, "game over");
            return;
        }

        state.current_player = ((current as usize + 1) % state.player_count()) as PlayerId;
        state.turn_phase = TurnPhase::RollingDice;
        state.last_roll = None;
        state.turn_number += 1;
    }

    // ==================== Awards ====================

    fn update_longest_road(&self, state: &mut GameState) {
        for player in state.players.iter_mut() {
            player.longest_road_length = self.graph.longest_road(&state.board, player.id);
        }
        if reassign_award(
            &mut state.players,
            &mut state.longest_road_holder,
            MIN_LONGEST_ROAD,
            |p| p.longest_road_length,
        ) {
            info!(holder = ?state.longest_road_holder, "longest road changed hands");
        }
    }

    fn update_largest_army(&self, state: &mut GameState) {
        if reassign_award(
            &mut state.players,
            &mut state.largest_army_holder,
            MIN_LARGEST_ARMY,
            |p| p.knights_played,
        ) {
            info!(holder = ?state.largest_army_holder, "largest army changed hands");
        }
    }

    // ==================== Legal Actions ====================

    /// Every action `player` could submit right now.
    ///
    /// Discards are represented by one legal choice and player trade
    /// proposals are not listed, since neither can be enumerated usefully.
    pub fn valid_actions(&self, state: &GameState, player: PlayerId) -> Vec<GameAction> {
        let mut actions = Vec::new();
        let Some(p) = state.player(player) else {
            return actions;
        };

        match state.phase {
            GamePhase::GameOver => {}

            GamePhase::Setup => {
                if player != state.current_player {
                    return actions;
                }
                for vertex in self.vertex_ids(state) {
                    if self
                        .rules
                        .check_settlement(&state.board, player, vertex, true)
                        .is_err()
                    {
                        continue;
                    }
                    for &edge in self.graph.vertex_edges(vertex) {
                        if self.rules.check_setup_road(&state.board, vertex, edge).is_ok() {
                            actions.push(GameAction::PlaceInitialSettlementAndRoad { vertex, edge });
                        }
                    }
                }
            }

            GamePhase::Main => {
                if state.turn_phase == TurnPhase::Discarding {
                    if state.pending_discards.contains(&player) {
                        let count = self.rules.required_discard(&p.resources);
                        actions.push(GameAction::DiscardCards(first_cards(&p.resources, count)));
                    }
                    return actions;
                }

                if player != state.current_player {
                    if state.turn_phase == TurnPhase::MainActions {
                        if let Some(offer) = &state.pending_trade {
                            let proposer = &state.players[offer.from as usize];
                            if offer.is_open_to(player)
                                && can_afford(&proposer.resources, &offer.offering)
                                && can_afford(&p.resources, &offer.requesting)
                            {
                                actions.push(GameAction::AcceptTrade);
                            }
                        }
                    }
                    return actions;
                }

                let can_play = |card| self.rules.check_development_card(p, card).is_ok();

                match state.turn_phase {
                    TurnPhase::Placement | TurnPhase::Discarding => {}

                    TurnPhase::RollingDice => {
                        actions.push(GameAction::RollDice);
                        if can_play(DevelopmentCard::Knight) {
                            actions.push(GameAction::PlayKnight);
                        }
                    }

                    TurnPhase::MovingRobber => {
                        for tile in state.board.tiles.iter().map(|t| t.id) {
                            if tile == state.board.robber {
                                continue;
                            }
                            actions.push(GameAction::MoveRobber {
                                tile,
                                steal_from: None,
                            });
                            for victim in self.graph.players_on_tile(&state.board, tile) {
                                if victim != player {
                                    actions.push(GameAction::MoveRobber {
                                        tile,
                                        steal_from: Some(victim),
                                    });
                                }
                            }
                        }
                    }

                    TurnPhase::MainActions => {
                        actions.push(GameAction::EndTurn);
                        self.push_building_actions(state, p, &mut actions);

                        if can_afford(&p.resources, &costs::development_card())
                            && !state.bank.development_cards.is_empty()
                        {
                            actions.push(GameAction::BuyDevelopmentCard);
                        }

                        if can_play(DevelopmentCard::Knight) {
                            actions.push(GameAction::PlayKnight);
                        }
                        if can_play(DevelopmentCard::RoadBuilding) && p.roads_remaining >= 2 {
                            self.push_road_building(state, player, &mut actions);
                        }
                        if can_play(DevelopmentCard::YearOfPlenty) {
                            for (i, &a) in Resource::ALL.iter().enumerate() {
                                for &b in &Resource::ALL[i..] {
                                    let mut wanted = ResourceHand::single(a, 1);
                                    wanted.add(b, 1);
                                    if state.bank.resources.can_afford(&wanted) {
                                        actions.push(GameAction::PlayYearOfPlenty(a, b));
                                    }
                                }
                            }
                        }
                        if can_play(DevelopmentCard::Monopoly) {
                            for resource in Resource::ALL {
                                actions.push(GameAction::PlayMonopoly(resource));
                            }
                        }

                        for give in Resource::ALL {
                            if p.resources.get(give) < trade_ratio(&state.board, player, give) {
                                continue;
                            }
                            for receive in Resource::ALL {
                                if receive != give && state.bank.supply(receive) > 0 {
                                    actions.push(GameAction::BankTrade { give, receive });
                                }
                            }
                        }

                        if state.pending_trade.is_some() {
                            actions.push(GameAction::CancelTrade);
                        }
                    }
                }
            }
        }

        actions
    }

    fn vertex_ids<'a>(&self, state: &'a GameState) -> impl Iterator<Item = VertexId> + 'a {
        state.board.vertices.iter().map(|v| v.id)
    }

    fn push_building_actions(&self, state: &GameState, p: &Player, actions: &mut Vec<GameAction>) {
        let board = &state.board;
        if can_afford(&p.resources, &costs::road()) && p.roads_remaining > 0 {
            for edge in board.edges.iter().map(|e| e.id) {
                if self.rules.check_road(board, p.id, edge).is_ok() {
                    actions.push(GameAction::BuildRoad(edge));
                }
            }
        }
        if can_afford(&p.resources, &costs::settlement()) && p.settlements_remaining > 0 {
            for vertex in self.vertex_ids(state) {
                if self.rules.check_settlement(board, p.id, vertex, false).is_ok() {
                    actions.push(GameAction::BuildSettlement(vertex));
                }
            }
        }
        if can_afford(&p.resources, &costs::city()) && p.cities_remaining > 0 {
            for vertex in board.settlements_of(p.id) {
                actions.push(GameAction::BuildCity(vertex));
            }
        }
    }

    fn push_road_building(&self, state: &GameState, player: PlayerId, actions: &mut Vec<GameAction>) {
        for first in state.board.edges.iter().map(|e| e.id) {
            if self.rules.check_road(&state.board, player, first).is_err() {
                continue;
            }
            let mut board = state.board.clone();
            board.place_road(first, player);
            for second in board.edges.iter().map(|e| e.id) {
                if self.rules.check_road(&board, player, second).is_ok() {
                    actions.push(GameAction::PlayRoadBuilding(first, second));
                }
            }
        }
    }
}

fn require_turn(state: &GameState, player: PlayerId, phase: TurnPhase) -> Result<(), GameError> {
    if player != state.current_player {
        return Err(GameError::NotYourTurn);
    }
    if state.phase != GamePhase::Main || state.turn_phase != phase {
        return Err(GameError::InvalidPhase);
    }
    Ok(())
}

fn pay(state: &mut GameState, player: PlayerId, cost: &ResourceHand) {
    apply_transfer(
        &mut state.players,
        &mut state.bank,
        Party::Player(player),
        Party::Bank,
        cost,
    );
}

fn place_settlement(state: &mut GameState, player: PlayerId, vertex: VertexId) {
    state.board.place_settlement(vertex, player);
    let p = &mut state.players[player as usize];
    p.settlements_remaining -= 1;
    p.victory_points += 1;
}

fn place_road(state: &mut GameState, player: PlayerId, edge: EdgeId) {
    state.board.place_road(edge, player);
    state.players[player as usize].roads_remaining -= 1;
}

/// `count` cards taken in `Resource::ALL` order
fn first_cards(hand: &ResourceHand, count: u32) -> ResourceHand {
    let mut left = count;
    let mut picked = ResourceHand::new();
    for (resource, held) in hand.iter() {
        let n = held.min(left);
        picked.add(resource, n);
        left -= n;
    }
    picked
}

/// Give a 2-point award to the best player at or above `minimum`.
///
/// A challenger must strictly beat the holder. Without a holder, ties go to
/// the earliest seat. Returns whether the award moved.
fn reassign_award(
    players: &mut [Player],
    holder: &mut Option<PlayerId>,
    minimum: u32,
    score: impl Fn(&Player) -> u32,
) -> bool {
    let mut best: Option<(PlayerId, u32)> = None;
    for p in players.iter() {
        let s = score(p);
        if s >= minimum && best.map_or(true, |(_, top)| s > top) {
            best = Some((p.id, s));
        }
    }
    let Some((challenger, top)) = best else {
        return false;
    };

    if let Some(current) = *holder {
        if current == challenger || score(&players[current as usize]) >= top {
            return false;
        }
        players[current as usize].victory_points -= AWARD_POINTS;
    }
    players[challenger as usize].victory_points += AWARD_POINTS;
    *holder = Some(challenger);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::BANK_LIMIT;
    use crate::topology::VERTEX_COUNT;
    use pretty_assertions::assert_eq;

    fn engine() -> GameEngine {
        GameEngine::default()
    }

    fn new_game(seed: u64) -> GameState {
        engine()
            .start_game_with_config(["Ann", "Bo", "Cy"], GameConfig::default().with_seed(seed))
            .unwrap()
    }

    /// Run setup taking the first legal placement each time
    fn after_setup(seed: u64) -> GameState {
        let engine = engine();
        let mut state = new_game(seed);
        while state.phase == GamePhase::Setup {
            let player = state.current_player;
            let action = engine.valid_actions(&state, player).remove(0);
            state = engine.handle_action(&state, player, action).unwrap();
        }
        state
    }

    /// Main phase with the current player free to act
    fn main_actions(seed: u64) -> GameState {
        let mut state = after_setup(seed);
        state.turn_phase = TurnPhase::MainActions;
        state.last_roll = Some((2, 3));
        state
    }

    fn total_cards(state: &GameState) -> u32 {
        state.players.iter().map(|p| p.resources.total()).sum::<u32>()
            + state.bank.resources.total()
    }

    /// First-round placements for every seat, leaving round 2 about to start
    fn after_first_round(seed: u64) -> GameState {
        let engine = engine();
        let mut state = new_game(seed);
        while state.setup_round == 1 {
            let player = state.current_player;
            let action = engine.valid_actions(&state, player).remove(0);
            state = engine.handle_action(&state, player, action).unwrap();
        }
        state
    }

    /// One card per productive tile around `vertex`
    fn productive_hand(engine: &GameEngine, board: &Board, vertex: VertexId) -> ResourceHand {
        let mut hand = ResourceHand::new();
        for &t in engine.graph().vertex_tiles(vertex) {
            let tile = board.tile(t);
            if let Some(resource) = tile.resource().filter(|_| tile.is_productive()) {
                hand.add(resource, 1);
            }
        }
        hand
    }

    #[test]
    fn test_new_game_starts_in_setup() {
        let state = new_game(1);
        assert_eq!(state.phase, GamePhase::Setup);
        assert_eq!(state.turn_phase, TurnPhase::Placement);
        assert_eq!(state.current_player, 0);
        assert_eq!(state.setup_round, 1);
        assert_eq!(state.turn_number, 0);
    }

    #[test]
    fn test_same_seed_same_game() {
        assert_eq!(new_game(77), new_game(77));
    }

    #[test]
    fn test_setup_snake_order() {
        let engine = engine();
        let mut state = new_game(2);
        let mut order = Vec::new();
        while state.phase == GamePhase::Setup {
            let player = state.current_player;
            order.push(player);
            let action = engine.valid_actions(&state, player).remove(0);
            state = engine.handle_action(&state, player, action).unwrap();
        }
        assert_eq!(order, vec![0, 1, 2, 2, 1, 0]);
        assert_eq!(state.phase, GamePhase::Main);
        assert_eq!(state.turn_phase, TurnPhase::RollingDice);
        assert_eq!(state.current_player, 0);
        assert_eq!(state.turn_number, 1);
        for p in &state.players {
            assert_eq!(p.settlements_remaining, 3);
            assert_eq!(p.roads_remaining, 13);
            assert_eq!(p.victory_points, 2);
        }
    }

    #[test]
    fn test_only_second_round_hands_out() {
        let engine = engine();
        let state = after_first_round(3);
        assert!(state.players.iter().all(|p| p.resources.is_empty()));

        let player = state.current_player;
        let Some(GameAction::PlaceInitialSettlementAndRoad { vertex, edge }) =
            engine.valid_actions(&state, player).into_iter().next()
        else {
            panic!("expected a setup placement");
        };
        let expected = productive_hand(&engine, &state.board, vertex);
        let next = engine
            .place_initial_settlement_and_road(&state, player, vertex, edge)
            .unwrap();
        assert_eq!(next.players[player as usize].resources, expected);
        assert_eq!(total_cards(&next), 5 * BANK_LIMIT);
    }

    #[test]
    fn test_setup_out_of_turn_is_rejected_without_change() {
        let engine = engine();
        let state = new_game(4);
        let before = state.clone();
        let err = engine
            .place_initial_settlement_and_road(&state, 1, 0, engine.graph().vertex_edges(0)[0])
            .unwrap_err();
        assert_eq!(err, GameError::NotYourTurn);
        assert_eq!(state, before);
    }

    #[test]
    fn test_setup_distance_rule() {
        let engine = engine();
        let state = new_game(5);
        let edge = engine.graph().vertex_edges(0)[0];
        let state = engine
            .place_initial_settlement_and_road(&state, 0, 0, edge)
            .unwrap();
        let neighbor = engine.graph().vertex_neighbors(0)[0];
        let err = engine
            .place_initial_settlement_and_road(
                &state,
                1,
                neighbor,
                engine.graph().vertex_edges(neighbor)[0],
            )
            .unwrap_err();
        assert_eq!(
            err,
            GameError::IllegalAction(RuleViolation::TooCloseToBuilding(neighbor))
        );
    }

    #[test]
    fn test_regular_actions_rejected_during_setup() {
        let engine = engine();
        let state = new_game(6);
        assert_eq!(
            engine.handle_action(&state, 0, GameAction::RollDice),
            Err(GameError::InvalidPhase)
        );
        assert_eq!(engine.next_turn(&state), Err(GameError::InvalidPhase));
    }

    #[test]
    fn test_initial_handout_requires_building() {
        let engine = engine();
        let state = after_first_round(7);
        let empty = (0..VERTEX_COUNT as VertexId)
            .find(|&v| state.board.vertex_owner(v).is_none())
            .unwrap();
        assert_eq!(
            engine.process_initial_resource_handout(&state, empty),
            Err(GameError::IllegalAction(RuleViolation::VertexUnoccupied(empty)))
        );
    }

    #[test]
    fn test_initial_handout_pays_settler_in_second_round() {
        let engine = engine();
        let state = after_first_round(11);
        let vertex = (0..VERTEX_COUNT as VertexId)
            .find(|&v| state.board.vertex_owner(v) == Some(1))
            .unwrap();

        let next = engine.process_initial_resource_handout(&state, vertex).unwrap();
        assert_eq!(
            next.players[1].resources,
            productive_hand(&engine, &state.board, vertex)
        );
        assert!(next.players[0].resources.is_empty());
        assert!(next.players[2].resources.is_empty());
        assert_eq!(total_cards(&next), 5 * BANK_LIMIT);
    }

    #[test]
    fn test_initial_handout_rejected_outside_second_round() {
        let engine = engine();
        let state = new_game(12);
        let edge = engine.graph().vertex_edges(0)[0];
        let state = engine
            .place_initial_settlement_and_road(&state, 0, 0, edge)
            .unwrap();
        assert_eq!(state.setup_round, 1);
        assert_eq!(
            engine.process_initial_resource_handout(&state, 0),
            Err(GameError::InvalidPhase)
        );

        let state = after_setup(12);
        let vertex = (0..VERTEX_COUNT as VertexId)
            .find(|&v| state.board.vertex_owner(v) == Some(0))
            .unwrap();
        let before = state.clone();
        assert_eq!(
            engine.process_initial_resource_handout(&state, vertex),
            Err(GameError::InvalidPhase)
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_roll_produces_and_moves_to_main_actions() {
        let engine = engine();
        let state = after_setup(8);
        let owed = production_for_roll(engine.graph(), &state.board, 6);
        let next = engine.resolve_roll(&state, 0, (3, 3)).unwrap();
        assert_eq!(next.turn_phase, TurnPhase::MainActions);
        assert_eq!(next.last_roll, Some((3, 3)));
        for (&id, hand) in &owed {
            let before = state.players[id as usize].resources;
            let mut expected = before;
            expected.add_hand(hand);
            assert_eq!(next.players[id as usize].resources, expected);
        }
        assert_eq!(total_cards(&next), 5 * BANK_LIMIT);
    }

    #[test]
    fn test_resolve_roll_checks_dice_and_turn() {
        let engine = engine();
        let state = after_setup(9);
        assert_eq!(
            engine.resolve_roll(&state, 0, (0, 7)),
            Err(GameError::InvalidDice(0, 7))
        );
        assert_eq!(
            engine.resolve_roll(&state, 1, (2, 2)),
            Err(GameError::NotYourTurn)
        );
    }

    #[test]
    fn test_roll_dice_is_deterministic() {
        let engine = engine();
        let state = after_setup(10);
        let a = engine.handle_action(&state, 0, GameAction::RollDice).unwrap();
        let b = engine.handle_action(&state, 0, GameAction::RollDice).unwrap();
        assert_eq!(a, b);
        let (x, y) = a.last_roll.unwrap();
        assert!((1..=6).contains(&x) && (1..=6).contains(&y));
    }

    #[test]
    fn test_seven_without_big_hands_goes_to_robber() {
        let engine = engine();
        let state = after_setup(11);
        let next = engine.resolve_roll(&state, 0, (3, 4)).unwrap();
        assert_eq!(next.turn_phase, TurnPhase::MovingRobber);
        assert!(next.pending_discards.is_empty());
    }

    #[test]
    fn test_seven_discard_flow() {
        let engine = engine();
        let mut state = after_setup(12);
        state.players[1].resources = ResourceHand::with_amounts(3, 3, 2, 0, 0);
        let state = engine.resolve_roll(&state, 0, (6, 1)).unwrap();
        assert_eq!(state.turn_phase, TurnPhase::Discarding);
        assert_eq!(state.pending_discards, vec![1]);

        assert_eq!(
            engine.handle_action(&state, 0, GameAction::DiscardCards(ResourceHand::new())),
            Err(GameError::IllegalAction(RuleViolation::DiscardNotRequired))
        );
        assert_eq!(
            engine.handle_action(
                &state,
                1,
                GameAction::DiscardCards(ResourceHand::single(Resource::Brick, 3))
            ),
            Err(GameError::IllegalAction(RuleViolation::WrongDiscardCount {
                required: 4,
                given: 3
            }))
        );

        let discard = ResourceHand::with_amounts(2, 2, 0, 0, 0);
        let state = engine
            .handle_action(&state, 1, GameAction::DiscardCards(discard))
            .unwrap();
        assert_eq!(state.players[1].resources, ResourceHand::with_amounts(1, 1, 2, 0, 0));
        assert_eq!(state.turn_phase, TurnPhase::MovingRobber);

        let target = (0..19).find(|&t| t != state.board.robber).unwrap();
        let state = engine
            .handle_action(
                &state,
                0,
                GameAction::MoveRobber {
                    tile: target,
                    steal_from: None,
                },
            )
            .unwrap();
        assert_eq!(state.board.robber, target);
        assert_eq!(state.turn_phase, TurnPhase::MainActions);
    }

    #[test]
    fn test_robber_must_move_and_steals_one_card() {
        let engine = engine();
        let mut state = after_setup(13);
        state.turn_phase = TurnPhase::MovingRobber;
        state.last_roll = Some((3, 4));
        let robber = state.board.robber;
        assert_eq!(
            engine.handle_action(
                &state,
                0,
                GameAction::MoveRobber {
                    tile: robber,
                    steal_from: None
                }
            ),
            Err(GameError::IllegalAction(RuleViolation::RobberNotMoved(robber)))
        );

        let tile = state
            .board
            .settlements_of(1)
            .flat_map(|v| engine.graph().vertex_tiles(v).iter().copied())
            .find(|&t| t != robber)
            .unwrap();
        state.players[1].resources = ResourceHand::single(Resource::Ore, 2);
        state.players[0].resources = ResourceHand::new();
        let next = engine
            .handle_action(
                &state,
                0,
                GameAction::MoveRobber {
                    tile,
                    steal_from: Some(1),
                },
            )
            .unwrap();
        assert_eq!(next.players[0].resources, ResourceHand::single(Resource::Ore, 1));
        assert_eq!(next.players[1].resources, ResourceHand::single(Resource::Ore, 1));
    }

    #[test]
    fn test_build_checks_in_order() {
        let engine = engine();
        let mut state = main_actions(14);
        let taken = state.board.roads_of(1).next().unwrap();

        // Out of turn before anything else.
        assert_eq!(
            engine.handle_action(&state, 1, GameAction::BuildRoad(taken)),
            Err(GameError::NotYourTurn)
        );
        // Cost before legality.
        state.players[0].resources = ResourceHand::new();
        assert_eq!(
            engine.handle_action(&state, 0, GameAction::BuildRoad(taken)),
            Err(GameError::InsufficientResources)
        );
        // Pieces before legality.
        state.players[0].resources = costs::road();
        state.players[0].roads_remaining = 0;
        assert_eq!(
            engine.handle_action(&state, 0, GameAction::BuildRoad(taken)),
            Err(GameError::NoPiecesRemaining)
        );
        state.players[0].roads_remaining = 5;
        assert_eq!(
            engine.handle_action(&state, 0, GameAction::BuildRoad(taken)),
            Err(GameError::IllegalAction(RuleViolation::EdgeOccupied(taken)))
        );
    }

    #[test]
    fn test_build_road_pays_bank() {
        let engine = engine();
        let mut state = main_actions(15);
        state.players[0].resources = costs::road();
        state.bank.resources = ResourceHand::uniform(BANK_LIMIT);
        state.bank.resources.saturating_sub_hand(&costs::road());
        let Some(GameAction::BuildRoad(edge)) = engine
            .valid_actions(&state, 0)
            .into_iter()
            .find(|a| matches!(a, GameAction::BuildRoad(_)))
        else {
            panic!("expected a road");
        };
        let next = engine
            .handle_action(&state, 0, GameAction::BuildRoad(edge))
            .unwrap();
        assert_eq!(next.board.edge_owner(edge), Some(0));
        assert!(next.players[0].resources.is_empty());
        assert_eq!(next.players[0].roads_remaining, 12);
        assert_eq!(next.bank.resources, ResourceHand::uniform(BANK_LIMIT));
    }

    #[test]
    fn test_city_upgrade_returns_settlement_piece() {
        let engine = engine();
        let mut state = main_actions(16);
        state.players[0].resources = costs::city();
        let vertex = state.board.settlements_of(0).next().unwrap();
        let next = engine
            .handle_action(&state, 0, GameAction::BuildCity(vertex))
            .unwrap();
        let p = &next.players[0];
        assert_eq!(p.victory_points, 3);
        assert_eq!(p.cities_remaining, 3);
        assert_eq!(p.settlements_remaining, 4);
        assert_eq!(
            engine.handle_action(&next, 0, GameAction::BuildCity(vertex)),
            Err(GameError::InsufficientResources)
        );
    }

    #[test]
    fn test_bought_card_waits_a_turn() {
        let engine = engine();
        let mut state = main_actions(17);
        state.bank.development_cards = vec![DevelopmentCard::Monopoly];
        state.players[0].resources = costs::development_card();
        let state = engine
            .handle_action(&state, 0, GameAction::BuyDevelopmentCard)
            .unwrap();
        assert_eq!(
            state.players[0].dev_cards_bought_this_turn,
            vec![DevelopmentCard::Monopoly]
        );
        assert_eq!(
            engine.handle_action(&state, 0, GameAction::PlayMonopoly(Resource::Ore)),
            Err(GameError::IllegalAction(RuleViolation::CardNotHeld(
                DevelopmentCard::Monopoly
            )))
        );

        let mut broke = state.clone();
        broke.players[0].resources = costs::development_card();
        assert_eq!(
            engine.handle_action(&broke, 0, GameAction::BuyDevelopmentCard),
            Err(GameError::ExhaustedSupply)
        );

        let state = engine.handle_action(&state, 0, GameAction::EndTurn).unwrap();
        assert!(state.players[0].has_playable_dev_card(DevelopmentCard::Monopoly));
    }

    #[test]
    fn test_one_card_per_turn() {
        let engine = engine();
        let mut state = main_actions(18);
        state.players[0].dev_cards = vec![DevelopmentCard::Monopoly, DevelopmentCard::YearOfPlenty];
        let state = engine
            .handle_action(&state, 0, GameAction::PlayMonopoly(Resource::Wool))
            .unwrap();
        assert_eq!(
            engine.handle_action(
                &state,
                0,
                GameAction::PlayYearOfPlenty(Resource::Ore, Resource::Ore)
            ),
            Err(GameError::IllegalAction(RuleViolation::CardAlreadyPlayed))
        );
    }

    #[test]
    fn test_monopoly_collects_from_everyone() {
        let engine = engine();
        let mut state = main_actions(19);
        state.players[0].dev_cards = vec![DevelopmentCard::Monopoly];
        state.players[0].resources = ResourceHand::new();
        state.players[1].resources = ResourceHand::with_amounts(0, 0, 0, 3, 1);
        state.players[2].resources = ResourceHand::with_amounts(0, 0, 0, 2, 0);
        let next = engine
            .handle_action(&state, 0, GameAction::PlayMonopoly(Resource::Grain))
            .unwrap();
        assert_eq!(next.players[0].resources, ResourceHand::single(Resource::Grain, 5));
        assert_eq!(next.players[1].resources, ResourceHand::single(Resource::Wool, 1));
        assert!(next.players[2].resources.is_empty());
    }

    #[test]
    fn test_year_of_plenty_needs_bank_supply() {
        let engine = engine();
        let mut state = main_actions(20);
        state.players[0].dev_cards = vec![DevelopmentCard::YearOfPlenty];
        state.bank.resources.set(Resource::Ore, 1);
        assert_eq!(
            engine.handle_action(
                &state,
                0,
                GameAction::PlayYearOfPlenty(Resource::Ore, Resource::Ore)
            ),
            Err(GameError::ExhaustedSupply)
        );
        let before = state.players[0].resources;
        let next = engine
            .handle_action(
                &state,
                0,
                GameAction::PlayYearOfPlenty(Resource::Ore, Resource::Wool),
            )
            .unwrap();
        assert_eq!(next.players[0].resources.total(), before.total() + 2);
        assert_eq!(next.bank.supply(Resource::Ore), 0);
    }

    #[test]
    fn test_knight_before_roll_returns_to_rolling() {
        let engine = engine();
        let mut state = after_setup(21);
        state.players[0].dev_cards = vec![DevelopmentCard::Knight];
        let state = engine.handle_action(&state, 0, GameAction::PlayKnight).unwrap();
        assert_eq!(state.turn_phase, TurnPhase::MovingRobber);
        assert_eq!(state.players[0].knights_played, 1);

        let tile = (0..19).find(|&t| t != state.board.robber).unwrap();
        let state = engine
            .handle_action(
                &state,
                0,
                GameAction::MoveRobber {
                    tile,
                    steal_from: None,
                },
            )
            .unwrap();
        assert_eq!(state.turn_phase, TurnPhase::RollingDice);
    }

    #[test]
    fn test_third_knight_takes_largest_army() {
        let engine = engine();
        let mut state = main_actions(22);
        state.players[0].knights_played = 2;
        state.players[0].dev_cards = vec![DevelopmentCard::Knight];
        let next = engine.handle_action(&state, 0, GameAction::PlayKnight).unwrap();
        assert_eq!(next.largest_army_holder, Some(0));
        assert_eq!(next.players[0].victory_points, 4);
    }

    #[test]
    fn test_award_ties_keep_holder() {
        let mut players: Vec<Player> = (0..3).map(|i| Player::new(i, "P")).collect();
        let mut holder = None;
        let score = |p: &Player| p.knights_played;

        players[1].knights_played = 2;
        assert!(!reassign_award(&mut players, &mut holder, 3, score));

        players[1].knights_played = 3;
        players[2].knights_played = 3;
        assert!(reassign_award(&mut players, &mut holder, 3, score));
        assert_eq!(holder, Some(1), "earliest seat wins an open tie");

        players[0].knights_played = 3;
        assert!(!reassign_award(&mut players, &mut holder, 3, score));
        assert_eq!(holder, Some(1));

        players[2].knights_played = 4;
        assert!(reassign_award(&mut players, &mut holder, 3, score));
        assert_eq!(holder, Some(2));
        assert_eq!(players[1].victory_points, 0);
        assert_eq!(players[2].victory_points, AWARD_POINTS);
    }

    #[test]
    fn test_longest_road_awarded_at_five() {
        let engine = engine();
        let mut state = main_actions(23);
        for _ in 0..10 {
            if state.longest_road_holder.is_some() {
                break;
            }
            state.players[0].resources = costs::road();
            let best = engine
                .valid_actions(&state, 0)
                .into_iter()
                .filter(|a| matches!(a, GameAction::BuildRoad(_)))
                .map(|a| engine.handle_action(&state, 0, a).unwrap())
                .max_by_key(|s| s.players[0].longest_road_length)
                .unwrap();
            state = best;
        }
        assert_eq!(state.longest_road_holder, Some(0));
        assert!(state.players[0].longest_road_length >= MIN_LONGEST_ROAD);
        assert_eq!(state.players[0].victory_points, 4);
    }

    #[test]
    fn test_bank_trade_uses_port_ratio() {
        let engine = engine();
        let mut state = main_actions(24);
        state.players[0].resources = ResourceHand::single(Resource::Brick, 4);
        let ratio = trade_ratio(&state.board, 0, Resource::Brick);
        let next = engine
            .handle_action(
                &state,
                0,
                GameAction::BankTrade {
                    give: Resource::Brick,
                    receive: Resource::Ore,
                },
            )
            .unwrap();
        assert_eq!(next.players[0].resources.brick, 4 - ratio);
        assert_eq!(next.players[0].resources.ore, 1);

        state.players[0].resources = ResourceHand::single(Resource::Brick, 1);
        assert_eq!(
            engine.handle_action(
                &state,
                0,
                GameAction::BankTrade {
                    give: Resource::Brick,
                    receive: Resource::Ore
                }
            ),
            Err(GameError::InsufficientResources)
        );
    }

    #[test]
    fn test_player_trade() {
        let engine = engine();
        let mut state = main_actions(25);
        state.players[0].resources = ResourceHand::single(Resource::Ore, 2);
        state.players[2].resources = ResourceHand::single(Resource::Wool, 1);
        let offer = TradeOffer::new(
            0,
            Some(2),
            ResourceHand::single(Resource::Ore, 2),
            ResourceHand::single(Resource::Wool, 1),
        );
        let state = engine
            .handle_action(&state, 0, GameAction::ProposeTrade(offer))
            .unwrap();
        assert_eq!(
            engine.handle_action(&state, 1, GameAction::AcceptTrade),
            Err(GameError::InvalidTrade)
        );
        assert_eq!(engine.valid_actions(&state, 2), vec![GameAction::AcceptTrade]);

        let next = engine.handle_action(&state, 2, GameAction::AcceptTrade).unwrap();
        assert_eq!(next.players[0].resources, ResourceHand::single(Resource::Wool, 1));
        assert_eq!(next.players[2].resources, ResourceHand::single(Resource::Ore, 2));
        assert_eq!(next.pending_trade, None);
        assert_eq!(
            engine.handle_action(&next, 0, GameAction::CancelTrade),
            Err(GameError::NoActiveTrade)
        );
    }

    #[test]
    fn test_end_turn_advances_and_clears_trade() {
        let engine = engine();
        let mut state = main_actions(26);
        state.players[0].resources = ResourceHand::single(Resource::Ore, 1);
        let offer = TradeOffer::new(
            0,
            None,
            ResourceHand::single(Resource::Ore, 1),
            ResourceHand::single(Resource::Wool, 1),
        );
        let state = engine
            .handle_action(&state, 0, GameAction::ProposeTrade(offer))
            .unwrap();
        let next = engine.handle_action(&state, 0, GameAction::EndTurn).unwrap();
        assert_eq!(next.current_player, 1);
        assert_eq!(next.turn_phase, TurnPhase::RollingDice);
        assert_eq!(next.last_roll, None);
        assert_eq!(next.pending_trade, None);
        assert_eq!(next.turn_number, state.turn_number + 1);

        let wrapped = engine.next_turn(&engine.next_turn(&next).unwrap()).unwrap();
        assert_eq!(wrapped.current_player, 0);
    }

    #[test]
    fn test_hidden_points_win_at_end_of_turn() {
        let engine = engine();
        let mut state = main_actions(27);
        state.players[0].victory_points = 9;
        let next = engine.handle_action(&state, 0, GameAction::EndTurn).unwrap();
        assert_eq!(next.phase, GamePhase::Main, "9 points is not enough");

        state.players[0].dev_cards.push(DevelopmentCard::VictoryPoint);
        let over = engine.handle_action(&state, 0, GameAction::EndTurn).unwrap();
        assert_eq!(over.phase, GamePhase::GameOver);
        assert_eq!(over.winner, Some(0));
        assert_eq!(
            engine.handle_action(&over, 1, GameAction::RollDice),
            Err(GameError::GameOver)
        );
        assert!(engine.valid_actions(&over, 0).is_empty());
    }

    #[test]
    fn test_unknown_player_rejected() {
        let engine = engine();
        let state = main_actions(28);
        assert_eq!(
            engine.handle_action(&state, 9, GameAction::AcceptTrade),
            Err(GameError::UnknownPlayer(9))
        );
    }

    #[test]
    fn test_first_cards_takes_in_order() {
        let hand = ResourceHand::with_amounts(1, 0, 3, 2, 2);
        assert_eq!(first_cards(&hand, 4), ResourceHand::with_amounts(1, 0, 3, 0, 0));
    }
}
