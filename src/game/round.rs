//! Round Controller
//!
//! Owns the combatants, stage physics, combo recognizers and projectiles
//! of one match and advances them one frame at a time.
//!
//! Frame order:
//! 1. Count down the round timer
//! 2. Apply intents (movement, actions, specials, combos)
//! 3. Timers and physics for every alive combatant
//! 4. Separate overlapping combatants
//! 5. Move and expire projectiles
//! 6. Melee and projectile hits
//! 7. Round-end checks (knockout/draw before timeout)

use serde::{Serialize, Deserialize};
use tracing::{debug, info};
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::config::GameConfig;
use crate::core::constants::{TELEPORT_DISTANCE, UPPERCUT_LAUNCH_FACTOR};
use crate::core::hash::{StateHash, compute_state_hash};
use crate::game::archetype::{Archetype, SpecialEffect};
use crate::game::combat::{pair_mut, resolve_melee, resolve_projectiles};
use crate::game::combatant::{Combatant, CombatantId};
use crate::game::combo::{ComboMove, ComboRecognizer};
use crate::game::events::{GameEvent, RoundEndReason};
use crate::game::input::{ComboInputTracker, PlayerIntent};
use crate::game::physics::PhysicsWorld;
use crate::game::projectile::Projectile;

/// Round lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum RoundState {
    /// Waiting for `start_match`
    #[default]
    NotStarted = 0,
    /// Combat running
    InProgress = 1,
    /// Round over, waiting for the restart countdown or match end
    Ended = 2,
}

/// Result of one frame update.
#[derive(Debug, Default)]
pub struct FrameResult {
    /// Events generated this frame
    pub events: Vec<GameEvent>,
    /// Set when a round ended this frame
    pub round_ended: Option<RoundEndReason>,
    /// Whether the match ended this frame
    pub match_ended: bool,
    /// Round winner (and match winner when the match ended)
    pub winner: Option<CombatantId>,
}

/// Round and match state for two combatants.
#[derive(Clone, Debug)]
pub struct RoundController {
    config: GameConfig,
    physics: PhysicsWorld,
    combatants: [Combatant; 2],
    combos: [ComboRecognizer<ComboMove>; 2],
    trackers: [ComboInputTracker; 2],
    projectiles: Vec<Projectile>,

    round_state: RoundState,
    scores: [u32; 2],
    round: u32,
    time_remaining: f64,
    winner: Option<CombatantId>,
    restart_countdown: Option<f64>,
    match_over: bool,

    frame: u64,
    clock_ms: f64,
    events: Vec<GameEvent>,
}

impl RoundController {
    /// Create a controller for two archetypes. Call [`start_match`](Self::start_match)
    /// before updating.
    pub fn new(archetypes: [Archetype; 2], config: GameConfig) -> Self {
        let spawns = config.round.spawn_points;
        let combatants = [
            Combatant::new(CombatantId::P1, archetypes[0], spawns[0], config.combat),
            Combatant::new(CombatantId::P2, archetypes[1], spawns[1], config.combat),
        ];
        let combos = [
            ComboRecognizer::with_default_combos(config.combo),
            ComboRecognizer::with_default_combos(config.combo),
        ];

        Self {
            physics: PhysicsWorld::new(config.physics.clone()),
            combatants,
            combos,
            trackers: [ComboInputTracker::default(); 2],
            projectiles: Vec::new(),
            round_state: RoundState::NotStarted,
            scores: [0, 0],
            round: 0,
            time_remaining: config.round.round_time,
            winner: None,
            restart_countdown: None,
            match_over: false,
            frame: 0,
            clock_ms: 0.0,
            events: Vec::new(),
            config,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Reset scores and start round 1.
    pub fn start_match(&mut self) {
        self.scores = [0, 0];
        self.round = 0;
        self.match_over = false;
        info!(
            "Match started: {} vs {}",
            self.combatants[0].archetype, self.combatants[1].archetype
        );
        self.start_new_round();
    }

    /// Start the next round, keeping scores.
    pub fn start_new_round(&mut self) {
        self.round += 1;
        self.reset_round();
        info!("Round {} started (scores {:?})", self.round, self.scores);
        self.events.push(GameEvent::round_started(self.frame, self.round));
    }

    /// Restart the current round without scoring it.
    pub fn restart_round(&mut self) {
        if self.match_over {
            return;
        }
        self.reset_round();
        info!("Round {} restarted", self.round);
        self.events.push(GameEvent::round_started(self.frame, self.round));
    }

    fn reset_round(&mut self) {
        let spawns = self.config.round.spawn_points;
        for (combatant, spawn) in self.combatants.iter_mut().zip(spawns) {
            combatant.reset(spawn.x, spawn.y);
        }
        for combo in &mut self.combos {
            combo.clear();
        }
        for tracker in &mut self.trackers {
            tracker.reset();
        }
        self.projectiles.clear();
        self.time_remaining = self.config.round.round_time;
        self.winner = None;
        self.restart_countdown = None;
        self.round_state = RoundState::InProgress;
    }

    // =========================================================================
    // Frame update
    // =========================================================================

    /// Advance the round by `dt` seconds with this frame's intents.
    pub fn update(&mut self, dt: f64, intents: &[PlayerIntent; 2]) -> FrameResult {
        let mut result = FrameResult::default();

        match self.round_state {
            RoundState::NotStarted => {
                result.events = std::mem::take(&mut self.events);
                return result;
            }
            RoundState::Ended => {
                self.advance_clock(dt);
                self.tick_restart_countdown(dt);
                result.events = std::mem::take(&mut self.events);
                return result;
            }
            RoundState::InProgress => {}
        }

        self.advance_clock(dt);

        // 1. Round timer
        self.time_remaining = (self.time_remaining - dt).max(0.0);

        // 2. Intents
        for (i, intent) in intents.iter().enumerate() {
            self.apply_intent(i, *intent);
        }
        let alive_before = [self.combatants[0].alive, self.combatants[1].alive];

        // 3. Timers and physics
        for i in 0..2 {
            self.combos[i].prune(self.clock_ms);
            let combatant = &mut self.combatants[i];
            if !combatant.alive {
                continue;
            }
            combatant.update_timers(dt);
            if let Some(fall) = self.physics.apply_physics(combatant, dt) {
                self.events.push(GameEvent::fell_out(self.frame, combatant.id, fall.damaged));
            }
            combatant.update_attack_box();
        }

        // 4. Character separation
        if let Some((a, b)) = pair_mut(&mut self.combatants, 0, 1) {
            if a.alive && b.alive {
                self.physics.separate_combatants(a, b);
            }
        }

        // 5. Projectiles
        let bounds = self.physics.config().bounds;
        for projectile in &mut self.projectiles {
            projectile.update(dt);
        }
        self.projectiles.retain(|p| !p.is_expired(&bounds));

        // 6. Hits
        let mut hits = resolve_melee(&mut self.combatants);
        hits.extend(resolve_projectiles(&mut self.projectiles, &mut self.combatants));
        for hit in hits {
            debug!(
                "{} hit {} for {:.1} ({:?})",
                hit.attacker, hit.target, hit.damage, hit.source
            );
            self.events.push(GameEvent::hit(self.frame, hit));
        }

        for (was_alive, combatant) in alive_before.iter().zip(&self.combatants) {
            if *was_alive && !combatant.alive {
                debug!("{} knocked out", combatant.id);
                self.events.push(GameEvent::knocked_out(self.frame, combatant.id));
            }
        }

        #[cfg(feature = "debug-tracing")]
        trace!(
            frame = self.frame,
            p1 = %self.combatants[0].position,
            p2 = %self.combatants[1].position,
            "frame"
        );

        // 7. Round end
        self.check_round_end(&mut result);

        result.events = std::mem::take(&mut self.events);
        result
    }

    fn advance_clock(&mut self, dt: f64) {
        self.frame += 1;
        self.clock_ms += dt * 1000.0;
    }

    fn tick_restart_countdown(&mut self, dt: f64) {
        let Some(remaining) = self.restart_countdown else {
            return;
        };
        let remaining = remaining - dt;
        if remaining <= 0.0 {
            self.start_new_round();
        } else {
            self.restart_countdown = Some(remaining);
        }
    }

    fn apply_intent(&mut self, i: usize, intent: PlayerIntent) {
        let opponent_x = self.combatants[1 - i].center().x;
        let own_x = self.combatants[i].center().x;
        let opponent_on_right = opponent_x >= own_x;

        let symbols = self.trackers[i].symbols(&intent, opponent_on_right);

        let combatant = &mut self.combatants[i];
        if !combatant.alive {
            return;
        }

        let dir = intent.move_direction();
        if dir != 0.0 {
            combatant.move_dir(dir);
        }
        if intent.jump() {
            combatant.jump();
        }
        if intent.attack() {
            combatant.attack();
        }
        if intent.defend() {
            combatant.defend();
        } else {
            combatant.stop_defending();
        }

        if intent.special() {
            if let Some(effect) = combatant.use_special() {
                debug!("{} used special {:?}", combatant.id, effect);
                self.events.push(GameEvent::special_used(self.frame, combatant.id, effect));
                if effect == SpecialEffect::Projectile {
                    self.fire_projectile(i);
                }
            }
        }

        for symbol in symbols {
            if let Some(combo) = self.combos[i].record_input(symbol, self.clock_ms) {
                debug!("{} combo {}", self.combatants[i].id, combo.name());
                self.events.push(GameEvent::combo_triggered(self.frame, self.combatants[i].id, combo));
                self.perform_combo(i, combo, opponent_on_right);
            }
        }
    }

    fn fire_projectile(&mut self, i: usize) {
        let projectile = Projectile::spawn(&self.combatants[i]);
        self.events.push(GameEvent::projectile_fired(self.frame, projectile.owner));
        self.projectiles.push(projectile);
    }

    fn perform_combo(&mut self, i: usize, combo: ComboMove, opponent_on_right: bool) {
        match combo {
            ComboMove::Hadoken => self.fire_projectile(i),
            ComboMove::Shoryuken => {
                let combatant = &mut self.combatants[i];
                combatant.velocity.y = -combatant.stats.jump_power * UPPERCUT_LAUNCH_FACTOR;
                combatant.grounded = false;
                combatant.jumping = true;
                combatant.attack();
            }
            ComboMove::Teleport => {
                let away = if opponent_on_right { -1.0 } else { 1.0 };
                self.combatants[i].position.x += away * TELEPORT_DISTANCE;
            }
        }
    }

    fn check_round_end(&mut self, result: &mut FrameResult) {
        let alive: Vec<CombatantId> = self
            .combatants
            .iter()
            .filter(|c| c.alive)
            .map(|c| c.id)
            .collect();

        let (reason, winner) = match alive.as_slice() {
            [] => (RoundEndReason::Draw, None),
            [survivor] => (RoundEndReason::Knockout, Some(*survivor)),
            _ if self.time_remaining <= 0.0 => (RoundEndReason::Timeout, None),
            _ => return,
        };

        self.end_round(reason, winner, result);
    }

    fn end_round(&mut self, reason: RoundEndReason, winner: Option<CombatantId>, result: &mut FrameResult) {
        self.round_state = RoundState::Ended;
        self.winner = winner;
        self.projectiles.clear();
        if let Some(id) = winner {
            self.scores[id.index()] += 1;
        }

        info!(
            "Round {} ended: {:?}, winner {:?}, scores {:?}",
            self.round, reason, winner, self.scores
        );
        self.events.push(GameEvent::round_ended(
            self.frame,
            self.round,
            reason,
            winner,
            self.scores,
        ));
        result.round_ended = Some(reason);
        result.winner = winner;

        let threshold = self.config.round.rounds_to_win;
        if self.scores.iter().any(|&s| s >= threshold) {
            self.match_over = true;
            self.restart_countdown = None;
            let match_winner = self.match_winner();
            info!("Match over: winner {:?}, scores {:?}", match_winner, self.scores);
            self.events.push(GameEvent::match_ended(self.frame, match_winner, self.scores));
            result.match_ended = true;
            result.winner = match_winner;
        } else {
            self.restart_countdown = Some(self.config.round.restart_delay);
        }
    }

    fn match_winner(&self) -> Option<CombatantId> {
        match self.scores[0].cmp(&self.scores[1]) {
            std::cmp::Ordering::Greater => Some(CombatantId::P1),
            std::cmp::Ordering::Less => Some(CombatantId::P2),
            std::cmp::Ordering::Equal => None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Both combatants, indexed by [`CombatantId::index`].
    pub fn combatants(&self) -> &[Combatant; 2] {
        &self.combatants
    }

    /// One combatant.
    pub fn combatant(&self, id: CombatantId) -> &Combatant {
        &self.combatants[id.index().min(1)]
    }

    /// One combatant, mutable for scripted setups.
    pub fn combatant_mut(&mut self, id: CombatantId) -> &mut Combatant {
        &mut self.combatants[id.index().min(1)]
    }

    /// Projectiles in flight.
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Stage physics.
    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// Combo recognizer of a combatant.
    pub fn combo_recognizer(&self, id: CombatantId) -> &ComboRecognizer<ComboMove> {
        &self.combos[id.index().min(1)]
    }

    /// Lifecycle state.
    pub fn round_state(&self) -> RoundState {
        self.round_state
    }

    /// Round wins per player.
    pub fn scores(&self) -> [u32; 2] {
        self.scores
    }

    /// Current round number (1-based, 0 before the match starts).
    pub fn round_number(&self) -> u32 {
        self.round
    }

    /// Seconds left in the round.
    pub fn time_remaining(&self) -> f64 {
        self.time_remaining
    }

    /// Winner of the last finished round.
    pub fn winner(&self) -> Option<CombatantId> {
        self.winner
    }

    /// Seconds until the next round starts, while waiting for it.
    pub fn restart_countdown(&self) -> Option<f64> {
        self.restart_countdown
    }

    /// A player reached the rounds-to-win threshold.
    pub fn is_match_over(&self) -> bool {
        self.match_over
    }

    /// Frames simulated.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Configuration in use.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn set_scores(&mut self, scores: [u32; 2]) {
        self.scores = scores;
    }

    // =========================================================================
    // Hashing
    // =========================================================================

    /// Deterministic hash of the full simulation state.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.frame, |hasher| {
            hasher.update_u8(self.round_state as u8);
            hasher.update_u32(self.round);
            hasher.update_u32(self.scores[0]);
            hasher.update_u32(self.scores[1]);
            hasher.update_f64(self.time_remaining);
            hasher.update_u8(self.winner.map_or(u8::MAX, |w| w.0));
            hasher.update_f64(self.restart_countdown.unwrap_or(-1.0));
            hasher.update_bool(self.match_over);
            hasher.update_f64(self.clock_ms);

            for combatant in &self.combatants {
                combatant.hash_into(hasher);
            }
            for combo in &self.combos {
                combo.hash_into(hasher);
            }
            hasher.update_u32(self.projectiles.len() as u32);
            for projectile in &self.projectiles {
                projectile.hash_into(hasher);
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
