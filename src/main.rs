//! Jump Stars
//!
//! Headless driver: loads configuration and settings, plays a scripted
//! match between two archetypes and verifies it by replay.
//!
//! Usage: `jump-stars [P1_ARCHETYPE] [P2_ARCHETYPE]`

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use jump_stars::{
    VERSION, Game, GameConfig, PlayerIntent, Settings,
    config::settings::SETTINGS_FILE,
    core::constants::NOMINAL_FRAME_DT,
    game::{
        archetype::Archetype,
        events::GameEventData,
        replay,
        state::GamePhase,
    },
};

/// Upper bound on demo length (two full rounds of timer plus pauses).
const DEMO_MAX_FRAMES: u32 = 60 * 60 * 4;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Jump Stars v{}", VERSION);

    let config = GameConfig::from_env().context("loading game configuration")?;
    let mut settings = Settings::load(SETTINGS_FILE).context("loading settings")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    for (slot, arg) in args.iter().take(2).enumerate() {
        settings.selected_archetypes[slot] = arg
            .parse::<Archetype>()
            .with_context(|| format!("player {} archetype", slot + 1))?;
    }
    info!(
        "Sound {}",
        if settings.sound_enabled { "on" } else { "off" }
    );

    demo_match(config, &settings)?;

    settings.save(SETTINGS_FILE).context("saving settings")?;
    Ok(())
}

/// Scripted intents: both players walk toward each other, trade attacks
/// and throw specials and combos on a fixed rhythm.
fn scripted_intents(frame: u32) -> [PlayerIntent; 2] {
    let mut p1 = PlayerIntent::NONE;
    let mut p2 = PlayerIntent::NONE;

    p1.set_move_right(frame % 180 < 120);
    p1.set_attack(frame % 24 == 0);
    p1.set_jump(frame % 150 == 60);
    p1.set_special(frame % 200 == 100);

    // Down, down-forward, forward, attack: a hadoken every 5 seconds
    let phase = frame % 300;
    p2.set_down(phase < 2);
    p2.set_move_left(phase < 4 || frame % 160 < 70);
    p2.set_attack(phase == 4 || frame % 37 == 0);
    p2.set_defend(frame % 240 > 200);

    [p1, p2]
}

fn demo_match(config: GameConfig, settings: &Settings) -> Result<()> {
    info!("=== Starting Demo Match ===");

    let mut game = Game::with_settings(config, settings);
    game.show_character_select()?;
    game.start_game()?;

    let mut total_events = 0;
    for frame in 0..DEMO_MAX_FRAMES {
        let result = game.frame(NOMINAL_FRAME_DT, &scripted_intents(frame));
        total_events += result.events.len();

        for event in &result.events {
            match &event.data {
                GameEventData::ComboTriggered { combatant, combo } => {
                    info!("{} performed {}", combatant, combo.name());
                }
                GameEventData::KnockedOut { combatant } => {
                    info!("{} knocked out at frame {}", combatant, event.frame);
                }
                GameEventData::FellOut { combatant, .. } => {
                    info!("{} fell off the stage", combatant);
                }
                _ => {}
            }
        }

        if game.phase() == GamePhase::GameOver {
            break;
        }
    }

    let Some(round) = game.round() else {
        anyhow::bail!("no match in progress");
    };
    info!("=== Match Results ===");
    info!(
        "Rounds played: {}, scores {:?}, match over: {}",
        round.round_number(),
        round.scores(),
        round.is_match_over()
    );
    for combatant in round.combatants() {
        info!(
            "{} ({}): {:.0}/{:.0} HP",
            combatant.id, combatant.archetype, combatant.health, combatant.stats.max_health
        );
    }
    let hash = round.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    info!("Total events: {}", total_events);

    info!("=== Verifying Determinism ===");
    let recording = game
        .take_recording()
        .context("match was not recorded")?;
    let bytes = recording.to_bytes()?;
    info!("Recording: {} frames, {} bytes", recording.frame_count(), bytes.len());

    let replay_hash = replay::verify(&replay::MatchRecording::from_bytes(&bytes)?)?;
    info!("Replay State Hash: {}", hex::encode(replay_hash));
    info!("DETERMINISM VERIFIED: Hashes match!");

    Ok(())
}
