//! Per-frame simulation tick
//!
//! Order: moving platforms, player drive, physics, bouncy launch, enemies and
//! projectiles, interactions, combo decay, fall-out, completion.

use glam::Vec2;

use super::physics::{Aabb, Body};
use super::player::PlayerEvent;
use super::state::{GameEvent, GamePhase, GameState};
use crate::audio::AudioPort;
use crate::consts::*;
use crate::input::InputState;
use crate::level::PlatformKind;

/// Feet within this distance of an enemy's top count as a stomp
const STOMP_MARGIN: f32 = 12.0;
/// Feet within this distance of a platform top count as standing on it
const STAND_TOLERANCE: f32 = 1.0;

fn standing_on(body: &Body, platform: &Aabb) -> bool {
    (body.bottom() - platform.min.y).abs() <= STAND_TOLERANCE
        && body.pos.x + body.half.x > platform.min.x
        && body.pos.x - body.half.x < platform.max.x
}

/// Advance the level by `elapsed_ms` (clamped to `MAX_FRAME_MS`)
pub fn tick(state: &mut GameState, input: &InputState, elapsed_ms: f32, audio: &mut dyn AudioPort) {
    state.events.clear();
    if state.phase != GamePhase::Playing {
        return;
    }
    let elapsed_ms = elapsed_ms.clamp(0.0, MAX_FRAME_MS);
    let dt = elapsed_ms / 1000.0;
    state.time_elapsed_ms += elapsed_ms as f64;

    // Moving platforms carry whoever stands on them
    let grounded = state.body.contacts.down;
    for platform in &mut state.platforms {
        let riding = grounded && standing_on(&state.body, &platform.bounds);
        let dx = platform.update(elapsed_ms);
        if riding {
            state.body.pos.x += dx;
        }
    }

    // Player
    let output = state.player.drive(input, elapsed_ms, &mut state.body);
    for event in &output.events {
        match event {
            PlayerEvent::Jumped => state.events.push(GameEvent::Jumped),
            PlayerEvent::WallJumped => state.events.push(GameEvent::WallJumped),
            PlayerEvent::Respawned => {
                state.events.push(GameEvent::Respawned);
                continue;
            }
        }
        audio.play_sfx("jump", 1.0);
    }
    state.movement = output.state;
    state.visual = Some(output.visual);

    // Physics
    let solids = state.solids();
    state.world.step(&mut state.body, dt, &solids);

    // Bouncy platforms launch on landing
    if state.body.contacts.down
        && state
            .platforms
            .iter()
            .any(|p| p.kind == PlatformKind::Bouncy && standing_on(&state.body, &p.bounds))
    {
        state.body.vel.y = BOUNCY_LAUNCH_SPEED;
        state.events.push(GameEvent::Bounced);
        audio.play_sfx("bounce", 1.0);
    }

    // Enemies and projectiles
    for i in 0..state.enemies.len() {
        let id = state.peek_entity_id();
        if let Some(shot) = state.enemies[i].update(elapsed_ms, id) {
            state.next_entity_id();
            state.projectiles.push(shot);
        }
    }
    state.projectiles.retain_mut(|p| p.update(elapsed_ms, &solids));

    interactions(state, audio);

    if state.combo.decay(elapsed_ms) {
        state.events.push(GameEvent::ComboExpired);
    }

    // Fell out of the world
    if state.body.pos.y > FALL_LIMIT_Y {
        log::debug!("Player fell out at x={:.0}", state.body.pos.x);
        take_damage(state, audio);
    }

    // Completion
    if state.phase == GamePhase::Playing && state.total_notes > 0 && state.notes.is_empty() {
        complete(state);
    }

    // Camera
    let view = Vec2::new(VIEW_WIDTH as f32, VIEW_HEIGHT as f32);
    state.camera_scroll = state.camera.follow(state.camera_scroll, state.body.pos, view);
}

fn interactions(state: &mut GameState, audio: &mut dyn AudioPort) {
    let player_box = state.body.aabb();

    // Notes
    let mut collected = Vec::new();
    state.notes.retain(|note| {
        let hit = player_box.overlaps(&note.aabb());
        if hit {
            collected.push(note.id);
        }
        !hit
    });
    for id in collected {
        let multiplier = state.combo.register();
        let score = NOTE_SCORE * multiplier as u64;
        state.score += score;
        state.events.push(GameEvent::NoteCollected { id, score, multiplier });
        audio.play_sfx("note", 0.8);
    }

    let mut hurt = state.hazards.iter().any(|h| player_box.overlaps(&h.aabb()));

    // Enemies: stomp from above, otherwise damage
    let falling = state.body.vel.y >= 0.0;
    let feet = state.body.bottom();
    let mut stomped = Vec::new();
    for enemy in &state.enemies {
        let enemy_box = enemy.aabb();
        if !player_box.overlaps(&enemy_box) {
            continue;
        }
        if falling && feet - enemy_box.min.y <= STOMP_MARGIN {
            stomped.push(enemy.id);
        } else {
            hurt = true;
        }
    }
    if !stomped.is_empty() {
        state.enemies.retain(|e| !stomped.contains(&e.id));
        for id in stomped {
            state.score += STOMP_SCORE;
            state.events.push(GameEvent::EnemyStomped { id });
            audio.play_sfx("note", 0.7);
            audio.play_sfx("explosion", 0.5);
        }
        state.body.vel.y = STOMP_BOUNCE_SPEED;
    }

    // Projectiles are spent on contact
    let before = state.projectiles.len();
    state.projectiles.retain(|p| !player_box.overlaps(&p.aabb()));
    if state.projectiles.len() != before {
        hurt = true;
    }

    if hurt {
        take_damage(state, audio);
        return;
    }

    if player_box.overlaps(&state.goal.aabb()) {
        complete(state);
    }
}

fn take_damage(state: &mut GameState, audio: &mut dyn AudioPort) {
    audio.play_sfx("death", 1.0);
    state.deaths += 1;
    state.combo.reset();
    state.events.push(GameEvent::PlayerHit);
    state.player.respawn_body(&mut state.body);
    state.events.push(GameEvent::Respawned);
}

fn complete(state: &mut GameState) {
    state.phase = GamePhase::LevelComplete;
    log::info!(
        "Level '{}' complete: score {}, {}/{} notes, {} deaths",
        state.level_name,
        state.score,
        state.notes_collected(),
        state.total_notes,
        state.deaths
    );
    state.events.push(GameEvent::LevelComplete {
        next_level: state.goal.next_level.clone(),
    });
}
