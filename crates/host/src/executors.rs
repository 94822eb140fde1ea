//! Effect executors for the in-memory world.
//!
//! Each executor performs one [`EffectKind`] against a freshly re-resolved
//! target. Spawned objects land at the target's position; spells are cast
//! from the shared marker.

use std::sync::Arc;
use std::time::Duration;

use reactor_engine::ObjectRef;
use reactor_engine::dispatch::{EffectCall, ExecutorRegistry, Tick};
use reactor_engine::error::ExecError;
use reactor_engine::form::{FormId, FormType, RefId};
use reactor_engine::rules::EffectKind;

use crate::sim::{Position, SimRef, SimWorld, WorldEvent};

/// How often a nudge pushes its target.
pub const NUDGE_EVERY: Duration = Duration::from_millis(50);

/// Distance a nudge moves its target per step.
pub const NUDGE_STEP: Position = [0.0, 0.0, 4.0];

type Call<'a> = EffectCall<'a, SimRef>;

/// A registry with every effect kind wired to `world`.
pub fn standard(world: &Arc<SimWorld>) -> ExecutorRegistry<SimRef> {
    let mut registry = ExecutorRegistry::new();
    let table: [(EffectKind, fn(&SimWorld, &Call<'_>) -> Result<(), ExecError>); 12] = [
        (EffectKind::Dispose, dispose),
        (EffectKind::SpawnItem, spawn_item),
        (EffectKind::SpawnMultipleItems, spawn_multiple_items),
        (EffectKind::SpawnSpell, spawn_spell),
        (EffectKind::SpawnActor, spawn_actor),
        (EffectKind::SpawnImpact, spawn_impact),
        (EffectKind::SpawnExplosion, spawn_explosion),
        (EffectKind::SwapItem, swap_item),
        (EffectKind::SwapWithMultipleItems, swap_with_multiple_items),
        (EffectKind::PlaySound, play_sound),
        (EffectKind::SpawnLeveledItem, spawn_leveled_item),
        (EffectKind::Nudge, nudge),
    ];
    for (kind, run) in table {
        let world = Arc::clone(world);
        registry.register(kind, move |call: &Call<'_>| run(&world, call));
    }
    registry
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn target_id(call: &Call<'_>) -> RefId {
    call.ctx.target.ref_id()
}

fn form(call: &Call<'_>) -> Result<FormId, ExecError> {
    call.effect.form.ok_or(ExecError::MissingForm(call.effect.kind))
}

fn spawn_point(world: &SimWorld, call: &Call<'_>) -> Result<Position, ExecError> {
    let id = target_id(call);
    world.position(id).ok_or(ExecError::NoSpawnPoint(id))
}

fn place_copies(world: &SimWorld, base: FormId, at: Position, count: u32) -> Result<Vec<RefId>, ExecError> {
    (0..count)
        .map(|_| {
            world
                .place(base, at, None)
                .ok_or_else(|| ExecError::Host(format!("form {base} is not loaded")))
        })
        .collect()
}

// ── Executors ────────────────────────────────────────────────────────────

fn dispose(world: &SimWorld, call: &Call<'_>) -> Result<(), ExecError> {
    let id = target_id(call);
    if call.ctx.base.form_type == FormType::Npc {
        return Err(ExecError::Host(format!("refusing to dispose actor {id}")));
    }
    world.dispose(id);
    Ok(())
}

fn spawn_item(world: &SimWorld, call: &Call<'_>) -> Result<(), ExecError> {
    let at = spawn_point(world, call)?;
    place_copies(world, form(call)?, at, call.effect.count)?;
    Ok(())
}

fn spawn_multiple_items(world: &SimWorld, call: &Call<'_>) -> Result<(), ExecError> {
    let at = spawn_point(world, call)?;
    for item in &call.effect.items {
        place_copies(world, item.form, at, item.count)?;
    }
    Ok(())
}

fn spawn_spell(world: &SimWorld, call: &Call<'_>) -> Result<(), ExecError> {
    let spell = form(call)?;
    let at = spawn_point(world, call)?;
    let origin = world.marker();
    world.move_to(origin, at);
    for _ in 0..call.effect.count {
        world.record(WorldEvent::SpellCast {
            spell,
            origin,
            target: target_id(call),
        });
    }
    Ok(())
}

fn spawn_actor(world: &SimWorld, call: &Call<'_>) -> Result<(), ExecError> {
    let at = spawn_point(world, call)?;
    let mut base = form(call)?;
    if world.form(base).is_some_and(|f| f.form_type == FormType::LeveledNpc) {
        base = world
            .resolve_leveled(base)
            .ok_or_else(|| ExecError::Host(format!("leveled list {base} has nothing for this level")))?;
    }
    place_copies(world, base, at, call.effect.count)?;
    Ok(())
}

fn spawn_impact(world: &SimWorld, call: &Call<'_>) -> Result<(), ExecError> {
    let impact = form(call)?;
    let at = spawn_point(world, call)?;
    world.record(WorldEvent::ImpactPlayed { impact, at });
    Ok(())
}

fn spawn_explosion(world: &SimWorld, call: &Call<'_>) -> Result<(), ExecError> {
    let at = spawn_point(world, call)?;
    place_copies(world, form(call)?, at, call.effect.count)?;
    Ok(())
}

fn swap_item(world: &SimWorld, call: &Call<'_>) -> Result<(), ExecError> {
    spawn_item(world, call)?;
    world.dispose(target_id(call));
    Ok(())
}

fn swap_with_multiple_items(world: &SimWorld, call: &Call<'_>) -> Result<(), ExecError> {
    spawn_multiple_items(world, call)?;
    world.dispose(target_id(call));
    Ok(())
}

fn play_sound(world: &SimWorld, call: &Call<'_>) -> Result<(), ExecError> {
    let sound = form(call)?;
    let at = spawn_point(world, call)?;
    world.record(WorldEvent::SoundPlayed { sound, at });
    Ok(())
}

fn spawn_leveled_item(world: &SimWorld, call: &Call<'_>) -> Result<(), ExecError> {
    let list = form(call)?;
    let Some(item) = world.resolve_leveled(list) else {
        tracing::debug!("Leveled list {} has nothing for the current level", list);
        return Ok(());
    };
    let at = spawn_point(world, call)?;
    place_copies(world, item, at, call.effect.count)?;
    Ok(())
}

/// Push the target upwards for the effect's duration.
fn nudge(_world: &SimWorld, call: &Call<'_>) -> Result<(), ExecError> {
    let id = target_id(call);
    call.timers.spawn(
        id,
        call.effect.duration,
        NUDGE_EVERY,
        Box::new(move |target: &SimRef, _elapsed: Duration| {
            match target.world().move_by(target.ref_id(), NUDGE_STEP) {
                Some(_) => Tick::Continue,
                None => Tick::Done,
            }
        }),
    );
    Ok(())
}
