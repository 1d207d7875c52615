// p_weapon.rs — player muzzle projection, noise and the grapple weapon
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

use crate::g_local::*;
use crate::g_utils::{g_project_source, g_spawn};
use crate::game::SVF_NOCLIENT;
use crate::game_import::*;
use crate::p_hook::{grapple_fire, grapple_reset, GRAPPLE_DAMAGE};

/// Gun frame the grapple weapon holds while the hook is out.
pub const GRAPPLE_FRAME_HOLD: i32 = 9;
/// First fire frame of the grapple weapon.
pub const GRAPPLE_FRAME_FIRE: i32 = 5;
/// First deactivate frame of the grapple weapon.
pub const GRAPPLE_FRAME_DROP: i32 = 32;

// ============================================================
// P_ProjectSource
// ============================================================

/// Adjusts weapon offset based on handedness, then calls G_ProjectSource.
pub fn p_project_source(client: &GClient, point: &Vec3, distance: &Vec3, forward: &Vec3, right: &Vec3) -> Vec3 {
    let mut dist = *distance;
    if client.pers.hand == LEFT_HANDED {
        dist[1] *= -1.0;
    } else if client.pers.hand == CENTER_HANDED {
        dist[1] = 0.0;
    }
    g_project_source(point, &dist, forward, right)
}

// ============================================================
// PlayerNoise
// ============================================================

fn spawn_noise(ctx: &mut GameContext, who_idx: usize) -> Option<usize> {
    let idx = g_spawn(ctx)?;
    let noise = &mut ctx.edicts[idx];
    noise.classname = "player_noise".to_string();
    noise.mins = [-8.0, -8.0, -8.0];
    noise.maxs = [8.0, 8.0, 8.0];
    noise.owner = who_idx as i32;
    noise.svflags = SVF_NOCLIENT;
    Some(idx)
}

/// Each player can have two noise objects associated with it:
/// a personal noise (jumping, pain, weapon firing), and a weapon
/// target noise (bullet wall impacts).
///
/// Monsters that don't directly see the player can move
/// to a noise in hopes of seeing the player from there.
pub fn player_noise(ctx: &mut GameContext, who_idx: usize, where_pos: &Vec3, noise_type: i32) {
    if noise_type == PNOISE_WEAPON {
        if let Some(cl) = ctx.client_of_mut(who_idx) {
            if cl.silencer_shots > 0 {
                cl.silencer_shots -= 1;
                return;
            }
        }
    }

    if ctx.deathmatch != 0.0 {
        return;
    }

    if ctx.edicts[who_idx].flags.intersects(FL_NOTARGET) {
        return;
    }

    if ctx.edicts[who_idx].mynoise <= 0 {
        let (Some(noise), Some(noise2)) = (spawn_noise(ctx, who_idx), spawn_noise(ctx, who_idx)) else {
            return;
        };
        ctx.edicts[who_idx].mynoise = noise as i32;
        ctx.edicts[who_idx].mynoise2 = noise2 as i32;
    }

    let noise_idx = if noise_type == PNOISE_SELF || noise_type == PNOISE_WEAPON {
        ctx.level.sound_entity = ctx.edicts[who_idx].mynoise;
        ctx.level.sound_entity_framenum = ctx.level.framenum;
        ctx.edicts[who_idx].mynoise as usize
    } else {
        // PNOISE_IMPACT
        ctx.level.sound2_entity = ctx.edicts[who_idx].mynoise2;
        ctx.level.sound2_entity_framenum = ctx.level.framenum;
        ctx.edicts[who_idx].mynoise2 as usize
    };

    let time = ctx.level.time;
    let noise = &mut ctx.edicts[noise_idx];
    noise.s.origin = *where_pos;
    noise.absmin = vector_subtract(where_pos, &noise.maxs);
    noise.absmax = vector_add(where_pos, &noise.maxs);
    noise.teleport_time = time;

    gi_linkentity(noise_idx as i32);
}

// ============================================================
// Grapple weapon
// ============================================================

/// Fire callback for the grapple weapon's fire frame.
pub fn weapon_grapple_fire(ctx: &mut GameContext, ent_idx: usize) {
    grapple_fire(ctx, ent_idx, GRAPPLE_DAMAGE, false);
    if let Some(cl) = ctx.client_of_mut(ent_idx) {
        cl.ps.gunframe += 1;
    }
}

/// Runs before the generic weapon frame logic: hold the fire frame while
/// the button is down, release the hook when it comes up, and force a
/// drop when a switch is requested while hooked.
pub fn weapon_grapple_think(ctx: &mut GameContext, ent_idx: usize) {
    let Some(cl) = ctx.client_of(ent_idx) else {
        return;
    };
    let attack = cl.buttons & BUTTON_ATTACK as i32 != 0;

    // if the the attack button is still down, stay in the firing frame
    if let Some(cl) = ctx.client_of_mut(ent_idx) {
        if attack && cl.weaponstate == WeaponState::Firing && cl.grapple.is_some() {
            cl.ps.gunframe = GRAPPLE_FRAME_HOLD;
        }
    }

    let hook = ctx.client_of(ent_idx).and_then(|cl| cl.grapple);
    if let (false, Some(hook)) = (attack, hook) {
        grapple_reset(ctx, hook);
        if let Some(cl) = ctx.client_of_mut(ent_idx) {
            if cl.weaponstate == WeaponState::Firing {
                cl.weaponstate = WeaponState::Ready;
            }
        }
    }

    if let Some(cl) = ctx.client_of_mut(ent_idx) {
        if cl.newweapon.is_some()
            && cl.grapple_state > GrappleState::Fly
            && cl.weaponstate == WeaponState::Firing
        {
            // he wants to change weapons while grappled
            cl.weaponstate = WeaponState::Dropping;
            cl.ps.gunframe = GRAPPLE_FRAME_DROP;
        }
    }
}

/// Runs after the generic weapon frame logic: when the grapple was just
/// reselected with a hook still attached, jump straight to firing.
pub fn weapon_grapple_post(ctx: &mut GameContext, ent_idx: usize, prevstate: WeaponState) {
    let Some(cl) = ctx.client_of_mut(ent_idx) else {
        return;
    };
    if prevstate == WeaponState::Activating
        && cl.weaponstate == WeaponState::Ready
        && cl.grapple_state > GrappleState::Fly
    {
        cl.ps.gunframe = if cl.buttons & BUTTON_ATTACK as i32 == 0 {
            GRAPPLE_FRAME_HOLD
        } else {
            GRAPPLE_FRAME_FIRE
        };
        cl.weaponstate = WeaponState::Firing;
    }
}

/// Grapple weapon think. `weapon_generic` is the host's frame sequencer
/// and receives `weapon_grapple_fire` as its fire callback.
pub fn weapon_grapple<F>(ctx: &mut GameContext, ent_idx: usize, weapon_generic: F)
where
    F: FnOnce(&mut GameContext, usize, fn(&mut GameContext, usize)),
{
    weapon_grapple_think(ctx, ent_idx);

    let Some(prevstate) = ctx.client_of(ent_idx).map(|cl| cl.weaponstate) else {
        return;
    };
    weapon_generic(ctx, ent_idx, weapon_grapple_fire);

    weapon_grapple_post(ctx, ent_idx, prevstate);
}
