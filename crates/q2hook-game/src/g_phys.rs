// g_phys.rs — projectile physics and touch dispatch
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

/*
flymissile objects move in a straight line, ignore gravity, and call their
touch function on the first thing they hit. toss and bounce objects also
obey gravity.

players are moved by the client movement code, not here.
*/

use q2hook_common::q_shared::{
    dot_product, vector_add, vector_scale, CPlane, CSurface, Trace, Vec3, MASK_SOLID,
};

use crate::g_local::{Edict, GameContext, MoveType, FRAMETIME};
use crate::game::Solid;
use crate::game_import::*;

const STOP_EPSILON: f32 = 0.1;

// ============================================================
// Touch dispatch
// ============================================================

/// `Edict::touch_fn` value for a grapple projectile.
pub const TOUCH_GRAPPLE: usize = 1;

/// Invoke an entity's touch callback against `other`.
pub fn call_touch(
    ctx: &mut GameContext,
    ent_idx: usize,
    other_idx: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    match ctx.edicts[ent_idx].touch_fn {
        Some(TOUCH_GRAPPLE) => crate::p_hook::grapple_touch(ctx, ent_idx, other_idx, plane, surf),
        Some(unknown) => gi_dprintf(&format!("call_touch: no touch function {}\n", unknown)),
        None => {}
    }
}

/// Two entities have touched, so run their touch functions.
pub fn sv_impact(ctx: &mut GameContext, e1_idx: usize, trace: &Trace) {
    if trace.ent_index < 0 || trace.ent_index as usize >= ctx.edicts.len() {
        return;
    }
    let e2_idx = trace.ent_index as usize;

    if ctx.edicts[e1_idx].touch_fn.is_some() && ctx.edicts[e1_idx].solid != Solid::Not {
        call_touch(ctx, e1_idx, e2_idx, Some(&trace.plane), trace.surface.as_ref());
    }

    if ctx.edicts[e2_idx].inuse
        && ctx.edicts[e2_idx].touch_fn.is_some()
        && ctx.edicts[e2_idx].solid != Solid::Not
    {
        call_touch(ctx, e2_idx, e1_idx, None, None);
    }
}

// ============================================================
// Movement
// ============================================================

/// Slide off of the impacting object.
/// Returns the blocked flags: 1 = floor, 2 = step / wall.
pub fn clip_velocity(in_vel: &Vec3, normal: &Vec3, out: &mut Vec3, overbounce: f32) -> i32 {
    let mut blocked = 0;

    if normal[2] > 0.0 {
        blocked |= 1; // floor
    }
    if normal[2] == 0.0 {
        blocked |= 2; // step
    }

    let backoff = dot_product(in_vel, normal) * overbounce;

    for i in 0..3 {
        out[i] = in_vel[i] - normal[i] * backoff;
        if out[i] > -STOP_EPSILON && out[i] < STOP_EPSILON {
            out[i] = 0.0;
        }
    }

    blocked
}

pub fn sv_add_gravity(ent: &mut Edict, sv_gravity: f32) {
    ent.velocity[2] -= ent.gravity * sv_gravity * FRAMETIME;
}

/// Does not change the entity's velocity at all.
pub fn sv_push_entity(ctx: &mut GameContext, ent_idx: usize, push: &Vec3) -> Trace {
    let start = ctx.edicts[ent_idx].s.origin;
    let end = vector_add(&start, push);

    let mask = match ctx.edicts[ent_idx].clipmask {
        0 => MASK_SOLID,
        m => m,
    };

    let e = &ctx.edicts[ent_idx];
    let trace = gi_trace(&start, &e.mins, &e.maxs, &end, ent_idx as i32, mask);

    ctx.edicts[ent_idx].s.origin = trace.endpos;
    gi_linkentity(ent_idx as i32);

    if trace.fraction != 1.0 {
        sv_impact(ctx, ent_idx, &trace);
    }

    trace
}

/// Toss, bounce, and fly movement. When onground, do nothing.
pub fn sv_physics_toss(ctx: &mut GameContext, ent_idx: usize) {
    if ctx.edicts[ent_idx].velocity[2] > 0.0 {
        ctx.edicts[ent_idx].groundentity = -1;
    }

    // check for the groundentity going away
    let ground = ctx.edicts[ent_idx].groundentity;
    if ground != -1 && !ctx.is_live(ground) {
        ctx.edicts[ent_idx].groundentity = -1;
    }
    if ctx.edicts[ent_idx].groundentity != -1 {
        return;
    }

    let movetype = ctx.edicts[ent_idx].movetype;
    if movetype != MoveType::Fly && movetype != MoveType::FlyMissile {
        let g = ctx.sv_gravity;
        sv_add_gravity(&mut ctx.edicts[ent_idx], g);
    }

    {
        let e = &mut ctx.edicts[ent_idx];
        for i in 0..3 {
            e.s.angles[i] += FRAMETIME * e.avelocity[i];
        }
    }

    let move_vec = vector_scale(&ctx.edicts[ent_idx].velocity, FRAMETIME);
    let trace = sv_push_entity(ctx, ent_idx, &move_vec);
    if !ctx.edicts[ent_idx].inuse {
        return;
    }

    if trace.fraction < 1.0 {
        let backoff = if movetype == MoveType::Bounce { 1.5 } else { 1.0 };
        let mut new_velocity = [0.0; 3];
        clip_velocity(&ctx.edicts[ent_idx].velocity, &trace.plane.normal, &mut new_velocity, backoff);
        let e = &mut ctx.edicts[ent_idx];
        e.velocity = new_velocity;

        // stop if on ground
        if trace.plane.normal[2] > 0.7 && (e.velocity[2] < 60.0 || movetype != MoveType::Bounce) {
            e.groundentity = trace.ent_index;
            e.velocity = [0.0; 3];
            e.avelocity = [0.0; 3];
        }
    }
}

/// Run one tick of physics for a non-player entity.
pub fn g_run_entity(ctx: &mut GameContext, ent_idx: usize) {
    match ctx.edicts[ent_idx].movetype {
        MoveType::Toss | MoveType::Bounce | MoveType::Fly | MoveType::FlyMissile => {
            sv_physics_toss(ctx, ent_idx);
        }
        _ => {}
    }
}
