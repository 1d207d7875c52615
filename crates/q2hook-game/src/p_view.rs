// p_view.rs — player end-of-frame view, feedback and animation
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

use q2hook_common::common::rand_i32;

use crate::g_combat::{power_armor_type, t_damage};
use crate::g_local::*;
use crate::game_import::*;
use crate::m_player_frames::*;
use crate::p_hud::{deathmatch_scoreboard_message, g_check_chase_stats, g_set_spectator_stats, g_set_stats};
use crate::p_weapon::player_noise;

/// Model index of the player model; other indices are vwep or gib models.
const PLAYER_MODEL: i32 = 255;

// ============================================================
// View context
// ============================================================

/// Per-player intermediates computed once at the top of the pipeline and
/// shared by the later stages of the same tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewContext {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub xyspeed: f32,
    pub bobmove: f32,
    pub bobcycle: i32,
    pub bobfracsin: f32,
}

/// Powerup layers flicker once fewer than 30 frames remain.
fn powerup_visible(remaining: i32) -> bool {
    remaining > 30 || (remaining & 4) != 0
}

// ============================================================
// SV_CalcRoll
// ============================================================

pub fn sv_calc_roll(velocity: &Vec3, right: &Vec3, rollangle: f32, rollspeed: f32) -> f32 {
    let mut side = dot_product(velocity, right);
    let sign = if side < 0.0 { -1.0 } else { 1.0 };
    side = side.abs();

    if side < rollspeed {
        side = side * rollangle / rollspeed;
    } else {
        side = rollangle;
    }

    side * sign
}

// ============================================================
// P_DamageFeedback
//
// Handles color blends and view kicks
// ============================================================

const POWER_COLOR: Vec3 = [0.0, 1.0, 0.0];
const ARMOR_COLOR: Vec3 = [1.0, 1.0, 1.0];
const BLOOD_COLOR: Vec3 = [1.0, 0.0, 0.0];

pub fn p_damage_feedback(ctx: &mut GameContext, ent_idx: usize, vctx: &ViewContext) {
    let framenum = ctx.level.framenum;
    let time = ctx.level.time;
    let Some(client_idx) = ctx.edicts[ent_idx].client else {
        return;
    };
    let ent = &mut ctx.edicts[ent_idx];
    let cl = &mut ctx.clients[client_idx];

    let protected = ent.flags.intersects(FL_GODMODE) || cl.invincible_framenum > framenum;

    // flash the backgrounds behind the status numbers
    cl.ps.stats[STAT_FLASHES] = 0;
    if cl.damage_blood != 0 {
        cl.ps.stats[STAT_FLASHES] |= 1;
    }
    if cl.damage_armor != 0 && !protected {
        cl.ps.stats[STAT_FLASHES] |= 2;
    }

    // total points of damage shot at the player this frame
    let total = cl.damage_blood + cl.damage_armor + cl.damage_parmor;
    if total == 0 {
        return; // didn't take any damage
    }

    // start a pain animation if still in the player model
    if cl.anim_priority < ANIM_PAIN && ent.s.modelindex == PLAYER_MODEL {
        cl.anim_priority = ANIM_PAIN;
        if cl.ps.pmove.pm_flags & PMF_DUCKED != 0 {
            ent.s.frame = FRAME_CRPAIN1 - 1;
            cl.anim_end = FRAME_CRPAIN4;
        } else {
            ctx.pain_anim_index = (ctx.pain_anim_index + 1) % 3;
            let (first, last) = match ctx.pain_anim_index {
                0 => (FRAME_PAIN101, FRAME_PAIN104),
                1 => (FRAME_PAIN201, FRAME_PAIN204),
                _ => (FRAME_PAIN301, FRAME_PAIN304),
            };
            ent.s.frame = first - 1;
            cl.anim_end = last;
        }
    }

    let realcount = total as f32;
    let count = realcount.max(10.0); // always make a visible effect

    // play an appropriate pain sound
    if framenum > ent.pain_debounce_framenum && !protected {
        let r = 1 + (rand_i32() & 1);
        ent.pain_debounce_framenum = framenum + 7 * BASE_FRAMERATE / 10;
        let l = match ent.health {
            h if h < 25 => 25,
            h if h < 50 => 50,
            h if h < 75 => 75,
            _ => 100,
        };
        gi_sound(ent_idx as i32, CHAN_VOICE, gi_soundindex(&format!("*pain{}_{}.wav", l, r)), 1.0, ATTN_NORM, 0.0);
    }

    // the total alpha of the blend is always proportional to count
    cl.damage_alpha = (cl.damage_alpha.max(0.0) + count * 0.01).clamp(0.2, 0.6);

    // the color of the blend will vary based on how much was absorbed
    // by different armors
    let mut v = VEC3_ORIGIN;
    if cl.damage_parmor != 0 {
        v = vector_ma(&v, cl.damage_parmor as f32 / realcount, &POWER_COLOR);
    }
    if cl.damage_armor != 0 {
        v = vector_ma(&v, cl.damage_armor as f32 / realcount, &ARMOR_COLOR);
    }
    if cl.damage_blood != 0 {
        v = vector_ma(&v, cl.damage_blood as f32 / realcount, &BLOOD_COLOR);
    }
    cl.damage_blend = v;

    // calculate view angle kicks; a kick of 0 means no view adjust at all
    let kick = cl.damage_knockback.abs() as f32;
    if kick != 0.0 && ent.health > 0 {
        let kick = (kick * 100.0 / ent.health as f32).max(count * 0.5).min(50.0);

        let mut v = vector_subtract(&cl.damage_from, &ent.s.origin);
        vector_normalize(&mut v);

        cl.v_dmg_roll = kick * dot_product(&v, &vctx.right) * 0.3;
        cl.v_dmg_pitch = kick * -dot_product(&v, &vctx.forward) * 0.3;
        cl.v_dmg_time = time + DAMAGE_TIME;
    }

    // clear totals
    cl.damage_blood = 0;
    cl.damage_armor = 0;
    cl.damage_parmor = 0;
    cl.damage_knockback = 0;
}

// ============================================================
// SV_CalcViewOffset
//
// fall from 128: 400 = 160000
// fall from 256: 580 = 336400
// fall from 384: 720 = 518400
// fall from 512: 800 = 640000
// fall from 640: 960 =
//
// damage = deltavelocity*deltavelocity * 0.0001
// ============================================================

pub fn sv_calc_view_offset(ctx: &mut GameContext, ent_idx: usize, vctx: &ViewContext) {
    let time = ctx.level.time;
    let (run_pitch, run_roll, bob_pitch, bob_roll, bob_up) =
        (ctx.run_pitch, ctx.run_roll, ctx.bob_pitch, ctx.bob_roll, ctx.bob_up);
    let Some((ent, cl)) = ctx.player_mut(ent_idx) else {
        return;
    };
    let ducked = cl.ps.pmove.pm_flags & PMF_DUCKED != 0;

    // if dead, fix the angle and don't add any kick
    if ent.deadflag != DEAD_NO {
        cl.ps.kick_angles = VEC3_ORIGIN;

        cl.ps.viewangles[ROLL] = 40.0;
        cl.ps.viewangles[PITCH] = -15.0;
        cl.ps.viewangles[YAW] = cl.killer_yaw;
    } else {
        // weapon kick
        let mut angles = cl.kick_angles;

        // damage kick
        let mut ratio = (cl.v_dmg_time - time) / DAMAGE_TIME;
        if ratio < 0.0 {
            ratio = 0.0;
            cl.v_dmg_pitch = 0.0;
            cl.v_dmg_roll = 0.0;
        }
        angles[PITCH] += ratio * cl.v_dmg_pitch;
        angles[ROLL] += ratio * cl.v_dmg_roll;

        // fall kick
        let ratio = ((cl.fall_time - time) / FALL_TIME).max(0.0);
        angles[PITCH] += ratio * cl.fall_value;

        // velocity
        angles[PITCH] += dot_product(&ent.velocity, &vctx.forward) * run_pitch;
        angles[ROLL] += dot_product(&ent.velocity, &vctx.right) * run_roll;

        // bob
        let crouch = if ducked { 6.0 } else { 1.0 };
        angles[PITCH] += vctx.bobfracsin * bob_pitch * vctx.xyspeed * crouch;
        let mut delta = vctx.bobfracsin * bob_roll * vctx.xyspeed * crouch;
        if vctx.bobcycle & 1 != 0 {
            delta = -delta;
        }
        angles[ROLL] += delta;

        cl.ps.kick_angles = angles;
    }

    // base origin
    let mut v = [0.0, 0.0, ent.viewheight as f32];

    // fall height
    let ratio = ((cl.fall_time - time) / FALL_TIME).max(0.0);
    v[2] -= ratio * cl.fall_value * 0.4;

    // bob height
    v[2] += (vctx.bobfracsin * vctx.xyspeed * bob_up).min(6.0);

    v = vector_add(&v, &cl.kick_origin);

    // absolutely bound offsets
    // so the view can never be outside the player box
    v[0] = v[0].clamp(-14.0, 14.0);
    v[1] = v[1].clamp(-14.0, 14.0);
    v[2] = v[2].clamp(-22.0, 30.0);

    cl.ps.viewoffset = v;
}

// ============================================================
// SV_CalcGunOffset
// ============================================================

pub fn sv_calc_gun_offset(ctx: &mut GameContext, ent_idx: usize, vctx: &ViewContext) {
    let (gun_x, gun_y, gun_z) = (ctx.gun_x, ctx.gun_y, ctx.gun_z);
    let Some(cl) = ctx.client_of_mut(ent_idx) else {
        return;
    };

    // gun angles from bobbing
    cl.ps.gunangles[ROLL] = vctx.xyspeed * vctx.bobfracsin * 0.005;
    cl.ps.gunangles[YAW] = vctx.xyspeed * vctx.bobfracsin * 0.01;
    if vctx.bobcycle & 1 != 0 {
        cl.ps.gunangles[ROLL] = -cl.ps.gunangles[ROLL];
        cl.ps.gunangles[YAW] = -cl.ps.gunangles[YAW];
    }
    cl.ps.gunangles[PITCH] = vctx.xyspeed * vctx.bobfracsin * 0.005;

    // gun angles from delta movement
    for i in 0..3 {
        let mut delta = cl.oldviewangles[i] - cl.ps.viewangles[i];
        if delta > 180.0 {
            delta -= 360.0;
        }
        if delta < -180.0 {
            delta += 360.0;
        }
        let delta = delta.clamp(-45.0, 45.0);
        if i == YAW {
            cl.ps.gunangles[ROLL] += 0.1 * delta;
        }
        cl.ps.gunangles[i] += 0.2 * delta;
    }

    // gun_x / gun_y / gun_z are development tools
    for i in 0..3 {
        cl.ps.gunoffset[i] = vctx.forward[i] * gun_y + vctx.right[i] * gun_x - vctx.up[i] * gun_z;
    }
}

// ============================================================
// SV_AddBlend / SV_CalcBlend
// ============================================================

/// Composite one color layer over `v_blend`, back to front.
pub fn sv_add_blend(r: f32, g: f32, b: f32, a: f32, v_blend: &mut [f32; 4]) {
    if a <= 0.0 {
        return;
    }
    let a2 = v_blend[3] + (1.0 - v_blend[3]) * a; // new total alpha
    let a3 = v_blend[3] / a2; // fraction of color from old

    v_blend[0] = v_blend[0] * a3 + r * (1.0 - a3);
    v_blend[1] = v_blend[1] * a3 + g * (1.0 - a3);
    v_blend[2] = v_blend[2] * a3 + b * (1.0 - a3);
    v_blend[3] = a2;
}

struct PowerupBlend {
    fade_sound: &'static str,
    color: [f32; 4],
}

const QUAD_BLEND: PowerupBlend = PowerupBlend { fade_sound: "items/damage2.wav", color: [0.0, 0.0, 1.0, 0.08] };
const INVUL_BLEND: PowerupBlend = PowerupBlend { fade_sound: "items/protect2.wav", color: [1.0, 1.0, 0.0, 0.08] };
const ENVIRO_BLEND: PowerupBlend = PowerupBlend { fade_sound: "items/airout.wav", color: [0.0, 1.0, 0.0, 0.08] };
const BREATHER_BLEND: PowerupBlend = PowerupBlend { fade_sound: "items/airout.wav", color: [0.4, 1.0, 0.4, 0.04] };

pub fn sv_calc_blend(ctx: &mut GameContext, ent_idx: usize) {
    let framenum = ctx.level.framenum;
    let Some((ent, cl)) = ctx.player_mut(ent_idx) else {
        return;
    };

    cl.ps.blend = [0.0; 4];

    // add for contents
    let vieworg = vector_add(&ent.s.origin, &cl.ps.viewoffset);
    let contents = gi_pointcontents(&vieworg);
    if contents & (CONTENTS_LAVA | CONTENTS_SLIME | CONTENTS_WATER) != 0 {
        cl.ps.rdflags |= RDF_UNDERWATER;
    } else {
        cl.ps.rdflags &= !RDF_UNDERWATER;
    }

    if contents & (CONTENTS_SOLID | CONTENTS_LAVA) != 0 {
        sv_add_blend(1.0, 0.3, 0.0, 0.6, &mut cl.ps.blend);
    } else if contents & CONTENTS_SLIME != 0 {
        sv_add_blend(0.0, 0.1, 0.05, 0.6, &mut cl.ps.blend);
    } else if contents & CONTENTS_WATER != 0 {
        sv_add_blend(0.5, 0.3, 0.2, 0.4, &mut cl.ps.blend);
    }

    // add for powerups, strongest first
    let powerup = [
        (cl.quad_framenum, &QUAD_BLEND),
        (cl.invincible_framenum, &INVUL_BLEND),
        (cl.enviro_framenum, &ENVIRO_BLEND),
        (cl.breather_framenum, &BREATHER_BLEND),
    ]
    .into_iter()
    .find(|&(until, _)| until > framenum);

    if let Some((until, layer)) = powerup {
        let remaining = until - framenum;
        if remaining == 30 {
            // beginning to fade
            gi_sound(ent_idx as i32, CHAN_ITEM, gi_soundindex(layer.fade_sound), 1.0, ATTN_NORM, 0.0);
        }
        if powerup_visible(remaining) {
            let [r, g, b, a] = layer.color;
            sv_add_blend(r, g, b, a, &mut cl.ps.blend);
        }
    }

    // add for damage
    if cl.damage_alpha > 0.0 {
        let [r, g, b] = cl.damage_blend;
        sv_add_blend(r, g, b, cl.damage_alpha, &mut cl.ps.blend);
    }

    if cl.bonus_alpha > 0.0 {
        sv_add_blend(0.85, 0.7, 0.3, cl.bonus_alpha, &mut cl.ps.blend);
    }

    // drop the damage value
    cl.damage_alpha = (cl.damage_alpha - 0.06).max(0.0);

    // drop the bonus value
    cl.bonus_alpha = (cl.bonus_alpha - 0.1).max(0.0);
}

// ============================================================
// P_FallingDamage
// ============================================================

/// Whether the player is covered by the grapple's fall immunity: hanging or
/// pulling on a hook, or released one within the last two seconds.
pub fn grapple_fall_grace(cl: &GClient, framenum: i32) -> bool {
    framenum - cl.grapple_release_framenum <= 2 * BASE_FRAMERATE
        || (cl.grapple.is_some() && cl.grapple_state > GrappleState::Fly)
}

pub fn p_falling_damage(ctx: &mut GameContext, ent_idx: usize) {
    let framenum = ctx.level.framenum;
    let time = ctx.level.time;
    let no_falling = ctx.deathmatch != 0.0
        && DmFlags::from_bits_truncate(ctx.dmflags as i32).intersects(DF_NO_FALLING);

    let damage = {
        let Some((ent, cl)) = ctx.player_mut(ent_idx) else {
            return;
        };

        if ent.s.modelindex != PLAYER_MODEL {
            return; // not in the player model
        }
        if ent.movetype == MoveType::Noclip {
            return;
        }

        let airborne = ent.groundentity == -1;
        let delta = if cl.oldvelocity[2] < 0.0 && ent.velocity[2] > cl.oldvelocity[2] && airborne {
            cl.oldvelocity[2]
        } else if airborne {
            return;
        } else {
            ent.velocity[2] - cl.oldvelocity[2]
        };
        let mut delta = delta * delta * 0.0001;

        if grapple_fall_grace(cl, framenum) {
            return;
        }

        // never take falling damage if completely underwater
        match ent.waterlevel {
            3 => return,
            2 => delta *= 0.25,
            1 => delta *= 0.5,
            _ => {}
        }

        if delta < 1.0 {
            return;
        }

        if delta < 15.0 {
            ent.s.event = EV_FOOTSTEP;
            return;
        }

        cl.fall_value = (delta * 0.5).min(40.0);
        cl.fall_time = time + FALL_TIME;

        if delta <= 30.0 {
            ent.s.event = EV_FALLSHORT;
            return;
        }

        if ent.health > 0 {
            ent.s.event = if delta >= 55.0 { EV_FALLFAR } else { EV_FALL };
        }
        ent.pain_debounce_framenum = framenum; // no normal pain sound
        ((delta - 30.0) / 2.0).max(1.0) as i32
    };

    if !no_falling {
        let origin = ctx.edicts[ent_idx].s.origin;
        t_damage(ctx, ent_idx, 0, 0, &[0.0, 0.0, 1.0], &origin, &VEC3_ORIGIN, damage, 0,
                 DamageFlags::empty(), MOD_FALLING);
    }
}

// ============================================================
// P_WorldEffects
// ============================================================

fn body_sound(ent_idx: usize, channel: i32, name: &str) {
    gi_sound(ent_idx as i32, channel, gi_soundindex(name), 1.0, ATTN_NORM, 0.0);
}

pub fn p_world_effects(ctx: &mut GameContext, ent_idx: usize) {
    let framenum = ctx.level.framenum;
    let Some(client_idx) = ctx.edicts[ent_idx].client else {
        return;
    };

    if ctx.edicts[ent_idx].movetype == MoveType::Noclip {
        ctx.edicts[ent_idx].air_finished = framenum + 12 * BASE_FRAMERATE; // don't need air
        return;
    }

    let origin = ctx.edicts[ent_idx].s.origin;
    let waterlevel = ctx.edicts[ent_idx].waterlevel;
    let watertype = ctx.edicts[ent_idx].watertype;
    let old_waterlevel = ctx.clients[client_idx].old_waterlevel;
    ctx.clients[client_idx].old_waterlevel = waterlevel;

    let breather = ctx.clients[client_idx].breather_framenum > framenum;
    let envirosuit = ctx.clients[client_idx].enviro_framenum > framenum;

    // if just entered a water volume, play a sound
    if old_waterlevel == 0 && waterlevel != 0 {
        player_noise(ctx, ent_idx, &origin, PNOISE_SELF);
        if watertype & CONTENTS_LAVA != 0 {
            body_sound(ent_idx, CHAN_BODY, "player/lava_in.wav");
        } else if watertype & (CONTENTS_SLIME | CONTENTS_WATER) != 0 {
            body_sound(ent_idx, CHAN_BODY, "player/watr_in.wav");
        }
        let ent = &mut ctx.edicts[ent_idx];
        ent.flags.insert(FL_INWATER);

        // clear damage_debounce, so the pain sound will play immediately
        ent.damage_debounce_framenum = framenum - BASE_FRAMERATE;
    }

    // if just completely exited a water volume, play a sound
    if old_waterlevel != 0 && waterlevel == 0 {
        player_noise(ctx, ent_idx, &origin, PNOISE_SELF);
        body_sound(ent_idx, CHAN_BODY, "player/watr_out.wav");
        ctx.edicts[ent_idx].flags.remove(FL_INWATER);
    }

    // check for head just going under water
    if old_waterlevel != 3 && waterlevel == 3 {
        body_sound(ent_idx, CHAN_BODY, "player/watr_un.wav");
    }

    // check for head just coming out of water
    if old_waterlevel == 3 && waterlevel != 3 {
        let air_finished = ctx.edicts[ent_idx].air_finished;
        if air_finished < framenum {
            // gasp for air
            body_sound(ent_idx, CHAN_VOICE, "player/gasp1.wav");
            player_noise(ctx, ent_idx, &origin, PNOISE_SELF);
        } else if air_finished < framenum + 11 * BASE_FRAMERATE {
            // just break surface
            body_sound(ent_idx, CHAN_VOICE, "player/gasp2.wav");
        }
    }

    // check for drowning
    if waterlevel == 3 {
        // breather or envirosuit give air
        if breather || envirosuit {
            ctx.edicts[ent_idx].air_finished = framenum + 10 * BASE_FRAMERATE;

            let cl = &mut ctx.clients[client_idx];
            if (cl.breather_framenum - framenum) % 25 == 0 {
                let snd = if cl.breather_sound == 0 { "player/u_breath1.wav" } else { "player/u_breath2.wav" };
                body_sound(ent_idx, CHAN_AUTO, snd);
                cl.breather_sound ^= 1;
                player_noise(ctx, ent_idx, &origin, PNOISE_SELF);
            }
        }

        // if out of air, start drowning
        let ent = &mut ctx.edicts[ent_idx];
        let cl = &mut ctx.clients[client_idx];
        if ent.air_finished < framenum && cl.next_drown_framenum < framenum && ent.health > 0 {
            cl.next_drown_framenum = framenum + BASE_FRAMERATE;

            // take more damage the longer underwater
            ent.dmg = (ent.dmg + 2).min(15);

            // play a gurp sound instead of a normal pain sound
            if ent.health <= ent.dmg {
                body_sound(ent_idx, CHAN_VOICE, "player/drown1.wav");
            } else if rand_i32() & 1 != 0 {
                body_sound(ent_idx, CHAN_VOICE, "*gurp1.wav");
            } else {
                body_sound(ent_idx, CHAN_VOICE, "*gurp2.wav");
            }

            ent.pain_debounce_framenum = framenum;

            let dmg = ent.dmg;
            t_damage(ctx, ent_idx, 0, 0, &VEC3_ORIGIN, &origin, &VEC3_ORIGIN, dmg, 0,
                     DAMAGE_NO_ARMOR, MOD_WATER);
        }
    } else {
        let ent = &mut ctx.edicts[ent_idx];
        ent.air_finished = framenum + 12 * BASE_FRAMERATE;
        ent.dmg = 2;
    }

    // check for sizzle damage
    if waterlevel != 0 && watertype & (CONTENTS_LAVA | CONTENTS_SLIME) != 0 {
        if watertype & CONTENTS_LAVA != 0 {
            let invincible = ctx.clients[client_idx].invincible_framenum >= framenum;
            let ent = &mut ctx.edicts[ent_idx];
            if ent.health > 0 && ent.pain_debounce_framenum <= framenum && !invincible {
                let snd = if rand_i32() & 1 != 0 { "player/burn1.wav" } else { "player/burn2.wav" };
                body_sound(ent_idx, CHAN_VOICE, snd);
                ent.pain_debounce_framenum = framenum + BASE_FRAMERATE;
            }

            // take 1/3 damage with envirosuit
            let dmg = if envirosuit { waterlevel } else { 3 * waterlevel };
            t_damage(ctx, ent_idx, 0, 0, &VEC3_ORIGIN, &origin, &VEC3_ORIGIN, dmg, 0,
                     DamageFlags::empty(), MOD_LAVA);
        }

        // no damage from slime with envirosuit
        if watertype & CONTENTS_SLIME != 0 && !envirosuit {
            t_damage(ctx, ent_idx, 0, 0, &VEC3_ORIGIN, &origin, &VEC3_ORIGIN, waterlevel, 0,
                     DamageFlags::empty(), MOD_SLIME);
        }
    }
}

// ============================================================
// G_SetClientEffects / G_SetClientEvent / G_SetClientSound
// ============================================================

pub fn g_set_client_effects(ctx: &mut GameContext, ent_idx: usize) {
    let framenum = ctx.level.framenum;
    let intermission = ctx.level.intermissiontime != 0.0;
    let pa_type = power_armor_type(ctx, ent_idx);
    let Some((ent, cl)) = ctx.player_mut(ent_idx) else {
        return;
    };

    ent.s.effects = 0;
    ent.s.renderfx = RF_IR_VISIBLE;

    if ent.health <= 0 || intermission {
        return;
    }

    if ent.powerarmor_framenum > framenum {
        if pa_type == POWER_ARMOR_SCREEN {
            ent.s.effects |= EF_POWERSCREEN;
        } else if pa_type == POWER_ARMOR_SHIELD {
            ent.s.effects |= EF_COLOR_SHELL;
            ent.s.renderfx |= RF_SHELL_GREEN;
        }
    }

    if cl.quad_framenum > framenum && powerup_visible(cl.quad_framenum - framenum) {
        ent.s.effects |= EF_QUAD;
    }

    if cl.invincible_framenum > framenum && powerup_visible(cl.invincible_framenum - framenum) {
        ent.s.effects |= EF_PENT;
    }

    // show cheaters!!!
    if ent.flags.intersects(FL_GODMODE) {
        ent.s.effects |= EF_COLOR_SHELL;
        ent.s.renderfx |= RF_SHELL_RED | RF_SHELL_GREEN | RF_SHELL_BLUE;
    }
}

pub fn g_set_client_event(ctx: &mut GameContext, ent_idx: usize, vctx: &ViewContext) {
    let Some((ent, cl)) = ctx.player_mut(ent_idx) else {
        return;
    };

    if ent.s.event != EV_NONE {
        return;
    }

    if ent.groundentity != -1
        && vctx.xyspeed > 225.0
        && (cl.bobtime + vctx.bobmove) as i32 != vctx.bobcycle
    {
        ent.s.event = EV_FOOTSTEP;
    }
}

pub fn g_set_client_sound(ctx: &mut GameContext, ent_idx: usize) {
    let framenum = ctx.level.framenum;
    let helpchanged = ctx.game.helpchanged;
    let single_player = ctx.deathmatch == 0.0;
    let snd_fry = ctx.snd_fry;
    let (railgun, bfg) = (ctx.railgun_index, ctx.bfg_index);
    let Some((ent, cl)) = ctx.player_mut(ent_idx) else {
        return;
    };

    if single_player {
        if cl.pers.game_helpchanged != helpchanged {
            cl.pers.game_helpchanged = helpchanged;
            cl.pers.helpchanged = 1;
        }

        // help beep (no more than three times)
        if cl.pers.helpchanged != 0 && cl.pers.helpchanged <= 3 && (framenum & 63) == 0 {
            cl.pers.helpchanged += 1;
            gi_sound(ent_idx as i32, CHAN_VOICE, gi_soundindex("misc/pc_up.wav"), 1.0, ATTN_STATIC, 0.0);
        }
    }

    ent.s.sound = if ent.waterlevel != 0 && ent.watertype & (CONTENTS_LAVA | CONTENTS_SLIME) != 0 {
        snd_fry
    } else if cl.weapon_sound != 0 {
        cl.weapon_sound
    } else if cl.pers.weapon.is_some() && cl.pers.weapon == railgun {
        gi_soundindex("weapons/rg_hum.wav")
    } else if cl.pers.weapon.is_some() && cl.pers.weapon == bfg {
        gi_soundindex("weapons/bfg_hum.wav")
    } else {
        0
    };
}

// ============================================================
// G_SetClientFrame
// ============================================================

/// Inputs to the player animation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimState {
    pub priority: i32,
    pub frame: i32,
    pub end: i32,
    pub grounded: bool,
    pub duck: bool,
    pub run: bool,
    /// Duck and run as of the last sequence start.
    pub anim_duck: bool,
    pub anim_run: bool,
    /// A grapple hook is out.
    pub hooked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimStep {
    /// Move to this frame within the current sequence.
    Advance(i32),
    /// Stay on the current frame.
    Hold,
    /// Switch sequence, keeping the recorded duck/run.
    Chain { priority: i32, frame: i32, end: i32 },
    /// Start a new base sequence and record the current duck/run.
    Restart { priority: i32, frame: i32, end: i32 },
}

/// One tick of the player animation state machine.
pub fn anim_transition(s: &AnimState) -> AnimStep {
    let newanim = (s.duck != s.anim_duck && s.priority < ANIM_DEATH)
        || (s.run != s.anim_run && s.priority == ANIM_BASIC)
        || (!s.grounded && s.priority <= ANIM_WAVE);

    if !newanim {
        if s.priority == ANIM_REVERSE {
            if s.frame > s.end {
                return AnimStep::Advance(s.frame - 1);
            }
        } else if s.frame < s.end {
            // continue an animation
            return AnimStep::Advance(s.frame + 1);
        }

        if s.priority == ANIM_DEATH {
            return AnimStep::Hold; // stay there
        }
        if s.priority == ANIM_JUMP {
            if !s.grounded {
                return AnimStep::Hold; // stay there
            }
            return AnimStep::Chain { priority: ANIM_WAVE, frame: FRAME_JUMP3, end: FRAME_JUMP6 };
        }
    }

    // return to either a running or standing frame
    let (priority, frame, end) = if !s.grounded {
        if s.hooked {
            // on a grapple, stand instead of jumping
            (ANIM_BASIC, FRAME_STAND01, FRAME_STAND40)
        } else {
            let frame = if s.frame != FRAME_JUMP2 { FRAME_JUMP1 } else { FRAME_JUMP2 };
            (ANIM_JUMP, frame, FRAME_JUMP2)
        }
    } else if s.run {
        if s.duck {
            (ANIM_BASIC, FRAME_CRWALK1, FRAME_CRWALK6)
        } else {
            (ANIM_BASIC, FRAME_RUN1, FRAME_RUN6)
        }
    } else if s.duck {
        (ANIM_BASIC, FRAME_CRSTND01, FRAME_CRSTND19)
    } else {
        (ANIM_BASIC, FRAME_STAND01, FRAME_STAND40)
    };
    AnimStep::Restart { priority, frame, end }
}

pub fn g_set_client_frame(ctx: &mut GameContext, ent_idx: usize, vctx: &ViewContext) {
    let Some((ent, cl)) = ctx.player_mut(ent_idx) else {
        return;
    };

    if ent.s.modelindex != PLAYER_MODEL {
        return; // not in the player model
    }

    let state = AnimState {
        priority: cl.anim_priority,
        frame: ent.s.frame,
        end: cl.anim_end,
        grounded: ent.groundentity != -1,
        duck: cl.ps.pmove.pm_flags & PMF_DUCKED != 0,
        run: vctx.xyspeed != 0.0,
        anim_duck: cl.anim_duck,
        anim_run: cl.anim_run,
        hooked: cl.grapple.is_some(),
    };

    match anim_transition(&state) {
        AnimStep::Advance(frame) => ent.s.frame = frame,
        AnimStep::Hold => {}
        AnimStep::Chain { priority, frame, end } => {
            cl.anim_priority = priority;
            ent.s.frame = frame;
            cl.anim_end = end;
        }
        AnimStep::Restart { priority, frame, end } => {
            cl.anim_priority = priority;
            cl.anim_duck = state.duck;
            cl.anim_run = state.run;
            ent.s.frame = frame;
            cl.anim_end = end;
        }
    }
}

// ============================================================
// ClientEndServerFrame
// ============================================================

/// Called for each player at the end of the server frame and right after
/// spawning.
pub fn client_end_server_frame(ctx: &mut GameContext, ent_idx: usize) {
    let (rollangle, rollspeed) = (ctx.sv_rollangle, ctx.sv_rollspeed);
    let intermission = ctx.level.intermissiontime != 0.0;

    //
    // If the origin or velocity have changed since ClientThink(),
    // update the pmove values. This will happen when the client
    // is pushed by a bmodel or kicked by an explosion.
    //
    // If it wasn't updated here, the view position would lag a frame
    // behind the body position when pushed -- "sinking into plats"
    //
    {
        let Some((ent, cl)) = ctx.player_mut(ent_idx) else {
            return;
        };
        for i in 0..3 {
            cl.ps.pmove.origin[i] = (ent.s.origin[i] * 8.0) as i16;
            cl.ps.pmove.velocity[i] = (ent.velocity[i] * 8.0) as i16;
        }

        //
        // If the end of unit layout is displayed, don't give
        // the player any normal movement attributes
        //
        if intermission {
            cl.ps.blend[3] = 0.0;
            cl.ps.fov = 90.0;
        }
    }
    if intermission {
        g_set_stats(ctx, ent_idx);
        return;
    }

    let mut vctx = ViewContext::default();
    if let Some(cl) = ctx.client_of(ent_idx) {
        angle_vectors(&cl.v_angle, Some(&mut vctx.forward), Some(&mut vctx.right), Some(&mut vctx.up));
    }

    // burn from lava, etc
    p_world_effects(ctx, ent_idx);

    {
        let Some((ent, cl)) = ctx.player_mut(ent_idx) else {
            return;
        };

        //
        // set model angles from view angles so other things in
        // the world can tell which direction you are looking
        //
        ent.s.angles[PITCH] = if cl.v_angle[PITCH] > 180.0 {
            (-360.0 + cl.v_angle[PITCH]) / 3.0
        } else {
            cl.v_angle[PITCH] / 3.0
        };
        ent.s.angles[YAW] = cl.v_angle[YAW];
        ent.s.angles[ROLL] = sv_calc_roll(&ent.velocity, &vctx.right, rollangle, rollspeed) * 4.0;

        //
        // calculate speed and cycle to be used for
        // all cyclic walking effects
        //
        vctx.xyspeed = (ent.velocity[0] * ent.velocity[0] + ent.velocity[1] * ent.velocity[1]).sqrt();

        if vctx.xyspeed < 5.0 {
            vctx.bobmove = 0.0;
            cl.bobtime = 0.0; // start at beginning of cycle again
        } else if ent.groundentity != -1 {
            // so bobbing only cycles when on ground
            vctx.bobmove = if vctx.xyspeed > 210.0 {
                0.25
            } else if vctx.xyspeed > 100.0 {
                0.125
            } else {
                0.0625
            };
        }

        cl.bobtime += vctx.bobmove;
        let mut bobtime = cl.bobtime;
        if cl.ps.pmove.pm_flags & PMF_DUCKED != 0 {
            bobtime *= 4.0;
        }

        vctx.bobcycle = bobtime as i32;
        vctx.bobfracsin = (bobtime * std::f32::consts::PI).sin().abs();
    }

    // detect hitting the floor
    p_falling_damage(ctx, ent_idx);

    // apply all the damage taken this frame
    p_damage_feedback(ctx, ent_idx, &vctx);

    // determine the view offsets
    sv_calc_view_offset(ctx, ent_idx, &vctx);

    // determine the gun offsets
    sv_calc_gun_offset(ctx, ent_idx, &vctx);

    // determine the full screen color blend
    // must be after viewoffset, so eye contents can be
    // accurately determined
    sv_calc_blend(ctx, ent_idx);

    // chase cam stuff
    let spectator = ctx.client_of(ent_idx).is_some_and(|cl| cl.resp.spectator);
    if spectator {
        g_set_spectator_stats(ctx, ent_idx);
    } else {
        g_set_stats(ctx, ent_idx);
    }
    g_check_chase_stats(ctx, ent_idx);

    g_set_client_event(ctx, ent_idx, &vctx);

    g_set_client_effects(ctx, ent_idx);

    g_set_client_sound(ctx, ent_idx);

    g_set_client_frame(ctx, ent_idx, &vctx);

    let framenum = ctx.level.framenum;
    let enemy = ctx.edicts[ent_idx].enemy;
    let showscores = {
        let Some((ent, cl)) = ctx.player_mut(ent_idx) else {
            return;
        };
        cl.oldvelocity = ent.velocity;
        cl.oldviewangles = cl.ps.viewangles;

        // clear weapon kicks
        cl.kick_origin = VEC3_ORIGIN;
        cl.kick_angles = VEC3_ORIGIN;
        cl.showscores
    };

    // if the scoreboard is up, update it
    if showscores && (framenum & 31) == 0 {
        deathmatch_scoreboard_message(ctx, ent_idx, enemy);
        gi_unicast(ent_idx as i32, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.0001
    }

    // ---- blend ----

    #[test]
    fn test_add_blend_matches_closed_form() {
        let layers = [
            [1.0, 0.3, 0.0, 0.6],
            [0.0, 0.0, 1.0, 0.08],
            [1.0, 0.0, 0.0, 0.35],
            [0.85, 0.7, 0.3, 0.2],
        ];
        let mut blend = [0.0f32; 4];
        for [r, g, b, a] in layers {
            sv_add_blend(r, g, b, a, &mut blend);
        }

        // alpha = 1 - prod(1 - a_i)
        let alpha = 1.0 - layers.iter().map(|l| 1.0 - l[3]).product::<f32>();
        assert!(close(blend[3], alpha));

        // each layer's color weight is a_i * prod_{j > i}(1 - a_j) / alpha
        for c in 0..3 {
            let mut expected = 0.0;
            for (i, l) in layers.iter().enumerate() {
                let cover: f32 = layers[i + 1..].iter().map(|m| 1.0 - m[3]).product();
                expected += l[c] * l[3] * cover;
            }
            assert!(close(blend[c], expected / alpha), "channel {}", c);
        }
    }

    #[test]
    fn test_add_blend_ignores_transparent_layer() {
        let mut blend = [0.2, 0.4, 0.6, 0.5];
        sv_add_blend(1.0, 1.0, 1.0, 0.0, &mut blend);
        assert_eq!(blend, [0.2, 0.4, 0.6, 0.5]);
    }

    #[test]
    fn test_alpha_decay_floors_at_zero() {
        let mut ctx = make_ctx();
        ctx.clients[0].damage_alpha = 0.1;
        ctx.clients[0].bonus_alpha = 0.15;

        sv_calc_blend(&mut ctx, PLAYER);
        assert!(close(ctx.clients[0].damage_alpha, 0.04));
        assert!(close(ctx.clients[0].bonus_alpha, 0.05));

        sv_calc_blend(&mut ctx, PLAYER);
        assert_eq!(ctx.clients[0].damage_alpha, 0.0);
        assert_eq!(ctx.clients[0].bonus_alpha, 0.0);

        sv_calc_blend(&mut ctx, PLAYER);
        assert_eq!(ctx.clients[0].damage_alpha, 0.0);
        assert_eq!(ctx.clients[0].ps.blend, [0.0; 4]);
    }

    #[test]
    fn test_underwater_blend_and_flag() {
        let mut ctx = make_ctx();
        set_contents(CONTENTS_WATER);
        sv_calc_blend(&mut ctx, PLAYER);
        let cl = &ctx.clients[0];
        assert_ne!(cl.ps.rdflags & RDF_UNDERWATER, 0);
        assert_eq!(cl.ps.blend, [0.5, 0.3, 0.2, 0.4]);

        set_contents(0);
        sv_calc_blend(&mut ctx, PLAYER);
        assert_eq!(ctx.clients[0].ps.rdflags & RDF_UNDERWATER, 0);
    }

    #[test]
    fn test_powerup_flicker_rule() {
        assert!(powerup_visible(31));
        assert!(powerup_visible(30)); // 30 & 4 != 0
        assert!(!powerup_visible(27));
        assert!(!powerup_visible(24));
        assert!(powerup_visible(4));
        assert!(!powerup_visible(3));
    }

    #[test]
    fn test_quad_fade_cue_and_layer() {
        let mut ctx = make_ctx();
        ctx.clients[0].quad_framenum = ctx.level.framenum + 30;
        sv_calc_blend(&mut ctx, PLAYER);

        let log = take_log();
        assert_eq!(count_sounds(&log, "items/damage2.wav"), 1);
        assert_eq!(ctx.clients[0].ps.blend, [0.0, 0.0, 1.0, 0.08]);

        // flickered off, and no second cue
        ctx.clients[0].quad_framenum = ctx.level.framenum + 27;
        sv_calc_blend(&mut ctx, PLAYER);
        assert_eq!(ctx.clients[0].ps.blend[3], 0.0);
        assert!(take_log().sounds.is_empty());
    }

    // ---- falling ----

    fn landing(ctx: &mut GameContext, speed: f32) {
        ctx.clients[0].oldvelocity = [0.0, 0.0, -speed];
        ctx.edicts[PLAYER].velocity = VEC3_ORIGIN;
        ctx.edicts[PLAYER].groundentity = 0;
    }

    #[test]
    fn test_hard_landing_damages() {
        let mut ctx = make_ctx();
        landing(&mut ctx, 700.0); // delta 49

        p_falling_damage(&mut ctx, PLAYER);

        let ent = &ctx.edicts[PLAYER];
        assert_eq!(ent.s.event, EV_FALL);
        assert_eq!(ent.health, 100 - 9);
        assert_eq!(ctx.means_of_death, MOD_FALLING);
        assert!(close(ctx.clients[0].fall_value, 24.5));
        assert_eq!(ctx.clients[0].damage_blood, 9);
    }

    #[test]
    fn test_fall_thresholds() {
        let mut ctx = make_ctx();
        landing(&mut ctx, 300.0); // delta 9
        p_falling_damage(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].s.event, EV_FOOTSTEP);

        let mut ctx = make_ctx();
        landing(&mut ctx, 500.0); // delta 25
        p_falling_damage(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].s.event, EV_FALLSHORT);
        assert_eq!(ctx.edicts[PLAYER].health, 100);

        let mut ctx = make_ctx();
        landing(&mut ctx, 800.0); // delta 64
        p_falling_damage(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].s.event, EV_FALLFAR);
        assert_eq!(ctx.edicts[PLAYER].health, 100 - 17);
        assert!(close(ctx.clients[0].fall_value, 32.0));

        let mut ctx = make_ctx();
        landing(&mut ctx, 50.0); // delta 0.25
        p_falling_damage(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].s.event, EV_NONE);
    }

    #[test]
    fn test_water_cushions_fall() {
        let mut ctx = make_ctx();
        landing(&mut ctx, 800.0);
        ctx.edicts[PLAYER].waterlevel = 3;
        p_falling_damage(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].s.event, EV_NONE);

        let mut ctx = make_ctx();
        landing(&mut ctx, 800.0); // 64 * 0.5 = 32
        ctx.edicts[PLAYER].waterlevel = 1;
        p_falling_damage(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].s.event, EV_FALL);
        assert_eq!(ctx.edicts[PLAYER].health, 99);
    }

    #[test]
    fn test_grapple_release_grace_window() {
        let mut ctx = make_ctx();
        landing(&mut ctx, 800.0);
        ctx.clients[0].grapple_release_framenum = ctx.level.framenum - 2 * BASE_FRAMERATE;
        p_falling_damage(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].health, 100);
        assert_eq!(ctx.edicts[PLAYER].s.event, EV_NONE);

        ctx.clients[0].grapple_release_framenum = ctx.level.framenum - 2 * BASE_FRAMERATE - 1;
        p_falling_damage(&mut ctx, PLAYER);
        assert!(ctx.edicts[PLAYER].health < 100);
    }

    #[test]
    fn test_attached_grapple_prevents_fall_damage() {
        let mut ctx = make_ctx();
        let hook = spawn_box(&mut ctx, [0.0, 0.0, 200.0]);
        ctx.clients[0].grapple = Some(hook);
        ctx.clients[0].grapple_state = GrappleState::Hang;
        landing(&mut ctx, 800.0);

        p_falling_damage(&mut ctx, PLAYER);

        assert_eq!(ctx.edicts[PLAYER].health, 100);
    }

    #[test]
    fn test_no_falling_dmflag() {
        let mut ctx = make_ctx();
        ctx.deathmatch = 1.0;
        ctx.dmflags = DF_NO_FALLING.bits() as f32;
        landing(&mut ctx, 800.0);

        p_falling_damage(&mut ctx, PLAYER);

        assert_eq!(ctx.edicts[PLAYER].s.event, EV_FALLFAR);
        assert_eq!(ctx.edicts[PLAYER].health, 100);
    }

    // ---- damage feedback ----

    #[test]
    fn test_plain_hit_feedback() {
        let mut ctx = make_ctx();
        let origin = ctx.edicts[PLAYER].s.origin;
        t_damage(&mut ctx, PLAYER, 0, 0, &VEC3_ORIGIN, &origin, &VEC3_ORIGIN, 12, 0,
                 DamageFlags::empty(), MOD_UNKNOWN);
        clear_log();

        p_damage_feedback(&mut ctx, PLAYER, &ViewContext::default());

        let cl = &ctx.clients[0];
        assert_eq!(cl.anim_priority, ANIM_PAIN);
        assert_eq!(ctx.pain_anim_index, 1);
        assert_eq!(ctx.edicts[PLAYER].s.frame, FRAME_PAIN201 - 1);
        assert_eq!(cl.anim_end, FRAME_PAIN204);
        assert!(close(cl.damage_alpha, 0.2));
        assert_eq!(cl.damage_blend, [1.0, 0.0, 0.0]);
        assert_eq!(cl.ps.stats[STAT_FLASHES], 1);
        assert_eq!(cl.damage_blood, 0);

        let log = take_log();
        assert_eq!(log.sounds.len(), 1);
        assert!(log.sounds[0].name.starts_with("*pain100_"));
        assert_eq!(ctx.edicts[PLAYER].pain_debounce_framenum, ctx.level.framenum + 7);
    }

    #[test]
    fn test_feedback_mixes_armor_colors() {
        let mut ctx = make_ctx();
        ctx.clients[0].damage_blood = 10;
        ctx.clients[0].damage_armor = 10;
        ctx.clients[0].damage_parmor = 20;
        ctx.clients[0].damage_alpha = 0.5;

        p_damage_feedback(&mut ctx, PLAYER, &ViewContext::default());

        let cl = &ctx.clients[0];
        assert!(close(cl.damage_alpha, 0.6));
        assert!(close(cl.damage_blend[0], 0.5));
        assert!(close(cl.damage_blend[1], 0.75));
        assert!(close(cl.damage_blend[2], 0.25));
        assert_eq!(cl.ps.stats[STAT_FLASHES], 3);
    }

    #[test]
    fn test_feedback_knockback_kick() {
        let mut ctx = make_ctx();
        let vctx = ViewContext { forward: [1.0, 0.0, 0.0], right: [0.0, -1.0, 0.0], ..ViewContext::default() };
        ctx.clients[0].damage_blood = 20;
        ctx.clients[0].damage_knockback = 20;
        ctx.clients[0].damage_from = [100.0, 0.0, 0.0];

        p_damage_feedback(&mut ctx, PLAYER, &vctx);

        let cl = &ctx.clients[0];
        // kick = max(20 * 100 / 100, 20 * 0.5) = 20, hit from straight ahead
        assert!(close(cl.v_dmg_pitch, -6.0));
        assert!(close(cl.v_dmg_roll, 0.0));
        assert!(close(cl.v_dmg_time, ctx.level.time + DAMAGE_TIME));
    }

    #[test]
    fn test_protected_player_feels_no_pain() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].flags.insert(FL_GODMODE);
        ctx.clients[0].damage_blood = 10;
        ctx.clients[0].damage_armor = 5;

        p_damage_feedback(&mut ctx, PLAYER, &ViewContext::default());

        assert!(take_log().sounds.is_empty());
        assert_eq!(ctx.edicts[PLAYER].pain_debounce_framenum, 0);
        // blood still flashes, armor does not
        assert_eq!(ctx.clients[0].ps.stats[STAT_FLASHES], 1);
        assert_eq!(ctx.clients[0].anim_priority, ANIM_PAIN);

        let mut ctx = make_ctx();
        ctx.clients[0].invincible_framenum = ctx.level.framenum + 50;
        ctx.clients[0].damage_blood = 10;

        p_damage_feedback(&mut ctx, PLAYER, &ViewContext::default());

        assert!(take_log().sounds.is_empty());
        assert!(close(ctx.clients[0].damage_alpha, 0.2));
    }

    #[test]
    fn test_no_damage_no_feedback() {
        let mut ctx = make_ctx();
        p_damage_feedback(&mut ctx, PLAYER, &ViewContext::default());
        assert_eq!(ctx.clients[0].anim_priority, ANIM_BASIC);
        assert!(take_log().sounds.is_empty());
    }

    // ---- view offset ----

    #[test]
    fn test_view_offset_clamped() {
        let mut ctx = make_ctx();
        ctx.clients[0].kick_origin = [40.0, -40.0, 40.0];
        sv_calc_view_offset(&mut ctx, PLAYER, &ViewContext::default());
        assert_eq!(ctx.clients[0].ps.viewoffset, [14.0, -14.0, 30.0]);
    }

    #[test]
    fn test_dead_view_angles() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].deadflag = DEAD_DEAD;
        ctx.clients[0].killer_yaw = 135.0;
        ctx.clients[0].kick_angles = [5.0, 5.0, 5.0];

        sv_calc_view_offset(&mut ctx, PLAYER, &ViewContext::default());

        let ps = &ctx.clients[0].ps;
        assert_eq!(ps.kick_angles, VEC3_ORIGIN);
        assert_eq!(ps.viewangles, [-15.0, 135.0, 40.0]);
    }

    #[test]
    fn test_damage_and_fall_kicks_fade() {
        let mut ctx = make_ctx();
        let time = ctx.level.time;
        {
            let cl = &mut ctx.clients[0];
            cl.v_dmg_pitch = -6.0;
            cl.v_dmg_roll = 4.0;
            cl.v_dmg_time = time + DAMAGE_TIME * 0.5;
            cl.fall_value = 20.0;
            cl.fall_time = time + FALL_TIME * 0.5;
        }

        sv_calc_view_offset(&mut ctx, PLAYER, &ViewContext::default());

        let ps = &ctx.clients[0].ps;
        // half the damage kick plus half the fall kick
        assert!((ps.kick_angles[PITCH] - (-3.0 + 10.0)).abs() < 0.001);
        assert!((ps.kick_angles[ROLL] - 2.0).abs() < 0.001);
        // the view sags by ratio * fall_value * 0.4
        assert!((ps.viewoffset[2] - 18.0).abs() < 0.001);

        // both kicks gone once their windows pass
        ctx.level.time = time + 1.0;
        sv_calc_view_offset(&mut ctx, PLAYER, &ViewContext::default());
        let cl = &ctx.clients[0];
        assert_eq!(cl.v_dmg_pitch, 0.0);
        assert_eq!(cl.v_dmg_roll, 0.0);
        assert_eq!(cl.ps.kick_angles, VEC3_ORIGIN);
        assert_eq!(cl.ps.viewoffset, [0.0, 0.0, 22.0]);
    }

    #[test]
    fn test_ducked_bob_is_six_times_stronger() {
        let vctx = ViewContext { xyspeed: 100.0, bobfracsin: 1.0, bobcycle: 0, ..ViewContext::default() };
        let mut ctx = make_ctx();
        sv_calc_view_offset(&mut ctx, PLAYER, &vctx);
        let standing = ctx.clients[0].ps.kick_angles;
        assert!(close(standing[PITCH], 0.2));
        assert!(close(standing[ROLL], 0.2));

        ctx.clients[0].ps.pmove.pm_flags |= PMF_DUCKED;
        let odd = ViewContext { bobcycle: 1, ..vctx };
        sv_calc_view_offset(&mut ctx, PLAYER, &odd);
        let ducked = ctx.clients[0].ps.kick_angles;
        assert!(close(ducked[PITCH], 1.2));
        // odd bob cycles swing the roll the other way
        assert!(close(ducked[ROLL], -1.2));
        // bob height is unaffected by ducking
        assert!(close(ctx.clients[0].ps.viewoffset[2], 22.5));
    }

    #[test]
    fn test_gun_offset_wraps_yaw() {
        let mut ctx = make_ctx();
        ctx.clients[0].oldviewangles = [0.0, 179.0, 0.0];
        ctx.clients[0].ps.viewangles = [0.0, -179.0, 0.0];

        sv_calc_gun_offset(&mut ctx, PLAYER, &ViewContext::default());

        // a 2 degree turn across the seam, not 358
        let g = ctx.clients[0].ps.gunangles;
        assert!(close(g[PITCH], 0.0));
        assert!(close(g[YAW], -0.4));
        assert!(close(g[ROLL], -0.2));
    }

    #[test]
    fn test_gun_offset_clamps_large_turns() {
        let mut ctx = make_ctx();
        ctx.clients[0].oldviewangles = [90.0, 0.0, 0.0];
        sv_calc_gun_offset(&mut ctx, PLAYER, &ViewContext::default());
        assert!(close(ctx.clients[0].ps.gunangles[PITCH], 9.0));

        ctx.clients[0].oldviewangles = [0.0, 0.0, 0.0];
        ctx.clients[0].ps.viewangles = [100.0, 0.0, 0.0];
        sv_calc_gun_offset(&mut ctx, PLAYER, &ViewContext::default());
        assert!(close(ctx.clients[0].ps.gunangles[PITCH], -9.0));
    }

    #[test]
    fn test_gun_bob_and_dev_offset() {
        let mut ctx = make_ctx();
        ctx.gun_x = 2.0;
        let vctx = ViewContext {
            right: [0.0, -1.0, 0.0],
            xyspeed: 200.0,
            bobfracsin: 0.5,
            bobcycle: 1,
            ..ViewContext::default()
        };

        sv_calc_gun_offset(&mut ctx, PLAYER, &vctx);

        let ps = &ctx.clients[0].ps;
        assert!(close(ps.gunangles[PITCH], 0.5));
        assert!(close(ps.gunangles[YAW], -1.0));
        assert!(close(ps.gunangles[ROLL], -0.5));
        assert!(close(ps.gunoffset[0], 0.0));
        assert!(close(ps.gunoffset[1], -2.0));
        assert!(close(ps.gunoffset[2], 0.0));
    }

    #[test]
    fn test_sv_calc_roll() {
        let right = [0.0, 1.0, 0.0];
        assert!(close(sv_calc_roll(&[0.0, 100.0, 0.0], &right, 2.0, 200.0), 1.0));
        assert!(close(sv_calc_roll(&[0.0, -400.0, 0.0], &right, 2.0, 200.0), -2.0));
    }

    // ---- world effects ----

    #[test]
    fn test_entering_water() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].waterlevel = 1;
        ctx.edicts[PLAYER].watertype = CONTENTS_WATER;

        p_world_effects(&mut ctx, PLAYER);

        assert!(ctx.edicts[PLAYER].flags.intersects(FL_INWATER));
        assert_eq!(ctx.clients[0].old_waterlevel, 1);
        assert_eq!(count_sounds(&take_log(), "player/watr_in.wav"), 1);
        assert_eq!(ctx.level.sound_entity, ctx.edicts[PLAYER].mynoise);
    }

    #[test]
    fn test_drowning_damage() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].waterlevel = 3;
        ctx.edicts[PLAYER].watertype = CONTENTS_WATER;
        ctx.clients[0].old_waterlevel = 3;
        ctx.edicts[PLAYER].air_finished = ctx.level.framenum - 1;
        ctx.edicts[PLAYER].dmg = 2;

        p_world_effects(&mut ctx, PLAYER);

        assert_eq!(ctx.edicts[PLAYER].dmg, 4);
        assert_eq!(ctx.edicts[PLAYER].health, 96);
        assert_eq!(ctx.means_of_death, MOD_WATER);
        assert_eq!(ctx.clients[0].next_drown_framenum, ctx.level.framenum + BASE_FRAMERATE);

        // once per second
        p_world_effects(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].health, 96);
    }

    #[test]
    fn test_breather_supplies_air() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].waterlevel = 3;
        ctx.clients[0].old_waterlevel = 3;
        ctx.clients[0].breather_framenum = ctx.level.framenum + 50;

        p_world_effects(&mut ctx, PLAYER);

        assert_eq!(ctx.edicts[PLAYER].air_finished, ctx.level.framenum + 10 * BASE_FRAMERATE);
        assert_eq!(count_sounds(&take_log(), "player/u_breath1.wav"), 1);
        assert_eq!(ctx.clients[0].breather_sound, 1);
    }

    #[test]
    fn test_lava_burns() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].waterlevel = 2;
        ctx.edicts[PLAYER].watertype = CONTENTS_LAVA;
        ctx.clients[0].old_waterlevel = 2;

        p_world_effects(&mut ctx, PLAYER);

        assert_eq!(ctx.edicts[PLAYER].health, 94);
        assert_eq!(ctx.means_of_death, MOD_LAVA);
        let log = take_log();
        assert_eq!(count_sounds(&log, "player/burn1.wav") + count_sounds(&log, "player/burn2.wav"), 1);
    }

    #[test]
    fn test_head_out_of_water_gasps() {
        let surface = |air_finished_in: i32| {
            let mut ctx = make_ctx();
            ctx.edicts[PLAYER].waterlevel = 1;
            ctx.edicts[PLAYER].watertype = CONTENTS_WATER;
            ctx.clients[0].old_waterlevel = 3;
            ctx.edicts[PLAYER].air_finished = ctx.level.framenum + air_finished_in;
            p_world_effects(&mut ctx, PLAYER);
            take_log()
        };

        // out of air
        let log = surface(-1);
        assert_eq!(count_sounds(&log, "player/gasp1.wav"), 1);
        assert_eq!(count_sounds(&log, "player/gasp2.wav"), 0);

        // short of breath
        let log = surface(5 * BASE_FRAMERATE);
        assert_eq!(count_sounds(&log, "player/gasp1.wav"), 0);
        assert_eq!(count_sounds(&log, "player/gasp2.wav"), 1);

        // barely dipped under
        let log = surface(12 * BASE_FRAMERATE);
        assert_eq!(count_sounds(&log, "player/gasp1.wav"), 0);
        assert_eq!(count_sounds(&log, "player/gasp2.wav"), 0);
    }

    #[test]
    fn test_lethal_drowning_sound() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].waterlevel = 3;
        ctx.edicts[PLAYER].watertype = CONTENTS_WATER;
        ctx.clients[0].old_waterlevel = 3;
        ctx.edicts[PLAYER].air_finished = ctx.level.framenum - 1;
        ctx.edicts[PLAYER].dmg = 2;
        ctx.edicts[PLAYER].health = 4;

        p_world_effects(&mut ctx, PLAYER);

        let log = take_log();
        assert_eq!(count_sounds(&log, "player/drown1.wav"), 1);
        assert_eq!(count_sounds(&log, "*gurp1.wav") + count_sounds(&log, "*gurp2.wav"), 0);
        assert!(ctx.edicts[PLAYER].health <= 0);
    }

    #[test]
    fn test_envirosuit_in_lava_and_slime() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].waterlevel = 2;
        ctx.edicts[PLAYER].watertype = CONTENTS_LAVA;
        ctx.clients[0].old_waterlevel = 2;
        ctx.clients[0].enviro_framenum = ctx.level.framenum + 100;

        p_world_effects(&mut ctx, PLAYER);

        // one third of the usual burn
        assert_eq!(ctx.edicts[PLAYER].health, 98);
        assert_eq!(ctx.means_of_death, MOD_LAVA);

        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].waterlevel = 2;
        ctx.edicts[PLAYER].watertype = CONTENTS_SLIME;
        ctx.clients[0].old_waterlevel = 2;
        ctx.clients[0].enviro_framenum = ctx.level.framenum + 100;

        p_world_effects(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].health, 100);

        // and without the suit slime hurts
        ctx.clients[0].enviro_framenum = 0;
        p_world_effects(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].health, 98);
        assert_eq!(ctx.means_of_death, MOD_SLIME);
    }

    #[test]
    fn test_noclip_needs_no_air() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].movetype = MoveType::Noclip;
        ctx.edicts[PLAYER].waterlevel = 3;
        p_world_effects(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].air_finished, ctx.level.framenum + 12 * BASE_FRAMERATE);
        assert_eq!(ctx.clients[0].old_waterlevel, 0);
    }

    // ---- effects, event, sound ----

    #[test]
    fn test_effects() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].flags.insert(FL_GODMODE);
        ctx.clients[0].quad_framenum = ctx.level.framenum + 100;

        g_set_client_effects(&mut ctx, PLAYER);

        let s = &ctx.edicts[PLAYER].s;
        assert_eq!(s.effects, EF_QUAD | EF_COLOR_SHELL);
        assert_eq!(s.renderfx, RF_IR_VISIBLE | RF_SHELL_RED | RF_SHELL_GREEN | RF_SHELL_BLUE);

        ctx.edicts[PLAYER].health = 0;
        g_set_client_effects(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].s.effects, 0);
    }

    #[test]
    fn test_footstep_event_when_running() {
        let mut ctx = make_ctx();
        let vctx = ViewContext { xyspeed: 300.0, bobmove: 0.25, bobcycle: 0, ..ViewContext::default() };
        ctx.clients[0].bobtime = 0.9;

        g_set_client_event(&mut ctx, PLAYER, &vctx);

        assert_eq!(ctx.edicts[PLAYER].s.event, EV_FOOTSTEP);
    }

    #[test]
    fn test_ambient_sound_priority() {
        let mut ctx = make_ctx();
        ctx.snd_fry = 77;
        ctx.clients[0].pers.weapon = ctx.find_item("Railgun");
        g_set_client_sound(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].s.sound, gi_soundindex("weapons/rg_hum.wav"));

        ctx.clients[0].weapon_sound = 12;
        g_set_client_sound(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].s.sound, 12);

        ctx.edicts[PLAYER].waterlevel = 1;
        ctx.edicts[PLAYER].watertype = CONTENTS_SLIME;
        g_set_client_sound(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].s.sound, 77);
    }

    #[test]
    fn test_bfg_hum_uses_cached_index() {
        let mut ctx = make_ctx();
        ctx.clients[0].pers.weapon = ctx.bfg_index;
        g_set_client_sound(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].s.sound, gi_soundindex("weapons/bfg_hum.wav"));

        // an item table without a BFG has nothing to hum
        ctx.bfg_index = None;
        g_set_client_sound(&mut ctx, PLAYER);
        assert_eq!(ctx.edicts[PLAYER].s.sound, 0);
    }

    #[test]
    fn test_help_beep_limited() {
        let mut ctx = make_ctx();
        ctx.game.helpchanged = 1;
        for i in 0..8 {
            ctx.level.framenum = 64 * i;
            g_set_client_sound(&mut ctx, PLAYER);
        }
        assert_eq!(count_sounds(&take_log(), "misc/pc_up.wav"), 3);
    }

    // ---- animation ----

    fn standing() -> AnimState {
        AnimState {
            priority: ANIM_BASIC,
            frame: FRAME_STAND01,
            end: FRAME_STAND40,
            grounded: true,
            ..AnimState::default()
        }
    }

    #[test]
    fn test_anim_continues_sequence() {
        assert_eq!(anim_transition(&standing()), AnimStep::Advance(FRAME_STAND01 + 1));
    }

    #[test]
    fn test_anim_airborne_jumps_or_stands_on_hook() {
        let s = AnimState { grounded: false, ..standing() };
        assert_eq!(
            anim_transition(&s),
            AnimStep::Restart { priority: ANIM_JUMP, frame: FRAME_JUMP1, end: FRAME_JUMP2 }
        );

        let hooked = AnimState { hooked: true, ..s };
        assert_eq!(
            anim_transition(&hooked),
            AnimStep::Restart { priority: ANIM_BASIC, frame: FRAME_STAND01, end: FRAME_STAND40 }
        );
    }

    #[test]
    fn test_anim_jump_lands_into_wave() {
        let s = AnimState { priority: ANIM_JUMP, frame: FRAME_JUMP2, end: FRAME_JUMP2, grounded: false, ..standing() };
        assert_eq!(anim_transition(&s), AnimStep::Hold);

        let landed = AnimState { grounded: true, ..s };
        assert_eq!(
            anim_transition(&landed),
            AnimStep::Chain { priority: ANIM_WAVE, frame: FRAME_JUMP3, end: FRAME_JUMP6 }
        );
    }

    #[test]
    fn test_anim_death_holds_and_reverse_rewinds() {
        let dead = AnimState { priority: ANIM_DEATH, frame: FRAME_DEATH106, end: FRAME_DEATH106, ..standing() };
        assert_eq!(anim_transition(&dead), AnimStep::Hold);

        let reverse = AnimState { priority: ANIM_REVERSE, frame: 10, end: 5, ..standing() };
        assert_eq!(anim_transition(&reverse), AnimStep::Advance(9));
    }

    #[test]
    fn test_anim_duck_and_run_restart() {
        let s = AnimState { duck: true, run: true, ..standing() };
        assert_eq!(
            anim_transition(&s),
            AnimStep::Restart { priority: ANIM_BASIC, frame: FRAME_CRWALK1, end: FRAME_CRWALK6 }
        );

        let s = AnimState { run: true, ..standing() };
        assert_eq!(
            anim_transition(&s),
            AnimStep::Restart { priority: ANIM_BASIC, frame: FRAME_RUN1, end: FRAME_RUN6 }
        );
    }

    #[test]
    fn test_client_frame_records_duck_run() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].s.frame = FRAME_STAND01;
        ctx.clients[0].anim_end = FRAME_STAND40;
        let vctx = ViewContext { xyspeed: 250.0, ..ViewContext::default() };

        g_set_client_frame(&mut ctx, PLAYER, &vctx);

        assert_eq!(ctx.edicts[PLAYER].s.frame, FRAME_RUN1);
        assert!(ctx.clients[0].anim_run);
    }

    // ---- whole pipeline ----

    #[test]
    fn test_pipeline_syncs_pmove_and_history() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].s.origin = [10.0, -2.5, 3.0];
        ctx.edicts[PLAYER].velocity = [100.0, 0.0, 0.0];
        ctx.clients[0].kick_origin = [1.0, 1.0, 1.0];
        ctx.clients[0].kick_angles = [2.0, 0.0, 0.0];

        client_end_server_frame(&mut ctx, PLAYER);

        let cl = &ctx.clients[0];
        assert_eq!(cl.ps.pmove.origin, [80, -20, 24]);
        assert_eq!(cl.ps.pmove.velocity, [800, 0, 0]);
        assert_eq!(cl.oldvelocity, [100.0, 0.0, 0.0]);
        assert_eq!(cl.kick_origin, VEC3_ORIGIN);
        assert_eq!(cl.kick_angles, VEC3_ORIGIN);
        assert_eq!(cl.ps.stats[STAT_HEALTH], 100);
        assert_eq!(ctx.edicts[PLAYER].s.renderfx, RF_IR_VISIBLE);
    }

    #[test]
    fn test_pipeline_intermission_exit() {
        let mut ctx = make_ctx();
        ctx.level.intermissiontime = 5.0;
        ctx.clients[0].ps.blend = [1.0, 1.0, 1.0, 0.5];
        ctx.clients[0].ps.fov = 120.0;
        ctx.clients[0].kick_origin = [1.0, 0.0, 0.0];

        client_end_server_frame(&mut ctx, PLAYER);

        let cl = &ctx.clients[0];
        assert_eq!(cl.ps.blend[3], 0.0);
        assert_eq!(cl.ps.fov, 90.0);
        assert_eq!(cl.ps.stats[STAT_HEALTH], 100);
        // later stages never ran
        assert_eq!(cl.kick_origin, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_pipeline_hit_scenario() {
        let mut ctx = make_ctx();
        let origin = ctx.edicts[PLAYER].s.origin;
        t_damage(&mut ctx, PLAYER, 0, 0, &VEC3_ORIGIN, &origin, &VEC3_ORIGIN, 12, 0,
                 DamageFlags::empty(), MOD_UNKNOWN);

        client_end_server_frame(&mut ctx, PLAYER);

        let cl = &ctx.clients[0];
        assert_eq!(cl.anim_priority, ANIM_PAIN);
        assert_eq!(cl.ps.blend[0], 1.0);
        assert!(close(cl.ps.blend[3], 0.2));
        // decayed once by the blend stage
        assert!(close(cl.damage_alpha, 0.14));
    }

    #[test]
    fn test_pipeline_scoreboard_every_32_frames() {
        let mut ctx = make_ctx();
        ctx.clients[0].showscores = true;
        ctx.level.framenum = 96;

        client_end_server_frame(&mut ctx, PLAYER);
        assert_eq!(take_log().unicasts, vec![(PLAYER as i32, false)]);

        ctx.level.framenum = 97;
        client_end_server_frame(&mut ctx, PLAYER);
        assert!(take_log().unicasts.is_empty());
    }
}
