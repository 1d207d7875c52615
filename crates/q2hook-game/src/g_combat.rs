// g_combat.rs — damage, armor and death
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

use crate::g_local::*;
use crate::game::SVF_DEADMONSTER;
use crate::game_import::*;
use crate::m_player_frames::*;
use q2hook_common::common::rand_i32;

// ============================================================
// Armor lookups
// ============================================================

/// Index of the best body armor the player carries, or 0.
pub fn armor_index(ctx: &GameContext, ent_idx: usize) -> usize {
    let Some(cl) = ctx.client_of(ent_idx) else {
        return 0;
    };

    let mut best = 0;
    for name in ["Jacket Armor", "Combat Armor", "Body Armor"] {
        if let Some(idx) = ctx.find_item(name) {
            if cl.pers.inventory[idx] > 0 {
                best = idx;
            }
        }
    }
    best
}

/// The player's active power armor type. Requires FL_POWER_ARMOR.
pub fn power_armor_type(ctx: &GameContext, ent_idx: usize) -> i32 {
    let Some(cl) = ctx.client_of(ent_idx) else {
        return POWER_ARMOR_NONE;
    };

    if !ctx.edicts[ent_idx].flags.intersects(FL_POWER_ARMOR) {
        return POWER_ARMOR_NONE;
    }

    if let Some(idx) = ctx.find_item("Power Shield") {
        if cl.pers.inventory[idx] > 0 {
            return POWER_ARMOR_SHIELD;
        }
    }
    if let Some(idx) = ctx.find_item("Power Screen") {
        if cl.pers.inventory[idx] > 0 {
            return POWER_ARMOR_SCREEN;
        }
    }

    POWER_ARMOR_NONE
}

/// Spawn a damage temp entity at the impact point.
pub fn spawn_damage(te_type: i32, origin: &Vec3, normal: &Vec3, _damage: i32) {
    gi_write_byte(SVC_TEMP_ENTITY);
    gi_write_byte(te_type);
    gi_write_position(origin);
    gi_write_dir(normal);
    gi_multicast(origin, MULTICAST_PVS);
}

fn check_power_armor(
    ctx: &mut GameContext,
    ent_idx: usize,
    point: &Vec3,
    normal: &Vec3,
    damage: i32,
    dflags: DamageFlags,
) -> i32 {
    if damage == 0 || dflags.intersects(DAMAGE_NO_ARMOR) {
        return 0;
    }

    let power_armor = power_armor_type(ctx, ent_idx);
    if power_armor == POWER_ARMOR_NONE {
        return 0;
    }
    let Some(cells) = ctx.find_item("Cells") else {
        return 0;
    };
    let power = ctx.client_of(ent_idx).map_or(0, |cl| cl.pers.inventory[cells]);
    if power == 0 {
        return 0;
    }

    let ent = &ctx.edicts[ent_idx];
    let (damage_per_cell, te_type, capped) = if power_armor == POWER_ARMOR_SCREEN {
        // only works if damage point is in front
        let mut forward = [0.0; 3];
        angle_vectors(&ent.s.angles, Some(&mut forward), None, None);
        let mut vec = vector_subtract(point, &ent.s.origin);
        vector_normalize(&mut vec);
        if dot_product(&vec, &forward) <= 0.3 {
            return 0;
        }
        (1, TE_SCREEN_SPARKS, damage / 3)
    } else {
        (2, TE_SHIELD_SPARKS, (2 * damage) / 3)
    };

    let save = (power * damage_per_cell).min(capped);
    if save == 0 {
        return 0;
    }

    spawn_damage(te_type, point, normal, save);
    ctx.edicts[ent_idx].powerarmor_framenum = ctx.level.framenum + (0.2 * BASE_FRAMERATE as f32) as i32;

    if let Some(cl) = ctx.client_of_mut(ent_idx) {
        cl.pers.inventory[cells] -= save / damage_per_cell;
    }

    save
}

fn check_armor(
    ctx: &mut GameContext,
    ent_idx: usize,
    point: &Vec3,
    normal: &Vec3,
    damage: i32,
    te_sparks: i32,
    dflags: DamageFlags,
) -> i32 {
    if damage == 0 || dflags.intersects(DAMAGE_NO_ARMOR) {
        return 0;
    }

    let index = armor_index(ctx, ent_idx);
    if index == 0 {
        return 0;
    }
    let Some(info) = ctx.items[index].armor_info else {
        return 0;
    };

    let protection = if dflags.intersects(DAMAGE_ENERGY) {
        info.energy_protection
    } else {
        info.normal_protection
    };
    let Some(cl) = ctx.client_of_mut(ent_idx) else {
        return 0;
    };

    let save = ((protection * damage as f32).ceil() as i32).min(cl.pers.inventory[index]);
    if save == 0 {
        return 0;
    }

    cl.pers.inventory[index] -= save;
    spawn_damage(te_sparks, point, normal, save);

    save
}

// ============================================================
// Death
// ============================================================

fn look_at_killer(ctx: &mut GameContext, self_idx: usize, inflictor_idx: usize, attacker_idx: usize) {
    let origin = ctx.edicts[self_idx].s.origin;
    let dir = if attacker_idx != 0 && attacker_idx != self_idx {
        vector_subtract(&ctx.edicts[attacker_idx].s.origin, &origin)
    } else if inflictor_idx != 0 && inflictor_idx != self_idx {
        vector_subtract(&ctx.edicts[inflictor_idx].s.origin, &origin)
    } else {
        let yaw = ctx.edicts[self_idx].s.angles[YAW];
        if let Some(cl) = ctx.client_of_mut(self_idx) {
            cl.killer_yaw = yaw;
        }
        return;
    };

    let mut yaw = if dir[0] != 0.0 {
        RAD_TO_DEG * dir[1].atan2(dir[0])
    } else if dir[1] > 0.0 {
        90.0
    } else if dir[1] < 0.0 {
        -90.0
    } else {
        0.0
    };
    if yaw < 0.0 {
        yaw += 360.0;
    }
    if let Some(cl) = ctx.client_of_mut(self_idx) {
        cl.killer_yaw = yaw;
    }
}

/// A player has died: drop the hook, pick a death animation and stop
/// powerups.
pub fn player_die(ctx: &mut GameContext, self_idx: usize, inflictor_idx: usize, attacker_idx: usize) {
    crate::p_hook::grapple_player_reset(ctx, self_idx);

    let alive = ctx.edicts[self_idx].deadflag == DEAD_NO;
    if alive {
        look_at_killer(ctx, self_idx, inflictor_idx, attacker_idx);
        ctx.death_anim_index = (ctx.death_anim_index + 1) % 3;
    }
    let death_anim = ctx.death_anim_index;

    let Some((ent, cl)) = ctx.player_mut(self_idx) else {
        return;
    };

    ent.avelocity = [0.0; 3];
    ent.takedamage = DAMAGE_YES;
    ent.movetype = MoveType::Toss;
    ent.s.modelindex2 = 0; // remove linked weapon model
    ent.s.angles[PITCH] = 0.0;
    ent.s.angles[ROLL] = 0.0;
    ent.s.sound = 0;
    ent.maxs[2] = -8.0;
    ent.svflags |= SVF_DEADMONSTER;
    cl.weapon_sound = 0;

    if alive {
        cl.ps.pmove.pm_type = PmType::Dead;
    }

    // remove powerups
    cl.quad_framenum = 0;
    cl.invincible_framenum = 0;
    cl.breather_framenum = 0;
    cl.enviro_framenum = 0;
    ent.flags.remove(FL_POWER_ARMOR);

    if ent.health < -40 {
        gi_sound(self_idx as i32, CHAN_BODY, gi_soundindex("misc/udeath.wav"), 1.0, ATTN_NORM, 0.0);
        ent.takedamage = DAMAGE_NO;
    } else if alive {
        cl.anim_priority = ANIM_DEATH;
        if cl.ps.pmove.pm_flags & PMF_DUCKED != 0 {
            ent.s.frame = FRAME_CRDEATH1 - 1;
            cl.anim_end = FRAME_CRDEATH5;
        } else {
            let (first, last) = match death_anim {
                0 => (FRAME_DEATH101, FRAME_DEATH106),
                1 => (FRAME_DEATH201, FRAME_DEATH206),
                _ => (FRAME_DEATH301, FRAME_DEATH308),
            };
            ent.s.frame = first - 1;
            cl.anim_end = last;
        }
        let death_snd = format!("*death{}.wav", (rand_i32() % 4) + 1);
        gi_sound(self_idx as i32, CHAN_VOICE, gi_soundindex(&death_snd), 1.0, ATTN_NORM, 0.0);
    }

    ent.deadflag = DEAD_DEAD;
    gi_linkentity(self_idx as i32);
}

pub fn killed(ctx: &mut GameContext, targ_idx: usize, inflictor_idx: usize, attacker_idx: usize) {
    let targ = &mut ctx.edicts[targ_idx];
    if targ.health < -999 {
        targ.health = -999;
    }
    targ.enemy = attacker_idx as i32;

    if targ.client.is_some() {
        player_die(ctx, targ_idx, inflictor_idx, attacker_idx);
    } else {
        targ.deadflag = DEAD_DEAD;
        gi_dprintf(&format!("{} killed\n", targ.classname));
    }
}

// ============================================================
// T_Damage
// ============================================================

/// Apply damage to `targ_idx`.
///
/// - `inflictor` is the entity that delivered the damage (projectile, or the world)
/// - `attacker` gets credit for the damage
/// - `dir` is the direction of the attack, used for knockback
/// - `point` and `normal` locate the impact for effects
pub fn t_damage(
    ctx: &mut GameContext,
    targ_idx: usize,
    inflictor_idx: usize,
    attacker_idx: usize,
    dir: &Vec3,
    point: &Vec3,
    normal: &Vec3,
    damage: i32,
    knockback: i32,
    dflags: DamageFlags,
    mod_type: i32,
) {
    if ctx.edicts[targ_idx].takedamage == DAMAGE_NO {
        return;
    }

    ctx.means_of_death = mod_type;

    let te_sparks = TE_SPARKS;
    let mut dir = *dir;
    vector_normalize(&mut dir);

    let mut knockback = knockback;
    if ctx.edicts[targ_idx].flags.intersects(FL_NO_KNOCKBACK) {
        knockback = 0;
    }

    // figure momentum add
    if !dflags.intersects(DAMAGE_NO_KNOCKBACK) {
        let is_client = ctx.edicts[targ_idx].client.is_some();
        let targ = &mut ctx.edicts[targ_idx];
        if knockback != 0
            && !matches!(targ.movetype, MoveType::None | MoveType::Bounce | MoveType::Push | MoveType::Stop)
        {
            let mass = targ.mass.max(50) as f32;
            // the rocket jump hack...
            let scale = if is_client && attacker_idx == targ_idx { 1600.0 } else { 500.0 };
            let kvel = vector_scale(&dir, scale * knockback as f32 / mass);
            targ.velocity = vector_add(&targ.velocity, &kvel);
        }
    }

    let mut take = damage;
    let mut save = 0;

    // check for godmode
    if ctx.edicts[targ_idx].flags.intersects(FL_GODMODE) && !dflags.intersects(DAMAGE_NO_PROTECTION) {
        take = 0;
        save = damage;
        spawn_damage(te_sparks, point, normal, save);
    }

    // check for invincibility
    let framenum = ctx.level.framenum;
    let invincible = ctx.client_of(targ_idx).is_some_and(|cl| cl.invincible_framenum > framenum);
    if invincible && !dflags.intersects(DAMAGE_NO_PROTECTION) {
        let targ = &mut ctx.edicts[targ_idx];
        if targ.pain_debounce_framenum < framenum {
            gi_sound(targ_idx as i32, CHAN_ITEM, gi_soundindex("items/protect4.wav"), 1.0, ATTN_NORM, 0.0);
            targ.pain_debounce_framenum = framenum + 2 * BASE_FRAMERATE;
        }
        take = 0;
        save = damage;
    }

    let psave = check_power_armor(ctx, targ_idx, point, normal, take, dflags);
    take -= psave;

    let asave = check_armor(ctx, targ_idx, point, normal, take, te_sparks, dflags);
    take -= asave;

    // treat cheat/powerup savings the same as armor
    let asave = asave + save;

    // do the damage
    if take != 0 {
        let is_client = ctx.edicts[targ_idx].client.is_some();
        if is_client {
            spawn_damage(TE_BLOOD, point, normal, take);
        } else {
            spawn_damage(te_sparks, point, normal, take);
        }

        ctx.edicts[targ_idx].health -= take;

        if ctx.edicts[targ_idx].health <= 0 {
            if is_client {
                ctx.edicts[targ_idx].flags.insert(FL_NO_KNOCKBACK);
            }
            killed(ctx, targ_idx, inflictor_idx, attacker_idx);
            return;
        }
    }

    // add to the damage inflicted on a player this frame
    // the total will be turned into screen blends and view angle kicks
    // at the end of the frame
    if let Some(cl) = ctx.client_of_mut(targ_idx) {
        cl.damage_parmor += psave;
        cl.damage_armor += asave;
        cl.damage_blood += take;
        cl.damage_knockback += knockback;
        cl.damage_from = *point;
    }
}
