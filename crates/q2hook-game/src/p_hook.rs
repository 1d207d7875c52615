// p_hook.rs — grapple hook: firing, flight, attachment and pull
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2
//
// The hook is an ordinary flymissile edict owned by the firing player. The
// player's client record holds the only handle to it and the hook's `owner`
// points back; grapple_reset is the single path that breaks the pair.

use rayon::prelude::*;

use crate::g_combat::t_damage;
use crate::g_local::*;
use crate::g_phys::{call_touch, sv_add_gravity, TOUCH_GRAPPLE};
use crate::g_utils::{g_free_edict, g_spawn, vtos};
use crate::game_import::*;
use crate::p_weapon::{p_project_source, player_noise};

pub const GRAPPLE_SPEED: f32 = 650.0; // speed of grapple in flight
pub const GRAPPLE_PULL_SPEED: f32 = 650.0; // speed player is pulled at
pub const GRAPPLE_DAMAGE: i32 = 10;
/// Distance from the eye at which a pull turns into a hang.
pub const GRAPPLE_HANG_DISTANCE: f32 = 64.0;
/// The cable is not drawn when the hook is closer than this to the hand.
pub const GRAPPLE_CABLE_MIN: f32 = 64.0;

// ============================================================
// Asset sets
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CableStyle {
    /// TE_PARASITE_ATTACK from the hand to the hook.
    Parasite,
    /// TE_GRAPPLE_CABLE anchored on the owner with a hand offset.
    GrappleCable,
}

#[derive(Debug)]
pub struct HookAssetSet {
    pub model: &'static str,
    pub fire_sound: &'static str,
    pub fire_channel: i32,
    pub reset_sound: &'static str,
    pub attach_owner_sound: Option<&'static str>,
    pub attach_hook_sound: &'static str,
    pub hang_sound: Option<&'static str>,
    pub motor_sound: Option<&'static str>,
    pub cable: CableStyle,
}

pub static STANDARD_HOOK_ASSETS: HookAssetSet = HookAssetSet {
    model: "models/objects/debris2/tris.md2",
    fire_sound: "medic/Medatck2.wav",
    fire_channel: CHAN_WEAPON,
    reset_sound: "weapons/Sshotr1b.wav",
    attach_owner_sound: None,
    attach_hook_sound: "flyer/Flyatck1.wav",
    hang_sound: None,
    motor_sound: Some("world/turbine1.wav"),
    cable: CableStyle::Parasite,
};

pub static CUSTOM_HOOK_ASSETS: HookAssetSet = HookAssetSet {
    model: "models/weapons/grapple/hook/tris.md2",
    fire_sound: "weapons/grapple/grfire.wav",
    fire_channel: CHAN_RELIABLE | CHAN_WEAPON,
    reset_sound: "weapons/grapple/grreset.wav",
    attach_owner_sound: Some("weapons/grapple/grpull.wav"),
    attach_hook_sound: "weapons/grapple/grhit.wav",
    hang_sound: Some("weapons/grapple/grhang.wav"),
    motor_sound: None,
    cable: CableStyle::GrappleCable,
};

impl HookAssets {
    pub fn set(self) -> &'static HookAssetSet {
        match self {
            HookAssets::Standard => &STANDARD_HOOK_ASSETS,
            HookAssets::Custom => &CUSTOM_HOOK_ASSETS,
        }
    }
}

// ============================================================
// Helpers
// ============================================================

/// The player entity that owns a hook, if it is still a client.
fn hook_owner(ctx: &GameContext, hook_idx: usize) -> Option<usize> {
    let owner = ctx.edicts.get(hook_idx)?.owner;
    if owner < 0 {
        return None;
    }
    let owner = owner as usize;
    ctx.edicts.get(owner)?.client?;
    Some(owner)
}

fn hook_volume(cl: &GClient) -> f32 {
    if cl.silencer_shots != 0 {
        0.2
    } else {
        1.0
    }
}

// ============================================================
// Reset
// ============================================================

/// Drop the hook and return its owner to the FLY state. Does nothing when
/// the owner no longer holds a hook.
pub fn grapple_reset(ctx: &mut GameContext, hook_idx: usize) {
    let Some(owner) = hook_owner(ctx, hook_idx) else {
        return;
    };
    let framenum = ctx.level.framenum;
    let assets = ctx.hook_assets.set();

    let Some(cl) = ctx.client_of_mut(owner) else {
        return;
    };
    if cl.grapple.is_none() {
        return;
    }

    gi_sound(owner as i32, CHAN_RELIABLE | CHAN_WEAPON, gi_soundindex(assets.reset_sound),
             hook_volume(cl), ATTN_NORM, 0.0);

    cl.grapple = None;
    cl.grapple_release_framenum = framenum;
    cl.grapple_state = GrappleState::Fly; // we're firing, not on hook
    cl.ps.pmove.pm_flags &= !PMF_NO_PREDICTION;

    g_free_edict(ctx, hook_idx);
}

/// Drop whatever hook the player has out. Used on death, respawn and
/// disconnect.
pub fn grapple_player_reset(ctx: &mut GameContext, ent_idx: usize) {
    if let Some(hook) = ctx.client_of(ent_idx).and_then(|cl| cl.grapple) {
        grapple_reset(ctx, hook);
    }
}

/// Explicit release request from the player.
pub fn grapple_release(ctx: &mut GameContext, ent_idx: usize) {
    if ctx.client_of(ent_idx).is_some_and(|cl| cl.grapple.is_none()) {
        gi_dprintf("grapple_release: no hook out\n");
        return;
    }
    grapple_player_reset(ctx, ent_idx);
}

// ============================================================
// Touch
// ============================================================

pub fn grapple_touch(
    ctx: &mut GameContext,
    self_idx: usize,
    other_idx: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    if !ctx.edicts.get(self_idx).is_some_and(|e| e.inuse) {
        return; // hook already freed
    }

    let Some(owner) = hook_owner(ctx, self_idx) else {
        gi_dprintf(&format!("grapple_touch: hook {} has no owner\n", self_idx));
        g_free_edict(ctx, self_idx);
        return;
    };

    if other_idx == owner {
        return;
    }

    let Some(cl) = ctx.client_of(owner) else {
        return;
    };
    if cl.grapple_state != GrappleState::Fly {
        return;
    }
    let volume = hook_volume(cl);

    if surf.is_some_and(|s| s.flags & SURF_SKY != 0) {
        grapple_reset(ctx, self_idx);
        return;
    }

    let normal = plane.map_or(VEC3_ORIGIN, |p| p.normal);

    ctx.edicts[self_idx].velocity = VEC3_ORIGIN;
    let origin = ctx.edicts[self_idx].s.origin;

    if ctx.deathmatch == 0.0 {
        player_noise(ctx, owner, &origin, PNOISE_IMPACT);
    }

    if ctx.edicts[other_idx].takedamage != DAMAGE_NO {
        let dmg = ctx.edicts[self_idx].dmg;
        let dir = ctx.edicts[self_idx].velocity;
        t_damage(ctx, other_idx, self_idx, owner, &dir, &origin, &normal, dmg, 1,
                 DamageFlags::empty(), MOD_GRAPPLE);
        grapple_reset(ctx, self_idx);
        return;
    }

    if let Some(cl) = ctx.client_of_mut(owner) {
        cl.grapple_state = GrappleState::Pull; // we're on hook
    }
    ctx.edicts[self_idx].enemy = other_idx as i32;
    ctx.edicts[self_idx].solid = Solid::Not;

    let assets = ctx.hook_assets.set();
    if let Some(snd) = assets.attach_owner_sound {
        gi_sound(owner as i32, CHAN_RELIABLE | CHAN_WEAPON, gi_soundindex(snd), volume, ATTN_NORM, 0.0);
    }
    gi_sound(self_idx as i32, CHAN_WEAPON, gi_soundindex(assets.attach_hook_sound), volume, ATTN_NORM, 0.0);

    gi_write_byte(SVC_TEMP_ENTITY);
    gi_write_byte(TE_SPARKS);
    gi_write_position(&origin);
    gi_write_dir(&normal);
    gi_multicast(&origin, MULTICAST_PVS);
}

// ============================================================
// Cable and pull
// ============================================================

/// Draw beam between grapple and owner.
pub fn grapple_draw_cable(ctx: &GameContext, self_idx: usize) {
    let Some(owner) = hook_owner(ctx, self_idx) else {
        return;
    };
    let Some(cl) = ctx.client_of(owner) else {
        return;
    };
    let hook = &ctx.edicts[self_idx];
    let owner_ent = &ctx.edicts[owner];

    let (f, r, _) = angle_vectors_tuple(&cl.v_angle);
    let offset = [
        16.0,
        if hook.count != 0 { -16.0 } else { 16.0 },
        owner_ent.viewheight as f32 - 8.0,
    ];
    let start = p_project_source(cl, &owner_ent.s.origin, &offset, &f, &r);

    let offset = vector_subtract(&start, &owner_ent.s.origin);
    let distance = vector_length(&vector_subtract(&start, &hook.s.origin));

    // don't draw cable if close
    if distance < GRAPPLE_CABLE_MIN {
        return;
    }

    let end = hook.s.origin;

    gi_write_byte(SVC_TEMP_ENTITY);
    match ctx.hook_assets.set().cable {
        CableStyle::Parasite => {
            gi_write_byte(TE_PARASITE_ATTACK);
            gi_write_short(self_idx as i32);
            gi_write_position(&start);
            gi_write_position(&end);
        }
        CableStyle::GrappleCable => {
            gi_write_byte(TE_GRAPPLE_CABLE);
            gi_write_short(owner as i32);
            gi_write_position(&owner_ent.s.origin);
            gi_write_position(&end);
            gi_write_position(&offset);
        }
    }
    gi_multicast(&hook.s.origin, MULTICAST_PVS);
}

/// Advance a live hook by one tick: follow its anchor, draw the cable and
/// pull the owner toward it.
pub fn grapple_pull(ctx: &mut GameContext, self_idx: usize) {
    let Some(owner) = hook_owner(ctx, self_idx) else {
        gi_dprintf(&format!("grapple_pull: dropping ownerless hook {}\n", self_idx));
        g_free_edict(ctx, self_idx);
        return;
    };

    if ctx.hook_weapon {
        let grapple_item = ctx.find_item("Grapple");
        if let Some(cl) = ctx.client_of(owner) {
            if cl.pers.weapon.is_some()
                && cl.pers.weapon == grapple_item
                && cl.newweapon.is_none()
                && cl.weaponstate != WeaponState::Firing
                && cl.weaponstate != WeaponState::Activating
            {
                grapple_reset(ctx, self_idx);
                return;
            }
        }
    }

    let enemy = ctx.edicts[self_idx].enemy;
    if enemy >= 0 {
        let anchor = ctx.edicts.get(enemy as usize).cloned().unwrap_or_default();
        if !anchor.inuse || anchor.solid == Solid::Not || anchor.deadflag != DEAD_NO {
            grapple_reset(ctx, self_idx);
            return;
        } else if anchor.solid == Solid::Bbox {
            let v = vector_ma(&anchor.s.origin, 0.5, &anchor.size);
            ctx.edicts[self_idx].s.origin = vector_add(&v, &anchor.mins);
            gi_linkentity(self_idx as i32);
        } else {
            ctx.edicts[self_idx].velocity = anchor.velocity;
        }
    }

    grapple_draw_cable(ctx, self_idx);

    let Some(state) = ctx.client_of(owner).map(|cl| cl.grapple_state) else {
        return;
    };
    if state == GrappleState::Fly {
        return;
    }

    // pull player toward grapple
    let mut eye = ctx.edicts[owner].s.origin;
    eye[2] += ctx.edicts[owner].viewheight as f32;
    let mut hookdir = vector_subtract(&ctx.edicts[self_idx].s.origin, &eye);
    let vlen = vector_normalize(&mut hookdir);

    if state == GrappleState::Pull {
        let assets = ctx.hook_assets.set();
        let framenum = ctx.level.framenum;
        let debounce = ctx.edicts[self_idx].pain_debounce_framenum;
        let Some(cl) = ctx.client_of_mut(owner) else {
            return;
        };
        let volume = hook_volume(cl);

        if vlen < GRAPPLE_HANG_DISTANCE {
            cl.ps.pmove.pm_flags |= PMF_NO_PREDICTION;
            cl.grapple_state = GrappleState::Hang;
            if let Some(snd) = assets.hang_sound {
                gi_sound(owner as i32, CHAN_RELIABLE | CHAN_WEAPON, gi_soundindex(snd), volume, ATTN_NORM, 0.0);
            }
        } else if let Some(snd) = assets.motor_sound {
            if debounce < framenum {
                gi_sound(owner as i32, CHAN_WEAPON, gi_soundindex(snd), volume, ATTN_NORM, 0.0);
                ctx.edicts[self_idx].pain_debounce_framenum = framenum + (0.5 * BASE_FRAMERATE as f32) as i32;
            }
        }
    }

    let g = ctx.sv_gravity;
    let owner_ent = &mut ctx.edicts[owner];
    owner_ent.velocity = vector_scale(&hookdir, GRAPPLE_PULL_SPEED);
    sv_add_gravity(owner_ent, g);
}

// ============================================================
// Fire
// ============================================================

/// Spawn the hook projectile at `start` heading along `dir`.
pub fn fire_grapple(
    ctx: &mut GameContext,
    self_idx: usize,
    start: &Vec3,
    dir: &Vec3,
    damage: i32,
    speed: f32,
    offhand: bool,
) -> Option<usize> {
    let mut dir = *dir;
    vector_normalize(&mut dir);

    let modelindex = gi_modelindex(ctx.hook_assets.set().model);
    let grapple = g_spawn(ctx)?;
    {
        let g = &mut ctx.edicts[grapple];
        g.classname = "hook".to_string();
        g.s.origin = *start;
        g.s.old_origin = *start;
        vectoangles(&dir, &mut g.s.angles);
        g.velocity = vector_scale(&dir, speed);
        g.movetype = MoveType::FlyMissile;
        g.clipmask = MASK_SHOT;
        g.solid = Solid::Bbox;
        g.count = offhand as i32;
        g.s.modelindex = modelindex;
        g.owner = self_idx as i32;
        g.touch_fn = Some(TOUCH_GRAPPLE);
        g.dmg = damage;
    }
    if let Some(cl) = ctx.client_of_mut(self_idx) {
        cl.grapple = Some(grapple);
        cl.grapple_state = GrappleState::Fly; // we're firing, not on hook
    }
    gi_linkentity(grapple as i32);

    let tr = gi_trace(&ctx.edicts[self_idx].s.origin, &VEC3_ORIGIN, &VEC3_ORIGIN, start, grapple as i32, MASK_SHOT);
    if tr.fraction < 1.0 {
        let g = &mut ctx.edicts[grapple];
        g.s.origin = vector_ma(&g.s.origin, -10.0, &dir);
        let other = if tr.ent_index >= 0 { tr.ent_index as usize } else { 0 };
        call_touch(ctx, grapple, other, None, None);
    }

    Some(grapple)
}

/// Fire a hook from the player's muzzle. Ignored while a hook is attached.
pub fn grapple_fire(ctx: &mut GameContext, ent_idx: usize, damage: i32, offhand: bool) {
    let Some(cl) = ctx.client_of(ent_idx) else {
        return;
    };
    if cl.grapple_state > GrappleState::Fly {
        return; // it's already out
    }

    // a second shot replaces a hook still in flight; nothing was held, so
    // this is not a release
    if let Some(hook) = cl.grapple {
        if let Some(cl) = ctx.client_of_mut(ent_idx) {
            cl.grapple = None;
        }
        if ctx.edicts.get(hook).is_some_and(|h| h.inuse && h.owner == ent_idx as i32) {
            g_free_edict(ctx, hook);
        }
    }

    let Some(cl) = ctx.client_of(ent_idx) else {
        return;
    };
    let ent = &ctx.edicts[ent_idx];
    let (forward, right, _) = angle_vectors_tuple(&cl.v_angle);
    let offset = [
        24.0,
        if offhand { -8.0 } else { 8.0 },
        ent.viewheight as f32 - 8.0 + 2.0,
    ];
    let start = p_project_source(cl, &ent.s.origin, &offset, &forward, &right);

    let assets = ctx.hook_assets.set();
    gi_sound(ent_idx as i32, assets.fire_channel, gi_soundindex(assets.fire_sound), hook_volume(cl), ATTN_NORM, 0.0);

    if fire_grapple(ctx, ent_idx, &start, &forward, damage, GRAPPLE_SPEED, offhand).is_none() {
        gi_dprintf(&format!("grapple_fire: no edict for hook at {}\n", vtos(&start)));
        return;
    }

    if ctx.deathmatch == 0.0 {
        player_noise(ctx, ent_idx, &start, PNOISE_WEAPON);
    }
}

// ============================================================
// Link invariant
// ============================================================

/// Verify that every player's hook handle and every hook's owner agree.
/// Returns a description of the first mismatch found.
pub fn check_grapple_links(ctx: &GameContext) -> Result<(), String> {
    let edicts = &ctx.edicts;
    let clients = &ctx.clients;

    let player_side = edicts.par_iter().enumerate().find_map_any(|(i, e)| {
        let cl = clients.get(e.client?)?;
        let hook = cl.grapple?;
        match edicts.get(hook) {
            Some(h) if h.inuse && h.owner == i as i32 && h.touch_fn == Some(TOUCH_GRAPPLE) => None,
            _ => Some(format!("player {} holds hook {} which does not point back", i, hook)),
        }
    });
    if let Some(err) = player_side {
        return Err(err);
    }

    let hook_side = edicts.par_iter().enumerate().find_map_any(|(i, e)| {
        if !e.inuse || e.touch_fn != Some(TOUCH_GRAPPLE) {
            return None;
        }
        let owner_grapple = usize::try_from(e.owner)
            .ok()
            .and_then(|o| edicts.get(o))
            .and_then(|o| o.client)
            .and_then(|c| clients.get(c))
            .and_then(|cl| cl.grapple);
        if owner_grapple == Some(i) {
            None
        } else {
            Some(format!("hook {} is not held by its owner {}", i, e.owner))
        }
    });
    match hook_side {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
