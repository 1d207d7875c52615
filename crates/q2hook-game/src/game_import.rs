// game_import.rs — engine services consumed by the game module
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

use q2hook_common::q_shared::{Trace, Vec3};
use std::sync::OnceLock;

static GI: OnceLock<Box<dyn GameImport + Send + Sync>> = OnceLock::new();

/// Install the engine's import table. Only the first call takes effect.
pub fn set_gi(gi: Box<dyn GameImport + Send + Sync>) {
    let _ = GI.set(gi);
}

fn gi() -> &'static dyn GameImport {
    GI.get().expect("GameImport not initialized").as_ref()
}

// ---- gi.xxx(...) call sites ----

pub fn gi_dprintf(msg: &str) { gi().dprintf(msg); }
pub fn gi_error(msg: &str) { gi().error(msg); }

pub fn gi_sound(ent_idx: i32, channel: i32, soundindex: i32, volume: f32, attenuation: f32, timeofs: f32) {
    gi().sound(ent_idx, channel, soundindex, volume, attenuation, timeofs);
}
pub fn gi_modelindex(name: &str) -> i32 { gi().modelindex(name) }
pub fn gi_soundindex(name: &str) -> i32 { gi().soundindex(name) }
pub fn gi_imageindex(name: &str) -> i32 { gi().imageindex(name) }

pub fn gi_trace(start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3, passent: i32, contentmask: i32) -> Trace {
    gi().trace(start, mins, maxs, end, passent, contentmask)
}
pub fn gi_pointcontents(point: &Vec3) -> i32 { gi().pointcontents(point) }
pub fn gi_linkentity(ent_idx: i32) { gi().linkentity(ent_idx); }
pub fn gi_unlinkentity(ent_idx: i32) { gi().unlinkentity(ent_idx); }

pub fn gi_multicast(origin: &Vec3, to: i32) { gi().multicast(origin, to); }
pub fn gi_unicast(ent_idx: i32, reliable: bool) { gi().unicast(ent_idx, reliable); }
pub fn gi_write_byte(c: i32) { gi().write_byte(c); }
pub fn gi_write_short(c: i32) { gi().write_short(c); }
pub fn gi_write_string(s: &str) { gi().write_string(s); }
pub fn gi_write_position(pos: &Vec3) { gi().write_position(pos); }
pub fn gi_write_dir(dir: &Vec3) { gi().write_dir(dir); }

pub fn gi_cvar(var_name: &str, value: &str, flags: i32) -> f32 { gi().cvar(var_name, value, flags) }
pub fn gi_argc() -> i32 { gi().argc() }
pub fn gi_argv(n: i32) -> String { gi().argv(n) }

/// Everything the grapple and view code needs from the host: sounds and
/// asset indices, collision queries, entity linking, the message buffer,
/// cvars and the current command's arguments.
pub trait GameImport {
    fn dprintf(&self, msg: &str);
    fn error(&self, msg: &str);

    fn sound(&self, ent_idx: i32, channel: i32, soundindex: i32, volume: f32, attenuation: f32, timeofs: f32);
    fn modelindex(&self, name: &str) -> i32;
    fn soundindex(&self, name: &str) -> i32;
    fn imageindex(&self, name: &str) -> i32;

    fn trace(&self, start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3, passent: i32, contentmask: i32) -> Trace;
    fn pointcontents(&self, point: &Vec3) -> i32;
    fn linkentity(&self, ent_idx: i32);
    fn unlinkentity(&self, ent_idx: i32);

    // message buffer, flushed by multicast or unicast
    fn multicast(&self, origin: &Vec3, to: i32);
    fn unicast(&self, ent_idx: i32, reliable: bool);
    fn write_byte(&self, c: i32);
    fn write_short(&self, c: i32);
    fn write_string(&self, s: &str);
    fn write_position(&self, pos: &Vec3);
    fn write_dir(&self, dir: &Vec3);

    /// Register a cvar (keeping any existing value) and return its value.
    fn cvar(&self, var_name: &str, value: &str, flags: i32) -> f32;

    fn argc(&self) -> i32;
    fn argv(&self, n: i32) -> String;
}
