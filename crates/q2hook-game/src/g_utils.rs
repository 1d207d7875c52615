// g_utils.rs — entity allocation and small geometry helpers
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

use crate::g_local::{Edict, GameContext};
use crate::game_import::*;
use q2hook_common::q_shared::Vec3;

/// Offset `point` by `distance` along the forward/right basis, with
/// `distance[2]` applied straight up.
pub fn g_project_source(point: &Vec3, distance: &Vec3, forward: &Vec3, right: &Vec3) -> Vec3 {
    [
        point[0] + forward[0] * distance[0] + right[0] * distance[1],
        point[1] + forward[1] * distance[0] + right[1] * distance[1],
        point[2] + forward[2] * distance[0] + right[2] * distance[1] + distance[2],
    ]
}

/// Vector to string, truncated to whole units, for debug prints.
pub fn vtos(v: &Vec3) -> String {
    format!("({} {} {})", v[0] as i32, v[1] as i32, v[2] as i32)
}

fn init_edict(e: &mut Edict, index: usize) {
    *e = Edict::cleared();
    e.inuse = true;
    e.classname = "noclass".to_string();
    e.gravity = 1.0;
    e.s.number = index as i32;
}

/// Either finds a free edict, or allocates a new one. Returns the entity index,
/// or None once the arena is exhausted.
///
/// Try to avoid reusing an entity that was recently freed, because it
/// can cause the client to think the entity morphed into something else
/// instead of being removed and recreated.
pub fn g_spawn(ctx: &mut GameContext) -> Option<usize> {
    let first = ctx.game.maxclients as usize + 1;
    let num = (ctx.num_edicts.max(0) as usize).min(ctx.edicts.len());
    let time = ctx.level.time;

    for i in first..num {
        let e = &ctx.edicts[i];
        if !e.inuse && (e.freetime < 2.0 || time - e.freetime > 0.5) {
            init_edict(&mut ctx.edicts[i], i);
            return Some(i);
        }
    }

    if num >= ctx.max_edicts as usize || num >= ctx.edicts.len() {
        gi_error("ED_Alloc: no free edicts");
        return None;
    }

    ctx.num_edicts = num as i32 + 1;
    init_edict(&mut ctx.edicts[num], num);
    Some(num)
}

/// Marks the edict as free. Player and world slots are never released.
pub fn g_free_edict(ctx: &mut GameContext, ent_idx: usize) {
    gi_unlinkentity(ent_idx as i32);

    if ent_idx <= ctx.game.maxclients as usize || ent_idx >= ctx.edicts.len() {
        return;
    }

    let e = &mut ctx.edicts[ent_idx];
    *e = Edict::cleared();
    e.s.number = ent_idx as i32;
    e.classname = "freed".to_string();
    e.freetime = ctx.level.time;
    e.inuse = false;
}
