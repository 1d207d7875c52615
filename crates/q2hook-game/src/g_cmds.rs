// g_cmds.rs — client console commands
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

use crate::g_local::*;
use crate::game_import::*;
use crate::p_hook::{grapple_fire, grapple_player_reset, GRAPPLE_DAMAGE};

// ============================================================
// Cmd_Hook_f
// ============================================================

/// `hook fire` / `hook release` for the offhand grapple.
pub fn cmd_hook_f(ctx: &mut GameContext, ent_idx: usize) {
    let sub = gi_argv(1);

    if sub.eq_ignore_ascii_case("fire") {
        let ent = &ctx.edicts[ent_idx];
        if ent.health != 0 && ent.movetype != MoveType::Noclip {
            grapple_fire(ctx, ent_idx, GRAPPLE_DAMAGE, true);
        }
    } else if sub.eq_ignore_ascii_case("release") {
        grapple_player_reset(ctx, ent_idx);
    }
}

// ============================================================
// ClientCommand
// ============================================================

pub fn client_command(ctx: &mut GameContext, ent_idx: usize) {
    if ctx.edicts[ent_idx].client.is_none() {
        return; // not fully in game yet
    }

    if gi_argc() < 1 {
        return;
    }
    let cmd = gi_argv(0);

    if cmd.eq_ignore_ascii_case("hook") && ctx.hook_offhand {
        cmd_hook_f(ctx, ent_idx);
    } else {
        gi_dprintf(&format!("ClientCommand: ignored \"{}\"\n", cmd));
    }
}
