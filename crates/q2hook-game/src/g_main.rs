// g_main.rs — game initialization and per-frame driver
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

use q2hook_common::common::com_error;
use q2hook_common::qcommon::ERR_FATAL;

use crate::g_local::*;
use crate::g_phys::{g_run_entity, TOUCH_GRAPPLE};
use crate::game_import::*;
use crate::p_hook::{check_grapple_links, grapple_pull};
use crate::p_view::client_end_server_frame;

// ============================================================
// InitGame
// ============================================================

/// Register the game cvars and cache their values on the context.
pub fn init_game(ctx: &mut GameContext) {
    gi_dprintf("==== InitGame ====\n");

    ctx.sv_gravity = gi_cvar("sv_gravity", "800", 0);
    ctx.sv_rollspeed = gi_cvar("sv_rollspeed", "200", 0);
    ctx.sv_rollangle = gi_cvar("sv_rollangle", "2", 0);

    ctx.run_pitch = gi_cvar("run_pitch", "0.002", 0);
    ctx.run_roll = gi_cvar("run_roll", "0.005", 0);
    ctx.bob_up = gi_cvar("bob_up", "0.005", 0);
    ctx.bob_pitch = gi_cvar("bob_pitch", "0.002", 0);
    ctx.bob_roll = gi_cvar("bob_roll", "0.002", 0);

    // development tools
    ctx.gun_x = gi_cvar("gun_x", "0", 0);
    ctx.gun_y = gi_cvar("gun_y", "0", 0);
    ctx.gun_z = gi_cvar("gun_z", "0", 0);

    ctx.deathmatch = gi_cvar("deathmatch", "0", CVAR_LATCH);
    ctx.dmflags = gi_cvar("dmflags", "0", CVAR_SERVERINFO);
    ctx.maxclients = gi_cvar("maxclients", "4", CVAR_SERVERINFO | CVAR_LATCH);

    // grapple setup is fixed for the life of the game
    ctx.hook_assets = if gi_cvar("hook_standard_assets", "0", CVAR_LATCH) != 0.0 {
        HookAssets::Standard
    } else {
        HookAssets::Custom
    };
    ctx.hook_offhand = gi_cvar("hook_offhand", "1", CVAR_LATCH) != 0.0;
    ctx.hook_weapon = gi_cvar("hook_weapon", "0", CVAR_LATCH) != 0.0;

    ctx.snd_fry = gi_soundindex("player/fry.wav");

    gi_dprintf(&format!(
        "{}: {} hook assets, offhand {}, weapon {}\n",
        GAMEVERSION,
        match ctx.hook_assets {
            HookAssets::Standard => "standard",
            HookAssets::Custom => "custom",
        },
        if ctx.hook_offhand { "on" } else { "off" },
        if ctx.hook_weapon { "on" } else { "off" },
    ));
}

// ============================================================
// ClientEndServerFrames
// ============================================================

/// Build the player state for every connected player.
fn client_end_server_frames(ctx: &mut GameContext) {
    let maxclients = ctx.game.maxclients.max(0) as usize;
    for i in 0..maxclients {
        let ent_idx = i + 1;
        let connected = ctx.edicts.get(ent_idx).is_some_and(|e| e.inuse)
            && ctx.client_of(ent_idx).is_some_and(|cl| cl.pers.connected);
        if connected {
            client_end_server_frame(ctx, ent_idx);
        }
    }
}

// ============================================================
// G_RunFrame
// ============================================================

/// Advances the world by FRAMETIME seconds.
pub fn g_run_frame(ctx: &mut GameContext) {
    ctx.level.framenum += 1;
    ctx.level.time = ctx.level.framenum as f32 * FRAMETIME;

    //
    // treat each object in turn
    // players are moved by the host between frames
    //
    let num_edicts = (ctx.num_edicts.max(0) as usize).min(ctx.edicts.len());
    let maxclients = ctx.game.maxclients.max(0) as usize;

    for i in 0..num_edicts {
        if !ctx.edicts[i].inuse {
            continue;
        }

        ctx.level.current_entity = i as i32;
        ctx.edicts[i].s.old_origin = ctx.edicts[i].s.origin;

        if i > 0 && i <= maxclients {
            continue;
        }

        g_run_entity(ctx, i);
    }

    // follow anchors and pull owners; a hook may free itself on the way
    let hooks: Vec<usize> = ctx
        .edicts
        .iter()
        .enumerate()
        .filter(|(_, e)| e.inuse && e.touch_fn == Some(TOUCH_GRAPPLE))
        .map(|(i, _)| i)
        .collect();
    for hook in hooks {
        if ctx.edicts[hook].inuse && ctx.edicts[hook].touch_fn == Some(TOUCH_GRAPPLE) {
            grapple_pull(ctx, hook);
        }
    }

    // build the playerstate_t structures for all players
    client_end_server_frames(ctx);

    if let Err(msg) = check_grapple_links(ctx) {
        com_error(ERR_FATAL, &format!("G_RunFrame: {}", msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::g_utils::g_spawn;
    use crate::test_support::*;

    #[test]
    fn test_init_game_caches_defaults() {
        let mut ctx = make_ctx();
        init_game(&mut ctx);

        assert_eq!(ctx.sv_gravity, 800.0);
        assert_eq!(ctx.sv_rollangle, 2.0);
        assert!((ctx.bob_up - 0.005).abs() < 1e-6);
        assert_eq!(ctx.maxclients, 4.0);
        assert_eq!(ctx.hook_assets, HookAssets::Custom);
        assert!(ctx.hook_offhand);
        assert!(!ctx.hook_weapon);
        assert_eq!(ctx.snd_fry, gi_soundindex("player/fry.wav"));

        let log = take_log();
        assert_eq!(log.dprints[0], "==== InitGame ====\n");
    }

    #[test]
    fn test_run_frame_advances_time() {
        let mut ctx = make_ctx();
        g_run_frame(&mut ctx);
        assert_eq!(ctx.level.framenum, 101);
        assert!((ctx.level.time - 101.0 * FRAMETIME).abs() < 0.001);
    }

    #[test]
    fn test_run_frame_moves_hook_and_player_state() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].s.origin = [0.0, 0.0, 0.0];
        crate::p_hook::grapple_fire(&mut ctx, PLAYER, 10, true);
        let hook = ctx.clients[0].grapple.expect("hook fired");
        let start = ctx.edicts[hook].s.origin;

        g_run_frame(&mut ctx);

        assert!(ctx.edicts[hook].inuse);
        assert!((ctx.edicts[hook].s.origin[0] - (start[0] + 65.0)).abs() < 0.01);
        assert_eq!(ctx.edicts[hook].s.old_origin, start);
        // the pipeline ran for the player
        assert_eq!(ctx.clients[0].ps.stats[STAT_HEALTH], 100);
    }

    #[test]
    fn test_run_frame_hook_strikes_wall_ahead() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].s.origin = [0.0, 0.0, 0.0];
        crate::p_hook::grapple_fire(&mut ctx, PLAYER, 10, true);
        let hook = ctx.clients[0].grapple.expect("hook fired");
        clear_log();

        // the flight move this frame runs into a wall 100 units out
        let impact = [100.0, 8.0, 16.0];
        script_trace(Trace {
            fraction: 0.5,
            endpos: impact,
            plane: CPlane { normal: [-1.0, 0.0, 0.0], ..CPlane::default() },
            ent_index: 0,
            ..Trace::default()
        });

        g_run_frame(&mut ctx);

        assert_eq!(ctx.clients[0].grapple_state, GrappleState::Pull);
        assert_eq!(ctx.edicts[hook].enemy, 0);
        assert_eq!(ctx.edicts[hook].s.origin, impact);
        let log = take_log();
        assert_eq!(temp_entities(&log).first(), Some(&TE_SPARKS));
        assert_eq!(log.multicasts.first(), Some(&(impact, MULTICAST_PVS)));
        // and the same frame starts reeling the player in
        assert!(ctx.edicts[PLAYER].velocity[0] > 0.0);
    }

    #[test]
    fn test_run_frame_frees_ownerless_hook() {
        let mut ctx = make_ctx();
        let stray = g_spawn(&mut ctx).expect("free slot");
        ctx.edicts[stray].classname = "hook".to_string();
        ctx.edicts[stray].touch_fn = Some(TOUCH_GRAPPLE);

        g_run_frame(&mut ctx);

        assert!(!ctx.edicts[stray].inuse);
    }

    #[test]
    fn test_disconnected_player_is_skipped() {
        let mut ctx = make_ctx();
        ctx.clients[0].pers.connected = false;
        ctx.clients[0].kick_origin = [1.0, 0.0, 0.0];

        g_run_frame(&mut ctx);

        assert_eq!(ctx.clients[0].kick_origin, [1.0, 0.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "Fatal error")]
    fn test_broken_grapple_link_is_fatal() {
        let mut ctx = make_ctx();
        let bogus = spawn_box(&mut ctx, [0.0, 0.0, 64.0]);
        ctx.clients[0].grapple = Some(bogus);

        g_run_frame(&mut ctx);
    }
}
