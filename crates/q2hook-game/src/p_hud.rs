// p_hud.rs — player status bar stats and the scoreboard layout
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

use crate::g_combat::{armor_index, power_armor_type};
use crate::g_local::*;
use crate::game_import::*;

/// Layout strings longer than this overflow the client's buffer.
const MAX_LAYOUT: usize = 1024;

// ======================================================================
// SCOREBOARD
// ======================================================================

/// Build and write the deathmatch scoreboard layout message.
/// `killer_idx` is the entity index of the killer, or -1 if none.
pub fn deathmatch_scoreboard_message(ctx: &GameContext, ent_idx: usize, killer_idx: i32) {
    // sort the clients by score, highest first
    let mut sorted: Vec<(usize, i32)> = Vec::with_capacity(MAX_CLIENTS.min(ctx.clients.len()));
    for (i, cl) in ctx.clients.iter().enumerate() {
        if !ctx.edicts.get(i + 1).is_some_and(|e| e.inuse) || cl.resp.spectator {
            continue;
        }
        let score = cl.resp.score;
        let pos = sorted.iter().position(|&(_, s)| score > s).unwrap_or(sorted.len());
        sorted.insert(pos, (i, score));
    }
    sorted.truncate(12);

    let mut string = String::new();

    for (i, &(cl_idx, score)) in sorted.iter().enumerate() {
        let cl_ent_idx = cl_idx + 1;
        let cl = &ctx.clients[cl_idx];

        let x = if i >= 6 { 160 } else { 0 };
        let y = 32 + 32 * (i % 6) as i32;

        // add a dogtag
        let tag = if cl_ent_idx == ent_idx {
            Some("tag1")
        } else if killer_idx >= 0 && cl_ent_idx == killer_idx as usize {
            Some("tag2")
        } else {
            None
        };
        if let Some(tag) = tag {
            let entry = format!("xv {} yv {} picn {} ", x + 32, y, tag);
            if string.len() + entry.len() > MAX_LAYOUT {
                break;
            }
            string.push_str(&entry);
        }

        // minutes played
        let time = (ctx.level.framenum - cl.resp.enterframe) / 600;
        let entry = format!("client {} {} {} {} {} {} ", x, y, cl_idx, score, cl.ping, time);
        if string.len() + entry.len() > MAX_LAYOUT {
            break;
        }
        string.push_str(&entry);
    }

    gi_write_byte(SVC_LAYOUT);
    gi_write_string(&string);
}

// ======================================================================
// STATS
// ======================================================================

fn layout_bits(cl: &GClient, intermission: bool, deathmatch: bool) -> i16 {
    let mut layouts = 0;
    if deathmatch {
        if cl.pers.health <= 0 || intermission || cl.showscores {
            layouts |= 1;
        }
    } else if cl.showscores || cl.showhelp {
        layouts |= 1;
    }
    if cl.showinventory && cl.pers.health > 0 {
        layouts |= 2;
    }
    layouts
}

/// Fill the status bar stats for a player.
pub fn g_set_stats(ctx: &mut GameContext, ent_idx: usize) {
    if ctx.client_of(ent_idx).is_none() {
        return;
    }

    // power armor runs out with the cells
    let mut pa_type = power_armor_type(ctx, ent_idx);
    let cells = ctx.inventory_count(ent_idx, "Cells");
    if pa_type != POWER_ARMOR_NONE && cells == 0 {
        ctx.edicts[ent_idx].flags.remove(FL_POWER_ARMOR);
        gi_sound(ent_idx as i32, CHAN_ITEM, gi_soundindex("misc/power2.wav"), 1.0, ATTN_NORM, 0.0);
        pa_type = POWER_ARMOR_NONE;
    }
    let armor = armor_index(ctx, ent_idx);

    let framenum = ctx.level.framenum;
    let time = ctx.level.time;
    let deathmatch = ctx.deathmatch != 0.0;
    let intermission = ctx.level.intermissiontime != 0.0;
    let pic_health = ctx.level.pic_health;
    let health = ctx.edicts[ent_idx].health;

    let Some(edict_client) = ctx.edicts[ent_idx].client else {
        return;
    };
    let items = &ctx.items;
    let cl = &mut ctx.clients[edict_client];
    let icon = |idx: usize| items.get(idx).map_or(0, |it| gi_imageindex(&it.icon)) as i16;

    // health
    cl.ps.stats[STAT_HEALTH_ICON] = pic_health as i16;
    cl.ps.stats[STAT_HEALTH] = health as i16;

    // ammo
    if cl.ammo_index <= 0 {
        cl.ps.stats[STAT_AMMO_ICON] = 0;
        cl.ps.stats[STAT_AMMO] = 0;
    } else {
        let ammo = cl.ammo_index as usize;
        cl.ps.stats[STAT_AMMO_ICON] = icon(ammo);
        cl.ps.stats[STAT_AMMO] = cl.pers.inventory.get(ammo).copied().unwrap_or(0) as i16;
    }

    // armor, flashing between power armor and body armor
    if pa_type != POWER_ARMOR_NONE && (armor == 0 || (framenum & 8) != 0) {
        cl.ps.stats[STAT_ARMOR_ICON] = gi_imageindex("i_powershield") as i16;
        cl.ps.stats[STAT_ARMOR] = cells as i16;
    } else if armor != 0 {
        cl.ps.stats[STAT_ARMOR_ICON] = icon(armor);
        cl.ps.stats[STAT_ARMOR] = cl.pers.inventory[armor] as i16;
    } else {
        cl.ps.stats[STAT_ARMOR_ICON] = 0;
        cl.ps.stats[STAT_ARMOR] = 0;
    }

    // pickup message
    if time > cl.pickup_msg_time {
        cl.ps.stats[STAT_PICKUP_ICON] = 0;
        cl.ps.stats[STAT_PICKUP_STRING] = 0;
    }

    // timers
    let timer = [
        (cl.quad_framenum, "p_quad"),
        (cl.invincible_framenum, "p_invulnerability"),
        (cl.enviro_framenum, "p_envirosuit"),
        (cl.breather_framenum, "p_rebreather"),
    ]
    .into_iter()
    .find(|&(until, _)| until > framenum);
    match timer {
        Some((until, pic)) => {
            cl.ps.stats[STAT_TIMER_ICON] = gi_imageindex(pic) as i16;
            cl.ps.stats[STAT_TIMER] = ((until - framenum) / BASE_FRAMERATE) as i16;
        }
        None => {
            cl.ps.stats[STAT_TIMER_ICON] = 0;
            cl.ps.stats[STAT_TIMER] = 0;
        }
    }

    // selected item
    cl.ps.stats[STAT_SELECTED_ICON] = if cl.pers.selected_item < 0 {
        0
    } else {
        icon(cl.pers.selected_item as usize)
    };
    cl.ps.stats[STAT_SELECTED_ITEM] = cl.pers.selected_item as i16;

    cl.ps.stats[STAT_LAYOUTS] = layout_bits(cl, intermission, deathmatch);

    cl.ps.stats[STAT_FRAGS] = cl.resp.score as i16;

    // help icon / current weapon if not shown
    cl.ps.stats[STAT_HELPICON] = if cl.pers.helpchanged != 0 && (framenum & 8) != 0 {
        gi_imageindex("i_help") as i16
    } else if (cl.pers.hand == CENTER_HANDED || cl.ps.fov > 91.0) && cl.pers.weapon.is_some() {
        cl.pers.weapon.map_or(0, icon)
    } else {
        0
    };

    cl.ps.stats[STAT_SPECTATOR] = 0;
}

/// Copy a player's stats to every spectator chasing them.
pub fn g_check_chase_stats(ctx: &mut GameContext, ent_idx: usize) {
    let Some(stats) = ctx.client_of(ent_idx).map(|cl| cl.ps.stats) else {
        return;
    };

    for i in 1..=ctx.game.maxclients as usize {
        if !ctx.edicts.get(i).is_some_and(|e| e.inuse) {
            continue;
        }
        let Some(cl) = ctx.client_of_mut(i) else {
            continue;
        };
        if cl.chase_target != ent_idx as i32 {
            continue;
        }
        cl.ps.stats = stats;
        g_set_spectator_stats(ctx, i);
    }
}

/// Stats for a spectator, either free-flying or chasing someone.
pub fn g_set_spectator_stats(ctx: &mut GameContext, ent_idx: usize) {
    let Some(chase_target) = ctx.client_of(ent_idx).map(|cl| cl.chase_target) else {
        return;
    };

    if chase_target <= 0 {
        g_set_stats(ctx, ent_idx);
    }

    let intermission = ctx.level.intermissiontime != 0.0;
    let chasing = chase_target > 0 && ctx.is_live(chase_target);
    let Some(cl) = ctx.client_of_mut(ent_idx) else {
        return;
    };

    cl.ps.stats[STAT_SPECTATOR] = 1;

    // layouts are independent in spectator
    cl.ps.stats[STAT_LAYOUTS] = layout_bits(cl, intermission, true);

    cl.ps.stats[STAT_CHASE] = if chasing {
        (CS_PLAYERSKINS + chase_target - 1) as i16
    } else {
        0
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn test_stats_health_and_frags() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].health = 73;
        ctx.clients[0].resp.score = 5;

        g_set_stats(&mut ctx, PLAYER);

        let stats = ctx.clients[0].ps.stats;
        assert_eq!(stats[STAT_HEALTH], 73);
        assert_eq!(stats[STAT_FRAGS], 5);
        assert_eq!(stats[STAT_ARMOR], 0);
        assert_eq!(stats[STAT_TIMER], 0);
        assert_eq!(stats[STAT_SELECTED_ITEM], -1);
    }

    #[test]
    fn test_stats_body_armor_and_timer() {
        let mut ctx = make_ctx();
        let body = ctx.find_item("Body Armor").unwrap();
        ctx.clients[0].pers.inventory[body] = 80;
        ctx.clients[0].quad_framenum = ctx.level.framenum + 95;

        g_set_stats(&mut ctx, PLAYER);

        let stats = ctx.clients[0].ps.stats;
        assert_eq!(stats[STAT_ARMOR], 80);
        assert_eq!(stats[STAT_ARMOR_ICON], gi_imageindex("i_bodyarmor") as i16);
        assert_eq!(stats[STAT_TIMER], 9);
        assert_eq!(stats[STAT_TIMER_ICON], gi_imageindex("p_quad") as i16);
    }

    #[test]
    fn test_power_armor_drops_without_cells() {
        let mut ctx = make_ctx();
        let shield = ctx.find_item("Power Shield").unwrap();
        ctx.clients[0].pers.inventory[shield] = 1;
        ctx.edicts[PLAYER].flags.insert(FL_POWER_ARMOR);

        g_set_stats(&mut ctx, PLAYER);

        assert!(!ctx.edicts[PLAYER].flags.intersects(FL_POWER_ARMOR));
        assert_eq!(count_sounds(&take_log(), "misc/power2.wav"), 1);
    }

    #[test]
    fn test_power_armor_shows_cells() {
        let mut ctx = make_ctx();
        let shield = ctx.find_item("Power Shield").unwrap();
        let cells = ctx.find_item("Cells").unwrap();
        ctx.clients[0].pers.inventory[shield] = 1;
        ctx.clients[0].pers.inventory[cells] = 60;
        ctx.edicts[PLAYER].flags.insert(FL_POWER_ARMOR);

        g_set_stats(&mut ctx, PLAYER);

        assert_eq!(ctx.clients[0].ps.stats[STAT_ARMOR], 60);
    }

    #[test]
    fn test_deathmatch_layouts() {
        let mut ctx = make_ctx();
        ctx.deathmatch = 1.0;
        ctx.clients[0].showscores = true;
        g_set_stats(&mut ctx, PLAYER);
        assert_eq!(ctx.clients[0].ps.stats[STAT_LAYOUTS], 1);

        ctx.clients[0].showscores = false;
        ctx.clients[0].showinventory = true;
        g_set_stats(&mut ctx, PLAYER);
        assert_eq!(ctx.clients[0].ps.stats[STAT_LAYOUTS], 2);
    }

    #[test]
    fn test_chase_stats_copied_to_spectator() {
        let mut ctx = make_ctx();
        ctx.edicts[2].inuse = true;
        ctx.clients[1].chase_target = PLAYER as i32;
        ctx.clients[0].ps.stats[STAT_HEALTH] = 42;

        g_check_chase_stats(&mut ctx, PLAYER);

        let stats = ctx.clients[1].ps.stats;
        assert_eq!(stats[STAT_HEALTH], 42);
        assert_eq!(stats[STAT_SPECTATOR], 1);
        assert_eq!(stats[STAT_CHASE], (CS_PLAYERSKINS + PLAYER as i32 - 1) as i16);
    }

    #[test]
    fn test_scoreboard_sorted_with_tag() {
        let mut ctx = make_ctx();
        ctx.edicts[2].inuse = true;
        ctx.clients[0].resp.score = 3;
        ctx.clients[1].resp.score = 9;

        deathmatch_scoreboard_message(&ctx, PLAYER, -1);

        let log = take_log();
        assert_eq!(log.writes[0], MsgWrite::Byte(SVC_LAYOUT));
        let MsgWrite::Str(layout) = &log.writes[1] else {
            panic!("expected a layout string");
        };
        let best = layout.find("client 0 32 1 9").unwrap();
        let mine = layout.find("client 0 64 0 3").unwrap();
        assert!(best < mine);
        assert!(layout.contains("xv 32 yv 64 picn tag1"));
    }
}
