#![allow(dead_code, unused_variables, unused_assignments, unused_mut)]
#![allow(clippy::needless_return, clippy::too_many_arguments, clippy::collapsible_if,
         clippy::collapsible_else_if, clippy::field_reassign_with_default,
         clippy::manual_range_contains, clippy::comparison_chain,
         clippy::identity_op, clippy::float_cmp, clippy::needless_range_loop,
         clippy::manual_clamp, clippy::new_without_default)]
// Game module: grapple hook and player end-of-frame view

pub mod game_import;
pub mod game;
pub mod g_local;
pub mod m_player_frames;
pub mod g_utils;
pub mod g_phys;
pub mod g_combat;
pub mod p_weapon;
pub mod p_hook;
pub mod p_hud;
pub mod p_view;
pub mod g_cmds;
pub mod g_main;

#[cfg(test)]
pub(crate) mod test_support;

pub use g_main::{g_run_frame, init_game};
pub use g_cmds::client_command;
pub use p_hook::{
    grapple_fire as fire_grapple, grapple_player_reset as on_player_reset,
    grapple_pull as advance_grapple, grapple_release as release_grapple,
};
pub use p_view::client_end_server_frame as end_of_frame;
