// qcommon.rs — protocol and error definitions shared with the host engine
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

pub use crate::q_shared::{ERR_DROP, ERR_FATAL};

// ============================================================
// Server to client message ops
// ============================================================

/// The subset of svc_* opcodes the game writes itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SvcOps {
    TempEntity = 3,
    Layout = 4,
}

pub const SVC_TEMP_ENTITY: i32 = SvcOps::TempEntity as i32;
pub const SVC_LAYOUT: i32 = SvcOps::Layout as i32;
