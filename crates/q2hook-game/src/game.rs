// game.rs — entity flags and solidity shared with the host engine
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

// edict->svflags
pub const SVF_NOCLIENT: i32 = 0x00000001; // don't send entity to clients, even if it has effects
pub const SVF_DEADMONSTER: i32 = 0x00000002; // treat as CONTENTS_DEADMONSTER for collision

// edict->solid values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Solid {
    #[default]
    Not = 0, // no interaction with other objects
    Trigger, // only touch when inside, after moving
    Bbox,    // touch on edge
    Bsp,     // bsp clip, touch on edge
}
