// m_player_frames.rs — player model animation frame numbers
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

pub const FRAME_STAND01: i32 = 0;
pub const FRAME_STAND40: i32 = 39;

pub const FRAME_RUN1: i32 = 40;
pub const FRAME_RUN6: i32 = 45;

pub const FRAME_PAIN101: i32 = 54;
pub const FRAME_PAIN104: i32 = 57;
pub const FRAME_PAIN201: i32 = 58;
pub const FRAME_PAIN204: i32 = 61;
pub const FRAME_PAIN301: i32 = 62;
pub const FRAME_PAIN304: i32 = 65;

pub const FRAME_JUMP1: i32 = 66;
pub const FRAME_JUMP2: i32 = 67;
pub const FRAME_JUMP3: i32 = 68;
pub const FRAME_JUMP6: i32 = 71;

pub const FRAME_CRSTND01: i32 = 135;
pub const FRAME_CRSTND19: i32 = 153;

pub const FRAME_CRWALK1: i32 = 154;
pub const FRAME_CRWALK6: i32 = 159;

pub const FRAME_CRPAIN1: i32 = 169;
pub const FRAME_CRPAIN4: i32 = 172;

pub const FRAME_CRDEATH1: i32 = 173;
pub const FRAME_CRDEATH5: i32 = 177;

pub const FRAME_DEATH101: i32 = 178;
pub const FRAME_DEATH106: i32 = 183;
pub const FRAME_DEATH201: i32 = 184;
pub const FRAME_DEATH206: i32 = 189;
pub const FRAME_DEATH301: i32 = 190;
pub const FRAME_DEATH308: i32 = 197;
