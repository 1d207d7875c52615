// q_shared.rs — foundational types and functions shared by the game modules
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

// ============================================================
// Basic types
// ============================================================

pub type Vec3 = [f32; 3];

pub const VEC3_ORIGIN: Vec3 = [0.0, 0.0, 0.0];

// Angle indices
pub const PITCH: usize = 0; // up / down
pub const YAW: usize = 1; // left / right
pub const ROLL: usize = 2; // fall over

// ============================================================
// Error levels
// ============================================================

pub const ERR_FATAL: i32 = 4;
pub const ERR_DROP: i32 = 8;
pub const ERR_DISCONNECT: i32 = 16;

// ============================================================
// Multicast
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Multicast {
    All = 0,
    Phs = 1,
    Pvs = 2,
    AllR = 3,
    PhsR = 4,
    PvsR = 5,
}

pub const MULTICAST_PVS: i32 = Multicast::Pvs as i32;

// ============================================================
// Content flags
// ============================================================

pub const CONTENTS_SOLID: i32 = 1;
pub const CONTENTS_WINDOW: i32 = 2;
pub const CONTENTS_LAVA: i32 = 8;
pub const CONTENTS_SLIME: i32 = 16;
pub const CONTENTS_WATER: i32 = 32;
pub const CONTENTS_PLAYERCLIP: i32 = 0x10000;
pub const CONTENTS_MONSTER: i32 = 0x2000000;
pub const CONTENTS_DEADMONSTER: i32 = 0x4000000;

// ============================================================
// Surface flags
// ============================================================

pub const SURF_SKY: i32 = 0x4;

// ============================================================
// Content masks
// ============================================================

pub const MASK_SOLID: i32 = CONTENTS_SOLID | CONTENTS_WINDOW;
pub const MASK_PLAYERSOLID: i32 =
    CONTENTS_SOLID | CONTENTS_PLAYERCLIP | CONTENTS_WINDOW | CONTENTS_MONSTER;
pub const MASK_SHOT: i32 =
    CONTENTS_SOLID | CONTENTS_MONSTER | CONTENTS_WINDOW | CONTENTS_DEADMONSTER;

// ============================================================
// Plane
// ============================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct CPlane {
    pub normal: Vec3,
    pub dist: f32,
    pub plane_type: u8,
    pub signbits: u8,
    pub pad: [u8; 2],
}

// ============================================================
// Surface
// ============================================================

#[derive(Debug, Clone, Default)]
pub struct CSurface {
    pub name: [u8; 16],
    pub flags: i32,
    pub value: i32,
}

impl CSurface {
    pub fn with_flags(flags: i32) -> Self {
        Self { flags, ..Default::default() }
    }
}

// ============================================================
// Trace
// ============================================================

#[derive(Debug, Clone)]
pub struct Trace {
    pub allsolid: bool,
    pub startsolid: bool,
    pub fraction: f32,
    pub endpos: Vec3,
    pub plane: CPlane,
    pub surface: Option<CSurface>,
    pub contents: i32,
    /// Index of the entity hit, -1 when nothing was hit.
    pub ent_index: i32,
}

impl Default for Trace {
    fn default() -> Self {
        Self {
            allsolid: false,
            startsolid: false,
            fraction: 1.0,
            endpos: [0.0; 3],
            plane: CPlane::default(),
            surface: None,
            contents: 0,
            ent_index: -1,
        }
    }
}

// ============================================================
// Player movement types
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum PmType {
    #[default]
    Normal = 0,
    Spectator = 1,
    Dead = 2,
    Gib = 3,
    Freeze = 4,
}

pub const PMF_DUCKED: u8 = 1;
pub const PMF_ON_GROUND: u8 = 4;
pub const PMF_NO_PREDICTION: u8 = 64;

/// Communicated bit-accurate between server and client for prediction sync.
/// Origin and velocity are 12.3 fixed point.
#[derive(Debug, Clone, Copy, Default)]
pub struct PmoveState {
    pub pm_type: PmType,
    pub origin: [i16; 3],
    pub velocity: [i16; 3],
    pub pm_flags: u8,
    pub pm_time: u8,
    pub gravity: i16,
    pub delta_angles: [i16; 3],
}

// ============================================================
// Button bits
// ============================================================

pub const BUTTON_ATTACK: u8 = 1;

// ============================================================
// Entity effects (EF_*)
// ============================================================

pub const EF_COLOR_SHELL: u32 = 0x00000100;
pub const EF_POWERSCREEN: u32 = 0x00000200;
pub const EF_QUAD: u32 = 0x00008000;
pub const EF_PENT: u32 = 0x00010000;

// ============================================================
// Render effects (RF_*)
// ============================================================

pub const RF_SHELL_RED: i32 = 1024;
pub const RF_SHELL_GREEN: i32 = 2048;
pub const RF_SHELL_BLUE: i32 = 4096;
pub const RF_IR_VISIBLE: i32 = 0x00008000;

// ============================================================
// Refdef flags (RDF_*)
// ============================================================

pub const RDF_UNDERWATER: i32 = 1;

// ============================================================
// Sound channels and attenuation
// ============================================================

pub const CHAN_AUTO: i32 = 0;
pub const CHAN_WEAPON: i32 = 1;
pub const CHAN_VOICE: i32 = 2;
pub const CHAN_ITEM: i32 = 3;
pub const CHAN_BODY: i32 = 4;
pub const CHAN_RELIABLE: i32 = 16;

pub const ATTN_NORM: f32 = 1.0;
pub const ATTN_STATIC: f32 = 3.0;

// ============================================================
// Player stats (STAT_*)
// ============================================================

pub const STAT_HEALTH_ICON: usize = 0;
pub const STAT_HEALTH: usize = 1;
pub const STAT_AMMO_ICON: usize = 2;
pub const STAT_AMMO: usize = 3;
pub const STAT_ARMOR_ICON: usize = 4;
pub const STAT_ARMOR: usize = 5;
pub const STAT_SELECTED_ICON: usize = 6;
pub const STAT_PICKUP_ICON: usize = 7;
pub const STAT_PICKUP_STRING: usize = 8;
pub const STAT_TIMER_ICON: usize = 9;
pub const STAT_TIMER: usize = 10;
pub const STAT_HELPICON: usize = 11;
pub const STAT_SELECTED_ITEM: usize = 12;
pub const STAT_LAYOUTS: usize = 13;
pub const STAT_FRAGS: usize = 14;
pub const STAT_FLASHES: usize = 15;
pub const STAT_CHASE: usize = 16;
pub const STAT_SPECTATOR: usize = 17;

pub const MAX_STATS: usize = 32;

pub const MAX_CLIENTS: usize = 256; // absolute limit

// config string index of the first player skin
pub const CS_PLAYERSKINS: i32 = 1312;

// ============================================================
// Deathmatch flags (DF_*)
// ============================================================

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DmFlags: i32 {
        const NO_HEALTH       = 0x00000001;
        const NO_ITEMS        = 0x00000002;
        const WEAPONS_STAY    = 0x00000004;
        const NO_FALLING      = 0x00000008;
        const INSTANT_ITEMS   = 0x00000010;
        const SAME_LEVEL      = 0x00000020;
        const NO_FRIENDLY_FIRE = 0x00000100;
        const NO_ARMOR        = 0x00000800;
    }
}
pub const DF_NO_FALLING: DmFlags = DmFlags::NO_FALLING;

pub const RAD_TO_DEG: f32 = 180.0 / std::f32::consts::PI;

// ============================================================
// Entity events
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum EntityEvent {
    None = 0,
    ItemRespawn = 1,
    Footstep = 2,
    FallShort = 3,
    Fall = 4,
    FallFar = 5,
    PlayerTeleport = 6,
    OtherTeleport = 7,
}

pub const EV_NONE: i32 = EntityEvent::None as i32;
pub const EV_FOOTSTEP: i32 = EntityEvent::Footstep as i32;
pub const EV_FALLSHORT: i32 = EntityEvent::FallShort as i32;
pub const EV_FALL: i32 = EntityEvent::Fall as i32;
pub const EV_FALLFAR: i32 = EntityEvent::FallFar as i32;

// ============================================================
// Entity state
// ============================================================

#[derive(Debug, Clone, Default)]
pub struct EntityState {
    pub number: i32,
    pub origin: Vec3,
    pub angles: Vec3,
    pub old_origin: Vec3,
    pub modelindex: i32,
    pub modelindex2: i32,
    pub frame: i32,
    pub skinnum: i32,
    pub effects: u32,
    pub renderfx: i32,
    pub solid: i32,
    pub sound: i32,
    pub event: i32,
}

// ============================================================
// Player state
// ============================================================

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub pmove: PmoveState,
    pub viewangles: Vec3,
    pub viewoffset: Vec3,
    pub kick_angles: Vec3,
    pub gunangles: Vec3,
    pub gunoffset: Vec3,
    pub gunindex: i32,
    pub gunframe: i32,
    /// rgba full screen effect
    pub blend: [f32; 4],
    pub fov: f32,
    pub rdflags: i32,
    pub stats: [i16; MAX_STATS],
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            pmove: PmoveState::default(),
            viewangles: [0.0; 3],
            viewoffset: [0.0; 3],
            kick_angles: [0.0; 3],
            gunangles: [0.0; 3],
            gunoffset: [0.0; 3],
            gunindex: 0,
            gunframe: 0,
            blend: [0.0; 4],
            fov: 90.0,
            rdflags: 0,
            stats: [0; MAX_STATS],
        }
    }
}

// ============================================================
// Cvar flags
// ============================================================

pub const CVAR_SERVERINFO: i32 = 4;
pub const CVAR_LATCH: i32 = 16;

// ============================================================
// MATHLIB: vector operations
// ============================================================

#[inline]
pub fn dot_product(a: &Vec3, b: &Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn vector_subtract(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn vector_add(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// veca + scale * vecb
pub fn vector_ma(veca: &Vec3, scale: f32, vecb: &Vec3) -> Vec3 {
    [
        veca[0] + scale * vecb[0],
        veca[1] + scale * vecb[1],
        veca[2] + scale * vecb[2],
    ]
}

/// Normalize in place, returns original length.
pub fn vector_normalize(v: &mut Vec3) -> f32 {
    let length = vector_length(v);
    if length != 0.0 {
        let ilength = 1.0 / length;
        v[0] *= ilength;
        v[1] *= ilength;
        v[2] *= ilength;
    }
    length
}

pub fn vector_length(v: &Vec3) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

pub fn vector_scale(v: &Vec3, scale: f32) -> Vec3 {
    [v[0] * scale, v[1] * scale, v[2] * scale]
}

// ============================================================
// Angle functions
// ============================================================

pub fn angle_vectors(
    angles: &Vec3,
    forward: Option<&mut Vec3>,
    right: Option<&mut Vec3>,
    up: Option<&mut Vec3>,
) {
    let angle_yaw = angles[YAW].to_radians();
    let sy = angle_yaw.sin();
    let cy = angle_yaw.cos();

    let angle_pitch = angles[PITCH].to_radians();
    let sp = angle_pitch.sin();
    let cp = angle_pitch.cos();

    let angle_roll = angles[ROLL].to_radians();
    let sr = angle_roll.sin();
    let cr = angle_roll.cos();

    if let Some(fwd) = forward {
        fwd[0] = cp * cy;
        fwd[1] = cp * sy;
        fwd[2] = -sp;
    }
    if let Some(r) = right {
        r[0] = -sr * sp * cy + -cr * -sy;
        r[1] = -sr * sp * sy + -cr * cy;
        r[2] = -sr * cp;
    }
    if let Some(u) = up {
        u[0] = cr * sp * cy + -sr * -sy;
        u[1] = cr * sp * sy + -sr * cy;
        u[2] = cr * cp;
    }
}

/// Convenience version of angle_vectors that returns (forward, right, up).
pub fn angle_vectors_tuple(angles: &Vec3) -> (Vec3, Vec3, Vec3) {
    let mut forward = [0.0f32; 3];
    let mut right = [0.0f32; 3];
    let mut up = [0.0f32; 3];
    angle_vectors(angles, Some(&mut forward), Some(&mut right), Some(&mut up));
    (forward, right, up)
}

/// Converts a direction vector to Euler angles, truncating yaw and pitch to
/// whole degrees.
pub fn vectoangles(value1: &Vec3, angles: &mut Vec3) {
    let yaw;
    let mut pitch;

    if value1[1] == 0.0 && value1[0] == 0.0 {
        yaw = 0.0;
        pitch = if value1[2] > 0.0 { 90.0 } else { 270.0 };
    } else {
        yaw = if value1[0] != 0.0 {
            (value1[1].atan2(value1[0]) * RAD_TO_DEG) as i32 as f32
        } else if value1[1] > 0.0 {
            90.0
        } else {
            270.0
        };

        let forward = (value1[0] * value1[0] + value1[1] * value1[1]).sqrt();
        pitch = (value1[2].atan2(forward) * RAD_TO_DEG) as i32 as f32;
        if pitch < 0.0 {
            pitch += 360.0;
        }
    }

    angles[PITCH] = -pitch;
    angles[YAW] = if yaw < 0.0 { yaw + 360.0 } else { yaw };
    angles[ROLL] = 0.0;
}

// ============================================================
// Tests
// ============================================================
