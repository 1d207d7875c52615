// g_local.rs — local definitions for the game module
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

pub use q2hook_common::q_shared::*;
pub use q2hook_common::qcommon::{SVC_LAYOUT, SVC_TEMP_ENTITY};
pub use crate::game::Solid;

use std::collections::HashMap;

// the "gameversion" client command will print this plus compile date
pub const GAMEVERSION: &str = "q2hook";

// protocol bytes that can be directly added to messages
pub const TE_BLOOD: i32 = 1;
pub const TE_SPARKS: i32 = 9;
pub const TE_SCREEN_SPARKS: i32 = 12;
pub const TE_SHIELD_SPARKS: i32 = 13;
pub const TE_PARASITE_ATTACK: i32 = 16;
pub const TE_GRAPPLE_CABLE: i32 = 24;

// edict->flags
bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct EntityFlags: i32 {
        const FLY            = 0x00000001;
        const SWIM           = 0x00000002;
        const INWATER        = 0x00000008;
        const GODMODE        = 0x00000010;
        const NOTARGET       = 0x00000020;
        const NO_KNOCKBACK   = 0x00000800;
        const POWER_ARMOR    = 0x00001000;
    }
}
pub const FL_FLY: EntityFlags = EntityFlags::FLY;
pub const FL_SWIM: EntityFlags = EntityFlags::SWIM;
pub const FL_INWATER: EntityFlags = EntityFlags::INWATER;
pub const FL_GODMODE: EntityFlags = EntityFlags::GODMODE;
pub const FL_NOTARGET: EntityFlags = EntityFlags::NOTARGET;
pub const FL_NO_KNOCKBACK: EntityFlags = EntityFlags::NO_KNOCKBACK;
pub const FL_POWER_ARMOR: EntityFlags = EntityFlags::POWER_ARMOR;

pub const FRAMETIME: f32 = 0.1;
/// Server ticks per second; deadlines are expressed as `framenum + seconds * BASE_FRAMERATE`.
pub const BASE_FRAMERATE: i32 = 10;

pub const DAMAGE_TIME: f32 = 0.5;
pub const FALL_TIME: f32 = 0.3;

// takedamage
pub const DAMAGE_NO: i32 = 0;
pub const DAMAGE_YES: i32 = 1;
pub const DAMAGE_AIM: i32 = 2;

// deadflag
pub const DEAD_NO: i32 = 0;
pub const DEAD_DYING: i32 = 1;
pub const DEAD_DEAD: i32 = 2;

// power armor types
pub const POWER_ARMOR_NONE: i32 = 0;
pub const POWER_ARMOR_SCREEN: i32 = 1;
pub const POWER_ARMOR_SHIELD: i32 = 2;

// handedness values
pub const RIGHT_HANDED: i32 = 0;
pub const LEFT_HANDED: i32 = 1;
pub const CENTER_HANDED: i32 = 2;

// noise types for player_noise
pub const PNOISE_SELF: i32 = 0;
pub const PNOISE_WEAPON: i32 = 1;
pub const PNOISE_IMPACT: i32 = 2;

// armor types
pub const ARMOR_NONE: i32 = 0;
pub const ARMOR_JACKET: i32 = 1;
pub const ARMOR_COMBAT: i32 = 2;
pub const ARMOR_BODY: i32 = 3;

// animation priorities
pub const ANIM_BASIC: i32 = 0; // stand / run
pub const ANIM_WAVE: i32 = 1;
pub const ANIM_JUMP: i32 = 2;
pub const ANIM_PAIN: i32 = 3;
pub const ANIM_ATTACK: i32 = 4;
pub const ANIM_DEATH: i32 = 5;
pub const ANIM_REVERSE: i32 = 6;

// means of death
pub const MOD_UNKNOWN: i32 = 0;
pub const MOD_WATER: i32 = 17;
pub const MOD_SLIME: i32 = 18;
pub const MOD_LAVA: i32 = 19;
pub const MOD_FALLING: i32 = 22;
pub const MOD_SUICIDE: i32 = 23;
pub const MOD_GRAPPLE: i32 = 34;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum WeaponState {
    #[default]
    Ready = 0,
    Activating,
    Dropping,
    Firing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum MoveType {
    #[default]
    None = 0,
    Noclip,
    Push,
    Stop,
    Walk,
    Step,
    Fly,
    Toss,
    FlyMissile,
    Bounce,
}

/// Grapple progression. Ordered so that `state > GrappleState::Fly` means attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(i32)]
pub enum GrappleState {
    #[default]
    Fly = 0,
    Pull,
    Hang,
}

/// Which sound and model set the grapple uses, chosen once at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookAssets {
    Standard,
    #[default]
    Custom,
}

// Damage flags
bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DamageFlags: i32 {
        const RADIUS        = 0x00000001;
        const NO_ARMOR      = 0x00000002;
        const ENERGY        = 0x00000004;
        const NO_KNOCKBACK  = 0x00000008;
        const BULLET        = 0x00000010;
        const NO_PROTECTION = 0x00000020;
    }
}
pub const DAMAGE_RADIUS: DamageFlags = DamageFlags::RADIUS;
pub const DAMAGE_NO_ARMOR: DamageFlags = DamageFlags::NO_ARMOR;
pub const DAMAGE_ENERGY: DamageFlags = DamageFlags::ENERGY;
pub const DAMAGE_NO_KNOCKBACK: DamageFlags = DamageFlags::NO_KNOCKBACK;
pub const DAMAGE_BULLET: DamageFlags = DamageFlags::BULLET;
pub const DAMAGE_NO_PROTECTION: DamageFlags = DamageFlags::NO_PROTECTION;

// ============================================================
// Items
// ============================================================

pub const MAX_ITEMS: usize = 256;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ItemFlags: i32 {
        const WEAPON    = 1;
        const AMMO      = 2;
        const ARMOR     = 4;
        const POWERUP   = 32;
    }
}
pub const IT_WEAPON: ItemFlags = ItemFlags::WEAPON;
pub const IT_AMMO: ItemFlags = ItemFlags::AMMO;
pub const IT_ARMOR: ItemFlags = ItemFlags::ARMOR;
pub const IT_POWERUP: ItemFlags = ItemFlags::POWERUP;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GItemArmor {
    pub base_count: i32,
    pub max_count: i32,
    pub normal_protection: f32,
    pub energy_protection: f32,
    pub armor: i32,
}

/// Item definition. Pickup and use behavior belongs to the host rule set;
/// the game only needs names, icons and armor ratios.
#[derive(Debug, Clone, Default)]
pub struct GItem {
    pub classname: String,
    pub pickup_name: String,
    pub icon: String,
    pub flags: ItemFlags,
    pub armor_info: Option<GItemArmor>,
}

impl GItem {
    fn new(classname: &str, pickup_name: &str, icon: &str, flags: ItemFlags) -> Self {
        Self {
            classname: classname.to_string(),
            pickup_name: pickup_name.to_string(),
            icon: icon.to_string(),
            flags,
            armor_info: None,
        }
    }

    fn armor(classname: &str, pickup_name: &str, icon: &str, info: GItemArmor) -> Self {
        Self {
            armor_info: Some(info),
            ..Self::new(classname, pickup_name, icon, IT_ARMOR)
        }
    }
}

/// The item list the player code refers to by name. Slot 0 is the null item.
pub fn default_item_list() -> Vec<GItem> {
    vec![
        GItem::default(),
        GItem::armor("item_armor_body", "Body Armor", "i_bodyarmor", GItemArmor {
            base_count: 100, max_count: 200, normal_protection: 0.80, energy_protection: 0.60, armor: ARMOR_BODY,
        }),
        GItem::armor("item_armor_combat", "Combat Armor", "i_combatarmor", GItemArmor {
            base_count: 50, max_count: 100, normal_protection: 0.60, energy_protection: 0.30, armor: ARMOR_COMBAT,
        }),
        GItem::armor("item_armor_jacket", "Jacket Armor", "i_jacketarmor", GItemArmor {
            base_count: 25, max_count: 50, normal_protection: 0.30, energy_protection: 0.00, armor: ARMOR_JACKET,
        }),
        GItem::new("item_power_screen", "Power Screen", "i_powerscreen", IT_ARMOR),
        GItem::new("item_power_shield", "Power Shield", "i_powershield", IT_ARMOR),
        GItem::new("weapon_grapple", "Grapple", "w_grapple", IT_WEAPON),
        GItem::new("weapon_blaster", "Blaster", "w_blaster", IT_WEAPON),
        GItem::new("weapon_railgun", "Railgun", "w_railgun", IT_WEAPON),
        GItem::new("weapon_bfg", "BFG10K", "w_bfg", IT_WEAPON),
        GItem::new("ammo_cells", "Cells", "a_cells", IT_AMMO),
        GItem::new("ammo_slugs", "Slugs", "a_slugs", IT_AMMO),
    ]
}

// ============================================================
// Game and level state
// ============================================================

/// Persistent game state (survives level changes).
#[derive(Debug, Clone, Default)]
pub struct GameLocals {
    pub helpmessage1: String,
    pub helpmessage2: String,
    pub helpchanged: i32,
    pub maxclients: i32,
    pub maxentities: i32,
}

/// Level state (cleared on each map change).
#[derive(Debug, Clone, Default)]
pub struct LevelLocals {
    pub framenum: i32,
    pub time: f32,
    pub level_name: String,
    pub intermissiontime: f32,
    pub sound_entity: i32, // entity index
    pub sound_entity_framenum: i32,
    pub sound2_entity: i32, // entity index
    pub sound2_entity_framenum: i32,
    pub pic_health: i32,
    pub current_entity: i32, // entity index
}

// ============================================================
// Clients
// ============================================================

/// Client data that survives respawns.
#[derive(Debug, Clone)]
pub struct ClientPersistant {
    pub netname: String,
    pub hand: i32,
    pub connected: bool,
    pub health: i32,
    pub max_health: i32,
    pub selected_item: i32,
    pub inventory: [i32; MAX_ITEMS],
    pub weapon: Option<usize>, // item index
    pub helpchanged: i32,
    pub game_helpchanged: i32,
    pub spectator: bool,
}

impl Default for ClientPersistant {
    fn default() -> Self {
        Self {
            netname: String::new(),
            hand: RIGHT_HANDED,
            connected: false,
            health: 0,
            max_health: 0,
            selected_item: -1,
            inventory: [0; MAX_ITEMS],
            weapon: None,
            helpchanged: 0,
            game_helpchanged: 0,
            spectator: false,
        }
    }
}

/// Client data that stays across deathmatch respawns.
#[derive(Debug, Clone, Default)]
pub struct ClientRespawn {
    pub enterframe: i32,
    pub score: i32,
    pub spectator: bool,
}

/// Per-player record. Timers ending in `_framenum` are absolute tick deadlines.
#[derive(Debug, Clone, Default)]
pub struct GClient {
    // known to server
    pub ps: PlayerState,
    pub ping: i32,

    // private to game
    pub pers: ClientPersistant,
    pub resp: ClientRespawn,

    pub showscores: bool,
    pub showinventory: bool,
    pub showhelp: bool,

    pub ammo_index: i32,
    pub buttons: i32,
    pub oldbuttons: i32,
    pub latched_buttons: i32,
    pub newweapon: Option<usize>, // item index

    // sum up damage over an entire frame, so shotgun blasts give a single
    // big kick instead of many small ones
    pub damage_armor: i32,
    pub damage_parmor: i32,
    pub damage_blood: i32,
    pub damage_knockback: i32,
    pub damage_from: Vec3,

    pub killer_yaw: f32,
    pub weaponstate: WeaponState,
    pub kick_angles: Vec3,
    pub kick_origin: Vec3,
    pub v_dmg_roll: f32,
    pub v_dmg_pitch: f32,
    pub v_dmg_time: f32,
    pub fall_time: f32,
    pub fall_value: f32,
    pub damage_alpha: f32,
    pub bonus_alpha: f32,
    pub damage_blend: Vec3,
    pub v_angle: Vec3,
    pub bobtime: f32,
    pub oldviewangles: Vec3,
    pub oldvelocity: Vec3,

    pub next_drown_framenum: i32,
    pub old_waterlevel: i32,
    pub breather_sound: i32,

    // animation vars
    pub anim_end: i32,
    pub anim_priority: i32,
    pub anim_duck: bool,
    pub anim_run: bool,

    // powerup timers
    pub quad_framenum: i32,
    pub invincible_framenum: i32,
    pub breather_framenum: i32,
    pub enviro_framenum: i32,

    pub silencer_shots: i32,
    pub weapon_sound: i32,
    pub pickup_msg_time: f32,

    pub chase_target: i32, // entity index, -1 = none

    // grapple
    pub grapple: Option<usize>, // projectile entity index
    pub grapple_state: GrappleState,
    pub grapple_release_framenum: i32,
}

// ============================================================
// Entities
// ============================================================

#[derive(Debug, Clone, Default)]
pub struct Edict {
    // server-visible fields
    pub s: EntityState,
    pub client: Option<usize>, // index into clients array, None if not a player
    pub inuse: bool,
    pub linkcount: i32,
    pub svflags: i32,
    pub mins: Vec3,
    pub maxs: Vec3,
    pub absmin: Vec3,
    pub absmax: Vec3,
    pub size: Vec3,
    pub solid: Solid,
    pub clipmask: i32,
    pub owner: i32, // entity index, -1 = none

    // game-private fields
    pub movetype: MoveType,
    pub flags: EntityFlags,
    pub model: String,
    pub freetime: f32,
    pub classname: String,

    pub velocity: Vec3,
    pub avelocity: Vec3,
    pub mass: i32,
    pub air_finished: i32, // framenum
    pub gravity: f32,

    // callbacks are indices into the g_phys dispatch table
    pub touch_fn: Option<usize>,

    pub pain_debounce_framenum: i32,
    pub damage_debounce_framenum: i32,

    pub health: i32,
    pub max_health: i32,
    pub deadflag: i32,
    pub powerarmor_framenum: i32,

    pub viewheight: i32,
    pub takedamage: i32,
    pub dmg: i32,
    pub count: i32,

    pub enemy: i32,        // entity index
    pub groundentity: i32, // entity index

    pub mynoise: i32, // entity index
    pub mynoise2: i32,

    pub teleport_time: f32,

    pub watertype: i32,
    pub waterlevel: i32,
}

impl Edict {
    /// Fresh slot contents: no owner, enemy or ground.
    pub fn cleared() -> Self {
        Self {
            owner: -1,
            enemy: -1,
            groundentity: -1,
            ..Self::default()
        }
    }
}

// ============================================================
// Unified Game Context
// ============================================================

/// All game state. Entity 0 is the world; entities 1..=maxclients are players.
pub struct GameCtx {
    pub edicts: Vec<Edict>,
    pub clients: Vec<GClient>,
    pub game: GameLocals,
    pub level: LevelLocals,
    pub items: Vec<GItem>,
    pub item_by_pickup_name: HashMap<String, usize>,
    pub item_by_classname: HashMap<String, usize>,
    // weapons with an idle hum, looked up once per item table
    pub railgun_index: Option<usize>,
    pub bfg_index: Option<usize>,

    pub num_edicts: i32,
    pub max_edicts: i32,

    pub snd_fry: i32,
    pub means_of_death: i32,

    // cvar values, cached by init_game
    pub deathmatch: f32,
    pub dmflags: f32,
    pub maxclients: f32,
    pub sv_gravity: f32,
    pub sv_rollspeed: f32,
    pub sv_rollangle: f32,
    pub gun_x: f32,
    pub gun_y: f32,
    pub gun_z: f32,
    pub run_pitch: f32,
    pub run_roll: f32,
    pub bob_up: f32,
    pub bob_pitch: f32,
    pub bob_roll: f32,

    // grapple configuration
    pub hook_assets: HookAssets,
    pub hook_offhand: bool,
    pub hook_weapon: bool,

    // variant cycles carried across ticks
    pub pain_anim_index: i32,
    pub death_anim_index: i32,
}

/// Convenience alias so every game module can refer to the context as `GameContext`.
pub type GameContext = GameCtx;

impl Default for GameCtx {
    fn default() -> Self {
        Self {
            edicts: Vec::new(),
            clients: Vec::new(),
            game: GameLocals::default(),
            level: LevelLocals::default(),
            items: Vec::new(),
            item_by_pickup_name: HashMap::new(),
            item_by_classname: HashMap::new(),
            railgun_index: None,
            bfg_index: None,
            num_edicts: 0,
            max_edicts: 0,
            snd_fry: 0,
            means_of_death: 0,
            deathmatch: 0.0,
            dmflags: 0.0,
            maxclients: 0.0,
            sv_gravity: 800.0,
            sv_rollspeed: 200.0,
            sv_rollangle: 2.0,
            gun_x: 0.0,
            gun_y: 0.0,
            gun_z: 0.0,
            run_pitch: 0.002,
            run_roll: 0.005,
            bob_up: 0.005,
            bob_pitch: 0.002,
            bob_roll: 0.002,
            hook_assets: HookAssets::Custom,
            hook_offhand: true,
            hook_weapon: false,
            pain_anim_index: 0,
            death_anim_index: 0,
        }
    }
}

impl GameCtx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the entity arena and client slots. Slot 0 is the world and
    /// slots `1..=max_clients` belong to players.
    pub fn with_capacity(max_edicts: usize, max_clients: usize) -> Self {
        let mut ctx = Self {
            edicts: vec![Edict::cleared(); max_edicts],
            clients: vec![GClient::default(); max_clients],
            max_edicts: max_edicts as i32,
            num_edicts: max_clients as i32 + 1,
            maxclients: max_clients as f32,
            ..Self::default()
        };
        ctx.game.maxclients = max_clients as i32;
        ctx.game.maxentities = max_edicts as i32;
        for (i, e) in ctx.edicts.iter_mut().enumerate() {
            e.s.number = i as i32;
        }
        ctx.edicts[0].inuse = true;
        ctx.edicts[0].classname = "worldspawn".to_string();
        ctx.edicts[0].solid = Solid::Bsp;
        ctx.edicts[0].movetype = MoveType::Push;
        for i in 0..max_clients {
            ctx.edicts[i + 1].client = Some(i);
            ctx.clients[i].chase_target = -1;
        }
        ctx.set_items(default_item_list());
        ctx
    }

    /// Install an item list and rebuild the name lookups.
    pub fn set_items(&mut self, items: Vec<GItem>) {
        self.item_by_pickup_name.clear();
        self.item_by_classname.clear();
        for (i, it) in items.iter().enumerate().skip(1) {
            self.item_by_pickup_name.insert(it.pickup_name.to_lowercase(), i);
            self.item_by_classname.insert(it.classname.to_lowercase(), i);
        }
        self.items = items;
        self.railgun_index = self.find_item("Railgun");
        self.bfg_index = self.find_item("BFG10K");
    }

    /// Look up an item by pickup name, case-insensitively.
    pub fn find_item(&self, pickup_name: &str) -> Option<usize> {
        self.item_by_pickup_name.get(&pickup_name.to_lowercase()).copied()
    }

    pub fn find_item_by_classname(&self, classname: &str) -> Option<usize> {
        self.item_by_classname.get(&classname.to_lowercase()).copied()
    }

    pub fn client_of(&self, ent_idx: usize) -> Option<&GClient> {
        let client_idx = self.edicts.get(ent_idx)?.client?;
        self.clients.get(client_idx)
    }

    pub fn client_of_mut(&mut self, ent_idx: usize) -> Option<&mut GClient> {
        let client_idx = self.edicts.get(ent_idx)?.client?;
        self.clients.get_mut(client_idx)
    }

    /// Borrow a player's entity and client record together.
    pub fn player_mut(&mut self, ent_idx: usize) -> Option<(&mut Edict, &mut GClient)> {
        let client_idx = self.edicts.get(ent_idx)?.client?;
        let ent = self.edicts.get_mut(ent_idx)?;
        let client = self.clients.get_mut(client_idx)?;
        Some((ent, client))
    }

    /// Count of the named item in a player's inventory, 0 for non-players.
    pub fn inventory_count(&self, ent_idx: usize, pickup_name: &str) -> i32 {
        match (self.client_of(ent_idx), self.find_item(pickup_name)) {
            (Some(cl), Some(item)) => cl.pers.inventory[item],
            _ => 0,
        }
    }

    /// Whether the edict index refers to a live entity.
    pub fn is_live(&self, idx: i32) -> bool {
        idx >= 0 && (idx as usize) < self.edicts.len() && self.edicts[idx as usize].inuse
    }
}
