// test_support.rs — recording engine import shared by the unit tests
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2
//
// The import is installed once per process, so everything it observes goes
// to thread-local logs. Each test runs on its own thread and sees only its
// own traffic.

use std::cell::RefCell;
use std::collections::VecDeque;

use q2hook_common::common::com_error;
use q2hook_common::cvar::cvar_get;
use q2hook_common::qcommon::ERR_DROP;

use crate::g_local::*;
use crate::game_import::{set_gi, GameImport};

#[derive(Debug, Clone, PartialEq)]
pub enum MsgWrite {
    Byte(i32),
    Short(i32),
    Position(Vec3),
    Dir(Vec3),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundEvent {
    pub ent: i32,
    pub channel: i32,
    pub name: String,
    pub volume: f32,
}

#[derive(Debug, Default)]
pub struct Log {
    pub sounds: Vec<SoundEvent>,
    pub writes: Vec<MsgWrite>,
    pub multicasts: Vec<(Vec3, i32)>,
    pub unicasts: Vec<(i32, bool)>,
    pub dprints: Vec<String>,
    pub links: Vec<i32>,
    pub unlinks: Vec<i32>,
}

#[derive(Default)]
struct Script {
    traces: VecDeque<Trace>,
    contents: i32,
    args: Vec<String>,
    names: Vec<String>,
}

thread_local! {
    static LOG: RefCell<Log> = RefCell::new(Log::default());
    static SCRIPT: RefCell<Script> = RefCell::new(Script::default());
}

fn name_index(name: &str) -> i32 {
    SCRIPT.with(|s| {
        let mut s = s.borrow_mut();
        match s.names.iter().position(|n| n == name) {
            Some(i) => i as i32 + 1,
            None => {
                s.names.push(name.to_string());
                s.names.len() as i32
            }
        }
    })
}

fn index_name(index: i32) -> String {
    SCRIPT.with(|s| {
        let s = s.borrow();
        if index <= 0 {
            return String::new();
        }
        s.names.get(index as usize - 1).cloned().unwrap_or_default()
    })
}

pub struct RecordingImport;

impl GameImport for RecordingImport {
    fn dprintf(&self, msg: &str) {
        LOG.with(|l| l.borrow_mut().dprints.push(msg.to_string()));
    }

    fn sound(&self, ent_idx: i32, channel: i32, soundindex: i32, volume: f32, _attenuation: f32, _timeofs: f32) {
        let name = index_name(soundindex);
        LOG.with(|l| {
            l.borrow_mut().sounds.push(SoundEvent { ent: ent_idx, channel, name, volume })
        });
    }

    fn error(&self, msg: &str) {
        com_error(ERR_DROP, msg);
    }

    fn modelindex(&self, name: &str) -> i32 { name_index(name) }
    fn soundindex(&self, name: &str) -> i32 { name_index(name) }
    fn imageindex(&self, name: &str) -> i32 { name_index(name) }

    fn trace(&self, _start: &Vec3, _mins: &Vec3, _maxs: &Vec3, end: &Vec3, _passent: i32, _contentmask: i32) -> Trace {
        SCRIPT.with(|s| s.borrow_mut().traces.pop_front()).unwrap_or(Trace {
            endpos: *end,
            ..Trace::default()
        })
    }
    fn pointcontents(&self, _point: &Vec3) -> i32 {
        SCRIPT.with(|s| s.borrow().contents)
    }

    fn linkentity(&self, ent_idx: i32) {
        LOG.with(|l| l.borrow_mut().links.push(ent_idx));
    }
    fn unlinkentity(&self, ent_idx: i32) {
        LOG.with(|l| l.borrow_mut().unlinks.push(ent_idx));
    }

    fn multicast(&self, origin: &Vec3, to: i32) {
        LOG.with(|l| l.borrow_mut().multicasts.push((*origin, to)));
    }
    fn unicast(&self, ent_idx: i32, reliable: bool) {
        LOG.with(|l| l.borrow_mut().unicasts.push((ent_idx, reliable)));
    }
    fn write_byte(&self, c: i32) {
        LOG.with(|l| l.borrow_mut().writes.push(MsgWrite::Byte(c)));
    }
    fn write_short(&self, c: i32) {
        LOG.with(|l| l.borrow_mut().writes.push(MsgWrite::Short(c)));
    }
    fn write_string(&self, s: &str) {
        LOG.with(|l| l.borrow_mut().writes.push(MsgWrite::Str(s.to_string())));
    }
    fn write_position(&self, pos: &Vec3) {
        LOG.with(|l| l.borrow_mut().writes.push(MsgWrite::Position(*pos)));
    }
    fn write_dir(&self, dir: &Vec3) {
        LOG.with(|l| l.borrow_mut().writes.push(MsgWrite::Dir(*dir)));
    }

    fn cvar(&self, var_name: &str, value: &str, flags: i32) -> f32 {
        cvar_get(var_name, value, flags)
    }

    fn argc(&self) -> i32 {
        SCRIPT.with(|s| s.borrow().args.len() as i32)
    }
    fn argv(&self, n: i32) -> String {
        SCRIPT.with(|s| s.borrow().args.get(n as usize).cloned().unwrap_or_default())
    }
}

/// Install the recording import and clear this thread's logs and scripts.
pub fn install() {
    set_gi(Box::new(RecordingImport));
    LOG.with(|l| *l.borrow_mut() = Log::default());
    SCRIPT.with(|s| *s.borrow_mut() = Script::default());
}

pub fn take_log() -> Log {
    LOG.with(|l| std::mem::take(&mut *l.borrow_mut()))
}

pub fn clear_log() {
    LOG.with(|l| *l.borrow_mut() = Log::default());
}

/// Queue a result for the next `gi_trace` call.
pub fn script_trace(tr: Trace) {
    SCRIPT.with(|s| s.borrow_mut().traces.push_back(tr));
}

pub fn set_contents(contents: i32) {
    SCRIPT.with(|s| s.borrow_mut().contents = contents);
}

pub fn set_args(args: &[&str]) {
    SCRIPT.with(|s| s.borrow_mut().args = args.iter().map(|a| a.to_string()).collect());
}

/// Number of recorded sounds with the given name.
pub fn count_sounds(log: &Log, name: &str) -> usize {
    log.sounds.iter().filter(|s| s.name == name).count()
}

/// The byte following each `svc_temp_entity` marker, in order.
pub fn temp_entities(log: &Log) -> Vec<i32> {
    let mut out = Vec::new();
    let mut it = log.writes.iter().peekable();
    while let Some(w) = it.next() {
        if *w == MsgWrite::Byte(SVC_TEMP_ENTITY) {
            if let Some(MsgWrite::Byte(te)) = it.peek() {
                out.push(*te);
            }
        }
    }
    out
}

pub const PLAYER: usize = 1;

/// A world with one connected, standing player in slot 1 at frame 100.
pub fn make_ctx() -> GameCtx {
    install();
    let mut ctx = GameCtx::with_capacity(32, 2);
    ctx.level.framenum = 100;
    ctx.level.time = 10.0;
    {
        let ent = &mut ctx.edicts[PLAYER];
        ent.inuse = true;
        ent.classname = "player".to_string();
        ent.s.modelindex = 255;
        ent.health = 100;
        ent.max_health = 100;
        ent.viewheight = 22;
        ent.takedamage = DAMAGE_AIM;
        ent.mass = 200;
        ent.movetype = MoveType::Walk;
        ent.solid = Solid::Bbox;
        ent.clipmask = MASK_PLAYERSOLID;
        ent.mins = [-16.0, -16.0, -24.0];
        ent.maxs = [16.0, 16.0, 32.0];
        ent.gravity = 1.0;
        ent.groundentity = 0;
        ent.air_finished = 100 + 12 * BASE_FRAMERATE;
    }
    {
        let cl = &mut ctx.clients[0];
        cl.pers.connected = true;
        cl.pers.health = 100;
        cl.pers.max_health = 100;
        cl.ps.pmove.pm_flags = PMF_ON_GROUND;
        cl.grapple_release_framenum = -1000;
    }
    ctx
}

/// Spawn a plain solid box entity at `origin`.
pub fn spawn_box(ctx: &mut GameCtx, origin: Vec3) -> usize {
    let idx = crate::g_utils::g_spawn(ctx).expect("entity arena full");
    let e = &mut ctx.edicts[idx];
    e.classname = "func_box".to_string();
    e.s.origin = origin;
    e.solid = Solid::Bbox;
    e.mins = [-8.0, -8.0, -8.0];
    e.maxs = [8.0, 8.0, 8.0];
    e.size = [16.0, 16.0, 16.0];
    idx
}
