// cvar.rs — registered configuration variables
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct Cvar {
    pub name: String,
    pub string: String,
    pub value: f32,
    pub flags: i32,
}

/// Table of registered cvars, in registration order.
#[derive(Debug, Default)]
pub struct CvarContext {
    pub vars: Vec<Cvar>,
}

impl CvarContext {
    pub const fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn find(&self, name: &str) -> Option<&Cvar> {
        self.vars.iter().find(|v| v.name == name)
    }

    /// Register `name` with a default, or merge `flags` into an existing
    /// entry. Either way the current value is returned.
    pub fn get(&mut self, name: &str, default: &str, flags: i32) -> f32 {
        if let Some(var) = self.vars.iter_mut().find(|v| v.name == name) {
            var.flags |= flags;
            return var.value;
        }
        let value = default.parse::<f32>().unwrap_or(0.0);
        self.vars.push(Cvar {
            name: name.to_string(),
            string: default.to_string(),
            value,
            flags,
        });
        value
    }

    /// 0 for unknown names.
    pub fn variable_value(&self, name: &str) -> f32 {
        self.find(name).map_or(0.0, |v| v.value)
    }
}

static CVARS: Mutex<CvarContext> = Mutex::new(CvarContext::new());

pub fn cvar_get(name: &str, default: &str, flags: i32) -> f32 {
    CVARS.lock().get(name, default, flags)
}

pub fn cvar_variable_value(name: &str) -> f32 {
    CVARS.lock().variable_value(name)
}
