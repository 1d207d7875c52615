// common.rs — error reporting and random helpers
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2

use crate::qcommon::{ERR_DROP, ERR_FATAL};

// ============================================================
// Com_Error
// ============================================================

/// Engine error handler.
/// - `ERR_FATAL`: prints to stderr and panics.
/// - `ERR_DROP`: prints the error and returns to the caller.
/// - anything else: clean exit.
pub fn com_error(code: i32, msg: &str) {
    if code == ERR_FATAL {
        eprintln!("Error: {}", msg);
        panic!("Fatal error: {}", msg);
    } else if code == ERR_DROP {
        eprintln!("********************\nERROR: {}\n********************", msg);
    } else {
        println!("{}", msg);
        std::process::exit(0);
    }
}

// ============================================================
// Random numbers
// ============================================================

/// Random integer in [0, 32767], the classic `rand() & 0x7fff`.
/// Used to pick sound and animation variants.
pub fn rand_i32() -> i32 {
    (rand::random::<u32>() & 0x7fff) as i32
}
