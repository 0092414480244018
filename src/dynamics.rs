// gdv.score -- differential decoding of musical commands onto a rational timeline
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Dynamics: velocity levels and their textual and MIDI forms.
//!
//! A level is a small signed integer where `0` is *mezzo* (`mp` and `mf`
//! are aliases), each `f` adds one and each `p` subtracts one.

use crate::command::VelocityChange;

/// MIDI note-on velocities for the levels `pppp` (-4) up to `fff` (3).
pub const MIDI_VELOCITIES: [u8; 8] = [16, 32, 48, 64, 80, 96, 112, 127];

/// Level that maps to the first entry of [`MIDI_VELOCITIES`].
const LOWEST_LEVEL: i64 = -4;

/// Level of a dynamic mark such as `pp` or `mf`.
///
/// ```
/// # use gdv_score::dynamics::*;
/// assert_eq!(level_of("ppp"), Some(-3));
/// assert_eq!(level_of("mp"), level_of("mf"));
/// assert_eq!(level_of("ff"), Some(2));
/// assert_eq!(level_of("fp"), None);
/// ```
pub fn level_of(mark: &str) -> Option<i64> {
    match mark {
        "mp" | "mf" => Some(0),
        _ => run_length(mark),
    }
}

/// The canonical mark of a level, `None` for levels without a mark.
pub fn mark_of(level: i64) -> Option<&'static str> {
    const MARKS: [&str; 8] = ["pppp", "ppp", "pp", "p", "mf", "f", "ff", "fff"];
    let index = level - LOWEST_LEVEL;
    if index < 0 {
        return None;
    }
    MARKS.get(index as usize).copied()
}

/// Signed length of a run of only `f` (positive) or only `p` (negative).
fn run_length(run: &str) -> Option<i64> {
    let first = run.chars().next()?;
    let sign = match first {
        'f' => 1,
        'p' => -1,
        _ => return None,
    };
    if run.chars().all(|ch| ch == first) {
        Some(sign * run.chars().count() as i64)
    } else {
        None
    }
}

/// Textual velocity change.
///
/// A leading sign marks a delta, either numeric (`+1`) or as a run of marks
/// pointing the same way (`+ff`, `-p`). Without a sign the text is an
/// absolute mark or level.
///
/// ```
/// # use gdv_score::dynamics::*;
/// # use gdv_score::command::VelocityChange;
/// assert_eq!(velocity_change("+f"), Some(VelocityChange::Delta(1)));
/// assert_eq!(velocity_change("-pp"), Some(VelocityChange::Delta(-2)));
/// assert_eq!(velocity_change("+2"), Some(VelocityChange::Delta(2)));
/// assert_eq!(velocity_change("mf"), Some(VelocityChange::Abs(0)));
/// assert_eq!(velocity_change("-1"), Some(VelocityChange::Delta(-1)));
/// assert_eq!(velocity_change("+p"), None);
/// ```
pub fn velocity_change(text: &str) -> Option<VelocityChange> {
    let mut chars = text.chars();
    match chars.next()? {
        sign @ '+' | sign @ '-' => {
            let rest = chars.as_str();
            if rest.starts_with(is_sign) {
                return None;
            }
            if let Ok(magnitude) = rest.parse::<i64>() {
                return Some(VelocityChange::Delta(if sign == '+' { magnitude } else { -magnitude }));
            }
            let delta = run_length(rest)?;
            // the sign has to agree with the direction of the marks
            if (delta > 0) == (sign == '+') {
                Some(VelocityChange::Delta(delta))
            } else {
                None
            }
        }
        _ => level_of(text)
            .or_else(|| text.parse().ok())
            .map(VelocityChange::Abs),
    }
}

pub(crate) fn is_sign(ch: char) -> bool {
    ch == '+' || ch == '-'
}

/// MIDI note-on velocity of a level, clamped to the table.
///
/// ```
/// # use gdv_score::dynamics::*;
/// assert_eq!(midi_velocity(0), 80);
/// assert_eq!(midi_velocity(1), 96);
/// assert_eq!(midi_velocity(-9), 16);
/// assert_eq!(midi_velocity(9), 127);
/// ```
pub fn midi_velocity(level: i64) -> u8 {
    let last = MIDI_VELOCITIES.len() as i64 - 1;
    MIDI_VELOCITIES[(level - LOWEST_LEVEL).max(0).min(last) as usize]
}
