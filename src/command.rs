// gdv.score -- differential decoding of musical commands onto a rational timeline
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Structured differential commands.
//!
//! Each accumulated field carries at most one change, which is either an
//! absolute replacement, a delta or (for durations) a factor. A missing
//! change leaves the field as it is.

use std::collections::BTreeMap;

use crate::dynamics;
use crate::neuma::Value;
use crate::rational::Rational;

/// Reference to a scale grade, either numeric or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradeRef {
    Index(i64),
    Symbol(String),
}

impl From<i64> for GradeRef {
    fn from(index: i64) -> Self {
        GradeRef::Index(index)
    }
}

impl From<&str> for GradeRef {
    fn from(symbol: &str) -> Self {
        GradeRef::Symbol(symbol.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradeChange {
    Abs(GradeRef),
    Delta(i64),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OctaveChange {
    Abs(i64),
    Delta(i64),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DurationChange {
    Abs(Rational),
    Delta(Rational),
    Factor(Rational),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VelocityChange {
    Abs(i64),
    Delta(i64),
}

/// A modifier is either passed through as is, or is a command of its own
/// (e.g. an appoggiatura) that gets resolved to an absolute state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifierCommand {
    Plain(Value),
    Nested(Box<Command>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub grade: Option<GradeChange>,
    pub octave: Option<OctaveChange>,
    pub duration: Option<DurationChange>,
    pub velocity: Option<VelocityChange>,
    /// Opaque payload, bypasses accumulation entirely.
    pub event: Option<Value>,
    pub modifiers: BTreeMap<String, ModifierCommand>,
}

impl Command {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abs_grade(mut self, grade: impl Into<GradeRef>) -> Self {
        self.grade = Some(GradeChange::Abs(grade.into()));
        self
    }

    pub fn delta_grade(mut self, delta: i64) -> Self {
        self.grade = Some(GradeChange::Delta(delta));
        self
    }

    pub fn abs_octave(mut self, octave: i64) -> Self {
        self.octave = Some(OctaveChange::Abs(octave));
        self
    }

    pub fn delta_octave(mut self, delta: i64) -> Self {
        self.octave = Some(OctaveChange::Delta(delta));
        self
    }

    pub fn abs_duration(mut self, duration: impl Into<Rational>) -> Self {
        self.duration = Some(DurationChange::Abs(duration.into()));
        self
    }

    pub fn delta_duration(mut self, delta: impl Into<Rational>) -> Self {
        self.duration = Some(DurationChange::Delta(delta.into()));
        self
    }

    pub fn factor_duration(mut self, factor: impl Into<Rational>) -> Self {
        self.duration = Some(DurationChange::Factor(factor.into()));
        self
    }

    pub fn abs_velocity(mut self, level: i64) -> Self {
        self.velocity = Some(VelocityChange::Abs(level));
        self
    }

    pub fn delta_velocity(mut self, delta: i64) -> Self {
        self.velocity = Some(VelocityChange::Delta(delta));
        self
    }

    pub fn event(mut self, payload: impl Into<Value>) -> Self {
        self.event = Some(payload.into());
        self
    }

    pub fn modifier(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.modifiers
            .insert(key.to_owned(), ModifierCommand::Plain(value.into()));
        self
    }

    pub fn nested(mut self, key: &str, command: Command) -> Self {
        self.modifiers
            .insert(key.to_owned(), ModifierCommand::Nested(Box::new(command)));
        self
    }

    /// Whether applying the command leaves a state unchanged.
    pub fn is_empty(&self) -> bool {
        *self == Command::default()
    }
}

/// Signed integers with an explicit sign are deltas.
fn signed_int(text: &str) -> Option<i64> {
    if text.starts_with('+') || text.starts_with('-') {
        text.parse().ok()
    } else {
        None
    }
}

/// Interpret a raw grade: `+n`/`-n` are deltas, plain integers and names are absolute.
///
/// ```
/// # use gdv_score::command::*;
/// # use gdv_score::neuma::Value;
/// assert_eq!(grade_change(&Value::from("-2")), Some(GradeChange::Delta(-2)));
/// assert_eq!(grade_change(&Value::from("4")), Some(GradeChange::Abs(GradeRef::Index(4))));
/// assert_eq!(grade_change(&Value::from("V")), Some(GradeChange::Abs(GradeRef::from("V"))));
/// ```
pub fn grade_change(value: &Value) -> Option<GradeChange> {
    match value {
        Value::Int(index) => Some(GradeChange::Abs(GradeRef::Index(*index))),
        Value::Text(text) => {
            if let Some(delta) = signed_int(text) {
                Some(GradeChange::Delta(delta))
            } else if let Ok(index) = text.parse() {
                Some(GradeChange::Abs(GradeRef::Index(index)))
            } else if !text.is_empty() && text.chars().all(|ch| ch.is_alphanumeric() || ch == '_') {
                Some(GradeChange::Abs(GradeRef::Symbol(text.clone())))
            } else {
                None
            }
        }
        _ => None,
    }
}

pub fn octave_change(value: &Value) -> Option<OctaveChange> {
    match value {
        Value::Int(octave) => Some(OctaveChange::Abs(*octave)),
        Value::Text(text) => match signed_int(text) {
            Some(delta) => Some(OctaveChange::Delta(delta)),
            None => text.parse().ok().map(OctaveChange::Abs),
        },
        _ => None,
    }
}

/// Interpret a raw duration: `r` is absolute, `+r`/`-r` a delta, `*r` and `/r` factors.
///
/// ```
/// # use gdv_score::command::*;
/// # use gdv_score::neuma::Value;
/// # use gdv_score::Rational;
/// assert_eq!(duration_change(&Value::from("3/8")), Some(DurationChange::Abs(Rational::new(3, 8))));
/// assert_eq!(duration_change(&Value::from("-1/8")), Some(DurationChange::Delta(Rational::new(-1, 8))));
/// assert_eq!(duration_change(&Value::from("/3")), Some(DurationChange::Factor(Rational::new(1, 3))));
/// assert_eq!(duration_change(&Value::from("/0")), None);
/// ```
pub fn duration_change(value: &Value) -> Option<DurationChange> {
    match value {
        Value::Int(int) => Some(DurationChange::Abs(Rational::int(*int))),
        Value::Time(time) => Some(DurationChange::Abs(*time)),
        Value::Text(text) => {
            let first = text.chars().next()?;
            let rest = || {
                let rest = &text[first.len_utf8()..];
                if rest.starts_with(dynamics::is_sign) {
                    None
                } else {
                    rest.parse::<Rational>().ok()
                }
            };
            match first {
                '+' => rest().map(DurationChange::Delta),
                '-' => rest().map(|r| DurationChange::Delta(-r)),
                '*' => rest().map(DurationChange::Factor),
                '/' => rest()
                    .filter(|r| !r.is_zero())
                    .map(|r| DurationChange::Factor(r.recip())),
                _ => text.parse().ok().map(DurationChange::Abs),
            }
        }
        Value::Neuma(_) => None,
    }
}

pub fn velocity_change(value: &Value) -> Option<VelocityChange> {
    match value {
        Value::Int(level) => Some(VelocityChange::Abs(*level)),
        Value::Text(text) => dynamics::velocity_change(text),
        _ => None,
    }
}
