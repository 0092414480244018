// gdv.score -- differential decoding of musical commands onto a rational timeline
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Differential decoding of grade, octave, duration and velocity.

use std::fmt;
use std::rc::Rc;

use snafu::Snafu;

use crate::command::{
    self, Command, DurationChange, GradeChange, GradeRef, ModifierCommand, OctaveChange,
    VelocityChange,
};
use crate::decoder::Codec;
use crate::gdv::{Absolute, Event, Gdv, Modifier, Modifiers};
use crate::neuma::{Neuma, Value};
use crate::rational::Rational;
use crate::scale::Scale;

/// Keys a neuma needs at least one of to be a command.
pub const RECOGNIZED_KEYS: [&str; 7] = [
    "grade",
    "octave",
    "duration",
    "velocity",
    "event",
    "comment",
    "modifiers",
];

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum DecodeError {
    #[snafu(display("None of the keys {:?} is a command", keys))]
    UnrecognizedCommandKeys { keys: Vec<String> },
    #[snafu(display("Invalid {} '{}'", key, value))]
    InvalidValue { key: String, value: String },
    #[snafu(display("Grade '{}' is not part of the scale", grade))]
    UnknownGrade { grade: String },
    #[snafu(display("Duration would become {}, but has to be positive", duration))]
    NonPositiveDuration { duration: Rational },
    #[snafu(display("The {} left the representable range", field))]
    Overflow { field: String },
}

/// The GDV codec. Grade symbols are resolved through the scale.
#[derive(Clone)]
pub struct GdvCodec {
    scale: Rc<dyn Scale>,
}

impl GdvCodec {
    pub fn new<S: Scale + 'static>(scale: S) -> Self {
        Self {
            scale: Rc::new(scale),
        }
    }

    pub fn scale(&self) -> &dyn Scale {
        &*self.scale
    }

    fn resolve(&self, grade: &GradeRef) -> Result<i64, DecodeError> {
        self.scale
            .note_of(grade)
            .ok_or_else(|| DecodeError::UnknownGrade {
                grade: match grade {
                    GradeRef::Index(index) => index.to_string(),
                    GradeRef::Symbol(symbol) => symbol.clone(),
                },
            })
    }
}

impl fmt::Debug for GdvCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GdvCodec").finish()
    }
}

fn overflow(field: &str) -> DecodeError {
    DecodeError::Overflow {
        field: field.to_owned(),
    }
}

fn field<T>(
    raw: &Neuma,
    key: &str,
    interpret: fn(&Value) -> Option<T>,
) -> Result<Option<T>, DecodeError> {
    match raw.get(key) {
        None => Ok(None),
        Some(value) => match interpret(value) {
            Some(change) => Ok(Some(change)),
            None => Err(DecodeError::InvalidValue {
                key: key.to_owned(),
                value: value.to_string(),
            }),
        },
    }
}

impl Codec for GdvCodec {
    type Command = Command;
    type State = Gdv;
    type Output = Absolute;
    type Error = DecodeError;

    fn parse(&self, raw: &Neuma) -> Result<Command, DecodeError> {
        if !raw.keys().any(|key| RECOGNIZED_KEYS.contains(&key)) {
            return Err(DecodeError::UnrecognizedCommandKeys {
                keys: raw.keys().map(str::to_owned).collect(),
            });
        }
        let mut command = Command {
            grade: field(raw, "grade", command::grade_change)?,
            octave: field(raw, "octave", command::octave_change)?,
            duration: field(raw, "duration", command::duration_change)?,
            velocity: field(raw, "velocity", command::velocity_change)?,
            event: raw.get("event").cloned(),
            ..Command::default()
        };
        match raw.get("modifiers") {
            None => {}
            Some(Value::Neuma(modifiers)) => {
                for (key, value) in modifiers.iter() {
                    let modifier = match value {
                        Value::Neuma(nested) => ModifierCommand::Nested(Box::new(self.parse(nested)?)),
                        plain => ModifierCommand::Plain(plain.clone()),
                    };
                    command.modifiers.insert(key.to_owned(), modifier);
                }
            }
            Some(other) => {
                return Err(DecodeError::InvalidValue {
                    key: "modifiers".to_owned(),
                    value: other.to_string(),
                })
            }
        }
        Ok(command)
    }

    fn apply(&self, command: &Command, on: &Gdv) -> Result<Absolute, DecodeError> {
        if let Some(payload) = &command.event {
            return Ok(Absolute::Event(Event {
                payload: payload.clone(),
            }));
        }

        let grade = match &command.grade {
            None => on.grade,
            Some(GradeChange::Abs(grade)) => self.resolve(grade)?,
            Some(GradeChange::Delta(delta)) => on.grade.checked_add(*delta)
                .ok_or_else(|| overflow("grade"))?,
        };
        let octave = match command.octave {
            None => on.octave,
            Some(OctaveChange::Abs(octave)) => octave,
            Some(OctaveChange::Delta(delta)) => on.octave.checked_add(delta)
                .ok_or_else(|| overflow("octave"))?,
        };
        let duration = match command.duration {
            None => Some(on.duration),
            Some(DurationChange::Abs(duration)) => Some(duration),
            Some(DurationChange::Delta(delta)) => on.duration.checked_add(delta),
            Some(DurationChange::Factor(factor)) => on.duration.checked_mul(factor),
        }
        .ok_or_else(|| overflow("duration"))?;
        if !duration.is_positive() {
            return Err(DecodeError::NonPositiveDuration { duration });
        }
        let velocity = match command.velocity {
            None => on.velocity,
            Some(VelocityChange::Abs(level)) => level,
            Some(VelocityChange::Delta(delta)) => on.velocity.checked_add(delta)
                .ok_or_else(|| overflow("velocity"))?,
        };

        let mut modifiers = Modifiers::new();
        for (key, modifier) in command.modifiers.iter() {
            let resolved = match modifier {
                ModifierCommand::Plain(value) => Modifier::Plain(value.clone()),
                // ornaments start from the same state as the note they decorate
                ModifierCommand::Nested(nested) => Modifier::Nested(Box::new(self.apply(nested, on)?)),
            };
            modifiers.insert(key.clone(), resolved);
        }

        Ok(Absolute::Note(Gdv {
            grade,
            octave,
            duration,
            velocity,
            modifiers,
        }))
    }

    /// Notes become the next baseline without their modifiers, events are forgotten.
    fn persist(&self, output: &Absolute) -> Option<Gdv> {
        output.note().map(|gdv| Gdv {
            modifiers: Modifiers::new(),
            ..gdv.clone()
        })
    }
}
