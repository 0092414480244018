// gdv.score -- differential decoding of musical commands onto a rational timeline
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Absolute musical states: grade, duration and velocity (GDV), or an event.

use std::collections::BTreeMap;
use std::fmt;

use crate::dynamics;
use crate::neuma::Value;
use crate::query::{Attr, Attributed};
use crate::rational::Rational;
use crate::scale::Scale;
use crate::score::Dataset;

pub type Modifiers = BTreeMap<String, Modifier>;

/// A modifier of a decoded state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    Plain(Value),
    /// A nested command (ornament) resolved to its own absolute state.
    Nested(Box<Absolute>),
}

/// An absolute pitched state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gdv {
    pub grade: i64,
    pub octave: i64,
    /// Always positive.
    pub duration: Rational,
    /// Dynamics level, see [`crate::dynamics`].
    pub velocity: i64,
    pub modifiers: Modifiers,
}

impl Gdv {
    /// Root grade, middle octave, a quarter at *mezzo forte*.
    pub fn base() -> Gdv {
        Gdv {
            grade: 0,
            octave: 0,
            duration: Rational::new(1, 4),
            velocity: 0,
            modifiers: Modifiers::new(),
        }
    }
}

impl Default for Gdv {
    fn default() -> Self {
        Self::base()
    }
}

/// A state that only carries an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub payload: Value,
}

/// The result of decoding one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Absolute {
    Note(Gdv),
    Event(Event),
}

/// What a state turns into on a MIDI output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiOrEvent {
    NoteOn {
        pitch: u8,
        velocity: u8,
        duration: Rational,
    },
    Event(Value),
}

impl Absolute {
    pub fn is_event(&self) -> bool {
        matches!(self, Absolute::Event(_))
    }

    pub fn note(&self) -> Option<&Gdv> {
        match self {
            Absolute::Note(gdv) => Some(gdv),
            Absolute::Event(_) => None,
        }
    }

    /// Events take no time.
    pub fn duration(&self) -> Rational {
        match self {
            Absolute::Note(gdv) => gdv.duration,
            Absolute::Event(_) => Rational::ZERO,
        }
    }

    /// Project the state onto a MIDI note-on, pitches and velocities clamped to the MIDI range.
    ///
    /// ```
    /// # use gdv_score::gdv::*;
    /// # use gdv_score::scale::MajorScale;
    /// # use gdv_score::Rational;
    /// let mut gdv = Gdv::base();
    /// gdv.grade = 4;
    /// gdv.velocity = 1;
    /// assert_eq!(
    ///     Absolute::Note(gdv).to_midi_note_on_or_event(&MajorScale::default()),
    ///     MidiOrEvent::NoteOn { pitch: 67, velocity: 96, duration: Rational::new(1, 4) },
    /// );
    /// ```
    pub fn to_midi_note_on_or_event(&self, scale: &dyn Scale) -> MidiOrEvent {
        match self {
            Absolute::Note(gdv) => MidiOrEvent::NoteOn {
                pitch: scale.pitch_of(gdv.grade, gdv.octave).max(0).min(127) as u8,
                velocity: dynamics::midi_velocity(gdv.velocity),
                duration: gdv.duration,
            },
            Absolute::Event(event) => MidiOrEvent::Event(event.payload.clone()),
        }
    }
}

impl Attributed for Absolute {
    fn attribute(&self, name: &str) -> Option<Attr> {
        match (self, name) {
            (_, "duration") => Some(Attr::Time(self.duration())),
            (Absolute::Note(gdv), "grade") => Some(Attr::Int(gdv.grade)),
            (Absolute::Note(gdv), "octave") => Some(Attr::Int(gdv.octave)),
            (Absolute::Note(gdv), "velocity") => Some(Attr::Int(gdv.velocity)),
            (Absolute::Event(event), "event") => Some(Attr::Text(event.payload.to_string())),
            _ => None,
        }
    }
}

impl Dataset for Absolute {
    fn duration(&self) -> Option<Rational> {
        Some(Absolute::duration(self))
    }

    fn attribute(&self, name: &str) -> Option<Attr> {
        Attributed::attribute(self, name)
    }

    fn as_abs(&self) -> Option<&Absolute> {
        Some(self)
    }
}

impl fmt::Display for Absolute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Absolute::Note(gdv) => {
                write!(
                    f,
                    "grade:{} octave:{} duration:{} velocity:{}",
                    gdv.grade, gdv.octave, gdv.duration, gdv.velocity
                )?;
                for (key, modifier) in gdv.modifiers.iter() {
                    match modifier {
                        Modifier::Plain(value) => write!(f, " {}:{}", key, value)?,
                        Modifier::Nested(state) => write!(f, " {}:({})", key, state)?,
                    }
                }
                Ok(())
            }
            Absolute::Event(event) => write!(f, "event:{}", event.payload),
        }
    }
}
