// gdv.score -- differential decoding of musical commands onto a rational timeline
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The scale a decoder resolves grades against.

use crate::command::GradeRef;

/// Resolves grades to numbers and numbers to pitches.
pub trait Scale {
    /// Numeric grade of a reference, `None` if the scale does not know the symbol.
    fn note_of(&self, grade: &GradeRef) -> Option<i64>;

    /// MIDI pitch of a grade in the given octave, where octave 0 holds the root.
    fn pitch_of(&self, grade: i64, octave: i64) -> i64;
}

/// Semitone offsets of the seven degrees of a major scale.
const MAJOR_STEPS: [i64; 7] = [0, 2, 4, 5, 7, 9, 11];

const ROMAN: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

const FUNCTIONS: [&str; 7] = [
    "tonic",
    "supertonic",
    "mediant",
    "subdominant",
    "dominant",
    "submediant",
    "leading",
];

/// A major scale in twelve tone equal temperament.
///
/// Grades outside `0..7` continue into the neighbouring octaves.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MajorScale {
    /// MIDI pitch of grade 0 in octave 0.
    root: i64,
}

impl MajorScale {
    pub fn new(root: i64) -> Self {
        Self { root }
    }

    pub fn root(&self) -> i64 {
        self.root
    }
}

impl Default for MajorScale {
    /// C major around middle C.
    fn default() -> Self {
        Self::new(60)
    }
}

impl Scale for MajorScale {
    /// ```
    /// # use gdv_score::scale::*;
    /// # use gdv_score::command::GradeRef;
    /// let scale = MajorScale::default();
    /// assert_eq!(scale.note_of(&GradeRef::from("V")), Some(4));
    /// assert_eq!(scale.note_of(&GradeRef::from("subdominant")), Some(3));
    /// assert_eq!(scale.note_of(&GradeRef::Index(9)), Some(9));
    /// assert_eq!(scale.note_of(&GradeRef::from("H")), None);
    /// ```
    fn note_of(&self, grade: &GradeRef) -> Option<i64> {
        match grade {
            GradeRef::Index(index) => Some(*index),
            GradeRef::Symbol(symbol) => ROMAN
                .iter()
                .position(|name| *name == symbol.as_str())
                .or_else(|| FUNCTIONS.iter().position(|name| *name == symbol.as_str()))
                .map(|index| index as i64),
        }
    }

    /// ```
    /// # use gdv_score::scale::*;
    /// let scale = MajorScale::default();
    /// assert_eq!(scale.pitch_of(0, 0), 60);
    /// assert_eq!(scale.pitch_of(4, 0), 67);
    /// assert_eq!(scale.pitch_of(7, 0), 72);
    /// assert_eq!(scale.pitch_of(-1, 0), 59);
    /// assert_eq!(scale.pitch_of(2, -1), 52);
    /// ```
    fn pitch_of(&self, grade: i64, octave: i64) -> i64 {
        let steps = MAJOR_STEPS.len() as i64;
        let octave = octave + grade.div_euclid(steps);
        self.root + 12 * octave + MAJOR_STEPS[grade.rem_euclid(steps) as usize]
    }
}
