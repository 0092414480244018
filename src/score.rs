// gdv.score -- differential decoding of musical commands onto a rational timeline
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! A sparse score, indexed by exact rational time.
//!
//! Every time slot holds its entries in insertion order. Next to the slots,
//! an interval index keeps one `[start, finish]` record per inserted entry
//! to answer overlap queries.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use log::trace;
use snafu::Snafu;

use crate::gdv::Absolute;
use crate::query::{Attr, Attributed, Query};
use crate::rational::Rational;

/// The capabilities an entry of a score may have.
///
/// Only values with a duration can be placed on a score. For playback an
/// entry has to be either an absolute state or a nested score.
pub trait Dataset: fmt::Debug + fmt::Display {
    fn duration(&self) -> Option<Rational>;

    fn attribute(&self, _name: &str) -> Option<Attr> {
        None
    }

    fn as_abs(&self) -> Option<&Absolute> {
        None
    }

    fn as_score(&self) -> Option<&Score> {
        None
    }
}

/// A shared entry of a score.
pub type Entry = Rc<dyn Dataset>;

/// The entries at one point in time.
pub type Slot = Query<Entry>;

impl Attributed for Entry {
    fn attribute(&self, name: &str) -> Option<Attr> {
        Dataset::attribute(&**self, name)
    }
}

#[derive(Debug, Snafu)]
pub enum ScoreError {
    #[snafu(display("{} has no duration and cannot be placed on a score", dataset))]
    NotADataset { dataset: String },
}

/// One record of the interval index.
#[derive(Debug, Clone)]
pub struct Interval {
    pub start: Rational,
    /// Last addressable instant covered by the entry, never before `start`.
    pub finish: Rational,
    pub dataset: Entry,
    /// Position in the index, identifies the record.
    id: usize,
}

impl Interval {
    pub fn id(&self) -> usize {
        self.id
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.start == other.start
            && Rc::ptr_eq(&self.dataset, &other.dataset)
    }
}

impl Attributed for Interval {
    fn attribute(&self, name: &str) -> Option<Attr> {
        match name {
            "start" => Some(Attr::Time(self.start)),
            "finish" => Some(Attr::Time(self.finish)),
            _ => self.dataset.attribute(name),
        }
    }
}

#[derive(Debug)]
pub struct Score {
    /// Smallest addressable time unit.
    resolution: Rational,
    slots: BTreeMap<Rational, Slot>,
    index: Vec<Interval>,
}

impl Score {
    pub fn new(resolution: impl Into<Rational>) -> Self {
        Score {
            resolution: resolution.into(),
            slots: BTreeMap::new(),
            index: Vec::new(),
        }
    }

    pub fn resolution(&self) -> Rational {
        self.resolution
    }

    /// Place a dataset at the given time, after anything already there.
    pub fn at<D: Dataset + 'static>(
        &mut self,
        time: impl Into<Rational>,
        dataset: D,
    ) -> Result<(), ScoreError> {
        self.at_shared(time, Rc::new(dataset))
    }

    /// Like [`Score::at`], for entries that are shared with other scores.
    pub fn at_shared(&mut self, time: impl Into<Rational>, dataset: Entry) -> Result<(), ScoreError> {
        let time = time.into();
        let duration = match dataset.duration() {
            Some(duration) => duration,
            None => {
                return Err(ScoreError::NotADataset {
                    dataset: dataset.to_string(),
                })
            }
        };
        // entries shorter than the resolution still occupy one unit
        let finish = time + std::cmp::max(duration, self.resolution) - self.resolution;
        trace!("at {} (until {}): {}", time, finish, dataset);

        self.slot(time).push(Rc::clone(&dataset));
        let id = self.index.len();
        self.index.push(Interval {
            start: time,
            finish,
            dataset,
            id,
        });
        Ok(())
    }

    /// The slot at the given time, created empty if there is none yet.
    ///
    /// Entries pushed here directly do not show up in the interval index.
    pub fn slot(&mut self, time: impl Into<Rational>) -> &mut Slot {
        self.slots.entry(time.into()).or_default()
    }

    pub fn get(&self, time: impl Into<Rational>) -> Option<&Slot> {
        self.slots.get(&time.into())
    }

    /// All populated times, ascending.
    pub fn times(&self) -> Vec<Rational> {
        self.slots.keys().copied().collect()
    }

    /// Slots in ascending time order.
    pub fn iter(&self) -> impl Iterator<Item = (Rational, &Slot)> {
        self.slots.iter().map(|(time, slot)| (*time, slot))
    }

    /// Every indexed entry overlapping `[closed_start, open_finish)`, ordered by start.
    ///
    /// An entry whose finish is exactly `closed_start` counts as overlapping,
    /// which makes adjacent notes show up in each other's queries.
    pub fn between(
        &self,
        closed_start: impl Into<Rational>,
        open_finish: impl Into<Rational>,
    ) -> Query<Interval> {
        let (closed_start, open_finish) = (closed_start.into(), open_finish.into());
        let mut found: Vec<Interval> = self
            .index
            .iter()
            .filter(|e| {
                (e.start <= closed_start && e.finish >= closed_start)
                    || (e.start < open_finish && e.finish >= open_finish)
                    || (e.start >= closed_start && e.finish < open_finish)
            })
            .cloned()
            .collect();
        found.sort_by_key(|e| e.start);
        found.into()
    }

    /// The latest finish of all indexed entries.
    pub fn finish(&self) -> Option<Rational> {
        self.index.iter().map(|e| e.finish).max()
    }

    /// How long the score lasts when played from its origin, i.e. the time
    /// from the origin to the last instant any indexed entry covers.
    ///
    /// This is what the score occupies when it is nested into another one.
    pub fn extent(&self) -> Rational {
        self.finish().unwrap_or(Rational::ZERO)
    }

    /// Length of the time span covered by the indexed entries.
    pub fn duration(&self) -> Rational {
        let start = self.index.iter().map(|e| e.start).min();
        match (start, self.finish()) {
            (Some(start), Some(finish)) => finish + self.resolution - start,
            _ => Rational::ZERO,
        }
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn dump(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        for (time, slot) in self.iter() {
            for entry in slot.iter() {
                match entry.as_score() {
                    Some(nested) => {
                        writeln!(f, "{:indent$}{}: score({})", "", time, nested.resolution, indent = indent)?;
                        nested.dump(f, indent + 2)?;
                    }
                    None => writeln!(f, "{:indent$}{}: {}", "", time, entry, indent = indent)?,
                }
            }
        }
        Ok(())
    }
}

impl Dataset for Score {
    fn duration(&self) -> Option<Rational> {
        Some(self.extent())
    }

    fn attribute(&self, name: &str) -> Option<Attr> {
        match name {
            "duration" => Some(Attr::Time(self.extent())),
            "resolution" => Some(Attr::Time(self.resolution)),
            _ => None,
        }
    }

    fn as_score(&self) -> Option<&Score> {
        Some(self)
    }
}

/// One line per entry, nested scores indented below their start time.
impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(f, 0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gdv::{Event, Gdv};
    use crate::neuma::Value;
    use expect_test::expect;

    fn note(grade: i64, duration: Rational) -> Absolute {
        Absolute::Note(Gdv {
            grade,
            duration,
            ..Gdv::base()
        })
    }

    /// Has a name but no duration.
    #[derive(Debug)]
    struct Marker;

    impl fmt::Display for Marker {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "marker")
        }
    }

    impl Dataset for Marker {
        fn duration(&self) -> Option<Rational> {
            None
        }
    }

    #[test]
    fn times_are_sorted_and_unique() {
        let mut score = Score::new(Rational::new(1, 96));
        let quarter = Rational::new(1, 4);
        score.at(2, note(0, quarter)).unwrap();
        score.at(Rational::new(1, 2), note(1, quarter)).unwrap();
        score.at(1, note(2, quarter)).unwrap();
        score.at(Rational::new(2, 4), note(3, quarter)).unwrap();
        assert_eq!(
            score.times(),
            vec![Rational::new(1, 2), Rational::int(1), Rational::int(2)]
        );
        let grades: Vec<_> = score
            .get(Rational::new(1, 2))
            .unwrap()
            .iter()
            .map(|e| e.attribute("grade"))
            .collect();
        assert_eq!(grades, vec![Some(Attr::Int(1)), Some(Attr::Int(3))]);
        assert_eq!(score.len(), 4);
    }

    #[test]
    fn slot_is_stable_across_insertions() {
        let mut score = Score::new(1);
        let first: Entry = Rc::new(note(0, Rational::ONE));
        score.slot(1).push(Rc::clone(&first));
        score.at(3, note(1, Rational::ONE)).unwrap();
        score.at(Rational::new(1, 2), note(2, Rational::ONE)).unwrap();
        score.slot(1).push(Rc::new(note(3, Rational::ONE)));

        let slot = score.slot(1);
        assert_eq!(slot.len(), 2);
        assert!(Rc::ptr_eq(&slot[0], &first));
        // pushed directly, so not indexed
        assert_eq!(score.len(), 2);
    }

    #[test]
    fn each_follows_time_not_insertion() {
        let mut score = Score::new(1);
        score.at(5, note(5, Rational::ONE)).unwrap();
        score.at(3, note(3, Rational::ONE)).unwrap();
        let grades: Vec<_> = score
            .iter()
            .map(|(time, slot)| (time, slot[0].attribute("grade")))
            .collect();
        assert_eq!(
            grades,
            vec![
                (Rational::int(3), Some(Attr::Int(3))),
                (Rational::int(5), Some(Attr::Int(5)))
            ]
        );
    }

    #[test]
    fn rejects_entries_without_duration() {
        let mut score = Score::new(1);
        match score.at(1, Marker) {
            Err(ScoreError::NotADataset { dataset }) => assert_eq!(dataset, "marker"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(score.is_empty());
        assert!(score.times().is_empty());
    }

    #[test]
    fn between_includes_touching_entries() {
        let mut score = Score::new(0);
        score.at(0, note(0, Rational::int(2))).unwrap();
        score.at(2, note(1, Rational::int(2))).unwrap();
        score.at(5, note(2, Rational::int(1))).unwrap();

        let found = score.between(1, 3);
        let starts: Vec<_> = found.iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![Rational::ZERO, Rational::int(2)]);
        assert_eq!(found[0].finish, Rational::int(2));
        assert_eq!(found[1].finish, Rational::int(4));

        // A finishes exactly where the window starts
        let touching = score.between(2, 3);
        assert_eq!(touching.len(), 2);
        assert_eq!(touching[0].id(), 0);

        assert!(score.between(Rational::new(9, 2), 5).is_empty());
        assert_eq!(score.between(0, 10).len(), 3);
    }

    #[test]
    fn between_results_are_queryable() {
        let mut score = Score::new(0);
        score.at(0, note(4, Rational::int(2))).unwrap();
        score.at(1, note(0, Rational::int(2))).unwrap();
        score.at(1, note(4, Rational::int(1))).unwrap();

        let found = score.between(0, 4);
        let by_grade = found.group_by_attribute("grade");
        assert_eq!(by_grade[&Attr::Int(4)].len(), 2);
        let sorted = found.sort_by_attribute("finish");
        let finishes: Vec<_> = sorted.iter().map(|e| e.finish).collect();
        assert_eq!(
            finishes,
            vec![Rational::int(2), Rational::int(2), Rational::int(3)]
        );
    }

    #[test]
    fn zero_duration_is_a_point() {
        let mut score = Score::new(Rational::new(1, 16));
        score
            .at(
                1,
                Absolute::Event(Event {
                    payload: Value::from("cue"),
                }),
            )
            .unwrap();
        assert_eq!(score.finish(), Some(Rational::int(1)));
        assert_eq!(score.duration(), Rational::new(1, 16));
        assert_eq!(score.between(1, Rational::new(17, 16)).len(), 1);
    }

    #[test]
    fn finish_and_duration() {
        let mut score = Score::new(1);
        assert_eq!(score.finish(), None);
        assert_eq!(score.duration(), Rational::ZERO);
        score.at(1, note(0, Rational::int(2))).unwrap();
        score.at(2, note(0, Rational::int(4))).unwrap();
        assert_eq!(score.finish(), Some(Rational::int(5)));
        assert_eq!(score.duration(), Rational::int(5));
    }

    #[test]
    fn nested_scores_last_from_their_origin() {
        // starts with two units of silence
        let mut inner = Score::new(1);
        inner.at(3, note(0, Rational::ONE)).unwrap();
        assert_eq!(inner.duration(), Rational::ONE);
        assert_eq!(inner.extent(), Rational::int(3));

        let mut outer = Score::new(1);
        outer.at(1, inner).unwrap();
        // the nested note sounds at outer time 3
        let found = outer.between(2, 3);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start, Rational::ONE);
        assert_eq!(found[0].finish, Rational::int(3));
        assert_eq!(found[0].attribute("duration"), Some(Attr::Time(Rational::int(3))));
        assert!(outer.between(4, 5).is_empty());
    }

    #[test]
    fn dump_nested() {
        let mut inner = Score::new(1);
        inner.at(1, note(2, Rational::new(1, 4))).unwrap();
        let mut outer = Score::new(1);
        outer.at(1, note(0, Rational::ONE)).unwrap();
        outer.at(2, inner).unwrap();
        outer
            .at(
                2,
                Absolute::Event(Event {
                    payload: Value::from("fermata"),
                }),
            )
            .unwrap();
        expect![[r#"
            1: grade:0 octave:0 duration:1 velocity:0
            2: score(1)
              1: grade:2 octave:0 duration:1/4 velocity:0
            2: event:fermata
        "#]]
        .assert_eq(&outer.to_string());
    }
}
