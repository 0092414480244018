// gdv.score -- differential decoding of musical commands onto a rational timeline
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Project a score onto a sequencer.
//!
//! [`play`] schedules every slot at an absolute time, [`render`] waits
//! relative to the sequencer's cursor instead. Both recurse into nested
//! scores and hand every absolute state to a caller supplied block, keeping
//! the insertion order of entries within a slot.

use std::rc::Rc;

use log::{debug, trace};
use snafu::Snafu;

use crate::gdv::Absolute;
use crate::rational::Rational;
use crate::score::{Entry, Score};
use crate::sequencer::Sequencer;

#[derive(Debug, Snafu)]
pub enum PlayError {
    #[snafu(display(
        "{} at {} is neither a nested score nor an absolute state",
        dataset,
        time
    ))]
    NotPlayable { time: Rational, dataset: String },
}

/// Where playing starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayAt {
    /// `0` when playing relative to the sequencer position, `1` otherwise.
    Default,
    Once(Rational),
    /// Play the whole score once for every start.
    Each(Vec<Rational>),
}

impl PlayAt {
    fn starts(&self, relative: bool) -> Vec<Rational> {
        match self {
            PlayAt::Default if relative => vec![Rational::ZERO],
            PlayAt::Default => vec![Rational::ONE],
            PlayAt::Once(start) => vec![*start],
            PlayAt::Each(starts) => starts.clone(),
        }
    }
}

impl From<Rational> for PlayAt {
    fn from(start: Rational) -> Self {
        PlayAt::Once(start)
    }
}

impl From<Vec<Rational>> for PlayAt {
    fn from(starts: Vec<Rational>) -> Self {
        PlayAt::Each(starts)
    }
}

type Block = Rc<dyn Fn(&mut dyn Sequencer, &Absolute)>;

/// Schedule every entry of the score at `start + time - resolution`.
///
/// With `relative`, starts count from the sequencer's current position.
/// Nested scores are played relative to the moment their slot comes up.
/// Nothing is scheduled if any entry in the tree is not playable.
pub fn play<F>(
    score: &Score,
    on: &mut dyn Sequencer,
    at: PlayAt,
    relative: bool,
    block: F,
) -> Result<(), PlayError>
where
    F: Fn(&mut dyn Sequencer, &Absolute) + 'static,
{
    check_playable(score)?;
    let block: Block = Rc::new(block);
    schedule_play(score, on, &at.starts(relative), relative, &block);
    Ok(())
}

/// Schedule every slot `time - resolution` after the sequencer's current position.
pub fn render<F>(score: &Score, on: &mut dyn Sequencer, block: F) -> Result<(), PlayError>
where
    F: Fn(&mut dyn Sequencer, &Absolute) + 'static,
{
    check_playable(score)?;
    let block: Block = Rc::new(block);
    schedule_render(score, on, &block);
    Ok(())
}

fn check_playable(score: &Score) -> Result<(), PlayError> {
    for (time, slot) in score.iter() {
        for entry in slot.iter() {
            if let Some(nested) = entry.as_score() {
                check_playable(nested)?;
            } else if entry.as_abs().is_none() {
                return Err(PlayError::NotPlayable {
                    time,
                    dataset: entry.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn schedule_play(
    score: &Score,
    on: &mut dyn Sequencer,
    starts: &[Rational],
    relative: bool,
    block: &Block,
) {
    let origin = if relative {
        on.position()
    } else {
        Rational::ZERO
    };
    for start in starts {
        let effective_start = origin + *start;
        debug!("playing {} entries from {}", score.len(), effective_start);
        for (time, slot) in score.iter() {
            let entries: Vec<Entry> = slot.to_vec();
            let block = Rc::clone(block);
            on.at(
                effective_start + time - score.resolution(),
                Box::new(move |on: &mut dyn Sequencer| {
                    for entry in entries.iter() {
                        match entry.as_score() {
                            Some(nested) => {
                                schedule_play(nested, on, &[Rational::ZERO], true, &block)
                            }
                            None => emit(entry, on, &block),
                        }
                    }
                }),
            );
        }
    }
}

fn schedule_render(score: &Score, on: &mut dyn Sequencer, block: &Block) {
    debug!("rendering {} entries from {}", score.len(), on.position());
    for (time, slot) in score.iter() {
        let entries: Vec<Entry> = slot.to_vec();
        let block = Rc::clone(block);
        on.wait(
            time - score.resolution(),
            Box::new(move |on: &mut dyn Sequencer| {
                for entry in entries.iter() {
                    match entry.as_score() {
                        Some(nested) => schedule_render(nested, on, &block),
                        None => emit(entry, on, &block),
                    }
                }
            }),
        );
    }
}

fn emit(entry: &Entry, on: &mut dyn Sequencer, block: &Block) {
    if let Some(state) = entry.as_abs() {
        trace!("{:>8}: {}", on.position().to_string(), state);
        block(on, state);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gdv::{Event, Gdv};
    use crate::neuma::Value;
    use crate::score::Dataset;
    use crate::sequencer::QueueSequencer;
    use std::cell::RefCell;
    use std::fmt;

    type Played = Rc<RefCell<Vec<(Rational, String)>>>;

    fn recording() -> (Played, impl Fn(&mut dyn Sequencer, &Absolute) + 'static) {
        let played: Played = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&played);
        (played, move |on: &mut dyn Sequencer, state: &Absolute| {
            sink.borrow_mut().push((on.position(), state.to_string()))
        })
    }

    fn note(grade: i64, duration: Rational) -> Absolute {
        Absolute::Note(Gdv {
            grade,
            duration,
            ..Gdv::base()
        })
    }

    fn grades(played: &Played) -> Vec<(Rational, String)> {
        played
            .borrow()
            .iter()
            .map(|(time, state)| (*time, state.split(' ').next().unwrap_or("").to_owned()))
            .collect()
    }

    /// Has a duration, but cannot be played.
    #[derive(Debug)]
    struct Silence;

    impl fmt::Display for Silence {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "silence")
        }
    }

    impl Dataset for Silence {
        fn duration(&self) -> Option<Rational> {
            Some(Rational::ONE)
        }
    }

    #[test]
    fn nested_relative_play() {
        let mut inner = Score::new(1);
        inner.at(1, note(7, Rational::new(1, 4))).unwrap();
        let mut outer = Score::new(1);
        outer.at(2, inner).unwrap();

        let (played, block) = recording();
        let mut seq = QueueSequencer::new(0);
        play(&outer, &mut seq, PlayAt::Default, true, block).unwrap();
        seq.run();
        // 0 + 2 - 1, then + 1 - 1 inside the nested score
        assert_eq!(grades(&played), vec![(Rational::ONE, "grade:7".to_owned())]);
    }

    #[test]
    fn absolute_play_with_several_starts() {
        let mut score = Score::new(Rational::new(1, 4));
        score.at(Rational::new(1, 4), note(0, Rational::new(1, 4))).unwrap();
        score.at(Rational::new(1, 2), note(1, Rational::new(1, 4))).unwrap();

        let (played, block) = recording();
        let mut seq = QueueSequencer::new(5);
        let at = PlayAt::from(vec![Rational::int(10), Rational::int(20)]);
        play(&score, &mut seq, at, false, block).unwrap();
        seq.run();
        let g = |time: Rational, grade: &str| (time, grade.to_owned());
        assert_eq!(
            grades(&played),
            vec![
                g(Rational::int(10), "grade:0"),
                g(Rational::new(41, 4), "grade:1"),
                g(Rational::int(20), "grade:0"),
                g(Rational::new(81, 4), "grade:1"),
            ]
        );
    }

    #[test]
    fn default_absolute_start_is_one() {
        let mut score = Score::new(1);
        score.at(3, note(2, Rational::ONE)).unwrap();
        let (played, block) = recording();
        let mut seq = QueueSequencer::new(0);
        play(&score, &mut seq, PlayAt::Default, false, block).unwrap();
        seq.run();
        assert_eq!(grades(&played), vec![(Rational::int(3), "grade:2".to_owned())]);
    }

    #[test]
    fn slot_order_is_insertion_order() {
        let mut score = Score::new(1);
        score.at(1, note(4, Rational::ONE)).unwrap();
        score
            .at(
                1,
                Absolute::Event(Event {
                    payload: Value::from("cue"),
                }),
            )
            .unwrap();
        score.at(1, note(2, Rational::ONE)).unwrap();
        let (played, block) = recording();
        let mut seq = QueueSequencer::new(0);
        play(&score, &mut seq, Rational::ONE.into(), true, block).unwrap();
        seq.run();
        let states: Vec<_> = grades(&played).into_iter().map(|(_, s)| s).collect();
        assert_eq!(states, vec!["grade:4", "event:cue", "grade:2"]);
    }

    #[test]
    fn render_waits_from_the_cursor() {
        let mut inner = Score::new(Rational::new(1, 8));
        inner.at(Rational::new(1, 8), note(5, Rational::new(1, 8))).unwrap();
        inner.at(Rational::new(3, 8), note(6, Rational::new(1, 8))).unwrap();
        let mut outer = Score::new(Rational::new(1, 8));
        outer.at(Rational::new(1, 8), note(0, Rational::ONE)).unwrap();
        outer.at(Rational::ONE, inner).unwrap();

        let (played, block) = recording();
        let mut seq = QueueSequencer::new(2);
        render(&outer, &mut seq, block).unwrap();
        seq.run();
        assert_eq!(
            grades(&played),
            vec![
                (Rational::int(2), "grade:0".to_owned()),
                (Rational::new(23, 8), "grade:5".to_owned()),
                (Rational::new(25, 8), "grade:6".to_owned()),
            ]
        );
    }

    #[test]
    fn unplayable_entries_schedule_nothing() {
        let mut inner = Score::new(1);
        inner.at(2, Silence).unwrap();
        let mut outer = Score::new(1);
        outer.at(1, note(0, Rational::ONE)).unwrap();
        outer.at(3, inner).unwrap();

        let (_, block) = recording();
        let mut seq = QueueSequencer::new(0);
        match play(&outer, &mut seq, PlayAt::Default, true, block) {
            Err(PlayError::NotPlayable { time, dataset }) => {
                assert_eq!(time, Rational::int(2));
                assert_eq!(dataset, "silence");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(seq.pending(), 0);

        let (_, block) = recording();
        assert!(render(&outer, &mut seq, block).is_err());
        assert_eq!(seq.pending(), 0);
    }
}
