// gdv.score -- differential decoding of musical commands onto a rational timeline
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The scheduling interface scores are played onto, and a simple queue based implementation.

use std::collections::BinaryHeap;

use log::{trace, warn};

use crate::rational::Rational;

/// A scheduled action. It receives the sequencer so it can schedule follow-ups.
pub type Action = Box<dyn FnOnce(&mut dyn Sequencer)>;

pub trait Sequencer {
    /// The current time of the sequencer.
    fn position(&self) -> Rational;

    /// Run `action` at an absolute time.
    fn at(&mut self, time: Rational, action: Action);

    /// Run `action` after `delay`, counted from the current position.
    fn wait(&mut self, delay: Rational, action: Action) {
        let time = self.position() + delay;
        self.at(time, action);
    }
}

/// Runs actions in time order. Actions scheduled for the same time run in
/// the order they were scheduled in.
pub struct QueueSequencer {
    position: Rational,
    queue: BinaryHeap<QueuedAction>,
    /// Number of actions scheduled so far, used to break ties.
    scheduled: u64,
}

impl QueueSequencer {
    pub fn new(position: impl Into<Rational>) -> Self {
        Self {
            position: position.into(),
            queue: BinaryHeap::new(),
            scheduled: 0,
        }
    }

    /// Number of actions waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Run all actions up to and including `time`, then move the position there.
    /// Returns the number of actions that ran.
    pub fn run_until(&mut self, time: Rational) -> usize {
        let mut count = 0;
        while let Some(next) = self.queue.peek() {
            if next.time > time {
                break;
            }
            if let Some(next) = self.queue.pop() {
                self.position = next.time;
                trace!("{:>8}: running action #{}", next.time.to_string(), next.order);
                (next.action)(self);
                count += 1;
            }
        }
        self.position = std::cmp::max(self.position, time);
        count
    }

    /// Run until nothing is left, including actions scheduled along the way.
    pub fn run(&mut self) -> usize {
        let mut count = 0;
        while let Some(next) = self.queue.pop() {
            self.position = next.time;
            trace!("{:>8}: running action #{}", next.time.to_string(), next.order);
            (next.action)(self);
            count += 1;
        }
        count
    }
}

impl Sequencer for QueueSequencer {
    fn position(&self) -> Rational {
        self.position
    }

    fn at(&mut self, time: Rational, action: Action) {
        let time = if time < self.position {
            warn!(
                "action for {} scheduled at {}, running it now",
                time, self.position
            );
            self.position
        } else {
            time
        };
        self.queue.push(QueuedAction {
            time,
            order: self.scheduled,
            action,
        });
        self.scheduled += 1;
    }
}

struct QueuedAction {
    time: Rational,
    order: u64,
    action: Action,
}

impl PartialEq for QueuedAction {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.order == other.order
    }
}

impl Eq for QueuedAction {}

impl PartialOrd for QueuedAction {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedAction {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // the earliest action is the largest for the max heap
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.order.cmp(&self.order))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<(Rational, &'static str)>>>, impl Fn(&'static str) -> Action) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_ref = Rc::clone(&log);
        let make = move |name: &'static str| -> Action {
            let log = Rc::clone(&log_ref);
            Box::new(move |on: &mut dyn Sequencer| log.borrow_mut().push((on.position(), name)))
        };
        (log, make)
    }

    #[test]
    fn time_order_then_schedule_order() {
        let (log, action) = recorder();
        let mut seq = QueueSequencer::new(0);
        seq.at(Rational::int(2), action("late"));
        seq.at(Rational::new(1, 2), action("first"));
        seq.at(Rational::new(1, 2), action("second"));
        seq.wait(Rational::ONE, action("waited"));
        assert_eq!(seq.pending(), 4);
        assert_eq!(seq.run(), 4);
        assert_eq!(
            *log.borrow(),
            vec![
                (Rational::new(1, 2), "first"),
                (Rational::new(1, 2), "second"),
                (Rational::ONE, "waited"),
                (Rational::int(2), "late"),
            ]
        );
        assert_eq!(seq.position(), Rational::int(2));
    }

    #[test]
    fn actions_schedule_follow_ups() {
        let (log, action) = recorder();
        let follow_up = action("follow-up");
        let mut seq = QueueSequencer::new(1);
        seq.at(
            Rational::int(3),
            Box::new(move |on: &mut dyn Sequencer| on.wait(Rational::new(1, 4), follow_up)),
        );
        seq.at(Rational::int(5), action("end"));
        assert_eq!(seq.run_until(Rational::int(4)), 2);
        assert_eq!(seq.position(), Rational::int(4));
        assert_eq!(*log.borrow(), vec![(Rational::new(13, 4), "follow-up")]);
        assert_eq!(seq.pending(), 1);
    }

    #[test]
    fn past_actions_run_at_the_current_position() {
        let (log, action) = recorder();
        let mut seq = QueueSequencer::new(2);
        seq.at(Rational::ZERO, action("late"));
        seq.run();
        assert_eq!(*log.borrow(), vec![(Rational::int(2), "late")]);
    }
}
