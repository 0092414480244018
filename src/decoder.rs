// gdv.score -- differential decoding of musical commands onto a rational timeline
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The three decoding stages and the stateful chain that composes them.
//!
//! A [`Codec`] provides the two pure stages: `parse` splits a raw neuma into
//! a command, `apply` accumulates a command onto a state. Only a
//! [`DecoderChain`] keeps state around, remembering the last result so that
//! the next command is decoded relative to it.

use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use crate::neuma::Neuma;

/// The pure stages of decoding.
pub trait Codec {
    type Command: fmt::Debug;
    type State: Clone + fmt::Debug;
    type Output: Clone + fmt::Debug;
    type Error;

    /// Syntactic decomposition of a raw neuma. Does not look at any state.
    fn parse(&self, raw: &Neuma) -> Result<Self::Command, Self::Error>;

    /// Accumulate `command` onto `on`, without remembering anything.
    fn apply(&self, command: &Self::Command, on: &Self::State) -> Result<Self::Output, Self::Error>;

    /// The state the next command is decoded against, or `None` if `output`
    /// must not become the new baseline.
    fn persist(&self, output: &Self::Output) -> Option<Self::State>;
}

/// Post-processes every non-ephemeral decoding result.
pub trait Transcriptor<T> {
    fn transcript(&self, value: T) -> T;
}

impl<T, F: Fn(T) -> T> Transcriptor<T> for F {
    fn transcript(&self, value: T) -> T {
        self(value)
    }
}

/// A stateful decoder.
pub trait Decoder: Sized {
    type Output;
    type Error;

    /// Parse and apply `raw` against the running state, then remember the result.
    fn decode(&mut self, raw: &Neuma) -> Result<Self::Output, Self::Error>;

    /// A new decoder starting from the current running state. Decoding with
    /// either of them does not affect the other.
    fn subcontext(&self) -> Self;
}

/// Wraps a codec with a running state.
pub struct DecoderChain<C: Codec> {
    codec: C,
    base: C::State,
    last: C::State,
    transcriptor: Option<Rc<dyn Transcriptor<C::Output>>>,
}

impl<C: Codec> DecoderChain<C> {
    pub fn new(codec: C, base: C::State) -> Self {
        Self {
            codec,
            last: base.clone(),
            base,
            transcriptor: None,
        }
    }

    /// Attach a transcriptor. It is shared with all subcontexts.
    pub fn with_transcriptor<T>(mut self, transcriptor: T) -> Self
    where
        T: Transcriptor<C::Output> + 'static,
    {
        self.transcriptor = Some(Rc::new(transcriptor));
        self
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// The state this chain started from.
    pub fn base(&self) -> &C::State {
        &self.base
    }

    /// The running state.
    pub fn last(&self) -> &C::State {
        &self.last
    }

    /// Forget everything decoded so far.
    pub fn reset(&mut self) {
        self.last = self.base.clone();
    }

    /// Like [`Decoder::decode`], for commands that are already parsed.
    pub fn decode_command(&mut self, command: &C::Command) -> Result<C::Output, C::Error> {
        let result = self.codec.apply(command, &self.last)?;
        match self.codec.persist(&result) {
            Some(state) => {
                trace!("running state is now {:?}", state);
                self.last = state;
            }
            None => {
                trace!("not persisting {:?}", result);
                return Ok(result);
            }
        }
        Ok(match &self.transcriptor {
            Some(transcriptor) => transcriptor.transcript(result),
            None => result,
        })
    }
}

impl<C: Codec> Decoder for DecoderChain<C>
where
    C: Clone,
{
    type Output = C::Output;
    type Error = C::Error;

    fn decode(&mut self, raw: &Neuma) -> Result<C::Output, C::Error> {
        debug!("decoding {}", raw);
        let command = self.codec.parse(raw)?;
        self.decode_command(&command)
    }

    fn subcontext(&self) -> Self {
        Self {
            codec: self.codec.clone(),
            base: self.last.clone(),
            last: self.last.clone(),
            transcriptor: self.transcriptor.clone(),
        }
    }
}

impl<C: Codec> fmt::Debug for DecoderChain<C>
where
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderChain")
            .field("codec", &self.codec)
            .field("base", &self.base)
            .field("last", &self.last)
            .field("transcriptor", &self.transcriptor.is_some())
            .finish()
    }
}
