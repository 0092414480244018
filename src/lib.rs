// gdv.score -- differential decoding of musical commands onto a rational timeline
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

// Decoding
pub mod codec;
pub mod command;
pub mod decoder;
pub mod dynamics;
pub mod gdv;
pub mod neuma;
pub mod scale;

// Timeline
pub mod play;
pub mod query;
pub mod score;
pub mod sequencer;

// Utility modules
pub use gdv_core::rational;
pub use gdv_core::Rational;
