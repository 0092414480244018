// gdv.score -- differential decoding of musical commands onto a rational timeline
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `gdvc` decodes a file of neumas onto a score and prints what playing it sends to MIDI.

use std::io;
use std::path::PathBuf;

use log::info;
use structopt::StructOpt;

use gdv_score::codec::GdvCodec;
use gdv_score::decoder::{Decoder, DecoderChain};
use gdv_score::gdv::{Absolute, Gdv, MidiOrEvent};
use gdv_score::neuma;
use gdv_score::play::{self, PlayAt};
use gdv_score::scale::MajorScale;
use gdv_score::score::Score;
use gdv_score::sequencer::{QueueSequencer, Sequencer};
use gdv_score::Rational;

#[derive(Debug, StructOpt)]
#[structopt(name = "gdvc", about = "Decoding differential commands onto a score")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// One neuma per line, e.g. `grade:+1 duration:1/8 velocity:f`.
    #[structopt(parse(from_os_str))]
    source: PathBuf,

    /// Smallest time unit of the score.
    #[structopt(long, default_value = "1/96")]
    resolution: Rational,

    /// Duration of the state decoding starts from.
    #[structopt(long, default_value = "1/4")]
    base_duration: Rational,

    /// MIDI pitch of grade 0.
    #[structopt(long, default_value = "60")]
    root: i64,

    /// Start of playback, can be given several times.
    #[structopt(long = "at")]
    at: Vec<Rational>,

    /// Count starts from the sequencer position.
    #[structopt(long)]
    relative: bool,

    /// Schedule relative to the sequencer cursor instead of playing at absolute times.
    #[structopt(long, conflicts_with = "relative")]
    render: bool,

    /// Print the decoded score before playing it.
    #[structopt(long)]
    dump: bool,
}

fn main() -> io::Result<()> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level).map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    let source = std::fs::read_to_string(&opt.source)?;
    let neumas = neuma::parse_neumas(&source).map_err(invalid_data)?;

    let scale = MajorScale::new(opt.root);
    let base = Gdv {
        duration: opt.base_duration,
        ..Gdv::base()
    };
    let mut decoder = DecoderChain::new(GdvCodec::new(scale), base);

    let mut score = Score::new(opt.resolution);
    let mut time = score.resolution();
    for raw in neumas.iter().filter(|raw| !raw.is_comment()) {
        let state = decoder.decode(raw).map_err(invalid_data)?;
        let duration = state.duration();
        score.at(time, state).map_err(invalid_data)?;
        time += duration;
    }
    info!(
        "decoded {} states spanning {}",
        score.len(),
        score.duration()
    );
    if opt.dump {
        print!("{}", score);
    }

    let print = move |on: &mut dyn Sequencer, state: &Absolute| {
        let position = on.position().to_string();
        match state.to_midi_note_on_or_event(&scale) {
            MidiOrEvent::NoteOn {
                pitch,
                velocity,
                duration,
            } => println!("{:>8}: note-on {} {} for {}", position, pitch, velocity, duration),
            MidiOrEvent::Event(payload) => println!("{:>8}: event {}", position, payload),
        }
    };

    let mut sequencer = QueueSequencer::new(0);
    let scheduled = if opt.render {
        play::render(&score, &mut sequencer, print)
    } else {
        let at = if opt.at.is_empty() {
            PlayAt::Default
        } else {
            PlayAt::Each(opt.at.clone())
        };
        play::play(&score, &mut sequencer, at, opt.relative, print)
    };
    scheduled.map_err(invalid_data)?;

    let actions = sequencer.run();
    info!("ran {} actions, done at {}", actions, sequencer.position());
    Ok(())
}

fn invalid_data<E>(err: E) -> io::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    io::Error::new(io::ErrorKind::InvalidData, err)
}
