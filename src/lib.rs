//! Protracker MOD file parser, sequencer and mixer.
//!
//! ```no_run
//! let mut player = modplayer::Player::from_file("song.mod").unwrap();
//! let mut out = vec![0i16; 2 * 44100];
//! player.decode_frames(&mut out);
//! ```

mod bytereader;
mod error;
mod mixer;
mod module;
mod parser;
mod player;
mod sequencer;
mod tracker;

pub use error::LoadError;
pub use module::{ChannelNote, Module, Sample};
pub use player::Player;
pub use tracker::{protracker_period_to_note, Tracker};
