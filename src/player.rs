//! Public facade: owns a loaded [`Module`], a [`Sequencer`], and decodes
//! frames on demand (§6).

use std::fs;
use std::path::Path;

use crate::error::LoadError;
use crate::mixer::{self, MAX_CHUNK};
use crate::module::Module;
use crate::parser;
use crate::sequencer::Sequencer;

const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// A loaded song plus everything needed to turn it into audio frames.
pub struct Player {
    module: Module,
    sequencer: Sequencer,
    sample_rate: u32,
    output_channels: usize,
    stereo_width: f32,
    frames_until_next_tick: u32,
    scratch: Vec<f32>,
    /// Reused across `decode_frames` calls so the i16 path has no steady-state allocation.
    f32_scratch: Vec<f32>,
}

impl Player {
    pub fn from_bytes(data: &[u8]) -> Result<Self, LoadError> {
        let module = parser::parse(data)?;
        let mut sequencer = Sequencer::new(module.num_channels);
        sequencer.reset_song_to_beginning(&module);
        let frames_until_next_tick = sequencer.frames_per_tick(DEFAULT_SAMPLE_RATE);

        log::debug!("module {:?} ready to play", module.name);

        Ok(Player {
            module,
            sequencer,
            sample_rate: DEFAULT_SAMPLE_RATE,
            output_channels: 2,
            stereo_width: 1.0,
            frames_until_next_tick,
            scratch: vec![0.0; MAX_CHUNK],
            f32_scratch: Vec::new(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// `(song_position, line_index)`.
    pub fn position(&self) -> (usize, usize) {
        (self.sequencer.pattern_idx, self.sequencer.line_idx)
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
        self.frames_until_next_tick = self.sequencer.frames_per_tick(self.sample_rate);
    }

    /// `true` for stereo (2-channel interleaved) output, `false` for mono.
    pub fn set_stereo(&mut self, stereo: bool) {
        self.output_channels = if stereo { 2 } else { 1 };
    }

    pub fn set_stereo_width(&mut self, width: f32) {
        self.stereo_width = width.clamp(0.0, 1.0);
    }

    pub fn reset_song_to_beginning(&mut self) {
        self.sequencer.reset_song_to_beginning(&self.module);
        self.frames_until_next_tick = self.sequencer.frames_per_tick(self.sample_rate);
    }

    /// Renders exactly `out.len() / output_channels` frames of `f32`
    /// interleaved audio, advancing the sequencer across tick and line
    /// boundaries as needed. `out` must be a multiple of `output_channels`.
    pub fn decode_frames_f(&mut self, out: &mut [f32]) {
        let output_channels = self.output_channels;
        debug_assert_eq!(out.len() % output_channels, 0);
        out.fill(0.0);

        let total_frames = out.len() / output_channels;
        let mut produced = 0;

        while produced < total_frames {
            if self.frames_until_next_tick == 0 {
                self.sequencer.step(&self.module);
                self.frames_until_next_tick = self.sequencer.frames_per_tick(self.sample_rate);
            }

            let chunk = (total_frames - produced)
                .min(MAX_CHUNK)
                .min(self.frames_until_next_tick as usize);
            if chunk == 0 {
                break;
            }

            let out_slice =
                &mut out[produced * output_channels..(produced + chunk) * output_channels];
            mixer::render_chunk(
                &mut self.sequencer.channels,
                &self.module,
                self.sample_rate,
                output_channels,
                self.stereo_width,
                chunk,
                &mut self.scratch[..chunk],
                out_slice,
            );

            self.frames_until_next_tick -= chunk as u32;
            produced += chunk;
        }
    }

    /// Same as [`Player::decode_frames_f`] but saturating to signed 16-bit PCM.
    pub fn decode_frames(&mut self, out: &mut [i16]) {
        let mut float_buf = std::mem::take(&mut self.f32_scratch);
        if float_buf.len() < out.len() {
            float_buf.resize(out.len(), 0.0);
        }
        self.decode_frames_f(&mut float_buf[..out.len()]);
        for (dst, &src) in out.iter_mut().zip(float_buf.iter()) {
            *dst = (src.clamp(-1.0, 1.0) * 32767.0) as i16;
        }
        self.f32_scratch = float_buf;
    }
}
