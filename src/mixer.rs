//! Turns [`crate::sequencer::ChannelState`] into audio frames: per-channel
//! resampling, looping, panning, and gain normalisation (§5).

use crate::module::Module;
use crate::sequencer::ChannelState;

/// Frames rendered per [`crate::player::Player::decode_frames`] chunk, to
/// bound per-call work and keep tick boundaries aligned.
pub const MAX_CHUNK: usize = 1024;

/// PAL Amiga master clock, halved in the period-to-frequency formula.
const AMIGA_CLOCK: f64 = 7159090.5;

fn period_to_rate_hz(period: u16) -> f64 {
    AMIGA_CLOCK / (2.0 * period as f64)
}

/// Resamples one channel's currently-playing sample into `out`, advancing
/// `ch.sample_pos` and handling loop wraparound. Returns early (leaving `out`
/// untouched beyond what was already there) when the channel is silent.
pub fn resample_channel(ch: &mut ChannelState, module: &Module, sample_rate: u32, out: &mut [f32]) {
    if ch.sample_index == 0 || ch.period <= 20 {
        return;
    }

    let sample = &module.samples[ch.sample_index];
    if sample.data.is_empty() {
        return;
    }

    let semitone_ratio = 2f64.powf((ch.pitch_offset as f64 + sample.fine_tune as f64 / 8.0) / 12.0);
    let rate_hz = period_to_rate_hz(ch.period) * semitone_ratio;
    let step = rate_hz / sample_rate as f64;

    let loopable = sample.looped && sample.repeat_length > 2;
    // `ch.sample_looped` is the first-pass latch: a freshly triggered note
    // (§4.2 clears it to `false`) plays through the full sample once before
    // the window narrows to the repeat region.
    let loop_end_for = |ch: &ChannelState| {
        if loopable && ch.sample_looped {
            sample.repeat_offset + sample.repeat_length
        } else {
            sample.length
        }
    };

    for slot in out.iter_mut() {
        let loop_end = loop_end_for(ch);

        let pos = ch.sample_pos;
        if pos >= loop_end as f64 {
            if loopable {
                ch.sample_pos -= (sample.repeat_length) as f64
                    * ((pos - sample.repeat_offset as f64) / sample.repeat_length as f64).floor();
                ch.sample_looped = true;
            } else {
                break; // ran off the end of a non-looping sample: leave remaining frames silent
            }
        }

        let loop_end = loop_end_for(ch);
        let pos = ch.sample_pos;
        let i0 = pos.floor() as usize;
        let frac = (pos - i0 as f64) as f32;
        let end = loop_end.min(sample.data.len());
        let s0 = sample.data.get(i0).copied().unwrap_or(0.0);
        let i1 = (i0 + 1).min(end.saturating_sub(1));
        let s1 = sample.data.get(i1).copied().unwrap_or(s0);

        *slot += s0 + (s1 - s0) * frac;
        ch.sample_pos += step;
    }
}

/// Applies per-channel volume and stereo panning, accumulating into an
/// interleaved output buffer (mono: 1 sample per frame, stereo: 2).
pub fn mix_channel(
    ch: &ChannelState,
    mono_in: &[f32],
    output_channels: usize,
    num_channels: usize,
    stereo_width: f32,
    out: &mut [f32],
) {
    let linear_vol = (ch.volume as i16 + ch.vol_offset).clamp(0, 64) as f32 / 64.0;
    let gain = linear_vol * output_channels as f32 / num_channels as f32;

    if output_channels == 1 {
        for (frame, &s) in out.chunks_mut(1).zip(mono_in.iter()) {
            frame[0] += s * gain;
        }
        return;
    }

    let p = (ch.panning * stereo_width).clamp(-1.0, 1.0);
    let left_gain = gain * (0.5 - 0.5 * p);
    let right_gain = gain * (0.5 + 0.5 * p);

    for (frame, &s) in out.chunks_mut(2).zip(mono_in.iter()) {
        frame[0] += s * left_gain;
        frame[1] += s * right_gain;
    }
}

/// Renders up to `MAX_CHUNK` frames for every channel into `out`
/// (pre-sized, interleaved, zeroed by the caller), using `scratch` as the
/// per-channel mono working buffer to avoid allocating on the hot path.
pub fn render_chunk(
    channels: &mut [ChannelState],
    module: &Module,
    sample_rate: u32,
    output_channels: usize,
    stereo_width: f32,
    frames: usize,
    scratch: &mut [f32],
    out: &mut [f32],
) {
    debug_assert!(frames <= MAX_CHUNK);
    debug_assert!(scratch.len() >= frames);
    debug_assert!(out.len() >= frames * output_channels);

    let num_channels = channels.len();
    for ch in channels.iter_mut() {
        scratch[..frames].fill(0.0);
        resample_channel(ch, module, sample_rate, &mut scratch[..frames]);
        mix_channel(
            ch,
            &scratch[..frames],
            output_channels,
            num_channels,
            stereo_width,
            &mut out[..frames * output_channels],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Sample;

    fn sine_sample(len: usize) -> Sample {
        let data: Vec<f32> = (0..len)
            .map(|i| (i as f32 / len as f32 * std::f32::consts::TAU).sin())
            .collect();
        Sample {
            name: "sine".into(),
            length: len,
            fine_tune: 0,
            volume: 64,
            repeat_offset: 0,
            repeat_length: 0,
            looped: false,
            data,
        }
    }

    fn test_module() -> Module {
        let mut samples: [Sample; crate::module::NUM_SAMPLE_SLOTS] =
            std::array::from_fn(|_| Sample::silent());
        samples[1] = sine_sample(1000);
        Module {
            name: "t".into(),
            num_channels: 4,
            samples,
            song_length: 1,
            pattern_table: [0u8; crate::module::PATTERN_TABLE_LEN],
            patterns: vec![[[Default::default(); 4]; crate::module::PATTERN_LINES]],
        }
    }

    #[test]
    fn silent_channel_produces_no_sound() {
        let module = test_module();
        let mut ch = ChannelState::new(0);
        ch.sample_index = 0;
        ch.period = 428;
        let mut out = vec![0.0f32; 64];
        resample_channel(&mut ch, &module, 44100, &mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn zero_period_produces_no_sound() {
        let module = test_module();
        let mut ch = ChannelState::new(0);
        ch.sample_index = 1;
        ch.period = 0;
        let mut out = vec![0.0f32; 64];
        resample_channel(&mut ch, &module, 44100, &mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn mono_matches_stereo_with_zero_width() {
        let module = test_module();
        let mut ch = ChannelState::new(0);
        ch.sample_index = 1;
        ch.period = 428;
        ch.volume = 64;

        let mut scratch = vec![0.0f32; 64];
        resample_channel(&mut ch, &module, 44100, &mut scratch);

        let mut mono_out = vec![0.0f32; 64];
        mix_channel(&ch, &scratch, 1, 4, 1.0, &mut mono_out);

        let mut stereo_out = vec![0.0f32; 128];
        mix_channel(&ch, &scratch, 2, 4, 0.0, &mut stereo_out);

        for i in 0..64 {
            let stereo_sum = stereo_out[i * 2] + stereo_out[i * 2 + 1];
            assert!((stereo_sum - mono_out[i]).abs() < 1e-5);
        }
    }

    #[test]
    fn first_pass_plays_full_length_before_looping() {
        let length = 1000;
        let repeat_offset = 200;
        let repeat_length = 100;
        let data: Vec<f32> = (0..length).map(|i| i as f32).collect();
        let mut samples: [Sample; crate::module::NUM_SAMPLE_SLOTS] =
            std::array::from_fn(|_| Sample::silent());
        samples[1] = Sample {
            name: "attack+loop".into(),
            length,
            fine_tune: 0,
            volume: 64,
            repeat_offset,
            repeat_length,
            looped: true,
            data,
        };
        let module = Module {
            name: "t".into(),
            num_channels: 4,
            samples,
            song_length: 1,
            pattern_table: [0u8; crate::module::PATTERN_TABLE_LEN],
            patterns: vec![[[Default::default(); 4]; crate::module::PATTERN_LINES]],
        };

        let mut ch = ChannelState::new(0);
        ch.sample_index = 1;
        ch.period = 428;
        ch.sample_pos = 998.0;
        ch.sample_looped = false;

        let mut out = vec![0.0f32; 20];
        resample_channel(&mut ch, &module, 44100, &mut out);

        // Still inside the attack (unlooped) region on the very first frame,
        // reading near the true end of the sample rather than the repeat window.
        assert!(out[0] > 900.0, "expected attack-region sample, got {}", out[0]);

        // Running long enough to cross the end wraps into the repeat region,
        // not back to sample_pos = 0.
        assert!(ch.sample_looped);
        assert!((repeat_offset as f64..(repeat_offset + repeat_length) as f64).contains(&ch.sample_pos));
    }

    #[test]
    fn non_looping_sample_goes_silent_past_end() {
        let module = test_module();
        let mut ch = ChannelState::new(0);
        ch.sample_index = 1;
        ch.period = 8000; // very slow playback rate, but still advances
        ch.sample_pos = 999.0;
        let mut out = vec![1.234f32; 8];
        resample_channel(&mut ch, &module, 44100, &mut out);
        // first frame or two may still carry signal, but it must terminate cleanly
        // (no panics, no NaNs) rather than reading past the sample.
        assert!(out.iter().all(|s| s.is_finite()));
    }
}
