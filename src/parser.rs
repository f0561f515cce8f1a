//! Binary parser for 4-channel, 31-sample Protracker MOD files (§4.1).

use std::array;

use crate::bytereader::{ByteReader, Encoding};
use crate::error::LoadError;
use crate::module::{
    ChannelNote, Module, Pattern, Sample, MAX_CHANNELS, NUM_SAMPLE_SLOTS, PATTERN_LINES,
    PATTERN_TABLE_LEN,
};

const MIN_BUFFER_LEN: usize = 2048;
/// Literal threshold mandated by the spec: song name (20) + 31 sample headers
/// (930) + song_length + restart byte (2) + pattern table (128) + signature
/// (4) - 2. Kept exactly as specified rather than "corrected" to the header's
/// true 1084-byte length, since individual bounded reads already catch any
/// buffer that is actually too short to parse.
const SIZE_CHECK_BASE: usize = 1082;
const PATTERN_BYTES: usize = 1024;

/// Sign-extends a 4-bit field into -8..=7 without relying on a particular
/// integer type's shift semantics.
fn sign_extend_nibble(n: u8) -> i8 {
    let n = n & 0x0F;
    if n >= 8 {
        n as i8 - 16
    } else {
        n as i8
    }
}

fn read_sample_header(r: &mut ByteReader) -> Result<Sample, LoadError> {
    let name = r.read_fixed_str(22)?;
    let length = r.read_u16()? as usize * 2;
    let fine_tune = sign_extend_nibble(r.read_u8()?);
    let volume = r.read_u8()?.min(64);
    let repeat_offset = r.read_u16()? as usize * 2;
    let repeat_length = r.read_u16()? as usize * 2;
    let looped = repeat_length > 2;

    Ok(Sample {
        name,
        length,
        fine_tune,
        volume,
        repeat_offset,
        repeat_length,
        looped,
        data: Vec::new(),
    })
}

fn decode_note(bytes: &[u8]) -> ChannelNote {
    let (b0, b1, b2, b3) = (bytes[0], bytes[1], bytes[2], bytes[3]);
    ChannelNote {
        sample: (b0 & 0xF0) | (b2 >> 4),
        period: (((b0 & 0x0F) as u16) << 8) | b1 as u16,
        effect_type: b2 & 0x0F,
        effect_param: b3,
    }
}

fn read_pattern(r: &mut ByteReader) -> Result<Pattern, LoadError> {
    let mut pattern: Pattern = [[ChannelNote::default(); MAX_CHANNELS]; PATTERN_LINES];
    for line in pattern.iter_mut() {
        for note in line.iter_mut() {
            *note = decode_note(r.read_bytes(4)?);
        }
    }
    Ok(pattern)
}

/// Parses a raw module byte buffer into an immutable [`Module`].
pub fn parse(data: &[u8]) -> Result<Module, LoadError> {
    if data.len() < MIN_BUFFER_LEN {
        return Err(LoadError::TooShort {
            len: data.len(),
            min: MIN_BUFFER_LEN,
        });
    }

    let mut r = ByteReader::new(data, Encoding::BigEndian);

    let name = r.read_fixed_str(20)?;

    let mut samples: [Sample; NUM_SAMPLE_SLOTS] = array::from_fn(|_| Sample::silent());
    for slot in samples.iter_mut().skip(1) {
        *slot = read_sample_header(&mut r)?;
    }

    let song_length = (r.read_u8()? as usize).min(PATTERN_TABLE_LEN);
    let _restart_byte = r.read_u8()?;

    let mut pattern_table = [0u8; PATTERN_TABLE_LEN];
    for entry in pattern_table.iter_mut() {
        *entry = r.read_u8()?;
    }

    let _signature = r.read_bytes(4)?;

    let num_patterns = pattern_table[..song_length]
        .iter()
        .copied()
        .max()
        .unwrap_or(0) as usize
        + 1;

    let total_sample_bytes: usize = samples.iter().map(|s| s.length).sum();
    let expected = SIZE_CHECK_BASE + PATTERN_BYTES * num_patterns + total_sample_bytes;
    if data.len() < expected {
        return Err(LoadError::SizeMismatch {
            len: data.len(),
            expected,
        });
    }

    let mut patterns = Vec::with_capacity(num_patterns);
    for _ in 0..num_patterns {
        patterns.push(read_pattern(&mut r)?);
    }

    for slot in samples.iter_mut().skip(1) {
        let raw = r.read_bytes(slot.length)?;
        slot.data = raw.iter().map(|&b| (b as i8) as f32 / 128.0).collect();
    }

    log::debug!(
        "parsed module {:?}: {} positions, {} patterns, {} channels",
        name,
        song_length,
        num_patterns,
        MAX_CHANNELS
    );

    Ok(Module {
        name,
        num_channels: MAX_CHANNELS,
        samples,
        song_length,
        pattern_table,
        patterns,
    })
}
