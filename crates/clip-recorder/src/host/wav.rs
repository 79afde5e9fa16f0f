//! Streaming WAV container for recorded PCM.
//!
//! The header is written before the length is known, so both size fields
//! hold `0xFFFF_FFFF`. Players treat that as "read to end of file".

/// MIME type of the container produced by the cpal host.
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// Length of the canonical RIFF/WAVE header.
pub const WAV_HEADER_LEN: usize = 44;

const BITS_PER_SAMPLE: u16 = 16;
const PCM_FORMAT: u16 = 1;
const UNKNOWN_SIZE: u32 = u32::MAX;

/// Header for 16-bit little-endian PCM of unknown length.
pub fn streaming_header(sample_rate: u32, channels: u16) -> Vec<u8> {
    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate * u32::from(block_align);

    let mut header = Vec::with_capacity(WAV_HEADER_LEN);
    header.extend_from_slice(b"RIFF");
    header.extend_from_slice(&UNKNOWN_SIZE.to_le_bytes());
    header.extend_from_slice(b"WAVE");
    header.extend_from_slice(b"fmt ");
    header.extend_from_slice(&16u32.to_le_bytes());
    header.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    header.extend_from_slice(&channels.to_le_bytes());
    header.extend_from_slice(&sample_rate.to_le_bytes());
    header.extend_from_slice(&byte_rate.to_le_bytes());
    header.extend_from_slice(&block_align.to_le_bytes());
    header.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    header.extend_from_slice(b"data");
    header.extend_from_slice(&UNKNOWN_SIZE.to_le_bytes());
    header
}

/// Converts float samples to 16-bit PCM bytes, clamping out-of-range input.
pub fn encode_f32(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        let scaled = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        bytes.extend_from_slice(&scaled.to_le_bytes());
    }
    bytes
}

/// Serializes 16-bit samples as little-endian bytes.
pub fn encode_i16(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|sample| sample.to_le_bytes()).collect()
}
