//! Audio value objects - PCM encoding parameters and WAV containers
//!
//! The speech model streams raw little-endian PCM described by a mime type
//! such as `audio/L16;rate=24000`. Browsers cannot play that directly, so
//! the payload is wrapped in a canonical 44-byte RIFF/WAVE header.

use crate::domain::value_objects::ClipId;

/// Length of the canonical PCM WAV header
pub const WAV_HEADER_LEN: usize = 44;

/// Narration audio is always mono
pub const CHANNELS: u16 = 1;

const PCM_FORMAT_TAG: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Sample layout of a raw PCM payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioEncoding {
    pub bits_per_sample: u16,
    pub sample_rate: u32,
}

impl Default for AudioEncoding {
    fn default() -> Self {
        Self {
            bits_per_sample: 16,
            sample_rate: 24_000,
        }
    }
}

impl AudioEncoding {
    pub fn new(bits_per_sample: u16, sample_rate: u32) -> Self {
        Self {
            bits_per_sample,
            sample_rate,
        }
    }

    /// Decode encoding parameters from a mime type like `audio/L24;rate=16000`.
    ///
    /// Matching is case-insensitive. Missing or unparsable parameters keep
    /// the 16-bit / 24 kHz defaults, and so does a rate whose byte rate
    /// would not fit the 32-bit header field.
    pub fn from_mime_type(mime_type: &str) -> Self {
        let defaults = Self::default();
        let mut bits_per_sample = defaults.bits_per_sample;
        let mut sample_rate = defaults.sample_rate;

        for param in mime_type.split(';') {
            let param = param.trim().to_ascii_lowercase();
            if let Some(rate) = param.strip_prefix("rate=") {
                if let Some(rate) = leading_number(rate) {
                    sample_rate = rate;
                }
            } else if let Some(bits) = param.strip_prefix("audio/l") {
                if let Some(bits) = leading_number(bits).and_then(|b| u16::try_from(b).ok()) {
                    bits_per_sample = bits;
                }
            }
        }

        let encoding = Self::new(bits_per_sample, sample_rate);
        if encoding.checked_byte_rate().is_none() {
            return Self::new(bits_per_sample, defaults.sample_rate);
        }
        encoding
    }

    pub fn block_align(&self) -> u16 {
        CHANNELS * (self.bits_per_sample / 8)
    }

    /// Saturates instead of wrapping for encodings built by hand
    pub fn byte_rate(&self) -> u32 {
        self.checked_byte_rate().unwrap_or(u32::MAX)
    }

    fn checked_byte_rate(&self) -> Option<u32> {
        self.sample_rate.checked_mul(u32::from(self.block_align()))
    }
}

fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Wrap raw PCM bytes in a playable WAV container.
///
/// The caller guarantees a well-formed encoding; nothing is validated here.
pub fn build_wav(pcm: &[u8], encoding: AudioEncoding) -> Vec<u8> {
    let data_len = pcm.len() as u32;
    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());

    // RIFF chunk
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt sub-chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    wav.extend_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    wav.extend_from_slice(&CHANNELS.to_le_bytes());
    wav.extend_from_slice(&encoding.sample_rate.to_le_bytes());
    wav.extend_from_slice(&encoding.byte_rate().to_le_bytes());
    wav.extend_from_slice(&encoding.block_align().to_le_bytes());
    wav.extend_from_slice(&encoding.bits_per_sample.to_le_bytes());

    // data sub-chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());

    wav.extend_from_slice(pcm);
    wav
}

/// A generated narration ready for playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub id: ClipId,
    pub encoding: AudioEncoding,
    /// Complete WAV file, header included
    pub wav: Vec<u8>,
}

impl AudioClip {
    pub fn from_pcm(pcm: &[u8], encoding: AudioEncoding) -> Self {
        Self {
            id: ClipId::new(),
            encoding,
            wav: build_wav(pcm, encoding),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        "audio/wav"
    }

    pub fn pcm_len(&self) -> usize {
        self.wav.len() - WAV_HEADER_LEN
    }

    pub fn duration_ms(&self) -> u64 {
        match self.encoding.byte_rate() {
            0 => 0,
            rate => self.pcm_len() as u64 * 1000 / u64::from(rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    #[test]
    fn test_wav_header_for_default_encoding() {
        let pcm = vec![7u8; 1000];
        let wav = build_wav(&pcm, AudioEncoding::default());

        assert_eq!(wav.len(), 1044);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32_at(&wav, 4), 36 + 1000);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32_at(&wav, 16), 16);
        assert_eq!(u16_at(&wav, 20), 1);
        assert_eq!(u16_at(&wav, 22), 1);
        assert_eq!(u32_at(&wav, 24), 24_000);
        assert_eq!(u32_at(&wav, 28), 48_000);
        assert_eq!(u16_at(&wav, 32), 2);
        assert_eq!(u16_at(&wav, 34), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 40), 1000);
        assert_eq!(&wav[44..], pcm.as_slice());
    }

    #[test]
    fn test_wav_header_for_empty_payload() {
        let wav = build_wav(&[], AudioEncoding::default());
        assert_eq!(wav.len(), WAV_HEADER_LEN);
        assert_eq!(u32_at(&wav, 4), 36);
        assert_eq!(u32_at(&wav, 40), 0);
    }

    #[test]
    fn test_wav_header_for_24_bit_audio() {
        let wav = build_wav(&[0u8; 30], AudioEncoding::new(24, 16_000));
        assert_eq!(u32_at(&wav, 24), 16_000);
        assert_eq!(u32_at(&wav, 28), 48_000);
        assert_eq!(u16_at(&wav, 32), 3);
        assert_eq!(u16_at(&wav, 34), 24);
    }

    #[test]
    fn test_mime_type_parsing() {
        assert_eq!(
            AudioEncoding::from_mime_type("audio/L16;rate=24000"),
            AudioEncoding::new(16, 24_000)
        );
        assert_eq!(
            AudioEncoding::from_mime_type("audio/l24; rate=16000"),
            AudioEncoding::new(24, 16_000)
        );
        assert_eq!(
            AudioEncoding::from_mime_type("AUDIO/L8;Rate=8000"),
            AudioEncoding::new(8, 8_000)
        );
    }

    #[test]
    fn test_mime_type_defaults() {
        assert_eq!(AudioEncoding::from_mime_type(""), AudioEncoding::default());
        assert_eq!(
            AudioEncoding::from_mime_type("audio/pcm;rate=abc"),
            AudioEncoding::default()
        );
        assert_eq!(
            AudioEncoding::from_mime_type("audio/L16"),
            AudioEncoding::new(16, 24_000)
        );
    }

    #[test]
    fn test_oversized_rate_keeps_default() {
        let encoding = AudioEncoding::from_mime_type("audio/L16;rate=3000000000");
        assert_eq!(encoding, AudioEncoding::new(16, 24_000));

        let wav = build_wav(&[0u8; 4], encoding);
        assert_eq!(u32_at(&wav, 28), 48_000);

        // Still fits once multiplied by the block align of 1
        assert_eq!(
            AudioEncoding::from_mime_type("audio/L8;rate=3000000000"),
            AudioEncoding::new(8, 3_000_000_000)
        );
    }

    #[test]
    fn test_byte_rate_saturates() {
        let encoding = AudioEncoding {
            bits_per_sample: 32,
            sample_rate: u32::MAX,
        };
        assert_eq!(encoding.byte_rate(), u32::MAX);
    }

    #[test]
    fn test_clip_duration() {
        let clip = AudioClip::from_pcm(&[0u8; 48_000], AudioEncoding::default());
        assert_eq!(clip.pcm_len(), 48_000);
        assert_eq!(clip.duration_ms(), 1000);
        assert_eq!(clip.mime_type(), "audio/wav");
    }
}
