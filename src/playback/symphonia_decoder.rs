#![cfg_attr(not(feature = "desktop"), allow(dead_code))]

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use symphonia::core::{
    audio::SampleBuffer,
    codecs::{Decoder, DecoderOptions},
    formats::{FormatOptions, FormatReader, SeekMode, SeekTo},
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
    units::Time,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("Symphonia error: {0}")]
    Symphonia(#[from] symphonia::core::errors::Error),
    #[error("No audio tracks found")]
    NoAudioTracks,
}

/// Wrapper around a symphonia decoder for one narration part.
///
/// Tracks decoded frames so the position survives across packets and seeks.
pub struct PartDecoder {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    decoded_frames: AtomicU64,
    duration: Option<std::time::Duration>,
}

impl PartDecoder {
    /// Probe `data`, using `extension` (e.g. "mp3") as a format hint
    pub fn new(data: Vec<u8>, extension: Option<&str>) -> Result<Self, DecoderError> {
        let cursor = Cursor::new(data);
        let media_source = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = extension {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            media_source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
            .ok_or(DecoderError::NoAudioTracks)?;

        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let channels = track
            .codec_params
            .channels
            .map(|c| c.count())
            .unwrap_or(2);

        let duration = track.codec_params.n_frames.map(|n_frames| {
            std::time::Duration::from_secs_f64(n_frames as f64 / sample_rate as f64)
        });

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())?;

        Ok(Self {
            format_reader,
            decoder,
            track_id,
            sample_rate,
            channels,
            decoded_frames: AtomicU64::new(0),
            duration,
        })
    }

    /// Decode the next packet into `out` as interleaved f32 samples.
    ///
    /// Returns the packet's channel count, or `None` at end of stream.
    pub fn decode_interleaved(&mut self, out: &mut Vec<f32>) -> Result<Option<usize>, DecoderError> {
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(DecoderError::Symphonia(e)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let audio_buf = self.decoder.decode(&packet)?;
            let frames = audio_buf.frames();
            let spec = *audio_buf.spec();
            let channels = spec.channels.count();

            let mut samples = SampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec);
            samples.copy_interleaved_ref(audio_buf);
            out.clear();
            out.extend_from_slice(samples.samples());

            self.decoded_frames
                .fetch_add(frames as u64, Ordering::Relaxed);

            return Ok(Some(channels));
        }
    }

    /// Position based on decoded frames
    pub fn position(&self) -> std::time::Duration {
        let frames = self.decoded_frames.load(Ordering::Relaxed);
        std::time::Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Seek to a specific position
    pub fn seek(&mut self, position: std::time::Duration) -> Result<(), DecoderError> {
        let position_seconds = position.as_secs_f64();
        let frame_number = (position_seconds * self.sample_rate as f64) as u64;

        let secs = position_seconds.floor() as u64;
        let frac = position_seconds.fract();
        let seek_time = Time::new(secs, frac);

        match self.format_reader.seek(
            SeekMode::Accurate,
            SeekTo::Time {
                time: seek_time,
                track_id: Some(self.track_id),
            },
        ) {
            Ok(_) => {
                self.decoder.reset();
                self.decoded_frames.store(frame_number, Ordering::Relaxed);
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(
                    "Seek by time failed for {}.{}s: {:?}, falling back to decode",
                    secs,
                    frac,
                    e
                );
            }
        }

        // Fallback: rewind and decode forward to the requested frame
        self.format_reader.seek(
            SeekMode::Accurate,
            SeekTo::Time {
                time: Time::new(0, 0.0),
                track_id: Some(self.track_id),
            },
        )?;
        self.decoder.reset();
        self.decoded_frames.store(0, Ordering::Relaxed);

        let mut scratch = Vec::new();
        let mut decoded = 0u64;
        while decoded < frame_number {
            match self.decode_interleaved(&mut scratch)? {
                Some(channels) => {
                    decoded += (scratch.len() / channels.max(1)) as u64;
                }
                None => break,
            }
        }

        self.decoded_frames
            .store(decoded.min(frame_number), Ordering::Relaxed);

        Ok(())
    }

    pub fn duration(&self) -> Option<std::time::Duration> {
        self.duration
    }
}

/// File extension of a part URL or path, used as a probe hint
pub fn extension_hint(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => Some(extension),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Mono 16-bit PCM WAV holding `samples`
    fn wav_bytes(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    fn one_second_tone() -> Vec<u8> {
        let samples: Vec<i16> = (0..8000).map(|i| ((i % 80) as i16 - 40) * 200).collect();
        wav_bytes(8000, &samples)
    }

    #[test]
    fn test_probe_reads_format_details() {
        let decoder = PartDecoder::new(one_second_tone(), Some("wav")).unwrap();
        assert_eq!(decoder.sample_rate(), 8000);
        assert_eq!(decoder.channels(), 1);
        assert_eq!(decoder.duration(), Some(Duration::from_secs(1)));
        assert_eq!(decoder.position(), Duration::ZERO);
    }

    #[test]
    fn test_decodes_until_end_of_stream() {
        let mut decoder = PartDecoder::new(one_second_tone(), Some("wav")).unwrap();
        let mut out = Vec::new();
        let mut total = 0usize;
        while let Some(channels) = decoder.decode_interleaved(&mut out).unwrap() {
            assert_eq!(channels, 1);
            total += out.len();
        }
        assert_eq!(total, 8000);
        assert_eq!(decoder.position(), Duration::from_secs(1));
    }

    #[test]
    fn test_seek_moves_position() {
        let mut decoder = PartDecoder::new(one_second_tone(), Some("wav")).unwrap();
        decoder.seek(Duration::from_millis(500)).unwrap();
        assert_eq!(decoder.position(), Duration::from_millis(500));

        let mut out = Vec::new();
        assert!(decoder.decode_interleaved(&mut out).unwrap().is_some());
        assert!(decoder.position() > Duration::from_millis(500));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(PartDecoder::new(vec![0u8; 64], None).is_err());
    }

    #[test]
    fn test_extension_hint() {
        assert_eq!(extension_hint("https://cdn.example/a/part1.mp3"), Some("mp3"));
        assert_eq!(
            extension_hint("https://cdn.example/a/part1.m4a?sig=abc.def"),
            Some("m4a")
        );
        assert_eq!(extension_hint("/home/me/narration/intro.flac"), Some("flac"));
        assert_eq!(extension_hint("https://cdn.example/stream"), None);
        assert_eq!(extension_hint("https://cdn.example/.hidden"), None);
    }
}
