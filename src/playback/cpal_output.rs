use crate::playback::symphonia_decoder::{DecoderError, PartDecoder};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("No output device available")]
    DeviceNotFound,
    #[error("Stream config error: {0}")]
    StreamConfigError(String),
    #[error("Stream build error: {0}")]
    StreamBuildError(String),
    #[error("Stream play error: {0}")]
    StreamPlayError(String),
    #[error("Decoder error: {0}")]
    DecoderError(#[from] DecoderError),
    #[error("Audio output thread exited")]
    ThreadExited,
}

/// Flags shared between the control side and the audio callback
struct SharedFlags {
    is_playing: AtomicBool,
    flush: AtomicBool,
    finished: AtomicBool,
    stream_failed: AtomicBool,
    volume: AtomicU32, // 0-10000 (0.0-1.0 scaled)
}

/// One part's cpal output stream.
///
/// cpal streams are not `Send`, so the stream is built and kept alive on a
/// dedicated thread. Dropping the `PartOutput` ends that thread, which drops
/// the stream and detaches from the device.
pub struct PartOutput {
    decoder: Arc<Mutex<PartDecoder>>,
    flags: Arc<SharedFlags>,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl PartOutput {
    /// Build a paused stream for `decoder`. `on_finished` runs once each time
    /// the decoder reaches the end of the part.
    pub async fn start(
        decoder: PartDecoder,
        volume: f32,
        on_finished: impl Fn() + Send + 'static,
    ) -> Result<Self, AudioError> {
        debug!(
            "Decoding {} channel(s) at {} Hz, duration {:?}",
            decoder.channels(),
            decoder.sample_rate(),
            decoder.duration()
        );
        let decoder = Arc::new(Mutex::new(decoder));
        let flags = Arc::new(SharedFlags {
            is_playing: AtomicBool::new(false),
            flush: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            stream_failed: AtomicBool::new(false),
            volume: AtomicU32::new((volume.clamp(0.0, 1.0) * 10000.0) as u32),
        });

        let (ready_tx, ready_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread_decoder = decoder.clone();
        let thread_flags = flags.clone();
        std::thread::Builder::new()
            .name("part-output".to_string())
            .spawn(move || {
                let stream = match build_stream(thread_decoder, thread_flags, on_finished) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                // Park until the owner goes away
                let _ = shutdown_rx.recv();
                drop(stream);
                debug!("Part output thread exiting");
            })
            .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

        ready_rx.await.map_err(|_| AudioError::ThreadExited)??;

        Ok(Self {
            decoder,
            flags,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn play(&self) -> Result<(), AudioError> {
        if self.shutdown_tx.is_none() {
            return Err(AudioError::ThreadExited);
        }
        if self.flags.stream_failed.load(Ordering::SeqCst) {
            return Err(AudioError::StreamPlayError(
                "output stream reported an error".to_string(),
            ));
        }
        self.flags.is_playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn pause(&self) {
        self.flags.is_playing.store(false, Ordering::SeqCst);
    }

    pub fn position(&self) -> Duration {
        self.lock_decoder().position()
    }

    pub fn seek(&self, position: Duration) -> Result<(), AudioError> {
        self.lock_decoder().seek(position)?;
        self.flags.flush.store(true, Ordering::SeqCst);
        self.flags.finished.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn lock_decoder(&self) -> MutexGuard<'_, PartDecoder> {
        match self.decoder.lock() {
            Ok(decoder) => decoder,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Stop output and let the stream thread exit
    pub fn shutdown(&mut self) {
        self.flags.is_playing.store(false, Ordering::SeqCst);
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for PartOutput {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn build_stream(
    decoder: Arc<Mutex<PartDecoder>>,
    flags: Arc<SharedFlags>,
    on_finished: impl Fn() + Send + 'static,
) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(AudioError::DeviceNotFound)?;

    let default_config = device
        .default_output_config()
        .map_err(|e| AudioError::StreamConfigError(e.to_string()))?;
    let stream_config = StreamConfig::from(default_config.clone());

    info!(
        "Audio device: {} channels, {} Hz, {:?}",
        stream_config.channels,
        stream_config.sample_rate.0,
        default_config.sample_format()
    );

    let output_channels = stream_config.channels as usize;
    let output_rate = stream_config.sample_rate.0;

    let mut decoded = Vec::new();
    let mut sample_buffer: Vec<f32> = Vec::new();
    let mut buffer_pos = 0usize;

    let error_flags = flags.clone();
    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if flags.flush.swap(false, Ordering::SeqCst) {
                    sample_buffer.clear();
                    buffer_pos = 0;
                }

                if !flags.is_playing.load(Ordering::Relaxed) {
                    data.fill(0.0);
                    return;
                }

                let vol = flags.volume.load(Ordering::Relaxed) as f32 / 10000.0;

                let mut output_pos = 0;
                while output_pos < data.len() {
                    if buffer_pos >= sample_buffer.len() {
                        let mut decoder = match decoder.lock() {
                            Ok(decoder) => decoder,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        match decoder.decode_interleaved(&mut decoded) {
                            Ok(Some(input_channels)) => {
                                let ratio = decoder.sample_rate() as f64 / output_rate as f64;
                                sample_buffer = convert_frames(
                                    &decoded,
                                    input_channels,
                                    output_channels,
                                    ratio,
                                );
                                buffer_pos = 0;
                            }
                            Ok(None) => {
                                flags.is_playing.store(false, Ordering::SeqCst);
                                if !flags.finished.swap(true, Ordering::SeqCst) {
                                    on_finished();
                                }
                                data[output_pos..].fill(0.0);
                                return;
                            }
                            Err(e) => {
                                error!("Decoder error: {:?}", e);
                                flags.is_playing.store(false, Ordering::SeqCst);
                                data[output_pos..].fill(0.0);
                                return;
                            }
                        }
                        if sample_buffer.is_empty() {
                            continue;
                        }
                    }

                    while output_pos < data.len() && buffer_pos < sample_buffer.len() {
                        data[output_pos] = sample_buffer[buffer_pos] * vol;
                        output_pos += 1;
                        buffer_pos += 1;
                    }
                }
            },
            move |err| {
                error!("Audio stream error: {:?}", err);
                error_flags.stream_failed.store(true, Ordering::SeqCst);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

    stream
        .play()
        .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

    Ok(stream)
}

/// Nearest-sample rate conversion followed by channel mapping.
///
/// `ratio` is input rate over output rate.
fn convert_frames(
    input: &[f32],
    input_channels: usize,
    output_channels: usize,
    ratio: f64,
) -> Vec<f32> {
    if input_channels == 0 || output_channels == 0 {
        return Vec::new();
    }

    let input_frames = input.len() / input_channels;
    let output_frames = if ratio > 0.0 && ratio != 1.0 {
        (input_frames as f64 / ratio) as usize
    } else {
        input_frames
    };

    let mut converted = Vec::with_capacity(output_frames * output_channels);
    for frame_idx in 0..output_frames {
        let src_idx = if ratio > 0.0 && ratio != 1.0 {
            ((frame_idx as f64 * ratio) as usize).min(input_frames.saturating_sub(1))
        } else {
            frame_idx
        };
        let base = src_idx * input_channels;
        let frame = &input[base..base + input_channels];

        match (input_channels, output_channels) {
            (i, o) if i == o => converted.extend_from_slice(frame),
            // Mono to anything: duplicate
            (1, o) => converted.extend(std::iter::repeat(frame[0]).take(o)),
            // Downmix to mono
            (_, 1) => converted.push(frame.iter().sum::<f32>() / input_channels as f32),
            // Otherwise take leading channels, pad with silence
            (_, o) => {
                for ch in 0..o {
                    converted.push(frame.get(ch).copied().unwrap_or(0.0));
                }
            }
        }
    }
    converted
}
