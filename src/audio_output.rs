//! Boundary between the playback engine and the physical output device.
//!
//! The engine only sees the traits below. `CpalDeviceFactory` is the real
//! implementation; tests substitute their own factory.

use crate::error::DeviceError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample, SupportedBufferSize};
use crossbeam::channel::{self, Receiver, SendTimeoutError, Sender};
use std::time::Duration;
use tracing::{debug, error};

// A device that stops consuming for this long is treated as failed.
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

// Chunks in flight between the writer and the device callback.
const QUEUED_CHUNKS: usize = 2;

/// What the engine asks for when opening a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceRequest {
    pub sample_rate: u32,
    pub channels: u16,
    /// Safety floor for the device's reported minimum buffer, in frames.
    pub min_buffer_frames: usize,
}

/// What the device actually opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Total device buffer: the floored minimum, doubled for headroom.
    pub buffer_frames: usize,
}

impl DeviceConfig {
    /// Size the buffer from the device's reported minimum.
    pub fn sized(request: &DeviceRequest, reported_min_frames: usize) -> Self {
        let floored = reported_min_frames.max(request.min_buffer_frames).max(1);
        Self {
            sample_rate: request.sample_rate,
            channels: request.channels,
            buffer_frames: floored * 2,
        }
    }

    /// Frames produced per write: half the device buffer.
    pub fn chunk_frames(&self) -> usize {
        (self.buffer_frames / 2).max(1)
    }

    /// Interleaved samples produced per write.
    pub fn chunk_samples(&self) -> usize {
        self.chunk_frames() * self.channels as usize
    }
}

/// Producer half of an output device. `write` blocks until the device has room.
pub trait PcmWriter: Send {
    fn write(&mut self, samples: &[i16]) -> Result<(), DeviceError>;
}

/// An open output device. Dropping it releases the OS resource.
pub trait OutputDevice {
    fn config(&self) -> &DeviceConfig;

    /// Take the writer feeding this device. Only one writer exists per device.
    fn writer(&mut self) -> Result<Box<dyn PcmWriter>, DeviceError>;
}

pub trait DeviceFactory: Send + Sync {
    fn open(&self, request: &DeviceRequest) -> Result<Box<dyn OutputDevice>, DeviceError>;
}

/// Opens the default output device of the default cpal host.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalDeviceFactory;

impl DeviceFactory for CpalDeviceFactory {
    fn open(&self, request: &DeviceRequest) -> Result<Box<dyn OutputDevice>, DeviceError> {
        let device = CpalOutputDevice::new(request)?;
        Ok(Box::new(device))
    }
}

pub struct CpalOutputDevice {
    config: DeviceConfig,
    writer: Option<ChannelWriter>,
    _stream: cpal::Stream,
}

impl CpalOutputDevice {
    pub fn new(request: &DeviceRequest) -> Result<Self, DeviceError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(DeviceError::NoDevice)?;

        let rate = cpal::SampleRate(request.sample_rate);
        let ranges: Vec<_> = device
            .supported_output_configs()?
            .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
            .collect();

        // Prefer the exact channel count in native i16, then any format, then anything
        // we can up- or down-mix into
        let range = ranges
            .iter()
            .find(|r| r.channels() == request.channels && r.sample_format() == cpal::SampleFormat::I16)
            .or_else(|| ranges.iter().find(|r| r.channels() == request.channels))
            .or_else(|| ranges.iter().find(|r| r.channels() > request.channels))
            .or_else(|| ranges.first())
            .cloned()
            .ok_or(DeviceError::UnsupportedConfig {
                sample_rate: request.sample_rate,
                channels: request.channels,
            })?;

        let supported = range.with_sample_rate(rate);
        let reported_min = match supported.buffer_size() {
            SupportedBufferSize::Range { min, .. } => *min as usize,
            SupportedBufferSize::Unknown => 0,
        };
        let config = DeviceConfig::sized(request, reported_min);

        let (filled_tx, filled_rx) = channel::bounded::<Vec<i16>>(QUEUED_CHUNKS);
        let (recycled_tx, recycled_rx) = channel::bounded::<Vec<i16>>(QUEUED_CHUNKS + 1);
        let reader = ChunkReader {
            filled: filled_rx,
            recycled: recycled_tx,
            current: Vec::new(),
            position: 0,
            source_channels: request.channels as usize,
        };

        let stream_config: cpal::StreamConfig = supported.config();
        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => Self::run::<f32>(&device, &stream_config, reader)?,
            cpal::SampleFormat::I16 => Self::run::<i16>(&device, &stream_config, reader)?,
            cpal::SampleFormat::U16 => Self::run::<u16>(&device, &stream_config, reader)?,
            _ => {
                return Err(DeviceError::UnsupportedConfig {
                    sample_rate: request.sample_rate,
                    channels: request.channels,
                })
            }
        };

        stream.play()?;

        debug!(
            "Opened output device: {} Hz, {} source channel(s) into {} device channel(s), {} frame buffer",
            config.sample_rate, config.channels, stream_config.channels, config.buffer_frames
        );

        Ok(Self {
            config,
            writer: Some(ChannelWriter {
                filled: filled_tx,
                recycled: recycled_rx,
                chunk_samples: config.chunk_samples(),
            }),
            _stream: stream,
        })
    }

    fn run<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mut reader: ChunkReader,
    ) -> Result<cpal::Stream, cpal::BuildStreamError>
    where
        T: Sample + SizedSample + FromSample<i16>,
    {
        let channels = config.channels as usize;

        device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    match reader.next_frame() {
                        Some((left, right)) => {
                            if channels >= 2 {
                                frame[0] = T::from_sample(left);
                                frame[1] = T::from_sample(right);
                            } else {
                                let mono = ((left as i32 + right as i32) / 2) as i16;
                                frame[0] = T::from_sample(mono);
                            }
                            for sample in frame.iter_mut().skip(2) {
                                *sample = T::EQUILIBRIUM;
                            }
                        }
                        // Underrun: fill with silence
                        None => frame.fill(T::EQUILIBRIUM),
                    }
                }
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
    }
}

impl OutputDevice for CpalOutputDevice {
    fn config(&self) -> &DeviceConfig {
        &self.config
    }

    fn writer(&mut self) -> Result<Box<dyn PcmWriter>, DeviceError> {
        let writer = self.writer.take().ok_or(DeviceError::Other("writer already taken".into()))?;
        Ok(Box::new(writer))
    }
}

impl Drop for CpalOutputDevice {
    fn drop(&mut self) {
        debug!("Releasing output device");
    }
}

/// Writer half: hands filled chunks to the device callback.
struct ChannelWriter {
    filled: Sender<Vec<i16>>,
    recycled: Receiver<Vec<i16>>,
    chunk_samples: usize,
}

impl PcmWriter for ChannelWriter {
    fn write(&mut self, samples: &[i16]) -> Result<(), DeviceError> {
        // Reuse a chunk the callback has finished with when one is available
        let mut chunk = self
            .recycled
            .try_recv()
            .unwrap_or_else(|_| Vec::with_capacity(self.chunk_samples.max(samples.len())));
        chunk.clear();
        chunk.extend_from_slice(samples);

        match self.filled.send_timeout(chunk, WRITE_TIMEOUT) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Disconnected(_)) => Err(DeviceError::Disconnected),
            Err(SendTimeoutError::Timeout(_)) => {
                Err(DeviceError::Other("device stopped consuming audio".into()))
            }
        }
    }
}

/// Callback half: walks queued chunks frame by frame.
struct ChunkReader {
    filled: Receiver<Vec<i16>>,
    recycled: Sender<Vec<i16>>,
    current: Vec<i16>,
    position: usize,
    source_channels: usize,
}

impl ChunkReader {
    /// Next (left, right) source frame; mono sources feed both sides.
    fn next_frame(&mut self) -> Option<(i16, i16)> {
        if self.position + self.source_channels > self.current.len() {
            let next = self.filled.try_recv().ok()?;
            let spent = std::mem::replace(&mut self.current, next);
            // Dropping the chunk is fine if the writer has enough spares
            let _ = self.recycled.try_send(spent);
            self.position = 0;
            if self.current.len() < self.source_channels {
                return None;
            }
        }

        let left = self.current[self.position];
        let right = if self.source_channels >= 2 {
            self.current[self.position + 1]
        } else {
            left
        };
        self.position += self.source_channels;
        Some((left, right))
    }
}
