//! Real audio output through cpal.
//!
//! The backend owns the output stream. The engine lives in a shared slot the
//! stream callback renders from; the callback never blocks on it (a busy or
//! empty slot produces silence for that buffer).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info};

use crate::{
    error::BackendError,
    graph::node::{NodeId, NodeKind},
    io::backend::{AudioBackend, BackendState, NodeFactory},
    synth::engine::Engine,
    MAX_BLOCK_SIZE,
};

type EngineSlot = Arc<Mutex<Option<Engine>>>;

pub struct CpalBackend {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
    stream: Option<cpal::Stream>,
    running: Arc<AtomicBool>,
    closed: bool,
    slot: EngineSlot,
    live_nodes: Arc<AtomicUsize>,
}

impl CpalBackend {
    /// Open the named output device, or the default one.
    pub fn open(device_name: Option<&str>) -> Result<Self, BackendError> {
        let host = cpal::default_host();
        debug!(host = ?host.id(), "opening audio host");

        let device = match device_name {
            Some(wanted) => host
                .output_devices()
                .map_err(|e| BackendError::Unavailable(e.to_string()))?
                .find(|device| device.name().is_ok_and(|name| name == wanted))
                .ok_or_else(|| BackendError::Unavailable(format!("no output device {wanted:?}")))?,
            None => host
                .default_output_device()
                .ok_or_else(|| BackendError::Unavailable("no default output device".into()))?,
        };

        let config = device
            .default_output_config()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = config.sample_rate().0,
            channels = config.channels(),
            format = ?config.sample_format(),
            "audio output opened"
        );

        Ok(Self {
            device,
            config,
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
            closed: false,
            slot: Arc::new(Mutex::new(None)),
            live_nodes: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn device_name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "unknown".into())
    }

    pub fn channels(&self) -> u16 {
        self.config.channels()
    }

    /// Hand a started engine to the audio callback.
    pub fn install(&self, engine: Engine) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(engine);
    }

    /// Take the engine back from the audio callback.
    pub fn uninstall(&self) -> Option<Engine> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Nodes created through this backend and not yet released.
    pub fn live_nodes(&self) -> usize {
        self.live_nodes.load(Ordering::Relaxed)
    }

    /// Stop the stream for good.
    pub fn close(&mut self) {
        self.stream = None;
        self.running.store(false, Ordering::Release);
        self.closed = true;
    }

    fn build_stream<T>(&self) -> Result<cpal::Stream, BackendError>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = usize::from(self.config.channels());
        let slot = Arc::clone(&self.slot);
        let running = Arc::clone(&self.running);
        let mut mix = vec![0.0f32; MAX_BLOCK_SIZE * channels];

        self.device
            .build_output_stream(
                &self.config.config(),
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    running.store(true, Ordering::Release);
                    if mix.len() < data.len() {
                        mix.resize(data.len(), 0.0);
                    }
                    let buffer = &mut mix[..data.len()];

                    match slot.try_lock() {
                        Ok(mut guard) => match guard.as_mut() {
                            Some(engine) => {
                                // A failed render has already written silence.
                                let _ = engine.render_interleaved(buffer, channels);
                            }
                            None => buffer.fill(0.0),
                        },
                        Err(_) => buffer.fill(0.0),
                    }

                    for (out, &sample) in data.iter_mut().zip(buffer.iter()) {
                        *out = T::from_sample(sample);
                    }
                },
                |err| error!(%err, "audio stream error"),
                None,
            )
            .map_err(|e| BackendError::Stream(e.to_string()))
    }
}

impl AudioBackend for CpalBackend {
    fn state(&self) -> BackendState {
        if self.closed {
            BackendState::Closed
        } else if self.running.load(Ordering::Acquire) {
            BackendState::Running
        } else {
            BackendState::Suspended
        }
    }

    fn sample_rate(&self) -> f32 {
        self.config.sample_rate().0 as f32
    }

    fn resume(&mut self) -> Result<(), BackendError> {
        if self.closed {
            return Err(BackendError::Unavailable("output stream is closed".into()));
        }

        if self.stream.is_none() {
            let stream = match self.config.sample_format() {
                cpal::SampleFormat::F32 => self.build_stream::<f32>()?,
                cpal::SampleFormat::I16 => self.build_stream::<i16>()?,
                cpal::SampleFormat::U16 => self.build_stream::<u16>()?,
                other => {
                    return Err(BackendError::Unavailable(format!(
                        "unsupported sample format {other:?}"
                    )))
                }
            };
            self.stream = Some(stream);
        }

        if let Some(stream) = &self.stream {
            stream
                .play()
                .map_err(|e| BackendError::Stream(e.to_string()))?;
        }
        Ok(())
    }

    fn node_factory(&self) -> Box<dyn NodeFactory> {
        Box::new(CountingFactory {
            live: Arc::clone(&self.live_nodes),
        })
    }
}

/// Nodes are plain Rust values here; the factory only keeps count.
struct CountingFactory {
    live: Arc<AtomicUsize>,
}

impl NodeFactory for CountingFactory {
    fn create_node(&mut self, _kind: NodeKind, _id: NodeId) -> Result<(), BackendError> {
        self.live.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn release_node(&mut self, _kind: NodeKind, _id: NodeId) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}
