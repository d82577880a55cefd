//! Microphone-to-speaker loopback with loudness metering.
//!
//! [`LoopbackMeter`] owns at most one input and one output stream. Every
//! block the input driver delivers is copied to the output's playback queue
//! and reduced to a loudness level for the display.
//!
//! The routing state shared with the driver thread sits behind a read/write
//! lock. Callbacks only `try_read` it, so the driver never waits on the
//! control thread. Closing a role takes the write lock, which cannot be
//! granted while a callback is in flight; once it is held the role is
//! detached and the stream can be dropped safely. Each opened input gets a
//! fresh generation number and its callback ignores blocks once that
//! generation is no longer live.

use crate::audio::backend::{AudioBackend, AudioStream, BlockCallback};
use crate::audio::level::{loudness_level, LevelSink};
use crate::audio::queue::{QueueStats, SampleQueue};
use crate::audio::{DeviceRole, DeviceSelection, StreamSpec};
use crate::error::{Result, VuloopError};
use parking_lot::RwLock;
use std::sync::Arc;

/// Default playback queue depth, in blocks
pub const DEFAULT_QUEUE_BLOCKS: usize = 4;

#[derive(Default)]
struct Routing {
    input_generation: Option<u64>,
    output: Option<Arc<SampleQueue>>,
}

/// Driver-side handler for one opened input stream
#[derive(Clone)]
pub struct BlockRouter {
    routing: Arc<RwLock<Routing>>,
    sink: Arc<dyn LevelSink>,
    generation: u64,
}

impl BlockRouter {
    /// Route one captured block: play it back, then publish its level
    pub fn on_block_captured(&self, block: &[i16]) {
        if block.is_empty() {
            return;
        }

        let Some(routing) = self.routing.try_read() else {
            tracing::trace!("Routing busy, skipping block of {} samples", block.len());
            return;
        };

        if routing.input_generation != Some(self.generation) {
            tracing::trace!("Ignoring block from closed input (gen {})", self.generation);
            return;
        }

        if let Some(queue) = &routing.output {
            if !queue.push_block(block) {
                tracing::trace!("Playback queue full, dropped part of block");
            }
        }

        if let Some(level) = loudness_level(block) {
            self.sink.set_level(level);
        }
    }
}

struct OpenStream<S> {
    selection: DeviceSelection,
    stream: S,
}

/// Owns the loopback's device streams
pub struct LoopbackMeter<B: AudioBackend> {
    backend: B,
    spec: StreamSpec,
    queue_blocks: usize,
    sink: Arc<dyn LevelSink>,
    routing: Arc<RwLock<Routing>>,
    input: Option<OpenStream<B::Input>>,
    output: Option<OpenStream<B::Output>>,
    output_queue: Option<Arc<SampleQueue>>,
    next_generation: u64,
    configured: bool,
    started: bool,
}

impl<B: AudioBackend> LoopbackMeter<B> {
    pub fn new(
        backend: B,
        spec: StreamSpec,
        queue_blocks: usize,
        sink: Arc<dyn LevelSink>,
    ) -> Self {
        Self {
            backend,
            spec,
            queue_blocks: queue_blocks.max(1),
            sink,
            routing: Arc::new(RwLock::new(Routing::default())),
            input: None,
            output: None,
            output_queue: None,
            next_generation: 1,
            configured: false,
            started: false,
        }
    }

    /// Bind the input and output roles, reopening only what changed.
    ///
    /// A role that fails to open is left without a stream; the other role is
    /// still configured. The first failure is returned.
    pub fn configure(&mut self, input: DeviceSelection, output: DeviceSelection) -> Result<()> {
        self.configured = true;

        let input_result = if self.input_matches(&input) {
            tracing::debug!("Input '{}' unchanged", input);
            Ok(())
        } else {
            self.reopen_input(input)
        };

        let output_result = if self.output_matches(&output) {
            tracing::debug!("Output '{}' unchanged", output);
            Ok(())
        } else {
            self.reopen_output(output)
        };

        match (input_result, output_result) {
            (Err(input_err), Err(_)) => Err(input_err),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    /// Start driver callbacks on the open streams. Idempotent.
    pub fn start(&mut self) -> Result<()> {
        if !self.configured {
            return Err(VuloopError::NotConfigured);
        }
        if self.started {
            return Ok(());
        }

        if self.input.is_none() {
            tracing::warn!("No input stream open, the meter will stay idle");
        }
        if let Some(output) = &self.output {
            output.stream.play()?;
        }
        if let Some(input) = &self.input {
            input.stream.play()?;
        }

        self.started = true;
        tracing::info!("Loopback started");
        Ok(())
    }

    /// Close both streams. Safe to call repeatedly; `configure` is required
    /// before the meter can be started again.
    pub fn shutdown(&mut self) {
        let had_streams = self.input.is_some() || self.output.is_some();
        self.close_input();
        self.close_output();
        self.configured = false;
        self.started = false;
        if had_streams {
            tracing::info!("Loopback shut down");
        }
    }

    fn input_matches(&self, selection: &DeviceSelection) -> bool {
        match &self.input {
            Some(open) => open.selection == *selection,
            None => selection.is_disabled(),
        }
    }

    fn output_matches(&self, selection: &DeviceSelection) -> bool {
        match &self.output {
            Some(open) => open.selection == *selection,
            None => selection.is_disabled(),
        }
    }

    fn reopen_input(&mut self, selection: DeviceSelection) -> Result<()> {
        self.close_input();
        if selection.is_disabled() {
            return Ok(());
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        let router = BlockRouter {
            routing: self.routing.clone(),
            sink: self.sink.clone(),
            generation,
        };
        let on_block: BlockCallback = Box::new(move |block| router.on_block_captured(block));

        let stream = self
            .backend
            .open_input(selection.name(), &self.spec, on_block)
            .map_err(|e| open_failure(DeviceRole::Input, &selection, e))?;

        self.routing.write().input_generation = Some(generation);

        if self.started {
            if let Err(e) = stream.play() {
                self.routing.write().input_generation = None;
                return Err(open_failure(DeviceRole::Input, &selection, e));
            }
        }

        tracing::info!("Opened input '{}'", stream.device_name());
        self.input = Some(OpenStream { selection, stream });
        Ok(())
    }

    fn reopen_output(&mut self, selection: DeviceSelection) -> Result<()> {
        self.close_output();
        if selection.is_disabled() {
            return Ok(());
        }

        let queue = Arc::new(SampleQueue::with_blocks(
            self.spec.block_samples * self.spec.channels as usize,
            self.queue_blocks,
        ));

        let stream = self
            .backend
            .open_output(selection.name(), &self.spec, queue.clone())
            .map_err(|e| open_failure(DeviceRole::Output, &selection, e))?;

        if self.started {
            stream
                .play()
                .map_err(|e| open_failure(DeviceRole::Output, &selection, e))?;
        }

        self.routing.write().output = Some(queue.clone());

        tracing::info!("Opened output '{}'", stream.device_name());
        self.output = Some(OpenStream { selection, stream });
        self.output_queue = Some(queue);
        Ok(())
    }

    fn close_input(&mut self) {
        if let Some(open) = self.input.take() {
            // Waits for any in-flight callback before detaching
            self.routing.write().input_generation = None;
            tracing::debug!("Closing input '{}'", open.stream.device_name());
            drop(open.stream);
        }
    }

    fn close_output(&mut self) {
        if let Some(open) = self.output.take() {
            self.routing.write().output = None;
            tracing::debug!("Closing output '{}'", open.stream.device_name());
            drop(open.stream);
        }
        self.output_queue = None;
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn input_device_name(&self) -> Option<&str> {
        self.input.as_ref().map(|open| open.stream.device_name())
    }

    pub fn output_device_name(&self) -> Option<&str> {
        self.output.as_ref().map(|open| open.stream.device_name())
    }

    pub fn is_open(&self, role: DeviceRole) -> bool {
        match role {
            DeviceRole::Input => self.input.is_some(),
            DeviceRole::Output => self.output.is_some(),
        }
    }

    pub fn spec(&self) -> &StreamSpec {
        &self.spec
    }

    /// Playback queue counters, if an output is open
    pub fn queue_stats(&self) -> Option<QueueStats> {
        self.output_queue.as_ref().map(|queue| queue.stats())
    }
}

impl<B: AudioBackend> Drop for LoopbackMeter<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn open_failure(role: DeviceRole, selection: &DeviceSelection, err: VuloopError) -> VuloopError {
    let err = VuloopError::DeviceOpen {
        role,
        device: selection.to_string(),
        reason: err.to_string(),
    };
    tracing::warn!("{}", err);
    err
}
