//! Platform audio layer seam.
//!
//! A backend opens streams; a stream is closed by dropping it. Once a stream
//! value has been dropped the backend must not invoke its callback again.

use crate::audio::queue::SampleQueue;
use crate::audio::StreamSpec;
use crate::error::Result;
use std::sync::Arc;

/// Invoked on the driver thread for every captured block
pub type BlockCallback = Box<dyn FnMut(&[i16]) + Send + 'static>;

/// An open device stream
pub trait AudioStream {
    /// Begin (or resume) driver callbacks. Must be idempotent.
    fn play(&self) -> Result<()>;

    /// Name of the device the stream was opened on
    fn device_name(&self) -> &str;
}

pub trait AudioBackend {
    type Input: AudioStream;
    type Output: AudioStream;

    /// Open a capture stream; `device` of `None` means the host default
    fn open_input(
        &self,
        device: Option<&str>,
        spec: &StreamSpec,
        on_block: BlockCallback,
    ) -> Result<Self::Input>;

    /// Open a playback stream that drains `queue`
    fn open_output(
        &self,
        device: Option<&str>,
        spec: &StreamSpec,
        queue: Arc<SampleQueue>,
    ) -> Result<Self::Output>;
}
