//! In-memory audio backend that records stream lifecycle events.

use crate::audio::backend::{AudioBackend, AudioStream, BlockCallback};
use crate::audio::queue::SampleQueue;
use crate::audio::{DeviceRole, StreamSpec};
use crate::error::{Result, VuloopError};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    OpenInput(String),
    OpenOutput(String),
    CloseInput(String),
    CloseOutput(String),
    Play(String),
}

#[derive(Default)]
struct FakeState {
    events: Vec<Event>,
    failing: HashSet<String>,
    callbacks: Vec<BlockCallback>,
    queues: Vec<Arc<SampleQueue>>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Rc<RefCell<FakeState>>,
}

impl FakeBackend {
    pub fn failing(names: &[&str]) -> Self {
        let backend = Self::default();
        backend.set_failing(names);
        backend
    }

    pub fn set_failing(&self, names: &[&str]) {
        self.state.borrow_mut().failing = names.iter().map(|n| n.to_string()).collect();
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    /// Simulate the driver invoking the callback of the nth opened input
    pub fn deliver(&self, nth: usize, block: &[i16]) {
        let mut state = self.state.borrow_mut();
        let callback = &mut state.callbacks[nth];
        callback(block);
    }

    pub fn queue(&self, nth: usize) -> Arc<SampleQueue> {
        self.state.borrow().queues[nth].clone()
    }

    fn open(&self, role: DeviceRole, device: Option<&str>) -> Result<FakeStream> {
        let name = device.unwrap_or("default").to_string();
        if self.state.borrow().failing.contains(&name) {
            return Err(VuloopError::AudioDeviceNotFound(name));
        }
        let event = match role {
            DeviceRole::Input => Event::OpenInput(name.clone()),
            DeviceRole::Output => Event::OpenOutput(name.clone()),
        };
        self.state.borrow_mut().events.push(event);
        Ok(FakeStream {
            name,
            role,
            state: self.state.clone(),
        })
    }
}

pub struct FakeStream {
    name: String,
    role: DeviceRole,
    state: Rc<RefCell<FakeState>>,
}

impl AudioStream for FakeStream {
    fn play(&self) -> Result<()> {
        self.state
            .borrow_mut()
            .events
            .push(Event::Play(self.name.clone()));
        Ok(())
    }

    fn device_name(&self) -> &str {
        &self.name
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        let event = match self.role {
            DeviceRole::Input => Event::CloseInput(self.name.clone()),
            DeviceRole::Output => Event::CloseOutput(self.name.clone()),
        };
        self.state.borrow_mut().events.push(event);
    }
}

impl AudioBackend for FakeBackend {
    type Input = FakeStream;
    type Output = FakeStream;

    fn open_input(
        &self,
        device: Option<&str>,
        _spec: &StreamSpec,
        on_block: BlockCallback,
    ) -> Result<FakeStream> {
        let stream = self.open(DeviceRole::Input, device)?;
        self.state.borrow_mut().callbacks.push(on_block);
        Ok(stream)
    }

    fn open_output(
        &self,
        device: Option<&str>,
        _spec: &StreamSpec,
        queue: Arc<SampleQueue>,
    ) -> Result<FakeStream> {
        let stream = self.open(DeviceRole::Output, device)?;
        self.state.borrow_mut().queues.push(queue);
        Ok(stream)
    }
}
