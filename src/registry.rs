//! Integer handles for host applications that cannot hold a `Session`.
//!
//! Sessions live in a slot table. A [`Handle`] packs the slot index with the
//! slot's generation, so a handle kept after `close` never reaches whatever
//! session reuses the slot. Zero is never issued.

use std::fmt;

use serialport::SerialPort;
use tracing::debug;

use crate::config::LinkConfig;
use crate::error::{LinkError, Result};
use crate::session::Session;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    fn new(index: u32, generation: u32) -> Self {
        Handle((u64::from(generation) << 32) | u64::from(index))
    }

    /// Rebuilds a handle from the integer a host passed back.
    pub fn from_raw(raw: u64) -> Self {
        Handle(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }

    fn index(self) -> usize {
        (self.0 & 0xffff_ffff) as usize
    }

    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index(), self.generation())
    }
}

struct Slot<T: Transport> {
    generation: u32,
    session: Option<Session<T>>,
}

/// Live sessions addressed by [`Handle`].
///
/// Methods take `&mut self`; callers sharing a table across threads must
/// wrap it in their own lock.
pub struct SessionTable<T: Transport = Box<dyn SerialPort>> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    config: LinkConfig,
}

impl SessionTable<Box<dyn SerialPort>> {
    /// Opens a serial session at `baud_rate`, using the table's timing.
    pub fn open(&mut self, port_name: &str, baud_rate: u32) -> Result<Handle> {
        let config = LinkConfig {
            baud_rate,
            ..self.config.clone()
        };
        let session = Session::open(port_name, config)?;
        Ok(self.insert(session))
    }
}

impl<T: Transport> SessionTable<T> {
    pub fn new(config: LinkConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            config,
        }
    }

    /// Starts a session on an already-open transport, draining it first.
    pub fn open_with(&mut self, port: T) -> Handle {
        let session = Session::start(port, self.config.clone());
        self.insert(session)
    }

    // Only reached from `open` and `open_with`, which always hand over an
    // open session.
    fn insert(&mut self, session: Session<T>) -> Handle {
        debug_assert!(session.is_open());
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index].session = Some(session);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 1,
                    session: Some(session),
                });
                self.slots.len() - 1
            }
        };
        let handle = Handle::new(index as u32, self.slots[index].generation);
        debug!(%handle, "registered session");
        handle
    }

    /// Closes the session and retires its handle.
    pub fn close(&mut self, handle: Handle) -> Result<()> {
        let index = handle.index();
        let slot = self.live_slot(handle)?;
        let mut session = slot.session.take().ok_or(LinkError::BadHandle)?;
        slot.generation = match slot.generation.wrapping_add(1) {
            0 => 1,
            g => g,
        };
        self.free.push(index);
        debug!(%handle, "retired session handle");
        session.close()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut Session<T>> {
        self.live_slot(handle)?
            .session
            .as_mut()
            .ok_or(LinkError::BadHandle)
    }

    pub fn send_raw(&mut self, handle: Handle, command: &str) -> Result<()> {
        self.get_mut(handle)?.send_raw(command)
    }

    pub fn run(&mut self, handle: Handle, time: &str, power_percent: u8) -> Result<()> {
        self.get_mut(handle)?.run(time, power_percent)
    }

    pub fn stop(&mut self, handle: Handle) -> Result<()> {
        self.get_mut(handle)?.stop()
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live_slot(&mut self, handle: Handle) -> Result<&mut Slot<T>> {
        match self.slots.get_mut(handle.index()) {
            Some(slot) if slot.generation == handle.generation() && slot.session.is_some() => {
                Ok(slot)
            }
            _ => Err(LinkError::BadHandle),
        }
    }
}

impl<T: Transport> Default for SessionTable<T> {
    fn default() -> Self {
        Self::new(LinkConfig::default())
    }
}
