// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::io::{self, Write};

use log::trace;

use crate::error::Result;
use crate::input_event::{InputEvent, INPUT_EVENT_SIZE, KEY_PRESSED, KEY_RELEASED};

/// Destination for input event records.
///
/// Only `emit_raw` needs to be implemented. The provided methods add the
/// frame structure: a key record is always followed by a sync record.
pub trait EventSink {
    /// Writes one record verbatim. Does not end the frame.
    fn emit_raw(&mut self, type_: u16, code: u16, value: i32) -> Result<()>;

    fn emit_event(&mut self, event: &InputEvent) -> Result<()> {
        self.emit_raw(event.type_, event.code, event.value)
    }

    /// Key record followed by EV_SYN/SYN_REPORT, so listeners see one frame.
    fn emit_key(&mut self, code: u16, value: i32) -> Result<()> {
        let key = InputEvent::key(code, value);
        let sync = InputEvent::sync();
        self.emit_event(&key)?;
        self.emit_event(&sync)
    }

    /// A full keystroke: two frames, key-down then key-up.
    fn press_and_release(&mut self, code: u16) -> Result<()> {
        self.emit_key(code, KEY_PRESSED)?;
        self.emit_key(code, KEY_RELEASED)
    }
}

/// Encodes records into any writer using the kernel layout.
///
/// Each record goes out in a single `write` call. uinput only accepts whole
/// records, so a partial write is reported as an error instead of retried.
#[derive(Debug)]
pub struct EventWriter<W: Write> {
    inner: W,
}

impl<W: Write> EventWriter<W> {
    pub fn new(inner: W) -> Self {
        EventWriter { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> EventSink for EventWriter<W> {
    fn emit_raw(&mut self, type_: u16, code: u16, value: i32) -> Result<()> {
        let bytes = InputEvent::new(type_, code, value).to_bytes();
        let written = self.inner.write(&bytes)?;
        if written != INPUT_EVENT_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("wrote {} of {} bytes", written, INPUT_EVENT_SIZE),
            )
            .into());
        }
        trace!("emitted type {} code {} value {}", type_, code, value);
        Ok(())
    }
}

/// In-memory recorder.
impl EventSink for Vec<InputEvent> {
    fn emit_raw(&mut self, type_: u16, code: u16, value: i32) -> Result<()> {
        self.push(InputEvent::new(type_, code, value));
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit_raw(&mut self, type_: u16, code: u16, value: i32) -> Result<()> {
        (**self).emit_raw(type_, code, value)
    }
}
