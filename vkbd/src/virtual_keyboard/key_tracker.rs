// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::collections::BTreeSet;

use log::debug;

use super::sink::EventSink;
use crate::error::Result;
use crate::input_event::{KEY_PRESSED, KEY_RELEASED, KEY_REPEATED};

/// Remembers which keys the program holds down on a sink.
///
/// Releases of keys that are not held are dropped, so a consumer never sees
/// a key-up without the matching key-down.
#[derive(Debug)]
pub struct KeyTracker<S: EventSink> {
    sink: S,
    pressed: BTreeSet<u16>,
}

impl<S: EventSink> KeyTracker<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            pressed: BTreeSet::new(),
        }
    }

    pub fn push(&mut self, code: u16) -> Result<()> {
        self.sink.emit_key(code, KEY_PRESSED)?;
        self.pressed.insert(code);
        Ok(())
    }

    pub fn leave(&mut self, code: u16) -> Result<()> {
        if !self.pressed.contains(&code) {
            return Ok(());
        }
        self.sink.emit_key(code, KEY_RELEASED)?;
        self.pressed.remove(&code);
        Ok(())
    }

    /// Autorepeat frame for a held key.
    pub fn repeat(&mut self, code: u16) -> Result<()> {
        self.sink.emit_key(code, KEY_REPEATED)
    }

    pub fn contains(&self, code: u16) -> bool {
        self.pressed.contains(&code)
    }

    pub fn pressed(&self) -> impl Iterator<Item = u16> + '_ {
        self.pressed.iter().copied()
    }

    /// Releases every held key, lowest code first.
    pub fn release_all(&mut self) -> Result<()> {
        while let Some(code) = self.pressed.first().copied() {
            debug!("releasing held key {}", code);
            self.leave(code)?;
        }
        Ok(())
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_event::InputEvent;
    use crate::keycodes::{KEY_A, KEY_LEFTSHIFT};

    #[test]
    fn tracks_pressed_keys() {
        let mut kbd = KeyTracker::new(Vec::<InputEvent>::new());
        kbd.push(KEY_LEFTSHIFT).unwrap();
        kbd.push(KEY_A).unwrap();
        assert!(kbd.contains(KEY_A));

        kbd.leave(KEY_A).unwrap();
        assert!(!kbd.contains(KEY_A));
        assert_eq!(kbd.pressed().collect::<Vec<_>>(), vec![KEY_LEFTSHIFT]);
        assert_eq!(kbd.sink().len(), 6);
    }

    #[test]
    fn leave_of_unheld_key_emits_nothing() {
        let mut kbd = KeyTracker::new(Vec::<InputEvent>::new());
        kbd.leave(KEY_A).unwrap();
        assert!(kbd.into_inner().is_empty());
    }

    #[test]
    fn repeat_is_a_synced_frame_with_value_two() {
        let mut kbd = KeyTracker::new(Vec::<InputEvent>::new());
        kbd.push(KEY_A).unwrap();
        kbd.repeat(KEY_A).unwrap();

        let events = kbd.into_inner();
        assert_eq!(events[2], InputEvent::key(KEY_A, 2));
        assert!(events[3].is_sync());
    }

    #[test]
    fn release_all_lifts_every_key() {
        let mut kbd = KeyTracker::new(Vec::<InputEvent>::new());
        kbd.push(KEY_A).unwrap();
        kbd.push(KEY_LEFTSHIFT).unwrap();
        kbd.release_all().unwrap();
        assert_eq!(kbd.pressed().count(), 0);

        let events = kbd.into_inner();
        assert_eq!(events[4], InputEvent::key(KEY_A, 0));
        assert_eq!(events[6], InputEvent::key(KEY_LEFTSHIFT, 0));
        assert_eq!(events.len(), 8);
    }
}
