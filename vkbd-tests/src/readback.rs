// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::thread::sleep;
use std::time::{Duration, Instant};

use log::{debug, warn};
use vkbd::input_event::{KEY_PRESSED, KEY_RELEASED};
use vkbd::{InputEvent, PhysicalInputHandle, VirtualKeyboard};

use crate::test_log::{LoggedInputEvent, TestLog};

/// The four records of one keystroke: down, sync, up, sync.
pub fn keystroke(code: u16) -> [InputEvent; 4] {
    [
        InputEvent::key(code, KEY_PRESSED),
        InputEvent::sync(),
        InputEvent::key(code, KEY_RELEASED),
        InputEvent::sync(),
    ]
}

/// Opens the event node of a freshly created virtual keyboard.
///
/// udev creates the node asynchronously, so this polls until `deadline`.
pub fn open_event_node(vkbd: &VirtualKeyboard, deadline: Duration) -> vkbd::Result<PhysicalInputHandle> {
    let start = Instant::now();
    loop {
        let attempt = vkbd.devnode().and_then(PhysicalInputHandle::open);
        match attempt {
            Ok(handle) => {
                debug!("reading back from {}", handle.path().display());
                return Ok(handle);
            }
            Err(e) if start.elapsed() < deadline => {
                debug!("event node not ready yet: {}", e);
                sleep(Duration::from_millis(50));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Reads one record per expected event and logs whether it matches.
///
/// Stops at the first read that times out; the log then falls short of
/// `expected` and does not pass.
pub fn expect_events(
    reader: &mut PhysicalInputHandle,
    expected: &[InputEvent],
    timeout: Duration,
    log: &mut TestLog,
) -> vkbd::Result<()> {
    log.expected += expected.len();
    for want in expected {
        match reader.read_event_timeout(timeout)? {
            Some(got) => log.events.push(LoggedInputEvent::new(&got, want)),
            None => {
                warn!("timed out waiting for {}", want);
                return Ok(());
            }
        }
    }
    Ok(())
}

/// True if nothing arrives within `timeout`.
pub fn expect_silence(reader: &mut PhysicalInputHandle, timeout: Duration) -> vkbd::Result<bool> {
    match reader.read_event_timeout(timeout)? {
        Some(ev) => {
            warn!("unexpected event {}", ev);
            Ok(false)
        }
        None => Ok(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keystroke_is_two_synced_frames() {
        let frames = keystroke(30);
        assert_eq!(frames[0], InputEvent::key(30, 1));
        assert!(frames[1].is_sync());
        assert_eq!(frames[2], InputEvent::key(30, 0));
        assert!(frames[3].is_sync());
    }
}
