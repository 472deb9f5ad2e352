// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::time::Duration;

use log::{debug, trace};

use super::PhysicalInputHandle;
use crate::error::Result;
use crate::input_event::{InputEvent, EV_KEY};
use crate::virtual_keyboard::EventSink;

/// How events read from a physical device are rewritten before re-emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForwardPolicy {
    /// Forward everything unchanged.
    #[default]
    Passthrough,
    /// Every EV_KEY record gets this code. All other types pass unchanged.
    RemapKeys(u16),
}

impl ForwardPolicy {
    pub fn apply(&self, event: InputEvent) -> InputEvent {
        match self {
            ForwardPolicy::Passthrough => event,
            ForwardPolicy::RemapKeys(code) if event.type_ == EV_KEY => InputEvent {
                code: *code,
                ..event
            },
            ForwardPolicy::RemapKeys(_) => event,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ForwardStats {
    pub read: usize,
    pub forwarded: usize,
    pub remapped: usize,
}

/// Reads up to `limit` events from `source` and re-emits each through `sink`.
///
/// Records are forwarded one by one with `emit_raw`: the source's own sync
/// markers frame the output. With a `timeout`, forwarding stops early once
/// no event arrives within it; without one every read blocks.
pub fn forward<S: EventSink>(
    source: &mut PhysicalInputHandle,
    sink: &mut S,
    policy: ForwardPolicy,
    limit: usize,
    timeout: Option<Duration>,
) -> Result<ForwardStats> {
    let mut stats = ForwardStats::default();

    while stats.read < limit {
        let event = match timeout {
            Some(timeout) => match source.read_event_timeout(timeout)? {
                Some(event) => event,
                None => {
                    debug!("no event within {:?}, stopping", timeout);
                    break;
                }
            },
            None => source.read_event()?,
        };
        stats.read += 1;

        let out = policy.apply(event);
        if out.code != event.code {
            stats.remapped += 1;
        }
        trace!("forward {} -> {}", event, out);
        sink.emit_event(&out)?;
        stats.forwarded += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_event::{EV_MSC, MSC_SCAN};
    use crate::keycodes::{KEY_A, KEY_Q, KEY_Z};
    use crate::passthrough::fake_device;
    use std::io::Write;

    fn keystroke(code: u16) -> Vec<InputEvent> {
        vec![
            InputEvent::new(EV_MSC, MSC_SCAN, 0x70014),
            InputEvent::key(code, 1),
            InputEvent::sync(),
            InputEvent::new(EV_MSC, MSC_SCAN, 0x70014),
            InputEvent::key(code, 0),
            InputEvent::sync(),
        ]
    }

    #[test]
    fn remap_touches_only_key_records() {
        let policy = ForwardPolicy::RemapKeys(KEY_A);
        assert_eq!(policy.apply(InputEvent::key(KEY_Q, 1)), InputEvent::key(KEY_A, 1));
        assert_eq!(policy.apply(InputEvent::sync()), InputEvent::sync());

        let scan = InputEvent::new(EV_MSC, MSC_SCAN, 0x70014);
        assert_eq!(policy.apply(scan), scan);
    }

    #[test]
    fn passthrough_keeps_everything() {
        let ev = InputEvent::key(KEY_Z, 2);
        assert_eq!(ForwardPolicy::Passthrough.apply(ev), ev);
    }

    #[test]
    fn forwards_up_to_limit_with_remap() {
        let (mut dev, mut kernel) = fake_device();
        for ev in keystroke(KEY_Q).iter().chain(keystroke(KEY_Z).iter()) {
            kernel.write_all(&ev.to_bytes()).unwrap();
        }

        let mut out: Vec<InputEvent> = Vec::new();
        let stats = forward(&mut dev, &mut out, ForwardPolicy::RemapKeys(KEY_A), 6, None).unwrap();

        assert_eq!(
            stats,
            ForwardStats {
                read: 6,
                forwarded: 6,
                remapped: 2
            }
        );
        let keys: Vec<_> = out.iter().filter(|e| e.is_key()).map(|e| (e.code, e.value)).collect();
        assert_eq!(keys, vec![(KEY_A, 1), (KEY_A, 0)]);
        assert_eq!(out.iter().filter(|e| e.is_sync()).count(), 2);
    }

    #[test]
    fn stops_on_timeout() {
        let (mut dev, mut kernel) = fake_device();
        for ev in keystroke(KEY_Q) {
            kernel.write_all(&ev.to_bytes()).unwrap();
        }

        let mut out: Vec<InputEvent> = Vec::new();
        let stats = forward(
            &mut dev,
            &mut out,
            ForwardPolicy::Passthrough,
            30,
            Some(Duration::from_millis(50)),
        )
        .unwrap();

        assert_eq!(stats.read, 6);
        assert_eq!(stats.remapped, 0);
        assert_eq!(out, keystroke(KEY_Q));
    }

    #[test]
    fn forwarded_timestamps_are_cleared() {
        let (mut dev, mut kernel) = fake_device();
        let stamped = InputEvent {
            tv_sec: 99,
            tv_usec: 1,
            ..InputEvent::key(KEY_Q, 1)
        };
        kernel.write_all(&stamped.to_bytes()).unwrap();

        let mut out: Vec<InputEvent> = Vec::new();
        forward(&mut dev, &mut out, ForwardPolicy::Passthrough, 1, None).unwrap();
        assert_eq!(out, vec![InputEvent::key(KEY_Q, 1)]);
    }
}
