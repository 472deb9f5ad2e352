// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use serde::{Deserialize, Serialize};
use vkbd::InputEvent;

/// One record as it came back from the kernel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggedInputEvent {
    pub tv_sec: i64,

    pub tv_usec: i64,

    pub type_: u16,

    pub code: u16,

    pub value: i32,

    pub send_and_receive_match: bool,
}

impl LoggedInputEvent {
    pub fn new(received: &InputEvent, expected: &InputEvent) -> Self {
        LoggedInputEvent {
            tv_sec: received.tv_sec,
            tv_usec: received.tv_usec,
            type_: received.type_,
            code: received.code,
            value: received.value,
            send_and_receive_match: received.without_time() == expected.without_time(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct TestLog {
    pub scenario: String,
    pub expected: usize,
    pub events: Vec<LoggedInputEvent>,
}

impl TestLog {
    pub fn new(scenario: &str) -> Self {
        TestLog {
            scenario: scenario.to_string(),
            ..Default::default()
        }
    }

    pub fn passed(&self) -> bool {
        self.events.len() == self.expected && self.events.iter().all(|e| e.send_and_receive_match)
    }
}
