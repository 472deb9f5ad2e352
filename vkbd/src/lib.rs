// SPDX-License-Identifier: MIT
// vkbd: virtual keyboard over /dev/uinput and passthrough of physical input devices
//
// - Creates a keyboard device through uinput and emits synchronized key frames.
// - Opens /dev/input/eventN, optionally grabs it, and re-emits its events.
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod error;
pub mod input_event;
pub mod keycodes;
pub mod passthrough;
pub mod virtual_keyboard;

pub use error::{Error, Result, SetupPhase};
pub use input_event::InputEvent;
pub use passthrough::{forward, ForwardPolicy, ForwardStats, PhysicalInputHandle};
pub use virtual_keyboard::{EventSink, KeyTracker, VirtualKeyboard};
