// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::fmt;
use std::mem::size_of;

use libc::input_event;

// event types and codes from https://github.com/torvalds/linux/blob/master/include/uapi/linux/input-event-codes.h

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_REL: u16 = 0x02;
pub const EV_ABS: u16 = 0x03;
pub const EV_MSC: u16 = 0x04;
pub const EV_LED: u16 = 0x11;
pub const EV_REP: u16 = 0x14;

pub const SYN_REPORT: u16 = 0;
pub const MSC_SCAN: u16 = 0x04;

pub const KEY_MAX: u16 = 0x2ff;

pub const BUS_USB: u16 = 0x03;

/// Key values carried in `InputEvent::value` for EV_KEY.
pub const KEY_RELEASED: i32 = 0;
pub const KEY_PRESSED: i32 = 1;
pub const KEY_REPEATED: i32 = 2;

/// Size of one kernel event record (`struct input_event`).
pub const INPUT_EVENT_SIZE: usize = size_of::<input_event>();

/// One kernel input notification.
///
/// The wire representation is `struct input_event` from `linux/input.h`:
/// ```text
/// struct input_event {
///   struct timeval time;
///   __u16 type;
///   __u16 code;
///   __s32 value;
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputEvent {
    pub type_: u16,
    pub code: u16,
    pub value: i32,
    pub tv_sec: i64,
    pub tv_usec: i64,
}

impl InputEvent {
    /// Event with a zeroed timestamp, as written to uinput.
    pub const fn new(type_: u16, code: u16, value: i32) -> Self {
        InputEvent {
            type_,
            code,
            value,
            tv_sec: 0,
            tv_usec: 0,
        }
    }

    pub const fn key(code: u16, value: i32) -> Self {
        InputEvent::new(EV_KEY, code, value)
    }

    pub const fn sync() -> Self {
        InputEvent::new(EV_SYN, SYN_REPORT, 0)
    }

    pub fn is_key(&self) -> bool {
        self.type_ == EV_KEY
    }

    pub fn is_sync(&self) -> bool {
        self.type_ == EV_SYN && self.code == SYN_REPORT
    }

    pub fn is_key_down(&self) -> bool {
        self.value == KEY_PRESSED
    }

    /// Same event with the timestamp cleared.
    pub fn without_time(self) -> Self {
        InputEvent {
            tv_sec: 0,
            tv_usec: 0,
            ..self
        }
    }

    pub fn to_raw(&self) -> input_event {
        // time fields are ignored by the kernel for synthetic events
        let mut ie: input_event = unsafe { std::mem::zeroed() };
        ie.time.tv_sec = self.tv_sec as libc::time_t;
        ie.time.tv_usec = self.tv_usec as libc::suseconds_t;
        ie.type_ = self.type_; // note: in libc the field is `type_`
        ie.code = self.code;
        ie.value = self.value;
        ie
    }

    pub fn from_raw(ie: &input_event) -> Self {
        InputEvent {
            type_: ie.type_,
            code: ie.code,
            value: ie.value,
            tv_sec: ie.time.tv_sec as i64,
            tv_usec: ie.time.tv_usec as i64,
        }
    }

    /// Encodes the event into the exact byte layout the kernel expects.
    pub fn to_bytes(&self) -> [u8; INPUT_EVENT_SIZE] {
        let raw = self.to_raw();
        let mut buf = [0u8; INPUT_EVENT_SIZE];
        // SAFETY: input_event is a plain repr(C) struct without padding on
        // supported targets and buf has exactly its size.
        unsafe {
            std::ptr::copy_nonoverlapping(
                &raw as *const input_event as *const u8,
                buf.as_mut_ptr(),
                INPUT_EVENT_SIZE,
            );
        }
        buf
    }

    pub fn from_bytes(buf: &[u8; INPUT_EVENT_SIZE]) -> Self {
        // SAFETY: every bit pattern is a valid input_event; read_unaligned
        // because a byte array has alignment 1.
        let raw: input_event =
            unsafe { std::ptr::read_unaligned(buf.as_ptr() as *const input_event) };
        InputEvent::from_raw(&raw)
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_name = match self.type_ {
            EV_SYN => "EV_SYN",
            EV_KEY => "EV_KEY",
            EV_REL => "EV_REL",
            EV_ABS => "EV_ABS",
            EV_MSC => "EV_MSC",
            EV_LED => "EV_LED",
            EV_REP => "EV_REP",
            _ => return write!(f, "type {:#x}\t{}\t{}", self.type_, self.value, self.code),
        };
        write!(f, "{}\t{}\t{}", type_name, self.value, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn record_matches_kernel_layout() {
        assert_eq!(INPUT_EVENT_SIZE, 24);

        let ev = InputEvent::key(30, KEY_PRESSED);
        let bytes = ev.to_bytes();

        // timeval is zeroed for emitted events
        assert!(bytes[..16].iter().all(|b| *b == 0));
        assert_eq!(&bytes[16..18], &EV_KEY.to_ne_bytes());
        assert_eq!(&bytes[18..20], &30u16.to_ne_bytes());
        assert_eq!(&bytes[20..24], &1i32.to_ne_bytes());
    }

    #[test]
    fn decoding_keeps_timestamp() {
        let ev = InputEvent {
            type_: EV_MSC,
            code: MSC_SCAN,
            value: 0x70004,
            tv_sec: 1_700_000_000,
            tv_usec: 123_456,
        };
        let decoded = InputEvent::from_bytes(&ev.to_bytes());
        assert_eq!(decoded, ev);
        assert_eq!(decoded.without_time(), InputEvent::new(EV_MSC, MSC_SCAN, 0x70004));
    }

    #[test]
    fn sync_is_report_boundary() {
        let sync = InputEvent::sync();
        assert!(sync.is_sync());
        assert!(!sync.is_key());
        assert_eq!(sync.value, 0);
        assert!(!InputEvent::new(EV_SYN, 2, 0).is_sync());
    }

    #[test]
    fn display_uses_type_names() {
        assert_eq!(InputEvent::key(30, 1).to_string(), "EV_KEY\t1\t30");
        assert_eq!(InputEvent::new(0x16, 0, 0).to_string(), "type 0x16\t0\t0");
    }
}
