// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use libc::{c_char, UINPUT_MAX_NAME_SIZE};

use crate::error::{Error, Result};

/// Longest name in bytes; the kernel buffer also holds the terminator.
pub const DEVICE_NAME_MAX_LEN: usize = UINPUT_MAX_NAME_SIZE - 1;

/// Identity string of a virtual device, checked against the kernel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceName(String);

impl DeviceName {
    pub fn new(name: &str) -> Result<Self> {
        if name.len() > DEVICE_NAME_MAX_LEN {
            return Err(Error::NameTooLong {
                len: name.len(),
                max: DEVICE_NAME_MAX_LEN,
            });
        }
        if name.as_bytes().contains(&0) {
            return Err(Error::InvalidName);
        }
        Ok(DeviceName(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Copies the name into `uinput_setup::name`, NUL padded.
    pub fn write_to(&self, buf: &mut [c_char; UINPUT_MAX_NAME_SIZE]) {
        buf.fill(0);
        for (dst, src) in buf.iter_mut().zip(self.0.as_bytes()) {
            *dst = *src as c_char;
        }
    }
}

impl std::fmt::Display for DeviceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
