// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod forward;

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, trace, warn};
use uinput_ioctls::eviocgrab;

use crate::error::{Error, Result};
use crate::input_event::{InputEvent, EV_KEY, EV_MSC, EV_SYN, INPUT_EVENT_SIZE};
pub use forward::{forward, ForwardPolicy, ForwardStats};

/// Open handle to a physical input device node such as `/dev/input/event5`.
///
/// While grabbed, the kernel delivers this device's events to nobody else.
/// A held grab is released when the handle is dropped.
#[derive(Debug)]
pub struct PhysicalInputHandle {
    file: File,
    path: PathBuf,
    grabbed: bool,
}

impl PhysicalInputHandle {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        debug!("opened input device {}", path.display());
        Ok(PhysicalInputHandle {
            file,
            path,
            grabbed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_exclusive(&self) -> bool {
        self.grabbed
    }

    /// EVIOCGRAB: `true` takes the device away from every other listener,
    /// including the desktop. `false` hands it back.
    pub fn set_exclusive(&mut self, enabled: bool) -> Result<()> {
        unsafe { eviocgrab(self.file.as_raw_fd(), if enabled { 1 } else { 0 }) }
            .map_err(|source| Error::Grab { enabled, source })?;
        self.grabbed = enabled;
        debug!(
            "{} {}",
            if enabled { "grabbed" } else { "released" },
            self.path.display()
        );
        Ok(())
    }

    /// Blocks until the kernel delivers the next record.
    pub fn read_event(&mut self) -> Result<InputEvent> {
        let mut buf = [0u8; INPUT_EVENT_SIZE];
        let n = self.file.read(&mut buf)?;
        if n != INPUT_EVENT_SIZE {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("read {} of {} bytes", n, INPUT_EVENT_SIZE),
            )
            .into());
        }
        let event = InputEvent::from_bytes(&buf);
        trace!("read {}", event);
        Ok(event)
    }

    /// Waits at most `timeout` for the next record; `None` if none arrived.
    pub fn read_event_timeout(&mut self, timeout: Duration) -> Result<Option<InputEvent>> {
        if !wait_readable(&self.file, timeout)? {
            return Ok(None);
        }
        self.read_event().map(Some)
    }

    /// Drops events until a key-down (`value == 1`) arrives and returns its code.
    ///
    /// Releases, repeats and sync markers are consumed and lost.
    pub fn wait_for_key_down(&mut self) -> Result<u16> {
        loop {
            let event = self.read_event()?;
            if event.value == 1 {
                return Ok(event.code);
            }
        }
    }

    /// Drops events until one of the given type arrives.
    pub fn read_when_type_is(&mut self, type_: u16) -> Result<InputEvent> {
        loop {
            let event = self.read_event()?;
            if event.type_ == type_ {
                return Ok(event);
            }
        }
    }

    pub fn read_key(&mut self) -> Result<InputEvent> {
        self.read_when_type_is(EV_KEY)
    }

    pub fn read_syn(&mut self) -> Result<InputEvent> {
        self.read_when_type_is(EV_SYN)
    }

    pub fn read_msc(&mut self) -> Result<InputEvent> {
        self.read_when_type_is(EV_MSC)
    }
}

impl Drop for PhysicalInputHandle {
    fn drop(&mut self) {
        if self.grabbed {
            if let Err(e) = self.set_exclusive(false) {
                warn!("{}: {}", self.path.display(), e);
            }
        }
    }
}

/// Handle over one end of a socket pair; the other end plays the kernel.
#[cfg(test)]
pub(crate) fn fake_device() -> (PhysicalInputHandle, std::os::unix::net::UnixStream) {
    let (ours, theirs) = std::os::unix::net::UnixStream::pair().unwrap();
    let handle = PhysicalInputHandle {
        file: File::from(std::os::fd::OwnedFd::from(ours)),
        path: PathBuf::from("/dev/input/event-test"),
        grabbed: false,
    };
    (handle, theirs)
}

/// poll(2) for readability. EINTR counts as "nothing arrived".
fn wait_readable(file: &File, timeout: Duration) -> Result<bool> {
    let mut pfd = libc::pollfd {
        fd: file.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    let timeout_ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

    let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
    if rc < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err.into());
    }
    if pfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0
        && pfd.revents & libc::POLLIN == 0
    {
        return Err(io::Error::new(ErrorKind::BrokenPipe, "input device went away").into());
    }
    Ok(rc > 0)
}
