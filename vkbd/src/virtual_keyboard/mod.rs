// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod device_name;
pub mod key_tracker;
pub mod sink;

use std::ffi::CStr;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::os::fd::{AsRawFd, IntoRawFd};
use std::os::raw::c_char;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use libc::{c_uint, uinput_setup, O_NONBLOCK};
use log::{debug, warn};
use uinput_ioctls::*;

use crate::error::{Error, Result, SetupPhase};
use crate::input_event::{BUS_USB, EV_KEY, KEY_MAX};
pub use device_name::{DeviceName, DEVICE_NAME_MAX_LEN};
pub use key_tracker::KeyTracker;
pub use sink::{EventSink, EventWriter};

pub const UINPUT_PATH: &str = "/dev/uinput";
pub const DEFAULT_DEVICE_NAME: &str = "virtual_keyboard";
pub const SYS_INPUT_DIR: &str = "/sys/devices/virtual/input/";

/// A keyboard registered with the kernel through uinput.
///
/// Every key code below KEY_MAX is enabled. The device is removed from the
/// kernel by `close`, or by `Drop` if the owner never calls it.
#[derive(Debug)]
pub struct VirtualKeyboard {
    writer: Option<EventWriter<File>>,
    name: DeviceName,
}

impl VirtualKeyboard {
    pub fn open(name: &str) -> Result<Self> {
        Self::open_at(UINPUT_PATH, name)
    }

    /// Like `open`, against another uinput node (for example a mediated one).
    pub fn open_at<P: AsRef<Path>>(uinput_path: P, name: &str) -> Result<Self> {
        // nothing is opened for a name the kernel buffer cannot hold
        let name = DeviceName::new(name)?;

        // matches: open("/dev/uinput", O_WRONLY | O_NONBLOCK);
        let file = OpenOptions::new()
            .write(true)
            .custom_flags(O_NONBLOCK)
            .open(uinput_path.as_ref())?;
        debug!("opened {}", uinput_path.as_ref().display());

        // on error `file` is dropped here and the handle closed
        register_keyboard(&file, &name)?;
        debug!("virtual keyboard '{}' created", name);

        Ok(VirtualKeyboard {
            writer: Some(EventWriter::new(file)),
            name,
        })
    }

    pub fn name(&self) -> &DeviceName {
        &self.name
    }

    fn file(&self) -> Result<&File> {
        self.writer
            .as_ref()
            .map(EventWriter::get_ref)
            .ok_or_else(closed_error)
    }

    /// Kernel name of the device, e.g. `input42`.
    pub fn sysname(&self) -> Result<String> {
        let mut resultbuf: [c_char; 64] = [0; 64];
        unsafe { ui_get_sysname(self.file()?.as_raw_fd(), resultbuf.as_mut_slice()) }
            .map_err(|e| Error::Io(e.into()))?;
        let sysname = unsafe { CStr::from_ptr(resultbuf.as_ptr()) };
        Ok(sysname.to_string_lossy().into_owned())
    }

    /// uinput protocol version of the running kernel.
    pub fn uinput_version(&self) -> Result<u32> {
        read_uinput_version(self.file()?)
    }

    /// Path of the `/dev/input/eventN` node that delivers this device's events.
    ///
    /// udev may need a moment after creation before the node exists.
    pub fn devnode(&self) -> Result<PathBuf> {
        let syspath = PathBuf::from(SYS_INPUT_DIR).join(self.sysname()?);
        fetch_device_node(&syspath)
    }

    /// Releases the device: UI_DEV_DESTROY, then close the handle.
    pub fn close(mut self) -> Result<()> {
        match self.writer.take() {
            Some(writer) => destroy(writer.into_inner()),
            None => Ok(()),
        }
    }
}

impl EventSink for VirtualKeyboard {
    fn emit_raw(&mut self, type_: u16, code: u16, value: i32) -> Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.emit_raw(type_, code, value),
            None => Err(closed_error()),
        }
    }
}

impl Drop for VirtualKeyboard {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = destroy(writer.into_inner()) {
                warn!("failed to release virtual keyboard '{}': {}", self.name, e);
            }
        }
    }
}

// `close` and `drop` take the writer and both own `self`, so this is not
// reachable through the public API
fn closed_error() -> Error {
    Error::Io(io::Error::new(
        ErrorKind::NotConnected,
        "virtual keyboard already closed",
    ))
}

/// Capability registration, identity, publish. Order matters: the kernel
/// refuses UI_DEV_CREATE for a device without capabilities.
fn register_keyboard(file: &File, name: &DeviceName) -> Result<()> {
    let fd = file.as_raw_fd();

    match read_uinput_version(file) {
        Ok(version) => debug!("ioctl UI_GET_VERSION {}", version),
        // UI_GET_VERSION only exists since uinput 5
        Err(e) => debug!("ioctl UI_GET_VERSION failed: {}", e),
    }

    unsafe {
        ui_set_evbit(fd, EV_KEY.into()).map_err(|source| Error::Unsupported {
            phase: SetupPhase::EventCapability,
            source,
        })?;

        for code in 0..KEY_MAX {
            ui_set_keybit(fd, code.into()).map_err(|source| Error::Unsupported {
                phase: SetupPhase::KeyCapability(code),
                source,
            })?;
        }
    }
    debug!("enabled EV_KEY and key codes 0..{}", KEY_MAX);

    let mut usetup: uinput_setup = unsafe { std::mem::zeroed() };
    usetup.id.bustype = BUS_USB;
    // 0 means unspecified, the device is virtual
    usetup.id.vendor = 0;
    usetup.id.product = 0;
    name.write_to(&mut usetup.name);

    unsafe {
        ui_dev_setup(fd, &usetup).map_err(|source| Error::Unsupported {
            phase: SetupPhase::Identity,
            source,
        })?;

        ui_dev_create(fd).map_err(|source| Error::Unsupported {
            phase: SetupPhase::Publish,
            source,
        })?;
    }
    Ok(())
}

fn read_uinput_version(file: &File) -> Result<u32> {
    let mut version: c_uint = 0;
    unsafe { ui_get_version(file.as_raw_fd(), &mut version) }.map_err(|e| Error::Io(e.into()))?;
    Ok(version)
}

fn destroy(file: File) -> Result<()> {
    let destroyed = unsafe { ui_dev_destroy(file.as_raw_fd()) };
    let fd = file.into_raw_fd();
    // close even if destroy failed; the kernel removes the device with the last handle
    let closed = unsafe { libc::close(fd) };
    destroyed.map_err(Error::Teardown)?;
    if closed == -1 {
        return Err(io::Error::last_os_error().into());
    }
    debug!("virtual keyboard destroyed");
    Ok(())
}

fn fetch_device_node(syspath: &Path) -> Result<PathBuf> {
    for entry in fs::read_dir(syspath)? {
        let entry = entry?; // propagate per-entry errors
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with("event") {
                return Ok(PathBuf::from("/dev/input").join(name));
            }
        }
    }
    // If no device is found, return an error
    Err(io::Error::new(
        ErrorKind::NotFound,
        format!("no event node below {}", syspath.display()),
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_name_fails_before_touching_the_node() {
        // the path does not exist, so reaching open() would yield NotFound
        let name = "x".repeat(200);
        let err = VirtualKeyboard::open_at("/nonexistent/uinput", &name).unwrap_err();
        assert!(matches!(err, Error::NameTooLong { len: 200, max: 79 }));
    }

    #[test]
    fn missing_node_is_not_found() {
        let err = VirtualKeyboard::open_at("/nonexistent/uinput", "Example keyboard").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "{:?}", err);
    }

    #[test]
    fn plain_file_is_rejected_at_capability_setup() {
        let path = std::env::temp_dir().join(format!("vkbd-not-uinput-{}", std::process::id()));
        File::create(&path).unwrap();

        let err = VirtualKeyboard::open_at(&path, "Example keyboard").unwrap_err();
        let _ = fs::remove_file(&path);

        // ioctls on a regular file fail with ENOTTY
        assert!(
            matches!(
                err,
                Error::Unsupported {
                    phase: SetupPhase::EventCapability,
                    ..
                }
            ),
            "{:?}",
            err
        );
    }

    #[test]
    fn version_query_on_plain_file_is_io_error() {
        let path = std::env::temp_dir().join(format!("vkbd-version-{}", std::process::id()));
        let file = File::create(&path).unwrap();
        let res = read_uinput_version(&file);
        let _ = fs::remove_file(&path);
        assert!(matches!(res, Err(Error::Io(_))));
    }

    #[test]
    fn device_node_lookup_picks_event_entry() {
        let dir = std::env::temp_dir().join(format!("vkbd-sys-{}", std::process::id()));
        fs::create_dir_all(dir.join("mouse0")).unwrap();
        fs::create_dir_all(dir.join("event17")).unwrap();

        let node = fetch_device_node(&dir);
        let _ = fs::remove_dir_all(&dir);

        assert_eq!(node.unwrap(), PathBuf::from("/dev/input/event17"));
    }

    #[test]
    fn device_node_lookup_without_event_entry_is_not_found() {
        let dir = std::env::temp_dir().join(format!("vkbd-sys-empty-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let node = fetch_device_node(&dir);
        let _ = fs::remove_dir_all(&dir);

        assert!(matches!(node, Err(Error::NotFound(_))));
    }
}
