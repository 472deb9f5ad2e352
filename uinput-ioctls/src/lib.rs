// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use libc::{c_char, c_uint};
use libc::uinput_setup;

use nix::{
    ioctl_none, ioctl_read, ioctl_read_buf, ioctl_write_int, ioctl_write_ptr, request_code_none,
    request_code_read, request_code_write,
};

// uinput (include/uapi/linux/uinput.h)
pub const UI_DEV_CREATE: u64 = request_code_none!(b'U', 1);
pub const UI_DEV_DESTROY: u64 = request_code_none!(b'U', 2);
pub const UI_DEV_SETUP: u64 = request_code_write!(b'U', 3, ::std::mem::size_of::<uinput_setup>());
pub const UI_GET_VERSION: u64 = request_code_read!(b'U', 45, ::std::mem::size_of::<c_uint>());
pub const UI_SET_EVBIT: u64 = request_code_write!(b'U', 100, std::mem::size_of::<c_uint>());
pub const UI_SET_KEYBIT: u64 = request_code_write!(b'U', 101, std::mem::size_of::<c_uint>());

// evdev (include/uapi/linux/input.h)
//#define EVIOCGRAB _IOW('E', 0x90, int)
pub const EVIOCGRAB: u64 = request_code_write!(b'E', 0x90, std::mem::size_of::<libc::c_int>());

ioctl_none!(ui_dev_create, b'U', 1);
ioctl_none!(ui_dev_destroy, b'U', 2);
ioctl_write_ptr! {ui_dev_setup, b'U', 3, uinput_setup}

ioctl_read_buf! { ui_get_sysname, b'U', 44, c_char }
ioctl_read! { ui_get_version, b'U', 45, c_uint }

ioctl_write_int!(ui_set_evbit, b'U', 100);
ioctl_write_int!(ui_set_keybit, b'U', 101);

// 1 grabs the device exclusively, 0 releases it
ioctl_write_int!(eviocgrab, b'E', 0x90);

#[cfg(all(test, target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64")))]
mod tests {
    use super::*;

    #[test]
    fn request_codes_match_kernel_headers() {
        assert_eq!(UI_DEV_CREATE, 0x5501);
        assert_eq!(UI_DEV_DESTROY, 0x5502);
        assert_eq!(UI_DEV_SETUP, 0x405c5503);
        assert_eq!(UI_GET_VERSION, 0x8004552d);
        assert_eq!(UI_SET_EVBIT, 0x40045564);
        assert_eq!(UI_SET_KEYBIT, 0x40045565);
        assert_eq!(EVIOCGRAB, 0x40044590);
    }
}
