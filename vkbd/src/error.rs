// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::fmt;
use std::io;

use thiserror::Error;

/// Registration step of a virtual device that the kernel rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupPhase {
    /// UI_SET_EVBIT(EV_KEY)
    EventCapability,
    /// UI_SET_KEYBIT for the given key code
    KeyCapability(u16),
    /// UI_DEV_SETUP
    Identity,
    /// UI_DEV_CREATE
    Publish,
}

impl fmt::Display for SetupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupPhase::EventCapability => write!(f, "capability setup (EV_KEY)"),
            SetupPhase::KeyCapability(code) => write!(f, "capability setup (key {})", code),
            SetupPhase::Identity => write!(f, "identity registration"),
            SetupPhase::Publish => write!(f, "publish"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("permission denied: {0}")]
    Permission(#[source] io::Error),

    #[error("device node not found: {0}")]
    NotFound(#[source] io::Error),

    #[error("device name is {len} bytes, the kernel accepts at most {max}")]
    NameTooLong { len: usize, max: usize },

    #[error("device name contains a NUL byte")]
    InvalidName,

    #[error("kernel rejected {phase}: {source}")]
    Unsupported {
        phase: SetupPhase,
        #[source]
        source: nix::Error,
    },

    #[error("failed to {} exclusive grab: {source}", grab_direction(.enabled))]
    Grab {
        enabled: bool,
        #[source]
        source: nix::Error,
    },

    #[error("failed to destroy virtual device: {0}")]
    Teardown(#[source] nix::Error),

    #[error("i/o error: {0}")]
    Io(#[source] io::Error),
}

fn grab_direction(enabled: &bool) -> &'static str {
    if *enabled {
        "acquire"
    } else {
        "release"
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Error::Permission(err),
            io::ErrorKind::NotFound => Error::NotFound(err),
            _ => Error::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
