// SPDX-License-Identifier: MIT
// vkbd: command line front end for the virtual keyboard and device passthrough
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use vkbd::keycodes::{name_from_code, parse_key};
use vkbd::virtual_keyboard::{DEFAULT_DEVICE_NAME, UINPUT_PATH};
use vkbd::{forward, EventSink, ForwardPolicy, PhysicalInputHandle, VirtualKeyboard};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a virtual keyboard and type one key a number of times
    Type {
        /// Device name announced to the kernel (at most 79 bytes)
        #[arg(long, default_value = DEFAULT_DEVICE_NAME)]
        name: String,

        /// Key name (A, ENTER, KEY_LEFTSHIFT) or numeric code
        #[arg(long, default_value = "A", value_parser = parse_key)]
        key: u16,

        #[arg(long, default_value_t = 6)]
        count: usize,

        /// Time for userspace to pick up the new device before and after typing
        #[arg(long, default_value_t = 1000)]
        settle_ms: u64,

        /// uinput device path (with /dev/)
        #[arg(long, default_value = UINPUT_PATH)]
        dev_path: PathBuf,
    },

    /// Read a physical device and re-emit its events on a virtual keyboard
    Passthrough {
        /// Input device node, e.g. /dev/input/event5
        #[arg(long)]
        device: PathBuf,

        /// Replace the code of every key event with this key
        #[arg(long, value_parser = parse_key)]
        remap_to: Option<u16>,

        #[arg(
            long,
            help = "Grab the device exclusively while forwarding.",
            long_help = "Grab the device exclusively (EVIOCGRAB) while forwarding.\n\
                 No other program, including the desktop, receives its events until the\n\
                 grab is released. Combine with --events or --timeout-ms so it ends."
        )]
        grab: bool,

        /// Number of events to forward
        #[arg(long, default_value_t = 30)]
        events: usize,

        /// Stop when the device stays silent this long
        #[arg(long)]
        timeout_ms: Option<u64>,

        #[arg(long, default_value = "test_vkbd")]
        name: String,
    },

    /// Grab a device exclusively for a while, then release it
    Grab {
        #[arg(long)]
        device: PathBuf,

        #[arg(long, default_value_t = 2000)]
        hold_ms: u64,
    },

    /// Print the codes of pressed keys
    Watch {
        #[arg(long)]
        device: PathBuf,

        #[arg(long, default_value_t = 5)]
        count: usize,
    },
}

fn type_key(
    name: &str,
    key: u16,
    count: usize,
    settle: Duration,
    dev_path: &Path,
) -> anyhow::Result<()> {
    let mut vkbd = VirtualKeyboard::open_at(dev_path, name)
        .with_context(|| format!("failed to create virtual keyboard on {}", dev_path.display()))?;
    info!("created virtual keyboard '{}'", vkbd.name());

    // allow userspace to detect the device
    sleep(settle);

    for _ in 0..count {
        vkbd.press_and_release(key)
            .with_context(|| format!("failed to type key {}", key))?;
    }
    info!(
        "typed {} x {}",
        count,
        name_from_code(key).unwrap_or("UNKNOWN")
    );

    // give userspace time to read events
    sleep(settle);

    vkbd.close().context("failed to destroy virtual keyboard")?;
    Ok(())
}

fn passthrough(
    device: &Path,
    remap_to: Option<u16>,
    grab: bool,
    events: usize,
    timeout: Option<Duration>,
    name: &str,
) -> anyhow::Result<()> {
    let mut source = PhysicalInputHandle::open(device)
        .with_context(|| format!("failed to open {}", device.display()))?;
    let mut vkbd = VirtualKeyboard::open(name).context("failed to create virtual keyboard")?;

    sleep(Duration::from_secs(1));

    if grab {
        source.set_exclusive(true)?;
    }

    let policy = match remap_to {
        Some(code) => ForwardPolicy::RemapKeys(code),
        None => ForwardPolicy::Passthrough,
    };
    info!("forwarding up to {} events from {} ({:?})", events, device.display(), policy);
    let stats = forward(&mut source, &mut vkbd, policy, events, timeout)?;
    info!(
        "read {} events, forwarded {}, remapped {}",
        stats.read, stats.forwarded, stats.remapped
    );

    if grab {
        source.set_exclusive(false)?;
    }
    sleep(Duration::from_secs(1));

    vkbd.close().context("failed to destroy virtual keyboard")?;
    Ok(())
}

fn grab_device(device: &Path, hold: Duration) -> anyhow::Result<()> {
    let mut source = PhysicalInputHandle::open(device)
        .with_context(|| format!("failed to open {}", device.display()))?;

    sleep(Duration::from_secs(1));
    info!("start grab of {}", device.display());
    source.set_exclusive(true)?;
    sleep(hold);
    source.set_exclusive(false)?;
    info!("end grab of {}", device.display());
    Ok(())
}

fn watch(device: &Path, count: usize) -> anyhow::Result<()> {
    let mut source = PhysicalInputHandle::open(device)
        .with_context(|| format!("failed to open {}", device.display()))?;

    for _ in 0..count {
        let code = source.wait_for_key_down()?;
        println!("push! {} ({})", code, name_from_code(code).unwrap_or("UNKNOWN"));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.command {
        Command::Type {
            name,
            key,
            count,
            settle_ms,
            dev_path,
        } => type_key(&name, key, count, Duration::from_millis(settle_ms), &dev_path),
        Command::Passthrough {
            device,
            remap_to,
            grab,
            events,
            timeout_ms,
            name,
        } => passthrough(
            &device,
            remap_to,
            grab,
            events,
            timeout_ms.map(Duration::from_millis),
            &name,
        ),
        Command::Grab { device, hold_ms } => grab_device(&device, Duration::from_millis(hold_ms)),
        Command::Watch { device, count } => watch(&device, count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn type_defaults_match_the_example_program() {
        let args = Args::try_parse_from(["vkbd", "type"]).unwrap();
        match args.command {
            Command::Type {
                name, key, count, ..
            } => {
                assert_eq!(name, "virtual_keyboard");
                assert_eq!(key, 30);
                assert_eq!(count, 6);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn passthrough_parses_key_names() {
        let args = Args::try_parse_from([
            "vkbd",
            "passthrough",
            "--device",
            "/dev/input/event5",
            "--remap-to",
            "KEY_A",
            "--grab",
        ])
        .unwrap();
        match args.command {
            Command::Passthrough { remap_to, grab, events, .. } => {
                assert_eq!(remap_to, Some(30));
                assert!(grab);
                assert_eq!(events, 30);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(Args::try_parse_from(["vkbd", "type", "--key", "NOTAKEY"]).is_err());
    }
}
