// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::process::ExitCode;
use std::thread::sleep;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use vkbd::keycodes::{KEY_A, KEY_SPACE};
use vkbd::virtual_keyboard::UINPUT_PATH;
use vkbd::{EventSink, VirtualKeyboard};
use vkbd_tests::readback::{expect_events, expect_silence, keystroke, open_event_node};
use vkbd_tests::test_log::TestLog;

const READ_TIMEOUT: Duration = Duration::from_secs(2);
const NODE_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    /// Six times KEY_A on "Example keyboard"
    Example,
    /// Two keyboards; closing one leaves the other working
    Independent,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, value_enum, default_value_t = Scenario::Example)]
    scenario: Scenario,

    /// uinput device path (with /dev/)
    #[arg(long, default_value = UINPUT_PATH)]
    dev_path: String,
}

fn example(dev_path: &str) -> anyhow::Result<TestLog> {
    let mut log = TestLog::new("example");
    let mut vkbd =
        VirtualKeyboard::open_at(dev_path, "Example keyboard").context("failed to create keyboard")?;
    let mut reader = open_event_node(&vkbd, NODE_DEADLINE).context("no event node")?;

    // allow userspace to detect the device
    sleep(Duration::from_secs(1));

    let mut expected = Vec::new();
    for _ in 0..6 {
        vkbd.press_and_release(KEY_A)?;
        expected.extend(keystroke(KEY_A));
    }
    expect_events(&mut reader, &expected, READ_TIMEOUT, &mut log)?;

    vkbd.close().context("failed to destroy keyboard")?;
    Ok(log)
}

fn independent(dev_path: &str) -> anyhow::Result<TestLog> {
    let mut log = TestLog::new("independent");
    let first = VirtualKeyboard::open_at(dev_path, "vkbd first").context("failed to create first")?;
    let mut second =
        VirtualKeyboard::open_at(dev_path, "vkbd second").context("failed to create second")?;
    let mut reader = open_event_node(&second, NODE_DEADLINE).context("no event node")?;

    info!("closing '{}'", first.name());
    first.close()?;

    second.press_and_release(KEY_SPACE)?;
    expect_events(&mut reader, &keystroke(KEY_SPACE), READ_TIMEOUT, &mut log)?;
    if !expect_silence(&mut reader, Duration::from_millis(200))? {
        anyhow::bail!("'{}' delivered more than one keystroke", second.name());
    }

    second.close()?;
    Ok(log)
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let log = match args.scenario {
        Scenario::Example => example(&args.dev_path)?,
        Scenario::Independent => independent(&args.dev_path)?,
    };

    println!("Event log: {}", serde_json::to_string(&log)?);
    if log.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
