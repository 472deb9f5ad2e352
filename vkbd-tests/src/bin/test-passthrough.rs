// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::process::ExitCode;
use std::thread::sleep;
use std::time::Duration;

use anyhow::Context;
use log::info;
use vkbd::keycodes::{KEY_A, KEY_Q};
use vkbd::{forward, EventSink, ForwardPolicy, PhysicalInputHandle, VirtualKeyboard};
use vkbd_tests::readback::{expect_events, expect_silence, keystroke, open_event_node};
use vkbd_tests::test_log::TestLog;

const READ_TIMEOUT: Duration = Duration::from_secs(2);
const NODE_DEADLINE: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(300);

/// Grab, release, then forward with a remap. A second virtual keyboard
/// stands in for the physical one so the run needs no hardware.
fn run(log: &mut TestLog) -> anyhow::Result<()> {
    let mut source = VirtualKeyboard::open("vkbd passthrough source").context("source keyboard")?;
    let mut grabber = open_event_node(&source, NODE_DEADLINE).context("source node")?;
    let mut listener = PhysicalInputHandle::open(grabber.path()).context("second reader")?;
    sleep(Duration::from_millis(500));

    info!("grabbing {}", grabber.path().display());
    grabber.set_exclusive(true)?;
    source.press_and_release(KEY_Q)?;
    expect_events(&mut grabber, &keystroke(KEY_Q), READ_TIMEOUT, log)?;
    if !expect_silence(&mut listener, QUIET)? {
        anyhow::bail!("events leaked past the grab");
    }

    grabber.set_exclusive(false)?;
    source.press_and_release(KEY_Q)?;
    expect_events(&mut grabber, &keystroke(KEY_Q), READ_TIMEOUT, log)?;
    expect_events(&mut listener, &keystroke(KEY_Q), READ_TIMEOUT, log)?;
    drop(grabber);

    let mut sink = VirtualKeyboard::open("vkbd passthrough sink").context("sink keyboard")?;
    let mut sink_reader = open_event_node(&sink, NODE_DEADLINE).context("sink node")?;
    sleep(Duration::from_millis(500));

    source.press_and_release(KEY_Q)?;
    let stats = forward(
        &mut listener,
        &mut sink,
        ForwardPolicy::RemapKeys(KEY_A),
        4,
        Some(READ_TIMEOUT),
    )?;
    info!("forward: {:?}", stats);
    expect_events(&mut sink_reader, &keystroke(KEY_A), READ_TIMEOUT, log)?;

    sink.close()?;
    source.close()?;
    Ok(())
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut log = TestLog::new("passthrough");
    run(&mut log)?;

    println!("Event log: {}", serde_json::to_string(&log)?);
    if log.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
