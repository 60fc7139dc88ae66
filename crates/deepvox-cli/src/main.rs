//! deepvox - headless control surface for the voice changer engine
//!
//! Starts the duplex audio engine, loads the soundboard, and drives both
//! from a line-based stdin loop. This is the minimal engine boundary
//! exerciser; a GUI would talk to the same `EngineSystem` surface.
//!
//! ## Command line flags
//!
//! - `--config <path>`: use a specific YAML config (default `~/.deepvox/config.yaml`)
//! - `--list-devices`: print capture/playback devices and exit

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use deepvox_core::audio::{list_devices, start_engine, Direction, EngineSystem};
use deepvox_core::config::{default_config_path, load_config};
use deepvox_core::engine::{ControlCommand, EngineEvent};
use deepvox_core::{EngineConfig, RunState, SoundLibrary};

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--list-devices") {
        return print_devices();
    }

    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| PathBuf::from(&w[1]))
        .unwrap_or_else(default_config_path);
    let config: EngineConfig = load_config(&config_path);

    log::info!("deepvox starting up");

    let system = start_engine(&config).context("Failed to start the audio engine")?;
    spawn_fault_watchdog(&system);

    // Decode the soundboard at the rate the devices actually negotiated.
    let mut library = SoundLibrary::load(&config.soundboard_path(), system.sample_rate)
        .context("Failed to load the soundboard")?;

    println!("deepvox running: {}Hz, {} frame blocks", system.sample_rate, system.buffer_size);
    println!("Drop effect files into {}", library.dir().display());
    print_help();

    run_repl(system, &mut library)
}

fn run_repl(mut system: EngineSystem, library: &mut SoundLibrary) -> Result<()> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        drain_events(&mut system);
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next() else { break };
        let line = line.context("Failed to read stdin")?;
        let mut words = line.split_whitespace();

        match words.next() {
            Some("pitch") => match words.next().and_then(|w| w.parse::<f32>().ok()) {
                Some(semitones) => {
                    send(&mut system, ControlCommand::SetPitch { semitones });
                }
                None => println!("usage: pitch <semitones in [-12, 0]>"),
            },
            Some("play") => match words.next().and_then(|w| w.parse::<usize>().ok()) {
                Some(index) => match library.get(index) {
                    Some(effect) => {
                        println!("Playing '{}'", effect.name);
                        send(&mut system, ControlCommand::Trigger { effect, gain: 1.0 });
                    }
                    None => println!("No effect #{index} (see `list`)"),
                },
                None => println!("usage: play <effect index>"),
            },
            Some("list") => {
                if library.is_empty() {
                    println!("Soundboard is empty: {}", library.dir().display());
                }
                for (i, effect) in library.effects().iter().enumerate() {
                    println!("  {:>3}  {}  ({:.2}s)", i, effect.name, effect.duration_secs());
                }
            }
            Some("refresh") => match library.refresh() {
                Ok(count) => println!("Soundboard reloaded: {count} effect(s)"),
                Err(e) => println!("Refresh failed: {e}"),
            },
            Some("stopall") => send(&mut system, ControlCommand::StopAllVoices),
            Some("status") => print_status(&system),
            Some("help") => print_help(),
            Some("quit") | Some("stop") | Some("exit") => break,
            Some(other) => println!("Unknown command '{other}' (try `help`)"),
            None => {}
        }
    }

    log::info!("Stopping engine");
    system.stop();
    Ok(())
}

/// Watch for a fatal stream fault while the REPL blocks on stdin.
///
/// Losing a device flips the run state to `Stopping` from the stream's
/// error callback; nothing will deliver another block after that, so exit
/// instead of sitting at a dead prompt.
fn spawn_fault_watchdog(system: &EngineSystem) {
    let atomics = std::sync::Arc::clone(&system.atomics);
    std::thread::spawn(move || loop {
        if atomics.run_state() == RunState::Stopping && atomics.fault() {
            log::error!("Audio device lost, shutting down");
            eprintln!("Audio device lost - exiting");
            std::process::exit(1);
        }
        std::thread::sleep(std::time::Duration::from_millis(250));
    });
}

/// Push a command, reporting a full ring instead of silently dropping.
fn send(system: &mut EngineSystem, command: ControlCommand) {
    if system.commands.send(command).is_err() {
        println!("Engine is busy, command dropped - try again");
    }
}

fn drain_events(system: &mut EngineSystem) {
    while let Some(event) = system.events.try_recv() {
        match event {
            EngineEvent::VoicePoolFull => {
                println!("All voice slots busy - effect not played");
            }
        }
    }
}

fn print_status(system: &EngineSystem) {
    let atomics = &system.atomics;
    println!("  state:      {:?}", atomics.run_state());
    println!("  pitch:      {:+.1} semitones", atomics.pitch_semitones());
    println!("  voices:     {}", atomics.active_voices());
    println!("  underruns:  {}", atomics.underruns());
    if atomics.fault() {
        println!("  fault:      stream error reported, check the log");
    }
}

fn print_help() {
    println!("Commands:");
    println!("  pitch <semitones>   set voice shift, -12 (octave down) to 0 (off)");
    println!("  play <index>        trigger a soundboard effect");
    println!("  list                show loaded effects");
    println!("  refresh             re-scan the soundboard directory");
    println!("  stopall             cut all playing effects");
    println!("  status              engine state, pitch, voices, underruns");
    println!("  quit                stop the engine and exit");
}

fn print_devices() -> Result<()> {
    for (direction, title) in [(Direction::Input, "Capture"), (Direction::Output, "Playback")] {
        println!("{title} devices:");
        let devices = list_devices(direction).context("Device enumeration failed")?;
        for dev in devices {
            let marker = if dev.is_default { "*" } else { " " };
            println!("  {marker} [{}] {} ({} ch)", dev.host, dev.name, dev.max_channels);
        }
    }
    println!("\n(* = system default; set names in the config to override)");
    Ok(())
}
