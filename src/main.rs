// Hide console window on Windows for release builds (GUI app).
// Headless mode re-attaches to the parent console.
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use std::path::PathBuf;

use bevy::prelude::*;
use clap::Parser;
use colored::Colorize;

use ardice::ar_dice::{run_headless, ArDicePlugin, ArDiceSettings, HeadlessScript};

/// AR Dice - place dice on detected surfaces and roll them
#[derive(Parser)]
#[command(name = "ardice")]
#[command(
    author,
    version,
    about = "AR Dice - tap a detected surface to place a die, shake to roll"
)]
struct Cli {
    /// Path to a RON settings file
    #[arg(short, long, default_value = "ardice.ron")]
    config: PathBuf,

    /// Seed for the roll generator (overrides the settings file)
    #[arg(long)]
    seed: Option<u64>,

    /// Run the scripted session without a window and print a report
    #[arg(long)]
    headless: bool,

    /// Taps at the viewport center in headless mode
    #[arg(long, default_value = "1")]
    taps: usize,

    /// Shakes after the taps in headless mode
    #[arg(long, default_value = "1")]
    shakes: u32,

    /// Print the default settings as RON and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.print_default_config {
        match ArDiceSettings::default().to_ron_string() {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("{} {}", "error:".red().bold(), err);
                std::process::exit(1);
            }
        }
        return;
    }

    let mut settings = load_settings(&cli);
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }

    if cli.headless {
        #[cfg(windows)]
        attach_parent_console();

        run_headless_mode(&cli, &settings);
    } else {
        run_ar_mode(settings);
    }
}

fn load_settings(cli: &Cli) -> ArDiceSettings {
    if !cli.config.exists() {
        return ArDiceSettings::default();
    }
    match ArDiceSettings::load_from_file(&cli.config) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!(
                "{} {}; using defaults",
                "warning:".yellow().bold(),
                err
            );
            ArDiceSettings::default()
        }
    }
}

#[cfg(windows)]
fn attach_parent_console() {
    use std::io::{self, Write};

    #[link(name = "kernel32")]
    extern "system" {
        fn AttachConsole(dwProcessId: u32) -> i32;
        fn AllocConsole() -> i32;
    }

    const ATTACH_PARENT_PROCESS: u32 = 0xFFFFFFFF;

    unsafe {
        if AttachConsole(ATTACH_PARENT_PROCESS) == 0 {
            AllocConsole();
        }
    }

    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

// ============================================================================
// Headless Mode
// ============================================================================

fn run_headless_mode(cli: &Cli, settings: &ArDiceSettings) {
    let defaults = HeadlessScript::default();
    let script = HeadlessScript {
        taps: vec![defaults.viewport / 2.0; cli.taps],
        shakes: cli.shakes,
        ..defaults
    };

    let report = match run_headless(settings, &script) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    println!("{}", "AR Dice (headless)".bold());
    println!("Planes detected: {}", report.planes_detected.to_string().cyan());
    println!(
        "Dice placed:     {} ({} missed)",
        report.dice_placed.to_string().green(),
        report.missed_taps
    );
    for (i, roll) in report.rolls.iter().enumerate() {
        println!(
            "  roll {:>2}: x {:>4}°  z {:>4}°",
            i + 1,
            roll.degrees_x(),
            roll.degrees_z()
        );
    }
    for notice in &report.notices {
        println!("{} {}", "notice:".yellow(), notice.message);
    }
}

// ============================================================================
// AR Mode
// ============================================================================

fn run_ar_mode(settings: ArDiceSettings) {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "AR Dice".to_string(),
                        resolution: (1280u32, 720u32).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(bevy::log::LogPlugin {
                    level: bevy::log::Level::INFO,
                    filter: "info,wgpu=error,naga=warn".to_string(),
                    ..default()
                }),
        )
        .insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)))
        .add_plugins(ArDicePlugin { settings })
        .run();
}
