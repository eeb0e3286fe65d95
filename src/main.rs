//! Fireplace controller CLI -- thin argv glue over the library core.
//!
//! Subcommands map 1:1 onto [`Command`]s: `probe` drives the pulse
//! sequencer across shield pins, `ignite` issues one qualified pulse (or
//! the maintained-call pattern), `on`/`off`/`high`/`low` manage sustained
//! holds on the main and high-flame relays. SIGINT feeds the cooperative
//! cancel token; the fail-safe shutdown path runs before the process
//! exits 130.

use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use log::warn;

use fireplace::adapters::clock::{MonotonicClock, system_uptime};
use fireplace::adapters::dry_run::DryRunBank;
use fireplace::cancel::CancelToken;
use fireplace::command::{Command, CommandKind, SessionContext};
use fireplace::config::SessionConfig;
use fireplace::driver::Polarity;
use fireplace::error::ConfigError;
use fireplace::pins;
use fireplace::ports::Clock;
use fireplace::registry::{Relay, RelayRegistry};
use fireplace::sequencer::{Outcome, PulseScript};

// ── CLI definition ────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "fireplace",
    version,
    about = "Heat & Glo IntelliFire IPI relay controller (momentary qualified closure)"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Args, Debug, Clone)]
struct CommonOpts {
    /// Main relay by name (e.g. low_flame), alias, or BCM pin.
    #[arg(long, env = "FIREPLACE_MAIN_RELAY")]
    main_relay: Option<String>,

    /// High-flame relay by name (e.g. high_flame), alias, or BCM pin.
    #[arg(long, env = "FIREPLACE_HIGH_RELAY")]
    high_relay: Option<String>,

    /// Set only if your relay turns ON when the GPIO is LOW
    /// (inverted polarity).
    #[arg(long, env = "FIREPLACE_ACTIVE_LOW")]
    active_low: bool,

    /// Wait until system uptime reaches this value before any closure,
    /// clearing the IPI post-power diagnostic window.
    #[arg(long, default_value_t = 12.0)]
    boot_guard_seconds: f64,

    /// Log actions instead of toggling GPIO.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Show known relay names and their BCM pins.
    ListRelays {
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Momentary ignition request (qualified pulse).
    Ignite {
        #[command(flatten)]
        common: CommonOpts,
        /// Pulse width in ms (clamped to the 200-300 ms qualified window).
        #[arg(long, default_value_t = 250)]
        pulse_ms: u64,
        /// Use the maintained-call pattern then hold (for units that drop
        /// without a maintained call).
        #[arg(long)]
        maintained: bool,
        /// How long to hold the call (default: until Ctrl+C). Only
        /// meaningful with --maintained.
        #[arg(long)]
        hold_seconds: Option<f64>,
    },

    /// Close and hold the main relay (not recommended during the
    /// detection window).
    On {
        #[command(flatten)]
        common: CommonOpts,
        #[arg(long)]
        hold_seconds: Option<f64>,
    },

    /// Open the main relay.
    Off {
        #[command(flatten)]
        common: CommonOpts,
    },

    /// Close and hold the high-flame relay.
    High {
        #[command(flatten)]
        common: CommonOpts,
        #[arg(long)]
        hold_seconds: Option<f64>,
    },

    /// Open the high-flame relay.
    Low {
        #[command(flatten)]
        common: CommonOpts,
    },

    /// Pulse the high-flame relay (rare; usually use hold).
    PulseHigh {
        #[command(flatten)]
        common: CommonOpts,
        #[arg(long, default_value_t = 250)]
        pulse_ms: u64,
    },

    /// Probe GPIO pins to find which relay channel they drive.
    Probe {
        #[command(flatten)]
        common: CommonOpts,
        /// Comma-separated BCM pins to toggle (default matches the
        /// KS0212 shield mapping).
        #[arg(long, default_value = "4,22,6,26")]
        pins: String,
        /// Pulse width in ms.
        #[arg(long, default_value_t = 300)]
        pulse_ms: u64,
        /// How long to stay OPEN-DEACTIVATE before the activation.
        #[arg(long, default_value_t = 0.0)]
        open_seconds: f64,
        /// How long to stay CLOSED (overrides --pulse-ms). Useful for
        /// polarity testing.
        #[arg(long)]
        close_seconds: Option<f64>,
        /// How long to stay OPEN-DEACTIVATE after the activation.
        #[arg(long, default_value_t = 0.5)]
        post_open_seconds: f64,
        /// INACTIVE gap between consecutive pins.
        #[arg(long, default_value_t = 0.0)]
        gap_seconds: f64,
    },
}

// ── Entry point ───────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let cancel = CancelToken::new();
    {
        let token = cancel.clone();
        ctrlc::set_handler(move || token.cancel())
            .context("failed to install SIGINT handler")?;
    }

    match run(cli, &cancel)? {
        Outcome::Completed => Ok(()),
        Outcome::Cancelled => {
            eprintln!("Interrupted");
            std::process::exit(130);
        }
    }
}

fn run(cli: Cli, cancel: &CancelToken) -> anyhow::Result<Outcome> {
    let registry = RelayRegistry::with_known_relays();
    let config = SessionConfig::default();

    let (cmd, dry_run) = match cli.cmd {
        Cmd::ListRelays { json } => {
            list_relays(&registry, json)?;
            return Ok(Outcome::Completed);
        }

        Cmd::Probe {
            common,
            pins,
            pulse_ms,
            open_seconds,
            close_seconds,
            post_open_seconds,
            gap_seconds,
        } => {
            let targets = parse_probe_pins(&registry, &pins)?;
            warn!(
                "probing pins (watch LEDs / listen for relay clicks); ensure NOTHING \
                 is wired to the fireplace while probing"
            );
            let close = close_seconds
                .map_or(Duration::from_millis(pulse_ms), Duration::from_secs_f64);
            let cmd = Command {
                kind: CommandKind::Probe {
                    script: PulseScript {
                        open: Duration::from_secs_f64(open_seconds),
                        close,
                        post_open: Duration::from_secs_f64(post_open_seconds),
                        gap: Duration::from_secs_f64(gap_seconds),
                    },
                },
                targets,
                polarity: polarity_of(&common),
                // Bench command: nothing is wired, no IPI window to avoid.
                boot_guard: Duration::ZERO,
            };
            (cmd, common.dry_run)
        }

        Cmd::Ignite {
            common,
            pulse_ms,
            maintained,
            hold_seconds,
        } => {
            let relay = main_relay(&registry, &common)?;
            let cmd = Command {
                kind: CommandKind::Ignite {
                    pulse: config.qualified_pulse(pulse_ms),
                    maintained,
                    hold_for: hold_seconds.map(Duration::from_secs_f64),
                },
                targets: vec![relay],
                polarity: polarity_of(&common),
                boot_guard: Duration::from_secs_f64(common.boot_guard_seconds),
            };
            (cmd, common.dry_run)
        }

        Cmd::On {
            common,
            hold_seconds,
        } => {
            let relay = main_relay(&registry, &common)?;
            let cmd = Command {
                kind: CommandKind::Hold {
                    hold_for: hold_seconds.map(Duration::from_secs_f64),
                },
                targets: vec![relay],
                polarity: polarity_of(&common),
                boot_guard: Duration::from_secs_f64(common.boot_guard_seconds),
            };
            (cmd, common.dry_run)
        }

        Cmd::Off { common } => {
            let relay = main_relay(&registry, &common)?;
            let cmd = Command {
                kind: CommandKind::Release,
                targets: vec![relay],
                polarity: polarity_of(&common),
                boot_guard: Duration::ZERO,
            };
            (cmd, common.dry_run)
        }

        Cmd::High {
            common,
            hold_seconds,
        } => {
            let relay = high_relay(&registry, &common)?;
            let cmd = Command {
                kind: CommandKind::Hold {
                    hold_for: hold_seconds.map(Duration::from_secs_f64),
                },
                targets: vec![relay],
                polarity: polarity_of(&common),
                boot_guard: Duration::from_secs_f64(common.boot_guard_seconds),
            };
            (cmd, common.dry_run)
        }

        Cmd::Low { common } => {
            let relay = high_relay(&registry, &common)?;
            let cmd = Command {
                kind: CommandKind::Release,
                targets: vec![relay],
                polarity: polarity_of(&common),
                boot_guard: Duration::ZERO,
            };
            (cmd, common.dry_run)
        }

        Cmd::PulseHigh { common, pulse_ms } => {
            let relay = high_relay(&registry, &common)?;
            let cmd = Command {
                kind: CommandKind::Ignite {
                    pulse: Duration::from_millis(pulse_ms),
                    maintained: false,
                    hold_for: None,
                },
                targets: vec![relay],
                polarity: polarity_of(&common),
                boot_guard: Duration::from_secs_f64(common.boot_guard_seconds),
            };
            (cmd, common.dry_run)
        }
    };

    let clock = MonotonicClock::new();
    dispatch(&cmd, dry_run, &clock, cancel, &config)
}

// ── Helpers ───────────────────────────────────────────────────

fn dispatch<C: Clock>(
    cmd: &Command,
    dry_run: bool,
    clock: &C,
    cancel: &CancelToken,
    config: &SessionConfig,
) -> anyhow::Result<Outcome> {
    let mut ctx = SessionContext::new(clock, cancel, config, system_uptime());
    let outcome = if dry_run {
        ctx.execute(cmd, DryRunBank::new())?
    } else {
        ctx.execute(cmd, real_bank()?)?
    };
    Ok(outcome)
}

#[cfg(feature = "rpi")]
fn real_bank() -> anyhow::Result<fireplace::adapters::gpio::RpiBank> {
    Ok(fireplace::adapters::gpio::RpiBank::new()?)
}

#[cfg(not(feature = "rpi"))]
fn real_bank() -> anyhow::Result<DryRunBank> {
    Err(fireplace::error::GpioError::Unavailable(
        "this build has no GPIO backend (compile with --features rpi on the Pi), \
         or pass --dry-run",
    )
    .into())
}

fn polarity_of(common: &CommonOpts) -> Polarity {
    if common.active_low {
        Polarity::ActiveLow
    } else {
        Polarity::ActiveHigh
    }
}

fn main_relay(registry: &RelayRegistry, common: &CommonOpts) -> anyhow::Result<Relay> {
    let reference = common.main_relay.as_deref().ok_or(ConfigError::MissingRelay(
        "set --main-relay or FIREPLACE_MAIN_RELAY",
    ))?;
    Ok(registry.resolve_ref(reference)?)
}

fn high_relay(registry: &RelayRegistry, common: &CommonOpts) -> anyhow::Result<Relay> {
    let reference = common.high_relay.as_deref().ok_or(ConfigError::MissingRelay(
        "set --high-relay or FIREPLACE_HIGH_RELAY",
    ))?;
    Ok(registry.resolve_ref(reference)?)
}

fn parse_probe_pins(registry: &RelayRegistry, csv: &str) -> anyhow::Result<Vec<Relay>> {
    let mut targets = Vec::new();
    for part in csv.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let pin: u8 = part
            .parse()
            .with_context(|| format!("pin '{part}' must be an integer GPIO (BCM numbering)"))?;
        targets.push(registry.relay_for_pin(pin));
    }
    if targets.is_empty() {
        return Err(ConfigError::MissingRelay("probe requires at least one pin").into());
    }
    Ok(targets)
}

fn list_relays(registry: &RelayRegistry, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&registry.to_map())?);
        return Ok(());
    }
    println!("Known relays (name -> BCM pin):");
    let map = registry.to_map();
    for (name, pin) in &map {
        match pins::physical_note(name) {
            Some(note) => println!("- {name} -> {pin} ({note})"),
            None => println!("- {name} -> {pin}"),
        }
    }
    println!("You can also pass a BCM pin directly (e.g. --main-relay 4).");
    Ok(())
}
