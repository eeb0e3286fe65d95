//! Maintained-call sessions driven through the command dispatcher:
//! the drop/re-qualify/hold pattern, cancellation from every phase, and
//! fault propagation.

use std::time::Duration;

use fireplace::cancel::CancelToken;
use fireplace::command::{Command, CommandKind, SessionContext};
use fireplace::config::SessionConfig;
use fireplace::driver::Polarity;
use fireplace::error::Error;
use fireplace::ports::{Clock, Level};
use fireplace::registry::RelayRegistry;
use fireplace::sequencer::Outcome;

use crate::mock_hw::{RelayBank, ScriptClock};

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn maintained_cmd(hold_for: Option<Duration>) -> Command {
    let registry = RelayRegistry::with_known_relays();
    Command {
        kind: CommandKind::Ignite {
            pulse: ms(250),
            maintained: true,
            hold_for,
        },
        targets: vec![registry.resolve_ref("low_flame").unwrap()],
        polarity: Polarity::ActiveHigh,
        boot_guard: Duration::ZERO,
    }
}

fn run(
    hold_for: Option<Duration>,
    cancel_at: Option<Duration>,
    fail_level: Option<Level>,
) -> (RelayBank, ScriptClock, Result<Outcome, Error>) {
    let clock = ScriptClock::new();
    let cancel = CancelToken::new();
    let bank = RelayBank::new(&clock);
    if let Some(at) = cancel_at {
        clock.cancel_at(at, &cancel);
    }
    if let Some(level) = fail_level {
        bank.fail_writes_of(level);
    }
    let mut ctx = SessionContext::new(&clock, &cancel, &SessionConfig::default(), None);
    let result = ctx.execute(&maintained_cmd(hold_for), bank.clone());
    (bank, clock, result)
}

#[test]
fn bounded_hold_follows_the_vendor_pattern() {
    let (bank, _clock, result) = run(Some(Duration::from_secs(5)), None, None);
    assert_eq!(result.unwrap(), Outcome::Completed);

    // Claim open, re-qualify edge at 1.0 s, open at 1.25 s, hold from
    // 1.5 s, released 5 s later.
    assert_eq!(
        bank.writes(),
        vec![
            (4, Level::Low, Duration::ZERO),
            (4, Level::High, ms(1_000)),
            (4, Level::Low, ms(1_250)),
            (4, Level::High, ms(1_500)),
            (4, Level::Low, ms(6_500)),
        ]
    );
}

#[test]
fn cancel_during_hold_releases_within_one_slice() {
    let cancel_at = Duration::from_secs(30);
    let (bank, clock, result) = run(None, Some(cancel_at), None);
    assert_eq!(result.unwrap(), Outcome::Cancelled);
    assert_eq!(bank.levels_for(4).last(), Some(&Level::Low));
    let slice = SessionConfig::default().poll_slice();
    assert!(
        clock.now() <= cancel_at + slice * 2,
        "release latency exceeded the poll bound: {:?}",
        clock.now()
    );
}

#[test]
fn cancel_before_requalification_never_goes_active() {
    // Trip inside the 1 s drop-open phase.
    let (bank, _clock, result) = run(None, Some(ms(400)), None);
    assert_eq!(result.unwrap(), Outcome::Cancelled);
    assert!(
        !bank.writes().iter().any(|w| w.1 == Level::High),
        "no ACTIVE phase may run once cancellation is pending"
    );
    assert_eq!(bank.levels_for(4).last(), Some(&Level::Low));
}

#[test]
fn cancel_during_requalify_close_still_returns_open() {
    // Trip inside the 250 ms re-qualification closure.
    let (bank, _clock, result) = run(None, Some(ms(1_100)), None);
    assert_eq!(result.unwrap(), Outcome::Cancelled);
    assert_eq!(bank.levels_for(4).last(), Some(&Level::Low));
}

#[test]
fn active_write_fault_surfaces_as_gpio_error_after_fail_safe() {
    let (bank, _clock, result) = run(None, None, Some(Level::High));
    assert!(matches!(result.unwrap_err(), Error::Gpio(_)));
    assert_eq!(
        bank.levels_for(4).last(),
        Some(&Level::Low),
        "the forced return to INACTIVE must still run"
    );
}
