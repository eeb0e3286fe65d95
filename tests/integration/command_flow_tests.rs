//! End-to-end command dispatch: registry resolution through the boot
//! guard into the sequencers, against the mock bank and scripted clock.

use std::time::Duration;

use fireplace::adapters::dry_run::DryRunBank;
use fireplace::cancel::CancelToken;
use fireplace::command::{Command, CommandKind, SessionContext};
use fireplace::config::SessionConfig;
use fireplace::driver::Polarity;
use fireplace::ports::{Clock, Level};
use fireplace::registry::{Relay, RelayRegistry};
use fireplace::sequencer::{Outcome, PulseScript};

use crate::mock_hw::{RelayBank, ScriptClock, assert_no_overlap};

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn session<'a>(
    clock: &'a ScriptClock,
    cancel: &'a CancelToken,
) -> SessionContext<'a, ScriptClock> {
    SessionContext::new(clock, cancel, &SessionConfig::default(), None)
}

fn shield_targets() -> Vec<Relay> {
    let registry = RelayRegistry::with_known_relays();
    [4, 22, 6, 26]
        .into_iter()
        .map(|pin| registry.relay_for_pin(pin))
        .collect()
}

fn probe_cmd(script: PulseScript) -> Command {
    Command {
        kind: CommandKind::Probe { script },
        targets: shield_targets(),
        polarity: Polarity::ActiveHigh,
        boot_guard: Duration::ZERO,
    }
}

fn ignite_cmd(polarity: Polarity, boot_guard: Duration) -> Command {
    let registry = RelayRegistry::with_known_relays();
    Command {
        kind: CommandKind::Ignite {
            pulse: ms(250),
            maintained: false,
            hold_for: None,
        },
        targets: vec![registry.resolve_ref("main").expect("alias")],
        polarity,
        boot_guard,
    }
}

#[test]
fn probe_pulses_each_shield_pin_once_in_order() {
    let clock = ScriptClock::new();
    let cancel = CancelToken::new();
    let bank = RelayBank::new(&clock);

    let script = PulseScript {
        open: Duration::ZERO,
        close: ms(300),
        post_open: ms(500),
        gap: Duration::ZERO,
    };
    let outcome = session(&clock, &cancel)
        .execute(&probe_cmd(script), bank.clone())
        .unwrap();
    assert_eq!(outcome, Outcome::Completed);

    let writes = bank.writes();
    assert_no_overlap(&writes);

    let active_order: Vec<u8> = writes
        .iter()
        .filter(|w| w.1 == Level::High)
        .map(|w| w.0)
        .collect();
    assert_eq!(active_order, vec![4, 22, 6, 26], "shield physical order");

    for pin in [4, 22, 6, 26] {
        assert_eq!(
            bank.levels_for(pin).last(),
            Some(&Level::Low),
            "pin {pin} must end INACTIVE"
        );
    }
    // 300 ms close + 500 ms post-open per pin.
    assert_eq!(clock.now(), ms(4 * 800));
}

#[test]
fn probe_respects_inter_relay_gap() {
    let clock = ScriptClock::new();
    let cancel = CancelToken::new();
    let bank = RelayBank::new(&clock);

    let script = PulseScript {
        open: Duration::ZERO,
        close: ms(300),
        post_open: Duration::ZERO,
        gap: Duration::from_secs(2),
    };
    session(&clock, &cancel)
        .execute(&probe_cmd(script), bank.clone())
        .unwrap();

    let ons: Vec<Duration> = bank
        .writes()
        .iter()
        .filter(|w| w.1 == Level::High)
        .map(|w| w.2)
        .collect();
    for pair in ons.windows(2) {
        assert!(
            pair[1] >= pair[0] + ms(300) + Duration::from_secs(2),
            "gap violated between activations at {pair:?}"
        );
    }
}

#[test]
fn cancelled_probe_leaves_every_pin_inactive() {
    let clock = ScriptClock::new();
    let cancel = CancelToken::new();
    let bank = RelayBank::new(&clock);
    // Trip during the second relay's ACTIVE hold.
    clock.cancel_at(ms(950), &cancel);

    let script = PulseScript {
        open: Duration::ZERO,
        close: ms(500),
        post_open: ms(300),
        gap: Duration::ZERO,
    };
    let outcome = session(&clock, &cancel)
        .execute(&probe_cmd(script), bank.clone())
        .unwrap();
    assert_eq!(outcome, Outcome::Cancelled);

    let writes = bank.writes();
    assert_no_overlap(&writes);
    for pin in [4, 22, 6, 26] {
        assert_eq!(bank.levels_for(pin).last(), Some(&Level::Low));
    }
    assert!(
        !writes.iter().any(|w| (w.0 == 6 || w.0 == 26) && w.1 == Level::High),
        "relays after the cancellation point must never go ACTIVE"
    );
}

#[test]
fn ignite_is_one_qualified_pulse_after_the_boot_guard() {
    let clock = ScriptClock::new();
    let cancel = CancelToken::new();
    let bank = RelayBank::new(&clock);

    let outcome = session(&clock, &cancel)
        .execute(
            &ignite_cmd(Polarity::ActiveHigh, Duration::from_secs(12)),
            bank.clone(),
        )
        .unwrap();
    assert_eq!(outcome, Outcome::Completed);

    let writes = bank.writes();
    // Claim INACTIVE at t=0, ACTIVE once the guard clears, INACTIVE 250 ms
    // later.
    assert_eq!(writes[0], (4, Level::Low, Duration::ZERO));
    assert_eq!(writes[1].1, Level::High);
    assert!(writes[1].2 >= Duration::from_secs(12));
    assert_eq!(writes[2].1, Level::Low);
    assert_eq!(writes[2].2 - writes[1].2, ms(250));
    assert_eq!(writes.len(), 3);
}

#[test]
fn active_low_inverts_every_physical_level() {
    let clock = ScriptClock::new();
    let cancel = CancelToken::new();
    let bank = RelayBank::new(&clock);

    session(&clock, &cancel)
        .execute(&ignite_cmd(Polarity::ActiveLow, Duration::ZERO), bank.clone())
        .unwrap();

    assert_eq!(
        bank.sequence(),
        vec![(4, Level::High), (4, Level::Low), (4, Level::High)],
        "inverted polarity: INACTIVE is HIGH, the pulse is LOW"
    );
}

#[test]
fn hold_command_closes_then_releases() {
    let clock = ScriptClock::new();
    let cancel = CancelToken::new();
    let bank = RelayBank::new(&clock);
    let registry = RelayRegistry::with_known_relays();

    let cmd = Command {
        kind: CommandKind::Hold {
            hold_for: Some(Duration::from_secs(3)),
        },
        targets: vec![registry.resolve_ref("high_flame").unwrap()],
        polarity: Polarity::ActiveHigh,
        boot_guard: Duration::ZERO,
    };
    let outcome = session(&clock, &cancel).execute(&cmd, bank.clone()).unwrap();
    assert_eq!(outcome, Outcome::Completed);

    let writes = bank.writes();
    let on = writes.iter().find(|w| w.1 == Level::High).unwrap();
    let off = writes.iter().rfind(|w| w.1 == Level::Low).unwrap();
    assert_eq!(on.0, 22);
    assert!(off.2 - on.2 >= Duration::from_secs(3));
    assert_eq!(bank.levels_for(22).last(), Some(&Level::Low));
}

#[test]
fn dry_run_issues_the_identical_sequence() {
    let script = PulseScript {
        open: ms(100),
        close: ms(300),
        post_open: ms(500),
        gap: ms(200),
    };

    let clock = ScriptClock::new();
    let cancel = CancelToken::new();
    let real = RelayBank::new(&clock);
    session(&clock, &cancel)
        .execute(&probe_cmd(script), real.clone())
        .unwrap();

    let clock = ScriptClock::new();
    let cancel = CancelToken::new();
    let dry = DryRunBank::new();
    session(&clock, &cancel)
        .execute(&probe_cmd(script), dry.clone())
        .unwrap();

    let suppressed: Vec<(u8, Level)> = dry.writes().iter().map(|w| (w.pin, w.level)).collect();
    assert_eq!(
        suppressed,
        real.sequence(),
        "dry run must issue the exact claim/write sequence it suppresses"
    );
}
