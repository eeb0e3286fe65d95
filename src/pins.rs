//! Relay-channel pin assignments for the Inland / Keyestudio KS0212
//! 4-channel relay shield.
//!
//! Single source of truth -- the default registry and the CLI help text
//! both reference this module rather than hard-coding pin numbers.
//!
//! Purpose-based names:
//! - `low_flame`: "main burner ON" request (R-W). If HIGH is not asserted,
//!   this is effectively "low".
//! - `high_flame`: "high flame" request (G-W), only valid after the burner
//!   is on.
//! - `aux_1` / `aux_2`: spare channels.
//!
//! Physical relay positions and the ACTIVE-HIGH logic level were confirmed
//! on the installed Pi: the relay energises (LED/click) during the
//! CLOSE-ACTIVATE phase without `--active-low`.

/// Documented BCM relay control pins for the KS0212 shield, in physical
/// order starting furthest from the USB ports.
pub const KNOWN_RELAYS: [(&str, u8); 4] = [
    ("low_flame", 4),
    ("high_flame", 22),
    ("aux_1", 6),
    ("aux_2", 26),
];

/// Human-readable board positions, shown by `list-relays`.
pub const PHYSICAL_NOTES: [(&str, &str); 4] = [
    ("low_flame", "physical relay #1 (furthest from USB ports)"),
    ("high_flame", "physical relay #2 (next closer to USB ports)"),
    ("aux_1", "physical relay #3 (closer to USB ports)"),
    ("aux_2", "physical relay #4 (closest to USB ports)"),
];

/// Backward-compatible / convenience aliases accepted anywhere a relay
/// name is accepted.
pub const ALIASES: [(&str, &str); 14] = [
    // Explicit burner naming
    ("main_burner", "low_flame"),
    ("main", "low_flame"),
    // Legacy pin-encoded names
    ("relay_gpio4", "low_flame"),
    ("relay_gpio22", "high_flame"),
    ("relay_gpio6", "aux_1"),
    ("relay_gpio26", "aux_2"),
    // Pin shorthand
    ("gpio4", "low_flame"),
    ("gpio22", "high_flame"),
    ("gpio6", "aux_1"),
    ("gpio26", "aux_2"),
    ("r4", "low_flame"),
    ("r22", "high_flame"),
    ("r6", "aux_1"),
    ("r26", "aux_2"),
];

/// Board note for a relay name, if one is documented.
pub fn physical_note(name: &str) -> Option<&'static str> {
    PHYSICAL_NOTES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, note)| *note)
}
