//! Relay registry -- semantic relay names mapped to BCM output pins.
//!
//! Read-mostly after startup. Registration enforces uniqueness both ways:
//! a name maps to exactly one pin and a pin backs exactly one name.
//! Duplicate bindings are a configuration error surfaced before any relay
//! is driven.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::pins;

/// A named relay channel. Immutable after registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    pub name: String,
    pub pin: u8,
}

impl Relay {
    pub fn new(name: impl Into<String>, pin: u8) -> Self {
        Self {
            name: name.into(),
            pin,
        }
    }
}

/// In-memory name → pin mapping.
#[derive(Debug, Default)]
pub struct RelayRegistry {
    relays: Vec<Relay>,
}

impl RelayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the KS0212 shield table from [`pins`].
    pub fn with_known_relays() -> Self {
        let mut reg = Self::new();
        for (name, pin) in pins::KNOWN_RELAYS {
            // The static table is checked by tests; duplicates cannot occur.
            let _ = reg.register(name, pin);
        }
        reg
    }

    /// Bind `name` to `pin`. Fails if the name is taken or the pin is
    /// already bound to a different name.
    pub fn register(&mut self, name: &str, pin: u8) -> Result<(), ConfigError> {
        if self.relays.iter().any(|r| r.name == name) {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }
        if let Some(existing) = self.relays.iter().find(|r| r.pin == pin) {
            return Err(ConfigError::PinAlreadyBound {
                pin,
                name: existing.name.clone(),
            });
        }
        self.relays.push(Relay::new(name, pin));
        Ok(())
    }

    /// Look up a relay by its registered name (no aliasing).
    pub fn resolve(&self, name: &str) -> Result<&Relay, ConfigError> {
        self.relays
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| ConfigError::UnknownRelay(name.to_string()))
    }

    /// Resolve a user-supplied relay reference: a registered name, a
    /// documented alias, or a bare BCM pin number (which yields an
    /// ad-hoc `gpio<N>` relay so unlisted channels can still be driven).
    pub fn resolve_ref(&self, reference: &str) -> Result<Relay, ConfigError> {
        let trimmed = reference.trim();
        let name = pins::ALIASES
            .iter()
            .find(|(alias, _)| *alias == trimmed)
            .map_or(trimmed, |(_, canonical)| *canonical);

        if let Ok(relay) = self.resolve(name) {
            return Ok(relay.clone());
        }
        if let Ok(pin) = trimmed.parse::<u8>() {
            return Ok(self.relay_for_pin(pin));
        }
        Err(ConfigError::UnknownRelay(reference.to_string()))
    }

    /// Relay handle for a raw pin: the registered name if the pin is
    /// known, otherwise `gpio<N>`.
    pub fn relay_for_pin(&self, pin: u8) -> Relay {
        self.relays
            .iter()
            .find(|r| r.pin == pin)
            .cloned()
            .unwrap_or_else(|| Relay::new(format!("gpio{pin}"), pin))
    }

    /// Registered relays in registration (physical) order.
    pub fn iter(&self) -> impl Iterator<Item = &Relay> {
        self.relays.iter()
    }

    /// Name → pin map, sorted by name (for `list-relays --json`).
    pub fn to_map(&self) -> BTreeMap<String, u8> {
        self.relays
            .iter()
            .map(|r| (r.name.clone(), r.pin))
            .collect()
    }
}
