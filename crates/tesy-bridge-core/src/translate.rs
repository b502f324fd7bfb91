//! Vendor status to standardized capability translation.
//!
//! The translator remembers the last value it announced for each of the
//! five derived states and reports only the ones that changed. Missing or
//! unparseable vendor fields leave the announced value untouched.
//!
//! # Known approximations
//!
//! - Heater activity only distinguishes `READY` (idle) from everything
//!   else (heating); the vendor has more states than that.
//! - An auto-mode device whose target is below the current temperature is
//!   reported as-is.

use crate::capability::{
    Active, CapabilityChange, CurrentHeaterCoolerState, TargetHeaterCoolerState,
};
use crate::status::{DeviceStatus, MODE_MANUAL};
use serde::{Deserialize, Serialize};

/// The five standardized values derived from a status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardizedState {
    /// Power
    pub active: Active,
    /// Current temperature, vendor units
    pub current_temperature: f64,
    /// Target temperature, vendor units
    pub target_temperature: f64,
    /// Heater activity
    pub current_heater_cooler_state: CurrentHeaterCoolerState,
    /// Requested mode
    pub target_heater_cooler_state: TargetHeaterCoolerState,
}

impl StandardizedState {
    /// Values announced before any status has been loaded.
    ///
    /// The target starts at the upper temperature bound.
    #[must_use]
    pub fn initial(max_temperature: f64) -> Self {
        Self {
            active: Active::Inactive,
            current_temperature: 0.0,
            target_temperature: max_temperature,
            current_heater_cooler_state: CurrentHeaterCoolerState::Inactive,
            target_heater_cooler_state: TargetHeaterCoolerState::Auto,
        }
    }

    /// Overlay the values derivable from `status` onto `self`.
    #[must_use]
    pub fn overlay(mut self, status: &DeviceStatus) -> Self {
        if let Some(raw) = status.power() {
            self.active = active_from_power(raw);
        }
        if let Some(value) = status.current_temperature() {
            self.current_temperature = value;
        }
        if let Some(value) = status.target_temperature() {
            self.target_temperature = value;
        }
        if let Some(raw) = status.heater_state() {
            self.current_heater_cooler_state = current_state_from_heater(raw);
        }
        if status.raw_mode().is_some() {
            self.target_heater_cooler_state = target_state_from_mode(status.mode());
        }
        self
    }
}

/// `on` in any case is active; anything else is inactive.
#[must_use]
pub fn active_from_power(raw: &str) -> Active {
    Active::from(raw.eq_ignore_ascii_case("on"))
}

/// `READY` in any case is idle; anything else is heating.
#[must_use]
pub fn current_state_from_heater(raw: &str) -> CurrentHeaterCoolerState {
    if raw.eq_ignore_ascii_case("ready") {
        CurrentHeaterCoolerState::Idle
    } else {
        CurrentHeaterCoolerState::Heating
    }
}

/// Manual mode is heat; every other code, eco included, is auto.
#[must_use]
pub fn target_state_from_mode(mode: Option<i64>) -> TargetHeaterCoolerState {
    if mode == Some(MODE_MANUAL) {
        TargetHeaterCoolerState::Heat
    } else {
        TargetHeaterCoolerState::Auto
    }
}

fn differs(old: f64, new: f64) -> bool {
    (old - new).abs() > f64::EPSILON
}

/// Change-detecting translator holding the last announced values.
#[derive(Debug, Clone)]
pub struct StatusTranslator {
    published: StandardizedState,
}

impl StatusTranslator {
    /// Create a translator whose announced values start at `initial`.
    #[must_use]
    pub fn new(initial: StandardizedState) -> Self {
        Self { published: initial }
    }

    /// Last announced values.
    #[must_use]
    pub fn published(&self) -> &StandardizedState {
        &self.published
    }

    /// Current view: values derivable from `status` over the announced ones.
    ///
    /// With no status loaded yet this is just the announced state.
    #[must_use]
    pub fn view(&self, status: Option<&DeviceStatus>) -> StandardizedState {
        match status {
            Some(status) => self.published.overlay(status),
            None => self.published,
        }
    }

    /// Translate a fresh snapshot, returning the values that changed.
    ///
    /// Applying the same snapshot twice yields no changes the second time.
    pub fn apply(&mut self, status: &DeviceStatus) -> Vec<CapabilityChange> {
        let old = self.published;
        let new = old.overlay(status);
        let mut changes = Vec::new();

        if differs(old.current_temperature, new.current_temperature) {
            tracing::info!(
                from = old.current_temperature,
                to = new.current_temperature,
                "Changing CurrentTemperature"
            );
            changes.push(CapabilityChange::CurrentTemperature(new.current_temperature));
        }

        if differs(old.target_temperature, new.target_temperature) {
            tracing::info!(
                from = old.target_temperature,
                to = new.target_temperature,
                "Changing HeatingThresholdTemperature"
            );
            changes.push(CapabilityChange::TargetTemperature(new.target_temperature));
        }

        if old.active != new.active {
            tracing::info!(from = ?old.active, to = ?new.active, "Changing Active");
            changes.push(CapabilityChange::Active(new.active));
        }

        if old.current_heater_cooler_state != new.current_heater_cooler_state {
            tracing::info!(
                from = ?old.current_heater_cooler_state,
                to = ?new.current_heater_cooler_state,
                "Changing CurrentHeaterCoolerState"
            );
            changes.push(CapabilityChange::CurrentHeaterCoolerState(
                new.current_heater_cooler_state,
            ));
        }

        if old.target_heater_cooler_state != new.target_heater_cooler_state {
            tracing::info!(
                from = ?old.target_heater_cooler_state,
                to = ?new.target_heater_cooler_state,
                "Changing TargetHeaterCoolerState"
            );
            changes.push(CapabilityChange::TargetHeaterCoolerState(
                new.target_heater_cooler_state,
            ));
        }

        self.published = new;
        changes
    }

    /// Record a value written by a successful command.
    ///
    /// Returns the change to announce, if the value differs from the one
    /// last announced.
    pub fn record(&mut self, change: CapabilityChange) -> Option<CapabilityChange> {
        let published = &mut self.published;
        let changed = match change {
            CapabilityChange::Active(v) => replace(&mut published.active, v),
            CapabilityChange::CurrentTemperature(v) => {
                replace_number(&mut published.current_temperature, v)
            }
            CapabilityChange::TargetTemperature(v) => {
                replace_number(&mut published.target_temperature, v)
            }
            CapabilityChange::CurrentHeaterCoolerState(v) => {
                replace(&mut published.current_heater_cooler_state, v)
            }
            CapabilityChange::TargetHeaterCoolerState(v) => {
                replace(&mut published.target_heater_cooler_state, v)
            }
        };
        changed.then_some(change)
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn replace_number(slot: &mut f64, value: f64) -> bool {
    if !differs(*slot, value) {
        return false;
    }
    *slot = value;
    true
}
