use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Number of gas species tracked per tile.
pub const GASES_NUM: usize = 4;

/// Universal gas constant [J/(mol·K)].
pub const GAS_CONSTANT: f32 = 8.314;

/// Volume of a single tile [m³]. One floor tile with a 2.5 m ceiling.
pub const TILE_VOLUME: f32 = 2.5;

/// Room temperature used when seeding a standard atmosphere [K].
pub const STANDARD_TEMPERATURE: f32 = 293.15;

// Standard mix: 21% O2 / 79% N2 at ~101.3 kPa over TILE_VOLUME.
const STANDARD_OXYGEN: f32 = 21.83;
const STANDARD_NITROGEN: f32 = 82.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
#[reflect(Debug, PartialEq)]
pub enum Gas {
    Oxygen,
    CarbonDioxide,
    Nitrogen,
    Plasma,
}

impl Gas {
    pub const ALL: [Gas; GASES_NUM] = [
        Gas::Oxygen,
        Gas::CarbonDioxide,
        Gas::Nitrogen,
        Gas::Plasma,
    ];

    /// Slot of this gas in per-tile gas arrays.
    pub fn index(self) -> usize {
        match self {
            Gas::Oxygen => 0,
            Gas::CarbonDioxide => 1,
            Gas::Nitrogen => 2,
            Gas::Plasma => 3,
        }
    }

    /// Heat capacity per mole, used to derive temperature from energy.
    pub fn heat_capacity(self) -> f32 {
        match self {
            Gas::Oxygen => 20.0,
            Gas::CarbonDioxide => 30.0,
            Gas::Nitrogen => 20.0,
            Gas::Plasma => 200.0,
        }
    }
}

/// Authoritative, persistent atmosphere of one tile.
///
/// Stores moles per gas and the thermal energy of the mixture. Temperature
/// and pressure are derived on read, so they can never drift out of sync
/// with the stored quantities.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Debug, PartialEq)]
pub struct AtmosHolder {
    gases: [f32; GASES_NUM],
    energy: f32,
}

impl AtmosHolder {
    /// Breathable air at [`STANDARD_TEMPERATURE`], roughly 101 kPa.
    pub fn standard() -> Self {
        let mut holder = Self::default();
        holder.add_gas(Gas::Oxygen.index(), STANDARD_OXYGEN);
        holder.add_gas(Gas::Nitrogen.index(), STANDARD_NITROGEN);
        holder.add_energy(STANDARD_TEMPERATURE * holder.heat_capacity());
        holder
    }

    /// Moles of the gas stored in `index`.
    pub fn gas(&self, index: usize) -> f32 {
        self.gases[index]
    }

    /// Adds (or with a negative amount, removes) moles of one gas.
    /// The stored quantity never goes below zero.
    pub fn add_gas(&mut self, index: usize, amount: f32) {
        let slot = &mut self.gases[index];
        *slot = (*slot + amount).max(0.0);
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn add_energy(&mut self, amount: f32) {
        self.energy = (self.energy + amount).max(0.0);
    }

    pub fn total_gas(&self) -> f32 {
        self.gases.iter().sum()
    }

    pub fn heat_capacity(&self) -> f32 {
        Gas::ALL
            .iter()
            .map(|gas| self.gases[gas.index()] * gas.heat_capacity())
            .sum()
    }

    /// Temperature in kelvin; zero for an empty holder.
    pub fn temperature(&self) -> f32 {
        let capacity = self.heat_capacity();
        if capacity <= 0.0 {
            return 0.0;
        }
        self.energy / capacity
    }

    /// Pressure in pascal, from the ideal gas law over [`TILE_VOLUME`].
    pub fn pressure(&self) -> f32 {
        self.total_gas() * self.temperature() * GAS_CONSTANT / TILE_VOLUME
    }

    /// Clears every gas and the stored energy.
    pub fn truncate(&mut self) {
        self.gases = [0.0; GASES_NUM];
        self.energy = 0.0;
    }
}
