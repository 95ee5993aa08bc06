//! Attack gating and damage application.

pub mod damage;
mod gate;

pub use damage::{apply_damage, mitigate, DamageReport, Damageable};
pub use gate::CombatGate;
