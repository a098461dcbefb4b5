//! Strategies name the technology and policy variant being modelled.
//!
//! A strategy is written as a single underscore-joined string of the form
//! `<generation>_<core>_<backhaul>_<sharing>_<networks>_<spectrum>_<tax>_<power>`
//! (e.g. `4G_epc_wireless_baseline_baseline_baseline_baseline_baseline`). It is
//! parsed exactly once at the model boundary into a [`Strategy`] with named
//! enum fields; the token string itself never travels through the pipeline.
use crate::region::Geotype;
use anyhow::{Result, anyhow, ensure};
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString};

/// Cellular technology generation
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum Generation {
    /// 4G LTE
    #[string = "4G"]
    G4,
    /// 5G New Radio
    #[string = "5G"]
    G5,
}

/// Core network architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum CoreType {
    /// Evolved packet core (4G)
    #[strum(serialize = "epc")]
    Epc,
    /// 5G non-standalone core
    #[strum(serialize = "nsa")]
    Nsa,
}

/// Backhaul technology connecting sites to the core network
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum Backhaul {
    /// Point-to-point fibre, priced per metre
    #[strum(serialize = "fiber")]
    Fiber,
    /// Microwave links, priced in capacity tiers
    #[strum(serialize = "wireless")]
    Wireless,
}

/// Infrastructure sharing policy.
///
/// Also used as the `networks` token, which selects the operator-count row
/// used when scaling single-operator results to the whole market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Sharing {
    /// No sharing; every operator builds and pays in full
    Baseline,
    /// Passive sharing of site and backhaul infrastructure
    Passive,
    /// Active sharing, adding RAN equipment, operations and power
    Active,
    /// Shared rural network (active-style sharing, rural geotypes only)
    Srn,
}

/// Spectrum or tax pricing level relative to the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RateLevel {
    /// Baseline rate
    Baseline,
    /// Reduced rate
    Low,
    /// Increased rate
    High,
}

/// Power supply strategy for off-grid sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PowerStrategy {
    /// Diesel generation at sites without grid access
    Baseline,
    /// Renewable generation at sites without grid access
    Renewable,
}

/// A fully parsed technology/policy strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strategy {
    /// Technology generation being deployed
    pub generation: Generation,
    /// Core network architecture
    pub core: CoreType,
    /// Backhaul technology
    pub backhaul: Backhaul,
    /// Infrastructure sharing policy
    pub sharing: Sharing,
    /// Operator-count row used for market scaling
    pub networks: Sharing,
    /// Spectrum pricing level
    pub spectrum: RateLevel,
    /// Taxation level
    pub tax: RateLevel,
    /// Power supply strategy
    pub power: PowerStrategy,
}

/// Parse one strategy token, naming the field on failure
fn parse_token<T: FromStr>(token: &str, field: &str, strategy: &str) -> Result<T> {
    token.parse().map_err(|_| {
        anyhow!("Invalid strategy {strategy:?}: unrecognised {field} token {token:?}")
    })
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let tokens: Vec<&str> = s.split('_').collect();
        ensure!(
            tokens.len() == 8,
            "Invalid strategy {s:?}: expected 8 underscore-separated tokens \
            (generation, core, backhaul, sharing, networks, spectrum, tax, power), got {}",
            tokens.len()
        );

        Ok(Self {
            generation: parse_token(tokens[0], "generation", s)?,
            core: parse_token(tokens[1], "core", s)?,
            backhaul: parse_token(tokens[2], "backhaul", s)?,
            sharing: parse_token(tokens[3], "sharing", s)?,
            networks: parse_token(tokens[4], "networks", s)?,
            spectrum: parse_token(tokens[5], "spectrum", s)?,
            tax: parse_token(tokens[6], "tax", s)?,
            power: parse_token(tokens[7], "power", s)?,
        })
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}_{}_{}_{}",
            self.generation,
            self.core,
            self.backhaul,
            self.sharing,
            self.networks,
            self.spectrum,
            self.tax,
            self.power
        )
    }
}

impl<'de> Deserialize<'de> for Strategy {
    fn deserialize<D>(deserialiser: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserialiser)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A demand scenario: a label plus per-geotype speed targets in Mbps.
///
/// Written as `<label>_<urban>_<suburban>_<rural>`, e.g. `baseline_30_30_30`.
/// A target of 0 for a geotype means no infrastructure is required there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Scenario label (e.g. "baseline", "low", "high")
    pub label: String,
    /// Speed target for urban regions (Mbps)
    pub urban_mbps: u32,
    /// Speed target for suburban regions (Mbps)
    pub suburban_mbps: u32,
    /// Speed target for rural regions (Mbps)
    pub rural_mbps: u32,
}

impl Scenario {
    /// The speed target for the given geotype
    pub fn target(&self, geotype: Geotype) -> u32 {
        match geotype {
            Geotype::Urban => self.urban_mbps,
            Geotype::Suburban => self.suburban_mbps,
            Geotype::Rural => self.rural_mbps,
        }
    }
}

impl FromStr for Scenario {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let tokens: Vec<&str> = s.split('_').collect();
        ensure!(
            tokens.len() == 4,
            "Invalid scenario {s:?}: expected 4 underscore-separated tokens \
            (label, urban, suburban, rural), got {}",
            tokens.len()
        );
        let target = |token: &str, field| {
            token
                .parse()
                .map_err(|_| anyhow!("Invalid scenario {s:?}: bad {field} speed target {token:?}"))
        };

        Ok(Self {
            label: tokens[0].to_string(),
            urban_mbps: target(tokens[1], "urban")?,
            suburban_mbps: target(tokens[2], "suburban")?,
            rural_mbps: target(tokens[3], "rural")?,
        })
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.label, self.urban_mbps, self.suburban_mbps, self.rural_mbps
        )
    }
}

impl<'de> Deserialize<'de> for Scenario {
    fn deserialize<D>(deserialiser: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserialiser)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
