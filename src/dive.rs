//! Validated dive inputs shared by every computation.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Breathing gas, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasMix {
    /// Oxygen percentage (0-100)
    pub o2: f64,
    /// Helium percentage (0-100)
    #[serde(default)]
    pub he: f64,
}

impl GasMix {
    pub const AIR: GasMix = GasMix { o2: 21.0, he: 0.0 };

    /// Build a mix, rejecting fractions outside 0..=100 or summing above 100.
    pub fn new(o2: f64, he: f64) -> Result<Self> {
        let mix = Self { o2, he };
        mix.validate()?;
        Ok(mix)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.o2.is_finite() && (0.0..=100.0).contains(&self.o2)) {
            return Err(Error::invalid(
                "o2",
                format!("percentage must be within 0..=100, got {}", self.o2),
            ));
        }
        if !(self.he.is_finite() && (0.0..=100.0).contains(&self.he)) {
            return Err(Error::invalid(
                "he",
                format!("percentage must be within 0..=100, got {}", self.he),
            ));
        }
        if self.o2 + self.he > 100.0 {
            return Err(Error::invalid(
                "gas",
                format!("O2 + He exceed 100% ({} + {})", self.o2, self.he),
            ));
        }
        Ok(())
    }

    /// Air's 21 % oxygen with `he` percent helium. Hypoxic mixes give up the
    /// oxygen the helium leaves no room for, so 12/85 becomes 15/85.
    pub fn air_with_he(he: f64) -> Result<Self> {
        let o2 = if he > 100.0 - Self::AIR.o2 {
            (100.0 - he).max(0.0)
        } else {
            Self::AIR.o2
        };
        Self::new(o2, he)
    }

    pub fn o2_fraction(&self) -> f64 {
        self.o2 / 100.0
    }

    pub fn he_fraction(&self) -> f64 {
        self.he / 100.0
    }
}

impl std::fmt::Display for GasMix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}/{:.0}", self.o2, self.he)
    }
}

/// Depth, bottom time and bottom gas of a planned dive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiveParameters {
    /// Maximum depth in meters
    pub depth_m: f64,
    /// Bottom time in minutes, measured from leaving the surface
    pub bottom_time_min: f64,
    pub gas: GasMix,
}

impl DiveParameters {
    pub fn new(depth_m: f64, bottom_time_min: f64, gas: GasMix) -> Result<Self> {
        let params = Self {
            depth_m,
            bottom_time_min,
            gas,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("depth", self.depth_m)?;
        require_positive("bottom_time", self.bottom_time_min)?;
        self.gas.validate()
    }
}

/// Accepted probability of decompression sickness, strictly inside (0, 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct RiskTarget(f64);

impl RiskTarget {
    pub fn new(probability: f64) -> Result<Self> {
        if !(probability.is_finite() && probability > 0.0 && probability < 1.0) {
            return Err(Error::invalid(
                "probability",
                format!("must be inside (0, 1), got {probability}"),
            ));
        }
        Ok(Self(probability))
    }

    /// From a percentage such as `2.0` for 2 %.
    pub fn from_percent(percent: f64) -> Result<Self> {
        Self::new(percent / 100.0)
    }

    pub fn probability(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for RiskTarget {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RiskTarget> for f64 {
    fn from(value: RiskTarget) -> Self {
        value.0
    }
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(
            field,
            format!("must be a positive number, got {value}"),
        ))
    }
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(
            field,
            format!("must not be negative, got {value}"),
        ))
    }
}
