//! Catalogue of the SoilGrids properties, their depth intervals and the
//! factors that turn published integer values into conventional units.
//!
//! See <https://www.isric.org/explore/soilgrids/faq-soilgrids>.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SoilProperty {
    /// Bulk density of the fine earth fraction.
    Bdod,
    /// Cation exchange capacity at pH 7.
    Cec,
    /// Volumetric fraction of coarse fragments (> 2 mm).
    Cfvo,
    Clay,
    Nitrogen,
    /// Soil pH in water.
    Phh2o,
    Sand,
    Silt,
    /// Soil organic carbon content.
    Soc,
    /// Organic carbon density.
    Ocd,
    /// Organic carbon stock, only published for 0-30 cm.
    Ocs,
}

impl SoilProperty {
    pub const ALL: [SoilProperty; 11] = [
        SoilProperty::Bdod,
        SoilProperty::Cec,
        SoilProperty::Cfvo,
        SoilProperty::Clay,
        SoilProperty::Nitrogen,
        SoilProperty::Phh2o,
        SoilProperty::Sand,
        SoilProperty::Silt,
        SoilProperty::Soc,
        SoilProperty::Ocd,
        SoilProperty::Ocs,
    ];

    /// Identifier used by both the REST and WCS services.
    pub fn name(self) -> &'static str {
        match self {
            SoilProperty::Bdod => "bdod",
            SoilProperty::Cec => "cec",
            SoilProperty::Cfvo => "cfvo",
            SoilProperty::Clay => "clay",
            SoilProperty::Nitrogen => "nitrogen",
            SoilProperty::Phh2o => "phh2o",
            SoilProperty::Sand => "sand",
            SoilProperty::Silt => "silt",
            SoilProperty::Soc => "soc",
            SoilProperty::Ocd => "ocd",
            SoilProperty::Ocs => "ocs",
        }
    }

    pub fn long_name(self) -> &'static str {
        match self {
            SoilProperty::Bdod => "Bulk density of the fine earth fraction",
            SoilProperty::Cec => "Cation exchange capacity of the soil",
            SoilProperty::Cfvo => "Volumetric fraction of coarse fragments",
            SoilProperty::Clay => "Proportion of clay particles in the fine earth fraction",
            SoilProperty::Nitrogen => "Total nitrogen",
            SoilProperty::Phh2o => "Soil pH",
            SoilProperty::Sand => "Proportion of sand particles in the fine earth fraction",
            SoilProperty::Silt => "Proportion of silt particles in the fine earth fraction",
            SoilProperty::Soc => "Soil organic carbon content in the fine earth fraction",
            SoilProperty::Ocd => "Organic carbon density",
            SoilProperty::Ocs => "Organic carbon stocks",
        }
    }

    /// Divisor from mapped (published) units to [`Self::target_units`].
    pub fn conversion_factor(self) -> f64 {
        match self {
            SoilProperty::Bdod | SoilProperty::Nitrogen => 100.0,
            _ => 10.0,
        }
    }

    pub fn target_units(self) -> &'static str {
        match self {
            SoilProperty::Bdod => "kg/dm3",
            SoilProperty::Cec => "cmol(c)/kg",
            SoilProperty::Cfvo => "cm3/100cm3",
            SoilProperty::Clay | SoilProperty::Sand | SoilProperty::Silt => "g/100g",
            SoilProperty::Nitrogen | SoilProperty::Soc => "g/kg",
            SoilProperty::Phh2o => "pH",
            SoilProperty::Ocd => "kg/m3",
            SoilProperty::Ocs => "kg/m2",
        }
    }

    /// Depth intervals combined into the single layer written by bulk
    /// downloads, with their weights.
    pub fn aggregation_depths(self) -> &'static [(Depth, f64)] {
        match self {
            SoilProperty::Ocs => &[(Depth::D0_30, 1.0)],
            _ => &[
                (Depth::D0_5, 1.0),
                (Depth::D5_15, 2.0),
                (Depth::D15_30, 3.0),
                (Depth::D30_60, 6.0),
            ],
        }
    }

    /// Human readable interval covered by [`Self::aggregation_depths`].
    pub fn aggregation_interval(self) -> &'static str {
        match self {
            SoilProperty::Ocs => "0-30cm",
            _ => "0-60cm",
        }
    }

    pub(crate) fn convert(self, mapped: f64) -> f64 {
        mapped / self.conversion_factor()
    }
}

impl fmt::Display for SoilProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SoilProperty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SoilProperty::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid("property", format!("unknown soil property '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Depth {
    D0_5,
    D5_15,
    D15_30,
    D30_60,
    D60_100,
    D100_200,
    /// Only used by `ocs`.
    D0_30,
}

impl Depth {
    pub const STANDARD: [Depth; 6] = [
        Depth::D0_5,
        Depth::D5_15,
        Depth::D15_30,
        Depth::D30_60,
        Depth::D60_100,
        Depth::D100_200,
    ];

    /// Label without unit, as used in coverage identifiers (`clay_0-5cm_mean`).
    pub fn label(self) -> &'static str {
        match self {
            Depth::D0_5 => "0-5",
            Depth::D5_15 => "5-15",
            Depth::D15_30 => "15-30",
            Depth::D30_60 => "30-60",
            Depth::D60_100 => "60-100",
            Depth::D100_200 => "100-200",
            Depth::D0_30 => "0-30",
        }
    }

    /// Top and bottom of the interval, in cm.
    pub fn range_cm(self) -> (u32, u32) {
        match self {
            Depth::D0_5 => (0, 5),
            Depth::D5_15 => (5, 15),
            Depth::D15_30 => (15, 30),
            Depth::D30_60 => (30, 60),
            Depth::D60_100 => (60, 100),
            Depth::D100_200 => (100, 200),
            Depth::D0_30 => (0, 30),
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}cm", self.label())
    }
}

impl FromStr for Depth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.trim().trim_end_matches("cm");
        Depth::STANDARD
            .into_iter()
            .chain(std::iter::once(Depth::D0_30))
            .find(|d| d.label() == bare)
            .ok_or_else(|| Error::invalid("depth", format!("unknown depth interval '{s}'")))
    }
}
