use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Implements "Code Table 4.4: Indicator of unit of time range".
#[derive(Debug, Clone, Copy, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Table4_4 {
    Minute = 0,
    Hour,
    Day,
    Month,
    Year,
    Decade,
    Normal,
    Century,
    ThreeHours = 10,
    SixHours,
    TwelveHours,
    Second,
    Missing = 255,
}

impl Table4_4 {
    /// Fixed factor converting a value in this unit to hours.
    ///
    /// Calendar-dependent units (months, years, ...) have no fixed duration
    /// and return `None`.
    pub fn hours_factor(&self) -> Option<f64> {
        let factor = match self {
            Self::Minute => 1. / 60.,
            Self::Hour => 1.,
            Self::Day => 24.,
            Self::ThreeHours => 3.,
            Self::SixHours => 6.,
            Self::TwelveHours => 12.,
            Self::Second => 1. / 3600.,
            _ => return None,
        };
        Some(factor)
    }
}

/// Implements "Code Table 4.5: Fixed surface types and units" for the
/// surface types this crate translates.
#[derive(Debug, Clone, Copy, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Table4_5 {
    GroundOrWaterSurface = 1,
    IsobaricSurface = 100,
    MeanSeaLevel = 101,
    AltitudeAboveMeanSeaLevel = 102,
    HeightAboveGround = 103,
    SigmaLevel = 104,
    HybridLevel = 105,
    DepthBelowLandSurface = 106,
    IsentropicLevel = 107,
    Missing = 255,
}

impl Table4_5 {
    /// Returns the unit string defined for the type of the surface, if any.
    pub fn unit(&self) -> Option<&'static str> {
        let unit = match self {
            Self::IsobaricSurface => "Pa",
            Self::AltitudeAboveMeanSeaLevel => "m",
            Self::HeightAboveGround => "m",
            Self::SigmaLevel => r#""sigma" value"#,
            Self::DepthBelowLandSurface => "m",
            Self::IsentropicLevel => "K",
            _ => return None,
        };
        Some(unit)
    }
}

/// Implements "Code Table 4.10: Type of statistical processing".
#[derive(Debug, Clone, Copy, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Table4_10 {
    Average = 0,
    Accumulation,
    Maximum,
    Minimum,
    Difference,
    RootMeanSquare,
    StandardDeviation,
    Covariance,
    DifferenceInverted,
    Ratio,
    Missing = 255,
}

impl Table4_10 {
    /// The cube cell-method name corresponding to this statistic, if any.
    pub fn cell_method_name(&self) -> Option<&'static str> {
        let name = match self {
            Self::Average => "mean",
            Self::Accumulation => "sum",
            Self::Maximum => "maximum",
            Self::Minimum => "minimum",
            Self::StandardDeviation => "standard_deviation",
            _ => return None,
        };
        Some(name)
    }

    /// The inverse of [`cell_method_name`](Self::cell_method_name).
    pub fn from_cell_method_name(name: &str) -> Option<Self> {
        let statistic = match name {
            "mean" => Self::Average,
            "sum" => Self::Accumulation,
            "maximum" => Self::Maximum,
            "minimum" => Self::Minimum,
            "standard_deviation" => Self::StandardDeviation,
            _ => return None,
        };
        Some(statistic)
    }
}

/// Implements "Code Table 4.11: Type of time intervals".
#[derive(Debug, Clone, Copy, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Table4_11 {
    SameForecastTime = 1,
    SameStartTime,
    SameValidTimeForecastDecremented,
    SameValidTimeForecastIncremented,
    FloatingSubinterval,
    Missing = 255,
}
