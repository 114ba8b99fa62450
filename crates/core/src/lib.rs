//! Core units, channels, and sweep primitives shared across the rocket sweep workspace.

/// Physical constants expressed in SI units.
pub mod constants {
    /// Specific gas constant of dry air (J/(kg·K)), as used by the dynamic pressure expression.
    pub const DRY_AIR_GAS_CONSTANT: f64 = 287.0;
    /// Metres per international foot.
    pub const METRES_PER_FOOT: f64 = 0.3048;
    /// Pascals per pound-force per square inch.
    pub const PASCALS_PER_PSI: f64 = 6_894.757_293_168;
}

/// Output units and conversion from SI.
pub mod units {
    use super::constants::{METRES_PER_FOOT, PASCALS_PER_PSI};

    /// Unit a channel is exported in. Flight data always travels in SI.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Unit {
        Second,
        Millisecond,
        Meter,
        Kilometer,
        Foot,
        Pascal,
        Kilopascal,
        Psi,
    }

    impl Unit {
        /// Symbol shown in CSV headers.
        pub fn symbol(self) -> &'static str {
            match self {
                Self::Second => "s",
                Self::Millisecond => "ms",
                Self::Meter => "m",
                Self::Kilometer => "km",
                Self::Foot => "ft",
                Self::Pascal => "Pa",
                Self::Kilopascal => "kPa",
                Self::Psi => "psi",
            }
        }

        /// Look up a unit by its header symbol.
        pub fn from_symbol(symbol: &str) -> Option<Self> {
            Some(match symbol {
                "s" => Self::Second,
                "ms" => Self::Millisecond,
                "m" => Self::Meter,
                "km" => Self::Kilometer,
                "ft" => Self::Foot,
                "Pa" => Self::Pascal,
                "kPa" => Self::Kilopascal,
                "psi" => Self::Psi,
                _ => return None,
            })
        }

        /// Convert an SI value (s, m, Pa) into this unit.
        #[inline]
        pub fn from_si(self, value: f64) -> f64 {
            match self {
                Self::Second | Self::Meter | Self::Pascal => value,
                Self::Millisecond => value * 1_000.0,
                Self::Kilometer | Self::Kilopascal => value / 1_000.0,
                Self::Foot => value / METRES_PER_FOOT,
                Self::Psi => value / PASCALS_PER_PSI,
            }
        }
    }
}

/// Flight data quantities and the ordered channel table used for export.
pub mod channels {
    use super::units::Unit;

    /// Symbol of total velocity in engine output.
    pub const SYMBOL_TOTAL_VELOCITY: &str = "Vt";
    /// Symbol of ambient air pressure in engine output.
    pub const SYMBOL_AIR_PRESSURE: &str = "P";
    /// Symbol of ambient air temperature in engine output.
    pub const SYMBOL_AIR_TEMPERATURE: &str = "T";

    /// Semantic quantity carried by one column of flight data.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub enum Quantity {
        Time,
        Altitude,
        PositionX,
        PositionY,
        /// Channel produced by a custom expression attached to the document.
        Custom { name: String, symbol: String },
    }

    impl Quantity {
        /// Human readable name used in CSV headers.
        pub fn name(&self) -> &str {
            match self {
                Self::Time => "Time",
                Self::Altitude => "Altitude",
                Self::PositionX => "Position East of launch",
                Self::PositionY => "Position North of launch",
                Self::Custom { name, .. } => name,
            }
        }

        /// Short symbol the engine uses to key this column.
        pub fn symbol(&self) -> &str {
            match self {
                Self::Time => "t",
                Self::Altitude => "h",
                Self::PositionX => "Px",
                Self::PositionY => "Py",
                Self::Custom { symbol, .. } => symbol,
            }
        }
    }

    /// Symbols reserved by built-in quantities and formula inputs.
    pub const RESERVED_SYMBOLS: &[&str] = &[
        "t",
        "h",
        "Px",
        "Py",
        SYMBOL_TOTAL_VELOCITY,
        SYMBOL_AIR_PRESSURE,
        SYMBOL_AIR_TEMPERATURE,
    ];

    /// One exported column: what it measures and which unit it is written in.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DataChannel {
        pub quantity: Quantity,
        pub unit: Unit,
    }

    impl DataChannel {
        /// Pair a quantity with its export unit.
        pub fn new(quantity: Quantity, unit: Unit) -> Self {
            Self { quantity, unit }
        }

        /// Header label, e.g. `Altitude (m)`.
        pub fn label(&self) -> String {
            format!("{} ({})", self.quantity.name(), self.unit.symbol())
        }
    }

    /// Default export columns, in header order.
    pub const DEFAULT_CHANNELS: [(Quantity, Unit); 4] = [
        (Quantity::Time, Unit::Second),
        (Quantity::Altitude, Unit::Meter),
        (Quantity::PositionX, Unit::Meter),
        (Quantity::PositionY, Unit::Meter),
    ];

    /// Materialize [`DEFAULT_CHANNELS`] into owned channels.
    pub fn default_channels() -> Vec<DataChannel> {
        DEFAULT_CHANNELS
            .into_iter()
            .map(|(quantity, unit)| DataChannel::new(quantity, unit))
            .collect()
    }
}

/// Launch and environment options handed to the engine for a single run.
pub mod options {
    use serde::Serialize;

    /// Fixed launch parameters shared by every run of a sweep.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
    pub struct LaunchSettings {
        pub rod_length_m: f64,
        pub rod_angle_deg: f64,
        pub into_wind: bool,
    }

    impl Default for LaunchSettings {
        fn default() -> Self {
            Self {
                rod_length_m: 6.0,
                rod_angle_deg: 5.0,
                into_wind: true,
            }
        }
    }

    /// Environment and launch configuration for one simulation run.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct SimulationConfig {
        /// Average wind speed (m/s).
        pub wind_speed_average: f64,
        /// Turbulence intensity as a fraction of the average wind speed.
        pub wind_turbulence_intensity: f64,
        pub launch_rod_length_m: f64,
        pub launch_rod_angle_deg: f64,
        pub launch_into_wind: bool,
    }
}

/// Sweep schedule: per-iteration values as pure functions of the index.
pub mod schedule {
    use serde::Serialize;

    use super::options::{LaunchSettings, SimulationConfig};

    /// Varying quantities of a sweep and how far they advance per iteration.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
    pub struct SweepParameters {
        pub iterations: usize,
        pub base_wind_speed: f64,
        pub wind_step: f64,
        pub base_turbulence: f64,
        pub turbulence_step: f64,
    }

    impl SweepParameters {
        /// Average wind speed (m/s) of iteration `iteration`.
        #[inline]
        pub fn wind_speed(&self, iteration: usize) -> f64 {
            self.base_wind_speed + iteration as f64 * self.wind_step
        }

        /// Turbulence intensity of iteration `iteration`.
        #[inline]
        pub fn turbulence(&self, iteration: usize) -> f64 {
            self.base_turbulence + iteration as f64 * self.turbulence_step
        }

        /// Build the simulation options for iteration `iteration`.
        pub fn config_for(&self, iteration: usize, launch: &LaunchSettings) -> SimulationConfig {
            SimulationConfig {
                wind_speed_average: self.wind_speed(iteration),
                wind_turbulence_intensity: self.turbulence(iteration),
                launch_rod_length_m: launch.rod_length_m,
                launch_rod_angle_deg: launch.rod_angle_deg,
                launch_into_wind: launch.into_wind,
            }
        }
    }
}
