/// Antecedent-index generator constants.
use super::params::PowerLaw;

/// Upper bound of the antecedent precipitation index [mm].
pub const PA_CAP: f64 = 80.0;

/// Steps in the trailing rainstorm-centre window (current step included).
pub const STORM_WINDOW: usize = 24;

/// The decay factor is read for the month of `start + 47 h`.
pub const DECAY_MONTH_LOOKAHEAD_HOURS: i64 = 47;

/// Dry hours that close a rainfall event at Dongpu.
pub const DONGPU_EVENT_GAP_HOURS: usize = 13;

/// Dry hours that close a rainfall event at Dafangying.
pub const DAFANGYING_EVENT_GAP_HOURS: usize = 10;

/// Last year served by the legacy station network.
pub const STATION_CUTOFF_YEAR: i32 = 2018;

// -- Calibrated power laws R = a * (P + Pa)^b --

pub const DONGPU_UPSTREAM: PowerLaw = PowerLaw {
    coefficient: 0.000_591_993_994_698_61,
    exponent: 2.152_194_939_311_08,
};

pub const DONGPU_DOWNSTREAM: PowerLaw = PowerLaw {
    coefficient: 0.000_866_974_103_358_191,
    exponent: 2.170_091_036_440_37,
};

pub const DAFANGYING_UPSTREAM: PowerLaw = PowerLaw {
    coefficient: 0.000_780_474_937_164_339,
    exponent: 2.042_525_709_883_74,
};

pub const DAFANGYING_DOWNSTREAM: PowerLaw = PowerLaw {
    coefficient: 0.000_470_303_804_164_62,
    exponent: 2.203_057_375_839_84,
};
