//! Lookup constants from the application note lux table (page 5) and refresh timing (page 16).

use fugit::MillisDurationU32;

use super::setting::{Gain, IntegrationTime, PowerSaveMode};

/// Added to the integration time before a fresh conversion is read back.
pub const READY_OVERHEAD: MillisDurationU32 = MillisDurationU32::from_ticks(20);
/// 2.5 ms in the application note, rounded up.
pub const POWER_ON_WAIT: MillisDurationU32 = MillisDurationU32::from_ticks(3);

/// lux/count at 2x gain and 800 ms.
const FINEST_RESOLUTION: f32 = 0.0036;

/// Scales a count taken at `gain` to the count 1x gain would have produced.
#[must_use]
pub const fn gain_multiplier(gain: Gain) -> f32 {
    match gain {
        Gain::OneEighth => 8.0,
        Gain::OneQuarter => 4.0,
        Gain::One => 1.0,
        Gain::Two => 0.5,
    }
}

/// Scales a count taken at `integration_time` to the count 100 ms would have produced.
#[must_use]
pub const fn integration_multiplier(integration_time: IntegrationTime) -> f32 {
    match integration_time {
        IntegrationTime::Ms25 => 4.0,
        IntegrationTime::Ms50 => 2.0,
        IntegrationTime::Ms100 => 1.0,
        IntegrationTime::Ms200 => 0.5,
        IntegrationTime::Ms400 => 0.25,
        IntegrationTime::Ms800 => 0.125,
    }
}

#[must_use]
pub const fn settle_delay(integration_time: IntegrationTime) -> MillisDurationU32 {
    MillisDurationU32::from_ticks(integration_time.millis())
}

/// Time between fresh samples with power saving enabled in `mode`.
#[must_use]
pub fn refresh_time(integration_time: IntegrationTime, mode: PowerSaveMode) -> MillisDurationU32 {
    let power_save = MillisDurationU32::from_ticks(match mode {
        PowerSaveMode::Mode1 => 500,
        PowerSaveMode::Mode2 => 1000,
        PowerSaveMode::Mode3 => 2000,
        PowerSaveMode::Mode4 => 4000,
    });
    power_save + settle_delay(integration_time) + POWER_ON_WAIT
}

/// lux represented by one count at the given operating point.
#[must_use]
pub fn resolution(integration_time: IntegrationTime, gain: Gain) -> f32 {
    let gain_factor = match gain {
        Gain::Two => 1.0,
        Gain::One => 2.0,
        Gain::OneQuarter => 8.0,
        Gain::OneEighth => 16.0,
    };
    let integration_factor = match integration_time {
        IntegrationTime::Ms800 => 1.0,
        IntegrationTime::Ms400 => 2.0,
        IntegrationTime::Ms200 => 4.0,
        IntegrationTime::Ms100 => 8.0,
        IntegrationTime::Ms50 => 16.0,
        IntegrationTime::Ms25 => 32.0,
    };
    FINEST_RESOLUTION * gain_factor * integration_factor
}
