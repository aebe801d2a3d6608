//! Raw counts to lux.
//!
//! Counts are first normalized to the [`Setting::REFERENCE`] scale (1x gain, 100 ms) and then
//! multiplied by [`LUX_PER_COUNT`].  At [`Setting::LEAST_SENSITIVE`] the response bends at
//! high illuminance and an empirical polynomial straightens it out.

use super::calibration::{gain_multiplier, integration_multiplier};
use super::setting::Setting;

/// lux per normalized count.  The white channel uses the same multiplier although it is not
/// clear that it is the right one.
pub const LUX_PER_COUNT: f32 = 0.0576;

#[must_use]
pub fn normalize(raw: u16, setting: Setting) -> f32 {
    f32::from(raw)
        * gain_multiplier(setting.gain)
        * integration_multiplier(setting.integration_time)
}

#[must_use]
pub fn to_lux(normalized: f32) -> f32 {
    normalized * LUX_PER_COUNT
}

/// Non-linearity correction for the ALS channel.  Identity everywhere except the least
/// sensitive setting.
#[must_use]
pub fn correct_lux(lux: f32, setting: Setting) -> f32 {
    if !setting.is_non_linear() {
        return lux;
    }
    let x = f64::from(lux);
    ((((6.0135e-13 * x - 9.3924e-9) * x + 8.1488e-5) * x + 1.0023) * x) as f32
}

/// Non-linearity correction for the white channel.  Identity everywhere except the least
/// sensitive setting.
#[must_use]
pub fn correct_white(white: f32, setting: Setting) -> f32 {
    if !setting.is_non_linear() {
        return white;
    }
    let w = f64::from(white);
    ((((2e-15 * w + 4e-12) * w + 9e-06) * w + 1.0179) * w - 11.052) as f32
}

/// Calibrated and corrected lux for a raw ALS count taken at `setting`.
#[must_use]
pub fn convert_to_lux(raw: u16, setting: Setting) -> f32 {
    correct_lux(to_lux(normalize(raw, setting)), setting)
}
