//! Automatic selection of gain and integration time, after the flow charts on page 21 of the
//! application note.
//!
//! [`Policy::OneShot`] keeps measuring until it trusts a reading and blocks on the delay in
//! between, roughly two seconds in the worst case.  [`Policy::Incremental`] reads once, reports
//! how the count sat against the [`Thresholds`] and moves one step for the next call.  Neither
//! can be cancelled once started.

use embedded_hal::delay::DelayNs;

use super::calibration::{resolution, settle_delay, READY_OVERHEAD};
use super::conversion;
use super::ladder;
use super::registers::{Register, RegisterAccess, SHUTDOWN};
use super::setting::{Gain, IntegrationTime, Setting};
use super::{Error, Veml7700};

/// First setting tried by the one-shot coarse search.
pub const COARSE_START: Setting = Setting::new(Gain::OneEighth, IntegrationTime::Ms100);
/// At or below this count the one-shot search treats the reading as dark.
pub const DARK_COUNT: u16 = 100;
/// Below this count the one-shot fine search accepts the reading.
pub const FINE_CEILING: u16 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Policy {
    OneShot,
    /// `correction` applies the high lux correction at the least sensitive setting.
    Incremental { correction: bool },
}

impl Default for Policy {
    fn default() -> Self {
        Self::Incremental { correction: true }
    }
}

impl Policy {
    #[must_use]
    pub const fn default_thresholds(self) -> Thresholds {
        match self {
            Self::OneShot => Thresholds::LADDER,
            Self::Incremental { .. } => Thresholds::INCREMENTAL,
        }
    }
}

/// Raw count window that auto-ranging tries to keep readings in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Thresholds {
    low: u16,
    high: u16,
}

impl Thresholds {
    pub const INCREMENTAL: Self = Self {
        low: 100,
        high: 10_000,
    };
    pub const LADDER: Self = Self {
        low: 1000,
        high: 30_000,
    };

    /// `None` unless `low < high`.
    #[must_use]
    pub const fn new(low: u16, high: u16) -> Option<Self> {
        if low < high {
            Some(Self { low, high })
        } else {
            None
        }
    }

    #[must_use]
    pub const fn low(self) -> u16 {
        self.low
    }

    #[must_use]
    pub const fn high(self) -> u16 {
        self.high
    }

    #[must_use]
    pub const fn classify(self, raw: u16) -> Range {
        if raw < self.low {
            Range::TooLow
        } else if raw > self.high {
            Range::TooHigh
        } else {
            Range::Good
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Range {
    Good,
    TooLow,
    TooHigh,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AutoReading {
    /// Computed at the setting the reading was taken with, before any adjustment.
    pub lux: f32,
    pub raw: u16,
    pub status: Range,
}

impl<R: RegisterAccess, DELAY: DelayNs> Veml7700<R, DELAY> {
    /// Takes a reading using the configured [`Policy`].  One-shot readings that succeed are
    /// always [`Range::Good`].
    ///
    /// # Errors
    ///
    /// As [`Veml7700::read_lux_one_shot`] or [`Veml7700::read_lux_incremental`].
    pub fn read_auto(&mut self) -> Result<AutoReading, Error<R::Error>> {
        match self.policy {
            Policy::OneShot => {
                let (lux, raw) = self.search()?;
                Ok(AutoReading {
                    lux,
                    raw,
                    status: Range::Good,
                })
            }
            Policy::Incremental { correction } => self.read_lux_incremental(correction),
        }
    }

    /// Searches for a setting that gives a usable count and returns lux from it.
    ///
    /// The coarse phase starts at the coarse start setting and raises gain, then integration
    /// time, while the count is dark.  A count that is already bright at the start hands over to
    /// the fine phase, which shortens integration time until the count drops below
    /// [`FINE_CEILING`].  The device keeps whatever setting the search ended on.
    ///
    /// # Errors
    ///
    /// - [`Error::TooBright`]: still too bright at 25 ms
    /// - [`Error::Unresolved`]: the fine phase ran out of attempts
    /// - [`Error::Bus`]: the register interface failed
    pub fn read_lux_one_shot(&mut self) -> Result<f32, Error<R::Error>> {
        self.search().map(|(lux, _)| lux)
    }

    /// Lux together with the raw count it was computed from.
    fn search(&mut self) -> Result<(f32, u16), Error<R::Error>> {
        let mut setting = self.coarse_start;
        let mut raw = self.measure(setting)?;
        let mut first = true;
        loop {
            if raw > DARK_COUNT {
                if first {
                    break;
                }
                return Ok((coarse_lux(raw, setting), raw));
            }
            match ladder::coarse_step(setting) {
                Some(next) => setting = next,
                // best effort, nothing more sensitive left
                None => return Ok((coarse_lux(raw, setting), raw)),
            }
            first = false;
            raw = self.measure(setting)?;
        }

        for _ in IntegrationTime::ASCENDING {
            let Some(integration_time) = setting.integration_time.shorter() else {
                #[cfg(feature = "defmt")]
                defmt::debug!("saturated at {}", setting);
                return Err(Error::TooBright);
            };
            setting.integration_time = integration_time;
            let raw = self.measure(setting)?;
            if raw < FINE_CEILING {
                return Ok((conversion::convert_to_lux(raw, setting), raw));
            }
        }
        Err(Error::Unresolved)
    }

    /// Reads once, classifies the count against the thresholds and, when it is out of range,
    /// moves gain or integration time by one step for the next call.
    ///
    /// The caller is responsible for waiting long enough between calls for the sensor to
    /// complete an integration at the new setting.
    ///
    /// # Errors
    ///
    /// [`Error::Bus`]: the register interface failed
    pub fn read_lux_incremental(
        &mut self,
        apply_correction: bool,
    ) -> Result<AutoReading, Error<R::Error>> {
        let raw = self.read_als()?;
        let mut lux = conversion::to_lux(conversion::normalize(raw, self.setting));
        if apply_correction {
            lux = conversion::correct_lux(lux, self.setting);
        }
        let status = self.thresholds.classify(raw);
        #[cfg(feature = "defmt")]
        defmt::trace!("raw {} at {}: {}", raw, self.setting, status);

        if let Some(next) = ladder::incremental_step(self.setting, status) {
            self.retune(next, true)?;
        }
        Ok(AutoReading { lux, raw, status })
    }

    /// Moves one step along the setting ladder if `raw` is outside the thresholds, restoring
    /// the previous enable state afterwards.  Returns whether the setting changed.
    ///
    /// # Errors
    ///
    /// [`Error::Bus`]: the register interface failed
    pub fn optimize(&mut self, raw: u16) -> Result<bool, Error<R::Error>> {
        let next = if raw <= self.thresholds.low() {
            ladder::more_sensitive(self.setting)
        } else if raw > self.thresholds.high() {
            ladder::less_sensitive(self.setting)
        } else {
            None
        };
        match next {
            Some(setting) => {
                let was_enabled = self.enabled()?;
                self.retune(setting, was_enabled)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Shuts the sensor down, writes gain and integration time and powers it back up if `enable`,
    /// so integration restarts at the new setting.
    fn retune(&mut self, setting: Setting, enable: bool) -> Result<(), R::Error> {
        #[cfg(feature = "defmt")]
        defmt::debug!("retune {} -> {}", self.setting, setting);
        self.registers.write_field(SHUTDOWN, 1)?;
        let config = self.registers.read_register(Register::AlsConf)?;
        self.registers.write_register(Register::AlsConf, setting.encode(config))?;
        self.setting = setting;
        if enable {
            self.registers.write_field(SHUTDOWN, 0)?;
        }
        Ok(())
    }

    fn measure(&mut self, setting: Setting) -> Result<u16, R::Error> {
        self.retune(setting, true)?;
        let wait = settle_delay(setting.integration_time) + READY_OVERHEAD;
        self.delay.delay_ms(wait.to_millis());
        let raw = self.read_als()?;
        #[cfg(feature = "defmt")]
        defmt::trace!("raw {} at {}", raw, setting);
        Ok(raw)
    }
}

fn coarse_lux(raw: u16, setting: Setting) -> f32 {
    f32::from(raw) * resolution(setting.integration_time, setting.gain)
}
