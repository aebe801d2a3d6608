//! # VEML7700 Ambient Light Sensor
//!
//! The driver keeps the active [`Setting`] in memory.  It is read from the device once when the
//! driver is built and every write made through the driver keeps it in step, so conversions never
//! need to go back to the bus for it.
//!
//! ## External Links
//!
//! - [Datasheet]
//! - [Application Note]
//!
//! [Datasheet]: https://www.vishay.com/docs/84286/veml7700.pdf
//! [Application Note]: https://www.vishay.com/docs/84323/designingveml7700.pdf

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use fugit::MillisDurationU32;

use crate::DriverUsingDelay;
use auto_range::{Policy, Thresholds};
use registers::{
    I2cRegisters, Register, RegisterAccess, GAIN, INTEGRATION_TIME, INTERRUPT_ENABLE,
    INTERRUPT_HIGH, INTERRUPT_LOW, PERSISTENCE, POWER_SAVE_ENABLE, POWER_SAVE_MODE, SHUTDOWN,
};
use setting::{Gain, IntegrationTime, Persistence, PowerSaveMode, Setting};

pub mod auto_range;
pub mod calibration;
pub mod conversion;
pub mod ladder;
pub mod registers;
pub mod setting;

pub const DEFAULT_ADDRESS: u8 = 0x10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The register interface failed.
    Bus(E),
    ArgumentError,
    /// A register held a code that does not name any setting.
    UnexpectedValue,
    /// Still saturated at the shortest integration time.  Ambient light is plausibly above
    /// 200 klx.
    TooBright,
    /// The one-shot search ran out of attempts without settling.
    Unresolved,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptStatus {
    pub high: bool,
    pub low: bool,
}

pub struct Veml7700<R, DELAY> {
    registers: R,
    delay: DELAY,
    setting: Setting,
    thresholds: Thresholds,
    policy: Policy,
    coarse_start: Setting,
}

impl<I2C: I2c, DELAY: DelayNs> DriverUsingDelay<I2C, DELAY, Error<I2C::Error>>
    for Veml7700<I2cRegisters<I2C>, DELAY>
{
    /// The cached setting is assumed to be the power-on default until [`DriverUsingDelay::init`]
    /// or [`Veml7700::sync_setting`] reads it back.  Lux read before either is scaled against
    /// that assumption.
    fn new_inner(i2c: I2C, address: u8, delay: DELAY) -> Self {
        Self::with_setting(
            I2cRegisters::new(i2c, address),
            delay,
            Policy::default(),
            Setting::REFERENCE,
        )
    }

    fn init_inner(mut self) -> Result<Self, Error<I2C::Error>> {
        self.enable(false)?;
        self.interrupt_enable(false)?;
        self.set_persistence(Persistence::One)?;
        self.set_gain(Gain::One)?;
        self.set_integration_time(IntegrationTime::Ms100)?;
        self.power_save_enable(false)?;
        self.enable(true)?;
        self.sync_setting()?;
        Ok(self)
    }
}

impl<R: RegisterAccess, DELAY: DelayNs> Veml7700<R, DELAY> {
    /// Builds a driver over any register interface, reading the active setting from the device.
    ///
    /// # Errors
    ///
    /// [`Error::UnexpectedValue`] if `ALS_CONF` holds a gain or integration time code that does
    /// not exist.
    pub fn from_registers(
        registers: R,
        delay: DELAY,
        policy: Policy,
    ) -> Result<Self, Error<R::Error>> {
        let mut veml = Self::with_setting(registers, delay, policy, Setting::REFERENCE);
        veml.sync_setting()?;
        Ok(veml)
    }

    fn with_setting(registers: R, delay: DELAY, policy: Policy, setting: Setting) -> Self {
        Self {
            registers,
            delay,
            setting,
            thresholds: policy.default_thresholds(),
            policy,
            coarse_start: auto_range::COARSE_START,
        }
    }

    /// Reads gain and integration time from `ALS_CONF` into the cached setting.
    ///
    /// # Errors
    ///
    /// [`Error::UnexpectedValue`] if either code does not exist.  The cache is left alone then.
    pub fn sync_setting(&mut self) -> Result<Setting, Error<R::Error>> {
        let config = self.registers.read_register(Register::AlsConf)?;
        self.setting = Setting::decode(config).ok_or(Error::UnexpectedValue)?;
        Ok(self.setting)
    }

    /// Selects the auto-ranging policy.  Thresholds are reset to the policy's defaults.
    #[must_use]
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self.thresholds = policy.default_thresholds();
        self
    }

    /// Where the coarse phase of [`Veml7700::read_lux_one_shot`] starts searching.
    #[must_use]
    pub fn with_coarse_start(mut self, setting: Setting) -> Self {
        self.coarse_start = setting;
        self
    }

    pub fn release(self) -> (R, DELAY) {
        (self.registers, self.delay)
    }

    pub fn setting(&self) -> Setting {
        self.setting
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Sets the raw count window used by auto-ranging.  A window too narrow for a single step
    /// to land inside it makes the controller hunt back and forth; that is not detected.
    ///
    /// # Errors
    ///
    /// [`Error::ArgumentError`] unless `low < high`.
    pub fn set_thresholds(&mut self, low: u16, high: u16) -> Result<(), Error<R::Error>> {
        self.thresholds = Thresholds::new(low, high).ok_or(Error::ArgumentError)?;
        Ok(())
    }

    pub fn enable(&mut self, enable: bool) -> Result<(), R::Error> {
        self.registers.write_field(SHUTDOWN, u16::from(!enable))
    }

    pub fn enabled(&mut self) -> Result<bool, R::Error> {
        Ok(self.registers.read_field(SHUTDOWN)? == 0)
    }

    pub fn interrupt_enable(&mut self, enable: bool) -> Result<(), R::Error> {
        self.registers.write_field(INTERRUPT_ENABLE, u16::from(enable))
    }

    pub fn interrupt_enabled(&mut self) -> Result<bool, R::Error> {
        Ok(self.registers.read_field(INTERRUPT_ENABLE)? != 0)
    }

    pub fn set_persistence(&mut self, persistence: Persistence) -> Result<(), R::Error> {
        self.registers.write_field(PERSISTENCE, u8::from(persistence).into())
    }

    pub fn persistence(&mut self) -> Result<Persistence, Error<R::Error>> {
        let code = self.registers.read_field(PERSISTENCE)?;
        u8::try_from(code)
            .ok()
            .and_then(|code| Persistence::try_from(code).ok())
            .ok_or(Error::UnexpectedValue)
    }

    pub fn set_gain(&mut self, gain: Gain) -> Result<(), R::Error> {
        self.registers.write_field(GAIN, u8::from(gain).into())?;
        self.setting.gain = gain;
        Ok(())
    }

    /// Reads the gain back from the device.
    pub fn gain(&mut self) -> Result<Gain, Error<R::Error>> {
        Gain::from_code(self.registers.read_field(GAIN)?).ok_or(Error::UnexpectedValue)
    }

    pub fn set_integration_time(
        &mut self,
        integration_time: IntegrationTime,
    ) -> Result<(), R::Error> {
        self.registers.write_field(INTEGRATION_TIME, u8::from(integration_time).into())?;
        self.setting.integration_time = integration_time;
        Ok(())
    }

    /// Reads the integration time back from the device.
    pub fn integration_time(&mut self) -> Result<IntegrationTime, Error<R::Error>> {
        IntegrationTime::from_code(self.registers.read_field(INTEGRATION_TIME)?)
            .ok_or(Error::UnexpectedValue)
    }

    pub fn power_save_enable(&mut self, enable: bool) -> Result<(), R::Error> {
        self.registers.write_field(POWER_SAVE_ENABLE, u16::from(enable))
    }

    pub fn power_save_enabled(&mut self) -> Result<bool, R::Error> {
        Ok(self.registers.read_field(POWER_SAVE_ENABLE)? != 0)
    }

    pub fn set_power_save_mode(&mut self, mode: PowerSaveMode) -> Result<(), R::Error> {
        self.registers.write_field(POWER_SAVE_MODE, u8::from(mode).into())
    }

    pub fn power_save_mode(&mut self) -> Result<PowerSaveMode, Error<R::Error>> {
        let code = self.registers.read_field(POWER_SAVE_MODE)?;
        u8::try_from(code)
            .ok()
            .and_then(|code| PowerSaveMode::try_from(code).ok())
            .ok_or(Error::UnexpectedValue)
    }

    /// Lower bound of the interrupt window.  Unrelated to the auto-ranging thresholds.
    pub fn set_low_threshold(&mut self, value: u16) -> Result<(), R::Error> {
        self.registers.write_register(Register::AlsLowThreshold, value)
    }

    pub fn low_threshold(&mut self) -> Result<u16, R::Error> {
        self.registers.read_register(Register::AlsLowThreshold)
    }

    /// Upper bound of the interrupt window.  Unrelated to the auto-ranging thresholds.
    pub fn set_high_threshold(&mut self, value: u16) -> Result<(), R::Error> {
        self.registers.write_register(Register::AlsHighThreshold, value)
    }

    pub fn high_threshold(&mut self) -> Result<u16, R::Error> {
        self.registers.read_register(Register::AlsHighThreshold)
    }

    pub fn interrupt_status(&mut self) -> Result<InterruptStatus, R::Error> {
        let status = self.registers.read_register(Register::AlsInt)?;
        Ok(InterruptStatus {
            high: status & INTERRUPT_HIGH != 0,
            low: status & INTERRUPT_LOW != 0,
        })
    }

    pub fn read_als(&mut self) -> Result<u16, R::Error> {
        self.registers.read_register(Register::Als)
    }

    pub fn read_white(&mut self) -> Result<u16, R::Error> {
        self.registers.read_register(Register::White)
    }

    /// ALS reading in lux without non-linearity correction.
    pub fn read_lux(&mut self) -> Result<f32, R::Error> {
        let raw = self.read_als()?;
        Ok(conversion::to_lux(conversion::normalize(raw, self.setting)))
    }

    pub fn read_lux_corrected(&mut self) -> Result<f32, R::Error> {
        let lux = self.read_lux()?;
        Ok(conversion::correct_lux(lux, self.setting))
    }

    pub fn read_white_lux(&mut self) -> Result<f32, R::Error> {
        let raw = self.read_white()?;
        Ok(conversion::to_lux(conversion::normalize(raw, self.setting)))
    }

    pub fn read_white_corrected(&mut self) -> Result<f32, R::Error> {
        let white = self.read_white_lux()?;
        Ok(conversion::correct_white(white, self.setting))
    }

    /// Converts a raw ALS count taken at the current setting, including correction.
    pub fn convert_to_lux(&self, raw: u16) -> f32 {
        conversion::convert_to_lux(raw, self.setting)
    }

    /// Gain relative to 1x, e.g. `0.125` for 1/8x.
    pub fn gain_value(&self) -> f32 {
        1.0 / calibration::gain_multiplier(self.setting.gain)
    }

    /// Integration time relative to 100 ms.
    pub fn integration_time_factor(&self) -> f32 {
        1.0 / calibration::integration_multiplier(self.setting.integration_time)
    }

    /// How long to wait for a fresh sample in power saving mode.
    pub fn refresh_time(&mut self) -> Result<MillisDurationU32, Error<R::Error>> {
        let mode = self.power_save_mode()?;
        Ok(calibration::refresh_time(self.setting.integration_time, mode))
    }
}


#[cfg(all(test, not(all(target_arch = "arm", target_os = "none"))))]
mod test {
    extern crate std;
    use std::vec;
    extern crate embedded_hal;
    extern crate embedded_hal_mock;

    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    use super::auto_range::Policy;
    use super::fake::{FakeDelay, FakeSensor};
    use super::registers::I2cRegisters;
    use super::setting::{Gain, IntegrationTime, PowerSaveMode, Setting};
    use super::{Error, InterruptStatus, Veml7700};
    use crate::DriverUsingDelay;

    #[test]
    pub fn new() {
        let expectations = [];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let veml = Veml7700::new(i2c, 0x10, FakeDelay::default()).unwrap();
        assert_eq!(veml.setting(), Setting::REFERENCE);

        i2c_clone.done();
    }

    #[test]
    pub fn new_rejects_address() {
        let i2c = I2cMock::new(&[]);
        let mut i2c_clone = i2c.clone();

        assert!(Veml7700::new(i2c, 0x78, FakeDelay::default()).is_err());
        i2c_clone.done();
    }

    #[test]
    pub fn from_registers_reads_setting() {
        let expectations = [I2cTransaction::write_read(
            0x10,
            vec![0x00],
            vec![0x01, 0x13],
        )];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let veml = Veml7700::from_registers(
            I2cRegisters::new(i2c, 0x10),
            FakeDelay::default(),
            Policy::OneShot,
        )
        .unwrap();
        assert_eq!(veml.setting(), Setting::LEAST_SENSITIVE);

        i2c_clone.done();
    }

    #[test]
    pub fn from_registers_rejects_unknown_code() {
        let expectations = [I2cTransaction::write_read(
            0x10,
            vec![0x00],
            vec![0x00, 0x01],
        )];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        assert!(matches!(
            Veml7700::from_registers(
                I2cRegisters::new(i2c, 0x10),
                FakeDelay::default(),
                Policy::OneShot,
            ),
            Err(Error::UnexpectedValue)
        ));

        i2c_clone.done();
    }

    #[test]
    pub fn read_lux() {
        let expectations = [
            I2cTransaction::write_read(0x10, vec![0x00], vec![0x00, 0x00]),
            I2cTransaction::write_read(0x10, vec![0x04], vec![0xE8, 0x03]),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut veml = Veml7700::new(i2c, 0x10, FakeDelay::default()).unwrap();
        assert_eq!(veml.sync_setting(), Ok(Setting::REFERENCE));
        let lux = veml.read_lux().unwrap();
        assert!(lux > 57.59 && lux < 57.61);

        i2c_clone.done();
    }

    #[test]
    pub fn sync_setting_picks_up_device_state() {
        let expectations = [
            I2cTransaction::write_read(0x10, vec![0x00], vec![0x00, 0x13]),
            I2cTransaction::write_read(0x10, vec![0x04], vec![0x32, 0x00]),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut veml = Veml7700::new(i2c, 0x10, FakeDelay::default()).unwrap();
        assert_eq!(veml.sync_setting(), Ok(Setting::LEAST_SENSITIVE));
        let lux = veml.read_lux().unwrap();
        assert!(lux > 92.15 && lux < 92.17);

        i2c_clone.done();
    }

    #[test]
    pub fn sync_setting_keeps_cache_on_unknown_code() {
        let mut sensor = FakeSensor::new(Setting::LEAST_SENSITIVE, &[]);
        let mut veml =
            Veml7700::from_registers(&mut sensor, FakeDelay::default(), Policy::OneShot).unwrap();
        veml.registers.registers[0] = 0x0100;

        assert_eq!(veml.sync_setting(), Err(Error::UnexpectedValue));
        assert_eq!(veml.setting(), Setting::LEAST_SENSITIVE);
    }

    #[test]
    pub fn interrupt_status() {
        let expectations = [I2cTransaction::write_read(
            0x10,
            vec![0x06],
            vec![0x00, 0x80],
        )];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut veml = Veml7700::new(i2c, 0x10, FakeDelay::default()).unwrap();
        assert_eq!(
            veml.interrupt_status(),
            Ok(InterruptStatus {
                high: false,
                low: true
            })
        );

        i2c_clone.done();
    }

    #[test]
    pub fn set_high_threshold() {
        let expectations = [I2cTransaction::write(0x10, vec![0x01, 0x10, 0x27])];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut veml = Veml7700::new(i2c, 0x10, FakeDelay::default()).unwrap();
        assert_eq!(veml.set_high_threshold(10_000), Ok(()));

        i2c_clone.done();
    }

    #[test]
    pub fn setters_keep_cache_in_step() {
        let mut sensor = FakeSensor::new(Setting::REFERENCE, &[]);
        let mut veml =
            Veml7700::from_registers(&mut sensor, FakeDelay::default(), Policy::OneShot).unwrap();

        veml.set_gain(Gain::OneEighth).unwrap();
        veml.set_integration_time(IntegrationTime::Ms25).unwrap();
        assert_eq!(veml.setting(), Setting::LEAST_SENSITIVE);
        assert_eq!(veml.gain(), Ok(Gain::OneEighth));
        assert_eq!(veml.integration_time(), Ok(IntegrationTime::Ms25));
        assert!(veml.gain_value() > 0.124 && veml.gain_value() < 0.126);
        assert!(veml.integration_time_factor() > 0.249 && veml.integration_time_factor() < 0.251);

        drop(veml);
        assert_eq!(sensor.setting(), Setting::LEAST_SENSITIVE);
    }

    #[test]
    pub fn enable_round_trip() {
        let mut sensor = FakeSensor::new(Setting::REFERENCE, &[]);
        let mut veml =
            Veml7700::from_registers(&mut sensor, FakeDelay::default(), Policy::OneShot).unwrap();

        veml.enable(false).unwrap();
        assert_eq!(veml.enabled(), Ok(false));
        veml.enable(true).unwrap();
        assert_eq!(veml.enabled(), Ok(true));
        veml.interrupt_enable(true).unwrap();
        assert_eq!(veml.interrupt_enabled(), Ok(true));
        assert_eq!(veml.setting(), Setting::REFERENCE);
    }

    #[test]
    pub fn refresh_time() {
        let mut sensor = FakeSensor::new(Setting::REFERENCE, &[]);
        let mut veml =
            Veml7700::from_registers(&mut sensor, FakeDelay::default(), Policy::OneShot).unwrap();

        veml.power_save_enable(true).unwrap();
        veml.set_power_save_mode(PowerSaveMode::Mode3).unwrap();
        assert_eq!(veml.power_save_enabled(), Ok(true));
        assert_eq!(veml.power_save_mode(), Ok(PowerSaveMode::Mode3));
        assert_eq!(veml.refresh_time().map(|t| t.to_millis()), Ok(2103));
    }

    #[test]
    pub fn thresholds_must_be_ordered() {
        let mut sensor = FakeSensor::new(Setting::REFERENCE, &[]);
        let mut veml =
            Veml7700::from_registers(&mut sensor, FakeDelay::default(), Policy::OneShot).unwrap();

        assert_eq!(veml.set_thresholds(500, 500), Err(Error::ArgumentError));
        assert_eq!(veml.set_thresholds(500, 20_000), Ok(()));
        assert_eq!(veml.thresholds().low(), 500);
        assert_eq!(veml.thresholds().high(), 20_000);
    }
}
