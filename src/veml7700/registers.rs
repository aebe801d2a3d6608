//! Register map of the VEML7700 and the primitives the rest of the driver is written against.
//!
//! Every register is 16 bits wide and travels least significant byte first.

use embedded_hal::i2c::I2c;
use num_enum::IntoPrimitive;

#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    AlsConf = 0x00,
    AlsHighThreshold = 0x01,
    AlsLowThreshold = 0x02,
    PowerSaving = 0x03,
    Als = 0x04,
    White = 0x05,
    AlsInt = 0x06,
}

/// A run of `width` bits starting at bit `shift` of a register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    pub register: Register,
    pub width: u8,
    pub shift: u8,
}

impl Field {
    const fn new(register: Register, width: u8, shift: u8) -> Self {
        Self {
            register,
            width,
            shift,
        }
    }

    #[must_use]
    pub const fn mask(self) -> u16 {
        ((1_u16 << self.width) - 1) << self.shift
    }

    #[must_use]
    pub const fn extract(self, register_value: u16) -> u16 {
        (register_value & self.mask()) >> self.shift
    }

    /// Replaces the bits of this field in `register_value`.  Bits of `value` that do not fit
    /// are dropped.
    #[must_use]
    pub const fn insert(self, register_value: u16, value: u16) -> u16 {
        (register_value & !self.mask()) | ((value << self.shift) & self.mask())
    }
}

pub const SHUTDOWN: Field = Field::new(Register::AlsConf, 1, 0);
pub const INTERRUPT_ENABLE: Field = Field::new(Register::AlsConf, 1, 1);
pub const PERSISTENCE: Field = Field::new(Register::AlsConf, 2, 4);
pub const INTEGRATION_TIME: Field = Field::new(Register::AlsConf, 4, 6);
pub const GAIN: Field = Field::new(Register::AlsConf, 2, 11);
pub const POWER_SAVE_ENABLE: Field = Field::new(Register::PowerSaving, 1, 0);
pub const POWER_SAVE_MODE: Field = Field::new(Register::PowerSaving, 2, 1);

pub const INTERRUPT_HIGH: u16 = 0x4000;
pub const INTERRUPT_LOW: u16 = 0x8000;

/// Whole-register access to the sensor.  Field access is provided on top as read-modify-write.
///
/// Errors are whatever the transport reports; nothing at this layer retries.
pub trait RegisterAccess {
    type Error;

    fn read_register(&mut self, register: Register) -> Result<u16, Self::Error>;

    fn write_register(&mut self, register: Register, value: u16) -> Result<(), Self::Error>;

    fn read_field(&mut self, field: Field) -> Result<u16, Self::Error> {
        Ok(field.extract(self.read_register(field.register)?))
    }

    fn write_field(&mut self, field: Field, value: u16) -> Result<(), Self::Error> {
        let current = self.read_register(field.register)?;
        self.write_register(field.register, field.insert(current, value))
    }
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &mut T {
    type Error = T::Error;

    fn read_register(&mut self, register: Register) -> Result<u16, Self::Error> {
        T::read_register(self, register)
    }

    fn write_register(&mut self, register: Register, value: u16) -> Result<(), Self::Error> {
        T::write_register(self, register, value)
    }
}

pub struct I2cRegisters<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> I2cRegisters<I2C> {
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> RegisterAccess for I2cRegisters<I2C> {
    type Error = I2C::Error;

    fn read_register(&mut self, register: Register) -> Result<u16, I2C::Error> {
        let mut data: [u8; 2] = [0, 0];
        self.i2c
            .write_read(self.address, &[register.into()], &mut data)?;
        Ok(u16::from_le_bytes(data))
    }

    fn write_register(&mut self, register: Register, value: u16) -> Result<(), I2C::Error> {
        let bytes: [u8; 2] = u16::to_le_bytes(value);
        self.i2c
            .write(self.address, &[register.into(), bytes[0], bytes[1]])
    }
}

#[cfg(all(test, not(all(target_arch = "arm", target_os = "none"))))]
mod test {
    extern crate std;
    use std::vec;
    extern crate embedded_hal;
    extern crate embedded_hal_mock;

    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    use super::{
        I2cRegisters, Register, RegisterAccess, GAIN, INTEGRATION_TIME, PERSISTENCE, SHUTDOWN,
    };

    #[test]
    pub fn masks() {
        assert_eq!(SHUTDOWN.mask(), 0x0001);
        assert_eq!(PERSISTENCE.mask(), 0x0030);
        assert_eq!(INTEGRATION_TIME.mask(), 0x03C0);
        assert_eq!(GAIN.mask(), 0x1800);
    }

    #[test]
    pub fn insert_keeps_other_bits() {
        assert_eq!(GAIN.insert(0x03C1, 0b10), 0x13C1);
        assert_eq!(INTEGRATION_TIME.insert(0x1FFF, 0), 0x1C3F);
        assert_eq!(SHUTDOWN.insert(0x0000, 0b11), 0x0001);
    }

    #[test]
    pub fn read_register() {
        let expectations = [I2cTransaction::write_read(
            0x10,
            vec![0x04],
            vec![0x02, 0x01],
        )];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut registers = I2cRegisters::new(i2c, 0x10);

        assert_eq!(registers.read_register(Register::Als), Ok(258));
        i2c_clone.done();
    }

    #[test]
    pub fn write_register() {
        let expectations = [I2cTransaction::write(0x10, vec![0x01, 0x30, 0x75])];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut registers = I2cRegisters::new(i2c, 0x10);

        assert_eq!(
            registers.write_register(Register::AlsHighThreshold, 30_000),
            Ok(())
        );
        i2c_clone.done();
    }

    #[test]
    pub fn read_field() {
        let expectations = [I2cTransaction::write_read(
            0x10,
            vec![0x00],
            vec![0x00, 0x13],
        )];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut registers = I2cRegisters::new(i2c, 0x10);

        assert_eq!(registers.read_field(INTEGRATION_TIME), Ok(0x0C));
        i2c_clone.done();
    }

    #[test]
    pub fn write_field() {
        let expectations = [
            I2cTransaction::write_read(0x10, vec![0x00], vec![0x01, 0x00]),
            I2cTransaction::write(0x10, vec![0x00, 0x01, 0x10]),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut registers = I2cRegisters::new(i2c, 0x10);

        assert_eq!(registers.write_field(GAIN, 0b10), Ok(()));
        i2c_clone.done();
    }
}
