//! Operating points of the sensor.  Every enum discriminant is the code the device uses for it.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::registers::{GAIN, INTEGRATION_TIME};

#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Gain {
    One = 0b00,
    Two = 0b01,
    OneEighth = 0b10,
    OneQuarter = 0b11,
}

impl Gain {
    /// Least to most sensitive.
    pub const ASCENDING: [Self; 4] = [Self::OneEighth, Self::OneQuarter, Self::One, Self::Two];

    const fn rank(self) -> usize {
        match self {
            Self::OneEighth => 0,
            Self::OneQuarter => 1,
            Self::One => 2,
            Self::Two => 3,
        }
    }

    #[must_use]
    pub fn higher(self) -> Option<Self> {
        Self::ASCENDING.get(self.rank() + 1).copied()
    }

    #[must_use]
    pub fn lower(self) -> Option<Self> {
        self.rank()
            .checked_sub(1)
            .and_then(|rank| Self::ASCENDING.get(rank).copied())
    }

    pub fn from_code(code: u16) -> Option<Self> {
        u8::try_from(code)
            .ok()
            .and_then(|code| Self::try_from(code).ok())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum IntegrationTime {
    Ms25 = 0x0C,
    Ms50 = 0x08,
    Ms100 = 0x00,
    Ms200 = 0x01,
    Ms400 = 0x02,
    Ms800 = 0x03,
}

impl IntegrationTime {
    /// Shortest to longest.
    pub const ASCENDING: [Self; 6] = [
        Self::Ms25,
        Self::Ms50,
        Self::Ms100,
        Self::Ms200,
        Self::Ms400,
        Self::Ms800,
    ];

    const fn rank(self) -> usize {
        match self {
            Self::Ms25 => 0,
            Self::Ms50 => 1,
            Self::Ms100 => 2,
            Self::Ms200 => 3,
            Self::Ms400 => 4,
            Self::Ms800 => 5,
        }
    }

    #[must_use]
    pub const fn millis(self) -> u32 {
        match self {
            Self::Ms25 => 25,
            Self::Ms50 => 50,
            Self::Ms100 => 100,
            Self::Ms200 => 200,
            Self::Ms400 => 400,
            Self::Ms800 => 800,
        }
    }

    #[must_use]
    pub fn longer(self) -> Option<Self> {
        Self::ASCENDING.get(self.rank() + 1).copied()
    }

    #[must_use]
    pub fn shorter(self) -> Option<Self> {
        self.rank()
            .checked_sub(1)
            .and_then(|rank| Self::ASCENDING.get(rank).copied())
    }

    pub fn from_code(code: u16) -> Option<Self> {
        u8::try_from(code)
            .ok()
            .and_then(|code| Self::try_from(code).ok())
    }
}

/// Number of consecutive out-of-window samples before the interrupt fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Persistence {
    One = 0b00,
    Two = 0b01,
    Four = 0b10,
    Eight = 0b11,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerSaveMode {
    Mode1 = 0b00,
    Mode2 = 0b01,
    Mode3 = 0b10,
    Mode4 = 0b11,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Setting {
    pub gain: Gain,
    pub integration_time: IntegrationTime,
}

impl Setting {
    /// Power-on default, and the scale normalized counts are expressed in.
    pub const REFERENCE: Self = Self::new(Gain::One, IntegrationTime::Ms100);
    pub const LEAST_SENSITIVE: Self = Self::new(Gain::OneEighth, IntegrationTime::Ms25);
    pub const MOST_SENSITIVE: Self = Self::new(Gain::Two, IntegrationTime::Ms800);

    #[must_use]
    pub const fn new(gain: Gain, integration_time: IntegrationTime) -> Self {
        Self {
            gain,
            integration_time,
        }
    }

    /// The only operating point where the response is measurably non-linear at high lux.
    #[must_use]
    pub fn is_non_linear(self) -> bool {
        self == Self::LEAST_SENSITIVE
    }

    /// Decodes gain and integration time from an `ALS_CONF` value.
    pub fn decode(config: u16) -> Option<Self> {
        Some(Self::new(
            Gain::from_code(GAIN.extract(config))?,
            IntegrationTime::from_code(INTEGRATION_TIME.extract(config))?,
        ))
    }

    #[must_use]
    pub fn encode(self, config: u16) -> u16 {
        let config = GAIN.insert(config, u8::from(self.gain).into());
        INTEGRATION_TIME.insert(config, u8::from(self.integration_time).into())
    }
}

impl Default for Setting {
    fn default() -> Self {
        Self::REFERENCE
    }
}
