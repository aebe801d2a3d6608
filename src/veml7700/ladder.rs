//! Stepping between operating points.
//!
//! The one-shot and incremental controllers break ties between gain and integration time
//! differently and both orders are relied upon, so each keeps its own step function here.

use super::auto_range::Range;
use super::setting::{IntegrationTime, Setting};

/// One step up the setting ladder: longer integration time first, then more gain.
#[must_use]
pub fn more_sensitive(setting: Setting) -> Option<Setting> {
    if let Some(integration_time) = setting.integration_time.longer() {
        Some(Setting {
            integration_time,
            ..setting
        })
    } else {
        setting.gain.higher().map(|gain| Setting { gain, ..setting })
    }
}

/// One step down the setting ladder.  Integration time shrinks towards 100 ms first, then gain
/// drops, and only with the gain at its floor does integration time go below 100 ms.
#[must_use]
pub fn less_sensitive(setting: Setting) -> Option<Setting> {
    if setting.integration_time.millis() > IntegrationTime::Ms100.millis() {
        return setting.integration_time.shorter().map(|integration_time| Setting {
            integration_time,
            ..setting
        });
    }
    if let Some(gain) = setting.gain.lower() {
        return Some(Setting { gain, ..setting });
    }
    setting
        .integration_time
        .shorter()
        .map(|integration_time| Setting {
            integration_time,
            ..setting
        })
}

/// Coarse search of the one-shot controller: more gain first, then longer integration time.
#[must_use]
pub fn coarse_step(setting: Setting) -> Option<Setting> {
    if let Some(gain) = setting.gain.higher() {
        Some(Setting { gain, ..setting })
    } else {
        setting
            .integration_time
            .longer()
            .map(|integration_time| Setting {
                integration_time,
                ..setting
            })
    }
}

/// The single adjustment the incremental controller makes after a reading classified as
/// `range`.  Integration time is moved towards 100 ms first, gain next, and integration time
/// past 100 ms only once the gain is exhausted.
#[must_use]
pub fn incremental_step(setting: Setting, range: Range) -> Option<Setting> {
    let millis = setting.integration_time.millis();
    let reference = IntegrationTime::Ms100.millis();
    match range {
        Range::Good => None,
        Range::TooLow => {
            if millis < reference {
                setting.integration_time.longer().map(|integration_time| Setting {
                    integration_time,
                    ..setting
                })
            } else if let Some(gain) = setting.gain.higher() {
                Some(Setting { gain, ..setting })
            } else {
                setting.integration_time.longer().map(|integration_time| Setting {
                    integration_time,
                    ..setting
                })
            }
        }
        Range::TooHigh => {
            if millis > reference {
                setting.integration_time.shorter().map(|integration_time| Setting {
                    integration_time,
                    ..setting
                })
            } else if let Some(gain) = setting.gain.lower() {
                Some(Setting { gain, ..setting })
            } else {
                setting.integration_time.shorter().map(|integration_time| Setting {
                    integration_time,
                    ..setting
                })
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    MoreSensitive,
    LessSensitive,
}

/// Walks the setting ladder from a starting point, yielding the start itself first.
#[derive(Clone, Debug)]
pub struct Ladder {
    next: Option<Setting>,
    direction: Direction,
}

impl Ladder {
    #[must_use]
    pub const fn new(start: Setting, direction: Direction) -> Self {
        Self {
            next: Some(start),
            direction,
        }
    }
}

impl Iterator for Ladder {
    type Item = Setting;

    fn next(&mut self) -> Option<Setting> {
        let current = self.next?;
        self.next = match self.direction {
            Direction::MoreSensitive => more_sensitive(current),
            Direction::LessSensitive => less_sensitive(current),
        };
        Some(current)
    }
}
