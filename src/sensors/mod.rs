//! Sensor subsystem: the four climate channels, the smoothed history and
//! the per-cycle signal bundle derived from it.
//!
//! ```text
//!  SensorPort ──▶ Acquisition ──▶ RawReadings ──▶ History ──▶ Signals
//!  (4 reads, one at a time)        (EMA + ring buffer)   (diffs, slopes)
//! ```

pub mod acquisition;
pub mod history;
pub mod signals;

use core::fmt;

/// One of the four climate measurements, in acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    HoodTemp = 0,
    HoodHumidity = 1,
    RoomTemp = 2,
    RoomHumidity = 3,
}

impl Channel {
    pub const COUNT: usize = 4;

    /// Acquisition order: hood pair first, then the room reference.
    pub const ORDER: [Channel; Channel::COUNT] = [
        Channel::HoodTemp,
        Channel::HoodHumidity,
        Channel::RoomTemp,
        Channel::RoomHumidity,
    ];

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ORDER.get(idx).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::HoodTemp => "hood temperature",
            Self::HoodHumidity => "hood humidity",
            Self::RoomTemp => "room temperature",
            Self::RoomHumidity => "room humidity",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One complete, unsmoothed acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawReadings {
    pub hood_temp: f32,
    pub hood_rh: f32,
    pub room_temp: f32,
    pub room_rh: f32,
}

impl RawReadings {
    pub fn get(&self, channel: Channel) -> f32 {
        match channel {
            Channel::HoodTemp => self.hood_temp,
            Channel::HoodHumidity => self.hood_rh,
            Channel::RoomTemp => self.room_temp,
            Channel::RoomHumidity => self.room_rh,
        }
    }

    pub fn set(&mut self, channel: Channel, value: f32) {
        match channel {
            Channel::HoodTemp => self.hood_temp = value,
            Channel::HoodHumidity => self.hood_rh = value,
            Channel::RoomTemp => self.room_temp = value,
            Channel::RoomHumidity => self.room_rh = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_matches_discriminants() {
        for (i, c) in Channel::ORDER.iter().enumerate() {
            assert_eq!(*c as usize, i);
            assert_eq!(Channel::from_index(i), Some(*c));
        }
        assert_eq!(Channel::from_index(Channel::COUNT), None);
    }

    #[test]
    fn readings_get_set() {
        let mut r = RawReadings::default();
        for (i, c) in Channel::ORDER.iter().enumerate() {
            r.set(*c, i as f32 + 0.5);
        }
        assert_eq!(r.get(Channel::RoomTemp), 2.5);
        assert_eq!(r.hood_rh, 1.5);
    }
}
