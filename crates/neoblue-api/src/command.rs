// Outbound commands written over an established GATT link.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A device-native position percentage, guaranteed to lie in `0..=100`.
///
/// 0 is the fully open (retracted) end of travel, 100 fully closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Position(u8);

impl Position {
    pub const OPEN: Self = Self(0);
    pub const CLOSED: Self = Self(100);

    pub const fn get(self) -> u8 {
        self.0
    }

    /// The same physical position expressed from the other end of travel.
    #[must_use]
    pub const fn inverted(self) -> Self {
        Self(100 - self.0)
    }
}

impl TryFrom<u8> for Position {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 100 {
            return Err(Error::InvalidPosition {
                value: u16::from(value),
            });
        }
        Ok(Self(value))
    }
}

impl TryFrom<u16> for Position {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| Error::InvalidPosition { value })
            .and_then(Self::try_from)
    }
}

impl From<Position> for u8 {
    fn from(p: Position) -> Self {
        p.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// One instruction for the motor. Built by the caller, written exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Move { target: Position },
    Stop,
}

impl Command {
    pub fn move_to(target: Position) -> Self {
        Self::Move { target }
    }

    /// Short name for log fields.
    pub fn kind(self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move { target } => write!(f, "move to {target}"),
            Self::Stop => f.write_str("stop"),
        }
    }
}
