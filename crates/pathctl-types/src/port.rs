//! Switch port number type.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A switch port number.
///
/// OpenFlow numbers physical ports starting at 1; zero and the reserved
/// high range (0xff000000 and above) never name a physical port that a
/// link or host can attach to.
///
/// # Examples
///
/// ```
/// use pathctl_types::PortNo;
///
/// let port = PortNo::new(3).unwrap();
/// assert_eq!(port.as_u32(), 3);
/// assert!(PortNo::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PortNo(u32);

impl PortNo {
    /// First reserved port number (OFPP_MAX boundary).
    pub const RESERVED_BASE: u32 = 0xff00_0000;

    /// Creates a new port number.
    ///
    /// # Errors
    ///
    /// Returns an error for zero or reserved port numbers.
    pub const fn new(port: u32) -> Result<Self, ParseError> {
        if port == 0 || port >= Self::RESERVED_BASE {
            Err(ParseError::InvalidPortNo(port))
        } else {
            Ok(PortNo(port))
        }
    }

    /// Returns the raw port number.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PortNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for PortNo {
    type Error = ParseError;

    fn try_from(port: u32) -> Result<Self, Self::Error> {
        PortNo::new(port)
    }
}

impl From<PortNo> for u32 {
    fn from(port: PortNo) -> u32 {
        port.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_and_reserved() {
        assert!(PortNo::new(0).is_err());
        assert!(PortNo::new(PortNo::RESERVED_BASE).is_err());
        assert!(PortNo::new(u32::MAX).is_err());
    }

    #[test]
    fn test_accepts_physical_range() {
        assert!(PortNo::new(1).is_ok());
        assert!(PortNo::new(48).is_ok());
        assert!(PortNo::new(PortNo::RESERVED_BASE - 1).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(PortNo::new(17).unwrap().to_string(), "17");
    }
}
