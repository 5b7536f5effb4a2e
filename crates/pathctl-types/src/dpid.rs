//! Datapath identifier type.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 64-bit datapath identifier naming one switch in the fabric.
///
/// Datapath ID zero is reserved and never names a real switch; all
/// constructors reject it.
///
/// # Examples
///
/// ```
/// use pathctl_types::Dpid;
///
/// let dpid = Dpid::new(7).unwrap();
/// assert_eq!(dpid.to_string(), "0000000000000007");
///
/// let parsed: Dpid = "000000000000000a".parse().unwrap();
/// assert_eq!(parsed.as_u64(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dpid(u64);

impl Dpid {
    /// Creates a new datapath ID.
    ///
    /// # Errors
    ///
    /// Returns an error for the reserved ID zero.
    pub fn new(id: u64) -> Result<Self, ParseError> {
        if id == 0 {
            Err(ParseError::InvalidDpid("0".to_string()))
        } else {
            Ok(Dpid(id))
        }
    }

    /// Returns the raw 64-bit value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Dpid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Canonical OpenFlow rendering: 16 hex digits, zero padded.
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for Dpid {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = u64::from_str_radix(s, 16)
            .map_err(|_| ParseError::InvalidDpid(s.to_string()))?;
        Dpid::new(id).map_err(|_| ParseError::InvalidDpid(s.to_string()))
    }
}

impl TryFrom<String> for Dpid {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Dpid> for String {
    fn from(dpid: Dpid) -> String {
        dpid.to_string()
    }
}
