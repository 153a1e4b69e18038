//! BSSID (MAC address) canonicalization.
//!
//! Source formats spell hardware addresses in several ways: upper or lower case, colon or dash
//! separated, and with or without leading zeros in each octet (`0:12:88:a8:28:69`). Everything
//! downstream compares the canonical form produced here: six two-digit lowercase hex octets
//! joined by `:`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Six groups of one or two hex digits separated by colons.
static COLON_SEPARATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9A-Fa-f]{1,2}:){5}[0-9A-Fa-f]{1,2}$").expect("valid BSSID regex")
});

/// Six groups of one or two hex digits separated by dashes.
static DASH_SEPARATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9A-Fa-f]{1,2}-){5}[0-9A-Fa-f]{1,2}$").expect("valid BSSID regex")
});

/// Errors produced while canonicalizing a BSSID.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BssidError {
    /// The text is not six uniformly separated groups of 1-2 hex digits.
    #[error("Invalid BSSID: '{input}'")]
    InvalidBssid {
        /// The rejected input.
        input: String,
    },
}

/// A canonical access point hardware address.
///
/// Displays as six two-digit lowercase hex octets joined by `:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bssid([u8; 6]);

impl Bssid {
    /// The all-zero address some formats use for "no address".
    pub const NULL: Self = Self([0; 6]);

    /// Creates a BSSID from raw octets.
    #[must_use]
    pub const fn from_octets(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Returns the raw octets.
    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Returns `true` for `00:00:00:00:00:00`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for Bssid {
    type Err = BssidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Canonicalizes MAC address text.
///
/// Accepts six groups of one or two hex digits joined uniformly by either `:` or `-`.
/// Re-canonicalizing a canonical string returns it unchanged. The all-zero address is
/// structurally valid and is accepted here.
///
/// # Errors
///
/// Returns [`BssidError::InvalidBssid`] if the text does not have that shape.
///
/// # Example
///
/// ```rust
/// use wifitsv_core::canonicalize;
///
/// assert_eq!(canonicalize("AA-BB-cc-0-1-2").unwrap(), "aa:bb:cc:00:01:02");
/// ```
pub fn canonicalize(text: &str) -> Result<String, BssidError> {
    parse(text).map(|bssid| bssid.to_string())
}

/// Parses MAC address text into a [`Bssid`], with the same acceptance rules as [`canonicalize`].
///
/// # Errors
///
/// Returns [`BssidError::InvalidBssid`] if the text is malformed.
pub fn parse(text: &str) -> Result<Bssid, BssidError> {
    let separator = if COLON_SEPARATED.is_match(text) {
        ':'
    } else if DASH_SEPARATED.is_match(text) {
        '-'
    } else {
        return Err(invalid(text));
    };

    let mut octets = [0u8; 6];
    for (slot, group) in octets.iter_mut().zip(text.split(separator)) {
        *slot = u8::from_str_radix(group, 16).map_err(|_| invalid(text))?;
    }
    Ok(Bssid(octets))
}

fn invalid(text: &str) -> BssidError {
    BssidError::InvalidBssid {
        input: text.to_string(),
    }
}
