use common::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Three-letter IATA city or airport code, stored upper-cased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AirportCode([u8; 3]);

impl AirportCode {
    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl FromStr for AirportCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();

        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(Error::InvalidInput(format!(
                "'{}' is not a three-letter airport code",
                s
            )));
        }

        let mut code = [0u8; 3];
        for (slot, b) in code.iter_mut().zip(bytes) {
            *slot = b.to_ascii_uppercase();
        }
        Ok(Self(code))
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AirportCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AirportCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered, de-duplicated list of cities to query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityList {
    codes: Vec<AirportCode>,
}

impl CityList {
    /// Parses the configured codes. Later duplicates are dropped so the first
    /// occurrence decides the position in the list.
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Result<Self> {
        let mut parsed: Vec<AirportCode> = Vec::with_capacity(codes.len());

        for raw in codes {
            let code: AirportCode = raw.as_ref().parse()?;
            if !parsed.contains(&code) {
                parsed.push(code);
            }
        }

        if parsed.is_empty() {
            return Err(Error::InvalidInput("city list is empty".to_string()));
        }

        Ok(Self { codes: parsed })
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn codes(&self) -> &[AirportCode] {
        &self.codes
    }

    /// Number of ordered pairs `pairs()` yields: N × (N - 1).
    pub fn pair_count(&self) -> usize {
        self.codes.len() * self.codes.len().saturating_sub(1)
    }

    /// Every ordered (origin, destination) pair with origin != destination,
    /// origin-major in list order. A→B and B→A are both produced.
    pub fn pairs(&self) -> impl Iterator<Item = (AirportCode, AirportCode)> + '_ {
        self.codes.iter().flat_map(move |&origin| {
            self.codes
                .iter()
                .filter(move |&&destination| destination != origin)
                .map(move |&destination| (origin, destination))
        })
    }
}
