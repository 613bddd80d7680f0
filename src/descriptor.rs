//! WMO data descriptors.
//!
//! Every element of a BUFR or CREX message shape is named by a descriptor `F-XX-YYY`, where
//! the `F` digit selects the class: data element, replication, operator, or sequence. The
//! letter forms `B`, `R`, `C` and `D` are the conventional spellings of `F` = 0..3.

use std::{fmt, str::FromStr};

/// The four classes of WMO descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DescriptorClass {
    /// A data element descriptor (`B` codes). The only class that pairs with a value slot.
    Element,
    /// A replication descriptor (`R` codes).
    Replication,
    /// An operator descriptor (`C` codes).
    Operator,
    /// A sequence descriptor (`D` codes).
    Sequence,
}

impl DescriptorClass {
    fn f_digit(self) -> u8 {
        match self {
            DescriptorClass::Element => 0,
            DescriptorClass::Replication => 1,
            DescriptorClass::Operator => 2,
            DescriptorClass::Sequence => 3,
        }
    }

    fn letter(self) -> char {
        match self {
            DescriptorClass::Element => 'B',
            DescriptorClass::Replication => 'R',
            DescriptorClass::Operator => 'C',
            DescriptorClass::Sequence => 'D',
        }
    }
}

/// A WMO descriptor code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DescriptorCode {
    /// The descriptor class (the `F` digit).
    pub class: DescriptorClass,
    /// The `XX` part, 0..=63.
    pub x: u8,
    /// The `YYY` part. 0..=255 for element descriptors, up to 999 for the others.
    pub y: u16,
}

impl DescriptorCode {
    /// A data element descriptor, `B-XX-YYY`.
    pub const fn element(x: u8, y: u16) -> Self {
        DescriptorCode {
            class: DescriptorClass::Element,
            x,
            y,
        }
    }

    /// A replication descriptor, `R-XX-YYY`. `x` is how many following descriptors repeat,
    /// `y` the repetition count, with `y` = 0 meaning a delayed count follows.
    pub const fn replication(x: u8, y: u16) -> Self {
        DescriptorCode {
            class: DescriptorClass::Replication,
            x,
            y,
        }
    }

    /// An operator descriptor, `C-XX-YYY`.
    pub const fn operator(x: u8, y: u16) -> Self {
        DescriptorCode {
            class: DescriptorClass::Operator,
            x,
            y,
        }
    }

    /// A sequence descriptor, `D-XX-YYY`.
    pub const fn sequence(x: u8, y: u16) -> Self {
        DescriptorCode {
            class: DescriptorClass::Sequence,
            x,
            y,
        }
    }

    /// Only element descriptors ever pair with a stored value.
    pub fn takes_value(self) -> bool {
        self.class == DescriptorClass::Element
    }

    /// True for the delayed replication count elements `B31001` and `B31002`.
    pub fn is_delayed_count(self) -> bool {
        self.class == DescriptorClass::Element && self.x == 31 && (self.y == 1 || self.y == 2)
    }

    /// True for class 33 quality information elements, the conventional attribute codes.
    pub fn is_quality(self) -> bool {
        self.class == DescriptorClass::Element && self.x == 33
    }
}

impl fmt::Display for DescriptorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{:02}{:03}", self.class.letter(), self.x, self.y)
    }
}

/// Error from parsing a descriptor code string.
#[derive(Debug, PartialEq)]
pub struct ParseDescriptorError(String);

impl fmt::Display for ParseDescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid descriptor code: {}", self.0)
    }
}

impl std::error::Error for ParseDescriptorError {}

impl FromStr for DescriptorCode {
    type Err = ParseDescriptorError;

    /// Parse the letter form, e.g. "B01001", "R05000", "C22000", "D01011".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseDescriptorError(s.to_owned());

        if s.len() != 6 || !s.is_ascii() {
            return Err(bad());
        }

        let class = match s.as_bytes()[0] {
            b'B' | b'0' => DescriptorClass::Element,
            b'R' | b'1' => DescriptorClass::Replication,
            b'C' | b'2' => DescriptorClass::Operator,
            b'D' | b'3' => DescriptorClass::Sequence,
            _ => return Err(bad()),
        };

        let x: u8 = s[1..3].parse().map_err(|_| bad())?;
        let y: u16 = s[3..6].parse().map_err(|_| bad())?;

        if x > 63 || y > 999 || (class == DescriptorClass::Element && y > 255) {
            return Err(bad());
        }

        Ok(DescriptorCode { class, x, y })
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(DescriptorCode::element(1, 1).to_string(), "B01001");
        assert_eq!(DescriptorCode::replication(5, 0).to_string(), "R05000");
        assert_eq!(DescriptorCode::operator(22, 0).to_string(), "C22000");
        assert_eq!(DescriptorCode::sequence(1, 11).to_string(), "D01011");
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            DescriptorCode::from_str("B10004").unwrap(),
            DescriptorCode::element(10, 4)
        );
        assert_eq!(
            DescriptorCode::from_str("R01000").unwrap(),
            DescriptorCode::replication(1, 0)
        );
        assert_eq!(
            DescriptorCode::from_str("301011").unwrap(),
            DescriptorCode::sequence(1, 11)
        );

        assert!(DescriptorCode::from_str("B1004").is_err());
        assert!(DescriptorCode::from_str("X01001").is_err());
        assert!(DescriptorCode::from_str("B99001").is_err());
        assert!(DescriptorCode::from_str("B01999").is_err());
    }

    #[test]
    fn round_trip_strings() {
        for code in &[
            DescriptorCode::element(12, 1),
            DescriptorCode::replication(2, 10),
            DescriptorCode::operator(22, 0),
            DescriptorCode::sequence(3, 2),
        ] {
            assert_eq!(DescriptorCode::from_str(&code.to_string()).unwrap(), *code);
        }
    }

    #[test]
    fn test_takes_value() {
        assert!(DescriptorCode::element(10, 4).takes_value());
        assert!(!DescriptorCode::replication(1, 0).takes_value());
        assert!(!DescriptorCode::operator(22, 0).takes_value());
        assert!(!DescriptorCode::sequence(1, 11).takes_value());
    }

    #[test]
    fn test_delayed_count_and_quality() {
        assert!(DescriptorCode::element(31, 1).is_delayed_count());
        assert!(DescriptorCode::element(31, 2).is_delayed_count());
        assert!(!DescriptorCode::element(31, 31).is_delayed_count());
        assert!(DescriptorCode::element(33, 7).is_quality());
        assert!(!DescriptorCode::element(12, 1).is_quality());
    }
}
