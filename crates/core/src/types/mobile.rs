//! Login inputs: mobile number and one-time password.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`MobileNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MobileNumberError {
    /// The input is not exactly ten characters long.
    #[error("Enter a valid {expected}-digit mobile number")]
    WrongLength {
        /// Required number of digits.
        expected: usize,
    },
    /// The input contains something other than ASCII digits.
    #[error("mobile number must contain only digits")]
    NonDigit,
}

/// A ten digit mobile number used for OTP login.
///
/// ## Examples
///
/// ```
/// use cropcare_core::MobileNumber;
///
/// assert!(MobileNumber::parse("9876543210").is_ok());
/// assert!(MobileNumber::parse("98765").is_err());
/// assert!(MobileNumber::parse("98765abcde").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MobileNumber(String);

impl MobileNumber {
    /// Required number of digits.
    pub const LENGTH: usize = 10;

    /// Parse a `MobileNumber` from user input.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly ten ASCII digits.
    pub fn parse(s: &str) -> Result<Self, MobileNumberError> {
        let s = s.trim();
        if s.len() != Self::LENGTH {
            return Err(MobileNumberError::WrongLength {
                expected: Self::LENGTH,
            });
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MobileNumberError::NonDigit);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for MobileNumber {
    type Err = MobileNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Errors that can occur when parsing an [`OtpCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    /// The input is not exactly six characters long.
    #[error("Enter a valid {expected}-digit OTP")]
    WrongLength {
        /// Required number of digits.
        expected: usize,
    },
    /// The input contains something other than ASCII digits.
    #[error("OTP must contain only digits")]
    NonDigit,
}

/// A six digit one-time password.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct OtpCode(String);

impl OtpCode {
    /// Required number of digits.
    pub const LENGTH: usize = 6;

    /// Parse an `OtpCode` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly six ASCII digits.
    pub fn parse(s: &str) -> Result<Self, OtpError> {
        let s = s.trim();
        if s.len() != Self::LENGTH {
            return Err(OtpError::WrongLength {
                expected: Self::LENGTH,
            });
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OtpError::NonDigit);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Codes are short-lived secrets; keep them out of logs.
impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode([REDACTED])")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_number_valid() {
        let number = MobileNumber::parse(" 9876543210 ").unwrap();
        assert_eq!(number.as_str(), "9876543210");
        assert_eq!(number.to_string(), "9876543210");
    }

    #[test]
    fn test_mobile_number_wrong_length() {
        let err = MobileNumber::parse("12345").unwrap_err();
        assert_eq!(err, MobileNumberError::WrongLength { expected: 10 });
        assert_eq!(err.to_string(), "Enter a valid 10-digit mobile number");
        assert!(MobileNumber::parse("98765432101").is_err());
    }

    #[test]
    fn test_mobile_number_non_digit() {
        assert_eq!(
            MobileNumber::parse("98765-3210").unwrap_err(),
            MobileNumberError::NonDigit
        );
    }

    #[test]
    fn test_otp_valid() {
        assert_eq!(OtpCode::parse("123456").unwrap().as_str(), "123456");
    }

    #[test]
    fn test_otp_invalid() {
        assert_eq!(
            OtpCode::parse("12345").unwrap_err().to_string(),
            "Enter a valid 6-digit OTP"
        );
        assert_eq!(OtpCode::parse("12a456").unwrap_err(), OtpError::NonDigit);
    }

    #[test]
    fn test_otp_debug_is_redacted() {
        let otp = OtpCode::parse("654321").unwrap();
        assert!(!format!("{otp:?}").contains("654321"));
    }
}
