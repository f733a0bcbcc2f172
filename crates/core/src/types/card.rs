//! Payment card input.
//!
//! Cards are checked for shape only. Nothing here talks to a payment gateway,
//! and [`PaymentCard`] has no `Serialize` impl.

/// Length of a card number.
pub const CARD_NUMBER_DIGITS: usize = 16;
/// Length of an `MMYY` expiration.
pub const EXPIRATION_DIGITS: usize = 4;
/// Length of a CVV.
pub const CVV_DIGITS: usize = 3;

/// The first card field that failed its shape check.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardError {
    /// Card number is not exactly 16 digits.
    #[error("card number must be exactly {CARD_NUMBER_DIGITS} digits")]
    Number,
    /// Expiration is not exactly 4 digits.
    #[error("expiration date must be exactly {EXPIRATION_DIGITS} digits (MMYY)")]
    Expiration,
    /// CVV is not exactly 3 digits.
    #[error("CVV must be exactly {CVV_DIGITS} digits")]
    Cvv,
}

/// A card that passed the shape checks.
///
/// Only the last four digits survive parsing; the rest of the number, the
/// expiration and the CVV are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCard {
    last_four: String,
}

impl PaymentCard {
    /// Check number, then expiration, then CVV; the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the [`CardError`] of the first field that is not all ASCII
    /// digits of the exact required length.
    pub fn parse(number: &str, expiration: &str, cvv: &str) -> Result<Self, CardError> {
        if !is_digits(number, CARD_NUMBER_DIGITS) {
            return Err(CardError::Number);
        }
        if !is_digits(expiration, EXPIRATION_DIGITS) {
            return Err(CardError::Expiration);
        }
        if !is_digits(cvv, CVV_DIGITS) {
            return Err(CardError::Cvv);
        }
        Ok(Self {
            last_four: number
                .get(CARD_NUMBER_DIGITS - 4..)
                .unwrap_or_default()
                .to_owned(),
        })
    }

    /// Last four digits, for receipts.
    #[must_use]
    pub fn last_four(&self) -> &str {
        &self.last_four
    }
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}
