//! Checkout input and its syntactic validation.
//!
//! Validation never touches the database. The checks run in a fixed order
//! and the first failure is reported.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use bazaar_core::{CardError, PaymentCard, ProductId, Quantity};

use crate::models::user::ContactBackfill;

/// Why a checkout submission was rejected before anything was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutValidationError {
    #[error("email is required")]
    MissingEmail,
    #[error("card number must be 16 digits")]
    InvalidCardNumber,
    #[error("expiration date must be 4 digits")]
    InvalidExpiration,
    #[error("CVV must be 3 digits")]
    InvalidCvv,
    #[error("shipping address is required")]
    MissingAddress,
    #[error("order has no items")]
    EmptyOrder,
    #[error("quantity for product {0} must be at least 1")]
    InvalidQuantity(ProductId),
    #[error("product {0} is listed more than once")]
    DuplicateItem(ProductId),
}

impl From<CardError> for CheckoutValidationError {
    fn from(e: CardError) -> Self {
        match e {
            CardError::Number => Self::InvalidCardNumber,
            CardError::Expiration => Self::InvalidExpiration,
            CardError::Cvv => Self::InvalidCvv,
        }
    }
}

/// One submitted item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// The checkout form as submitted.
///
/// Missing text fields deserialize as empty strings so they are reported by
/// validation rather than by the JSON extractor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutRequest {
    pub email: String,
    pub card_number: String,
    pub expiration_date: String,
    pub cvv: String,
    pub address: String,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub items: Vec<CheckoutItem>,
}

/// A checkout submission that passed every syntactic check.
#[derive(Debug, Clone)]
pub struct ValidatedCheckout {
    pub card: PaymentCard,
    pub address: String,
    pub contact: ContactBackfill,
    /// In submission order, each product once.
    pub items: Vec<(ProductId, Quantity)>,
}

impl CheckoutRequest {
    /// Validate in order: email, card number, expiration, CVV, address, items.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate(&self) -> Result<ValidatedCheckout, CheckoutValidationError> {
        if self.email.trim().is_empty() {
            return Err(CheckoutValidationError::MissingEmail);
        }

        let card = PaymentCard::parse(&self.card_number, &self.expiration_date, &self.cvv)?;

        let address = self.address.trim();
        if address.is_empty() {
            return Err(CheckoutValidationError::MissingAddress);
        }

        if self.items.is_empty() {
            return Err(CheckoutValidationError::EmptyOrder);
        }
        let mut seen = HashSet::with_capacity(self.items.len());
        let mut items = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let quantity = Quantity::new(item.quantity)
                .map_err(|_| CheckoutValidationError::InvalidQuantity(item.product_id))?;
            if !seen.insert(item.product_id) {
                return Err(CheckoutValidationError::DuplicateItem(item.product_id));
            }
            items.push((item.product_id, quantity));
        }

        Ok(ValidatedCheckout {
            card,
            address: address.to_owned(),
            contact: ContactBackfill::new(
                self.name.as_deref(),
                self.surname.as_deref(),
                self.phone.as_deref(),
            ),
            items,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid() -> CheckoutRequest {
        CheckoutRequest {
            email: "a@b.com".to_string(),
            card_number: "1234567890123456".to_string(),
            expiration_date: "1225".to_string(),
            cvv: "123".to_string(),
            address: "1 Main St".to_string(),
            name: Some("Ann".to_string()),
            surname: None,
            phone: Some("  ".to_string()),
            items: vec![
                CheckoutItem {
                    product_id: ProductId::new(1),
                    quantity: 2,
                },
                CheckoutItem {
                    product_id: ProductId::new(2),
                    quantity: 1,
                },
            ],
        }
    }

    #[test]
    fn test_valid_submission() {
        let checkout = valid().validate().unwrap();
        assert_eq!(checkout.address, "1 Main St");
        assert_eq!(checkout.items.len(), 2);
        assert_eq!(checkout.contact.name.as_deref(), Some("Ann"));
        assert_eq!(checkout.contact.phone, None);
        assert_eq!(checkout.card.last_four(), "3456");
    }

    #[test]
    fn test_missing_email() {
        let mut req = valid();
        req.email = "  ".to_string();
        assert_eq!(req.validate().unwrap_err(), CheckoutValidationError::MissingEmail);
    }

    #[test]
    fn test_fifteen_digit_card() {
        let mut req = valid();
        req.card_number = "123456789012345".to_string();
        assert_eq!(
            req.validate().unwrap_err(),
            CheckoutValidationError::InvalidCardNumber
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let mut req = valid();
        req.card_number = "x".to_string();
        req.cvv = String::new();
        req.address = String::new();
        assert_eq!(
            req.validate().unwrap_err(),
            CheckoutValidationError::InvalidCardNumber
        );

        let mut req = valid();
        req.expiration_date = "12/25".to_string();
        req.cvv = "1".to_string();
        assert_eq!(
            req.validate().unwrap_err(),
            CheckoutValidationError::InvalidExpiration
        );

        let mut req = valid();
        req.cvv = "1234".to_string();
        req.address = String::new();
        assert_eq!(req.validate().unwrap_err(), CheckoutValidationError::InvalidCvv);
    }

    #[test]
    fn test_missing_address() {
        let mut req = valid();
        req.address = "\n".to_string();
        assert_eq!(
            req.validate().unwrap_err(),
            CheckoutValidationError::MissingAddress
        );
    }

    #[test]
    fn test_item_checks() {
        let mut req = valid();
        req.items.clear();
        assert_eq!(req.validate().unwrap_err(), CheckoutValidationError::EmptyOrder);

        let mut req = valid();
        req.items.push(CheckoutItem {
            product_id: ProductId::new(3),
            quantity: 0,
        });
        assert_eq!(
            req.validate().unwrap_err(),
            CheckoutValidationError::InvalidQuantity(ProductId::new(3))
        );

        let mut req = valid();
        req.items.push(CheckoutItem {
            product_id: ProductId::new(1),
            quantity: 1,
        });
        assert_eq!(
            req.validate().unwrap_err(),
            CheckoutValidationError::DuplicateItem(ProductId::new(1))
        );
    }

    #[test]
    fn test_missing_fields_deserialize_as_blank() {
        let req: CheckoutRequest = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert_eq!(req.validate().unwrap_err(), CheckoutValidationError::MissingEmail);
    }
}
