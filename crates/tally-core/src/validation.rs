//! # Validation Module
//!
//! Input validation for ledger, catalog and party operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation                                                  │
//! │  └── Immediate user feedback (empty fields, obvious typos)             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (tally-core)                                     │
//! │  ├── Shape checks: empty ids, empty item lists, non-positive values    │
//! │  └── Runs before any snapshot lookup or batch staging                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign keys (employee → company)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::ItemRequest;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 120;

/// Largest quantity a single line item may carry.
pub const MAX_QUANTITY: i64 = 10_000;

/// Largest catalog price, in cents (100 000.00).
pub const MAX_PRICE_CENTS: i64 = 10_000_000;

/// Largest stock level, and largest manual stock adjustment either way.
pub const MAX_STOCK: i64 = 1_000_000;

/// Validates that an id (entry, employee, product, company) is present.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a display name (product, company, employee).
///
/// ```rust
/// use tally_core::validation::validate_name;
///
/// assert!(validate_name("Coxinha").is_ok());
/// assert!(validate_name("   ").is_err());
/// ```
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Catalog prices are strictly positive and at most [`MAX_PRICE_CENTS`].
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    if price.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::TooLarge {
            field: "price (cents)".to_string(),
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Stock levels set from the catalog are between zero and [`MAX_STOCK`].
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }
    if stock > MAX_STOCK {
        return Err(ValidationError::TooLarge {
            field: "stock".to_string(),
            max: MAX_STOCK,
        });
    }
    Ok(())
}

/// Manual stock adjustments move at most [`MAX_STOCK`] units either way.
pub fn validate_stock_delta(delta: i64) -> ValidationResult<()> {
    if delta.checked_abs().map_or(true, |size| size > MAX_STOCK) {
        return Err(ValidationError::TooLarge {
            field: "stock delta".to_string(),
            max: MAX_STOCK,
        });
    }
    Ok(())
}

/// Payment amounts are strictly positive.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    Ok(())
}

/// Validates the item list of an add or edit.
///
/// ## Rules
/// - At least one item
/// - Every item names a product
/// - Every quantity is positive and at most [`MAX_QUANTITY`]
pub fn validate_items(items: &[ItemRequest]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    for item in items {
        validate_id("product id", &item.product_id)?;
        if item.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
        if item.quantity > MAX_QUANTITY {
            return Err(ValidationError::TooLarge {
                field: "quantity".to_string(),
                max: MAX_QUANTITY,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Pão de queijo").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_price_and_stock() {
        assert!(validate_price(Money::from_cents(1)).is_ok());
        assert!(validate_price(Money::zero()).is_err());
        assert!(validate_price(Money::from_cents(-100)).is_err());

        assert!(validate_price(Money::from_cents(MAX_PRICE_CENTS)).is_ok());
        assert!(validate_price(Money::from_cents(MAX_PRICE_CENTS + 1)).is_err());

        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
        assert!(validate_stock(MAX_STOCK + 1).is_err());

        assert!(validate_stock_delta(-MAX_STOCK).is_ok());
        assert!(validate_stock_delta(MAX_STOCK + 1).is_err());
        assert!(validate_stock_delta(i64::MIN).is_err());
    }

    #[test]
    fn test_validate_items() {
        assert!(validate_items(&[ItemRequest::new("p1", 2)]).is_ok());
        assert!(validate_items(&[]).is_err());
        assert!(validate_items(&[ItemRequest::new("p1", 0)]).is_err());
        assert!(validate_items(&[ItemRequest::new("", 1)]).is_err());
        assert!(validate_items(&[ItemRequest::new("p1", MAX_QUANTITY)]).is_ok());
        assert!(matches!(
            validate_items(&[ItemRequest::new("p1", MAX_QUANTITY + 1)]),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(Money::from_cents(1200)).is_ok());
        assert!(validate_payment_amount(Money::zero()).is_err());
    }
}
