//! Money validation and bill recalculation using rust_decimal
//!
//! The bill total is never trusted as an independent field: it is derived
//! from the billable lines every time a snapshot changes.

use rust_decimal::Decimal;
use shared::session::{
    BillStatus, ItemInput, MONEY_TOLERANCE, OrderItem, PaymentRequest, SessionSnapshot,
};

use super::traits::SessionError;

/// Maximum allowed quantity per line
pub const MAX_QUANTITY: i32 = 9999;
/// Maximum allowed unit price (1,000,000)
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Maximum allowed single payment part (1,000,000)
pub const MAX_PAYMENT_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Maximum number of parts in one split payment
pub const MAX_SPLIT_PARTS: usize = 20;
/// Maximum number of changes in one batch edit
pub const MAX_BATCH_CHANGES: usize = 50;

/// Validate a quantity for a live line
pub fn validate_quantity(quantity: i32) -> Result<(), SessionError> {
    if quantity <= 0 {
        return Err(SessionError::InvalidQuantity(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(SessionError::InvalidQuantity(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, quantity
        )));
    }
    Ok(())
}

/// Validate an item before it is added to a session
pub fn validate_item_input(item: &ItemInput) -> Result<(), SessionError> {
    validate_quantity(item.quantity)?;

    if item.unit_price.is_sign_negative() {
        return Err(SessionError::InvalidAmount(format!(
            "unit_price must be non-negative, got {}",
            item.unit_price
        )));
    }
    if item.unit_price > MAX_UNIT_PRICE {
        return Err(SessionError::InvalidAmount(format!(
            "unit_price exceeds maximum allowed ({}), got {}",
            MAX_UNIT_PRICE, item.unit_price
        )));
    }
    if item.product_id.trim().is_empty() {
        return Err(SessionError::InvalidOperation(
            "product_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validate a payment request's shape (not its amount against the bill)
pub fn validate_payment(payment: &PaymentRequest) -> Result<(), SessionError> {
    let parts = payment.parts();
    if parts.is_empty() {
        return Err(SessionError::InvalidAmount(
            "payment must have at least one part".to_string(),
        ));
    }
    if parts.len() > MAX_SPLIT_PARTS {
        return Err(SessionError::TooManySplitParts(parts.len()));
    }
    for part in &parts {
        if part.amount <= Decimal::ZERO {
            return Err(SessionError::InvalidAmount(format!(
                "payment amount must be positive, got {}",
                part.amount
            )));
        }
        if part.amount > MAX_PAYMENT_AMOUNT {
            return Err(SessionError::InvalidAmount(format!(
                "payment amount exceeds maximum allowed ({}), got {}",
                MAX_PAYMENT_AMOUNT, part.amount
            )));
        }
        for alloc in &part.allocation {
            validate_quantity(alloc.quantity)?;
        }
    }
    Ok(())
}

/// Sum of all recorded transactions
pub fn sum_transactions(snapshot: &SessionSnapshot) -> Decimal {
    snapshot.transactions.iter().map(|t| t.amount).sum()
}

/// Drop in the bill if `item` went down to `quantity` (negative when it grows)
pub fn line_reduction(item: &OrderItem, quantity: i32) -> Decimal {
    if item.status.is_billable() {
        item.unit_price * Decimal::from(item.quantity - quantity)
    } else {
        Decimal::ZERO
    }
}

/// Reject an edit that would shrink the bill below what was already paid
///
/// `reduction` is the net drop in the live total; negative values grow it.
pub fn ensure_covers_paid(
    snapshot: &SessionSnapshot,
    reduction: Decimal,
) -> Result<(), SessionError> {
    if reduction <= Decimal::ZERO {
        return Ok(());
    }
    let paid = sum_transactions(snapshot);
    let total = snapshot.live_total() - reduction;
    if total < paid - MONEY_TOLERANCE {
        return Err(SessionError::BelowPaidAmount { total, paid });
    }
    Ok(())
}

/// Recompute bill total, paid amount and status from the snapshot
///
/// `PAID` iff paid covers total within tolerance.
pub fn recalculate_bill(snapshot: &mut SessionSnapshot) {
    snapshot.bill.total_amount = snapshot.live_total();
    snapshot.bill.paid_amount = sum_transactions(snapshot);
    snapshot.bill.status = if snapshot.bill.is_covered() {
        BillStatus::Paid
    } else {
        BillStatus::Unpaid
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shared::session::{ItemStatus, PaymentMethod, PaymentPart, Role, Transaction};

    fn input(quantity: i32, price: Decimal) -> ItemInput {
        ItemInput {
            product_id: "p-1".to_string(),
            name: "Soup".to_string(),
            quantity,
            unit_price: price,
            client_ref: None,
            status: None,
        }
    }

    #[test]
    fn test_validate_item_input() {
        assert!(validate_item_input(&input(2, dec!(10.00))).is_ok());
        assert!(matches!(
            validate_item_input(&input(0, dec!(10.00))),
            Err(SessionError::InvalidQuantity(_))
        ));
        assert!(matches!(
            validate_item_input(&input(10_000, dec!(10.00))),
            Err(SessionError::InvalidQuantity(_))
        ));
        assert!(matches!(
            validate_item_input(&input(1, dec!(-1))),
            Err(SessionError::InvalidAmount(_))
        ));
        assert!(matches!(
            validate_item_input(&input(1, dec!(1000000.01))),
            Err(SessionError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_validate_payment_limits() {
        let part = |amount| PaymentPart {
            method: PaymentMethod::Cash,
            amount,
            allocation: vec![],
        };

        let ok = PaymentRequest::Split {
            parts: vec![part(dec!(1)); MAX_SPLIT_PARTS],
        };
        assert!(validate_payment(&ok).is_ok());

        let too_many = PaymentRequest::Split {
            parts: vec![part(dec!(1)); MAX_SPLIT_PARTS + 1],
        };
        assert!(matches!(
            validate_payment(&too_many),
            Err(SessionError::TooManySplitParts(21))
        ));

        let empty = PaymentRequest::Split { parts: vec![] };
        assert!(matches!(
            validate_payment(&empty),
            Err(SessionError::InvalidAmount(_))
        ));

        let zero = PaymentRequest::Single {
            method: PaymentMethod::Pos,
            amount: Decimal::ZERO,
        };
        assert!(matches!(
            validate_payment(&zero),
            Err(SessionError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_recalculate_bill() {
        let mut s = SessionSnapshot::new("s-1".to_string());
        s.items.push(OrderItem {
            id: "i-1".to_string(),
            client_ref: None,
            product_id: "p-1".to_string(),
            name: "Soup".to_string(),
            quantity: 2,
            unit_price: dec!(10.00),
            status: ItemStatus::Confirmed,
            created_by: "w-1".to_string(),
            created_by_role: Role::Waiter,
            created_at: 0,
            updated_at: 0,
            voided_quantity: 0,
            void_reason: None,
        });

        recalculate_bill(&mut s);
        assert_eq!(s.bill.total_amount, dec!(20.00));
        assert_eq!(s.bill.status, BillStatus::Unpaid);

        s.transactions.push(Transaction {
            transaction_id: "t-1".to_string(),
            payment_group_id: "g-1".to_string(),
            method: PaymentMethod::Cash,
            amount: dec!(20.00),
            recorded_by: "c-1".to_string(),
            recorded_at: 0,
        });
        recalculate_bill(&mut s);
        assert_eq!(s.bill.paid_amount, dec!(20.00));
        assert_eq!(s.bill.remaining(), Decimal::ZERO);
        assert_eq!(s.bill.status, BillStatus::Paid);
    }

    #[test]
    fn test_ensure_covers_paid() {
        let mut s = SessionSnapshot::new("s-1".to_string());
        for (id, price) in [("steak", dec!(40.00)), ("soup", dec!(10.00))] {
            s.items.push(OrderItem {
                id: id.to_string(),
                client_ref: None,
                product_id: id.to_string(),
                name: id.to_string(),
                quantity: 1,
                unit_price: price,
                status: ItemStatus::Confirmed,
                created_by: "w-1".to_string(),
                created_by_role: Role::Waiter,
                created_at: 0,
                updated_at: 0,
                voided_quantity: 0,
                void_reason: None,
            });
        }
        s.transactions.push(Transaction {
            transaction_id: "t-1".to_string(),
            payment_group_id: "g-1".to_string(),
            method: PaymentMethod::Cash,
            amount: dec!(30.00),
            recorded_by: "c-1".to_string(),
            recorded_at: 0,
        });

        assert!(ensure_covers_paid(&s, dec!(10.00)).is_ok());
        assert!(ensure_covers_paid(&s, dec!(20.004)).is_ok());
        assert!(ensure_covers_paid(&s, dec!(-5.00)).is_ok());
        let err = ensure_covers_paid(&s, dec!(40.00)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::BelowPaidAmount { total, paid } if total == dec!(10.00) && paid == dec!(30.00)
        ));
        assert_eq!(err.suggestion(), Some("refund the payment first"));
    }
}
