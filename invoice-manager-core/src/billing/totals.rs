use rust_decimal::Decimal;

use crate::models::invoice::{Invoice, LineItem};
use crate::models::ValidationError;

/// Derived invoice amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

fn out_of_range() -> ValidationError {
    ValidationError::new("invoice amounts are out of range")
}

/// Computes line amounts and invoice totals.
///
/// Sets each item's `amount` to `quantity * rate`, then returns
/// `subtotal = Σ amount`, `tax_amount = subtotal * tax_rate / 100` and
/// `total = subtotal + tax_amount`. No rounding is applied.
///
/// # Errors
///
/// Returns a `ValidationError` if any intermediate value overflows `Decimal`.
pub fn compute_totals(
    items: &mut [LineItem],
    tax_rate: Decimal,
) -> Result<Totals, ValidationError> {
    let mut subtotal = Decimal::ZERO;
    for item in items.iter_mut() {
        item.amount = item.quantity.checked_mul(item.rate).ok_or_else(out_of_range)?;
        subtotal = subtotal.checked_add(item.amount).ok_or_else(out_of_range)?;
    }

    let tax_amount = subtotal
        .checked_mul(tax_rate)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(out_of_range)?;
    let total = subtotal.checked_add(tax_amount).ok_or_else(out_of_range)?;

    Ok(Totals {
        subtotal,
        tax_amount,
        total,
    })
}

/// Recomputes every derived field of an invoice in place.
///
/// Runs on each create and update before the invoice is written, so any
/// amounts supplied by the caller are overwritten.
pub fn recompute_totals(invoice: &mut Invoice) -> Result<(), ValidationError> {
    let totals = compute_totals(&mut invoice.items, invoice.tax_rate)?;
    invoice.subtotal = totals.subtotal;
    invoice.tax_amount = totals.tax_amount;
    invoice.total = totals.total;
    Ok(())
}
