use daybook_domain::RecordId;
use rust_decimal::Decimal;

use crate::{CoreError, CoreResult};

pub(crate) fn require_text(value: &str, field: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        Err(CoreError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

pub(crate) fn require_positive(amount: Decimal, field: &str) -> CoreResult<()> {
    if amount <= Decimal::ZERO {
        Err(CoreError::Validation(format!(
            "{field} must be greater than zero"
        )))
    } else {
        Ok(())
    }
}

pub(crate) fn not_found(kind: &'static str, id: RecordId) -> CoreError {
    CoreError::RecordNotFound { kind, id }
}
