//! Checked amount arithmetic.
//!
//! All balance mutation in this crate goes through these helpers so that
//! overflow is an error, never a wrap.

use crate::{EscrowError, Result, Wei};

pub fn add_wei(a: Wei, b: Wei) -> Result<Wei> {
    a.checked_add(b)
        .ok_or_else(|| EscrowError::AmountOverflow("u128 overflow in add".into()))
}

pub fn sub_wei(a: Wei, b: Wei) -> Result<Wei> {
    a.checked_sub(b)
        .ok_or_else(|| EscrowError::AmountOverflow("u128 underflow in sub".into()))
}
