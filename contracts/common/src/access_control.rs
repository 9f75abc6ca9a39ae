//! Access Control Module
//!
//! Single-owner authorization and payable guards.

use crate::errors::{FundMeError, FundMeResult};
use crate::types::{Address, CallContext};

/// Fail with `NotOwner` unless `caller` is `owner`
pub fn only_owner(owner: &Address, caller: &Address) -> FundMeResult<()> {
    if caller != owner {
        return Err(FundMeError::NotOwner {
            owner: *owner,
            caller: *caller,
        });
    }
    Ok(())
}

/// Fail with `Unauthorized` unless `caller` is the designated operator
pub fn only_operator(operator: &Address, caller: &Address) -> FundMeResult<()> {
    if caller != operator {
        return Err(FundMeError::Unauthorized {
            expected: *operator,
            actual: *caller,
        });
    }
    Ok(())
}

/// Fail with `NotPayable` if the call carries value
pub fn non_payable(ctx: &CallContext, function: &'static str) -> FundMeResult<()> {
    if ctx.value != 0 {
        return Err(FundMeError::NotPayable { function });
    }
    Ok(())
}
