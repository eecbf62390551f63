//! Cancellation plumbing shared by every phase of the update pipeline.
//!
//! The contract pervasively accepts a cancellation handle; this
//! module gives adapters one call to make at each suspension point instead
//! of hand-rolling the check everywhere.

use crate::error::{Error, Result};
use tokio_util::sync::CancellationToken;

/// Returns `Err(Error::Cancelled)` if `token` has been cancelled.
///
/// Call this at natural suspension points: once per filesystem entry in
/// `Detect`, once per dependency in `Plan`, once per update in `Apply`.
pub fn check(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_cancelled() {
        let token = CancellationToken::new();
        assert!(check(&token).is_ok());
    }

    #[test]
    fn cancelled_token_errors() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(check(&token), Err(Error::Cancelled)));
    }
}
