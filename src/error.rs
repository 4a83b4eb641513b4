use thiserror::Error;

/// Printed when stored credentials can no longer be exchanged for a token.
pub const REAUTHORIZE_MESSAGE: &str =
    "The credentials have been revoked or expired, please re-run the application to re-authorize";

/// Authorization failures that the command line reports on their own.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token endpoint rejected the grant (`invalid_grant`).
    #[error("access token refresh failed: {description}")]
    TokenRefresh { description: String },
}

/// Returns true when `err`, or anything in its cause chain, is a rejected token refresh.
pub fn is_token_refresh(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<AuthError>(),
            Some(AuthError::TokenRefresh { .. })
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn detects_token_refresh_through_context() {
        let err = Err::<(), _>(AuthError::TokenRefresh {
            description: "Token has been expired or revoked.".into(),
        })
        .context("Failed to authorize")
        .unwrap_err();
        assert!(is_token_refresh(&err));
    }

    #[test]
    fn other_errors_are_not_token_refresh() {
        let err = anyhow::anyhow!("POST failed 404 Not Found");
        assert!(!is_token_refresh(&err));
    }
}
