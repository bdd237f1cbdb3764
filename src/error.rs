//! Error types for the QuickBooks API SDK.
//!
//! This module contains error types used throughout the SDK for configuration
//! and validation errors.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use quickbooks_api::{ClientId, ConfigError};
//!
//! let result = ClientId::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyClientId)));
//! ```

use thiserror::Error;

/// Errors that can occur during SDK configuration.
///
/// This enum represents all possible errors that can occur when creating
/// or validating configuration types. Each variant provides a clear,
/// actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Client ID cannot be empty.
    #[error("Client ID cannot be empty. Please provide a valid OAuth2 client ID.")]
    EmptyClientId,

    /// Client secret cannot be empty.
    #[error("Client secret cannot be empty. Please provide a valid OAuth2 client secret.")]
    EmptyClientSecret,

    /// Company ID is invalid.
    #[error("Invalid company ID '{company_id}'. Expected the numeric realm ID assigned by QuickBooks.")]
    InvalidCompanyId {
        /// The invalid company ID that was provided.
        company_id: String,
    },

    /// Redirect URI is invalid.
    #[error("Invalid redirect URI '{uri}'. Please provide an absolute URL with scheme (e.g., 'https://myapp.example.com/callback').")]
    InvalidRedirectUri {
        /// The invalid URI that was provided.
        uri: String,
    },

    /// Scopes are invalid.
    #[error("Invalid scopes: {reason}")]
    InvalidScopes {
        /// The reason the scopes are invalid.
        reason: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_client_id_error_message() {
        let error = ConfigError::EmptyClientId;
        let message = error.to_string();
        assert!(message.contains("Client ID cannot be empty"));
        assert!(message.contains("valid OAuth2 client ID"));
    }

    #[test]
    fn test_invalid_company_id_error_message() {
        let error = ConfigError::InvalidCompanyId {
            company_id: "not a realm!".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("not a realm!"));
        assert!(message.contains("realm ID"));
    }

    #[test]
    fn test_missing_required_field_error_message() {
        let error = ConfigError::MissingRequiredField { field: "client_id" };
        let message = error.to_string();
        assert!(message.contains("client_id"));
        assert!(message.contains("must be set"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::EmptyClientId;
        // Verify it implements std::error::Error by using it as a dyn Error
        let _: &dyn std::error::Error = &error;
    }
}
