//! QuickBooks environment definitions.
//!
//! This module provides the [`Environment`] enum for selecting between the
//! production and sandbox endpoints of the QuickBooks Online API.

use std::fmt;
use std::str::FromStr;

/// QuickBooks API environment.
///
/// QuickBooks Online exposes separate hosts for production and sandbox
/// companies. The OAuth2 authorization and token endpoints are shared
/// between environments; only the API host differs.
///
/// # Example
///
/// ```rust
/// use quickbooks_api::Environment;
///
/// let env = Environment::Sandbox;
/// assert_eq!(env.api_base_url(), "https://sandbox-quickbooks.api.intuit.com");
///
/// // Parse from string (e.g., from an environment variable)
/// let env: Environment = "production".parse().unwrap();
/// assert_eq!(env, Environment::Production);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Production companies and live data.
    Production,
    /// Sandbox companies for development and testing.
    #[default]
    Sandbox,
}

impl Environment {
    /// Returns the base URL for API requests in this environment.
    #[must_use]
    pub const fn api_base_url(self) -> &'static str {
        match self {
            Self::Production => "https://quickbooks.api.intuit.com",
            Self::Sandbox => "https://sandbox-quickbooks.api.intuit.com",
        }
    }

    /// Returns the OAuth2 token endpoint URL.
    ///
    /// The token endpoint is shared between production and sandbox.
    #[must_use]
    pub const fn token_url(self) -> &'static str {
        "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer"
    }

    /// Returns the OAuth2 authorization endpoint URL.
    #[must_use]
    pub const fn authorization_url(self) -> &'static str {
        "https://appcenter.intuit.com/connect/oauth2"
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Sandbox => write!(f, "sandbox"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "sandbox" => Ok(Self::Sandbox),
            other => Err(format!(
                "Unknown environment '{other}'. Expected 'production' or 'sandbox'."
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_urls_differ_by_environment() {
        assert_eq!(
            Environment::Production.api_base_url(),
            "https://quickbooks.api.intuit.com"
        );
        assert_eq!(
            Environment::Sandbox.api_base_url(),
            "https://sandbox-quickbooks.api.intuit.com"
        );
    }

    #[test]
    fn test_token_url_is_shared() {
        assert_eq!(
            Environment::Production.token_url(),
            Environment::Sandbox.token_url()
        );
    }

    #[test]
    fn test_parse_from_string() {
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "Sandbox".parse::<Environment>().unwrap(),
            Environment::Sandbox
        );
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for env in [Environment::Production, Environment::Sandbox] {
            let parsed: Environment = env.to_string().parse().unwrap();
            assert_eq!(parsed, env);
        }
    }

    #[test]
    fn test_default_is_sandbox() {
        assert_eq!(Environment::default(), Environment::Sandbox);
    }
}
