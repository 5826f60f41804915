//! Identity of the program making requests, rendered as a `User-Agent`.

use crate::{Error, Result};
use std::fmt;

/// Package name used by [`Application::default`].
pub const DEFAULT_NAME: &str = env!("CARGO_PKG_NAME");

/// Package version used by [`Application::default`].
pub const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package URL used by [`Application::default`].
pub const DEFAULT_CONTACT: &str = env!("CARGO_PKG_REPOSITORY");

/// The specific field missing from an [`Application`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationError {
    /// The application has no name.
    #[error("application name required")]
    NameRequired,

    /// The application has no version.
    #[error("application version required")]
    VersionRequired,

    /// The application has no contact information.
    #[error("application contact required")]
    ContactRequired,
}

/// The application that is making requests to the API.
///
/// # Examples
///
/// ```
/// use wordpress_client::Application;
///
/// let app = Application::new("WP", "1.0.0", "https://x").unwrap();
/// assert_eq!(app.user_agent().unwrap().to_string(), "WP/1.0.0 (https://x)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    /// The name of the application.
    pub name: String,

    /// The version of the application.
    pub version: String,

    /// Contact information for the application, either an email or a URL.
    pub contact: String,
}

impl Application {
    /// Creates an `Application` and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidApplication`] naming the first empty field.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        contact: impl Into<String>,
    ) -> Result<Self> {
        let app = Self {
            name: name.into(),
            version: version.into(),
            contact: contact.into(),
        };

        app.validate().map_err(Error::InvalidApplication)?;

        Ok(app)
    }

    /// Checks that name, version and contact are all present, in that order.
    pub fn validate(&self) -> std::result::Result<(), ApplicationError> {
        if self.name.is_empty() {
            return Err(ApplicationError::NameRequired);
        }

        if self.version.is_empty() {
            return Err(ApplicationError::VersionRequired);
        }

        if self.contact.is_empty() {
            return Err(ApplicationError::ContactRequired);
        }

        Ok(())
    }

    /// Returns the `User-Agent` for this application, or `None` if the
    /// application is invalid.
    pub fn user_agent(&self) -> Option<UserAgent> {
        self.validate().ok()?;

        Some(UserAgent {
            token: self.name.clone(),
            version: self.version.clone(),
            comment: vec![self.contact.clone()],
        })
    }
}

impl Default for Application {
    /// The built-in identity of this crate.
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            version: DEFAULT_VERSION.to_string(),
            contact: DEFAULT_CONTACT.to_string(),
        }
    }
}

/// A structured `User-Agent` value: `token/version (comment; ...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent {
    /// The product token.
    pub token: String,

    /// The product version.
    pub version: String,

    /// Free-form comments, rendered inside parentheses.
    pub comment: Vec<String>,
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.token, self.version)?;

        if !self.comment.is_empty() {
            write!(f, " ({})", self.comment.join("; "))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_application() {
        let cases = [
            ("WordPress", "5.4.1", "https://wordpress.org/", None),
            (
                "",
                "5.4.1",
                "https://wordpress.org/",
                Some(ApplicationError::NameRequired),
            ),
            (
                "WordPress",
                "",
                "https://wordpress.org/",
                Some(ApplicationError::VersionRequired),
            ),
            (
                "WordPress",
                "5.4.1",
                "",
                Some(ApplicationError::ContactRequired),
            ),
        ];

        for (name, version, contact, expected) in cases {
            match (Application::new(name, version, contact), expected) {
                (Ok(_), None) => {}
                (Err(Error::InvalidApplication(got)), Some(want)) => assert_eq!(got, want),
                (result, want) => panic!("expected {:?}, got {:?}", want, result),
            }
        }
    }

    #[test]
    fn test_missing_name_reported_before_version() {
        let app = Application {
            name: String::new(),
            version: String::new(),
            contact: String::new(),
        };
        assert_eq!(app.validate(), Err(ApplicationError::NameRequired));
    }

    #[test]
    fn test_user_agent_for_valid_application() {
        let app = Application::new("WP", "1.0.0", "https://x").unwrap();
        assert_eq!(
            app.user_agent(),
            Some(UserAgent {
                token: "WP".to_string(),
                version: "1.0.0".to_string(),
                comment: vec!["https://x".to_string()],
            })
        );
    }

    #[test]
    fn test_user_agent_for_invalid_application_is_none() {
        let app = Application {
            name: "WordPress".to_string(),
            version: "5.4.1".to_string(),
            contact: String::new(),
        };
        assert_eq!(app.user_agent(), None);
    }

    #[test]
    fn test_default_application_is_valid() {
        let app = Application::default();
        assert_eq!(app.name, DEFAULT_NAME);
        assert_eq!(app.version, DEFAULT_VERSION);
        assert_eq!(app.contact, DEFAULT_CONTACT);
        assert!(app.validate().is_ok());
    }

    #[test]
    fn test_user_agent_display() {
        let ua = UserAgent {
            token: "wordpress-client".to_string(),
            version: "0.1.0".to_string(),
            comment: vec!["https://example.com".to_string(), "bot".to_string()],
        };
        assert_eq!(
            ua.to_string(),
            "wordpress-client/0.1.0 (https://example.com; bot)"
        );

        let bare = UserAgent {
            comment: Vec::new(),
            ..ua
        };
        assert_eq!(bare.to_string(), "wordpress-client/0.1.0");
    }
}
