//! Secure handling of backup passwords
//!
//! [`Password`] zeroes its buffer on drop and never prints its contents.

use std::fmt;
use std::ops::Deref;

use zeroize::Zeroizing;

/// A password that zeros its contents on drop
#[derive(Clone)]
pub struct Password {
    inner: Zeroizing<String>,
}

impl Password {
    /// Create a new Password
    pub fn new(s: impl Into<String>) -> Self {
        Self {
            inner: Zeroizing::new(s.into()),
        }
    }

    /// Get the password contents
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Deref for Password {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// Don't print the contents in Debug output
impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Password")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_creation() {
        let p = Password::new("secret");
        assert_eq!(p.as_str(), "secret");
        assert!(!p.is_empty());
        assert!(Password::from("").is_empty());
    }

    #[test]
    fn test_password_debug_redacted() {
        let p = Password::new("secret");
        let debug = format!("{:?}", p);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("Password"));
    }

    #[test]
    fn test_password_display_redacted() {
        let p = Password::new("secret");
        assert_eq!(format!("{}", p), "[REDACTED]");
    }
}
