//! Session cookies exported from a logged-in browser.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Same-site policies accepted by the rendering session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    /// Case-insensitive match; anything else is unrecognised.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(SameSite::Strict),
            "lax" => Some(SameSite::Lax),
            "none" | "no_restriction" => Some(SameSite::None),
            _ => None,
        }
    }
}

/// One cookie entry as found in `cookies.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub secure: Option<bool>,
    #[serde(default)]
    pub http_only: Option<bool>,
    /// Expiry as seconds since the epoch
    #[serde(default, alias = "expirationDate")]
    pub expires: Option<f64>,
    /// Raw same-site value; see [`SessionCookie::same_site`]
    #[serde(default)]
    pub same_site: Option<String>,
}

impl SessionCookie {
    /// Load the cookie array from a JSON file.
    ///
    /// A missing file, invalid JSON, or an empty array is a session error.
    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::session(format!("cannot read {}: {}", path.display(), e))
        })?;
        let cookies: Vec<Self> = serde_json::from_str(&content).map_err(|e| {
            AppError::session(format!("invalid JSON in {}: {}", path.display(), e))
        })?;
        if cookies.is_empty() {
            return Err(AppError::session(format!(
                "{} contains no cookies",
                path.display()
            )));
        }
        Ok(cookies)
    }

    /// Recognised same-site policy; unrecognised values are dropped.
    pub fn same_site(&self) -> Option<SameSite> {
        self.same_site.as_deref().and_then(SameSite::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_same_site_parse() {
        assert_eq!(SameSite::parse("strict"), Some(SameSite::Strict));
        assert_eq!(SameSite::parse("Lax"), Some(SameSite::Lax));
        assert_eq!(SameSite::parse("None"), Some(SameSite::None));
        assert_eq!(SameSite::parse("unspecified"), None);
    }

    #[test]
    fn test_unrecognised_same_site_keeps_cookie() {
        let cookies: Vec<SessionCookie> = serde_json::from_str(
            r#"[
                {"name": "auth_token", "value": "abc", "domain": ".x.com", "path": "/", "sameSite": "unspecified", "httpOnly": true},
                {"name": "ct0", "value": "def", "domain": ".x.com", "path": "/", "sameSite": "lax"}
            ]"#,
        )
        .unwrap();

        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].same_site(), None);
        assert_eq!(cookies[0].http_only, Some(true));
        assert_eq!(cookies[1].same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn test_load_missing_file_is_session_error() {
        let tmp = TempDir::new().unwrap();
        let result = SessionCookie::load_all(tmp.path().join("cookies.json"));
        assert!(matches!(result, Err(AppError::Session(_))));
    }

    #[test]
    fn test_load_invalid_json_is_session_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cookies.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            SessionCookie::load_all(&path),
            Err(AppError::Session(_))
        ));
    }
}
