//! Module that defines what a site is (website, API endpoint, etc.)
//!
//! This is used to configure the list of possible sources through `sources.hcl`.
//!
//! Some sites are open, some want an API token passed along every request.
//! A site may define a set of named routes when its API exposes more than
//! one endpoint under the same base URL.
//!

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Describe what a site is and associated credentials.
///
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Site {
    /// Name of the site, filled in from the block label
    pub name: Option<String>,
    /// Base URL (to avoid repeating)
    pub base_url: String,
    /// Credentials
    pub auth: Option<Auth>,
    /// Different URLs available
    pub routes: Option<BTreeMap<String, String>>,
}

/// Describe the possible ways to authenticate oneself
///
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Auth {
    /// Nothing special, no auth
    #[default]
    Anon,
    /// Using an API key supplied through the URL or a header
    Key { api_key: String },
    /// Using a fixed token supplied as a query parameter
    Token { token: String },
}

impl Display for Auth {
    /// Obfuscate the keys & tokens
    ///
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let auth = match self.clone() {
            Auth::Key { .. } => Auth::Key {
                api_key: "HIDDEN".to_string(),
            },
            Auth::Token { .. } => Auth::Token {
                token: "HIDDEN".to_string(),
            },
            Auth::Anon => Auth::Anon,
        };
        write!(f, "{:?}", auth)
    }
}

impl Site {
    /// Basic `new()`
    ///
    pub fn new() -> Self {
        Site::default()
    }

    /// Return the token if the site carries one
    ///
    pub fn token(&self) -> Option<&str> {
        match &self.auth {
            Some(Auth::Token { token }) => Some(token.as_str()),
            _ => None,
        }
    }

    /// Return the list of routes
    ///
    pub fn list(&self) -> Vec<&String> {
        match &self.routes {
            Some(routes) => routes.keys().collect::<Vec<_>>(),
            _ => vec![],
        }
    }

    /// Check whether site has the mentioned route
    ///
    pub fn has(&self, meth: &str) -> bool {
        match &self.routes {
            Some(routes) => routes.contains_key(meth),
            _ => false,
        }
    }

    /// Retrieve a route
    ///
    pub fn route(&self, key: &str) -> Option<&String> {
        match &self.routes {
            Some(routes) => routes.get(key),
            _ => None,
        }
    }
}

impl Display for Site {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let auth = match self.auth.clone() {
            Some(auth) => auth,
            _ => Auth::Anon,
        };
        write!(
            f,
            "{{ url={} auth={} routes={:?} }}",
            self.base_url, auth, self.routes
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::Sources;

    use super::*;

    fn set_default() -> Sources {
        Sources::from_str(include_str!("sources.hcl")).unwrap()
    }

    #[test]
    fn test_site_token() {
        let cfg = set_default();

        let s = cfg.get("mfgrib");
        assert!(s.is_some());
        assert!(s.unwrap().token().is_some());

        let s = cfg.get("hdm");
        assert!(s.is_some());
        assert!(s.unwrap().token().is_none());
    }

    #[test]
    fn test_site_route() {
        let cfg = set_default();

        let s = cfg.get("adresse");
        assert!(s.is_some());

        let s = s.unwrap();
        assert!(s.has("search"));
        let r = s.route("search");
        assert_eq!(Some(&"/search/".to_string()), r);
        assert_eq!(vec!["reverse", "search"], s.list());
    }

    #[test]
    fn test_auth_display_hidden() {
        let a = Auth::Token {
            token: "secret".to_string(),
        };
        assert!(!a.to_string().contains("secret"));
    }
}
