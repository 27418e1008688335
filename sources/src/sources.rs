//! Main sources configuration management and loading
//!

use std::collections::btree_map::{Iter, Keys, Values};
use std::collections::BTreeMap;
use std::fs;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::trace;

use estran_common::{makepath, ConfigFile};

use crate::Site;
use crate::CONFIG;

const SVERSION: usize = 1;

/// Main struct holding the on-disk configuration
///
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
struct SourcesFile {
    version: usize,
    site: BTreeMap<String, Site>,
}

/// List of sources, this is the only exposed struct from here.
///
#[derive(Debug)]
pub struct Sources(BTreeMap<String, Site>);

impl Sources {
    /// Returns the path of the default config file
    ///
    pub fn default_file() -> Result<PathBuf> {
        let basedir = BaseDirs::new().ok_or_else(|| eyre!("no base directories"))?;
        let def: PathBuf = makepath!(basedir.config_dir(), "estran", CONFIG);
        trace!("Default file: {:?}", def);
        Ok(def)
    }

    /// Install the default `sources.hcl` into place
    ///
    pub fn install_defaults(dir: &Path) -> std::io::Result<()> {
        if !dir.exists() {
            create_dir_all(dir)?
        }

        let fname: PathBuf = makepath!(dir, CONFIG);
        let content = include_str!("sources.hcl");
        fs::write(fname, content)
    }

    /// Load configuration from either the specified file or the default
    /// one, through the common `ConfigFile` engine.
    ///
    pub fn load(fname: &Option<PathBuf>) -> Result<Sources> {
        let cnf = match fname {
            Some(cnf) => cnf.clone(),
            _ => Sources::default_file()?,
        };
        trace!("Loading from {:?}", cnf);
        let cfg = ConfigFile::<SourcesFile>::load(Some(&cnf.to_string_lossy()))?;
        let s = cfg
            .inner()
            .ok_or_else(|| eyre!("empty sources file {:?}", cnf))?;
        Self::from_sources_file(s)
    }

    /// Parse an HCL string into the sources registry
    ///
    pub fn from_str(content: &str) -> Result<Sources> {
        let s: SourcesFile = hcl::from_str(content)?;
        Self::from_sources_file(&s)
    }

    fn from_sources_file(s: &SourcesFile) -> Result<Sources> {
        if s.version != SVERSION {
            return Err(eyre!("bad sources.hcl version, expected {SVERSION}"));
        }

        // Fetch the site name and insert it into each Site
        //
        let mut sources: BTreeMap<String, Site> = BTreeMap::new();
        s.site.iter().for_each(|(name, site)| {
            let mut site = site.clone();
            site.name = Some(name.clone());
            sources.insert(name.clone(), site);
        });
        Ok(Sources(sources))
    }

    /// Wrap `get`
    ///
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Site> {
        self.0.get(name)
    }

    /// Wrap `is_empty()`
    ///
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wrap `len()`
    ///
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Wrap `keys()`
    ///
    #[inline]
    pub fn keys(&self) -> Keys<'_, String, Site> {
        self.0.keys()
    }

    /// Wrap `values()`
    ///
    #[inline]
    pub fn values(&self) -> Values<'_, String, Site> {
        self.0.values()
    }

    /// Wrap `contains_key()`
    ///
    #[inline]
    pub fn contains_key(&self, s: &str) -> bool {
        self.0.contains_key(s)
    }

    /// Wrap `iter()`
    ///
    #[inline]
    pub fn iter(&self) -> Iter<'_, String, Site> {
        self.0.iter()
    }

    /// Display all sources as a nice table
    ///
    pub fn list(&self) -> Result<String> {
        let header = vec!["Name", "URL", "Auth", "Routes"];

        let mut builder = Builder::default();
        builder.push_record(header);

        self.iter().for_each(|(name, site)| {
            let auth = match &site.auth {
                Some(auth) => auth.to_string(),
                _ => "open".to_string(),
            };
            let routes = site
                .list()
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let row = vec![name.clone(), site.base_url.clone(), auth, routes];
            builder.push_record(row);
        });
        let table = builder.build().with(Style::modern()).to_string();
        let table = format!("List of sources:\n{}", table);
        Ok(table)
    }
}

impl<'a> IntoIterator for &'a Sources {
    type Item = (&'a String, &'a Site);
    type IntoIter = Iter<'a, String, Site>;

    fn into_iter(self) -> Iter<'a, String, Site> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::env::temp_dir;

    use crate::site::Auth;

    use super::*;

    fn set_default() -> Sources {
        Sources::from_str(include_str!("sources.hcl")).unwrap()
    }

    #[test]
    fn test_sources_load_hcl() {
        let cfg = set_default();

        assert!(!cfg.is_empty());
        assert_eq!(7, cfg.len());

        if let Some(site) = cfg.get("meteofrance") {
            assert_eq!("https://webservice.meteofrance.com", site.base_url);
            match &site.auth {
                Some(Auth::Token { token }) => {
                    assert!(token.starts_with("__"));
                }
                _ => panic!("bad auth"),
            }
        }

        if let Some(site) = cfg.get("hdm") {
            assert_eq!("https://maree.shom.fr", site.base_url);
            assert!(site.auth.is_none());
        }
    }

    #[test]
    fn test_sources_bad_version() {
        let r = Sources::from_str("version = 42\nsite \"x\" { base_url = \"http://x\" }\n");
        assert!(r.is_err());
    }

    #[test]
    fn test_sources_list() {
        let cfg = set_default();

        let txt = cfg.list().unwrap();
        assert!(txt.contains("meteoconsult"));
        assert!(!txt.contains("5yLVTdr"));
    }

    #[test]
    fn test_sources_load_through_config_engine() {
        let tempdir = temp_dir().join("estran-sources-load-test");

        Sources::install_defaults(&tempdir).unwrap();
        let f: PathBuf = makepath!(&tempdir, CONFIG);
        let cfg = Sources::load(&Some(f)).unwrap();
        assert_eq!(7, cfg.len());
        assert!(cfg.contains_key("hdm"));
    }

    #[test]
    fn test_install_files() {
        let tempdir = temp_dir().join("estran-sources-test");

        Sources::install_defaults(&tempdir).unwrap();
        let f: PathBuf = makepath!(&tempdir, CONFIG);
        assert!(f.exists());
    }
}
