//! This is the `ConfigFile` struct.
//!
//! This is for finding the right default locations for various configuration files for
//! `estran`.  This is a configuration file/struct neutral loading engine, storing only the
//! base directory and with `load()` read the proper file or the default one.
//!
//! This encapsulates the configuration file, available with `.inner()` or `.inner_mut()`.
//!

use std::fmt::Debug;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use eyre::{eyre, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, error, trace};

use crate::makepath;

/// Config filename
const CONFIG: &str = "config.hcl";

/// Main name for the directory base
const TAG: &str = "estran";

/// Configuration for the CLI tool, supposed to include parameters and the
/// definition of the various sources.
///
#[derive(Debug)]
pub struct ConfigFile<T: Debug + DeserializeOwned> {
    /// Tag is the project name.
    tag: String,
    /// This is the base directory for all files.
    basedir: PathBuf,
    inner: Option<T>,
}

impl<T> ConfigFile<T>
where
    T: Debug + DeserializeOwned,
{
    #[tracing::instrument]
    fn new(tag: &str) -> Self {
        let base = BaseDirs::new();

        let basedir: PathBuf = match base {
            Some(base) => {
                #[cfg(unix)]
                let base = base.home_dir().join(".config").to_string_lossy().to_string();

                #[cfg(windows)]
                let base = base.data_local_dir().to_string_lossy().to_string();

                debug!("base = {base}");
                let base: PathBuf = makepath!(base, tag);
                base
            }
            None => {
                #[cfg(unix)]
                let homedir = std::env::var("HOME")
                    .map_err(|_| error!("No HOME variable defined, can not continue"))
                    .unwrap_or_default();

                #[cfg(windows)]
                let homedir = std::env::var("LOCALAPPDATA")
                    .map_err(|_| error!("No LOCALAPPDATA variable defined, can not continue"))
                    .unwrap_or_default();

                debug!("base = {homedir}");

                #[cfg(unix)]
                let base: PathBuf = makepath!(homedir, ".config", tag);

                #[cfg(windows)]
                let base: PathBuf = makepath!(homedir, tag);

                base
            }
        };
        ConfigFile {
            tag: String::from(tag),
            basedir,
            inner: None,
        }
    }

    /// Returns the path of the default config directory
    ///
    #[tracing::instrument]
    pub fn config_path(&self) -> PathBuf {
        self.basedir.clone()
    }

    /// Returns the path of the default config file
    ///
    #[tracing::instrument]
    pub fn default_file(&self) -> PathBuf {
        let cfg = self.config_path().join(CONFIG);
        debug!("default = {cfg:?}");
        cfg
    }

    /// Load the file and return a struct T in the right format.
    ///
    /// Use the following search path:
    /// - default basedir (based on $HOME or $LOCALAPPDATA)
    /// - file specified on CLI
    ///
    #[tracing::instrument]
    pub fn load(fname: Option<&str>) -> Result<ConfigFile<T>> {
        let mut cfg = ConfigFile::<T>::new(TAG);

        let fname = match fname {
            Some(fname) => PathBuf::from(fname),
            None => cfg.default_file(),
        };

        // Use a full path
        //
        let fname = if fname.exists() {
            fname.canonicalize()?
        } else {
            return Err(eyre!(
                "Unknown config file {:?} and no default in {:?}",
                fname,
                cfg.default_file()
            ));
        };

        trace!("Loading config file {fname:?} from {:?}", cfg.config_path());

        let data = fs::read_to_string(fname)?;
        debug!("string data = {data}");

        let data: T = hcl::from_str(&data)?;
        debug!("struct data = {data:?}");

        cfg.inner = Some(data);
        Ok(cfg)
    }

    /// Name of the project the basedir is derived from.
    ///
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Return the inner configuration file
    ///
    pub fn inner(&self) -> Option<&T> {
        self.inner.as_ref()
    }

    /// Return the inner configuration file as mutable
    ///
    pub fn inner_mut(&mut self) -> Option<&mut T> {
        self.inner.as_mut()
    }
}
