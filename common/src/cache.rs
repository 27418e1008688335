//! Timestamp-aware download cache.
//!
//! Remote files (GRIB runs, scraped indexes) land in a cache directory
//! with a sidecar `.stamp` file holding the server's `Last-Modified`
//! header.  Subsequent fetches issue a `HEAD` first and only download
//! again when the server copy is newer.  Gzip payloads are inflated on
//! the way in.
//!

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use eyre::Result;
use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use reqwest::header::LAST_MODIFIED;
use tracing::{debug, trace};

/// Gzip magic bytes.
const GZ_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// One cached remote file inside a given cache directory.
///
#[derive(Clone, Debug)]
pub struct CachedFile {
    /// Where the payload lives.
    path: PathBuf,
    /// Sidecar holding the last seen `Last-Modified` value.
    stamp: PathBuf,
}

impl CachedFile {
    /// A cache slot named `name` under `dir`.  The directory is created
    /// when missing.
    ///
    pub fn new(dir: &Path, name: &str) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(CachedFile {
            path: dir.join(name),
            stamp: dir.join(format!("{name}.stamp")),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn last_seen(&self) -> Option<String> {
        fs::read_to_string(&self.stamp).ok()
    }

    /// True when the cached copy is missing or the server advertises a
    /// different `Last-Modified` than the one we recorded.
    ///
    #[tracing::instrument(skip(client))]
    pub fn is_stale(&self, client: &Client, url: &str) -> Result<bool> {
        if !self.exists() {
            return Ok(true);
        }
        let resp = client.head(url).send()?;
        let remote = resp
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        debug!("remote stamp = {remote:?}");

        match (remote, self.last_seen()) {
            (Some(remote), Some(local)) => Ok(remote != local),
            // no usable header on either side, keep what we have
            (None, _) => Ok(false),
            (Some(_), None) => Ok(true),
        }
    }

    /// Fetch `url` into the cache slot unless the cached copy is still
    /// current, and return the local path.
    ///
    #[tracing::instrument(skip(client))]
    pub fn fetch(&self, client: &Client, url: &str) -> Result<&Path> {
        if !self.is_stale(client, url)? {
            trace!("cache hit for {url}");
            return Ok(self.path());
        }

        trace!("downloading {url}");
        let resp = client.get(url).send()?.error_for_status()?;
        let stamp = resp
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = resp.bytes()?;
        let body = inflate_if_gzip(&body)?;
        fs::write(&self.path, body)?;

        match stamp {
            Some(stamp) => fs::write(&self.stamp, stamp)?,
            None => {
                let _ = fs::remove_file(&self.stamp);
            }
        }
        Ok(self.path())
    }
}

/// Inflate gzip payloads, pass everything else through untouched.
///
fn inflate_if_gzip(body: &[u8]) -> Result<Vec<u8>> {
    if body.len() > 2 && body[..2] == GZ_MAGIC {
        let mut out = Vec::new();
        GzDecoder::new(body).read_to_end(&mut out)?;
        Ok(out)
    } else {
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use httpmock::prelude::*;
    use httpmock::Method::HEAD;

    use super::*;

    #[test]
    fn test_fetch_then_hit() -> Result<()> {
        let server = MockServer::start();
        let get = server.mock(|when, then| {
            when.method(GET).path("/data.grib");
            then.status(200)
                .header("Last-Modified", "Tue, 27 Aug 2024 10:00:00 GMT")
                .body("GRIB....7777");
        });
        let head = server.mock(|when, then| {
            when.method(HEAD).path("/data.grib");
            then.status(200)
                .header("Last-Modified", "Tue, 27 Aug 2024 10:00:00 GMT");
        });

        let dir = tempfile::tempdir()?;
        let slot = CachedFile::new(dir.path(), "data.grib")?;
        let client = Client::new();
        let url = server.url("/data.grib");

        slot.fetch(&client, &url)?;
        assert_eq!("GRIB....7777", fs::read_to_string(slot.path())?);

        // second fetch goes HEAD-only
        slot.fetch(&client, &url)?;
        get.assert_hits(1);
        head.assert_hits(1);
        Ok(())
    }

    #[test]
    fn test_fetch_refreshes_on_new_stamp() -> Result<()> {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(HEAD).path("/data.grib");
            then.status(200)
                .header("Last-Modified", "Wed, 28 Aug 2024 10:00:00 GMT");
        });
        let get = server.mock(|when, then| {
            when.method(GET).path("/data.grib");
            then.status(200)
                .header("Last-Modified", "Wed, 28 Aug 2024 10:00:00 GMT")
                .body("fresh");
        });

        let dir = tempfile::tempdir()?;
        let slot = CachedFile::new(dir.path(), "data.grib")?;
        fs::write(slot.path(), "stale")?;
        fs::write(dir.path().join("data.grib.stamp"), "Tue, 27 Aug 2024 10:00:00 GMT")?;

        let client = Client::new();
        slot.fetch(&client, &server.url("/data.grib"))?;
        assert_eq!("fresh", fs::read_to_string(slot.path())?);
        get.assert_hits(1);
        Ok(())
    }

    #[test]
    fn test_inflate_gzip() -> Result<()> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"hello tide")?;
        let gz = enc.finish()?;

        assert_eq!(b"hello tide".to_vec(), inflate_if_gzip(&gz)?);
        assert_eq!(b"plain".to_vec(), inflate_if_gzip(b"plain")?);
        Ok(())
    }
}
