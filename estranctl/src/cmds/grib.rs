//! The `grib` command group.
//!

use std::fs;

use eyre::{eyre, Result};
use tracing::info;

use estran_formats::GribInfo;
use estran_sources::{MeteoConsult, MfGrib, Model};

use crate::cmds::site;
use crate::{Context, GribFetchOpts, GribInfoOpts, GribOpts, GribSubCommand, Opts};

pub fn dispatch(opts: &Opts, gopts: &GribOpts) -> Result<String> {
    match &gopts.subcmd {
        GribSubCommand::Fetch(fopts) => {
            let ctx = Context::load(&opts.config)?;
            fetch(&ctx, fopts)
        }
        GribSubCommand::Info(iopts) => info_cmd(iopts),
    }
}

/// Download into the cache, answering with the local path.
///
fn fetch(ctx: &Context, opts: &GribFetchOpts) -> Result<String> {
    if let Some(zone) = &opts.mc {
        let mc = MeteoConsult::new(site(ctx, "meteoconsult")?, &ctx.cache);
        let fname = mc.fetch(zone, opts.currents)?;
        return Ok(fname.display().to_string());
    }

    let model = match (opts.arome, opts.arpege) {
        (true, false) => Model::Arome,
        (false, true) => Model::Arpege,
        _ => return Err(eyre!("one of --arome, --arpege or --mc ZONE is required")),
    };

    let mf = MfGrib::new(site(ctx, "mfgrib")?)?;
    let req = mf.request(model, opts.hd, &opts.package, opts.time, None)?;
    info!("fetching {}", req.filename);
    let fname = mf.fetch(&req, &ctx.cache)?;
    Ok(fname.display().to_string())
}

/// Identification scan of a local file.
///
fn info_cmd(opts: &GribInfoOpts) -> Result<String> {
    let data = fs::read(&opts.file)?;
    let scan = GribInfo::scan(&data)?;
    Ok(scan.list())
}
