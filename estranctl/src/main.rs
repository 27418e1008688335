use std::io;

use clap::{crate_authors, crate_description, crate_version, CommandFactory, Parser};
use clap_complete::generate;
use eyre::Result;
use tracing::trace;

use estran_common::{close_logging, init_logging};
use estranctl::{
    ais, convert_angle, currents, gpx, grib, list, meteo, nmea, oceano, tides, wfs, write_output,
    Context, ListSubCommand, Opts, SubCommand,
};

/// Binary name, using a different binary name
pub const NAME: &str = env!("CARGO_BIN_NAME");
/// Binary version
pub const VERSION: &str = crate_version!();
/// Authors
pub const AUTHORS: &str = crate_authors!();

fn main() -> Result<()> {
    let opts = Opts::parse();

    // Initialise logging.
    //
    init_logging(NAME, opts.debug || opts.verbose > 1, None)?;

    // Banner
    //
    banner()?;

    // Shortcut
    //
    if opts.version {
        eprintln!("{}", estranctl::version());
        close_logging();
        return Ok(());
    }

    let res = handle_subcmd(&opts);

    // Flush traces before exiting.
    //
    close_logging();
    res
}

pub fn handle_subcmd(opts: &Opts) -> Result<()> {
    match &opts.subcmd {
        // Handle `convert-angle`
        //
        SubCommand::ConvertAngle(aopts) => {
            trace!("convert-angle");

            let text = convert_angle(aopts)?;
            write_output(&opts.output, &text)?;
        }

        // Handle `tides (table|nav|plot|calc)`
        //
        SubCommand::Tides(topts) => {
            trace!("tides");

            let text = tides::dispatch(opts, topts)?;
            write_output(&opts.output, &text)?;
        }

        // Handle `harbors [pattern]`
        //
        SubCommand::Harbors(fopts) => {
            trace!("harbors");

            let ctx = Context::load(&opts.config)?;
            let text = wfs::harbors(&ctx, fopts)?;
            write_output(&opts.output, &text)?;
        }

        // Handle `zones [pattern]`
        //
        SubCommand::Zones(fopts) => {
            trace!("zones");

            let ctx = Context::load(&opts.config)?;
            let text = wfs::zones(&ctx, fopts)?;
            write_output(&opts.output, &text)?;
        }

        // Handle `oceano spot`
        //
        SubCommand::Oceano(oopts) => {
            trace!("oceano");

            let ctx = Context::load(&opts.config)?;
            let text = oceano::oceano(&ctx, oopts)?;
            write_output(&opts.output, &text)?;
        }

        // Handle `meteo place`
        //
        SubCommand::Meteo(mopts) => {
            trace!("meteo");

            let ctx = Context::load(&opts.config)?;
            let text = meteo::meteo(&ctx, mopts)?;
            write_output(&opts.output, &text)?;
        }

        // Handle `grib (fetch|info)`
        //
        SubCommand::Grib(gopts) => {
            trace!("grib");

            let text = grib::dispatch(opts, gopts)?;
            write_output(&opts.output, &text)?;
        }

        // Handle `nmea (extract|stats|track)`
        //
        SubCommand::Nmea(nopts) => {
            trace!("nmea");

            let text = nmea::dispatch(nopts)?;
            write_output(&opts.output, &text)?;
        }

        // Handle `ais (decode|ships|track)`
        //
        SubCommand::Ais(aopts) => {
            trace!("ais");

            let text = ais::dispatch(aopts)?;
            write_output(&opts.output, &text)?;
        }

        // Handle `gpx merge`
        //
        SubCommand::Gpx(gopts) => {
            trace!("gpx");

            let text = gpx::dispatch(gopts)?;
            write_output(&opts.output, &text)?;
        }

        // Handle `currents (mesh|at)`
        //
        SubCommand::Currents(copts) => {
            trace!("currents");

            let text = currents::dispatch(copts)?;
            write_output(&opts.output, &text)?;
        }

        // Standalone completion generation
        //
        // NOTE: you can generate UNIX shells completion on Windows and vice-versa.  Not worth
        //       trying to limit depending on the OS.
        //
        SubCommand::Completion(copts) => {
            let generator = copts.shell;
            generate(generator, &mut Opts::command(), NAME, &mut io::stdout());
        }

        // Standalone `list` command
        //
        SubCommand::List(lopts) => match lopts.cmd {
            ListSubCommand::Formats => {
                trace!("list formats");

                eprintln!("{}", list::formats()?);
            }
            ListSubCommand::Sources => {
                trace!("list sources");

                let ctx = Context::load(&opts.config)?;
                eprintln!("{}", list::sources(&ctx)?);
            }
        },

        // Standalone `version` command
        //
        SubCommand::Version => {
            eprintln!("Modules: ");
            eprintln!("\t{}", estran_common::version());
            eprintln!("\t{}", estran_formats::version());
            eprintln!("\t{}", estran_sources::version());
            eprintln!("\t{}", estran_tides::version());
            eprintln!("\t{}", estran_currents::version());
        }
    }
    Ok(())
}

/// Display banner
///
fn banner() -> Result<()> {
    Ok(eprintln!(
        r##"
{}/{} by {}
{}
"##,
        NAME,
        VERSION,
        AUTHORS,
        crate_description!()
    ))
}
