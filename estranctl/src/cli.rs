//! Module describing all possible commands and sub-commands to the `estranctl` main driver.
//!
//! The commands split in three groups:
//!
//! - online lookups (`tides`, `harbors`, `zones`, `oceano`, `meteo`, `grib fetch`)
//!   which go through the clients of the `sources` crate,
//! - offline processing (`nmea`, `ais`, `gpx`, `grib info`, `currents`,
//!   `convert-angle`, `tides calc`) which only touch local files,
//! - housekeeping (`list`, `completion`, `version`).
//!
//! `completion` is here just to configure the various shells completion system.
//!

use std::path::PathBuf;

use clap::{
    crate_authors, crate_description, crate_name, crate_version, Parser, ValueEnum,
};
use clap_complete::shells::Shell;

/// CLI options
#[derive(Parser)]
#[command(disable_version_flag = true)]
#[clap(name = crate_name!(), about = crate_description!())]
#[clap(version = crate_version!(), author = crate_authors!())]
pub struct Opts {
    /// configuration file.
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// debug mode.
    #[clap(short = 'D', long = "debug")]
    pub debug: bool,
    /// Output file.
    #[clap(short = 'o', long)]
    pub output: Option<PathBuf>,
    /// Verbose mode.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Display utility full version.
    #[clap(short = 'V', long)]
    pub version: bool,
    /// Sub-commands (see below).
    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

// ------

/// All sub-commands:
///
/// `ais (decode|ships|track) OPTS`
/// `completion SHELL`
/// `convert-angle ANGLE`
/// `currents (mesh|at) OPTS`
/// `gpx merge FILE...`
/// `grib (fetch|info) OPTS`
/// `harbors [PATTERN]`
/// `list (formats|sources)`
/// `meteo HARBOR`
/// `nmea (extract|stats|track) OPTS`
/// `oceano SPOT`
/// `tides (table|nav|plot|calc) OPTS`
/// `zones [PATTERN]`
///
#[derive(Debug, Parser)]
pub enum SubCommand {
    /// Decode and filter AIS capture logs
    Ais(AisOpts),
    /// Generate Completion stuff
    Completion(ComplOpts),
    /// Convert angles between decimal and sexagesimal
    ConvertAngle(AngleOpts),
    /// Tidal current atlas interpolation
    Currents(CurrentsOpts),
    /// Merge and convert GPS tracks
    Gpx(GpxOpts),
    /// Download and identify GRIB files
    Grib(GribOpts),
    /// List tide harbors
    Harbors(FindOpts),
    /// List information about formats and sources
    List(ListOpts),
    /// Marine weather forecast for a place
    Meteo(MeteoOpts),
    /// Process NMEA-0183 capture logs
    Nmea(NmeaOpts),
    /// SHOM oceanogramme for a spot
    Oceano(OceanoOpts),
    /// Tide tables, plots and computations
    Tides(TidesOpts),
    /// Display utility full version
    Version,
    /// List tide zones
    Zones(FindOpts),
}

// ------

/// Options for `convert-angle`.
///
#[derive(Debug, Parser)]
pub struct AngleOpts {
    /// Render as degrees, minutes & seconds.
    #[clap(long)]
    pub dms: bool,
    /// Render as degrees & decimal minutes.
    #[clap(long)]
    pub dm: bool,
    /// The angle is a longitude (E/W instead of N/S).
    #[clap(long)]
    pub lon: bool,
    /// Angle, decimal degrees or `DD°MM'SS"H`.
    pub angle: String,
}

// ------

/// This contains only the `tides` sub-commands.
///
#[derive(Debug, Parser)]
pub struct TidesOpts {
    #[clap(subcommand)]
    pub subcmd: TidesSubCommand,
}

#[derive(Debug, Parser)]
pub enum TidesSubCommand {
    /// Twelfths-rule height/time computations
    Calc(TideCalcOpts),
    /// Nav document, one strip per harbor
    Nav(TideNavOpts),
    /// Water level curve for one harbor
    Plot(TidePlotOpts),
    /// Day strip for one harbor
    Table(TideTableOpts),
}

#[derive(Debug, Parser)]
pub struct TideTableOpts {
    /// First day (YYYY-MM-DD, default today).
    #[clap(short = 'd', long)]
    pub date: Option<String>,
    /// Number of days.
    #[clap(short = 'n', long, default_value = "2")]
    pub days: i64,
    /// Harbor name, fuzzy matched.
    pub harbor: String,
}

#[derive(Debug, Parser)]
pub struct TideNavOpts {
    /// First day (YYYY-MM-DD, default today).
    #[clap(short = 'd', long)]
    pub date: Option<String>,
    /// Number of days per strip.
    #[clap(short = 'n', long, default_value = "2")]
    pub days: i64,
    /// Harbors, one strip each.
    #[clap(required = true)]
    pub harbors: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct TidePlotOpts {
    /// First day (YYYY-MM-DD, default today).
    #[clap(short = 'd', long)]
    pub date: Option<String>,
    /// Number of days.
    #[clap(short = 'n', long, default_value = "1")]
    pub days: i64,
    /// Harbor name, fuzzy matched.
    pub harbor: String,
}

#[derive(Debug, Parser)]
pub struct TideCalcOpts {
    /// First reference, `HHhMM,HEIGHT`.
    #[clap(long)]
    pub first: String,
    /// Second reference, `HHhMM,HEIGHT`.
    #[clap(long)]
    pub second: String,
    /// References are in standard time, queries in DST.
    #[clap(long)]
    pub summer: bool,
    /// Queries, a time (`HHhMM`) or a height in metres.
    #[clap(required = true)]
    pub queries: Vec<String>,
}

// ------

/// Options for `harbors` and `zones`.
///
#[derive(Debug, Parser)]
pub struct FindOpts {
    /// Name pattern, exact, glob (`*`) or fuzzy.  All when absent.
    pub pattern: Option<String>,
}

// ------

/// Options for `oceano`.
///
#[derive(Debug, Parser)]
pub struct OceanoOpts {
    /// Save the image rendering instead of printing the page URL.
    #[clap(long)]
    pub image: bool,
    /// Save the text rendering.
    #[clap(long, conflicts_with = "image")]
    pub text: bool,
    /// Point at the spot coordinates rather than its identifier.
    #[clap(long)]
    pub latlon: bool,
    /// Request every physics overlay.
    #[clap(long)]
    pub all: bool,
    /// Spot name, fuzzy matched against the spots layer.
    pub spot: String,
}

// ------

/// Options for `meteo`.
///
#[derive(Debug, Parser)]
pub struct MeteoOpts {
    /// Harbor or city name, geocoded first.
    pub place: String,
}

// ------

/// This contains only the `grib` sub-commands.
///
#[derive(Debug, Parser)]
pub struct GribOpts {
    #[clap(subcommand)]
    pub subcmd: GribSubCommand,
}

#[derive(Debug, Parser)]
pub enum GribSubCommand {
    /// Download a GRIB file from Météo-France or MeteoConsult
    Fetch(GribFetchOpts),
    /// Scan a local file for GRIB messages
    Info(GribInfoOpts),
}

#[derive(Debug, Parser)]
pub struct GribFetchOpts {
    /// AROME model.
    #[clap(long)]
    pub arome: bool,
    /// ARPEGE model.
    #[clap(long, conflicts_with = "arome")]
    pub arpege: bool,
    /// MeteoConsult zone instead of a Météo-France model.
    #[clap(long, conflicts_with_all = ["arome", "arpege"])]
    pub mc: Option<String>,
    /// High definition grid.
    #[clap(long)]
    pub hd: bool,
    /// Forecast start hour, resolved to the matching range.
    #[clap(short = 't', long, default_value = "0")]
    pub time: u32,
    /// Package name (SP1, HP1, ...).
    #[clap(short = 'p', long, default_value = "SP1")]
    pub package: String,
    /// Current file rather than wind (MeteoConsult only).
    #[clap(long)]
    pub currents: bool,
}

#[derive(Debug, Parser)]
pub struct GribInfoOpts {
    /// Local GRIB file.
    pub file: PathBuf,
}

// ------

/// This contains only the `nmea` sub-commands.
///
#[derive(Debug, Parser)]
pub struct NmeaOpts {
    #[clap(subcommand)]
    pub subcmd: NmeaSubCommand,
}

#[derive(Debug, Parser)]
pub enum NmeaSubCommand {
    /// Print the sentences of one tag
    Extract(NmeaExtractOpts),
    /// Per-tag tally of a capture log
    Stats(NmeaStatsOpts),
    /// Turn position sentences into a track
    Track(NmeaTrackOpts),
}

#[derive(Debug, Parser)]
pub struct NmeaExtractOpts {
    /// Sentence tag (GLL, RMC, ...).
    #[clap(short = 's', long)]
    pub tag: String,
    /// Capture log.
    pub file: PathBuf,
}

#[derive(Debug, Parser)]
pub struct NmeaStatsOpts {
    /// Capture log.
    pub file: PathBuf,
}

#[derive(Debug, Parser)]
pub struct NmeaTrackOpts {
    /// Output basename (default: the input stem).
    #[clap(short = 'o', long)]
    pub output: Option<String>,
    /// Write GPX instead of KML.
    #[clap(long)]
    pub gpx: bool,
    /// Capture log.
    pub file: PathBuf,
}

// ------

/// This contains only the `ais` sub-commands.
///
#[derive(Debug, Parser)]
pub struct AisOpts {
    #[clap(subcommand)]
    pub subcmd: AisSubCommand,
}

#[derive(Debug, Parser)]
pub enum AisSubCommand {
    /// Decode every message of a capture log
    Decode(AisDecodeOpts),
    /// Ships seen in a capture log
    Ships(AisShipsOpts),
    /// Track of one ship as GPX
    Track(AisTrackOpts),
}

#[derive(Debug, Parser)]
pub struct AisDecodeOpts {
    /// Only this ship.
    #[clap(long)]
    pub mmsi: Option<u32>,
    /// One JSON object per message.
    #[clap(long)]
    pub json: bool,
    /// Capture log.
    pub file: PathBuf,
}

#[derive(Debug, Parser)]
pub struct AisShipsOpts {
    /// Include ships without static data.
    #[clap(short = 'a', long)]
    pub all: bool,
    /// Capture log.
    pub file: PathBuf,
}

#[derive(Debug, Parser)]
pub struct AisTrackOpts {
    /// The ship to follow.
    #[clap(long)]
    pub mmsi: u32,
    /// Output basename (default: the MMSI).
    #[clap(short = 'o', long)]
    pub output: Option<String>,
    /// Capture log.
    pub file: PathBuf,
}

// ------

/// This contains only the `gpx` sub-commands.
///
#[derive(Debug, Parser)]
pub struct GpxOpts {
    #[clap(subcommand)]
    pub subcmd: GpxSubCommand,
}

#[derive(Debug, Parser)]
pub enum GpxSubCommand {
    /// Merge tracks into one file
    Merge(GpxMergeOpts),
}

#[derive(Debug, Parser)]
pub struct GpxMergeOpts {
    /// Output basename.
    #[clap(short = 'o', long, default_value = "merged")]
    pub output: String,
    /// Write KML.
    #[clap(long)]
    pub kml: bool,
    /// Write GPX.
    #[clap(long, conflicts_with = "kml")]
    pub gpx: bool,
    /// Drop points closer than this distance in metres.
    #[clap(short = 'r', long, default_value = "1.0")]
    pub reduce: f64,
    /// Nautical units in the info lines (NM, knots).
    #[clap(short = 'n', long)]
    pub nautic: bool,
    /// Use 3D distances (elevation included).
    #[clap(short = 'e', long)]
    pub elevation: bool,
    /// Input GPX files.
    #[clap(required = true)]
    pub files: Vec<PathBuf>,
}

// ------

/// This contains only the `currents` sub-commands.
///
#[derive(Debug, Parser)]
pub struct CurrentsOpts {
    #[clap(subcommand)]
    pub subcmd: CurrentsSubCommand,
}

#[derive(Debug, Parser)]
pub enum CurrentsSubCommand {
    /// Current at a point by barycentric interpolation
    At(CurrentsAtOpts),
    /// Build the triangulated mesh and report on it
    Mesh(CurrentsMeshOpts),
}

#[derive(Debug, Parser)]
pub struct CurrentsMeshOpts {
    /// Coastline GeoJSON for the land mask.
    #[clap(long)]
    pub coast: PathBuf,
    /// Restrict to `MINLON,MINLAT,MAXLON,MAXLAT`.
    #[clap(long)]
    pub bbox: Option<String>,
    /// Current atlas file.
    pub atlas: PathBuf,
}

#[derive(Debug, Parser)]
pub struct CurrentsAtOpts {
    /// Coastline GeoJSON for the land mask.
    #[clap(long)]
    pub coast: PathBuf,
    /// Point longitude.
    #[clap(long)]
    pub lon: f64,
    /// Point latitude.
    #[clap(long)]
    pub lat: f64,
    /// Tide coefficient.
    #[clap(long, default_value = "95")]
    pub coeff: f64,
    /// Tidal hour, -6 to +6 around high water.
    #[clap(long, default_value = "0", allow_hyphen_values = true)]
    pub hour: i32,
    /// Current atlas file.
    pub atlas: PathBuf,
}

// ------

/// Options to generate completion files at runtime
///
#[derive(Debug, Parser)]
pub struct ComplOpts {
    #[clap(value_parser)]
    pub shell: Shell,
}

// ------

/// Options for `list`.
///
#[derive(Debug, Parser)]
pub struct ListOpts {
    /// What to list.
    #[clap(value_parser)]
    pub cmd: ListSubCommand,
}

/// All  `list` sub-commands:
///
/// `list formats`
/// `list sources`
///
#[derive(Clone, Debug, PartialEq, ValueEnum)]
pub enum ListSubCommand {
    /// List all supported file formats
    Formats,
    /// List all configured data sources
    Sources,
}
