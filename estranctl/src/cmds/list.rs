//! The `list` command.
//!

use eyre::Result;

use estran_formats::Format;

use crate::Context;

pub fn formats() -> Result<String> {
    Format::list()
}

pub fn sources(ctx: &Context) -> Result<String> {
    ctx.sources.list()
}
