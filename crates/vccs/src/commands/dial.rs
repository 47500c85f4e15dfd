//! Offline dial-code resolution.

use serde::Serialize;
use vccs_core::{DialError, dial};

use crate::cli::{DialArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Resolved {
    position: String,
    trunk: String,
    code: String,
    target: String,
}

pub async fn handle(args: DialArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (facility, positions) = config::load_facility(global).await?;

    let callsign = args
        .from
        .or_else(|| positions.into_iter().next())
        .ok_or(DialError::NoSelection)?;
    let target = dial::resolve(&facility, &callsign, &args.trunk, &args.code)?;

    let resolved = Resolved {
        position: callsign,
        trunk: args.trunk,
        code: args.code,
        target,
    };
    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &resolved,
        |r| {
            format!(
                "{} {} {} -> {}",
                output::paint_ident(&r.position, color),
                r.trunk,
                r.code,
                output::paint_ident(&r.target, color)
            )
        },
        |r| r.target.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
