// ── Dial code resolution ──
//
// Turns an operator-entered two-digit code into a backend target by
// looking it up in the nearest dial-code table that covers the dialing
// position: the position's own table first, then its owning facility
// and each ancestor up to the root.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::{DialCodeTable, Facility};

/// Why a dial code did not resolve.
///
/// The variants stay distinct for logs and the CLI; published console
/// state collapses all of them into `DialStatus::Error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialError {
    #[error("No position selected")]
    NoSelection,

    #[error("Position {callsign} is not in the facility document")]
    UnknownPosition { callsign: String },

    #[error("No dial-code table covers trunk {trunk} for {callsign}")]
    NoTable { callsign: String, trunk: String },

    #[error("Trunk {trunk} has no code {code}")]
    NoCode { trunk: String, code: String },

    #[error("Code {code} on trunk {trunk} has an empty target")]
    NoTarget { trunk: String, code: String },
}

/// Resolve `code` on `trunk` for the position `callsign`.
pub fn resolve(root: &Facility, callsign: &str, trunk: &str, code: &str) -> Result<String, DialError> {
    let (chain, position) = root
        .owner_chain(callsign)
        .ok_or_else(|| DialError::UnknownPosition {
            callsign: callsign.to_owned(),
        })?;

    // nearest first: the position, then owner → root
    let tables = std::iter::once(position.dial_codes.as_ref())
        .chain(chain.iter().rev().map(|facility| facility.dial_codes.as_ref()))
        .flatten();

    let codes = find_trunk(tables, trunk).ok_or_else(|| DialError::NoTable {
        callsign: callsign.to_owned(),
        trunk: trunk.to_owned(),
    })?;

    let target = codes.get(code.trim()).ok_or_else(|| DialError::NoCode {
        trunk: trunk.to_owned(),
        code: code.to_owned(),
    })?;

    if target.trim().is_empty() {
        return Err(DialError::NoTarget {
            trunk: trunk.to_owned(),
            code: code.to_owned(),
        });
    }
    Ok(target.clone())
}

fn find_trunk<'a>(
    mut tables: impl Iterator<Item = &'a DialCodeTable>,
    trunk: &str,
) -> Option<&'a BTreeMap<String, String>> {
    tables.find_map(|table| table.get(trunk))
}
