//! `hammer organization`

use super::Subcommand;

/// Organizations
pub struct Org;

impl Subcommand for Org {
    const COMMAND_BASE: &'static str = "organization";
}
