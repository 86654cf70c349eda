//! `hammer user`

use super::Subcommand;

/// Local and external user accounts
pub struct User;

impl Subcommand for User {
    const COMMAND_BASE: &'static str = "user";
}
