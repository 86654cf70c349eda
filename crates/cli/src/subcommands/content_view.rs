//! `hammer content-view`

use super::Subcommand;

/// Content views
pub struct ContentView;

impl Subcommand for ContentView {
    const COMMAND_BASE: &'static str = "content-view";
}
