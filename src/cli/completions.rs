//! Completions command implementation

use crate::cli::{Cli, CompletionsArgs};
use clap::CommandFactory;
use clap_complete::generate;
use std::io;

/// Write the completion script for `shell` into `out`.
pub fn write_completions(shell: clap_complete::Shell, out: &mut dyn io::Write) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, out);
}

/// Handle `ragchat completions` command
pub fn handle_completions(args: &CompletionsArgs) {
    write_completions(args.shell, &mut io::stdout());
}
