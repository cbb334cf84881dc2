use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::components::account::commands::AccountCommand;
use crate::components::checkpoint::commands::CheckpointCommand;
use crate::components::purge::Purge;
use crate::components::run::Run;

#[derive(Parser, Debug)]
#[clap(name = "accounthist", about = "Account history CLI")]
pub(crate) struct Opt {
    /// Defines the verbosity level
    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true
    )]
    pub(crate) verbose: u8,

    /// Home directory for the configuration
    #[arg(
        long,
        env = "ACCOUNTHIST_HOME",
        default_value = get_default_home(),
        global = true
    )]
    pub(crate) home: PathBuf,

    #[command(subcommand)]
    pub(crate) commands: AccounthistCommand,
}

/// If no path is given for the --home argument, we use the default one
/// ~/.config/accounthist for a UNIX subsystem
fn get_default_home() -> OsString {
    let mut home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.push(".config");
    home.push("accounthist");
    home.into_os_string()
}

#[derive(Subcommand, Debug)]
pub(crate) enum AccounthistCommand {
    Run(Box<Run>),
    Purge(Purge),
    Account(AccountCommand),
    Checkpoint(CheckpointCommand),
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Opt::command().debug_assert();
    }

    #[test]
    fn top_level_commands() {
        for name in ["run", "purge", "account", "checkpoint"] {
            assert!(AccounthistCommand::has_subcommand(name), "{name}");
        }
    }

    #[test]
    fn verbosity_is_counted() {
        let opt = Opt::try_parse_from(["accounthist", "-vvv", "checkpoint", "read"]).unwrap();

        assert_eq!(opt.verbose, 3);
    }
}
