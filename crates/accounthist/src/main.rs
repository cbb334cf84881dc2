use clap::Parser;

mod components;
mod options;
mod tracing;

use options::AccounthistCommand;

#[tokio::main]
async fn main() {
    let args = options::Opt::parse();

    if let Err(error) = crate::tracing::setup_tracing(args.verbose) {
        eprintln!("Unable to setup tracing: {error}");
        std::process::exit(1);
    }

    let home = args.home;
    let result = match args.commands {
        AccounthistCommand::Run(cmd) => components::run::handle_command(&home, *cmd).await,
        AccounthistCommand::Purge(cmd) => components::purge::handle_command(&home, cmd).await,
        AccounthistCommand::Account(cmd) => components::account::handle_command(&home, cmd).await,
        AccounthistCommand::Checkpoint(cmd) => {
            components::checkpoint::handle_command(&home, cmd).await
        }
    };

    if let Err(error) = result {
        ::tracing::error!("{error}");
        std::process::exit(1);
    }
}
