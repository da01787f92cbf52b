use clap::Parser;
use convsim::{Cli, Command, commands, init_logging};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_file.as_deref())?;

    match &cli.command {
        Command::Run(args) => {
            commands::run(args)?;
        }
        Command::Analyze(args) => commands::analyze(args)?,
    }

    tracing::debug!("convsim finished");
    Ok(())
}
