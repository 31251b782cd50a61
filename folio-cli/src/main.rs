use anyhow::Result;
use clap::{Arg, ArgAction, Command};

mod cmd;
mod config;
mod logging;

fn cli() -> Command {
    // `folio` on its own builds with the same flags as `folio build`.
    cmd::build::add_build_args(Command::new("folio"))
        .about("Build the portfolio site into a folder of static files")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .global(true)
                .help("Only log errors")
                .action(ArgAction::SetTrue),
        )
        .subcommand(cmd::build::make_subcommand())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    logging::init_logging(matches.get_flag("quiet"));

    match matches.subcommand() {
        Some(("build", sub_matches)) => cmd::build::execute(sub_matches),
        _ => cmd::build::execute(&matches),
    }
}
