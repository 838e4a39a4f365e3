use clap::Parser;
use verup::cli::{Cli, Commands};
use verup::commands;

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            tool_name,
            old_version,
            new_version,
            input_dir,
            artifacts_dir,
            log_dir,
            tools_dir,
            comparator,
            csv_report,
            html_report,
            no_report,
        } => commands::run::execute(commands::run::RunOptions {
            tool_name,
            old_version,
            new_version,
            input_dir,
            artifacts_dir,
            log_dir,
            tools_dir,
            comparator,
            csv_report,
            html_report,
            no_report,
        }),
        Commands::List { tools_dir } => commands::list::execute(&tools_dir),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("エラー: {e:#}");
            std::process::exit(2);
        }
    }
}
