use clap::Parser;
use tennis_notes::cli::{
    handle_add, handle_delete, handle_edit, handle_list, handle_move, handle_serve, handle_shots,
    Cli, Commands,
};
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let global = cli.global;
    let result = match cli.command {
        Commands::Shots { json } => handle_shots(json),
        Commands::List {
            shot,
            shot_type,
            json,
        } => handle_list(&global, shot, shot_type, json),
        Commands::Add {
            text,
            shot,
            shot_type,
            json,
        } => handle_add(&global, text, shot, shot_type, json),
        Commands::Move { id, to, json } => handle_move(&global, id, to, json),
        Commands::Edit { id, text, json } => handle_edit(&global, id, text, json),
        Commands::Delete { id } => handle_delete(&global, id),
        Commands::Serve { port } => handle_serve(&global, port),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
