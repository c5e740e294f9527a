use clap::Parser;
use ragchat::cli::{
    bench, chat, documents, handle_completions, handle_config_init, handle_config_show, prepare,
    stats, Cli, Commands, ConfigCommands,
};

fn print(output: String) {
    println!("{}", output);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Chat(args) => match prepare(&args.connection) {
            Ok(ctx) => chat::run_chat(&args, ctx).await,
            Err(e) => Err(e),
        },
        Commands::Ask(args) => match prepare(&args.connection) {
            Ok(ctx) => chat::run_ask(&args, ctx).await,
            Err(e) => Err(e),
        },
        Commands::Ingest(args) => match prepare(&args.connection) {
            Ok(ctx) => documents::handle_ingest(&args, &ctx.client).await.map(print),
            Err(e) => Err(e),
        },
        Commands::Delete(args) => match prepare(&args.connection) {
            Ok(ctx) => documents::handle_delete(&args, &ctx.client).await.map(print),
            Err(e) => Err(e),
        },
        Commands::Documents(args) => match prepare(&args.connection) {
            Ok(ctx) => documents::handle_documents(&args, &ctx.client)
                .await
                .map(print),
            Err(e) => Err(e),
        },
        Commands::Stats(args) => match prepare(&args.connection) {
            Ok(ctx) => stats::handle_stats(&args, &ctx.client).await.map(print),
            Err(e) => Err(e),
        },
        Commands::Watch(args) => match prepare(&args.connection) {
            Ok(ctx) => stats::run_watch(&args, ctx).await,
            Err(e) => Err(e),
        },
        Commands::Bench(args) => match prepare(&args.connection) {
            Ok(ctx) => bench::run_bench(&args, ctx).await,
            Err(e) => Err(e),
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
            ConfigCommands::Show(args) => handle_config_show(&args).map(print),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
