//! Chat and ask command handlers

use crate::api::types::DeleteRequest;
use crate::cli::output::{
    format_delete, format_documents_table, format_ingest, format_json, format_metrics_summary,
    format_retrieved_documents, format_stats_table, format_status, format_timings,
};
use crate::cli::{AskArgs, ChatArgs, Context};
use crate::logging::preview_limit;
use crate::metrics::RollingMetrics;
use crate::session::{ChatError, ChatSession};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  /help                 Show this help
  /stream on|off        Toggle streaming answers
  /docs                 Documents retrieved for the last answer
  /timings              Latency breakdown of the last answer
  /metrics              p50/p95 over recent streamed answers
  /stats                Backend timing statistics
  /documents            List ingested documents
  /ingest <file>...     Upload files
  /delete <key>...      Delete documents by key (/delete --all for everything)
  /session              Show the current session id
  /reset                Start a new conversation
  /quit                 Exit";

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Ask(String),
    Help,
    Stream(Option<bool>),
    Docs,
    Timings,
    Metrics,
    Stats,
    Documents,
    Ingest(Vec<PathBuf>),
    Delete(DeleteRequest),
    Session,
    Reset,
    Quit,
    Empty,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return ReplCommand::Ask(line.to_string());
        };

        let mut parts = rest.split_whitespace();
        let command = parts.next().unwrap_or("");
        let args: Vec<&str> = parts.collect();

        match command {
            "help" | "?" => ReplCommand::Help,
            "stream" => ReplCommand::Stream(match args.first().copied() {
                Some("on") => Some(true),
                Some("off") => Some(false),
                _ => None,
            }),
            "docs" => ReplCommand::Docs,
            "timings" => ReplCommand::Timings,
            "metrics" => ReplCommand::Metrics,
            "stats" => ReplCommand::Stats,
            "documents" => ReplCommand::Documents,
            "ingest" => ReplCommand::Ingest(args.iter().map(PathBuf::from).collect()),
            "delete" if args == ["--all"] => ReplCommand::Delete(DeleteRequest::all()),
            "delete" => ReplCommand::Delete(DeleteRequest::keys(
                args.iter().map(|s| s.to_string()).collect(),
            )),
            "session" => ReplCommand::Session,
            "reset" => ReplCommand::Reset,
            "quit" | "exit" | "q" => ReplCommand::Quit,
            other => ReplCommand::Unknown(other.to_string()),
        }
    }
}

fn print_token(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}

/// Ask one question and print the answer (streamed when enabled).
async fn answer(session: &mut ChatSession, query: &str, stream: bool) -> Result<(), ChatError> {
    if !stream {
        let text = session.ask(query).await?;
        println!("{}", text);
        return Ok(());
    }

    let completion = session.ask_streaming(query, print_token).await?;
    if completion.answer.is_empty() && completion.is_success() {
        print!("No answer.");
    }
    println!();
    Ok(())
}

/// Handle `ragchat chat`: read queries from stdin until EOF or `/quit`.
pub async fn run_chat(args: &ChatArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Arc::new(RollingMetrics::with_capacity(ctx.config.metrics.window));
    let mut session = ChatSession::new(ctx.client, metrics)
        .with_max_tokens(args.max_tokens.or(ctx.config.backend.max_tokens))
        .with_content_preview(preview_limit(&ctx.config.logging))
        .with_session_id(args.session.clone());
    let mut stream = ctx.config.backend.stream && !args.no_stream;

    println!(
        "Connected to {} ({}). Type /help for commands.",
        session.client().base_url().cyan(),
        if stream { "streaming" } else { "non-streaming" }
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".bold());
        let _ = std::io::stdout().flush();

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => break,
            ReplCommand::Ask(query) => {
                if answer(&mut session, &query, stream).await.is_err() {
                    println!();
                }
                println!("{}", format_status(session.status()));
            }
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Stream(Some(on)) => {
                stream = on;
                println!("Streaming {}", if on { "on" } else { "off" });
            }
            ReplCommand::Stream(None) => {
                println!("Streaming is {}", if stream { "on" } else { "off" })
            }
            ReplCommand::Docs => {
                println!("{}", format_retrieved_documents(session.last_documents()))
            }
            ReplCommand::Timings => match session.last_timings() {
                Some(timings) => println!("{}", format_timings(timings)),
                None => println!("No answer yet."),
            },
            ReplCommand::Metrics => {
                println!("{}", format_metrics_summary(&session.metrics().summary()))
            }
            ReplCommand::Stats => match session.client().stats().await {
                Ok(stats) => println!("{}", format_stats_table(&stats)),
                Err(e) => println!("{}", format!("Stats failed: {}", e).red()),
            },
            ReplCommand::Documents => match session.refresh_documents().await {
                Ok(()) => {
                    let items: Vec<_> = session
                        .documents()
                        .entries()
                        .map(|(key, count)| crate::api::types::DocumentItem {
                            key: key.to_string(),
                            count,
                        })
                        .collect();
                    println!("{}", format_documents_table(&items));
                }
                Err(e) => println!("{}", format!("Listing failed: {}", e).red()),
            },
            ReplCommand::Ingest(paths) => {
                if let Ok(response) = session.ingest(&paths).await {
                    println!("{}", format_ingest(&response));
                }
                println!("{}", format_status(session.status()));
            }
            ReplCommand::Delete(request) if request.is_empty() => {
                println!("Usage: /delete <key>... or /delete --all")
            }
            ReplCommand::Delete(request) => {
                if let Ok(response) = session.delete(&request).await {
                    println!("{}", format_delete(&response));
                } else {
                    println!("{}", format_status(session.status()));
                }
            }
            ReplCommand::Session => {
                println!("Session: {}", session.session_id().unwrap_or("new"))
            }
            ReplCommand::Reset => {
                session.reset();
                println!("Started a new conversation");
            }
            ReplCommand::Unknown(command) => {
                println!("Unknown command /{}; type /help", command)
            }
        }
    }

    Ok(())
}

/// Handle `ragchat ask`
pub async fn run_ask(args: &AskArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Arc::new(RollingMetrics::with_capacity(ctx.config.metrics.window));
    let mut session = ChatSession::new(ctx.client, metrics)
        .with_max_tokens(args.max_tokens.or(ctx.config.backend.max_tokens))
        .with_content_preview(preview_limit(&ctx.config.logging))
        .with_session_id(args.session.clone());
    let stream = ctx.config.backend.stream && !args.no_stream;

    if args.json {
        if stream {
            let completion = session.ask_streaming(&args.query, |_| {}).await?;
            println!("{}", format_json(&completion)?);
        } else {
            let text = session.ask(&args.query).await?;
            println!(
                "{}",
                format_json(&serde_json::json!({
                    "answer": text,
                    "session_id": session.session_id(),
                    "documents": session.last_documents(),
                    "timings": session.last_timings(),
                }))?
            );
        }
        return Ok(());
    }

    answer(&mut session, &args.query, stream).await?;
    if session.status() != "Ready" {
        return Err(session.status().to_string().into());
    }

    if let Some(timings) = session.last_timings() {
        eprintln!("{}", format_timings(timings).dimmed());
    }
    if let Some(id) = session.session_id() {
        eprintln!("{}", format!("Session: {}", id).dimmed());
    }
    if args.show_documents {
        println!("{}", format_retrieved_documents(session.last_documents()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_query() {
        assert_eq!(
            ReplCommand::parse("  what is ray?  "),
            ReplCommand::Ask("what is ray?".to_string())
        );
        assert_eq!(ReplCommand::parse("   "), ReplCommand::Empty);
    }

    #[test]
    fn test_parse_slash_commands() {
        assert_eq!(ReplCommand::parse("/quit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/stream off"), ReplCommand::Stream(Some(false)));
        assert_eq!(ReplCommand::parse("/stream"), ReplCommand::Stream(None));
        assert_eq!(
            ReplCommand::parse("/ingest a.pdf b.txt"),
            ReplCommand::Ingest(vec![PathBuf::from("a.pdf"), PathBuf::from("b.txt")])
        );
        assert_eq!(
            ReplCommand::parse("/frobnicate"),
            ReplCommand::Unknown("frobnicate".to_string())
        );
    }

    #[test]
    fn test_parse_delete() {
        assert_eq!(
            ReplCommand::parse("/delete --all"),
            ReplCommand::Delete(DeleteRequest::all())
        );
        assert_eq!(
            ReplCommand::parse("/delete guide.pdf"),
            ReplCommand::Delete(DeleteRequest::keys(vec!["guide.pdf".to_string()]))
        );
        match ReplCommand::parse("/delete") {
            ReplCommand::Delete(request) => assert!(request.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }
}
