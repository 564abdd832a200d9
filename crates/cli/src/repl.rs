use anyhow::{Context, Result};
use session::{Session, SessionEvent, SubmitAck};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::{AppConfig, OutputArgs, ReplArgs};
use crate::run::{export, print_graph};

const HELP: &str = "Type or paste text; lines are appended to the buffer.
Commands: :submit  :show  :text  :clear  :export  :stats  :help  :quit";

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub async fn repl(config: &AppConfig, args: ReplArgs) -> Result<()> {
    let mut session = crate::start_session(config, &args.output)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Warming up the extraction service...");
    println!("{}", HELP);

    loop {
        tokio::select! {
            Some(event) = session.next_event(), if session.is_busy() => {
                report(&session, &event);
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    // Piped input: let the last submission finish
                    if let Some(event) = session.wait_ready().await {
                        report(&session, &event);
                    }
                    break;
                };
                if handle_line(&mut session, &line, &args.output) == Flow::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn report(session: &Session, event: &SessionEvent) {
    match event {
        SessionEvent::WarmedUp => println!("Ready for input."),
        SessionEvent::Ready { .. } => print_graph(session),
        SessionEvent::Failed(e) => println!("Error: {}", e.user_message()),
    }
}

fn handle_line(session: &mut Session, line: &str, output: &OutputArgs) -> Flow {
    match line.trim() {
        ":quit" | ":q" => return Flow::Quit,
        ":help" => println!("{}", HELP),
        ":submit" | ":s" => match session.submit() {
            Ok(SubmitAck::Accepted(params)) => println!(
                "Extracting (beams {}, length penalty {:.2}, sequences {})...",
                params.beam_count, params.length_penalty, params.sequence_count
            ),
            Ok(SubmitAck::Ignored) => println!("busy"),
            Err(e) => println!("{}", e.user_message()),
        },
        ":show" => print_graph(session),
        ":text" => println!("{}", session.text()),
        ":clear" => {
            session.set_text("");
            println!("Text cleared.");
        }
        ":export" => {
            let dir = output.export.as_deref().unwrap_or(Path::new("."));
            export(session, dir);
        }
        ":stats" => match serde_json::to_string_pretty(&session.metrics()) {
            Ok(json) => println!("{}", json),
            Err(e) => println!("Failed to format stats: {}", e),
        },
        command if command.starts_with(':') => println!("Unknown command: {}", command),
        _ => session.set_text(append_line(session.text(), line)),
    }
    Flow::Continue
}

fn append_line(text: &str, line: &str) -> String {
    if text.is_empty() {
        line.to_string()
    } else {
        format!("{}\n{}", text, line)
    }
}
