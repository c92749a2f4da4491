use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use crate::core::AppConfig;
use crate::llm::{
    KeyConfiguration, Message, Role, StreamOutcome, consume_stream, request_completion,
};

/// Terminal chat session. Tokens are printed as they stream in and
/// Ctrl-C sets the cancellation flag so the current response stops at
/// the next read without killing the session.
pub async fn run() -> Result<()> {
    let mut rl = DefaultEditor::new().expect("Editor failed");

    let config = AppConfig::default();
    let key_config = KeyConfiguration::from_config(&config)?;
    key_config.validate()?;

    let mut history = vec![Message::new(Role::System, &config.system_message)];

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                history.push(Message::new(Role::User, line.as_str()));

                let response = match request_completion(&key_config, &history).await {
                    Ok(response) => response,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        continue;
                    }
                };

                let stop = Arc::new(AtomicBool::new(false));
                let stop_on_interrupt = stop.clone();
                let interrupt_watcher = tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        stop_on_interrupt.store(true, Ordering::Relaxed);
                    }
                });

                let (tx, mut rx) = mpsc::unbounded_channel::<String>();
                let printer = tokio::spawn(async move {
                    while let Some(chunk) = rx.recv().await {
                        print!("{}", chunk);
                        let _ = std::io::stdout().flush();
                    }
                });

                let outcome = consume_stream(response, Some(&tx), &stop).await;
                drop(tx);
                let _ = printer.await;
                interrupt_watcher.abort();

                match outcome {
                    Ok(StreamOutcome::Completed(text)) => {
                        println!();
                        history.push(Message::new(Role::Assistant, &text));
                    }
                    Ok(StreamOutcome::Cancelled) => {
                        println!("\n(cancelled)");
                    }
                    Err(e) => {
                        eprintln!("\nError: {}", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                continue;
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
