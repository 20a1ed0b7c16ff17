// Interactive console loop (fully buffered answers)

use crate::rag::RagEngine;
use crate::types::AppResult;
use std::io::{BufRead, Write};
use std::time::Instant;

const SOURCES_SHOWN: usize = 3;

/// Reads questions from stdin until `exit`/`quit` or EOF. Errors are printed
/// and the loop continues.
pub async fn run(engine: &RagEngine) -> AppResult<()> {
    println!("Financial Analyst AI ready. Ask about the filing (type 'exit' to quit).");
    println!("{}", "-".repeat(60));

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        let started = Instant::now();
        match engine.answer(query).await {
            Ok((answer, citations)) => {
                println!("   (Response time: {:.2}s)", started.elapsed().as_secs_f64());
                println!("\nAI: {answer}");
                if !citations.is_empty() {
                    println!("\nSources:");
                    for citation in citations.iter().take(SOURCES_SHOWN) {
                        println!(
                            "   - Page {}: {}",
                            citation.page,
                            citation.snippet.replace('\n', " ")
                        );
                    }
                }
            }
            Err(e) => println!("\nError: {e}"),
        }
    }

    Ok(())
}
