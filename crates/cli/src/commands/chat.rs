//! `thoughtline chat` — interactive question loop.

use std::io::Write;

use super::session::{Session, render_result};

const EXIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

pub async fn run(
    max_iterations: Option<usize>,
    show_steps: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(max_iterations).await?;

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║       thoughtline — Interactive Mode         ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", session.config.default_provider);
    println!("  Model:     {}", thoughtline_providers::resolve_model(&session.config));
    println!(
        "  Tools:     {}",
        session.agent.registry().action_types().join(", ")
    );
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'quit', 'exit' or 'q' to leave.");
    println!();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = read_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_exit(query) {
            break;
        }

        eprint!("  ...");
        let result = session.agent.run(query).await;
        eprint!("\r     \r");
        println!();
        for line in render_result(&result, show_steps).lines() {
            println!("  {line}");
        }
        println!();
    }

    println!();
    println!("  Goodbye!");
    println!();
    session.close().await;
    Ok(())
}

/// One line from stdin, or `None` at end of input.
async fn read_line() -> Result<Option<String>, Box<dyn std::error::Error>> {
    let read = tokio::task::spawn_blocking(|| {
        let mut buf = String::new();
        std::io::stdin().read_line(&mut buf).map(|n| (n, buf))
    })
    .await??;
    Ok(match read {
        (0, _) => None,
        (_, line) => Some(line),
    })
}

fn is_exit(input: &str) -> bool {
    EXIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words() {
        assert!(is_exit("quit"));
        assert!(is_exit("EXIT"));
        assert!(is_exit("q"));
        assert!(!is_exit("question"));
        assert!(!is_exit("what is 2+2?"));
    }
}
