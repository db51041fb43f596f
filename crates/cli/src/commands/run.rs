//! `thoughtline run` — answer one question and exit.

use super::session::{Session, render_result};

pub async fn run(
    query: String,
    max_iterations: Option<usize>,
    show_steps: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(max_iterations).await?;

    eprint!("  Thinking...");
    let result = session.agent.run(&query).await;
    eprint!("\r              \r");

    print!("{}", render_result(&result, show_steps));
    session.close().await;
    Ok(())
}
