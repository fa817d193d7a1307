use anyhow::{bail, Context, Result};
use std::io::{self, BufRead, Write};

/// Asks for a value on the terminal; an empty answer is an error.
pub fn ask(label: &str) -> Result<String> {
    let stdin = io::stdin();
    ask_from(label, &mut stdin.lock(), &mut io::stdout())
}

fn ask_from<R: BufRead, W: Write>(label: &str, input: &mut R, output: &mut W) -> Result<String> {
    write!(output, "{}: ", label)?;
    output.flush()?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .with_context(|| format!("Failed to read {}", label))?;

    let answer = answer.trim();
    if answer.is_empty() {
        bail!("{} is required", label);
    }
    Ok(answer.to_string())
}
