use anyhow::{Context, Result};

/// Source of the user's answer to the tier menu.
pub trait TierPrompt {
    fn read_choice(&mut self) -> Result<String>;
}

/// Reads the answer from standard input.
pub struct StdinPrompt;

impl TierPrompt for StdinPrompt {
    fn read_choice(&mut self) -> Result<String> {
        use std::io::{stdin, stdout, Write};

        print!("Enter your choice: ");
        stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        stdin().read_line(&mut input).context("Failed to read user input")?;
        Ok(input.trim().to_string())
    }
}

/// Replays a fixed answer.
#[cfg(test)]
pub struct ScriptedPrompt(pub &'static str);

#[cfg(test)]
impl TierPrompt for ScriptedPrompt {
    fn read_choice(&mut self) -> Result<String> {
        Ok(self.0.to_string())
    }
}
