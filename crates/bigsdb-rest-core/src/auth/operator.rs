use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Context, Result};

/// The person at the terminal. Authorizing a request token happens in a
/// browser, so escalation to an access token has to wait on them.
pub trait Operator: Send + Sync {
    /// Show the authorization URL and return the verification code entered.
    fn verification_code(&self, authorize_url: &str) -> Result<String>;

    /// Optional pause before a connection request.
    fn pause(&self) -> Result<()> {
        Ok(())
    }

    /// Progress message for the person running the flow.
    fn notice(&self, _message: &str) {}
}

/// Reads from stdin, writes prompts to stderr so stdout stays clean for output.
#[derive(Debug, Clone, Default)]
pub struct TerminalOperator {
    /// Wait for Enter before each token request (demonstration mode).
    pub pause_before_requests: bool,
}

impl TerminalOperator {
    pub fn new(pause_before_requests: bool) -> Self {
        Self {
            pause_before_requests,
        }
    }

    /// Prompt on stderr and read one line. `None` at end of input.
    fn read_line(prompt: &str) -> Result<Option<String>> {
        eprint!("{}", prompt);
        io::stderr().flush()?;
        read_trimmed_line(&mut io::stdin().lock())
    }
}

fn read_trimmed_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn require_code(input: Option<String>) -> Result<String> {
    match input {
        Some(code) if !code.is_empty() => Ok(code),
        _ => Err(anyhow!("No verification code entered")),
    }
}

impl Operator for TerminalOperator {
    fn verification_code(&self, authorize_url: &str) -> Result<String> {
        eprintln!("Now log in at {}\n", authorize_url);
        require_code(Self::read_line("Please enter verification code: ")?)
    }

    fn notice(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn pause(&self) -> Result<()> {
        if self.pause_before_requests {
            Self::read_line("Press Enter to continue...")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_trimmed_line() {
        let mut input = Cursor::new("  1234 \r\nrest\n");
        assert_eq!(read_trimmed_line(&mut input).unwrap(), Some("1234".to_string()));
    }

    #[test]
    fn test_end_of_input() {
        let mut input = Cursor::new("");
        assert_eq!(read_trimmed_line(&mut input).unwrap(), None);
    }

    #[test]
    fn test_verification_code_required() {
        assert_eq!(require_code(Some("5678".to_string())).unwrap(), "5678");
        assert!(require_code(Some(String::new())).is_err());
        assert!(require_code(None).is_err());
    }
}
