use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::io::{self, Write};

/// Reads a line without echoing it.
pub trait SecretReader {
    fn read_secret(&mut self, prompt: &str) -> io::Result<String>;
}

/// Raw-mode terminal input. Enter submits, Esc or Ctrl-C cancel with
/// `ErrorKind::Interrupted`.
pub struct TerminalSecretReader;

impl SecretReader for TerminalSecretReader {
    fn read_secret(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        enable_raw_mode()?;
        let result = read_masked_line();
        disable_raw_mode()?;
        writeln!(stdout)?;

        result
    }
}

fn read_masked_line() -> io::Result<String> {
    let mut secret = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(secret),
            KeyCode::Backspace => {
                secret.pop();
            }
            KeyCode::Esc => return Err(cancelled()),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(cancelled());
            }
            KeyCode::Char(c) => secret.push(c),
            _ => {}
        }
    }
}

fn cancelled() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "input cancelled")
}

/// Hands out queued answers; used to drive the menu without a terminal.
#[cfg(test)]
pub struct ScriptedSecrets(pub std::collections::VecDeque<String>);

#[cfg(test)]
impl ScriptedSecrets {
    pub fn new<I: IntoIterator<Item = &'static str>>(answers: I) -> Self {
        Self(answers.into_iter().map(String::from).collect())
    }
}

#[cfg(test)]
impl SecretReader for ScriptedSecrets {
    fn read_secret(&mut self, _prompt: &str) -> io::Result<String> {
        self.0
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more secrets"))
    }
}
