//! Interactive prompts
//!
//! The installer talks to the operator through the [`Prompter`] trait so the
//! workflow can be driven by scripted answers in tests. [`TerminalPrompter`]
//! is the real implementation: plain lines from stdin, and a masked reader
//! that echoes `*` per character for the password.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use zeroize::{Zeroize, Zeroizing};

use crate::theme;

/// Source of operator answers.
pub trait Prompter {
    /// Show `prompt` and read one line, without its line terminator.
    fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Show `prompt` and read one line without echoing it.
    fn ask_secret(&mut self, prompt: &str) -> Result<Zeroizing<String>>;
}

/// Prompter bound to the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", theme::prompt(prompt))?;
        stdout.flush()?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        if read == 0 {
            anyhow::bail!("stdin closed before an answer was given");
        }
        Ok(strip_line_ending(line))
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<Zeroizing<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", theme::prompt(prompt))?;
        stdout.flush()?;

        terminal::enable_raw_mode().context("Failed to enable raw mode for password entry")?;
        let result = read_masked(&mut stdout, event::read);
        let _ = terminal::disable_raw_mode();
        // Raw mode swallowed the Enter key's newline
        let _ = writeln!(stdout);
        result
    }
}

fn strip_line_ending(mut line: String) -> String {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}

/// What a single key press does to the masked buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MaskedKey {
    Char(char),
    Backspace,
    Submit,
    Abort,
    Ignore,
}

fn classify_key(key: &KeyEvent) -> MaskedKey {
    if key.kind == KeyEventKind::Release {
        return MaskedKey::Ignore;
    }
    match key.code {
        KeyCode::Enter => MaskedKey::Submit,
        KeyCode::Backspace => MaskedKey::Backspace,
        KeyCode::Char('c') | KeyCode::Char('d')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            MaskedKey::Abort
        }
        KeyCode::Char('h') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            MaskedKey::Backspace
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => MaskedKey::Char(c),
        _ => MaskedKey::Ignore,
    }
}

/// Read keys until Enter, echoing `*` and erasing on backspace.
///
/// Ctrl+C and Ctrl+D surface as `ErrorKind::Interrupted` so the caller maps
/// them to an operator abort.
fn read_masked<W, F>(out: &mut W, mut next_event: F) -> Result<Zeroizing<String>>
where
    W: Write,
    F: FnMut() -> io::Result<Event>,
{
    let mut buffer: Vec<char> = Vec::new();
    let outcome = loop {
        let event = match next_event() {
            Ok(event) => event,
            Err(e) => break Err(anyhow::Error::new(e).context("Failed to read password key")),
        };
        let Event::Key(key) = event else {
            continue;
        };
        match classify_key(&key) {
            MaskedKey::Submit => break Ok(()),
            MaskedKey::Abort => {
                break Err(anyhow::Error::new(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "password entry interrupted",
                )));
            }
            MaskedKey::Backspace => {
                if let Some(mut removed) = buffer.pop() {
                    removed.zeroize();
                    write!(out, "\u{8} \u{8}")?;
                    out.flush()?;
                }
            }
            MaskedKey::Char(c) => {
                buffer.push(c);
                write!(out, "*")?;
                out.flush()?;
            }
            MaskedKey::Ignore => {}
        }
    };

    let password = Zeroizing::new(buffer.iter().collect::<String>());
    buffer.zeroize();
    outcome.map(|()| password)
}
