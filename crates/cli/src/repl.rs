//! Terminal input for the interactive chat: a line reader thread and slash-command parsing.

use std::io::BufRead;
use tokio::sync::mpsc;

/// Read trimmed, non-empty lines from `reader` on a dedicated thread.
///
/// The thread is detached, so a read blocked on the terminal never holds up
/// runtime shutdown. The channel closes on EOF. A read error is forwarded
/// once, then the thread ends.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<std::io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(32);

    std::thread::spawn(move || {
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    if tx.blocking_send(Ok(line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(Err(e));
                    break;
                }
            }
        }
    });

    rx
}

/// Lines starting with `/` are commands, not messages for the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Quit,
    Clear,
    Help,
    Save(Option<String>),
    Unknown(String),
}

impl SlashCommand {
    /// Parse a command line. Returns `None` for ordinary chat input.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('/') {
            return None;
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        Some(match head {
            "/quit" | "/exit" => Self::Quit,
            "/clear" => Self::Clear,
            "/help" => Self::Help,
            "/save" => Self::Save((!rest.is_empty()).then(|| rest.to_string())),
            other => Self::Unknown(other.to_string()),
        })
    }
}
