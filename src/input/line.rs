//! Line-command backend: one command per line from any reader (usually stdin).

use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;

use log::{debug, info, warn};

use super::{Button, InputBackend, InputHandle, InputPublisher, InputSource};

/// A parsed input line.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineCommand {
    /// Tap a logical button.
    Press(Button),
    /// Ask the running applet to return.
    Exit,
    /// Cancel the running applet.
    Interrupt,
}

/// Parse one line. Case and surrounding whitespace are ignored.
pub fn parse_command(line: &str) -> Option<LineCommand> {
    let command = line.trim().to_ascii_lowercase();
    let button = match command.as_str() {
        "up" => Button::Up,
        "down" => Button::Down,
        "left" => Button::Left,
        "right" => Button::Right,
        "select" => Button::Select,
        "back" => Button::Back,
        "x" => Button::X,
        "y" => Button::Y,
        "q" => return Some(LineCommand::Exit),
        "interrupt" => return Some(LineCommand::Interrupt),
        _ => return None,
    };
    Some(LineCommand::Press(button))
}

/// Start reading commands from `reader` on a background thread.
///
/// End of input requests shutdown of the menu loop.
pub fn spawn_line_commands<R>(reader: R) -> io::Result<InputHandle>
where
    R: BufRead + Send + 'static,
{
    let (source, publisher) = InputSource::manual(InputBackend::LineCommands);
    thread::Builder::new()
        .name("input-lines".into())
        .spawn(move || listen(reader, &publisher))?;
    info!("Line command input ready (up/down/left/right/select/back/x/y, q to exit applet)");
    Ok(Arc::new(source))
}

pub(super) fn listen<R: BufRead>(
    reader: R,
    publisher: &InputPublisher,
) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!("Input read failed: {err}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Some(LineCommand::Press(button)) => {
                // The back button also asks the running applet to return
                if button == Button::Back {
                    publisher.request_exit();
                }
                publisher.tap(button);
            }
            Some(LineCommand::Exit) => publisher.request_exit(),
            Some(LineCommand::Interrupt) => publisher.raise_interrupt(),
            None => debug!("Unknown input command '{}'", line.trim()),
        }
    }
    debug!("Line command input closed");
    publisher.request_shutdown();
}
