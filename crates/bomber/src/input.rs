//! Keyboard input.
//!
//! Stdin is line-buffered, so a blocking reader thread turns each line into
//! [`Input`]s and hands them to the frame loop over a channel. The loop
//! polls with `try_recv` and never blocks on the keyboard.

use std::io::BufRead;
use std::thread::{self, JoinHandle};

use bomber_shared::Direction;
use crossbeam_channel::{Receiver, Sender};

/// One user intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Step one cell.
    Move(Direction),
    /// Drop a bomb at the current cell.
    PlaceBomb,
    /// Declare ready.
    Ready,
    /// Leave.
    Quit,
}

impl Input {
    /// Maps one key. Unknown keys map to `None`.
    #[must_use]
    pub const fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'w' => Some(Self::Move(Direction::Up)),
            's' => Some(Self::Move(Direction::Down)),
            'a' => Some(Self::Move(Direction::Left)),
            'd' => Some(Self::Move(Direction::Right)),
            'b' | ' ' => Some(Self::PlaceBomb),
            'r' => Some(Self::Ready),
            'q' => Some(Self::Quit),
            _ => None,
        }
    }

    /// Every recognised key in a line, in order. `"ddb"` is two steps right
    /// then a bomb.
    pub fn parse_line(line: &str) -> impl Iterator<Item = Self> + '_ {
        line.chars().filter_map(Self::from_key)
    }
}

/// Starts the stdin reader. It sends [`Input::Quit`] on end of input and
/// exits when the receiver is gone.
pub fn spawn_stdin_reader() -> std::io::Result<(Receiver<Input>, JoinHandle<()>)> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let handle = thread::Builder::new()
        .name("bomber-stdin".into())
        .spawn(move || read_inputs(std::io::stdin().lock(), &tx))?;
    Ok((rx, handle))
}

/// Reads lines from `reader` until it ends or the receiver hangs up.
pub fn read_inputs(reader: impl BufRead, tx: &Sender<Input>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        };
        for input in Input::parse_line(&line) {
            if tx.send(input).is_err() {
                return;
            }
        }
    }
    let _ = tx.send(Input::Quit);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(Input::from_key('W'), Some(Input::Move(Direction::Up)));
        assert_eq!(Input::from_key(' '), Some(Input::PlaceBomb));
        assert_eq!(Input::from_key('x'), None);
        let line: Vec<Input> = Input::parse_line("dd?b").collect();
        assert_eq!(
            line,
            vec![Input::Move(Direction::Right), Input::Move(Direction::Right), Input::PlaceBomb]
        );
    }

    #[test]
    fn test_reader_ends_with_quit() {
        let (tx, rx) = crossbeam_channel::unbounded();
        read_inputs(&b"a\n\nr\n"[..], &tx);
        let got: Vec<Input> = rx.try_iter().collect();
        assert_eq!(got, vec![Input::Move(Direction::Left), Input::Ready, Input::Quit]);
    }

    #[test]
    fn test_reader_stops_when_receiver_dropped() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        read_inputs(&b"wwww\n"[..], &tx);
    }
}
