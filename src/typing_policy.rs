use std::iter::Peekable;
use std::str::Chars;

/// How a single target character looks against the current input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharStatus {
    Correct,
    Incorrect,
    Pending,
    /// First pending position, i.e. where the next keystroke lands
    Cursor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionStatus {
    pub char: char,
    pub status: CharStatus,
}

/// Lazy per-position comparison of an input buffer against a target.
///
/// Yields exactly one item per target character. Input characters past the
/// end of the target are ignored.
#[derive(Clone, Debug)]
pub struct PositionStatuses<'a> {
    target: Chars<'a>,
    input: Peekable<Chars<'a>>,
    cursor_emitted: bool,
}

impl<'a> PositionStatuses<'a> {
    pub fn new(target: &'a str, input: &'a str) -> Self {
        Self {
            target: target.chars(),
            input: input.chars().peekable(),
            cursor_emitted: false,
        }
    }

    /// A sequence with no positions, returned when nothing is being typed
    pub fn empty() -> Self {
        Self::new("", "")
    }
}

impl Iterator for PositionStatuses<'_> {
    type Item = PositionStatus;

    fn next(&mut self) -> Option<Self::Item> {
        let expected = self.target.next()?;
        let status = match self.input.next() {
            Some(typed) if typed == expected => CharStatus::Correct,
            Some(_) => CharStatus::Incorrect,
            None if !self.cursor_emitted => {
                self.cursor_emitted = true;
                CharStatus::Cursor
            }
            None => CharStatus::Pending,
        };

        Some(PositionStatus {
            char: expected,
            status,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.target.size_hint()
    }
}

/// Indices of target positions the input currently gets wrong
pub fn incorrect_positions<'a>(
    target: &'a str,
    input: &'a str,
) -> impl Iterator<Item = usize> + 'a {
    PositionStatuses::new(target, input)
        .enumerate()
        .filter(|(_, p)| p.status == CharStatus::Incorrect)
        .map(|(idx, _)| idx)
}
