//! Text values with inline links to other notes.
//!
//! # Invariants
//! - Every link span lies within `0..=text.len()` and `start <= end`.
//! - Spans are byte offsets on UTF-8 character boundaries.
//! - A `LinkedText` is immutable once constructed.

use crate::model::note::NoteId;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Add;

/// Half-open byte range `[start, end)` into a `LinkedText`'s text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pos {
    pub start: usize,
    pub end: usize,
}

impl Pos {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    fn shifted(self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

/// One hyperlink span pointing at another note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Link {
    pub pos: Pos,
    pub dest: NoteId,
}

impl Link {
    pub fn new(pos: Pos, dest: NoteId) -> Self {
        Self { pos, dest }
    }
}

/// Rejected span when building a `LinkedText`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpanError {
    pub pos: Pos,
    pub text_len: usize,
}

impl Display for LinkSpanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "link span {}..{} is outside text of length {}",
            self.pos.start, self.pos.end, self.text_len
        )
    }
}

impl Error for LinkSpanError {}

/// Text with an ordered list of links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkedText {
    text: String,
    links: Vec<Link>,
}

impl LinkedText {
    /// Text without any links.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            links: Vec::new(),
        }
    }

    /// Builds linked text, validating every span against the text.
    pub fn new(text: impl Into<String>, links: Vec<Link>) -> Result<Self, LinkSpanError> {
        let text = text.into();
        for link in &links {
            let pos = link.pos;
            let in_bounds = pos.start <= pos.end && pos.end <= text.len();
            if !in_bounds || !text.is_char_boundary(pos.start) || !text.is_char_boundary(pos.end)
            {
                return Err(LinkSpanError {
                    pos,
                    text_len: text.len(),
                });
            }
        }
        Ok(Self { text, links })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Returns the substring covered by `pos`, if it is a valid span.
    pub fn span_text(&self, pos: Pos) -> Option<&str> {
        self.text.get(pos.start..pos.end)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Display for LinkedText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl Add<&LinkedText> for &LinkedText {
    type Output = LinkedText;

    /// Concatenates text; links of the right operand shift by the left
    /// operand's text length.
    fn add(self, rhs: &LinkedText) -> LinkedText {
        let offset = self.text.len();
        let mut text = String::with_capacity(offset + rhs.text.len());
        text.push_str(&self.text);
        text.push_str(&rhs.text);

        let mut links = self.links.clone();
        links.extend(
            rhs.links
                .iter()
                .map(|link| Link::new(link.pos.shifted(offset), link.dest)),
        );
        LinkedText { text, links }
    }
}

impl Add for LinkedText {
    type Output = LinkedText;

    fn add(self, rhs: LinkedText) -> LinkedText {
        &self + &rhs
    }
}

#[cfg(test)]
mod tests {
    use super::{Link, LinkedText, Pos};

    #[test]
    fn new_rejects_span_past_end() {
        let err = LinkedText::new("abc", vec![Link::new(Pos::new(1, 4), 7)]).unwrap_err();
        assert_eq!(err.text_len, 3);
    }

    #[test]
    fn new_rejects_reversed_span() {
        assert!(LinkedText::new("abc", vec![Link::new(Pos::new(2, 1), 7)]).is_err());
    }

    #[test]
    fn new_rejects_span_inside_multibyte_char() {
        assert!(LinkedText::new("é", vec![Link::new(Pos::new(0, 1), 7)]).is_err());
    }

    #[test]
    fn span_at_text_end_is_allowed() {
        let lt = LinkedText::new("abc", vec![Link::new(Pos::new(3, 3), 7)]).unwrap();
        assert_eq!(lt.span_text(Pos::new(3, 3)), Some(""));
    }

    #[test]
    fn concatenation_shifts_right_links() {
        let left = LinkedText::new("see ", vec![Link::new(Pos::new(0, 3), 1)]).unwrap();
        let right = LinkedText::new("x.csv now", vec![Link::new(Pos::new(0, 5), 2)]).unwrap();

        let joined = &left + &right;
        assert_eq!(joined.text(), "see x.csv now");
        assert_eq!(
            joined.links(),
            &[
                Link::new(Pos::new(0, 3), 1),
                Link::new(Pos::new(4, 9), 2)
            ]
        );
        assert_eq!(joined.span_text(joined.links()[1].pos), Some("x.csv"));
    }
}
