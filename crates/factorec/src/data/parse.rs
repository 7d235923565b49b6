//! Tokenizing of ingestion lines.
//!
//! Both layouts share the same prefix: a label token followed by three
//! counts (`num_global num_ufactor num_ifactor`), then `index:value` pairs.
//! Tokens are separated by any run of whitespace and/or colons.

use std::str::FromStr;

use super::storage::GroupCounts;

/// Errors produced while parsing a single ingestion line.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("line is blank")]
    Blank,

    #[error("missing {what} token")]
    MissingToken { what: &'static str },

    #[error("invalid {what} token `{token}`")]
    InvalidToken { what: &'static str, token: String },

    #[error("declared pair counts overflow")]
    CountOverflow,

    #[error("declared {declared} feature pairs but found {found}")]
    PairCountMismatch { declared: usize, found: usize },

    #[error("tuple line has no user pair")]
    MissingUserPair,

    #[error("tuple line for user {user} has no item pairs")]
    MissingItemPairs { user: u32 },
}

/// Parsed line prefix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHeader<'l> {
    /// Raw label token (parsed by the grouped layout, ignored by tuples).
    pub label: &'l str,
    /// Declared per-group pair counts.
    pub counts: GroupCounts,
}

#[inline]
fn is_delim(c: char) -> bool {
    c == ':' || c.is_whitespace()
}

/// Iterator over the tokens of one line.
#[derive(Debug, Clone)]
pub(crate) struct Tokens<'l> {
    rest: &'l str,
}

impl<'l> Tokens<'l> {
    pub(crate) fn new(line: &'l str) -> Self {
        Self { rest: line }
    }
}

impl<'l> Iterator for Tokens<'l> {
    type Item = &'l str;

    fn next(&mut self) -> Option<&'l str> {
        let s = self.rest.trim_start_matches(is_delim);
        if s.is_empty() {
            self.rest = s;
            return None;
        }
        let end = s.find(is_delim).unwrap_or(s.len());
        let (token, rest) = s.split_at(end);
        self.rest = rest;
        Some(token)
    }
}

fn parse_token<T: FromStr>(token: Option<&str>, what: &'static str) -> Result<T, ParseError> {
    let token = token.ok_or(ParseError::MissingToken { what })?;
    token.parse().map_err(|_| ParseError::InvalidToken {
        what,
        token: token.to_string(),
    })
}

/// Parse the label token and the three group counts.
///
/// The counts are guaranteed to sum without overflow.
pub(crate) fn parse_header<'l>(tokens: &mut Tokens<'l>) -> Result<LineHeader<'l>, ParseError> {
    let label = tokens.next().ok_or(ParseError::Blank)?;
    let global: usize = parse_token(tokens.next(), "global count")?;
    let user: usize = parse_token(tokens.next(), "user count")?;
    let item: usize = parse_token(tokens.next(), "item count")?;
    global
        .checked_add(user)
        .and_then(|n| n.checked_add(item))
        .ok_or(ParseError::CountOverflow)?;
    Ok(LineHeader {
        label,
        counts: GroupCounts { global, user, item },
    })
}

/// Parse the label token as a float.
pub(crate) fn parse_label(token: &str) -> Result<f32, ParseError> {
    parse_token(Some(token), "label")
}

/// Parse all remaining `index:value` pairs into `out` (cleared first).
pub(crate) fn parse_pairs(tokens: &mut Tokens<'_>, out: &mut Vec<(u32, f32)>) -> Result<(), ParseError> {
    out.clear();
    while let Some(index) = tokens.next() {
        let index: u32 = parse_token(Some(index), "feature index")?;
        let value: f32 = parse_token(tokens.next(), "feature value")?;
        out.push((index, value));
    }
    Ok(())
}
