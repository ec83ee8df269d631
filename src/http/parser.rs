//! Incremental HTTP/1.1 request parser.
//!
//! The parser is a pure function over the bytes a connection has accumulated
//! so far. It is re-run from the start after every read and reports one of
//! three outcomes: a complete [`Request`], "need more bytes", or a fatal
//! [`ParseError`].
//!
//! # Stages
//! ```text
//! buffer
//!     → parse_request_line  (method SP target SP version CRLF)
//!     → parse_headers       (*(name ":" value CRLF) CRLF)
//!     → parse_body          (Content-Length framed, optional)
//!     → Request
//! ```
//!
//! Only the body stage can ask for more bytes under the default
//! [`IncompleteHead::Reject`] policy. A head that is still missing its
//! terminator is treated as malformed.

use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::request::Request;

const CRLF: &[u8] = b"\r\n";
const CRLF2: &[u8] = b"\r\n\r\n";
const SP: u8 = b' ';

/// Fatal parse failures. The connection is dropped when one of these occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed request line")]
    MalformedRequestLine,

    #[error("malformed headers")]
    MalformedHeaders,

    #[error("header name is not valid utf-8")]
    InvalidHeaderEncoding,

    #[error("invalid content-length: {0:?}")]
    InvalidContentLength(String),
}

/// Result of one parse attempt over an accumulated buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A full request was recognized. Bytes past the body are ignored.
    Complete(Request),
    /// The body is shorter than its declared length; read more and retry.
    Incomplete,
    /// The input can never become a valid request.
    Malformed(ParseError),
}

impl ParseOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, ParseOutcome::Complete(_))
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, ParseOutcome::Incomplete)
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ParseOutcome::Malformed(_))
    }
}

/// Why a single stage stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    Incomplete,
    Malformed(ParseError),
}

impl From<ParseError> for StageError {
    fn from(err: ParseError) -> Self {
        StageError::Malformed(err)
    }
}

/// How to classify a request head whose terminator has not arrived yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IncompleteHead {
    /// Missing CRLF after the request line, or missing blank line after the
    /// headers, is malformed.
    #[default]
    Reject,
    /// Keep reading until the head terminator shows up.
    Wait,
}

impl IncompleteHead {
    fn missing(self, err: ParseError) -> StageError {
        match self {
            IncompleteHead::Reject => StageError::Malformed(err),
            IncompleteHead::Wait => StageError::Incomplete,
        }
    }
}

/// Parser knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    pub incomplete_head: IncompleteHead,
}

/// Working state threaded through the stages. Borrows from the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseState<'a> {
    method: &'a [u8],
    target: &'a [u8],
    version: &'a [u8],
    headers: HashMap<String, &'a [u8]>,
    body: &'a [u8],
    remaining: &'a [u8],
}

impl<'a> ParseState<'a> {
    /// Bytes not consumed by the stages run so far.
    pub fn remaining(&self) -> &'a [u8] {
        self.remaining
    }

    pub fn headers(&self) -> &HashMap<String, &'a [u8]> {
        &self.headers
    }

    /// Copy the borrowed pieces out into an owned [`Request`].
    pub fn into_request(self) -> Request {
        let headers = self
            .headers
            .into_iter()
            .map(|(name, value)| (name, Bytes::copy_from_slice(value)))
            .collect();

        Request::new(
            Bytes::copy_from_slice(self.method),
            Bytes::copy_from_slice(self.target),
            Bytes::copy_from_slice(self.version),
            headers,
            Bytes::copy_from_slice(self.body),
        )
    }
}

/// Parse `buf` with the default options.
pub fn parse_request(buf: &[u8]) -> ParseOutcome {
    parse_request_with(buf, &ParseOptions::default())
}

/// Parse `buf` as a complete request, running all three stages.
pub fn parse_request_with(buf: &[u8], options: &ParseOptions) -> ParseOutcome {
    let result = parse_request_line(buf, options)
        .and_then(|state| parse_headers(state, options))
        .and_then(parse_body);

    match result {
        Ok(state) => ParseOutcome::Complete(state.into_request()),
        Err(StageError::Incomplete) => ParseOutcome::Incomplete,
        Err(StageError::Malformed(err)) => ParseOutcome::Malformed(err),
    }
}

/// Stage 1: `method SP target SP version CRLF`.
pub fn parse_request_line<'a>(
    buf: &'a [u8],
    options: &ParseOptions,
) -> Result<ParseState<'a>, StageError> {
    let Some((line, remaining)) = split_once(buf, CRLF) else {
        return Err(options
            .incomplete_head
            .missing(ParseError::MalformedRequestLine));
    };

    let mut tokens = line.split(|b| *b == SP);
    let parts = (tokens.next(), tokens.next(), tokens.next(), tokens.next());
    let (method, target, version) = match parts {
        (Some(method), Some(target), Some(version), None)
            if !method.is_empty() && !target.is_empty() && !version.is_empty() =>
        {
            (method, target, version)
        }
        _ => return Err(ParseError::MalformedRequestLine.into()),
    };

    Ok(ParseState {
        method,
        target,
        version,
        headers: HashMap::new(),
        body: &[],
        remaining,
    })
}

/// Stage 2: header lines up to and including the blank line.
pub fn parse_headers<'a>(
    mut state: ParseState<'a>,
    options: &ParseOptions,
) -> Result<ParseState<'a>, StageError> {
    let input = state.remaining;
    let (block, remaining) = match input.strip_prefix(CRLF) {
        Some(rest) => (&[][..], rest),
        None => match split_once(input, CRLF2) {
            Some(parts) => parts,
            None => {
                return Err(options
                    .incomplete_head
                    .missing(ParseError::MalformedHeaders))
            }
        },
    };

    for line in lines(block) {
        let colon = line
            .iter()
            .position(|b| *b == b':')
            .ok_or(ParseError::MalformedHeaders)?;
        let name = std::str::from_utf8(&line[..colon])
            .map_err(|_| ParseError::InvalidHeaderEncoding)?;

        state
            .headers
            .insert(name.to_lowercase(), line[colon + 1..].trim_ascii());
    }

    state.remaining = remaining;
    Ok(state)
}

/// Stage 3: Content-Length framed body. A no-op when the header is absent.
pub fn parse_body(mut state: ParseState<'_>) -> Result<ParseState<'_>, StageError> {
    let Some(raw) = state.headers.get("content-length").copied() else {
        return Ok(state);
    };

    let declared = parse_content_length(raw)?;
    if declared <= 0 {
        return Ok(state);
    }

    // A length that does not fit in memory can never be satisfied.
    let len = usize::try_from(declared)
        .map_err(|_| ParseError::InvalidContentLength(declared.to_string()))?;

    if state.remaining.len() < len {
        return Err(StageError::Incomplete);
    }

    state.body = &state.remaining[..len];
    state.remaining = &state.remaining[len..];
    Ok(state)
}

fn parse_content_length(raw: &[u8]) -> Result<i64, ParseError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            ParseError::InvalidContentLength(String::from_utf8_lossy(raw).into_owned())
        })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn split_once<'a>(s: &'a [u8], sep: &[u8]) -> Option<(&'a [u8], &'a [u8])> {
    let at = find(s, sep)?;
    Some((&s[..at], &s[at + sep.len()..]))
}

fn lines(mut block: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut done = block.is_empty();
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        match split_once(block, CRLF) {
            Some((line, rest)) => {
                block = rest;
                Some(line)
            }
            None => {
                done = true;
                Some(block)
            }
        }
    })
}
