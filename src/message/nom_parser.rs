//! Nom-based line parser.
//!
//! Splits one inbound line into its borrowed components without
//! interpreting tag values, prefixes or parameters.

use nom::{
    branch::alt,
    bytes::complete::{take_till, take_till1, take_while1},
    character::complete::{char, space0, space1},
    combinator::{opt, rest},
    error::{context, VerboseError, VerboseErrorKind},
    multi::many0,
    sequence::{preceded, terminated},
    IResult,
};

use crate::error::MessageParseError;

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

/// Parse the tags section (after `@`, up to the first space).
fn parse_tags(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing message tags",
        terminated(preceded(char('@'), take_till(|c: char| c == ' ')), space1),
    )(input)
}

/// Parse the prefix (after `:`, up to the first space).
fn parse_prefix(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing message prefix",
        terminated(preceded(char(':'), take_till1(|c: char| c == ' ')), space1),
    )(input)
}

/// Parse the command verb (letters or a three digit numeric).
fn parse_command(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing command",
        take_while1(|c: char| c.is_ascii_alphanumeric()),
    )(input)
}

/// Parse a single parameter, either trailing (`:...` to end of line) or middle.
fn parse_param(input: &str) -> ParseResult<&str, &str> {
    preceded(
        space1,
        alt((preceded(char(':'), rest), take_till1(|c: char| c == ' '))),
    )(input)
}

/// Parse a complete line into its components.
pub fn parse_message(input: &str) -> ParseResult<&str, ParsedMessage<'_>> {
    let (input, _) = space0(input)?;
    let (input, tags) = opt(parse_tags)(input)?;
    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, command) = parse_command(input)?;
    let (input, params) = many0(parse_param)(input)?;

    Ok((
        input,
        ParsedMessage {
            tags,
            prefix,
            command,
            params,
        },
    ))
}

/// Components of a line, borrowing from the input.
///
/// ```text
/// [@tags] [:prefix] <command> [params...] [:trailing]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage<'a> {
    /// Raw tags string without the leading `@`.
    pub tags: Option<&'a str>,
    /// Raw prefix string without the leading `:`.
    pub prefix: Option<&'a str>,
    /// The command verb.
    pub command: &'a str,
    /// Parameters, trailing included.
    pub params: Vec<&'a str>,
}

impl<'a> ParsedMessage<'a> {
    /// Parse a line that has already had its line terminator removed.
    pub fn parse(input: &'a str) -> Result<Self, MessageParseError> {
        match parse_message(input) {
            Ok((_, parsed)) => Ok(parsed),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let mut position = input.len();
                let mut label = "parsing message";
                for (remaining, kind) in &e.errors {
                    position = input.len() - remaining.len();
                    if let VerboseErrorKind::Context(ctx) = kind {
                        label = *ctx;
                    }
                }
                Err(MessageParseError::ParseContext {
                    position,
                    context: label.to_string(),
                })
            }
            Err(nom::Err::Incomplete(_)) => Err(MessageParseError::ParseContext {
                position: input.len(),
                context: "incomplete input".to_string(),
            }),
        }
    }
}
