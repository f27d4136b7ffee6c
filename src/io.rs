//! Text formats around the engine.
//!
//! Input:
//! ```text
//! <group count>
//! <count>,<opinion_a>,<opinion_b>,<rigidity>   (one line per group)
//! <budget>
//! ```
//! Output: conflict, total effort, then one moderated count per group.

use itertools::Itertools;
use thiserror::Error;

use crate::error::ModerationError;
use crate::model::group::Group;
use crate::model::network::Network;
use crate::model::Effort;
use crate::outcome::Solution;

/// Line numbers are 1-based and count blank lines, so they match what an editor shows.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("input ended before the {expected}")]
    MissingLine { expected: &'static str },
    #[error("line {line}: expected 4 comma-separated fields, found {found}")]
    FieldCount { line: usize, found: usize },
    #[error("line {line}: `{value}` is not a valid {field}")]
    InvalidNumber { line: usize, field: &'static str, value: String },
    #[error("line {line}: {source}")]
    InvalidGroup {
        line: usize,
        #[source]
        source: ModerationError,
    },
    #[error("line {line}: unexpected content after the budget")]
    TrailingInput { line: usize },
}

fn number<T: std::str::FromStr>(
    line: usize,
    field: &'static str,
    raw: &str,
) -> Result<T, ParseError> {
    let value = raw.trim();
    value
        .parse()
        .map_err(|_| ParseError::InvalidNumber { line, field, value: value.to_string() })
}

pub fn parse_network(text: &str) -> Result<Network, ParseError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (line, raw) = lines.next().ok_or(ParseError::MissingLine { expected: "group count" })?;
    let group_count: usize = number(line, "group count", raw)?;

    let mut groups = Vec::with_capacity(group_count);
    for _ in 0..group_count {
        let (line, raw) =
            lines.next().ok_or(ParseError::MissingLine { expected: "group definitions" })?;
        let fields = raw.split(',').collect_vec();
        let &[count, opinion_a, opinion_b, rigidity] = fields.as_slice() else {
            return Err(ParseError::FieldCount { line, found: fields.len() });
        };
        let group = Group::new(
            number(line, "agent count", count)?,
            number(line, "opinion", opinion_a)?,
            number(line, "opinion", opinion_b)?,
            number(line, "rigidity", rigidity)?,
        )
        .map_err(|source| ParseError::InvalidGroup { line, source })?;
        groups.push(group);
    }

    let (line, raw) = lines.next().ok_or(ParseError::MissingLine { expected: "budget" })?;
    let budget: Effort = number(line, "budget", raw)?;

    if let Some((line, _)) = lines.next() {
        return Err(ParseError::TrailingInput { line });
    }
    Ok(Network::new(groups, budget))
}

pub fn format_solution(solution: &Solution) -> String {
    [solution.conflict.to_string(), solution.effort.to_string()]
        .into_iter()
        .chain(solution.strategy.iter().map(usize::to_string))
        .join("\n")
}
