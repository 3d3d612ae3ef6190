//! Section preserver
//!
//! Carries hand-written code inside `USER CODE` regions from the previous
//! output of an artifact into its fresh rendering:
//!
//! ```c
//! /* USER CODE BEGIN runnable:a1b2c3d4 */
//! ...kept across regeneration...
//! /* USER CODE END runnable:a1b2c3d4 */
//! ```
//!
//! Marker lines are found by a line scan with two states (outside a region,
//! inside region `tag`). Every line of the rendered text outside region
//! bodies is kept verbatim.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::error::PreserveError;

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"^\s*/\*\s*USER CODE (BEGIN|END)\s+(\S+?)\s*\*/\s*$")
            .expect("marker pattern is valid")
    })
}

/// Opening marker line for `tag` (without newline)
pub fn begin_marker(tag: &str) -> String {
    format!("/* USER CODE BEGIN {tag} */")
}

/// Closing marker line for `tag` (without newline)
pub fn end_marker(tag: &str) -> String {
    format!("/* USER CODE END {tag} */")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker<'a> {
    Begin(&'a str),
    End(&'a str),
}

fn parse_marker(line: &str) -> Option<Marker<'_>> {
    let caps = marker_regex().captures(line)?;
    let tag = caps.get(2)?.as_str();
    match caps.get(1)?.as_str() {
        "BEGIN" => Some(Marker::Begin(tag)),
        _ => Some(Marker::End(tag)),
    }
}

/// A piece of scanned text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Region {
        tag: &'a str,
        /// BEGIN marker line, including its line break
        begin: &'a str,
        /// Everything between the marker lines
        body: &'a str,
        /// END marker line, including its line break (if any)
        end: &'a str,
    },
}

enum State<'a> {
    Outside {
        text_start: usize,
    },
    Inside {
        tag: &'a str,
        line: usize,
        begin_start: usize,
        body_start: usize,
    },
}

fn scan(text: &str) -> Result<Vec<Segment<'_>>, PreserveError> {
    let mut segments = Vec::new();
    let mut closed: HashSet<&str> = HashSet::new();
    let mut state = State::Outside { text_start: 0 };
    let mut offset = 0;

    for (index, line) in text.split_inclusive('\n').enumerate() {
        let line_no = index + 1;
        let marker = parse_marker(line);

        state = match (state, marker) {
            (State::Outside { text_start }, Some(Marker::Begin(tag))) => {
                if closed.contains(tag) {
                    return Err(PreserveError::DuplicateTag {
                        line: line_no,
                        tag: tag.to_string(),
                    });
                }
                if offset > text_start {
                    segments.push(Segment::Text(&text[text_start..offset]));
                }
                State::Inside {
                    tag,
                    line: line_no,
                    begin_start: offset,
                    body_start: offset + line.len(),
                }
            }
            (State::Outside { .. }, Some(Marker::End(tag))) => {
                return Err(PreserveError::UnmatchedEnd {
                    line: line_no,
                    tag: tag.to_string(),
                });
            }
            (State::Inside { tag: open, .. }, Some(Marker::Begin(tag))) => {
                return Err(PreserveError::NestedBegin {
                    line: line_no,
                    tag: tag.to_string(),
                    open: open.to_string(),
                });
            }
            (
                State::Inside {
                    tag: open,
                    begin_start,
                    body_start,
                    ..
                },
                Some(Marker::End(tag)),
            ) => {
                if tag != open {
                    return Err(PreserveError::MismatchedEnd {
                        line: line_no,
                        tag: tag.to_string(),
                        open: open.to_string(),
                    });
                }
                segments.push(Segment::Region {
                    tag,
                    begin: &text[begin_start..body_start],
                    body: &text[body_start..offset],
                    end: line,
                });
                closed.insert(tag);
                State::Outside {
                    text_start: offset + line.len(),
                }
            }
            (state, None) => state,
        };

        offset += line.len();
    }

    match state {
        State::Inside { tag, line, .. } => Err(PreserveError::Unterminated {
            line,
            tag: tag.to_string(),
        }),
        State::Outside { text_start } => {
            if text.len() > text_start {
                segments.push(Segment::Text(&text[text_start..]));
            }
            Ok(segments)
        }
    }
}

/// A preserved region found in a text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub tag: String,
    pub body: String,
}

/// All regions of `text`, in order of appearance
pub fn regions(text: &str) -> Result<Vec<Region>, PreserveError> {
    Ok(scan(text)?
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Region { tag, body, .. } => Some(Region {
                tag: tag.to_string(),
                body: body.to_string(),
            }),
            Segment::Text(_) => None,
        })
        .collect())
}

/// Result of reconciling a fresh rendering with the previous file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Text to write
    pub text: String,
    /// Non-empty regions of the previous file whose tag no longer exists
    pub orphans: Vec<Region>,
    /// Number of regions whose body was taken from the previous file
    pub preserved: usize,
}

/// Splice the region bodies of `existing` into `rendered`.
///
/// Regions present in both take the existing body; new regions keep the
/// rendered (empty) body; regions only in `existing` become orphans when
/// they hold anything but whitespace. Either text having malformed markers
/// is an error and nothing is produced.
pub fn reconcile(rendered: &str, existing: Option<&str>) -> Result<Reconciled, PreserveError> {
    let fresh = scan(rendered)?;
    let Some(existing) = existing else {
        return Ok(Reconciled {
            text: rendered.to_string(),
            orphans: Vec::new(),
            preserved: 0,
        });
    };
    let previous = scan(existing)?;

    let mut bodies: HashMap<&str, &str> = HashMap::new();
    for segment in previous.iter() {
        if let Segment::Region { tag, body, .. } = segment {
            bodies.insert(*tag, *body);
        }
    }

    let mut text = String::with_capacity(rendered.len().max(existing.len()));
    let mut live: HashSet<&str> = HashSet::new();
    let mut preserved = 0;

    for segment in fresh.iter() {
        match segment {
            Segment::Text(t) => text.push_str(t),
            Segment::Region {
                tag,
                begin,
                body,
                end,
            } => {
                live.insert(*tag);
                text.push_str(begin);
                match bodies.get(tag) {
                    Some(kept) => {
                        text.push_str(kept);
                        preserved += 1;
                    }
                    None => text.push_str(body),
                }
                text.push_str(end);
            }
        }
    }

    let orphans = previous
        .iter()
        .filter_map(|segment| match segment {
            Segment::Region { tag, body, .. } if !live.contains(tag) && !body.trim().is_empty() => {
                Some(Region {
                    tag: tag.to_string(),
                    body: body.to_string(),
                })
            }
            _ => None,
        })
        .collect();

    Ok(Reconciled {
        text,
        orphans,
        preserved,
    })
}
