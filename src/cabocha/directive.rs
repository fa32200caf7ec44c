//! `#!` directive lines.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::Scope;

static DOC_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#!\s*DOC\s+(\d+)\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Directive {
    Doc(String),
    Segment {
        scope: Scope,
        name: String,
        start: usize,
        end: usize,
        comment: String,
    },
    Link {
        scope: Scope,
        name: String,
        from: usize,
        to: usize,
        comment: String,
    },
    Group {
        scope: Scope,
        name: String,
        members: Vec<usize>,
        comment: String,
    },
    Attr {
        key: String,
        value: String,
    },
    /// Any other directive (bibliographic data, XML attributes, ...).
    Other,
}

pub(crate) fn is_directive(line: &str) -> bool {
    line.starts_with("#!")
}

/// Splits a directive body into whitespace tokens and the quoted comment.
fn split_body(body: &str) -> (Vec<&str>, String) {
    match (body.find('"'), body.rfind('"')) {
        (Some(a), Some(b)) if b > a => (
            body[..a].split_whitespace().collect(),
            body[a + 1..b].to_string(),
        ),
        _ => (body.split_whitespace().collect(), String::new()),
    }
}

fn scope_of(keyword: &str) -> Scope {
    if keyword.ends_with("_S") {
        Scope::Sentence
    } else {
        Scope::Document
    }
}

/// Parses a `#!` line. `Err` carries a short reason.
pub(crate) fn parse_directive(line: &str) -> Result<Directive, &'static str> {
    let body = line.trim_start_matches("#!").trim();
    let (tokens, comment) = split_body(body);
    let Some(&keyword) = tokens.first() else {
        return Ok(Directive::Other);
    };
    let num = |s: &str| s.parse::<usize>().map_err(|_| "expected a number");
    match keyword {
        "DOC" => match DOC_HEADER.captures(line) {
            Some(c) => Ok(Directive::Doc(c[1].to_string())),
            None => Err("malformed DOC header"),
        },
        "SEGMENT" | "SEGMENT_S" => {
            let [_, name, start, end] = tokens[..] else {
                return Err("SEGMENT needs a name, start and end");
            };
            let (start, end) = (num(start)?, num(end)?);
            if start > end {
                return Err("SEGMENT start exceeds end");
            }
            Ok(Directive::Segment {
                scope: scope_of(keyword),
                name: name.to_string(),
                start,
                end,
                comment,
            })
        }
        "LINK" | "LINK_S" => {
            let [_, name, from, to] = tokens[..] else {
                return Err("LINK needs a name and two segment ids");
            };
            Ok(Directive::Link {
                scope: scope_of(keyword),
                name: name.to_string(),
                from: num(from)?,
                to: num(to)?,
                comment,
            })
        }
        "GROUP" | "GROUP_S" => {
            if tokens.len() < 3 {
                return Err("GROUP needs a name and segment ids");
            }
            let members = tokens[2..]
                .iter()
                .map(|t| num(t))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Directive::Group {
                scope: scope_of(keyword),
                name: tokens[1].to_string(),
                members,
                comment,
            })
        }
        "ATTR" => {
            let [_, key] = tokens[..] else {
                return Err("ATTR needs a key and a quoted value");
            };
            Ok(Directive::Attr {
                key: key.to_string(),
                value: comment,
            })
        }
        _ => Ok(Directive::Other),
    }
}
