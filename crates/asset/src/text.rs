//! Line-level helpers shared by the OBJ and MTL parsers.

use crate::error::{ParseError, ParseErrorKind};

/// Non-empty, non-comment lines as `(1-based line number, keyword, arguments)`.
pub(crate) fn directives(text: &str) -> impl Iterator<Item = (usize, &str, &str)> {
    text.lines().enumerate().filter_map(|(line_no, line)| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        let (keyword, args) = match trimmed.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (trimmed, ""),
        };
        Some((line_no + 1, keyword, args))
    })
}

pub(crate) fn parse_f32(token: &str, line: usize) -> Result<f32, ParseError> {
    token.parse::<f32>().map_err(|_| {
        ParseError::new(
            line,
            ParseErrorKind::InvalidNumber {
                token: token.to_owned(),
            },
        )
    })
}

pub(crate) fn parse_floats(args: &str, line: usize) -> Result<Vec<f32>, ParseError> {
    args.split_whitespace()
        .map(|token| parse_f32(token, line))
        .collect()
}

/// First `N` numbers of `args`; extra numbers are ignored.
pub(crate) fn parse_vec<const N: usize>(
    args: &str,
    line: usize,
    keyword: &'static str,
) -> Result<[f32; N], ParseError> {
    let mut out = [0.0; N];
    let mut tokens = args.split_whitespace();
    for slot in &mut out {
        let token = tokens.next().ok_or_else(|| {
            ParseError::new(
                line,
                ParseErrorKind::MissingValue {
                    keyword,
                    what: "component",
                },
            )
        })?;
        *slot = parse_f32(token, line)?;
    }
    Ok(out)
}

pub(crate) fn require_arg<'a>(
    args: &'a str,
    line: usize,
    keyword: &'static str,
    what: &'static str,
) -> Result<&'a str, ParseError> {
    if args.is_empty() {
        Err(ParseError::new(
            line,
            ParseErrorKind::MissingValue { keyword, what },
        ))
    } else {
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_comment_lines() {
        let src = "\n# comment\n  v 1 2 3  \nusemtl  Red Paint\nend";
        let got: Vec<_> = directives(src).collect();
        assert_eq!(
            got,
            vec![(3, "v", "1 2 3"), (4, "usemtl", "Red Paint"), (5, "end", "")]
        );
    }

    #[test]
    fn parse_vec_reports_missing_component() {
        let err = parse_vec::<3>("1.0 2.0", 7, "Kd").unwrap_err();
        assert_eq!(err.line, 7);
        assert!(matches!(
            err.kind,
            ParseErrorKind::MissingValue { keyword: "Kd", .. }
        ));
    }

    #[test]
    fn parse_floats_rejects_garbage() {
        let err = parse_floats("1.0 abc", 2).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::InvalidNumber {
                token: "abc".into()
            }
        );
    }
}
