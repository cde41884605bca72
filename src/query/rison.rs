//! RISON: a compact JSON notation that survives being pasted into a URL.
//!
//! `{"and":[{"in":["jane",{"var":"bio"}]}]}` becomes
//! `(and:!((in:!(jane,(var:bio)))))`.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{map, opt, recognize, value},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, separated_pair},
};
use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RisonError {
    #[error("invalid RISON at offset {offset}: {snippet}")]
    Syntax { offset: usize, snippet: String },
    #[error("unexpected input after RISON value: '{0}'")]
    TrailingInput(String),
    #[error("RISON nested deeper than {limit} levels at offset {offset}")]
    TooDeep { offset: usize, limit: usize },
}

/// Deepest `(` nesting `decode` accepts. Objects and arrays both count.
pub const MAX_DEPTH: usize = 64;

const NOT_ID_CHAR: &str = " '!:(),*@$";
const NOT_ID_START: &str = "-0123456789";

pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("!n"),
        Value::Bool(true) => out.push_str("!t"),
        Value::Bool(false) => out.push_str("!f"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push_str("!(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(')');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('(');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(&map[key], out);
            }
            out.push(')');
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    if is_id(s) {
        out.push_str(s);
        return;
    }

    out.push('\'');
    for ch in s.chars() {
        if ch == '!' || ch == '\'' {
            out.push('!');
        }
        out.push(ch);
    }
    out.push('\'');
}

fn is_id(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        None => false,
        Some(first) if NOT_ID_START.contains(first) || !is_id_char(first) => false,
        Some(_) => chars.all(is_id_char),
    }
}

fn is_id_char(c: char) -> bool {
    !NOT_ID_CHAR.contains(c) && !c.is_whitespace()
}

pub fn decode(input: &str) -> Result<Value, RisonError> {
    check_depth(input)?;

    match ws(rison_value).parse(input) {
        Ok((remaining, value)) => {
            if remaining.trim().is_empty() {
                Ok(value)
            } else {
                Err(RisonError::TrailingInput(remaining.to_string()))
            }
        }
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(syntax_error(input, e.input)),
        Err(nom::Err::Incomplete(_)) => Err(syntax_error(input, "")),
    }
}

/// Rejects input nested deeper than `MAX_DEPTH` before the recursive parser
/// sees it. Parentheses inside quoted strings do not count.
fn check_depth(input: &str) -> Result<(), RisonError> {
    let mut depth = 0usize;
    let mut quoted = false;
    let mut escaped = false;

    for (offset, c) in input.char_indices() {
        if quoted {
            if escaped {
                escaped = false;
            } else if c == '!' {
                escaped = true;
            } else if c == '\'' {
                quoted = false;
            }
            continue;
        }

        match c {
            '\'' => quoted = true,
            '(' => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(RisonError::TooDeep {
                        offset,
                        limit: MAX_DEPTH,
                    });
                }
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn syntax_error(input: &str, rest: &str) -> RisonError {
    let offset = input.len() - rest.len();
    RisonError::Syntax {
        offset,
        snippet: rest.chars().take(16).collect(),
    }
}

/// Allows whitespace around a token; hand-edited links often carry some.
fn ws<'a, O, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
    F: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn rison_value(input: &str) -> IResult<&str, Value> {
    alt((
        object,
        array,
        bang_literal,
        map(quoted_string, Value::String),
        number,
        map(identifier, |id: &str| Value::String(id.to_string())),
    ))
    .parse(input)
}

fn object(input: &str) -> IResult<&str, Value> {
    let entry = separated_pair(ws(key), char(':'), ws(rison_value));

    map(
        delimited(
            char('('),
            separated_list0(char(','), entry),
            preceded(multispace0, char(')')),
        ),
        |entries: Vec<(String, Value)>| Value::Object(entries.into_iter().collect::<Map<_, _>>()),
    )
    .parse(input)
}

fn key(input: &str) -> IResult<&str, String> {
    alt((quoted_string, map(identifier, str::to_string))).parse(input)
}

fn array(input: &str) -> IResult<&str, Value> {
    map(
        delimited(
            tag("!("),
            separated_list0(char(','), ws(rison_value)),
            preceded(multispace0, char(')')),
        ),
        Value::Array,
    )
    .parse(input)
}

fn bang_literal(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Bool(true), tag("!t")),
        value(Value::Bool(false), tag("!f")),
        value(Value::Null, tag("!n")),
    ))
    .parse(input)
}

fn number(input: &str) -> IResult<&str, Value> {
    let (rest, text) = recognize((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)?;

    // Integers stay integers so that `!(1,2)` decodes to `[1,2]`, not `[1.0,2.0]`.
    let number = text
        .parse::<i64>()
        .ok()
        .map(Number::from)
        .or_else(|| text.parse::<f64>().ok().and_then(Number::from_f64));

    match number {
        Some(n) => Ok((rest, Value::Number(n))),
        None => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| is_id_char(c) && !NOT_ID_START.contains(c)),
        take_while(is_id_char),
    ))
    .parse(input)
}

fn quoted_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('\'').parse(input)?;
    let (input, content) = quoted_string_content(input)?;
    let (input, _) = char('\'').parse(input)?;
    Ok((input, content))
}

fn quoted_string_content(input: &str) -> IResult<&str, String> {
    let mut result = String::new();
    let mut chars = input.chars();
    let mut consumed = 0;

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => break,
            '!' => match chars.next() {
                Some(escaped @ ('!' | '\'')) => {
                    consumed += ch.len_utf8() + escaped.len_utf8();
                    result.push(escaped);
                }
                _ => {
                    return Err(nom::Err::Failure(nom::error::Error::new(
                        &input[consumed..],
                        nom::error::ErrorKind::Escaped,
                    )));
                }
            },
            other => {
                consumed += other.len_utf8();
                result.push(other);
            }
        }
    }

    Ok((&input[consumed..], result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&json!(null)), "!n");
        assert_eq!(encode(&json!(true)), "!t");
        assert_eq!(encode(&json!(false)), "!f");
        assert_eq!(encode(&json!(42)), "42");
        assert_eq!(encode(&json!(-1.5)), "-1.5");
        assert_eq!(encode(&json!("jane")), "jane");
        assert_eq!(encode(&json!("")), "''");
    }

    #[test]
    fn test_encode_quotes_non_identifiers() {
        assert_eq!(encode(&json!("jane doe")), "'jane doe'");
        assert_eq!(encode(&json!("2024-01-01")), "'2024-01-01'");
        assert_eq!(encode(&json!("-x")), "'-x'");
        assert_eq!(encode(&json!("it's")), "'it!'s'");
        assert_eq!(encode(&json!("wow!")), "'wow!!'");
        assert_eq!(encode(&json!("a:b")), "'a:b'");
    }

    #[test]
    fn test_encode_containers() {
        assert_eq!(encode(&json!([])), "!()");
        assert_eq!(encode(&json!({})), "()");
        assert_eq!(encode(&json!([1, "a", [true]])), "!(1,a,!(!t))");
        assert_eq!(
            encode(&json!({"b": 1, "a": {"var": "bio"}})),
            "(a:(var:bio),b:1)"
        );
    }

    #[test]
    fn test_encode_logic_expression() {
        let value = json!({"and": [{"in": ["jane", {"var": "display_name"}]}]});
        assert_eq!(encode(&value), "(and:!((in:!(jane,(var:display_name)))))");
    }

    #[test]
    fn test_decode_logic_expression() {
        let value = decode("(and:!((in:!(jane,(var:display_name)))))").unwrap();
        assert_eq!(
            value,
            json!({"and": [{"in": ["jane", {"var": "display_name"}]}]})
        );
    }

    #[test]
    fn test_decode_operator_keys() {
        let value = decode("('<=':!('2024-01-01',(var:publication_date),'2024-02-01'))").unwrap();
        assert_eq!(
            value,
            json!({"<=": ["2024-01-01", {"var": "publication_date"}, "2024-02-01"]})
        );

        let value = decode("('!!':(var:bio))").unwrap();
        assert_eq!(value, json!({"!": {"var": "bio"}}));

        assert_eq!(encode(&json!({"!!": 1, "!=": 2})), "('!!!!':1,'!!=':2)");
    }

    #[test]
    fn test_decode_escapes() {
        assert_eq!(decode("'it!'s'").unwrap(), json!("it's"));
        assert_eq!(decode("'wow!!'").unwrap(), json!("wow!"));
        assert_eq!(decode("''").unwrap(), json!(""));
    }

    #[test]
    fn test_decode_numbers() {
        assert_eq!(decode("!(1,-2,3.5,1e3)").unwrap(), json!([1, -2, 3.5, 1000.0]));
    }

    #[test]
    fn test_decode_tolerates_whitespace() {
        let value = decode(" ( and : !( (var : bio) ) ) ").unwrap();
        assert_eq!(value, json!({"and": [{"var": "bio"}]}));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode("(and:"), Err(RisonError::Syntax { .. })));
        assert!(matches!(decode("'unterminated"), Err(RisonError::Syntax { .. })));
        assert!(matches!(decode("'bad!x'"), Err(RisonError::Syntax { .. })));
        assert!(matches!(decode("!(1,2))"), Err(RisonError::TrailingInput(_))));
        assert!(decode("").is_err());
    }

    #[test]
    fn test_decode_rejects_deep_nesting() {
        let nested = |depth: usize| format!("{}{}", "!(".repeat(depth), ")".repeat(depth));

        assert!(decode(&nested(MAX_DEPTH)).is_ok());
        assert_eq!(
            decode(&nested(MAX_DEPTH + 1)),
            Err(RisonError::TooDeep {
                offset: MAX_DEPTH * 2 + 1,
                limit: MAX_DEPTH
            })
        );
        assert!(matches!(
            decode(&nested(200_000)),
            Err(RisonError::TooDeep { .. })
        ));
        // Unbalanced input is still bounded.
        assert!(matches!(
            decode(&"(a:".repeat(10_000)),
            Err(RisonError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_quoted_parentheses_do_not_count_as_nesting() {
        let text = "(".repeat(MAX_DEPTH + 10);
        let value = json!({"in": [text, {"var": "caption"}]});

        assert_eq!(decode(&encode(&value)).unwrap(), value);
    }

    #[test]
    fn test_unicode_round_trip() {
        let value = json!({"in": ["café ☕", {"var": "caption"}]});
        assert_eq!(decode(&encode(&value)).unwrap(), value);
    }
}
