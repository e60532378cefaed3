// Lexical helpers for the selection pipeline

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{map, map_res, opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair, tuple},
    IResult,
};

/// Wrap a parser so surrounding whitespace is ignored
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Bare word: a letter or underscore followed by letters, digits or underscores.
/// Accented letters are accepted.
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            take_while1(|c: char| c.is_alphabetic() || c == '_'),
            take_while(|c: char| c.is_alphanumeric() || c == '_'),
        )),
        String::from,
    )(input)
}

/// Double-quoted string without escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        String::from,
    )(input)
}

/// Decimal number text. A trailing `.` is left alone so `15..25` splits cleanly.
pub fn number_text(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)
}

pub fn number(input: &str) -> IResult<&str, f64> {
    map_res(number_text, |s: &str| s.parse::<f64>())(input)
}

/// Column reference: a bare identifier or a quoted name with spaces
pub fn column_name(input: &str) -> IResult<&str, String> {
    alt((string_literal, identifier))(input)
}

/// Any scalar value written in a pipeline, kept as text
pub fn value_literal(input: &str) -> IResult<&str, String> {
    alt((string_literal, map(number_text, String::from), identifier))(input)
}

/// `[v, v, ...]`
pub fn value_list(input: &str) -> IResult<&str, Vec<String>> {
    delimited(
        ws(char('[')),
        separated_list0(ws(char(',')), ws(value_literal)),
        ws(char(']')),
    )(input)
}

/// `key: value` pairs separated by commas
pub fn named_args(input: &str) -> IResult<&str, Vec<(String, String)>> {
    separated_list0(
        ws(char(',')),
        map(
            tuple((ws(identifier), ws(tag(":")), ws(value_literal))),
            |(k, _, v)| (k, v),
        ),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_accents() {
        assert_eq!(identifier("Dispersión)").unwrap(), (")", "Dispersión".to_string()));
        assert!(identifier("1abc").is_err());
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(
            string_literal("\"Número de momento\" rest").unwrap(),
            (" rest", "Número de momento".to_string())
        );
        assert_eq!(string_literal("\"\"").unwrap().1, "");
    }

    #[test]
    fn test_number_stops_before_range() {
        assert_eq!(number("15..25").unwrap(), ("..25", 15.0));
        assert_eq!(number("-2.5").unwrap(), ("", -2.5));
    }

    #[test]
    fn test_value_list() {
        let (_, values) = value_list(r#"[ "A", B , 3 ]"#).unwrap();
        assert_eq!(values, vec!["A", "B", "3"]);
        assert!(value_list("[]").unwrap().1.is_empty());
    }

    #[test]
    fn test_named_args() {
        let (_, args) = named_args(r#"type: bar, x: "Depto X", y: Valor"#).unwrap();
        assert_eq!(args[1], ("x".to_string(), "Depto X".to_string()));
        assert_eq!(args.len(), 3);
    }
}
