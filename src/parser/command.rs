// Command parsers for the selection pipeline

use super::ast::{Command, FilterArg};
use super::lexer::{column_name, named_args, number, value_list, value_literal, ws};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::map,
    error::{Error, ErrorKind},
    multi::separated_list0,
    sequence::{delimited, preceded, separated_pair, tuple},
    IResult,
};

fn keyword<'a>(name: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    ws(tag(name))
}

fn parens<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(ws(char('(')), inner, ws(char(')')))
}

fn lookup(args: &[(String, String)], key: &str) -> Option<String> {
    args.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

/// Parse the chart command
/// Format: chart(type: bar, x: col, y: col), arguments in any order
pub fn parse_chart(input: &str) -> IResult<&str, Command> {
    let (rest, args) = preceded(keyword("chart"), parens(named_args))(input)?;

    match (lookup(&args, "type"), lookup(&args, "x"), lookup(&args, "y")) {
        (Some(chart_type), Some(x), Some(y)) => Ok((rest, Command::Chart { chart_type, x, y })),
        _ => Err(nom::Err::Failure(Error::new(input, ErrorKind::Verify))),
    }
}

/// Format: color(col)
pub fn parse_color(input: &str) -> IResult<&str, Command> {
    map(
        preceded(keyword("color"), parens(ws(column_name))),
        Command::Color,
    )(input)
}

/// Format: facet(row: col, col: col), either key optional
pub fn parse_facet(input: &str) -> IResult<&str, Command> {
    let (rest, args) = preceded(keyword("facet"), parens(named_args))(input)?;

    let unknown = args.iter().any(|(k, _)| k != "row" && k != "col");
    if args.is_empty() || unknown {
        return Err(nom::Err::Failure(Error::new(input, ErrorKind::Verify)));
    }

    Ok((
        rest,
        Command::Facet {
            row: lookup(&args, "row"),
            col: lookup(&args, "col"),
        },
    ))
}

fn filter_arg(input: &str) -> IResult<&str, FilterArg> {
    alt((
        map(
            separated_pair(ws(number), tag(".."), ws(number)),
            |(lo, hi)| FilterArg::Range(lo, hi),
        ),
        map(value_list, FilterArg::Values),
    ))(input)
}

/// Format: filter(col: lo..hi) or filter(col: [v, ...])
pub fn parse_filter(input: &str) -> IResult<&str, Command> {
    map(
        preceded(
            keyword("filter"),
            parens(tuple((ws(column_name), ws(char(':')), filter_arg))),
        ),
        |(column, _, arg)| Command::Filter { column, arg },
    )(input)
}

/// Format: agg(sum)
pub fn parse_agg(input: &str) -> IResult<&str, Command> {
    map(preceded(keyword("agg"), parens(ws(value_literal))), Command::Agg)(input)
}

/// Format: barmode(stack)
pub fn parse_barmode(input: &str) -> IResult<&str, Command> {
    map(
        preceded(keyword("barmode"), parens(ws(value_literal))),
        Command::BarMode,
    )(input)
}

/// Format: horizontal()
pub fn parse_horizontal(input: &str) -> IResult<&str, Command> {
    map(
        tuple((keyword("horizontal"), ws(char('(')), ws(char(')')))),
        |_| Command::Horizontal,
    )(input)
}

/// Format: relative(Total) or relative(col, col); an empty list is left to
/// the denominator check
pub fn parse_relative(input: &str) -> IResult<&str, Command> {
    map(
        preceded(
            keyword("relative"),
            parens(separated_list0(ws(char(',')), ws(column_name))),
        ),
        Command::Relative,
    )(input)
}

/// Format: palette(Viridis)
pub fn parse_palette(input: &str) -> IResult<&str, Command> {
    map(
        preceded(keyword("palette"), parens(ws(value_literal))),
        Command::Palette,
    )(input)
}

/// Format: order(["B", "A"])
pub fn parse_order(input: &str) -> IResult<&str, Command> {
    map(preceded(keyword("order"), parens(value_list)), Command::Order)(input)
}

pub fn parse_command(input: &str) -> IResult<&str, Command> {
    alt((
        parse_chart,
        parse_color,
        parse_facet,
        parse_filter,
        parse_agg,
        parse_barmode,
        parse_horizontal,
        parse_relative,
        parse_palette,
        parse_order,
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_any_order() {
        let (_, cmd) = parse_chart("chart(y: Valor, type: bar, x: Departamento)").unwrap();
        assert_eq!(
            cmd,
            Command::Chart {
                chart_type: "bar".into(),
                x: "Departamento".into(),
                y: "Valor".into()
            }
        );
    }

    #[test]
    fn test_parse_chart_missing_y() {
        assert!(parse_chart("chart(type: bar, x: a)").is_err());
    }

    #[test]
    fn test_parse_facet() {
        let (_, cmd) = parse_facet(r#"facet(col: "Número de momento")"#).unwrap();
        assert_eq!(
            cmd,
            Command::Facet {
                row: None,
                col: Some("Número de momento".into())
            }
        );
        assert!(parse_facet("facet()").is_err());
        assert!(parse_facet("facet(rows: a)").is_err());
    }

    #[test]
    fn test_parse_filter_range() {
        let (_, cmd) = parse_filter("filter(Valor: 15..25)").unwrap();
        assert_eq!(
            cmd,
            Command::Filter {
                column: "Valor".into(),
                arg: FilterArg::Range(15.0, 25.0)
            }
        );
    }

    #[test]
    fn test_parse_filter_values() {
        let (_, cmd) = parse_filter(r#"filter(Departamento: ["A", "B"])"#).unwrap();
        assert_eq!(
            cmd,
            Command::Filter {
                column: "Departamento".into(),
                arg: FilterArg::Values(vec!["A".into(), "B".into()])
            }
        );
    }

    #[test]
    fn test_parse_relative_list() {
        let (_, cmd) = parse_relative("relative(Sexo, Grado)").unwrap();
        assert_eq!(cmd, Command::Relative(vec!["Sexo".into(), "Grado".into()]));
    }

    #[test]
    fn test_parse_relative_empty() {
        let (rest, cmd) = parse_relative("relative()").unwrap();
        assert_eq!(rest, "");
        assert_eq!(cmd, Command::Relative(Vec::new()));
    }

    #[test]
    fn test_parse_horizontal() {
        assert_eq!(parse_horizontal(" horizontal( ) ").unwrap().1, Command::Horizontal);
    }

    #[test]
    fn test_parse_agg_quoted_label() {
        let (_, cmd) = parse_agg(r#"agg("Cuenta de únicos")"#).unwrap();
        assert_eq!(cmd, Command::Agg("Cuenta de únicos".into()));
    }
}
