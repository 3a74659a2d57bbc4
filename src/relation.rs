//! Relation name parsing using nom.
//!
//! Accepts one to three dot-separated parts, each either a bare identifier
//! or a double-quoted one (`""` escapes a quote inside).
//!
//! ```text
//! analytics."My Schema".orders
//! ───┬───── ─────┬───── ──┬───
//!    │           │        └── identifier
//!    │           └── schema (quoted)
//!    └── database
//! ```

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, verify},
    multi::{fold_many0, separated_list1},
    sequence::delimited,
    IResult,
};

use crate::error::{CatalogError, CatalogResult};

/// A possibly-qualified relation name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    pub database: Option<String>,
    pub schema: Option<String>,
    pub identifier: String,
}

impl Relation {
    /// An unqualified relation, resolved through the session's search path.
    pub fn bare(identifier: impl Into<String>) -> Self {
        Self {
            database: None,
            schema: None,
            identifier: identifier.into(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Parse a relation name such as `svv_table_info` or `"db"."Sch".tbl`.
    pub fn parse(input: &str) -> CatalogResult<Self> {
        let input = input.trim();

        match parse_parts(input) {
            Ok(("", parts)) => Self::from_parts(parts, input),
            Ok((remaining, _)) => Err(CatalogError::parse(
                input.len() - remaining.len(),
                format!("Unexpected trailing content: '{}'", remaining),
            )),
            Err(e) => Err(CatalogError::parse(0, format!("Parse failed: {:?}", e))),
        }
    }

    fn from_parts(mut parts: Vec<String>, input: &str) -> CatalogResult<Self> {
        if parts.len() > 3 {
            return Err(CatalogError::parse(
                0,
                format!("Too many name parts in '{}' (at most database.schema.relation)", input),
            ));
        }

        // separated_list1 guarantees at least one part
        let identifier = parts.pop().unwrap_or_default();
        let schema = parts.pop();
        let database = parts.pop();

        Ok(Self {
            database,
            schema,
            identifier,
        })
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(db) = &self.database {
            write!(f, "{}.", quote_ident(db))?;
        }
        if let Some(schema) = &self.schema {
            write!(f, "{}.", quote_ident(schema))?;
        }
        write!(f, "{}", quote_ident(&self.identifier))
    }
}

impl std::str::FromStr for Relation {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relation::parse(s)
    }
}

/// Quote an identifier only when it would not survive unquoted.
pub fn quote_ident(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$');

    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Parse dot-separated name parts.
fn parse_parts(input: &str) -> IResult<&str, Vec<String>> {
    separated_list1(delimited(multispace0, char('.'), multispace0), parse_part)(input)
}

/// Parse one part, quoted or bare.
fn parse_part(input: &str) -> IResult<&str, String> {
    alt((parse_quoted, map(parse_bare, |s: &str| s.to_string())))(input)
}

/// Parse a bare identifier.
fn parse_bare(input: &str) -> IResult<&str, &str> {
    verify(
        take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
        |s: &str| !s.starts_with(|c: char| c.is_ascii_digit() || c == '$'),
    )(input)
}

/// Parse a double-quoted identifier, unescaping `""`.
fn parse_quoted(input: &str) -> IResult<&str, String> {
    verify(
        delimited(
            char('"'),
            fold_many0(
                alt((map(is_not("\""), |s: &str| s.to_string()), map(tag("\"\""), |_| "\"".to_string()))),
                String::new,
                |mut acc, piece| {
                    acc.push_str(&piece);
                    acc
                },
            ),
            char('"'),
        ),
        |s: &String| !s.is_empty(),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_relation() {
        let rel = Relation::parse("svv_table_info").unwrap();
        assert_eq!(rel, Relation::bare("svv_table_info"));
        assert_eq!(rel.to_string(), "svv_table_info");
    }

    #[test]
    fn test_fully_qualified() {
        let rel = Relation::parse("analytics.public.orders").unwrap();
        assert_eq!(rel.database.as_deref(), Some("analytics"));
        assert_eq!(rel.schema.as_deref(), Some("public"));
        assert_eq!(rel.identifier, "orders");
    }

    #[test]
    fn test_quoted_parts() {
        let rel = Relation::parse(r#""My Schema"."Order ""Lines""""#).unwrap();
        assert_eq!(rel.schema.as_deref(), Some("My Schema"));
        assert_eq!(rel.identifier, "Order \"Lines\"");
        assert_eq!(rel.to_string(), r#""My Schema"."Order ""Lines""""#);
    }

    #[test]
    fn test_whitespace_around_dots() {
        let rel = Relation::parse("public . orders").unwrap();
        assert_eq!(rel, Relation::bare("orders").with_schema("public"));
    }

    #[test]
    fn test_too_many_parts() {
        let err = Relation::parse("a.b.c.d").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn test_trailing_garbage() {
        let err = Relation::parse("public.orders;drop").unwrap_err();
        assert!(err.to_string().contains("Unexpected trailing content"));
    }

    #[test]
    fn test_empty_quoted_rejected() {
        assert!(Relation::parse(r#""""#).is_err());
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("orders"), "orders");
        assert_eq!(quote_ident("Orders"), "\"Orders\"");
        assert_eq!(quote_ident("1st"), "\"1st\"");
    }
}
