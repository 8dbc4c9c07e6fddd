//! Engine-specific SQL fragments.
//!
//! Callers write one statement with `$N` placeholders and splice these fragments into it; the
//! fragment text is the only place the two engines' SQL differs. Nothing here fails: unknown
//! units, fields, and format tokens degrade to a safe default.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::translation::PlaceholderStyle;

/// Column flagging transactions that belong to a pikadon (fixed-term deposit) movement.
pub const PIKADON_FLAG_COLUMN: &str = "is_pikadon_related";

/// The SQL dialect selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Embedded single-file engine (`SQLite`).
    Sqlite,
    /// Client-server engine (`PostgreSQL`).
    Postgres,
}

/// Truncation units understood by [`Dialect::date_trunc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl DateUnit {
    #[must_use]
    pub fn parse(unit: &str) -> Option<Self> {
        match unit.trim().to_ascii_lowercase().as_str() {
            "minute" => Some(Self::Minute),
            "hour" => Some(Self::Hour),
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "quarter" => Some(Self::Quarter),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

/// Numeric fields understood by [`Dialect::extract`], with the `strftime` specifier SQLite uses.
const EXTRACT_FIELDS: &[(&str, &str)] = &[
    ("year", "%Y"),
    ("month", "%m"),
    ("day", "%d"),
    ("dow", "%w"),
    ("doy", "%j"),
    ("week", "%W"),
    ("hour", "%H"),
    ("minute", "%M"),
    ("second", "%S"),
    ("epoch", "%s"),
];

/// `to_char` tokens and their `strftime` equivalents, longest first.
const FORMAT_TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("HH24", "%H"),
    ("HH12", "%I"),
    ("DDD", "%j"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("MI", "%M"),
    ("SS", "%S"),
    ("IW", "%W"),
];

impl Dialect {
    #[must_use]
    pub fn placeholder_style(self) -> PlaceholderStyle {
        match self {
            Dialect::Sqlite => PlaceholderStyle::Sqlite,
            Dialect::Postgres => PlaceholderStyle::Postgres,
        }
    }

    /// Truncate a date/timestamp expression to the start of `unit`.
    ///
    /// Weeks start on Monday in both engines. Unknown units fall back to the bare date.
    #[must_use]
    pub fn date_trunc(self, unit: &str, column: &str) -> String {
        let Some(unit) = DateUnit::parse(unit) else {
            return self.bare_date(column);
        };
        match self {
            Dialect::Postgres => format!("DATE_TRUNC('{}', {column})", unit.as_str()),
            Dialect::Sqlite => match unit {
                DateUnit::Minute => format!("strftime('%Y-%m-%d %H:%M:00', {column})"),
                DateUnit::Hour => format!("strftime('%Y-%m-%d %H:00:00', {column})"),
                DateUnit::Day => format!("date({column})"),
                // next Sunday (or today if Sunday), then back to that week's Monday
                DateUnit::Week => format!("date({column}, 'weekday 0', '-6 days')"),
                DateUnit::Month => format!("date({column}, 'start of month')"),
                DateUnit::Quarter => format!(
                    "date({column}, 'start of month', '-' || \
                     ((CAST(strftime('%m', {column}) AS INTEGER) - 1) % 3) || ' months')"
                ),
                DateUnit::Year => format!("date({column}, 'start of year')"),
            },
        }
    }

    /// Format a date/timestamp expression with a `to_char`-style pattern such as `YYYY-MM`.
    #[must_use]
    pub fn to_char(self, column: &str, format: &str) -> String {
        match self {
            Dialect::Postgres => format!("TO_CHAR({column}, '{}')", escape_literal(format)),
            Dialect::Sqlite => format!(
                "strftime('{}', {column})",
                escape_literal(&strftime_pattern(format))
            ),
        }
    }

    /// Extract a numeric field as an integer. Unknown fields yield `NULL`.
    #[must_use]
    pub fn extract(self, field: &str, column: &str) -> String {
        let field = field.trim().to_ascii_lowercase();
        match self {
            Dialect::Postgres => {
                if field == "quarter" || EXTRACT_FIELDS.iter().any(|(name, _)| *name == field) {
                    format!("EXTRACT({} FROM {column})::int", field.to_ascii_uppercase())
                } else {
                    "NULL::int".to_owned()
                }
            }
            Dialect::Sqlite => {
                if field == "quarter" {
                    return format!(
                        "CAST((CAST(strftime('%m', {column}) AS INTEGER) + 2) / 3 AS INTEGER)"
                    );
                }
                match EXTRACT_FIELDS.iter().find(|(name, _)| *name == field) {
                    Some((_, spec)) => format!("CAST(strftime('{spec}', {column}) AS INTEGER)"),
                    None => "CAST(NULL AS INTEGER)".to_owned(),
                }
            }
        }
    }

    #[must_use]
    pub fn cast_numeric(self, column: &str) -> String {
        match self {
            Dialect::Sqlite => format!("CAST({column} AS REAL)"),
            Dialect::Postgres => format!("({column})::numeric"),
        }
    }

    /// Case-insensitive `LIKE` between an expression and a literal or placeholder.
    ///
    /// SQLite's `LIKE` only folds ASCII, so both sides are lowered explicitly.
    #[must_use]
    pub fn like_insensitive(self, column: &str, literal: &str) -> String {
        match self {
            Dialect::Sqlite => format!("LOWER({column}) LIKE LOWER({literal})"),
            Dialect::Postgres => format!("{column} ILIKE {literal}"),
        }
    }

    /// Predicate keeping rows whose pikadon flag is unset or false. Same text for both engines.
    ///
    /// The flag column is an integer (`0`/`1`) on both engines. A PostgreSQL `BOOLEAN` column
    /// rejects the `= 0` comparison with a type error.
    #[must_use]
    pub fn exclude_pikadon(self, alias: &str) -> String {
        let alias = alias.trim().trim_end_matches('.');
        let column = if alias.is_empty() {
            PIKADON_FLAG_COLUMN.to_owned()
        } else {
            format!("{alias}.{PIKADON_FLAG_COLUMN}")
        };
        format!("({column} IS NULL OR {column} = 0)")
    }

    fn bare_date(self, column: &str) -> String {
        match self {
            Dialect::Sqlite => format!("date({column})"),
            Dialect::Postgres => format!("({column})::date"),
        }
    }
}

fn strftime_pattern(format: &str) -> String {
    let mut out = String::with_capacity(format.len() + 8);
    let mut rest = format;
    'outer: while let Some(c) = rest.chars().next() {
        for (token, spec) in FORMAT_TOKENS {
            if rest.starts_with(token) {
                out.push_str(spec);
                rest = &rest[token.len()..];
                continue 'outer;
            }
        }
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

fn escape_literal(text: &str) -> String {
    text.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_truncation() {
        let d = Dialect::Sqlite;
        assert_eq!(
            d.date_trunc("month", "created_at"),
            "date(created_at, 'start of month')"
        );
        assert!(d.date_trunc("week", "t.date").contains("'weekday 0'"));
        assert_eq!(d.date_trunc("year", "x"), "date(x, 'start of year')");
        assert_eq!(d.date_trunc("fortnight", "x"), "date(x)");
        assert_eq!(d.date_trunc("MONTH", "x"), "date(x, 'start of month')");
    }

    #[test]
    fn postgres_truncation() {
        let d = Dialect::Postgres;
        assert_eq!(
            d.date_trunc("month", "created_at"),
            "DATE_TRUNC('month', created_at)"
        );
        assert_eq!(d.date_trunc("fortnight", "x"), "(x)::date");
    }

    #[test]
    fn to_char_tokens() {
        assert_eq!(
            Dialect::Sqlite.to_char("t.date", "YYYY-MM"),
            "strftime('%Y-%m', t.date)"
        );
        assert_eq!(
            Dialect::Sqlite.to_char("d", "DD/MM/YY HH24:MI"),
            "strftime('%d/%m/%y %H:%M', d)"
        );
        assert_eq!(Dialect::Sqlite.to_char("d", "100%"), "strftime('100%%', d)");
        assert_eq!(
            Dialect::Postgres.to_char("t.date", "YYYY-MM"),
            "TO_CHAR(t.date, 'YYYY-MM')"
        );
    }

    #[test]
    fn extract_fields() {
        assert_eq!(
            Dialect::Sqlite.extract("dow", "d"),
            "CAST(strftime('%w', d) AS INTEGER)"
        );
        let quarter = Dialect::Sqlite.extract("quarter", "d");
        assert!(quarter.starts_with("CAST("));
        assert!(quarter.contains("strftime('%m', d)"));
        assert_eq!(Dialect::Sqlite.extract("century", "d"), "CAST(NULL AS INTEGER)");
        assert_eq!(
            Dialect::Postgres.extract("dow", "d"),
            "EXTRACT(DOW FROM d)::int"
        );
        assert_eq!(
            Dialect::Postgres.extract("quarter", "d"),
            "EXTRACT(QUARTER FROM d)::int"
        );
    }

    #[test]
    fn casts_and_matching() {
        assert_eq!(Dialect::Sqlite.cast_numeric("amount"), "CAST(amount AS REAL)");
        assert_eq!(Dialect::Postgres.cast_numeric("amount"), "(amount)::numeric");
        assert_eq!(
            Dialect::Sqlite.like_insensitive("t.name", "$1"),
            "LOWER(t.name) LIKE LOWER($1)"
        );
        assert_eq!(
            Dialect::Postgres.like_insensitive("t.name", "$1"),
            "t.name ILIKE $1"
        );
    }

    #[test]
    fn pikadon_predicate_is_dialect_neutral() {
        let expected = "(t.is_pikadon_related IS NULL OR t.is_pikadon_related = 0)";
        assert_eq!(Dialect::Sqlite.exclude_pikadon("t"), expected);
        assert_eq!(Dialect::Postgres.exclude_pikadon("t"), expected);
        assert_eq!(
            Dialect::Sqlite.exclude_pikadon(""),
            "(is_pikadon_related IS NULL OR is_pikadon_related = 0)"
        );
    }
}
