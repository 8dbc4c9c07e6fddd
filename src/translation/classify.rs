//! Textual statement classification.
//!
//! Every keyword and pattern used to decide how a statement is executed lives in this file.
//! Inspection runs on literal-masked text, so keywords inside strings or comments never count.

use std::sync::LazyLock;

use regex::Regex;

use super::scanner::mask_literals;

/// Bare transaction-control statements, optionally terminated by `;`.
static TRANSACTION_CONTROL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^\s*(?:
            (?P<begin>BEGIN(?:\s+(?:DEFERRED|IMMEDIATE|EXCLUSIVE))?(?:\s+TRANSACTION)?
                |START\s+TRANSACTION)
            |(?P<commit>(?:COMMIT|END)(?:\s+TRANSACTION)?)
            |(?P<rollback>ROLLBACK(?:\s+TRANSACTION)?)
        )\s*;?\s*$",
    )
    .expect("transaction-control pattern is valid")
});

static RETURNING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bRETURNING\b").expect("RETURNING pattern is valid"));

static DML_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:INSERT|UPDATE|DELETE|REPLACE)\b").expect("DML pattern is valid")
});

/// Leading keywords of statements that always produce rows.
const READ_KEYWORDS: &[&str] = &["SELECT", "VALUES", "PRAGMA", "EXPLAIN", "SHOW", "TABLE"];

/// Leading keyword whose kind is decided by the statement after its definition list.
const CTE_KEYWORD: &str = "WITH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionControl {
    Begin,
    Commit,
    Rollback,
}

/// How a statement is executed and how its `row_count` is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    TransactionControl(TransactionControl),
    MutatingReturning,
    Mutating,
    Query,
}

impl StatementKind {
    /// Whether the engine's fetch-all-rows path must be used.
    #[must_use]
    pub fn returns_rows(self) -> bool {
        matches!(self, StatementKind::Query | StatementKind::MutatingReturning)
    }
}

/// Classify a (trimmed or untrimmed) SQL statement.
#[must_use]
pub fn classify(sql: &str) -> StatementKind {
    let masked = mask_literals(sql);

    if let Some(caps) = TRANSACTION_CONTROL.captures(&masked) {
        let control = if caps.name("begin").is_some() {
            TransactionControl::Begin
        } else if caps.name("commit").is_some() {
            TransactionControl::Commit
        } else {
            TransactionControl::Rollback
        };
        return StatementKind::TransactionControl(control);
    }

    let keyword = leading_keyword(&masked).to_ascii_uppercase();
    let is_read = if keyword == CTE_KEYWORD {
        match cte_body_keyword(&masked) {
            Some(body) => READ_KEYWORDS.contains(&body.as_str()),
            // unbalanced text; the engine will reject it either way
            None => !DML_VERB.is_match(&masked),
        }
    } else {
        READ_KEYWORDS.contains(&keyword.as_str())
    };

    if is_read {
        StatementKind::Query
    } else if RETURNING.is_match(&masked) {
        StatementKind::MutatingReturning
    } else {
        StatementKind::Mutating
    }
}

/// Keyword starting the statement that follows a `WITH` list: the first word after a
/// top-level `)` that is neither `AS` (a column list) nor a `,` (another definition).
fn cte_body_keyword(masked: &str) -> Option<String> {
    let mut depth = 0usize;
    for (idx, b) in masked.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth > 0 {
                    continue;
                }
                let word = leading_keyword(&masked[idx + 1..]);
                if !word.is_empty() && !word.eq_ignore_ascii_case("AS") {
                    return Some(word.to_ascii_uppercase());
                }
            }
            _ => {}
        }
    }
    None
}

fn leading_keyword(masked: &str) -> &str {
    let rest = masked.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    &rest[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_keywords() {
        use TransactionControl::*;
        for (sql, expected) in [
            ("BEGIN", Begin),
            ("begin transaction;", Begin),
            ("BEGIN IMMEDIATE", Begin),
            ("START TRANSACTION", Begin),
            ("COMMIT", Commit),
            ("end", Commit),
            ("ROLLBACK;", Rollback),
        ] {
            assert_eq!(
                classify(sql),
                StatementKind::TransactionControl(expected),
                "{sql}"
            );
        }
    }

    #[test]
    fn rollback_to_savepoint_is_not_bare() {
        assert_eq!(classify("ROLLBACK TO SAVEPOINT s1"), StatementKind::Mutating);
    }

    #[test]
    fn reads_and_mutations() {
        assert_eq!(classify("SELECT 1"), StatementKind::Query);
        assert_eq!(classify("  (select 1)"), StatementKind::Query);
        assert_eq!(
            classify("WITH m AS (SELECT 1) SELECT * FROM m"),
            StatementKind::Query
        );
        assert_eq!(
            classify("WITH m AS (SELECT 1) DELETE FROM t WHERE id IN m"),
            StatementKind::Mutating
        );
        assert_eq!(classify("PRAGMA table_info(t)"), StatementKind::Query);
        assert_eq!(
            classify("UPDATE t SET x=$1 WHERE id=$2"),
            StatementKind::Mutating
        );
        assert_eq!(
            classify("insert into t (a) values ($1) returning id"),
            StatementKind::MutatingReturning
        );
        assert_eq!(classify("CREATE TABLE t (a)"), StatementKind::Mutating);
    }

    #[test]
    fn cte_kind_follows_the_main_statement() {
        assert_eq!(
            classify(
                "WITH v AS (SELECT REPLACE(vendor, '-', ' ') AS vendor FROM transactions) \
                 SELECT vendor FROM v"
            ),
            StatementKind::Query
        );
        assert_eq!(
            classify("WITH a AS (SELECT 1), b(n) AS (SELECT 2) SELECT * FROM a, b"),
            StatementKind::Query
        );
        assert_eq!(
            classify(
                "WITH RECURSIVE r(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM r WHERE n < 3) \
                 SELECT n FROM r"
            ),
            StatementKind::Query
        );
        assert_eq!(
            classify("WITH s AS (SELECT 1 AS id) UPDATE t SET x = 1 WHERE id IN (SELECT id FROM s)"),
            StatementKind::Mutating
        );
        assert_eq!(
            classify("WITH s AS (SELECT 1) INSERT INTO t SELECT * FROM s RETURNING id"),
            StatementKind::MutatingReturning
        );
    }

    #[test]
    fn returning_inside_literal_does_not_count() {
        assert_eq!(
            classify("UPDATE t SET note = 'returning soon' WHERE id = $1"),
            StatementKind::Mutating
        );
        assert_eq!(
            classify("DELETE FROM t -- RETURNING id\n WHERE id = 1"),
            StatementKind::Mutating
        );
    }

    #[test]
    fn select_mentioning_returning_column_stays_a_read() {
        assert_eq!(classify("SELECT returning FROM t"), StatementKind::Query);
    }
}
