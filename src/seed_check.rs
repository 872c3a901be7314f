// Seed script compatibility check against the live catalog
use crate::ddl::RelationSet;
use crate::error::ExportResult;
use crate::types::TableDescriptor;
use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, GenericDialect, MsSqlDialect, PostgreSqlDialect};
use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::{Token, Tokenizer};
use std::fmt;

/// SQL flavour the seed script is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedDialect {
    #[default]
    Generic,
    Postgres,
    MsSql,
}

impl SeedDialect {
    fn dialect(&self) -> Box<dyn Dialect> {
        match self {
            SeedDialect::Generic => Box::new(GenericDialect {}),
            SeedDialect::Postgres => Box::new(PostgreSqlDialect {}),
            SeedDialect::MsSql => Box::new(MsSqlDialect {}),
        }
    }
}

/// Target and column list of one `INSERT INTO` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInsert {
    pub schema: Option<String>,
    pub table: String,
    pub columns: Vec<String>,
}

/// One statement of a seed script, as far as the check is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedStatement {
    Insert(SeedInsert),
    /// Parsed, but not an INSERT
    Other,
    /// The dialect could not parse it; `statement` holds its leading words
    Unparsed { statement: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedFinding {
    TableFound { table: String },
    MissingTable { table: String, suggestion: Option<String> },
    MissingColumn { table: String, column: String },
    Skipped { statement: String, reason: String },
}

impl SeedFinding {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            SeedFinding::MissingTable { .. } | SeedFinding::MissingColumn { .. }
        )
    }
}

impl fmt::Display for SeedFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedFinding::TableFound { table } => write!(f, "Table '{}' exists", table),
            SeedFinding::MissingTable { table, suggestion: Some(similar) } => write!(
                f,
                "Table '{}' does not exist in the database (did you mean '{}'?)",
                table, similar
            ),
            SeedFinding::MissingTable { table, suggestion: None } => {
                write!(f, "Table '{}' does not exist in the database", table)
            }
            SeedFinding::MissingColumn { table, column } => {
                write!(f, "Column '{}' does not exist in table '{}'", column, table)
            }
            SeedFinding::Skipped { statement, reason } => {
                write!(f, "Skipped statement '{}': {}", statement, reason)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    pub insert_statements: usize,
    pub findings: Vec<SeedFinding>,
}

impl SeedReport {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(SeedFinding::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &SeedFinding> {
        self.findings.iter().filter(|f| f.is_error())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SeedFinding> {
        self.findings
            .iter()
            .filter(|f| matches!(f, SeedFinding::Skipped { .. }))
    }
}

/// Split a seed script into statements and parse each one on its own.
///
/// Batches are separated by `GO` lines and statements by `;`. A statement
/// the dialect cannot parse is returned as [`SeedStatement::Unparsed`] and
/// the rest of its batch chunk is skipped with it; other statements are
/// unaffected. Only a script that cannot be tokenized at all is an error.
pub fn scan_seed(sql: &str, dialect: SeedDialect) -> ExportResult<Vec<SeedStatement>> {
    let dialect = dialect.dialect();
    let mut statements = Vec::new();

    for batch in split_batches(sql) {
        let tokens = Tokenizer::new(dialect.as_ref(), &batch)
            .tokenize()
            .map_err(|e| ParserError::TokenizerError(e.to_string()))?;

        for chunk in tokens.split(|token| *token == Token::SemiColon) {
            parse_chunk(dialect.as_ref(), chunk, &mut statements);
        }
    }

    Ok(statements)
}

/// Every INSERT target of a seed script, in file order
pub fn collect_inserts(sql: &str, dialect: SeedDialect) -> ExportResult<Vec<SeedInsert>> {
    Ok(scan_seed(sql, dialect)?
        .into_iter()
        .filter_map(|statement| match statement {
            SeedStatement::Insert(insert) => Some(insert),
            _ => None,
        })
        .collect())
}

fn split_batches(sql: &str) -> Vec<String> {
    let mut batches = vec![String::new()];
    for line in sql.lines() {
        if line.trim().eq_ignore_ascii_case("go") {
            batches.push(String::new());
            continue;
        }
        if let Some(batch) = batches.last_mut() {
            batch.push_str(line);
            batch.push('\n');
        }
    }
    batches
}

fn parse_chunk(dialect: &dyn Dialect, chunk: &[Token], statements: &mut Vec<SeedStatement>) {
    let mut parser = Parser::new(dialect).with_tokens(chunk.to_vec());

    // T-SQL allows statements without a terminating semicolon
    while parser.peek_token().token != Token::EOF {
        match parser.parse_statement() {
            Ok(statement) => statements.push(seed_statement(statement)),
            Err(e) => {
                statements.push(SeedStatement::Unparsed {
                    statement: leading_words(chunk),
                    reason: e.to_string(),
                });
                return;
            }
        }
    }
}

fn seed_statement(statement: Statement) -> SeedStatement {
    let Statement::Insert {
        table_name, columns, ..
    } = statement
    else {
        return SeedStatement::Other;
    };

    let mut parts: Vec<String> = table_name.0.into_iter().map(|ident| ident.value).collect();
    match parts.pop() {
        Some(table) => SeedStatement::Insert(SeedInsert {
            schema: parts.pop(),
            table,
            columns: columns.into_iter().map(|ident| ident.value).collect(),
        }),
        None => SeedStatement::Other,
    }
}

fn leading_words(chunk: &[Token]) -> String {
    chunk
        .iter()
        .filter(|token| !matches!(token, Token::Whitespace(_)))
        .take(3)
        .map(|token| token.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check every INSERT of a seed script against the tables in `relations`.
///
/// A schema-qualified target must match schema and table; a bare name
/// matches the table in any schema. Statements the dialect cannot parse are
/// reported as skipped and do not fail the check.
pub fn verify_seed(sql: &str, dialect: SeedDialect, relations: &RelationSet) -> ExportResult<SeedReport> {
    let mut report = SeedReport::default();

    for statement in scan_seed(sql, dialect)? {
        let insert = match statement {
            SeedStatement::Insert(insert) => insert,
            SeedStatement::Other => continue,
            SeedStatement::Unparsed { statement, reason } => {
                report.findings.push(SeedFinding::Skipped { statement, reason });
                continue;
            }
        };
        report.insert_statements += 1;

        let display_name = match &insert.schema {
            Some(schema) => format!("{}.{}", schema, insert.table),
            None => insert.table.clone(),
        };

        let Some(table) = find_table(relations, &insert) else {
            report.findings.push(SeedFinding::MissingTable {
                suggestion: suggest_table(relations, &insert.table),
                table: display_name,
            });
            continue;
        };

        report.findings.push(SeedFinding::TableFound {
            table: display_name.clone(),
        });
        for column in &insert.columns {
            if !table.columns.iter().any(|c| &c.column == column) {
                report.findings.push(SeedFinding::MissingColumn {
                    table: display_name.clone(),
                    column: column.clone(),
                });
            }
        }
    }

    Ok(report)
}

fn find_table<'r>(relations: &'r RelationSet, insert: &SeedInsert) -> Option<&'r TableDescriptor> {
    relations.tables().iter().find(|t| {
        t.id.table == insert.table
            && insert.schema.as_ref().map_or(true, |schema| &t.id.schema == schema)
    })
}

/// First catalog table whose name is a case-insensitive prefix of the seed name or vice versa
fn suggest_table(relations: &RelationSet, table: &str) -> Option<String> {
    let wanted = table.to_lowercase();
    relations
        .tables()
        .iter()
        .map(|t| &t.id.table)
        .find(|candidate| {
            let candidate = candidate.to_lowercase();
            candidate.starts_with(&wanted) || wanted.starts_with(&candidate)
        })
        .cloned()
}
