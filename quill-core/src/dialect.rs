use crate::{Error, Result};
use std::fmt::Write;

/// Checks that `name` is a plain identifier: ASCII letters, digits and
/// underscores, not empty and not made of digits only.
pub fn check_identifier(name: &str) -> Result<&str> {
    let allowed = !name.is_empty()
        && name.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'_')
        && !name.bytes().all(|c| c.is_ascii_digit());
    if allowed {
        Ok(name)
    } else {
        Err(Error::UnsafeIdentifier(name.to_owned()))
    }
}

/// SQL flavour of a backend: identifier quoting and positional markers.
pub trait Dialect: Send + Sync {
    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('`');
        self.write_escaped(out, value, '`', "``");
        out.push('`');
    }

    /// Validates then quotes a column name.
    fn write_identifier(&self, out: &mut String, value: &str) -> Result<()> {
        self.write_identifier_quoted(out, check_identifier(value)?);
        Ok(())
    }

    /// Validates then quotes a table name, `schema.table` is accepted and
    /// every part is quoted on its own.
    fn write_table_name(&self, out: &mut String, value: &str) -> Result<()> {
        let parts = value.split('.').collect::<Vec<_>>();
        if parts.len() > 2 {
            return Err(Error::UnsafeIdentifier(value.to_owned()));
        }
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            check_identifier(part).map_err(|_| Error::UnsafeIdentifier(value.to_owned()))?;
            self.write_identifier_quoted(out, part);
        }
        Ok(())
    }

    /// Writes the positional marker for the argument at `index` (from 0).
    fn write_marker(&self, out: &mut String, _index: usize) {
        out.push('?');
    }
}

/// Backticks and `?`, understood by MySQL, MariaDB and SQLite.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericDialect;

impl Dialect for GenericDialect {}

/// Double quotes and numbered `$1, $2, ...` markers.
#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    fn write_marker(&self, out: &mut String, index: usize) {
        let _ = write!(out, "${}", index + 1);
    }
}
