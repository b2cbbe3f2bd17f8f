use crate::consume_while;
use std::fmt::{self, Display};

/// Placeholder expanded from a bucket of descriptors rather than a single one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Structural {
    /// `{where}`
    Where,
    /// `{fields}`
    Fields,
    /// `{values}`
    Values,
    /// `{fields=values}`
    FieldsEqValues,
}

impl Structural {
    pub const ALL: [Structural; 4] = [
        Structural::Where,
        Structural::Fields,
        Structural::Values,
        Structural::FieldsEqValues,
    ];

    /// The exact token, braces included.
    pub const fn token(&self) -> &'static str {
        match self {
            Structural::Where => "{where}",
            Structural::Fields => "{fields}",
            Structural::Values => "{values}",
            Structural::FieldsEqValues => "{fields=values}",
        }
    }
}

impl Display for Structural {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A piece of a tokenized template. Literal text borrows from the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'t> {
    Literal(&'t str),
    /// `$name`, holding the name without the dollar sign.
    Named(&'t str),
    Structural(Structural),
}

/// Splits a template into literal text and placeholders.
///
/// Total for any input: a `$` not followed by an identifier start
/// (`[A-Za-z_]`) and a `{` not starting one of the four structural tokens are
/// kept as literal text, so `$1`, `$$` or JSON-looking braces pass through.
/// Adjacent literal text is merged into one segment and reproduced byte for byte.
pub fn tokenize(template: &str) -> Vec<Segment<'_>> {
    let mut result = Vec::new();
    let mut literal_start = 0;
    let mut position = 0;
    let bytes = template.as_bytes();
    while position < bytes.len() {
        let placeholder = match bytes[position] {
            b'$' => {
                let mut rest = &template[position + 1..];
                if rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
                    let name = consume_while(&mut rest, |c| c.is_ascii_alphanumeric() || c == '_');
                    Some((Segment::Named(name), 1 + name.len()))
                } else {
                    None
                }
            }
            b'{' => Structural::ALL
                .into_iter()
                .find(|v| template[position..].starts_with(v.token()))
                .map(|v| (Segment::Structural(v), v.token().len())),
            _ => None,
        };
        match placeholder {
            Some((segment, len)) => {
                if literal_start < position {
                    result.push(Segment::Literal(&template[literal_start..position]));
                }
                result.push(segment);
                position += len;
                literal_start = position;
            }
            None => position += 1,
        }
    }
    if literal_start < template.len() {
        result.push(Segment::Literal(&template[literal_start..]));
    }
    result
}
