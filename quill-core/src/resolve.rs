use crate::{
    Condition, Descriptor, Dialect, Error, Field, FieldValue, Result, Segment, Structural, Value,
    WhereOp, tokenize, truncate_long, try_separated_by,
};
use std::{
    collections::HashMap,
    fmt::{self, Display},
};

/// Driver ready SQL with its positional arguments, in marker order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    pub sql: String,
    pub arguments: Vec<Value>,
}

impl Display for ResolvedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}

struct Buckets<'d> {
    named: HashMap<&'d str, &'d Descriptor>,
    fields: Vec<&'d Field>,
    conditions: Vec<&'d WhereOp>,
}

impl<'d> Buckets<'d> {
    fn new(descriptors: &'d [Descriptor]) -> Self {
        let mut result = Self {
            named: HashMap::new(),
            fields: Vec::new(),
            conditions: Vec::new(),
        };
        for descriptor in descriptors {
            match descriptor {
                // Last one wins on duplicate names
                Descriptor::Param { name, .. } | Descriptor::ParamSql { name, .. } => {
                    result.named.insert(name, descriptor);
                }
                Descriptor::Field(v) => result.fields.push(v),
                Descriptor::Where(v) => result.conditions.push(v),
            }
        }
        result
    }
}

struct Output<'a, D: Dialect + ?Sized> {
    dialect: &'a D,
    sql: String,
    arguments: Vec<Value>,
}

impl<D: Dialect + ?Sized> Output<'_, D> {
    fn bind(out: &mut String, arguments: &mut Vec<Value>, dialect: &D, value: &Value) {
        dialect.write_marker(out, arguments.len());
        arguments.push(value.clone());
    }

    fn write_field_value(&mut self, out: &mut String, field: &Field) {
        match &field.value {
            FieldValue::Bound(value) => Self::bind(out, &mut self.arguments, self.dialect, value),
            FieldValue::Sql(sql) => out.push_str(sql),
        }
    }

    fn write_named(&mut self, buckets: &Buckets, name: &str) -> Result<()> {
        match buckets.named.get(name) {
            Some(Descriptor::Param { value, .. }) => {
                Self::bind(&mut self.sql, &mut self.arguments, self.dialect, value)
            }
            Some(Descriptor::ParamSql { sql, .. }) => self.sql.push_str(sql),
            _ => return Err(Error::UnresolvedPlaceholder(name.to_owned())),
        }
        Ok(())
    }

    fn write_structural(&mut self, buckets: &Buckets, kind: Structural) -> Result<()> {
        if kind != Structural::Where && buckets.fields.is_empty() {
            return Err(Error::EmptyStructuralExpansion(kind));
        }
        let mut out = std::mem::take(&mut self.sql);
        let result = match kind {
            Structural::Where => self.write_where(&mut out, &buckets.conditions),
            Structural::Fields => try_separated_by(
                &mut out,
                buckets.fields.iter(),
                |out, v| self.dialect.write_identifier(out, &v.name),
                ", ",
            ),
            Structural::Values => {
                for (i, field) in buckets.fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_field_value(&mut out, field);
                }
                Ok(())
            }
            Structural::FieldsEqValues => {
                buckets.fields.iter().enumerate().try_for_each(|(i, field)| {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.dialect.write_identifier(&mut out, &field.name)?;
                    out.push_str(" = ");
                    self.write_field_value(&mut out, field);
                    Ok(())
                })
            }
        };
        self.sql = out;
        result
    }

    fn write_where(&mut self, out: &mut String, conditions: &[&WhereOp]) -> Result<()> {
        if conditions.is_empty() {
            out.push_str("TRUE");
            return Ok(());
        }
        for (i, condition) in conditions.iter().enumerate() {
            if i > 0 {
                out.push_str(" AND ");
            }
            self.dialect.write_identifier(out, &condition.field)?;
            match &condition.condition {
                Condition::IsNull => out.push_str(" IS NULL"),
                Condition::IsNotNull => out.push_str(" IS NOT NULL"),
                Condition::Compare(comparison, value) => {
                    out.push(' ');
                    out.push_str(comparison.operator());
                    out.push(' ');
                    Self::bind(out, &mut self.arguments, self.dialect, value);
                }
            }
        }
        Ok(())
    }
}

/// Turns tokenized segments plus descriptors into SQL and ordered arguments.
///
/// Arguments are pushed in the exact order their markers are written, which
/// keeps them aligned even when `{fields}` and `{values}` are far apart.
/// Descriptors no placeholder asks for are ignored.
pub fn resolve<D: Dialect + ?Sized>(
    dialect: &D,
    segments: &[Segment<'_>],
    descriptors: &[Descriptor],
) -> Result<ResolvedQuery> {
    let buckets = Buckets::new(descriptors);
    let mut output = Output {
        dialect,
        sql: String::with_capacity(segments.iter().map(segment_len).sum()),
        arguments: Vec::new(),
    };
    for segment in segments {
        match segment {
            Segment::Literal(text) => output.sql.push_str(text),
            Segment::Named(name) => output.write_named(&buckets, name)?,
            Segment::Structural(kind) => output.write_structural(&buckets, *kind)?,
        }
    }
    Ok(ResolvedQuery {
        sql: output.sql,
        arguments: output.arguments,
    })
}

/// [`tokenize`] followed by [`resolve`].
pub fn resolve_template<D: Dialect + ?Sized>(
    dialect: &D,
    template: &str,
    descriptors: &[Descriptor],
) -> Result<ResolvedQuery> {
    resolve(dialect, &tokenize(template), descriptors).inspect_err(|e| {
        log::warn!("{:#}\nWhile resolving the template:\n{}", e, truncate_long!(template));
    })
}

fn segment_len(segment: &Segment) -> usize {
    match segment {
        Segment::Literal(v) => v.len(),
        Segment::Named(..) => 4,
        Segment::Structural(..) => 32,
    }
}
