use crate::Value;
use std::borrow::Cow;

/// Typed parameter handed to a template out of band.
///
/// Build them with [`param`], [`param_sql`], [`field`], [`field_sql`] and the
/// `where_*` functions rather than by hand.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    /// Bound at every `$name` occurrence.
    Param {
        name: Cow<'static, str>,
        value: Value,
    },
    /// Replaces every `$name` occurrence with the raw expression, nothing is bound.
    ParamSql {
        name: Cow<'static, str>,
        sql: Cow<'static, str>,
    },
    /// Column for `{fields}`, `{values}` and `{fields=values}`.
    Field(Field),
    /// Conjunct of `{where}`.
    Where(WhereOp),
}

/// A column assignment, either bound or computed by a raw SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Cow<'static, str>,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bound(Value),
    Sql(Cow<'static, str>),
}

/// A single `{where}` conjunct.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereOp {
    pub field: Cow<'static, str>,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    IsNull,
    IsNotNull,
    Compare(Comparison, Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub const fn operator(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "!=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }
}

impl From<Field> for Descriptor {
    fn from(value: Field) -> Self {
        Descriptor::Field(value)
    }
}

impl From<WhereOp> for Descriptor {
    fn from(value: WhereOp) -> Self {
        Descriptor::Where(value)
    }
}

pub fn param(name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Descriptor {
    Descriptor::Param {
        name: name.into(),
        value: value.into(),
    }
}

pub fn param_sql(
    name: impl Into<Cow<'static, str>>,
    sql: impl Into<Cow<'static, str>>,
) -> Descriptor {
    Descriptor::ParamSql {
        name: name.into(),
        sql: sql.into(),
    }
}

pub fn field(name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Field {
    Field {
        name: name.into(),
        value: FieldValue::Bound(value.into()),
    }
}

pub fn field_sql(name: impl Into<Cow<'static, str>>, sql: impl Into<Cow<'static, str>>) -> Field {
    Field {
        name: name.into(),
        value: FieldValue::Sql(sql.into()),
    }
}

pub fn where_null(field: impl Into<Cow<'static, str>>) -> WhereOp {
    WhereOp {
        field: field.into(),
        condition: Condition::IsNull,
    }
}

pub fn where_not_null(field: impl Into<Cow<'static, str>>) -> WhereOp {
    WhereOp {
        field: field.into(),
        condition: Condition::IsNotNull,
    }
}

macro_rules! where_compare {
    ($($name:ident => $comparison:ident),+ $(,)?) => {
        $(
            pub fn $name(field: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> WhereOp {
                WhereOp {
                    field: field.into(),
                    condition: Condition::Compare(Comparison::$comparison, value.into()),
                }
            }
        )+
    };
}

where_compare!(
    where_eq => Eq,
    where_ne => Ne,
    where_gt => Gt,
    where_gte => Gte,
    where_lt => Lt,
    where_lte => Lte,
);

/// Collects heterogeneous descriptors into a `Vec<Descriptor>`.
///
/// ```rust
/// use quill_core::{descriptors, param, where_gt};
/// let list = descriptors![param("id", 7), where_gt("age", 30)];
/// assert_eq!(list.len(), 2);
/// ```
#[macro_export]
macro_rules! descriptors {
    () => {
        ::std::vec::Vec::<$crate::Descriptor>::new()
    };
    ($($descriptor:expr),+ $(,)?) => {
        ::std::vec![$(::std::convert::Into::<$crate::Descriptor>::into($descriptor)),+]
    };
}
