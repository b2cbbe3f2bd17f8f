/// Writes every item through `f`, putting `separator` between items that wrote something.
pub fn try_separated_by<T, E, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) -> Result<(), E>
where
    F: FnMut(&mut String, T) -> Result<(), E>,
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v)?;
    }
    Ok(())
}

/// Splits off the longest prefix whose chars satisfy `predicate`.
pub fn consume_while<'s>(input: &mut &'s str, mut predicate: impl FnMut(char) -> bool) -> &'s str {
    let len = input
        .char_indices()
        .find(|(_, c)| !predicate(*c))
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    let (result, rest) = input.split_at(len);
    *input = rest;
    result
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            &$query[..$crate::floor_char_boundary(&$query, 497)].trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

/// Largest char boundary of `value` not exceeding `index`.
#[doc(hidden)]
pub fn floor_char_boundary(value: &str, index: usize) -> usize {
    if index >= value.len() {
        return value.len();
    }
    (0..=index)
        .rev()
        .find(|i| value.is_char_boundary(*i))
        .unwrap_or(0)
}
