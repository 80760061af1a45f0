//! Constraint checks shared by the leaf converters.
//!
//! Ordered types check up to four bounds (`le`/`max`, `ge`/`min`, `lt`, `gt`)
//! in that order, each bound parsed with the type's own parser. Strings and
//! URL components check regular expressions. A constraint that does not
//! parse is reported as [`ScanfigError::InvalidConstraint`].

use regex::Regex;

use crate::error::ScanfigError;
use crate::types::{Bound, Tags};

/// Check `value` against every bound declared in `tags`.
///
/// `parse` reads a bound written in the value's own text form; `render`
/// prints values and bounds in messages.
pub fn check_bounds<T: PartialOrd>(
    value: &T,
    tags: &Tags,
    type_name: &str,
    parse: impl Fn(&str) -> Option<T>,
    render: impl Fn(&T) -> String,
) -> Result<(), ScanfigError> {
    for bound in Bound::ALL {
        let Some((key, text)) = tags.bound(bound) else {
            continue;
        };
        let limit = parse(text).ok_or_else(|| {
            ScanfigError::invalid_constraint(key, text, format!("not a valid {type_name}"))
        })?;
        if !bound.holds(value, &limit) {
            let value = render(value);
            let message = format!("{value} is not {} {}", bound.describe(), render(&limit));
            return Err(ScanfigError::validation(value, message));
        }
    }
    Ok(())
}

/// Compile the pattern stored under `tag`, if any.
pub fn pattern(tags: &Tags, tag: &str) -> Result<Option<Regex>, ScanfigError> {
    let Some(source) = tags.get(tag) else {
        return Ok(None);
    };
    Regex::new(source)
        .map(Some)
        .map_err(|err| ScanfigError::invalid_constraint(tag, source, err.to_string()))
}

/// Require `text` to contain a match of the pattern under `tag`.
///
/// `shown` is the value as it appears in the error message.
pub fn check_pattern(tags: &Tags, tag: &str, text: &str, shown: &str) -> Result<(), ScanfigError> {
    let Some(re) = pattern(tags, tag)? else {
        return Ok(());
    };
    if re.is_match(text) {
        Ok(())
    } else {
        Err(ScanfigError::validation(
            shown,
            format!("'{text}' did not match regular expression '{}'", re.as_str()),
        ))
    }
}

/// Split a comma-separated list into allowed and denied (`!`-prefixed)
/// entries. Blank entries are ignored.
pub fn allow_deny(list: &str) -> (Vec<&str>, Vec<&str>) {
    let mut allow = Vec::new();
    let mut deny = Vec::new();
    for entry in list.split(',').map(str::trim) {
        match entry.strip_prefix('!').map(str::trim) {
            Some("") => {}
            Some(denied) => deny.push(denied),
            None if entry.is_empty() => {}
            None => allow.push(entry),
        }
    }
    (allow, deny)
}
