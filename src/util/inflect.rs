//! Name inflection helpers.
//!
//! Wire names use dashes (`registered-date`); parsed directives use lower
//! camel case (`registeredDate`), matching the accessor names declared in
//! resource metadata.

/// Converts a dashed or underscored name to lower camel case.
///
/// The first segment is kept as-is; each following segment has its first
/// character uppercased. Names already in camel case pass through
/// unchanged.
///
/// # Example
///
/// ```rust
/// use jsonapi_pipeline::util::inflect::camelize;
///
/// assert_eq!(camelize("registered-date"), "registeredDate");
/// assert_eq!(camelize("user_groups"), "userGroups");
/// assert_eq!(camelize("surname"), "surname");
/// ```
#[must_use]
pub fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for (i, segment) in name.split(['-', '_']).enumerate() {
        if segment.is_empty() {
            continue;
        }

        if i == 0 {
            out.push_str(segment);
        } else {
            let mut chars = segment.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }

    out
}
