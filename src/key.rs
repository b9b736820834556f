//! Parsing of the `group`, `group@pkg`, `group@pkg:pkg2`, `group@:pkg2` key forms
//! shared by override parsing (§6) and defaults-list header parsing (§6 "Header
//! format contract").

/// Split a key of the form `group`, `group@pkg`, `group@:pkg2`, or
/// `group@pkg:pkg2` into `(group, package, package2)`.
pub fn split_key(key: &str) -> (&str, Option<&str>, Option<&str>) {
    match key.split_once('@') {
        None => (key, None, None),
        Some((group, rest)) => match rest.split_once(':') {
            Some((pkg, pkg2)) => {
                let pkg = if pkg.is_empty() { None } else { Some(pkg) };
                (group, pkg, Some(pkg2))
            }
            None => (group, Some(rest), None),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_group() {
        assert_eq!(split_key("db"), ("db", None, None));
    }

    #[test]
    fn group_with_package() {
        assert_eq!(split_key("db@local"), ("db", Some("local"), None));
    }

    #[test]
    fn group_with_rename_from_default() {
        assert_eq!(split_key("db@:dest"), ("db", None, Some("dest")));
    }

    #[test]
    fn group_with_package_and_rename() {
        assert_eq!(split_key("db@local:dest"), ("db", Some("local"), Some("dest")));
    }
}
