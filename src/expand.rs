//! §4.2 Element Expander: recursively expands one [`DefaultElement`] into its
//! subtree by walking the `defaults:` list of the config it names.

use crate::element::{DefaultElement, DefaultSpec, SkipReason};
use crate::error::ResolveError;
use crate::repository::ConfigRepository;

/// Recursively expand `e` against `repo`, returning the flattened pre-order
/// subtree described in §4.2. This is also the top-level `compute_element_defaults_list`
/// entry point from §6 — expanding the primary element *is* the whole operation
/// when there are no overrides.
pub fn expand_element(
    e: DefaultElement,
    repo: &dyn ConfigRepository,
    skip_missing: bool,
) -> Result<Vec<DefaultElement>, ResolveError> {
    // Step 1: terminal elements are returned as-is.
    if e.skip_load() || e.is_delete() {
        return Ok(vec![e]);
    }

    // Step 2: mandatory-missing sentinel.
    if e.is_missing() {
        let group = e.config_group().unwrap_or_default().to_string();
        if skip_missing {
            let mut e = e;
            e.set_skip(SkipReason::MissingSkipped);
            return Ok(vec![e]);
        }
        let options = repo.group_options(&group);
        return Err(ResolveError::mandatory_missing(group, options));
    }

    // Interpolation expressions are not yet loadable; resolution (and, in
    // principle, their own expansion) is deferred until after Phase D rewrites
    // `config_name` to a concrete choice.
    if e.is_interpolation() {
        return Ok(vec![e]);
    }

    let path = e
        .config_path()
        .ok_or_else(|| ResolveError::repository("element has no config_name to expand"))?;

    // Step 3: load the header, tolerating a missing config when optional.
    let header = match repo.load_header(&path) {
        Ok(h) => h,
        Err(ResolveError::ConfigNotFound { .. }) if e.is_optional() => {
            let mut e = e;
            e.set_skip(SkipReason::MissingOptionalConfig);
            return Ok(vec![e]);
        }
        Err(err) => return Err(err),
    };

    // Step 4: determine the _self_ slot.
    let self_positions: Vec<usize> = header
        .defaults
        .iter()
        .enumerate()
        .filter_map(|(i, spec)| matches!(spec, DefaultSpec::SelfRef).then_some(i))
        .collect();
    if self_positions.len() > 1 {
        return Err(ResolveError::duplicate_self(path));
    }
    let self_slot = self_positions.first().copied().unwrap_or(0);

    // Steps 5-6: recursively expand non-_self_ entries, inserting `e` at its slot.
    let mut out = Vec::new();
    for (i, spec) in header.defaults.iter().enumerate() {
        if i == self_slot {
            out.push(e.clone());
        }
        if let DefaultSpec::Entry(child) = spec {
            let propagated = propagate_package(child.clone(), &e, &path);
            let expanded = expand_element(propagated, repo, skip_missing)?;
            out.extend(expanded);
        }
    }
    if self_slot >= header.defaults.len() {
        out.push(e);
    }

    // Step 7: flattened left-to-right order.
    Ok(out)
}

/// §4.5: a parent's `package` (never `package2`) propagates to a child that
/// did not already declare its own package. Also stamps `parent` to the path
/// that introduced the child.
fn propagate_package(child: DefaultElement, parent: &DefaultElement, parent_path: &str) -> DefaultElement {
    let mut child = child;
    if child.package().is_none() {
        if let Some(pkg) = parent.package() {
            child = child.with_package(pkg.to_string());
        }
    }
    child.with_parent(parent_path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryConfigRepository;

    fn repo_with(configs: &[(&str, &str)]) -> InMemoryConfigRepository {
        let mut repo = InMemoryConfigRepository::new();
        for (path, yaml) in configs {
            repo = repo.with_config_yaml(*path, *yaml);
        }
        repo
    }

    #[test]
    fn implicit_leading_self_places_primary_first() {
        let repo = repo_with(&[
            ("implicit_leading_self", "defaults:\n  - no_defaults\n"),
            ("no_defaults", "{}\n"),
        ]);
        let primary = DefaultElement::config("implicit_leading_self").as_primary();
        let out = expand_element(primary, &repo, false).unwrap();
        let names: Vec<_> = out.iter().map(|e| e.config_name().unwrap()).collect();
        assert_eq!(names, vec!["implicit_leading_self", "no_defaults"]);
    }

    #[test]
    fn explicit_trailing_self_places_primary_last() {
        let repo = repo_with(&[
            ("trailing_self", "defaults:\n  - no_defaults\n  - _self_\n"),
            ("no_defaults", "{}\n"),
        ]);
        let primary = DefaultElement::config("trailing_self").as_primary();
        let out = expand_element(primary, &repo, false).unwrap();
        let names: Vec<_> = out.iter().map(|e| e.config_name().unwrap()).collect();
        assert_eq!(names, vec!["no_defaults", "trailing_self"]);
    }

    #[test]
    fn duplicate_self_is_an_error() {
        let repo = repo_with(&[("duplicate_self", "defaults:\n  - _self_\n  - _self_\n")]);
        let primary = DefaultElement::config("duplicate_self").as_primary();
        let err = expand_element(primary, &repo, false).unwrap_err();
        assert_eq!(err, ResolveError::duplicate_self("duplicate_self"));
    }

    #[test]
    fn mandatory_missing_without_skip_is_an_error() {
        let repo = repo_with(&[]);
        let e = DefaultElement::missing_group("db");
        let err = expand_element(e, &repo, false).unwrap_err();
        assert!(matches!(err, ResolveError::MandatoryMissing { .. }));
    }

    #[test]
    fn mandatory_missing_with_skip_marks_skip_load() {
        let repo = repo_with(&[]);
        let e = DefaultElement::missing_group("db");
        let out = expand_element(e, &repo, true).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].skip_load());
        assert_eq!(out[0].skip_load_reason(), Some(SkipReason::MissingSkipped));
    }

    #[test]
    fn optional_missing_config_is_skipped_not_fatal() {
        let repo = repo_with(&[]);
        let e = DefaultElement::group("foo", "bar").optional();
        let out = expand_element(e, &repo, false).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].skip_load());
        assert_eq!(out[0].skip_load_reason(), Some(SkipReason::MissingOptionalConfig));
    }

    #[test]
    fn package_propagates_to_children_without_one() {
        let repo = repo_with(&[
            ("parent", "defaults:\n  - _self_\n  - child: opt\n"),
            ("child/opt", "{}\n"),
        ]);
        let primary = DefaultElement::config("parent").as_primary().with_package("top");
        let out = expand_element(primary, &repo, false).unwrap();
        let child = out.iter().find(|e| e.config_group() == Some("child")).unwrap();
        assert_eq!(child.package(), Some("top"));
    }

    #[test]
    fn package_does_not_override_childs_own_package() {
        let repo = repo_with(&[
            ("parent", "defaults:\n  - _self_\n  - child@own: opt\n"),
            ("child/opt", "{}\n"),
        ]);
        let primary = DefaultElement::config("parent").as_primary().with_package("top");
        let out = expand_element(primary, &repo, false).unwrap();
        let child = out.iter().find(|e| e.config_group() == Some("child")).unwrap();
        assert_eq!(child.package(), Some("own"));
    }
}
