//! §4.4 List Expander / Override Applier: merges the recursively expanded
//! primary with override-derived elements and produces the final sequence.

use std::collections::HashMap;

use crate::element::DefaultElement;
use crate::error::ResolveError;
use crate::expand::expand_element;
use crate::interpolation::resolve_interpolations;
use crate::repository::ConfigRepository;

enum OverrideKind {
    Rename,
    Change,
    Delete,
    Add,
}

fn classify(o: &DefaultElement) -> OverrideKind {
    if o.is_delete() {
        OverrideKind::Delete
    } else if o.is_add_only() {
        OverrideKind::Add
    } else if o.package2().is_some() {
        OverrideKind::Rename
    } else {
        OverrideKind::Change
    }
}

/// Expand `seed = [primary] ++ overrides-as-defaults` into the final
/// deterministically ordered defaults list.
pub fn expand_defaults_list(
    seed: Vec<DefaultElement>,
    repo: &dyn ConfigRepository,
    skip_missing: bool,
) -> Result<Vec<DefaultElement>, ResolveError> {
    let mut seed = seed.into_iter();
    let primary = seed.next().ok_or_else(|| ResolveError::repository("seed list is empty"))?;
    let overrides: Vec<DefaultElement> = seed.collect();

    // Phase B: recursively expand the primary.
    let mut working = expand_element(primary, repo, skip_missing)?;

    // Phase C: apply overrides in the fixed order (renames, changes, deletes, adds).
    for o in overrides.iter().filter(|o| matches!(classify(o), OverrideKind::Rename)) {
        apply_rename(&mut working, o)?;
    }

    // Deletes reserve their matches before changes run, and are attempted
    // again after changes have staged their provisional entries. This
    // ordering is what makes `["a=foo", "~a"]` against a list that already
    // has `a` produce a 5-element result rather than renaming `a` in place:
    // the delete claims the existing `a` entry first (untouched, just
    // marked deleted), so the change finds nothing eligible to mutate and
    // stages a brand new `from_override` entry — which the second delete
    // pass then also claims. A delete only errors if neither pass matched
    // anything at all.
    let delete_overrides: Vec<&DefaultElement> =
        overrides.iter().filter(|o| matches!(classify(o), OverrideKind::Delete)).collect();
    let mut delete_matched = vec![false; delete_overrides.len()];
    for (matched, o) in delete_matched.iter_mut().zip(delete_overrides.iter()) {
        *matched |= apply_delete(&mut working, o);
    }

    // A change with no match is not immediately fatal: it is staged as a
    // provisional from_override entry so a later delete in the same
    // composition can still consume it. Anything still unconsumed once
    // deletes and adds have run is an error.
    let mut pending_changes: Vec<usize> = Vec::new();
    for o in overrides.iter().filter(|o| matches!(classify(o), OverrideKind::Change)) {
        if !apply_change(&mut working, o) {
            working.push(o.clone());
            pending_changes.push(working.len() - 1);
        }
    }

    for (matched, o) in delete_matched.iter_mut().zip(delete_overrides.iter()) {
        *matched |= apply_delete(&mut working, o);
    }
    for (matched, o) in delete_matched.iter().zip(delete_overrides.iter()) {
        if !matched {
            let group = o.config_group().unwrap_or_default();
            return Err(ResolveError::delete_no_match(delete_spec(group, o.package(), o.config_name())));
        }
    }

    for o in overrides.iter().filter(|o| matches!(classify(o), OverrideKind::Add)) {
        apply_add(&mut working, o, repo, skip_missing)?;
    }

    for idx in pending_changes {
        if !working[idx].is_deleted() {
            let o = &working[idx];
            return Err(ResolveError::no_match_for_override(
                o.config_group().unwrap_or_default(),
                o.config_name().unwrap_or_default(),
            ));
        }
    }

    // Phase D: interpolation.
    resolve_interpolations(&mut working)?;

    // Phase E: dedup-by-identity collapse.
    Ok(dedup_by_identity(working))
}

fn find_rename_target<'a>(
    working: &'a mut [DefaultElement],
    group: &str,
    package: Option<&str>,
) -> Option<&'a mut DefaultElement> {
    working
        .iter_mut()
        .find(|e| e.config_group() == Some(group) && e.package() == package)
}

fn apply_rename(working: &mut [DefaultElement], o: &DefaultElement) -> Result<(), ResolveError> {
    let group = o.config_group().unwrap_or_default();
    match find_rename_target(working, group, o.package()) {
        None => Err(ResolveError::package_rename_no_match(group, o.package().unwrap_or_default())),
        Some(target) => {
            if target.is_deleted() {
                // A rename on a deleted entry is a no-op, not an error.
                return Ok(());
            }
            if let Some(name) = o.config_name() {
                target.set_config_name(name.to_string());
            }
            if let Some(pkg2) = o.package2() {
                target.set_package2(pkg2.to_string());
            }
            Ok(())
        }
    }
}

/// Identity match used throughout Phase C: `(config_group, effective_package)`
/// is compared exactly, so an override with no `@pkg` only matches an entry
/// that itself carries no package — it is not a wildcard across packages.
fn identity_matches(e: &DefaultElement, group: &str, package: Option<&str>) -> bool {
    e.config_group() == Some(group) && e.effective_package() == package
}

/// Mutate the matching element's `config_name` in place. Returns `false`
/// (rather than erroring) when nothing matches, so the caller can stage the
/// override as a provisional entry instead. An entry already claimed by a
/// delete override in the same batch is deleted by the time this runs, so it
/// is correctly skipped here rather than mutated and then deleted.
fn apply_change(working: &mut [DefaultElement], o: &DefaultElement) -> bool {
    let group = o.config_group().unwrap_or_default();
    let target = working.iter_mut().find(|e| !e.is_deleted() && identity_matches(e, group, o.package()));
    match target {
        None => false,
        Some(target) => {
            if let Some(name) = o.config_name() {
                target.set_config_name(name.to_string());
            }
            true
        }
    }
}

fn delete_spec(group: &str, package: Option<&str>, value: Option<&str>) -> String {
    match (value, package) {
        (Some(v), _) => format!("{}={}", group, v),
        (None, Some(p)) => format!("{}@{}", group, p),
        (None, None) => group.to_string(),
    }
}

fn delete_matches(e: &DefaultElement, group: &str, package: Option<&str>, value: Option<&str>) -> bool {
    identity_matches(e, group, package) && (value.is_none() || e.config_name() == value)
}

/// Mark every currently non-deleted matching entry as deleted and report
/// whether anything matched. Never errors on its own — callers that run this
/// across two passes (bracketing the Change phase) only raise `DeleteNoMatch`
/// once neither pass found a match.
fn apply_delete(working: &mut [DefaultElement], o: &DefaultElement) -> bool {
    let group = o.config_group().unwrap_or_default();
    let package = o.package();
    let value = o.config_name();

    let mut matched = false;
    for e in working.iter_mut().filter(|e| !e.is_deleted() && delete_matches(e, group, package, value)) {
        e.set_deleted(crate::element::SkipReason::DeletedFromList);
        matched = true;
    }
    matched
}

fn apply_add(
    working: &mut Vec<DefaultElement>,
    o: &DefaultElement,
    repo: &dyn ConfigRepository,
    skip_missing: bool,
) -> Result<(), ResolveError> {
    let group = o.config_group().unwrap_or_default();
    let duplicate = working.iter().any(|e| !e.is_deleted() && identity_matches(e, group, o.package()));
    if duplicate {
        // Adds never carry a package rename, so `package()` is the full
        // qualifier — mirrors `ParsedOverride::spec()`.
        let group_spec = match o.package() {
            Some(p) => format!("{}@{}", group, p),
            None => group.to_string(),
        };
        return Err(ResolveError::duplicate_add(
            group_spec.clone(),
            format!("{}={}", group_spec, o.config_name().unwrap_or_default()),
        ));
    }

    let expanded = expand_element(o.clone(), repo, skip_missing)?;
    working.extend(expanded);
    Ok(())
}

fn dedup_by_identity(list: Vec<DefaultElement>) -> Vec<DefaultElement> {
    let mut first_index: HashMap<(String, Option<String>), usize> = HashMap::new();
    let mut slots: Vec<Option<DefaultElement>> = list.into_iter().map(Some).collect();

    for i in 0..slots.len() {
        let elem = slots[i].as_ref().expect("slot not yet taken");
        if elem.config_group().is_none() || elem.is_deleted() || elem.is_add_only() {
            continue;
        }
        let key = (elem.config_group().unwrap().to_string(), elem.effective_package().map(str::to_string));
        match first_index.get(&key) {
            None => {
                first_index.insert(key, i);
            }
            Some(&first_i) => {
                slots[first_i] = slots[i].take();
            }
        }
    }

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::convert_overrides_to_defaults;
    use crate::override_parser::parse_overrides;
    use crate::repository::InMemoryConfigRepository;

    fn repo_with(configs: &[(&str, &str)]) -> InMemoryConfigRepository {
        let mut repo = InMemoryConfigRepository::new();
        for (path, yaml) in configs {
            repo = repo.with_config_yaml(*path, *yaml);
        }
        repo
    }

    fn resolve(
        primary: &str,
        repo: &InMemoryConfigRepository,
        overrides: &[&str],
    ) -> Result<Vec<DefaultElement>, ResolveError> {
        let parsed = parse_overrides(overrides.iter().copied()).unwrap();
        let converted = convert_overrides_to_defaults(&parsed).unwrap();
        let mut seed = vec![DefaultElement::config(primary).as_primary()];
        seed.extend(converted);
        expand_defaults_list(seed, repo, false)
    }

    #[test]
    fn change_override_rewrites_choice_in_place() {
        let repo = repo_with(&[
            ("test_overrides", "defaults:\n  - _self_\n  - a: a1\n  - b: b1\n"),
            ("a/a1", "{}\n"),
            ("a/a6", "{}\n"),
            ("b/b1", "{}\n"),
        ]);
        let out = resolve("test_overrides", &repo, &["a=a6"]).unwrap();
        let names: Vec<_> = out.iter().map(|e| e.config_name().unwrap()).collect();
        assert_eq!(names, vec!["test_overrides", "a6", "b1"]);
    }

    #[test]
    fn add_override_appends_and_expands_recursively() {
        let repo = repo_with(&[
            ("no_defaults", "{}\n"),
            ("b/b2", "defaults:\n  - _self_\n  - c: c2\n"),
            ("c/c2", "{}\n"),
        ]);
        let out = resolve("no_defaults", &repo, &["+b=b2"]).unwrap();
        let names: Vec<_> = out.iter().map(|e| e.config_name().unwrap()).collect();
        assert_eq!(names, vec!["no_defaults", "b2", "c2"]);
    }

    #[test]
    fn change_with_no_match_then_delete_resolves_to_single_deleted_entry() {
        // Mirrors the "delete_after_set_from_overrides" scenario: a change
        // override with nothing to match is staged, not immediately fatal,
        // and a later delete for the same group consumes it.
        let repo = repo_with(&[("no_defaults", "{}\n")]);
        let out = resolve("no_defaults", &repo, &["a=foo", "~a"]).unwrap();
        assert_eq!(out.len(), 2);
        let a = out.iter().find(|e| e.config_group() == Some("a")).unwrap();
        assert!(a.is_deleted());
        assert!(a.skip_load());
        assert_eq!(a.config_name(), Some("foo"));
        assert!(a.is_from_override());
    }

    #[test]
    fn change_with_no_match_and_no_later_delete_is_an_error() {
        let repo = repo_with(&[("no_defaults", "{}\n")]);
        let err = resolve("no_defaults", &repo, &["c=c1"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not override 'c'. No match in the defaults list.\nTo append to your default list use +c=c1"
        );
    }

    #[test]
    fn delete_with_no_match_is_an_error() {
        let repo = repo_with(&[("no_defaults", "{}\n")]);
        let err = resolve("no_defaults", &repo, &["~db=mysql"]).unwrap_err();
        assert_eq!(err.to_string(), "Could not delete. No match for 'db=mysql' in the defaults list.");
    }

    #[test]
    fn duplicate_add_is_an_error() {
        let repo = repo_with(&[
            ("test_overrides", "defaults:\n  - _self_\n  - a: a1\n"),
            ("a/a1", "{}\n"),
            ("a/a2", "{}\n"),
        ]);
        let err = resolve("test_overrides", &repo, &["+a=a2"]).unwrap_err();
        assert_eq!(err.to_string(), "Could not add 'a=a2'. 'a' is already in the defaults list.");
    }

    #[test]
    fn duplicate_add_with_package_keeps_qualifier_in_both_placeholders() {
        let repo = repo_with(&[
            ("test_overrides", "defaults:\n  - _self_\n  - a@pkg: a1\n"),
            ("a/a1", "{}\n"),
            ("a/a2", "{}\n"),
        ]);
        let err = resolve("test_overrides", &repo, &["+a@pkg=a2"]).unwrap_err();
        assert_eq!(err.to_string(), "Could not add 'a@pkg=a2'. 'a@pkg' is already in the defaults list.");
    }

    #[test]
    fn change_consumed_by_same_group_delete_leaves_original_entry_untouched() {
        // "delete_after_set_from_overrides" against a list where `a` already
        // exists: the delete claims the original `a:a1` entry (deleted, name
        // untouched), `a@pkg:a1` and `c:c1` are unaffected, and the change
        // ends up staged as a brand new deleted `from_override` entry rather
        // than renaming `a:a1` in place.
        let repo = repo_with(&[
            ("test_overrides", "defaults:\n  - _self_\n  - a: a1\n  - a@pkg: a1\n  - c: c1\n"),
            ("a/a1", "{}\n"),
            ("c/c1", "{}\n"),
        ]);
        let out = resolve("test_overrides", &repo, &["a=foo", "~a"]).unwrap();
        assert_eq!(out.len(), 5);

        let plain_a = out
            .iter()
            .find(|e| e.config_group() == Some("a") && e.package().is_none() && !e.is_from_override())
            .unwrap();
        assert_eq!(plain_a.config_name(), Some("a1"));
        assert!(plain_a.is_deleted());
        assert!(!plain_a.is_from_override());

        let pkg_a = out.iter().find(|e| e.config_group() == Some("a") && e.package() == Some("pkg")).unwrap();
        assert_eq!(pkg_a.config_name(), Some("a1"));
        assert!(!pkg_a.is_deleted());

        let c = out.iter().find(|e| e.config_group() == Some("c")).unwrap();
        assert_eq!(c.config_name(), Some("c1"));
        assert!(!c.is_deleted());

        let staged = out
            .iter()
            .filter(|e| e.config_group() == Some("a") && e.package().is_none() && e.is_from_override())
            .collect::<Vec<_>>();
        assert_eq!(staged.len(), 1);
        assert_eq!(staged[0].config_name(), Some("foo"));
        assert!(staged[0].is_deleted());
    }

    #[test]
    fn rename_with_no_match_is_package_rename_no_match() {
        let repo = repo_with(&[
            ("test_overrides", "defaults:\n  - _self_\n  - a: a1\n"),
            ("a/a1", "{}\n"),
        ]);
        let err = resolve("test_overrides", &repo, &["a@XXX:dest=a6"]).unwrap_err();
        assert_eq!(err.to_string(), "Could not rename package. No match for 'a@XXX' in the defaults list");
    }

    #[test]
    fn interpolation_sees_override_written_choice() {
        let repo = repo_with(&[
            ("interpolation/i1", "defaults:\n  - _self_\n  - a: a1\n  - b: b1\n  - a_b: \"${a}_${b}\"\n"),
            ("a/a1", "{}\n"),
            ("a/a6", "{}\n"),
            ("b/b1", "{}\n"),
        ]);
        let out = resolve("interpolation/i1", &repo, &["a=a6"]).unwrap();
        let a_b = out.iter().find(|e| e.config_group() == Some("a_b")).unwrap();
        assert_eq!(a_b.config_name(), Some("a6_b1"));
    }
}
