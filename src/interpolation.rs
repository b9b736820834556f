//! §4.6 Interpolation Resolver: a small, purpose-built `${group}` substitution
//! pass over the resolved group choices, not a general expression evaluator.

use std::collections::HashMap;

use crate::element::{DefaultElement, SkipReason};
use crate::error::ResolveError;

/// Build the `group -> chosen config_name` map and rewrite every interpolation
/// entry's `config_name` in place. Single-pass, left-to-right; an element
/// being resolved is never itself a source in the map.
pub fn resolve_interpolations(list: &mut [DefaultElement]) -> Result<(), ResolveError> {
    let mut group_to_choice: HashMap<String, String> = HashMap::new();
    for e in list.iter() {
        if e.is_interpolation() || e.is_deleted() {
            continue;
        }
        if e.skip_load_reason() == Some(SkipReason::MissingOptionalConfig) {
            continue;
        }
        if let (Some(group), Some(name)) = (e.config_group(), e.config_name()) {
            group_to_choice.insert(group.to_string(), name.to_string());
        }
    }

    for e in list.iter_mut() {
        if !e.is_interpolation() {
            continue;
        }
        let expr = e.config_name().unwrap().to_string();
        let resolved = substitute(&expr, &group_to_choice)?;
        e.set_config_name(resolved);
    }
    Ok(())
}

/// Replace every `${group}` token in `input` with its resolved choice.
fn substitute(input: &str, group_to_choice: &HashMap<String, String>) -> Result<String, ResolveError> {
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i..].starts_with("${") {
            if let Some(end) = input[i + 2..].find('}') {
                let ident = &input[i + 2..i + 2 + end];
                match group_to_choice.get(ident) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(ResolveError::interpolation_unresolved(format!("${{{}}}", ident)))
                    }
                }
                i += 2 + end + 1;
                continue;
            }
        }
        let ch = input[i..].chars().next().expect("i < input.len()");
        out.push(ch);
        i += ch.len_utf8();
    }
    Ok(out)
}
