//! §4.3 Override-to-Defaults Converter: turns parsed overrides into synthetic
//! [`DefaultElement`]s, all carrying `from_override=true, parent="overrides"`.

use crate::element::DefaultElement;
use crate::error::ResolveError;
use crate::override_parser::{OverrideKind, ParsedOverride};

/// Convert parsed overrides into `DefaultElement`s, preserving input order.
///
/// `DeleteValueNotString` and grammar failures are caught at parse time; this
/// function only maps already-well-formed overrides onto the element model.
pub fn convert_overrides_to_defaults(
    overrides: &[ParsedOverride],
) -> Result<Vec<DefaultElement>, ResolveError> {
    overrides.iter().map(convert_one).collect()
}

fn convert_one(o: &ParsedOverride) -> Result<DefaultElement, ResolveError> {
    let mut elem = match o.kind {
        OverrideKind::Delete => DefaultElement::delete_request(o.group.clone(), o.value.clone()),
        OverrideKind::Add | OverrideKind::Change => {
            DefaultElement::group(o.group.clone(), o.value.clone().unwrap_or_default())
        }
    };
    elem = elem.from_override();

    if o.kind == OverrideKind::Add {
        elem = elem.add_only();
    }

    if let Some(pkg) = &o.package {
        elem = elem.with_package(pkg.clone());
    }
    if let Some(pkg2) = &o.package2 {
        elem = elem.with_package2(pkg2.clone());
    }

    Ok(elem)
}
