//! `DefaultElement`: one entry in a resolved defaults list.

/// Why a `DefaultElement` is marked `skip_load`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Removed by a `~group` / `~group=option` override.
    DeletedFromList,
    /// `optional: true` and the referenced config does not exist.
    MissingOptionalConfig,
    /// `???` left unresolved with `skip_missing=true`.
    MissingSkipped,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeletedFromList => "deleted_from_list",
            Self::MissingOptionalConfig => "missing_optional_config",
            Self::MissingSkipped => "missing_skipped",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sentinel value for a mandatory-but-unset config choice (`config_name: ???`).
pub const MISSING: &str = "???";

/// Sentinel value for the `_self_` slot inside a declared defaults list.
pub const SELF_SENTINEL: &str = "_self_";

/// One entry of a defaults list, resolved or in-flight.
///
/// Fields are private; construct through [`DefaultElement::primary`] or
/// [`DefaultElement::group`], then use the builder methods (`.optional()`,
/// `.package(..)`, ...). The List Expander is the only code permitted to call
/// the `pub(crate)` mutators (`set_deleted`, `set_package2`, `resolve_name`,
/// `set_skip`) — everywhere else a `DefaultElement` is append-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefaultElement {
    config_name: Option<String>,
    config_group: Option<String>,
    package: Option<String>,
    package2: Option<String>,
    parent: Option<String>,
    primary: bool,
    from_override: bool,
    is_add_only: bool,
    is_delete: bool,
    is_deleted: bool,
    optional: bool,
    skip_load: bool,
    skip_load_reason: Option<SkipReason>,
}

impl DefaultElement {
    fn new(config_group: Option<String>, config_name: Option<String>) -> Self {
        Self {
            config_name,
            config_group,
            package: None,
            package2: None,
            parent: None,
            primary: false,
            from_override: false,
            is_add_only: false,
            is_delete: false,
            is_deleted: false,
            optional: false,
            skip_load: false,
            skip_load_reason: None,
        }
    }

    /// A bare (ungrouped) config reference, e.g. the root of a composition or
    /// a plain `path/to/config` entry in a defaults list.
    pub fn config(config_name: impl Into<String>) -> Self {
        Self::new(None, Some(config_name.into()))
    }

    /// A group default (`group: option`), as declared in a `defaults:` list
    /// or synthesized from an override.
    pub fn group(config_group: impl Into<String>, config_name: impl Into<String>) -> Self {
        Self::new(Some(config_group.into()), Some(config_name.into()))
    }

    /// A group default whose option is the mandatory-missing sentinel (`???`).
    pub fn missing_group(config_group: impl Into<String>) -> Self {
        Self::new(Some(config_group.into()), Some(MISSING.to_string()))
    }

    /// A `~group` delete request with no group set yet (filled in by the caller).
    pub fn delete_request(config_group: impl Into<String>, config_name: Option<String>) -> Self {
        let mut e = Self::new(Some(config_group.into()), config_name);
        e.is_delete = true;
        e
    }

    // --- builder-style setters, consumed once at construction time ---

    pub fn as_primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn from_override(mut self) -> Self {
        self.from_override = true;
        self.parent = Some("overrides".to_string());
        self
    }

    pub fn add_only(mut self) -> Self {
        self.is_add_only = true;
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_package2(mut self, package2: impl Into<String>) -> Self {
        self.package2 = Some(package2.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    // --- accessors ---

    pub fn config_name(&self) -> Option<&str> {
        self.config_name.as_deref()
    }

    pub fn config_group(&self) -> Option<&str> {
        self.config_group.as_deref()
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn package2(&self) -> Option<&str> {
        self.package2.as_deref()
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_from_override(&self) -> bool {
        self.from_override
    }

    pub fn is_add_only(&self) -> bool {
        self.is_add_only
    }

    pub fn is_delete(&self) -> bool {
        self.is_delete
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn skip_load(&self) -> bool {
        self.skip_load
    }

    pub fn skip_load_reason(&self) -> Option<SkipReason> {
        self.skip_load_reason
    }

    /// `effective_package(e) = e.package2 if set else e.package`.
    pub fn effective_package(&self) -> Option<&str> {
        self.package2.as_deref().or(self.package.as_deref())
    }

    /// `group/option`, or just `option` when ungrouped. `None` for a bare
    /// `~group` delete request that never carried an option.
    pub fn config_path(&self) -> Option<String> {
        let name = self.config_name.as_deref()?;
        match &self.config_group {
            Some(group) => Some(format!("{}/{}", group, name)),
            None => Some(name.to_string()),
        }
    }

    /// Whether this element is currently the mandatory-missing sentinel.
    pub fn is_missing(&self) -> bool {
        self.config_name.as_deref() == Some(MISSING)
    }

    /// Whether `config_name` is a `${...}` interpolation expression.
    pub fn is_interpolation(&self) -> bool {
        matches!(&self.config_name, Some(s) if s.contains("${") && s.contains('}'))
    }

    /// Whether `(config_group, effective_package)` of `self` matches the same
    /// identity key as `other` — the matching rule overrides use throughout §4.4.
    pub fn matches_identity(&self, group: &str, package: Option<&str>) -> bool {
        self.config_group.as_deref() == Some(group) && self.effective_package() == package
    }

    // --- mutators used exclusively by the List Expander (crate-private) ---

    pub(crate) fn set_deleted(&mut self, reason: SkipReason) {
        self.is_deleted = true;
        self.skip_load = true;
        self.skip_load_reason = Some(reason);
    }

    /// Resurrect a previously-deleted element that a later non-`+` override retargets.
    pub(crate) fn resurrect(&mut self) {
        self.is_deleted = false;
        self.skip_load = false;
        self.skip_load_reason = None;
    }

    pub(crate) fn set_config_name(&mut self, name: impl Into<String>) {
        self.config_name = Some(name.into());
    }

    pub(crate) fn set_package(&mut self, package: impl Into<String>) {
        self.package = Some(package.into());
    }

    pub(crate) fn set_package2(&mut self, package2: impl Into<String>) {
        self.package2 = Some(package2.into());
    }

    pub(crate) fn set_skip(&mut self, reason: SkipReason) {
        self.skip_load = true;
        self.skip_load_reason = Some(reason);
    }

    pub(crate) fn set_parent(&mut self, parent: impl Into<String>) {
        self.parent = Some(parent.into());
    }
}

/// One entry as declared inside a config's `defaults:` list, before it is
/// resolved against a repository. Kept as a tagged variant rather than a
/// magic `"_self_"` string per the config_name field, reconverting only at
/// the parse/flatten boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefaultSpec {
    /// The `_self_` slot marker.
    SelfRef,
    /// A concrete reference, either grouped (`group: option`) or a bare
    /// `path/to/config` string.
    Entry(DefaultElement),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_package_prefers_rename() {
        let e = DefaultElement::group("a", "a1").with_package("pkg").with_package2("pkg2");
        assert_eq!(e.effective_package(), Some("pkg2"));
    }

    #[test]
    fn effective_package_falls_back_to_package() {
        let e = DefaultElement::group("a", "a1").with_package("pkg");
        assert_eq!(e.effective_package(), Some("pkg"));
    }

    #[test]
    fn effective_package_absent_by_default() {
        let e = DefaultElement::group("a", "a1");
        assert_eq!(e.effective_package(), None);
    }

    #[test]
    fn config_path_grouped() {
        let e = DefaultElement::group("db", "mysql");
        assert_eq!(e.config_path(), Some("db/mysql".to_string()));
    }

    #[test]
    fn config_path_bare() {
        let e = DefaultElement::config("trailing_self");
        assert_eq!(e.config_path(), Some("trailing_self".to_string()));
    }

    #[test]
    fn config_path_none_without_name() {
        let e = DefaultElement::delete_request("db", None);
        assert_eq!(e.config_path(), None);
    }

    #[test]
    fn is_missing_detects_sentinel() {
        let e = DefaultElement::missing_group("a");
        assert!(e.is_missing());
        let e2 = DefaultElement::group("a", "a1");
        assert!(!e2.is_missing());
    }

    #[test]
    fn is_interpolation_detects_expression() {
        let e = DefaultElement::group("a_b", "${a}_${b}");
        assert!(e.is_interpolation());
        let e2 = DefaultElement::group("a_b", "a1_b1");
        assert!(!e2.is_interpolation());
    }

    #[test]
    fn matches_identity_by_group_and_effective_package() {
        let e = DefaultElement::group("a", "a1").with_package("pkg");
        assert!(e.matches_identity("a", Some("pkg")));
        assert!(!e.matches_identity("a", None));
        assert!(!e.matches_identity("b", Some("pkg")));
    }

    #[test]
    fn set_deleted_sets_skip_flags() {
        let mut e = DefaultElement::group("a", "a1");
        e.set_deleted(SkipReason::DeletedFromList);
        assert!(e.is_deleted());
        assert!(e.skip_load());
        assert_eq!(e.skip_load_reason(), Some(SkipReason::DeletedFromList));
    }

    #[test]
    fn resurrect_clears_skip_flags() {
        let mut e = DefaultElement::group("a", "a1");
        e.set_deleted(SkipReason::DeletedFromList);
        e.resurrect();
        assert!(!e.is_deleted());
        assert!(!e.skip_load());
        assert_eq!(e.skip_load_reason(), None);
    }
}
