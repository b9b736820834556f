//! The fixed error taxonomy produced by the resolver and its repository.

use std::fmt;

/// Everything that can go wrong while resolving a defaults list.
///
/// Every variant renders to the exact template demanded by callers that match
/// on error text (tests, CLI front ends). Construct variants through the
/// provided helper methods rather than literal struct syntax so the message
/// templates stay in one place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// Two `_self_` entries were declared in the same config's defaults list.
    DuplicateSelf { config: String },
    /// A `???` placeholder was reached with `skip_missing=false`.
    MandatoryMissing { group: String, options: Vec<String> },
    /// A non-`+`, non-`~` override matched nothing in the defaults list.
    NoMatchForOverride { group: String, value: String },
    /// A `+` override matched something already present.
    DuplicateAdd { group: String, spec: String },
    /// A `~` override matched nothing in the defaults list.
    DeleteNoMatch { spec: String },
    /// A package-rename override (`@pkg:pkg2`) matched nothing.
    PackageRenameNoMatch { group: String, package: String },
    /// `+` combined with a package rename (`@pkg:pkg2`).
    AddWithRename,
    /// A delete override carried a list or dict value instead of a group name.
    DeleteValueNotString,
    /// The override grammar itself failed to parse.
    OverrideParseError { message: String },
    /// `${group}` referenced a group with no resolved choice.
    InterpolationUnresolved { expr: String },
    /// The repository has no config at the requested path.
    ConfigNotFound { path: String },
    /// Repository-level I/O or parse failure (reading or decoding a config file).
    Repository { message: String },
}

impl ResolveError {
    pub fn duplicate_self(config: impl Into<String>) -> Self {
        Self::DuplicateSelf { config: config.into() }
    }

    pub fn mandatory_missing(group: impl Into<String>, options: Vec<String>) -> Self {
        Self::MandatoryMissing { group: group.into(), options }
    }

    pub fn no_match_for_override(group: impl Into<String>, value: impl Into<String>) -> Self {
        Self::NoMatchForOverride { group: group.into(), value: value.into() }
    }

    pub fn duplicate_add(group: impl Into<String>, spec: impl Into<String>) -> Self {
        Self::DuplicateAdd { group: group.into(), spec: spec.into() }
    }

    pub fn delete_no_match(spec: impl Into<String>) -> Self {
        Self::DeleteNoMatch { spec: spec.into() }
    }

    pub fn package_rename_no_match(group: impl Into<String>, package: impl Into<String>) -> Self {
        Self::PackageRenameNoMatch { group: group.into(), package: package.into() }
    }

    pub fn override_parse_error(message: impl Into<String>) -> Self {
        Self::OverrideParseError { message: message.into() }
    }

    pub fn interpolation_unresolved(expr: impl Into<String>) -> Self {
        Self::InterpolationUnresolved { expr: expr.into() }
    }

    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn repository(message: impl Into<String>) -> Self {
        Self::Repository { message: message.into() }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSelf { config } => {
                write!(f, "Duplicate _self_ defined in {}", config)
            }
            Self::MandatoryMissing { group, options } => {
                write!(
                    f,
                    "You must specify '{group}', e.g, {group}=<OPTION>\nAvailable options:\n{}",
                    options.iter().map(|o| format!("\t{}", o)).collect::<Vec<_>>().join("\n")
                )
            }
            Self::NoMatchForOverride { group, value } => {
                write!(
                    f,
                    "Could not override '{group}'. No match in the defaults list.\nTo append to your default list use +{group}={value}"
                )
            }
            Self::DuplicateAdd { group, spec } => {
                write!(
                    f,
                    "Could not add '{spec}'. '{group}' is already in the defaults list."
                )
            }
            Self::DeleteNoMatch { spec } => {
                write!(f, "Could not delete. No match for '{spec}' in the defaults list.")
            }
            Self::PackageRenameNoMatch { group, package } => {
                write!(
                    f,
                    "Could not rename package. No match for '{group}@{package}' in the defaults list"
                )
            }
            Self::AddWithRename => {
                write!(f, "Add syntax does not support package rename, remove + prefix")
            }
            Self::DeleteValueNotString => write!(
                f,
                "Defaults list supported delete syntax is in the form ~group and ~group=value, where value is a group name (string)"
            ),
            Self::OverrideParseError { message } => write!(f, "{}", message),
            Self::InterpolationUnresolved { expr } => {
                write!(f, "Could not resolve interpolation '{}'", expr)
            }
            Self::ConfigNotFound { path } => write!(f, "Config not found: '{}'", path),
            Self::Repository { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ResolveError {}
