//! Kind of thing a repository path resolves to.

/// Whether a config path names a loadable config, a group (directory) of
/// options, or neither.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ObjectType {
    #[default]
    NotFound,
    Config,
    Group,
}

impl ObjectType {
    pub fn is_found(&self) -> bool {
        !matches!(self, ObjectType::NotFound)
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectType::NotFound => write!(f, "NOT_FOUND"),
            ObjectType::Config => write!(f, "CONFIG"),
            ObjectType::Group => write!(f, "GROUP"),
        }
    }
}
