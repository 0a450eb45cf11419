use serde::{Deserialize, Serialize};
use std::fmt;

/// The three browsing axes of the product: subjects, companies and roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Subject,
    Company,
    Role,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 3] = [Self::Subject, Self::Company, Self::Role];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryKind::Subject => "subject",
            CategoryKind::Company => "company",
            CategoryKind::Role => "role",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete category a session was started for, e.g. subject "DBMS".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub kind: CategoryKind,
    pub name: String,
}

impl Category {
    #[must_use]
    pub fn new(kind: CategoryKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into().trim().to_owned(),
        }
    }

    #[must_use]
    pub fn subject(name: impl Into<String>) -> Self {
        Self::new(CategoryKind::Subject, name)
    }

    #[must_use]
    pub fn company(name: impl Into<String>) -> Self {
        Self::new(CategoryKind::Company, name)
    }

    #[must_use]
    pub fn role(name: impl Into<String>) -> Self {
        Self::new(CategoryKind::Role, name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}
