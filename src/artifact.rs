//! Rendered script files and the category folders they live in.

use std::fmt;
use std::path::PathBuf;

/// Category folder of a generated script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Sequences,
    Synonyms,
    Tables,
    Indexes,
    Constraints,
    RefConstraints,
    Functions,
    Packages,
    Procedures,
    Triggers,
    Views,
    PackageBodies,
    Comments,
    Grants,
    RefDataLoad,
    Drops,
}

impl Category {
    /// Order in which the build script runs category folders
    pub const BUILD_ORDER: [Category; 16] = [
        Category::Sequences,
        Category::Synonyms,
        Category::Tables,
        Category::Indexes,
        Category::Constraints,
        Category::RefConstraints,
        Category::Functions,
        Category::Packages,
        Category::Procedures,
        Category::Triggers,
        Category::Views,
        Category::PackageBodies,
        Category::Comments,
        Category::Grants,
        Category::RefDataLoad,
        Category::Drops,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Sequences => "SEQUENCES",
            Category::Synonyms => "SYNONYMS",
            Category::Tables => "TABLES",
            Category::Indexes => "INDEXES",
            Category::Constraints => "CONSTRAINTS",
            Category::RefConstraints => "REF_CONSTRAINTS",
            Category::Functions => "FUNCTIONS",
            Category::Packages => "PACKAGES",
            Category::Procedures => "PROCEDURES",
            Category::Triggers => "TRIGGERS",
            Category::Views => "VIEWS",
            Category::PackageBodies => "PACKAGE_BODIES",
            Category::Comments => "COMMENTS",
            Category::Grants => "GRANTS",
            Category::RefDataLoad => "REF_DATA_LOAD",
            Category::Drops => "DROPS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One generated script, complete before it is handed to a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub category: Category,
    pub file_name: String,
    pub content: String,
}

impl Artifact {
    pub fn new(category: Category, file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            category,
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Path relative to the output root, e.g. `INDEXES/001_ORDERS_PK.sql`
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.category.dir_name()).join(&self.file_name)
    }
}
