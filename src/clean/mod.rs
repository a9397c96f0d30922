//! Clean script: DROP statements recovered from the generated scripts themselves.
//!
//! Category folders are visited in reverse dependency order; every `.sql`
//! file is tokenized and scanned for the CREATE and ALTER statements this
//! crate emits, and each one is turned into the matching DROP.

pub mod scanner;
pub mod tokenizer;

pub use scanner::{scan_alters, scan_creates, AddedConstraint, CreatedObject, ObjectType};

use crate::artifact::Category;
use crate::error::Result;
use crate::generator::format::TAB;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Folders scanned for the clean script, in drop order.
///
/// Triggers are not listed; they go with their table.
pub const CLEAN_ORDER: [Category; 11] = [
    Category::Views,
    Category::Procedures,
    Category::Packages,
    Category::PackageBodies,
    Category::Functions,
    Category::RefConstraints,
    Category::Constraints,
    Category::Indexes,
    Category::Tables,
    Category::Synonyms,
    Category::Sequences,
];

const SECTION_RULE: &str = "\n-------------------------\n";

/// `.sql` files directly inside `dir`, sorted by file name.
pub(crate) fn sql_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map_or(false, |ext| ext.eq_ignore_ascii_case("sql"))
        })
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Builds one clean script; package names are remembered across the run so
/// a header and its body yield a single DROP PACKAGE.
#[derive(Debug, Default)]
pub struct CleanScript {
    packages: HashSet<String>,
}

impl CleanScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// DROP statements for one script's text found in `category`.
    pub fn drops_for(&mut self, category: Category, text: &str) -> Vec<String> {
        let tokens = tokenizer::normalize(text);
        let mut out = Vec::new();

        if matches!(category, Category::Constraints | Category::RefConstraints) {
            for added in scan_alters(&tokens) {
                log::debug!(
                    "Adding DROP for CONSTRAINT {}.{}",
                    added.table,
                    added.constraint
                );
                out.push(format!(
                    "ALTER TABLE {}\n{}DROP CONSTRAINT {};\n/",
                    added.table, TAB, added.constraint
                ));
            }
        }

        for created in scan_creates(&tokens) {
            if created.kind == ObjectType::Package {
                if self.packages.insert(created.name.clone()) {
                    out.push(format!("{} {};\n", created.kind.drop_keyword(), created.name));
                }
            } else {
                out.push(format!("{} {};", created.kind.drop_keyword(), created.name));
            }
        }
        out
    }

    /// Render the clean script for everything under `root`.
    pub fn render(&mut self, root: &Path) -> Result<String> {
        let mut text = String::from(
            "spo clean.log\n\nprompt --Dropping all objects in this release\n\n-------------------------\n",
        );
        for category in CLEAN_ORDER {
            let dir = root.join(category.dir_name());
            if !dir.is_dir() {
                text.push_str(&format!("{}-- No {} to drop (No directory)", TAB, category));
                text.push_str(SECTION_RULE);
                continue;
            }
            let mut usable = 0;
            for path in sql_files(&dir)? {
                let content = fs::read_to_string(&path)?;
                let drops = self.drops_for(category, &content);
                if drops.is_empty() {
                    continue;
                }
                usable += 1;
                for drop in drops {
                    text.push_str(&drop);
                    text.push('\n');
                }
            }
            if usable == 0 {
                text.push_str(&format!(
                    "{}-- No {} to drop (No files or no usable content found)",
                    TAB, category
                ));
            }
            text.push_str(SECTION_RULE);
        }
        text.push_str("spo off");
        Ok(text)
    }
}

/// Write the clean script for `root` to `root/<file_name>`.
pub fn write_clean_script(root: &Path, file_name: &str) -> Result<PathBuf> {
    log::info!("Generating {} script", file_name);
    let text = CleanScript::new().render(root)?;
    let path = root.join(file_name);
    fs::write(&path, text)?;
    Ok(path)
}
