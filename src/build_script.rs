//! Master build script: one `@FOLDER/file.sql` line per generated script,
//! folders in dependency order.

use crate::artifact::Category;
use crate::clean::sql_files;
use crate::error::Result;
use crate::generator::format::TAB;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

const SECTION_RULE: &str = "\n-------------------------\n";

/// Render the build script for everything under `root`.
pub fn render_build_script(root: &Path, generated_at: DateTime<Local>) -> Result<String> {
    let mut text = format!(
        "spo build.log\n\n-- Generated {}\n{}",
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        SECTION_RULE
    );

    for category in Category::BUILD_ORDER {
        let dir = root.join(category.dir_name());
        if !dir.is_dir() {
            text.push_str(&format!("{}-- No {} to add (No directory)", TAB, category));
            text.push_str(SECTION_RULE);
            continue;
        }
        let files = sql_files(&dir)?;
        if files.is_empty() {
            text.push_str(&format!(
                "{}-- No {} to add (No files or no usable content found)",
                TAB, category
            ));
        }
        for path in files {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                text.push_str(&format!("@{}/{}\n", category, name));
            }
        }
        text.push_str(SECTION_RULE);
    }
    text.push_str("spo off");
    Ok(text)
}

/// Write the build script for `root` to `root/<file_name>`, stamped with the local time.
pub fn write_build_script(root: &Path, file_name: &str) -> Result<PathBuf> {
    log::info!("Generating {} script", file_name);
    let text = render_build_script(root, Local::now())?;
    let path = root.join(file_name);
    fs::write(&path, text)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn stamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_build_script_lists_files_in_folder_order() {
        let dir = TempDir::new().unwrap();
        for (folder, file) in [
            ("INDEXES", "001_ORDERS_PK.sql"),
            ("TABLES", "002_ITEMS.sql"),
            ("TABLES", "001_ORDERS.sql"),
            ("SEQUENCES", "001_ORDERS_ID_SEQ.sql"),
        ] {
            fs::create_dir_all(dir.path().join(folder)).unwrap();
            fs::write(dir.path().join(folder).join(file), "--").unwrap();
        }

        let text = render_build_script(dir.path(), stamp()).unwrap();
        assert!(text.starts_with("spo build.log\n\n-- Generated 2024-03-01 09:30:00\n"));
        assert!(text.contains("@TABLES/001_ORDERS.sql\n@TABLES/002_ITEMS.sql\n"));
        let seq = text.find("@SEQUENCES/").unwrap();
        let tables = text.find("@TABLES/").unwrap();
        let indexes = text.find("@INDEXES/").unwrap();
        assert!(seq < tables && tables < indexes);
        assert!(text.contains("    -- No VIEWS to add (No directory)"));
        assert!(text.ends_with("spo off"));
    }

    #[test]
    fn test_empty_folder_is_noted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("GRANTS")).unwrap();
        let text = render_build_script(dir.path(), stamp()).unwrap();
        assert!(text.contains(
            "    -- No GRANTS to add (No files or no usable content found)\n-------------------------\n"
        ));
    }
}
