//! Schema-level PL/SQL packages assembled from per-table procedures.

use crate::artifact::{Artifact, Category};
use crate::error::SchemaError;
use crate::model::account_name;

/// Header and body text of one packaged procedure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    pub header: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    History,
    Loader,
}

impl PackageKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            PackageKind::History => "HISTORY",
            PackageKind::Loader => "LOADER",
        }
    }

    /// `<ACCOUNT>_<KIND>` for a schema, e.g. `APP_LOADER` for `APP_OWNER`
    pub fn package_name(&self, schema: &str) -> String {
        format!("{}_{}", account_name(schema), self.suffix())
    }
}

/// Result of compiling an accumulator
#[derive(Debug, Default)]
pub struct PackageBuild {
    pub artifacts: Vec<Artifact>,
    /// Schemas whose package was written, in first-seen order
    pub schemas: Vec<String>,
}

/// Procedure headers and bodies grouped by schema in first-seen order.
#[derive(Debug)]
pub struct PackageAccumulator {
    kind: PackageKind,
    schemas: Vec<String>,
    headers: Vec<Vec<String>>,
    bodies: Vec<Vec<String>>,
}

impl PackageAccumulator {
    pub fn new(kind: PackageKind) -> Self {
        Self {
            kind,
            schemas: Vec::new(),
            headers: Vec::new(),
            bodies: Vec::new(),
        }
    }

    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    fn slot(&mut self, schema: &str) -> usize {
        match self.schemas.iter().position(|s| s == schema) {
            Some(pos) => pos,
            None => {
                self.schemas.push(schema.to_string());
                self.headers.push(Vec::new());
                self.bodies.push(Vec::new());
                self.schemas.len() - 1
            }
        }
    }

    pub fn add_header(&mut self, schema: &str, header: impl Into<String>) {
        let pos = self.slot(schema);
        self.headers[pos].push(header.into());
    }

    pub fn add_body(&mut self, schema: &str, body: impl Into<String>) {
        let pos = self.slot(schema);
        self.bodies[pos].push(body.into());
    }

    pub fn add(&mut self, schema: &str, procedure: &Procedure) {
        self.add_header(schema, procedure.header.clone());
        self.add_body(schema, procedure.body.clone());
    }

    /// Render one header file and one body file per schema.
    ///
    /// A schema whose header and body counts differ is logged and skipped.
    pub fn compile(&self) -> PackageBuild {
        let mut build = PackageBuild::default();
        for (pos, schema) in self.schemas.iter().enumerate() {
            let headers = &self.headers[pos];
            let bodies = &self.bodies[pos];
            let package = self.kind.package_name(schema);
            if headers.len() != bodies.len() {
                log::error!(
                    "{}",
                    SchemaError::PackageMismatch {
                        schema: schema.clone(),
                        package,
                        headers: headers.len(),
                        bodies: bodies.len(),
                    }
                );
                continue;
            }

            log::info!("Writing package {}.{}", schema, package);
            build.artifacts.push(Artifact::new(
                Category::Packages,
                format!("{}_HEADER.sql", package),
                package_text(schema, &package, "PACKAGE", headers),
            ));
            build.artifacts.push(Artifact::new(
                Category::PackageBodies,
                format!("{}_BODY.sql", package),
                package_text(schema, &package, "PACKAGE BODY", bodies),
            ));
            build.schemas.push(schema.clone());
        }
        build
    }
}

fn package_text(schema: &str, package: &str, object: &str, parts: &[String]) -> String {
    let label = object.to_lowercase();
    format!(
        "prompt -- Adding {schema}.{package} {label}\n\n\
         CREATE OR REPLACE {object} {schema}.{package} AS\n\n\
         {parts}\n\n\
         END {package};\n\
         /\n\n\
         show errors {label} {schema}.{package}\n",
        schema = schema,
        package = package,
        label = label,
        object = object,
        parts = parts.join("\n\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc(name: &str) -> Procedure {
        Procedure {
            header: format!("    PROCEDURE {};", name),
            body: format!("    PROCEDURE {} IS BEGIN NULL; END;", name),
        }
    }

    #[test]
    fn test_package_name_uses_account() {
        assert_eq!(PackageKind::History.package_name("APP_OWNER"), "APP_HISTORY");
        assert_eq!(PackageKind::Loader.package_name("CRM"), "CRM_LOADER");
    }

    #[test]
    fn test_compile_groups_by_schema_in_first_seen_order() {
        let mut acc = PackageAccumulator::new(PackageKind::Loader);
        acc.add("APP_OWNER", &proc("P_ORDERS_LOAD"));
        acc.add("CRM_OWNER", &proc("P_ACCOUNTS_LOAD"));
        acc.add("APP_OWNER", &proc("P_ITEMS_LOAD"));

        let build = acc.compile();
        assert_eq!(build.schemas, vec!["APP_OWNER", "CRM_OWNER"]);
        let names: Vec<&str> = build.artifacts.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "APP_LOADER_HEADER.sql",
                "APP_LOADER_BODY.sql",
                "CRM_LOADER_HEADER.sql",
                "CRM_LOADER_BODY.sql"
            ]
        );

        let header = &build.artifacts[0];
        assert_eq!(header.category, Category::Packages);
        assert!(header
            .content
            .starts_with("prompt -- Adding APP_OWNER.APP_LOADER package\n\nCREATE OR REPLACE PACKAGE APP_OWNER.APP_LOADER AS\n\n"));
        assert!(header
            .content
            .contains("    PROCEDURE P_ORDERS_LOAD;\n\n    PROCEDURE P_ITEMS_LOAD;\n\nEND APP_LOADER;\n/"));
        assert!(header.content.ends_with("show errors package APP_OWNER.APP_LOADER\n"));

        let body = &build.artifacts[1];
        assert_eq!(body.category, Category::PackageBodies);
        assert!(body.content.contains("CREATE OR REPLACE PACKAGE BODY APP_OWNER.APP_LOADER AS"));
        assert!(body.content.ends_with("show errors package body APP_OWNER.APP_LOADER\n"));
    }

    #[test]
    fn test_mismatched_schema_is_skipped() {
        let mut acc = PackageAccumulator::new(PackageKind::History);
        acc.add_header("APP_OWNER", "    PROCEDURE P_H_A_WRITE;");
        acc.add_header("APP_OWNER", "    PROCEDURE P_H_B_WRITE;");
        acc.add_body("APP_OWNER", "    PROCEDURE P_H_A_WRITE IS BEGIN NULL; END;");
        acc.add("CRM_OWNER", &proc("P_H_C_WRITE"));

        let build = acc.compile();
        assert_eq!(build.schemas, vec!["CRM_OWNER"]);
        assert_eq!(build.artifacts.len(), 2);
    }

    #[test]
    fn test_empty_accumulator_compiles_to_nothing() {
        let acc = PackageAccumulator::new(PackageKind::History);
        assert!(acc.is_empty());
        assert!(acc.compile().artifacts.is_empty());
    }
}
