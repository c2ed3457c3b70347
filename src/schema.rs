//! Entity descriptors and DDL generation for the analytical store
//!
//! Every table the service writes to is described by a plain
//! [`EntityDescriptor`]. Descriptors are registered once at startup through
//! [`register_builtin_entities`] and the registry is read-only afterwards.

use thiserror::Error;

/// Columns whose name starts with this prefix are bookkeeping fields and
/// never reach the store.
pub const RESERVED_PREFIX: &str = "_";

/// Default storage engine: append-optimized, sorted-merge.
pub const DEFAULT_ENGINE: &str = "MergeTree()";

/// Name of the built-in telemetry table
pub const MODEL_LOGS_TABLE: &str = "ModelLogs";

/// A single typed column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
}

impl ColumnDef {
    pub const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self { name, sql_type }
    }

    pub fn is_reserved(&self) -> bool {
        self.name.starts_with(RESERVED_PREFIX)
    }
}

/// Declarative description of a store table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub name: &'static str,
    /// Declaration order is the column order of the generated DDL
    pub columns: &'static [ColumnDef],
    /// Storage engine; `None` selects [`DEFAULT_ENGINE`]
    pub engine: Option<&'static str>,
    /// Clause emitted after the engine, e.g. `ORDER BY datetime`
    pub table_options: &'static str,
}

impl EntityDescriptor {
    /// Columns that are written to the store, in declaration order
    pub fn store_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| !c.is_reserved())
    }

    pub fn store_column_names(&self) -> Vec<String> {
        self.store_columns().map(|c| c.name.to_string()).collect()
    }
}

/// Built-in telemetry entity: one row per intercepted prediction
pub const MODEL_LOGS: EntityDescriptor = EntityDescriptor {
    name: MODEL_LOGS_TABLE,
    columns: &[
        ColumnDef::new("predicted_tip", "String"),
        ColumnDef::new("words_count", "Int32"),
        ColumnDef::new("datetime", "DateTime"),
    ],
    engine: None,
    table_options: "ORDER BY datetime",
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Entity already registered: {0}")]
    DuplicateEntity(&'static str),

    #[error("Entity {0} has no columns visible to the store")]
    NoStoreColumns(&'static str),
}

/// Process-wide list of entity descriptors
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    descriptors: Vec<EntityDescriptor>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Each entity may be registered exactly once.
    pub fn register(&mut self, descriptor: EntityDescriptor) -> Result<(), RegistryError> {
        if self.descriptors.iter().any(|d| d.name == descriptor.name) {
            return Err(RegistryError::DuplicateEntity(descriptor.name));
        }
        if descriptor.store_columns().next().is_none() {
            return Err(RegistryError::NoStoreColumns(descriptor.name));
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn all_descriptors(&self) -> &[EntityDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, name: &str) -> Option<&EntityDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }
}

/// Build the registry with every entity the service owns.
///
/// Called once during startup, before any table creation runs.
pub fn register_builtin_entities() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    // MODEL_LOGS has store columns and is the only built-in entity
    if let Err(e) = registry.register(MODEL_LOGS) {
        tracing::error!(error = %e, "Failed to register built-in entity");
    }
    registry
}

/// Column list `(col1 type1, col2 type2, ...)`, reserved columns excluded
pub fn generate_ddl(descriptor: &EntityDescriptor) -> String {
    let columns = descriptor
        .store_columns()
        .map(|c| format!("{} {}", c.name, c.sql_type))
        .collect::<Vec<_>>()
        .join(", ");
    format!("({})", columns)
}

pub fn engine_for(descriptor: &EntityDescriptor) -> &'static str {
    descriptor.engine.unwrap_or(DEFAULT_ENGINE)
}

pub fn after_engine_clause_for(descriptor: &EntityDescriptor) -> &'static str {
    descriptor.table_options
}

/// Full idempotent `CREATE TABLE IF NOT EXISTS` statement.
///
/// The table is qualified with `database` when one is given.
pub fn create_table_statement(descriptor: &EntityDescriptor, database: Option<&str>) -> String {
    let table = match database {
        Some(db) => crate::store::qualified_table(db, descriptor.name),
        None => format!("`{}`", descriptor.name),
    };

    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {} {} ENGINE = {}",
        table,
        generate_ddl(descriptor),
        engine_for(descriptor)
    );

    let options = after_engine_clause_for(descriptor).trim();
    if !options.is_empty() {
        sql.push(' ');
        sql.push_str(options);
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: EntityDescriptor = EntityDescriptor {
        name: "Mixed",
        columns: &[
            ColumnDef::new("a", "String"),
            ColumnDef::new("_internal", "Int32"),
            ColumnDef::new("b", "DateTime"),
        ],
        engine: Some("ReplacingMergeTree()"),
        table_options: "",
    };

    #[test]
    fn test_generate_ddl_excludes_reserved_columns() {
        assert_eq!(generate_ddl(&MIXED), "(a String, b DateTime)");
    }

    #[test]
    fn test_generate_ddl_preserves_declaration_order() {
        assert_eq!(
            generate_ddl(&MODEL_LOGS),
            "(predicted_tip String, words_count Int32, datetime DateTime)"
        );
    }

    #[test]
    fn test_create_table_statement_model_logs() {
        let sql = create_table_statement(&MODEL_LOGS, Some("default"));
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS `default`.`ModelLogs` \
             (predicted_tip String, words_count Int32, datetime DateTime) \
             ENGINE = MergeTree() ORDER BY datetime"
        );
    }

    #[test]
    fn test_create_table_statement_custom_engine_without_options() {
        let sql = create_table_statement(&MIXED, None);
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS `Mixed` (a String, b DateTime) ENGINE = ReplacingMergeTree()"
        );
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = SchemaRegistry::new();
        registry.register(MODEL_LOGS).unwrap();
        assert_eq!(
            registry.register(MODEL_LOGS),
            Err(RegistryError::DuplicateEntity("ModelLogs"))
        );
        assert_eq!(registry.all_descriptors().len(), 1);
    }

    #[test]
    fn test_register_rejects_entity_without_store_columns() {
        const HIDDEN: EntityDescriptor = EntityDescriptor {
            name: "Hidden",
            columns: &[ColumnDef::new("_only", "String")],
            engine: None,
            table_options: "",
        };
        let mut registry = SchemaRegistry::new();
        assert!(registry.register(HIDDEN).is_err());
    }

    #[test]
    fn test_registry_error_display() {
        let err: Box<dyn std::error::Error> = Box::new(RegistryError::NoStoreColumns("Hidden"));
        assert_eq!(err.to_string(), "Entity Hidden has no columns visible to the store");
        assert_eq!(
            RegistryError::DuplicateEntity("ModelLogs").to_string(),
            "Entity already registered: ModelLogs"
        );
    }

    #[test]
    fn test_builtin_registry_contains_model_logs() {
        let registry = register_builtin_entities();
        let logs = registry.get(MODEL_LOGS_TABLE).unwrap();
        assert_eq!(
            logs.store_column_names(),
            vec!["predicted_tip", "words_count", "datetime"]
        );
    }
}
