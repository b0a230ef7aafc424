//! Migraciones embebidas y harness de reversibilidad.
//!
//! Una migración por etapa (más la del run store). Cada una crea sólo las
//! tablas de su dueño y su `down.sql` las elimina. Al construir el pool se
//! corren las pendientes una sola vez.

use delivery_domain::Stage;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Array, Text};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, info};

use crate::error::PersistenceError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub const RUN_TABLES: &[&str] = &["workflow_runs", "workflow_run_steps"];

/// Tablas que posee cada etapa.
pub fn stage_tables(stage: Stage) -> &'static [&'static str] {
    match stage {
        Stage::Intake => &["briefs"],
        Stage::Strategy => &["strategies", "strategy_tactics"],
        Stage::Production => &["draft_bundles", "draft_assets"],
        Stage::Quality => &["qc_results", "qc_issues"],
        Stage::Delivery => &["delivery_packages", "delivery_artifacts"],
    }
}

/// Todas las tablas gestionadas, en orden de migración.
pub fn managed_tables() -> Vec<String> {
    RUN_TABLES.iter()
              .copied()
              .chain(Stage::ALL.iter().flat_map(|s| stage_tables(*s).iter().copied()))
              .map(str::to_string)
              .collect()
}

fn migration_err(e: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::Migration(e.to_string())
}

pub fn run_pending_migrations(conn: &mut PgConnection) -> Result<(), PersistenceError> {
    upgrade_to_head(conn).map(|_| ())
}

/// Aplica todas las migraciones pendientes y devuelve las versiones aplicadas.
pub fn upgrade_to_head(conn: &mut PgConnection) -> Result<Vec<String>, PersistenceError> {
    let applied = conn.run_pending_migrations(MIGRATIONS)
                      .map_err(migration_err)?
                      .iter()
                      .map(|v| v.to_string())
                      .collect::<Vec<_>>();
    if !applied.is_empty() {
        info!("migrations applied: {:?}", applied);
    }
    Ok(applied)
}

/// Revierte las últimas `steps` migraciones (más reciente primero).
pub fn downgrade(conn: &mut PgConnection, steps: usize) -> Result<Vec<String>, PersistenceError> {
    let mut reverted = Vec::with_capacity(steps);
    for _ in 0..steps {
        let version = conn.revert_last_migration(MIGRATIONS).map_err(migration_err)?;
        debug!("migration reverted: {}", version);
        reverted.push(version.to_string());
    }
    Ok(reverted)
}

/// Versiones aplicadas, en orden ascendente.
pub fn applied_versions(conn: &mut PgConnection) -> Result<Vec<String>, PersistenceError> {
    let mut versions: Vec<String> = conn.applied_migrations()
                                        .map_err(migration_err)?
                                        .iter()
                                        .map(|v| v.to_string())
                                        .collect();
    versions.sort();
    Ok(versions)
}

#[derive(QueryableByName, Debug)]
struct ColumnRow {
    #[diesel(sql_type = Text)]
    table_name: String,
    #[diesel(sql_type = Text)]
    column_name: String,
    #[diesel(sql_type = Text)]
    data_type: String,
    #[diesel(sql_type = Text)]
    is_nullable: String,
    #[diesel(sql_type = Text)]
    column_default: String,
}

#[derive(QueryableByName, Debug)]
struct DefinitionRow {
    #[diesel(sql_type = Text)]
    table_name: String,
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Text)]
    definition: String,
}

#[derive(QueryableByName, Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    #[diesel(sql_type = Text)]
    pub table_name: String,
    #[diesel(sql_type = Text)]
    pub referenced_table: String,
}

/// Volcado textual canónico (columnas, índices y constraints) de las tablas
/// gestionadas. Dos esquemas equivalentes producen exactamente el mismo texto.
pub fn schema_snapshot(conn: &mut PgConnection) -> Result<String, PersistenceError> {
    let tables = managed_tables();

    let columns: Vec<ColumnRow> = sql_query("SELECT table_name::text AS table_name, column_name::text AS column_name, \
                                             data_type::text AS data_type, is_nullable::text AS is_nullable, \
                                             COALESCE(column_default, '')::text AS column_default \
                                             FROM information_schema.columns \
                                             WHERE table_schema = current_schema() AND table_name = ANY($1) \
                                             ORDER BY table_name, ordinal_position")
        .bind::<Array<Text>, _>(tables.clone())
        .load(conn)?;

    let indexes: Vec<DefinitionRow> = sql_query("SELECT tablename::text AS table_name, indexname::text AS name, \
                                                 indexdef::text AS definition \
                                                 FROM pg_indexes \
                                                 WHERE schemaname = current_schema() AND tablename = ANY($1) \
                                                 ORDER BY tablename, indexname")
        .bind::<Array<Text>, _>(tables.clone())
        .load(conn)?;

    let constraints: Vec<DefinitionRow> = sql_query("SELECT c.relname::text AS table_name, con.conname::text AS name, \
                                                     pg_get_constraintdef(con.oid)::text AS definition \
                                                     FROM pg_constraint con \
                                                     JOIN pg_class c ON c.oid = con.conrelid \
                                                     JOIN pg_namespace n ON n.oid = c.relnamespace \
                                                     WHERE n.nspname = current_schema() AND c.relname = ANY($1) \
                                                     ORDER BY c.relname, con.conname")
        .bind::<Array<Text>, _>(tables.clone())
        .load(conn)?;

    let mut out = String::new();
    for c in &columns {
        out.push_str(&format!("column {}.{} {} nullable={} default={}\n",
                              c.table_name, c.column_name, c.data_type, c.is_nullable, c.column_default));
    }
    for i in &indexes {
        out.push_str(&format!("index {}.{} {}\n", i.table_name, i.name, i.definition));
    }
    for k in &constraints {
        out.push_str(&format!("constraint {}.{} {}\n", k.table_name, k.name, k.definition));
    }
    Ok(out)
}

/// Claves foráneas entre tablas gestionadas.
pub fn foreign_keys(conn: &mut PgConnection) -> Result<Vec<ForeignKey>, PersistenceError> {
    let tables = managed_tables();
    let rows = sql_query("SELECT c.relname::text AS table_name, r.relname::text AS referenced_table \
                          FROM pg_constraint con \
                          JOIN pg_class c ON c.oid = con.conrelid \
                          JOIN pg_class r ON r.oid = con.confrelid \
                          JOIN pg_namespace n ON n.oid = c.relnamespace \
                          WHERE con.contype = 'f' AND n.nspname = current_schema() AND c.relname = ANY($1) \
                          ORDER BY 1, 2")
        .bind::<Array<Text>, _>(tables)
        .load(conn)?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_managed_table_has_exactly_one_owner() {
        let tables = managed_tables();
        let mut dedup = tables.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), tables.len());
        assert_eq!(tables.len(), 11);
    }
}
