//! Implementaciones Postgres (Diesel) de los contratos del core.
//!
//! - Un repositorio por etapa, cada uno escribiendo sólo en sus tablas.
//! - Toda escritura de etapa es una única transacción (fila padre + filas
//!   hijas). No hay transacciones que crucen etapas.
//! - Las listas se guardan como filas hijas con `position` explícito y se leen
//!   con `ORDER BY position`, lo que da paridad de orden con el backend en
//!   memoria.
//! - `save` sobre una clave existente borra el conjunto previo (cascada a
//!   hijos) antes de insertar.
//! - Reintento acotado ante errores transitorios.

use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::{debug, warn};

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;

mod delivery;
mod intake;
mod production;
mod quality;
mod runs;
mod strategy;

pub use delivery::PgPackageRepository;
pub use intake::PgBriefRepository;
pub use production::PgDraftRepository;
pub use quality::PgQcRepository;
pub use runs::PgRunStore;
pub use strategy::PgStrategyRepository;

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
///
/// Al construirlo se corre el set de migraciones pendientes (una sola vez).
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub type PgPooledConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Contrato: devuelve una conexión válida o `PersistenceError::TransientIo`.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
#[derive(Clone)]
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Determina si un error es transitorio (recomendado reintentar).
pub(crate) fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict => true,
        PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
            || m.contains("could not serialize access due to concurrent update")
            || m.contains("terminating connection due to administrator command")
            || m.contains("connection closed")
            || m.contains("connection refused")
            || m.contains("timeout")
        }
        _ => false,
    }
}

/// Reintento con backoff corto: hasta 3 reintentos (15ms, 30ms, 45ms).
///
/// `f` debe ser una unidad de trabajo completa (una transacción), por lo que
/// repetirla no altera la semántica.
pub(crate) fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms", attempts + 1, e, delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Posición de una fila hija.
pub(crate) fn position(index: usize) -> Result<i32, PersistenceError> {
    i32::try_from(index).map_err(|_| PersistenceError::Unknown(format!("list too long: index {index}")))
}

/// Construye un pool y corre las migraciones pendientes.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let validated_min = min_size.max(1);
    let validated_max = max_size.max(1);
    if validated_min > validated_max {
        warn!("min_size > max_size ({} > {}), ajustando min=max", validated_min, validated_max);
    }
    let final_min = validated_min.min(validated_max);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(final_min))
                                    .max_size(validated_max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    debug!("pool ready (min_idle={}, max_size={})", final_min, validated_max);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn retry_gives_up_after_three_retries() {
        let calls = Cell::new(0);
        let r: Result<(), _> = with_retry(|| {
            calls.set(calls.get() + 1);
            Err(PersistenceError::SerializationConflict)
        });
        assert!(r.is_err());
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let calls = Cell::new(0);
        let r: Result<(), _> = with_retry(|| {
            calls.set(calls.get() + 1);
            Err(PersistenceError::CheckViolation("score".into()))
        });
        assert!(r.is_err());
        assert_eq!(calls.get(), 1);
        assert!(is_retryable(&PersistenceError::Unknown("Deadlock detected".into())));
    }
}
