use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;

mod access;
mod allocation;
mod contributions;
mod funding_requests;
mod users;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Entry point of every operation.
///
/// The engine keeps no state between calls besides the database handle and
/// the allocation lock. Every operation that reads and then rewrites
/// allocation columns holds `allocation_lock` for the whole DB transaction,
/// so two sweeps never spend the same contribution.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    allocation_lock: Mutex<()>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> crate::ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            allocation_lock: Mutex::new(()),
        })
    }
}
