//! SQLite storage implementation.

use color_eyre::eyre::WrapErr as _;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;

use crate::models::*;
use crate::schema::*;
use crate::traits::*;
use relay_core::{NewNotification, NotificationRecord, Outcome, RecordId, Status};

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// Waits on locked databases instead of failing immediately when several
/// pooled connections write at once.
#[derive(Debug)]
struct BusyTimeout;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for BusyTimeout {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        diesel::sql_query("PRAGMA busy_timeout = 5000")
            .execute(conn)
            .map(|_| ())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// SQLite-based storage.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage from a database URL.
    pub fn new(database_url: &str) -> color_eyre::eyre::Result<Self> {
        Self::with_pool_size(database_url, 10)
    }

    /// Create a private in-memory database.
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool is
    /// held to a single connection.
    pub fn in_memory() -> color_eyre::eyre::Result<Self> {
        Self::with_pool_size(":memory:", 1)
    }

    fn with_pool_size(database_url: &str, size: u32) -> color_eyre::eyre::Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(size)
            .connection_customizer(Box::new(BusyTimeout))
            .build(manager)
            .wrap_err("failed to create connection pool")?;

        Ok(Self { pool })
    }

    /// Run migrations.
    pub fn run_migrations(&self) -> color_eyre::eyre::Result<()> {
        use diesel_migrations::MigrationHarness as _;

        let mut conn = self
            .pool
            .get()
            .wrap_err("failed to get connection for migrations")?;

        conn.run_pending_migrations(crate::MIGRATIONS)
            .map_err(|e| color_eyre::eyre::eyre!("migration failed: {}", e))?;

        Ok(())
    }

    fn conn(
        &self,
    ) -> color_eyre::eyre::Result<diesel::r2d2::PooledConnection<ConnectionManager<SqliteConnection>>>
    {
        self.pool
            .get()
            .wrap_err("failed to get database connection")
    }
}

impl NotificationStore for SqliteStorage {
    fn insert(&self, new: &NewNotification) -> color_eyre::eyre::Result<NotificationRecord> {
        let mut conn = self.conn()?;
        let id = RecordId::new(uuid::Uuid::new_v4().to_string());
        let now = chrono::Utc::now();
        let payload =
            serde_json::to_string(&new.payload).wrap_err("failed to encode notification payload")?;

        let row = NewNotificationRow {
            id: id.as_str(),
            title: &new.title,
            body: &new.body,
            destination_token: &new.destination_token,
            payload: &payload,
            status: Status::Pending.as_str(),
            created_at: now.naive_utc(),
        };

        diesel::insert_into(push_notifications::table)
            .values(&row)
            .execute(&mut conn)
            .wrap_err("failed to insert notification")?;

        tracing::debug!(notification_id = %id, "notification stored");

        Ok(NotificationRecord::pending(id, new.clone(), now))
    }

    fn get(&self, id: &RecordId) -> color_eyre::eyre::Result<Option<NotificationRecord>> {
        let mut conn = self.conn()?;

        let row: Option<NotificationRow> = push_notifications::table
            .filter(push_notifications::id.eq(id.as_str()))
            .select(NotificationRow::as_select())
            .first(&mut conn)
            .optional()
            .wrap_err("failed to get notification")?;

        row.map(NotificationRecord::try_from).transpose()
    }
}

impl OutcomeStore for SqliteStorage {
    fn record_outcome(&self, id: &RecordId, outcome: &Outcome) -> color_eyre::eyre::Result<bool> {
        let mut conn = self.conn()?;

        // Only pending rows are touched, so a terminal record is never rewritten.
        let target = push_notifications::table
            .filter(push_notifications::id.eq(id.as_str()))
            .filter(push_notifications::status.eq(Status::Pending.as_str()));

        let updated = match outcome {
            Outcome::Sent { message_id, at } => diesel::update(target)
                .set((
                    push_notifications::status.eq(Status::Sent.as_str()),
                    push_notifications::sent_at.eq(Some(at.naive_utc())),
                    push_notifications::message_id.eq(Some(message_id.as_str())),
                ))
                .execute(&mut conn),
            Outcome::Failed { detail, at } => diesel::update(target)
                .set((
                    push_notifications::status.eq(Status::Failed.as_str()),
                    push_notifications::failed_at.eq(Some(at.naive_utc())),
                    push_notifications::error_detail.eq(Some(detail.as_str())),
                ))
                .execute(&mut conn),
        }
        .wrap_err("failed to record notification outcome")?;

        Ok(updated > 0)
    }
}
