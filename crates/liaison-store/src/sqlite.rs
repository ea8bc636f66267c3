//! SQLite-backed store
//!
//! All row access goes through [`SqliteRepo`], which borrows either the
//! store's connection or an open transaction. That lets [`SqliteStore::atomically`]
//! hand the engine a repository whose writes commit or roll back together.

use std::path::Path;

use liaison_domain::traits::{
    AssignmentQuery, RelationshipQuery, RelationshipRepository, RelationshipStore,
};
use liaison_domain::{
    Actor, ActorId, ActorKind, Assignment, AssignmentId, AssignmentType, Attributes, Gender,
    Relationship, RelationshipId, RelationshipType, Role, ShareId, Timestamp,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql, TransactionBehavior};

use crate::StoreError;

const RELATIONSHIP_COLUMNS: &str = "id, origin_actor_id, destination_actor_id, relationship_type, \
     sub_type, origin_role, destination_role, is_bidirectional, is_exclusive, attributes, notes, \
     start_date, end_date, deleted_at, created_at, updated_at";

const ASSIGNMENT_COLUMNS: &str = "id, actor_id, share_id, assignment_type, percentage, notes, \
     start_date, end_date, deleted_at, created_at, updated_at";

/// SQLite-based implementation of the relationship store
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should own its own
/// `SqliteStore`; concurrent writers are serialized by SQLite itself, since
/// every atomic unit starts with `BEGIN IMMEDIATE`.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store at the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use liaison_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("liaison.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory store
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        self.conn.busy_timeout(std::time::Duration::from_secs(5))?;
        self.conn.execute_batch(include_str!("schema.sql"))?;
        tracing::debug!("relationship schema initialized");
        Ok(())
    }

    fn repo(&self) -> SqliteRepo<'_> {
        SqliteRepo { conn: &self.conn }
    }

    /// Insert or replace an actor record
    ///
    /// Actors belong to collaborator subsystems; this is their write path.
    pub fn upsert_actor(&mut self, actor: &Actor) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO actors (id, kind, display_name, gender, deleted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                 kind = excluded.kind, display_name = excluded.display_name,
                 gender = excluded.gender, deleted_at = excluded.deleted_at",
                params![
                    actor.id.to_bytes().as_slice(),
                    actor.kind.as_str(),
                    &actor.display_name,
                    actor.gender.as_str(),
                    opt_sql_ts(actor.deleted_at)?,
                ],
            )
            .map_err(|e| StoreError::from_write(e, "upsert actor"))?;
        Ok(())
    }

    /// Mark an actor as soft-deleted
    pub fn soft_delete_actor(&mut self, id: ActorId, at: Timestamp) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE actors SET deleted_at = ?2 WHERE id = ?1",
            params![id.to_bytes().as_slice(), to_sql_ts(at)?],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("actor {}", id)));
        }
        Ok(())
    }

    /// Every live actor, ordered by name
    pub fn list_actors(&self) -> Result<Vec<Actor>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, display_name, gender, deleted_at FROM actors
             WHERE deleted_at IS NULL ORDER BY display_name, id",
        )?;
        let actors = stmt
            .query_map([], actor_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(actors)
    }
}

impl RelationshipRepository for SqliteStore {
    type Error = StoreError;

    fn get_actor(&self, id: ActorId) -> Result<Option<Actor>, Self::Error> {
        self.repo().get_actor(id)
    }

    fn get_actors(&self, ids: &[ActorId]) -> Result<Vec<Actor>, Self::Error> {
        self.repo().get_actors(ids)
    }

    fn get_relationship(&self, id: RelationshipId) -> Result<Option<Relationship>, Self::Error> {
        self.repo().get_relationship(id)
    }

    fn find_relationships(
        &self,
        query: &RelationshipQuery,
    ) -> Result<Vec<Relationship>, Self::Error> {
        self.repo().find_relationships(query)
    }

    fn insert_relationship(&mut self, relationship: &Relationship) -> Result<(), Self::Error> {
        self.repo().insert_relationship(relationship)
    }

    fn update_relationship(&mut self, relationship: &Relationship) -> Result<(), Self::Error> {
        self.repo().update_relationship(relationship)
    }

    fn get_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>, Self::Error> {
        self.repo().get_assignment(id)
    }

    fn find_assignments(&self, query: &AssignmentQuery) -> Result<Vec<Assignment>, Self::Error> {
        self.repo().find_assignments(query)
    }

    fn insert_assignment(&mut self, assignment: &Assignment) -> Result<(), Self::Error> {
        self.repo().insert_assignment(assignment)
    }

    fn update_assignment(&mut self, assignment: &Assignment) -> Result<(), Self::Error> {
        self.repo().update_assignment(assignment)
    }
}

impl RelationshipStore for SqliteStore {
    fn atomically<T, E, F>(&mut self, op: F) -> Result<Result<T, E>, Self::Error>
    where
        F: FnOnce(&mut dyn RelationshipRepository<Error = Self::Error>) -> Result<T, E>,
    {
        // IMMEDIATE takes the write lock up front so two writers cannot both
        // pass the exclusivity lookup before either inserts.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let outcome = {
            let mut scoped = SqliteRepo { conn: &*tx };
            op(&mut scoped)
        };

        match outcome {
            Ok(value) => {
                tx.commit()?;
                Ok(Ok(value))
            }
            Err(err) => {
                tx.rollback()?;
                tracing::debug!("transaction rolled back");
                Ok(Err(err))
            }
        }
    }
}

/// Row access over a borrowed connection or transaction
pub struct SqliteRepo<'c> {
    conn: &'c Connection,
}

impl RelationshipRepository for SqliteRepo<'_> {
    type Error = StoreError;

    fn get_actor(&self, id: ActorId) -> Result<Option<Actor>, Self::Error> {
        let actor = self
            .conn
            .query_row(
                "SELECT id, kind, display_name, gender, deleted_at FROM actors WHERE id = ?1",
                params![id.to_bytes().as_slice()],
                actor_from_row,
            )
            .optional()?;
        Ok(actor)
    }

    fn get_actors(&self, ids: &[ActorId]) -> Result<Vec<Actor>, Self::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, kind, display_name, gender, deleted_at FROM actors WHERE id IN ({})",
            placeholders
        );
        let keys: Vec<Vec<u8>> = ids.iter().map(|id| id.to_bytes().to_vec()).collect();
        let param_refs: Vec<&dyn ToSql> = keys.iter().map(|k| k as &dyn ToSql).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let actors = stmt
            .query_map(&param_refs[..], actor_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(actors)
    }

    fn get_relationship(&self, id: RelationshipId) -> Result<Option<Relationship>, Self::Error> {
        let sql = format!("SELECT {} FROM relationships WHERE id = ?1", RELATIONSHIP_COLUMNS);
        let relationship = self
            .conn
            .query_row(&sql, params![id.to_bytes().as_slice()], relationship_from_row)
            .optional()?;
        Ok(relationship)
    }

    fn find_relationships(
        &self,
        query: &RelationshipQuery,
    ) -> Result<Vec<Relationship>, Self::Error> {
        let mut sql = format!("SELECT {} FROM relationships WHERE 1=1", RELATIONSHIP_COLUMNS);
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND deleted_at IS NULL");
        }

        if query.only_open {
            sql.push_str(" AND end_date IS NULL");
        }

        if let Some(origin) = query.origin {
            sql.push_str(" AND origin_actor_id = ?");
            params.push(Box::new(origin.to_bytes().to_vec()));
        }

        if let Some(destination) = query.destination {
            sql.push_str(" AND destination_actor_id = ?");
            params.push(Box::new(destination.to_bytes().to_vec()));
        }

        if let Some(actor) = query.either_party {
            sql.push_str(" AND (origin_actor_id = ? OR destination_actor_id = ?)");
            params.push(Box::new(actor.to_bytes().to_vec()));
            params.push(Box::new(actor.to_bytes().to_vec()));
        }

        if let Some(relationship_type) = query.relationship_type {
            sql.push_str(" AND relationship_type = ?");
            params.push(Box::new(relationship_type.as_str()));
        }

        if let Some(sub_type) = &query.sub_type {
            sql.push_str(" AND sub_type = ?");
            params.push(Box::new(sub_type.clone()));
        }

        if let Some(exclude) = query.exclude_id {
            sql.push_str(" AND id <> ?");
            params.push(Box::new(exclude.to_bytes().to_vec()));
        }

        sql.push_str(" ORDER BY created_at, id");

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let relationships = stmt
            .query_map(&param_refs[..], relationship_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(relationships)
    }

    fn insert_relationship(&mut self, rel: &Relationship) -> Result<(), Self::Error> {
        let attributes = serde_json::to_string(&rel.attributes)?;
        let sql = format!(
            "INSERT INTO relationships ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            RELATIONSHIP_COLUMNS
        );

        self.conn
            .execute(
                &sql,
                params![
                    rel.id.to_bytes().as_slice(),
                    rel.origin_actor_id.to_bytes().as_slice(),
                    rel.destination_actor_id.to_bytes().as_slice(),
                    rel.relationship_type.as_str(),
                    &rel.sub_type,
                    rel.origin_role.as_str(),
                    rel.destination_role.as_str(),
                    rel.is_bidirectional,
                    rel.exclusive,
                    attributes,
                    &rel.notes,
                    to_sql_ts(rel.start_date)?,
                    opt_sql_ts(rel.end_date)?,
                    opt_sql_ts(rel.deleted_at)?,
                    to_sql_ts(rel.created_at)?,
                    to_sql_ts(rel.updated_at)?,
                ],
            )
            .map_err(|e| StoreError::from_write(e, "insert relationship"))?;

        Ok(())
    }

    fn update_relationship(&mut self, rel: &Relationship) -> Result<(), Self::Error> {
        let attributes = serde_json::to_string(&rel.attributes)?;

        let changed = self
            .conn
            .execute(
                "UPDATE relationships SET
                 relationship_type = ?2, sub_type = ?3, origin_role = ?4, destination_role = ?5,
                 is_bidirectional = ?6, is_exclusive = ?7, attributes = ?8, notes = ?9,
                 start_date = ?10, end_date = ?11, deleted_at = ?12, updated_at = ?13
                 WHERE id = ?1",
                params![
                    rel.id.to_bytes().as_slice(),
                    rel.relationship_type.as_str(),
                    &rel.sub_type,
                    rel.origin_role.as_str(),
                    rel.destination_role.as_str(),
                    rel.is_bidirectional,
                    rel.exclusive,
                    attributes,
                    &rel.notes,
                    to_sql_ts(rel.start_date)?,
                    opt_sql_ts(rel.end_date)?,
                    opt_sql_ts(rel.deleted_at)?,
                    to_sql_ts(rel.updated_at)?,
                ],
            )
            .map_err(|e| StoreError::from_write(e, "update relationship"))?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("relationship {}", rel.id)));
        }
        Ok(())
    }

    fn get_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>, Self::Error> {
        let sql = format!("SELECT {} FROM share_assignments WHERE id = ?1", ASSIGNMENT_COLUMNS);
        let assignment = self
            .conn
            .query_row(&sql, params![id.to_bytes().as_slice()], assignment_from_row)
            .optional()?;
        Ok(assignment)
    }

    fn find_assignments(&self, query: &AssignmentQuery) -> Result<Vec<Assignment>, Self::Error> {
        let mut sql = format!("SELECT {} FROM share_assignments WHERE 1=1", ASSIGNMENT_COLUMNS);
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND deleted_at IS NULL");
        }

        if query.only_open {
            sql.push_str(" AND end_date IS NULL");
        }

        if let Some(actor) = query.actor {
            sql.push_str(" AND actor_id = ?");
            params.push(Box::new(actor.to_bytes().to_vec()));
        }

        if let Some(share) = query.share {
            sql.push_str(" AND share_id = ?");
            params.push(Box::new(share.to_bytes().to_vec()));
        }

        if let Some(assignment_type) = query.assignment_type {
            sql.push_str(" AND assignment_type = ?");
            params.push(Box::new(assignment_type.as_str()));
        }

        if let Some(exclude) = query.exclude_id {
            sql.push_str(" AND id <> ?");
            params.push(Box::new(exclude.to_bytes().to_vec()));
        }

        sql.push_str(" ORDER BY created_at, id");

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let assignments = stmt
            .query_map(&param_refs[..], assignment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(assignments)
    }

    fn insert_assignment(&mut self, a: &Assignment) -> Result<(), Self::Error> {
        let sql = format!(
            "INSERT INTO share_assignments ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            ASSIGNMENT_COLUMNS
        );

        self.conn
            .execute(
                &sql,
                params![
                    a.id.to_bytes().as_slice(),
                    a.actor_id.to_bytes().as_slice(),
                    a.share_id.to_bytes().as_slice(),
                    a.assignment_type.as_str(),
                    a.percentage,
                    &a.notes,
                    to_sql_ts(a.start_date)?,
                    opt_sql_ts(a.end_date)?,
                    opt_sql_ts(a.deleted_at)?,
                    to_sql_ts(a.created_at)?,
                    to_sql_ts(a.updated_at)?,
                ],
            )
            .map_err(|e| StoreError::from_write(e, "insert assignment"))?;

        Ok(())
    }

    fn update_assignment(&mut self, a: &Assignment) -> Result<(), Self::Error> {
        let changed = self
            .conn
            .execute(
                "UPDATE share_assignments SET
                 assignment_type = ?2, percentage = ?3, notes = ?4, start_date = ?5,
                 end_date = ?6, deleted_at = ?7, updated_at = ?8
                 WHERE id = ?1",
                params![
                    a.id.to_bytes().as_slice(),
                    a.assignment_type.as_str(),
                    a.percentage,
                    &a.notes,
                    to_sql_ts(a.start_date)?,
                    opt_sql_ts(a.end_date)?,
                    opt_sql_ts(a.deleted_at)?,
                    to_sql_ts(a.updated_at)?,
                ],
            )
            .map_err(|e| StoreError::from_write(e, "update assignment"))?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("assignment {}", a.id)));
        }
        Ok(())
    }
}

// SQLite integers are signed; timestamps past i64::MAX cannot be stored.
fn to_sql_ts(ts: Timestamp) -> Result<i64, StoreError> {
    i64::try_from(ts).map_err(|_| StoreError::InvalidData(format!("timestamp {} out of range", ts)))
}

fn opt_sql_ts(ts: Option<Timestamp>) -> Result<Option<i64>, StoreError> {
    ts.map(to_sql_ts).transpose()
}

fn conversion_error(col: usize, ty: Type, err: StoreError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, ty, Box::new(err))
}

fn invalid(col: usize, message: String) -> rusqlite::Error {
    conversion_error(col, Type::Text, StoreError::InvalidData(message))
}

fn id_column<T>(
    row: &Row<'_>,
    col: usize,
    parse: fn(&[u8]) -> Result<T, String>,
) -> rusqlite::Result<T> {
    let bytes: Vec<u8> = row.get(col)?;
    parse(&bytes).map_err(|e| conversion_error(col, Type::Blob, StoreError::InvalidData(e)))
}

fn ts_column(row: &Row<'_>, col: usize) -> rusqlite::Result<Timestamp> {
    Ok(row.get::<_, i64>(col)? as Timestamp)
}

fn opt_ts_column(row: &Row<'_>, col: usize) -> rusqlite::Result<Option<Timestamp>> {
    Ok(row.get::<_, Option<i64>>(col)?.map(|t| t as Timestamp))
}

fn role_column(row: &Row<'_>, col: usize) -> rusqlite::Result<Role> {
    let label: String = row.get(col)?;
    Role::parse(&label).ok_or_else(|| invalid(col, format!("Unknown role: {}", label)))
}

fn actor_from_row(row: &Row<'_>) -> rusqlite::Result<Actor> {
    let kind: String = row.get(1)?;
    let gender: String = row.get(3)?;

    Ok(Actor {
        id: id_column(row, 0, ActorId::from_bytes)?,
        kind: ActorKind::parse(&kind)
            .ok_or_else(|| invalid(1, format!("Unknown actor kind: {}", kind)))?,
        display_name: row.get(2)?,
        gender: Gender::parse(&gender),
        deleted_at: opt_ts_column(row, 4)?,
    })
}

fn relationship_from_row(row: &Row<'_>) -> rusqlite::Result<Relationship> {
    let relationship_type: String = row.get(3)?;
    let attributes_json: String = row.get(9)?;
    let attributes: Attributes = serde_json::from_str(&attributes_json)
        .map_err(|e| conversion_error(9, Type::Text, StoreError::Serialization(e)))?;

    Ok(Relationship {
        id: id_column(row, 0, RelationshipId::from_bytes)?,
        origin_actor_id: id_column(row, 1, ActorId::from_bytes)?,
        destination_actor_id: id_column(row, 2, ActorId::from_bytes)?,
        relationship_type: RelationshipType::parse(&relationship_type).ok_or_else(|| {
            invalid(3, format!("Unknown relationship type: {}", relationship_type))
        })?,
        sub_type: row.get(4)?,
        origin_role: role_column(row, 5)?,
        destination_role: role_column(row, 6)?,
        is_bidirectional: row.get(7)?,
        exclusive: row.get(8)?,
        attributes,
        notes: row.get(10)?,
        start_date: ts_column(row, 11)?,
        end_date: opt_ts_column(row, 12)?,
        deleted_at: opt_ts_column(row, 13)?,
        created_at: ts_column(row, 14)?,
        updated_at: ts_column(row, 15)?,
    })
}

fn assignment_from_row(row: &Row<'_>) -> rusqlite::Result<Assignment> {
    let assignment_type: String = row.get(3)?;

    Ok(Assignment {
        id: id_column(row, 0, AssignmentId::from_bytes)?,
        actor_id: id_column(row, 1, ActorId::from_bytes)?,
        share_id: id_column(row, 2, ShareId::from_bytes)?,
        assignment_type: AssignmentType::parse(&assignment_type).ok_or_else(|| {
            invalid(3, format!("Unknown assignment type: {}", assignment_type))
        })?,
        percentage: row.get(4)?,
        notes: row.get(5)?,
        start_date: ts_column(row, 6)?,
        end_date: opt_ts_column(row, 7)?,
        deleted_at: opt_ts_column(row, 8)?,
        created_at: ts_column(row, 9)?,
        updated_at: ts_column(row, 10)?,
    })
}
