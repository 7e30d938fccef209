//! DocumentStore - Embedded SurrealDB Document Mapper
//!
//! All persistence goes through this thin record-mapper over an embedded
//! SurrealDB instance (RocksDB engine). Every collection is SCHEMALESS; the
//! mapper owns the translation between the domain structs in
//! [`crate::models`] and the stored documents.
//!
//! # Conventions
//!
//! - Record ids are `type::thing(table, uuid)`; the domain id is mirrored in
//!   a `uuid` field and all lookups filter on it.
//! - Timestamps are stored as RFC 3339 strings and parsed back leniently.
//! - Mirror structs (`UserRecord`, `NodeRecord`, ...) omit the native `id`
//!   field so query results deserialize without record-id handling.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::engine::local::{Db, RocksDb};
use surrealdb::Surreal;

use crate::db::DatabaseError;
use crate::models::{Group, Key, Node, Path, Slot, SoftType, User};

type Result<T> = std::result::Result<T, DatabaseError>;

/// Parse a stored RFC 3339 timestamp, falling back to now on malformed data.
fn parse_ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    uuid: String,
    email: String,
    password_hash: String,
    is_active: bool,
    verification: String,
    groups: Vec<String>,
    created_at: String,
    modified_at: String,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        User {
            id: r.uuid,
            email: r.email,
            password_hash: r.password_hash,
            is_active: r.is_active,
            verification: r.verification,
            groups: r.groups,
            created_at: parse_ts(&r.created_at),
            modified_at: parse_ts(&r.modified_at),
        }
    }
}

impl From<&User> for UserRecord {
    fn from(u: &User) -> Self {
        UserRecord {
            uuid: u.id.clone(),
            email: u.email.clone(),
            password_hash: u.password_hash.clone(),
            is_active: u.is_active,
            verification: u.verification.clone(),
            groups: u.groups.clone(),
            created_at: u.created_at.to_rfc3339(),
            modified_at: u.modified_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GroupRecord {
    uuid: String,
    name: String,
    permissions: Vec<String>,
}

impl From<GroupRecord> for Group {
    fn from(r: GroupRecord) -> Self {
        Group {
            id: r.uuid,
            name: r.name,
            permissions: r.permissions,
        }
    }
}

impl From<&Group> for GroupRecord {
    fn from(g: &Group) -> Self {
        GroupRecord {
            uuid: g.id.clone(),
            name: g.name.clone(),
            permissions: g.permissions.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SoftTypeRecord {
    uuid: String,
    name: String,
    repr: String,
    is_primitive: bool,
    validator: Option<String>,
    created_at: String,
    modified_at: String,
}

impl From<SoftTypeRecord> for SoftType {
    fn from(r: SoftTypeRecord) -> Self {
        SoftType {
            id: r.uuid,
            name: r.name,
            repr: r.repr,
            is_primitive: r.is_primitive,
            validator: r.validator,
            created_at: parse_ts(&r.created_at),
            modified_at: parse_ts(&r.modified_at),
        }
    }
}

impl From<&SoftType> for SoftTypeRecord {
    fn from(t: &SoftType) -> Self {
        SoftTypeRecord {
            uuid: t.id.clone(),
            name: t.name.clone(),
            repr: t.repr.clone(),
            is_primitive: t.is_primitive,
            validator: t.validator.clone(),
            created_at: t.created_at.to_rfc3339(),
            modified_at: t.modified_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeRecord {
    uuid: String,
    title: String,
    description: String,
    keys: Vec<String>,
    row_count: i64,
    created_at: String,
    modified_at: String,
}

impl From<NodeRecord> for Node {
    fn from(r: NodeRecord) -> Self {
        Node {
            id: r.uuid,
            title: r.title,
            description: r.description,
            keys: r.keys,
            row_count: r.row_count,
            created_at: parse_ts(&r.created_at),
            modified_at: parse_ts(&r.modified_at),
        }
    }
}

impl From<&Node> for NodeRecord {
    fn from(n: &Node) -> Self {
        NodeRecord {
            uuid: n.id.clone(),
            title: n.title.clone(),
            description: n.description.clone(),
            keys: n.keys.clone(),
            row_count: n.row_count,
            created_at: n.created_at.to_rfc3339(),
            modified_at: n.modified_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyRecord {
    uuid: String,
    name: String,
    soft_type: String,
    size: Option<usize>,
    created_at: String,
}

impl From<KeyRecord> for Key {
    fn from(r: KeyRecord) -> Self {
        Key {
            id: r.uuid,
            name: r.name,
            soft_type: r.soft_type,
            size: r.size,
            created_at: parse_ts(&r.created_at),
        }
    }
}

impl From<&Key> for KeyRecord {
    fn from(k: &Key) -> Self {
        KeyRecord {
            uuid: k.id.clone(),
            name: k.name.clone(),
            soft_type: k.soft_type.clone(),
            size: k.size,
            created_at: k.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotRecord {
    uuid: String,
    key_id: String,
    row: i64,
    value: String,
    created_at: String,
    modified_at: String,
}

impl From<SlotRecord> for Slot {
    fn from(r: SlotRecord) -> Self {
        Slot {
            id: r.uuid,
            key_id: r.key_id,
            row: r.row,
            value: r.value,
            created_at: parse_ts(&r.created_at),
            modified_at: parse_ts(&r.modified_at),
        }
    }
}

impl From<&Slot> for SlotRecord {
    fn from(s: &Slot) -> Self {
        SlotRecord {
            uuid: s.id.clone(),
            key_id: s.key_id.clone(),
            row: s.row,
            value: s.value.clone(),
            created_at: s.created_at.to_rfc3339(),
            modified_at: s.modified_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PathRecord {
    uuid: String,
    name: String,
    parent: Option<String>,
    node: Option<String>,
    created_at: String,
}

impl From<PathRecord> for Path {
    fn from(r: PathRecord) -> Self {
        Path {
            id: r.uuid,
            name: r.name,
            parent: r.parent,
            node: r.node,
            created_at: parse_ts(&r.created_at),
        }
    }
}

impl From<&Path> for PathRecord {
    fn from(p: &Path) -> Self {
        PathRecord {
            uuid: p.id.clone(),
            name: p.name.clone(),
            parent: p.parent.clone(),
            node: p.node.clone(),
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// Embedded document store for all 1Base collections.
pub struct DocumentStore {
    /// SurrealDB connection (embedded RocksDB)
    db: Arc<Surreal<Db>>,
}

impl DocumentStore {
    /// Open (or create) the store at the given path.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionFailed` if the engine cannot be initialized or the
    /// namespace/database selection fails.
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        db.use_ns("onebase")
            .use_db("main")
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Arc::new(db);
        Self::initialize_schema(&db).await?;

        Ok(Self { db })
    }

    /// Create the SCHEMALESS collections.
    async fn initialize_schema(db: &Surreal<Db>) -> Result<()> {
        let tables = [
            "users",
            "groups",
            "soft_types",
            "nodes",
            "node_keys",
            "slots",
            "paths",
        ];
        for table in tables {
            db.query(format!("DEFINE TABLE IF NOT EXISTS {} SCHEMALESS;", table))
                .await?;
        }
        Ok(())
    }

    /// Raw database handle (test and maintenance use).
    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }

    async fn create_record<R>(&self, table: &'static str, uuid: String, record: R) -> Result<()>
    where
        R: Serialize + Send + 'static,
    {
        self.db
            .query("CREATE type::thing($table, $id) CONTENT $data;")
            .bind(("table", table))
            .bind(("id", uuid))
            .bind(("data", record))
            .await?;
        Ok(())
    }

    //
    // USERS
    //

    /// Persist a new user.
    pub async fn create_user(&self, user: User) -> Result<User> {
        self.create_record("users", user.id.clone(), UserRecord::from(&user))
            .await?;
        Ok(user)
    }

    /// Look a user up by id.
    pub async fn user_by_id(&self, id: &str) -> Result<Option<User>> {
        let mut response = self
            .db
            .query("SELECT * FROM users WHERE uuid = $uuid LIMIT 1;")
            .bind(("uuid", id.to_string()))
            .await?;
        let records: Vec<UserRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).next())
    }

    /// Look a user up by email address.
    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut response = self
            .db
            .query("SELECT * FROM users WHERE email = $email LIMIT 1;")
            .bind(("email", email.to_string()))
            .await?;
        let records: Vec<UserRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).next())
    }

    /// Look a user up by verification token.
    pub async fn user_by_verification(&self, token: &str) -> Result<Option<User>> {
        let mut response = self
            .db
            .query("SELECT * FROM users WHERE verification = $token LIMIT 1;")
            .bind(("token", token.to_string()))
            .await?;
        let records: Vec<UserRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).next())
    }

    /// Replace a stored user document.
    pub async fn update_user(&self, user: &User) -> Result<()> {
        self.db
            .query("UPDATE users CONTENT $data WHERE uuid = $uuid;")
            .bind(("uuid", user.id.clone()))
            .bind(("data", UserRecord::from(user)))
            .await?;
        Ok(())
    }

    //
    // GROUPS
    //

    /// Persist a new group.
    pub async fn create_group(&self, group: Group) -> Result<Group> {
        self.create_record("groups", group.id.clone(), GroupRecord::from(&group))
            .await?;
        Ok(group)
    }

    /// Look a group up by name.
    pub async fn group_by_name(&self, name: &str) -> Result<Option<Group>> {
        let mut response = self
            .db
            .query("SELECT * FROM groups WHERE name = $name LIMIT 1;")
            .bind(("name", name.to_string()))
            .await?;
        let records: Vec<GroupRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).next())
    }

    /// Fetch groups by id, in store order.
    pub async fn groups_by_ids(&self, ids: &[String]) -> Result<Vec<Group>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut response = self
            .db
            .query("SELECT * FROM groups WHERE uuid IN $ids;")
            .bind(("ids", ids.to_vec()))
            .await?;
        let records: Vec<GroupRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    //
    // TYPE REGISTRY
    //

    /// Persist a new type.
    pub async fn create_soft_type(&self, soft_type: SoftType) -> Result<SoftType> {
        self.create_record(
            "soft_types",
            soft_type.id.clone(),
            SoftTypeRecord::from(&soft_type),
        )
        .await?;
        Ok(soft_type)
    }

    /// Look a type up by id.
    pub async fn soft_type_by_id(&self, id: &str) -> Result<Option<SoftType>> {
        let mut response = self
            .db
            .query("SELECT * FROM soft_types WHERE uuid = $uuid LIMIT 1;")
            .bind(("uuid", id.to_string()))
            .await?;
        let records: Vec<SoftTypeRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).next())
    }

    /// Look a type up by registry name.
    pub async fn soft_type_by_name(&self, name: &str) -> Result<Option<SoftType>> {
        let mut response = self
            .db
            .query("SELECT * FROM soft_types WHERE name = $name LIMIT 1;")
            .bind(("name", name.to_string()))
            .await?;
        let records: Vec<SoftTypeRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).next())
    }

    /// Fetch types by id.
    pub async fn soft_types_by_ids(&self, ids: &[String]) -> Result<Vec<SoftType>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut response = self
            .db
            .query("SELECT * FROM soft_types WHERE uuid IN $ids;")
            .bind(("ids", ids.to_vec()))
            .await?;
        let records: Vec<SoftTypeRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// List the whole registry, ordered by name.
    pub async fn list_soft_types(&self) -> Result<Vec<SoftType>> {
        let mut response = self
            .db
            .query("SELECT * FROM soft_types ORDER BY name ASC;")
            .await?;
        let records: Vec<SoftTypeRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Replace a stored type document.
    pub async fn update_soft_type(&self, soft_type: &SoftType) -> Result<()> {
        self.db
            .query("UPDATE soft_types CONTENT $data WHERE uuid = $uuid;")
            .bind(("uuid", soft_type.id.clone()))
            .bind(("data", SoftTypeRecord::from(soft_type)))
            .await?;
        Ok(())
    }

    /// Delete a type from the registry.
    pub async fn delete_soft_type(&self, id: &str) -> Result<()> {
        self.db
            .query("DELETE FROM soft_types WHERE uuid = $uuid;")
            .bind(("uuid", id.to_string()))
            .await?;
        Ok(())
    }

    //
    // NODES & KEYS
    //

    /// Persist a new node.
    pub async fn create_node(&self, node: Node) -> Result<Node> {
        self.create_record("nodes", node.id.clone(), NodeRecord::from(&node))
            .await?;
        Ok(node)
    }

    /// Look a node up by id.
    pub async fn node_by_id(&self, id: &str) -> Result<Option<Node>> {
        let mut response = self
            .db
            .query("SELECT * FROM nodes WHERE uuid = $uuid LIMIT 1;")
            .bind(("uuid", id.to_string()))
            .await?;
        let records: Vec<NodeRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).next())
    }

    /// Replace a stored node document.
    pub async fn update_node(&self, node: &Node) -> Result<()> {
        self.db
            .query("UPDATE nodes CONTENT $data WHERE uuid = $uuid;")
            .bind(("uuid", node.id.clone()))
            .bind(("data", NodeRecord::from(node)))
            .await?;
        Ok(())
    }

    /// Persist a new key definition.
    pub async fn create_key(&self, key: Key) -> Result<Key> {
        self.create_record("node_keys", key.id.clone(), KeyRecord::from(&key))
            .await?;
        Ok(key)
    }

    /// Fetch key definitions by id (unordered; callers re-order by the
    /// owning node's key list).
    pub async fn keys_by_ids(&self, ids: &[String]) -> Result<Vec<Key>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut response = self
            .db
            .query("SELECT * FROM node_keys WHERE uuid IN $ids;")
            .bind(("ids", ids.to_vec()))
            .await?;
        let records: Vec<KeyRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    //
    // SLOTS
    //

    /// Persist a new slot.
    pub async fn create_slot(&self, slot: Slot) -> Result<Slot> {
        self.create_record("slots", slot.id.clone(), SlotRecord::from(&slot))
            .await?;
        Ok(slot)
    }

    /// Fetch the slot of a key at a row, if populated.
    pub async fn slot_for(&self, key_id: &str, row: i64) -> Result<Option<Slot>> {
        let mut response = self
            .db
            .query("SELECT * FROM slots WHERE key_id = $key_id AND row = $row LIMIT 1;")
            .bind(("key_id", key_id.to_string()))
            .bind(("row", row))
            .await?;
        let records: Vec<SlotRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).next())
    }

    /// Fetch every slot belonging to the given keys.
    pub async fn slots_for_keys(&self, key_ids: &[String]) -> Result<Vec<Slot>> {
        if key_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut response = self
            .db
            .query("SELECT * FROM slots WHERE key_id IN $keys;")
            .bind(("keys", key_ids.to_vec()))
            .await?;
        let records: Vec<SlotRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Fetch the slots of the given keys at the given rows.
    pub async fn slots_for_rows(&self, key_ids: &[String], rows: &[i64]) -> Result<Vec<Slot>> {
        if key_ids.is_empty() || rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut response = self
            .db
            .query("SELECT * FROM slots WHERE key_id IN $keys AND row IN $rows;")
            .bind(("keys", key_ids.to_vec()))
            .bind(("rows", rows.to_vec()))
            .await?;
        let records: Vec<SlotRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Update a slot's value in place.
    pub async fn update_slot_value(&self, slot_id: &str, value: &str) -> Result<()> {
        self.db
            .query(
                "UPDATE slots SET value = $value, modified_at = $modified_at WHERE uuid = $uuid;",
            )
            .bind(("uuid", slot_id.to_string()))
            .bind(("value", value.to_string()))
            .bind(("modified_at", Utc::now().to_rfc3339()))
            .await?;
        Ok(())
    }

    /// Delete every slot of the given keys at the given rows.
    pub async fn delete_slots_for_rows(&self, key_ids: &[String], rows: &[i64]) -> Result<()> {
        if key_ids.is_empty() || rows.is_empty() {
            return Ok(());
        }
        self.db
            .query("DELETE FROM slots WHERE key_id IN $keys AND row IN $rows;")
            .bind(("keys", key_ids.to_vec()))
            .bind(("rows", rows.to_vec()))
            .await?;
        Ok(())
    }

    //
    // PATHS
    //

    /// Persist a new path segment.
    pub async fn create_path(&self, path: Path) -> Result<Path> {
        self.create_record("paths", path.id.clone(), PathRecord::from(&path))
            .await?;
        Ok(path)
    }

    /// Find the child of `parent` named `name`; `parent = None` addresses
    /// the roots.
    pub async fn path_child(&self, parent: Option<&str>, name: &str) -> Result<Option<Path>> {
        let mut response = match parent {
            Some(parent_id) => {
                self.db
                    .query("SELECT * FROM paths WHERE parent = $parent AND name = $name LIMIT 1;")
                    .bind(("parent", parent_id.to_string()))
                    .bind(("name", name.to_string()))
                    .await?
            }
            None => {
                self.db
                    .query("SELECT * FROM paths WHERE parent IS NONE AND name = $name LIMIT 1;")
                    .bind(("name", name.to_string()))
                    .await?
            }
        };
        let records: Vec<PathRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).next())
    }

    /// List the children of a path (or the roots), ordered by name.
    pub async fn path_children(&self, parent: Option<&str>) -> Result<Vec<Path>> {
        let mut response = match parent {
            Some(parent_id) => {
                self.db
                    .query("SELECT * FROM paths WHERE parent = $parent ORDER BY name ASC;")
                    .bind(("parent", parent_id.to_string()))
                    .await?
            }
            None => {
                self.db
                    .query("SELECT * FROM paths WHERE parent IS NONE ORDER BY name ASC;")
                    .await?
            }
        };
        let records: Vec<PathRecord> = response.take(0)?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Attach a node to an existing path segment.
    pub async fn set_path_node(&self, path_id: &str, node_id: &str) -> Result<()> {
        self.db
            .query("UPDATE paths SET node = $node WHERE uuid = $uuid;")
            .bind(("uuid", path_id.to_string()))
            .bind(("node", node_id.to_string()))
            .await?;
        Ok(())
    }
}
