use std::path::Path;

use rusqlite::{params, Connection, Row};

use crate::config::Config;
use crate::model::{IconMode, Target, TargetGroup};

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(error) => write!(f, "sqlite error: {error}"),
            Self::Io(error) => write!(f, "io error: {error}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

pub fn open_memory() -> Result<Connection, StoreError> {
    let db = Connection::open_in_memory()?;
    apply_schema(&db)?;
    Ok(db)
}

pub fn open_at_path(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Connection::open(path)?;
    apply_schema(&db)?;
    Ok(db)
}

pub fn open_from_config(config: &Config) -> Result<Connection, StoreError> {
    open_at_path(&config.targets_db_path)
}

fn apply_schema(db: &Connection) -> Result<(), rusqlite::Error> {
    db.execute_batch(
        "CREATE TABLE IF NOT EXISTS target_group (
             id INTEGER PRIMARY KEY,
             name TEXT NOT NULL UNIQUE,
             order_index INTEGER NOT NULL DEFAULT 0
         );
         CREATE TABLE IF NOT EXISTS target (
             id INTEGER PRIMARY KEY,
             group_id INTEGER NOT NULL REFERENCES target_group(id),
             label TEXT NOT NULL,
             url_pattern TEXT NOT NULL,
             bound_app_id TEXT NOT NULL DEFAULT '',
             icon_mode TEXT NOT NULL DEFAULT 'resolved',
             label_text TEXT NOT NULL DEFAULT '',
             background_color INTEGER NOT NULL DEFAULT 0,
             order_index INTEGER NOT NULL DEFAULT 0
         );",
    )
}

pub fn upsert_group(db: &Connection, group: &TargetGroup) -> Result<(), StoreError> {
    db.execute(
        "INSERT INTO target_group (id, name, order_index) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET name=excluded.name, order_index=excluded.order_index",
        params![group.id, group.name, group.order_index],
    )?;
    Ok(())
}

pub fn upsert_target(db: &Connection, target: &Target) -> Result<(), StoreError> {
    db.execute(
        "INSERT INTO target (id, group_id, label, url_pattern, bound_app_id, icon_mode,
                             label_text, background_color, order_index)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
             group_id=excluded.group_id, label=excluded.label,
             url_pattern=excluded.url_pattern, bound_app_id=excluded.bound_app_id,
             icon_mode=excluded.icon_mode, label_text=excluded.label_text,
             background_color=excluded.background_color, order_index=excluded.order_index",
        params![
            target.id,
            target.group_id,
            target.label,
            target.url_pattern,
            target.bound_app_id,
            target.icon_mode.as_str(),
            target.label_text,
            i64::from(target.background_color),
            target.order_index,
        ],
    )?;
    Ok(())
}

pub fn list_groups(db: &Connection) -> Result<Vec<TargetGroup>, StoreError> {
    let mut stmt =
        db.prepare("SELECT id, name, order_index FROM target_group ORDER BY order_index, name")?;
    let mut rows = stmt.query([])?;
    let mut groups = Vec::new();
    while let Some(row) = rows.next()? {
        groups.push(TargetGroup {
            id: row.get(0)?,
            name: row.get(1)?,
            order_index: row.get(2)?,
        });
    }
    Ok(groups)
}

pub fn group_by_name(db: &Connection, name: &str) -> Result<Option<TargetGroup>, StoreError> {
    let mut stmt =
        db.prepare("SELECT id, name, order_index FROM target_group WHERE name = ?1")?;
    let mut rows = stmt.query(params![name])?;
    if let Some(row) = rows.next()? {
        Ok(Some(TargetGroup {
            id: row.get(0)?,
            name: row.get(1)?,
            order_index: row.get(2)?,
        }))
    } else {
        Ok(None)
    }
}

pub fn list_targets(db: &Connection) -> Result<Vec<Target>, StoreError> {
    let mut stmt = db.prepare(&select_targets("ORDER BY group_id, order_index, id"))?;
    let mut rows = stmt.query([])?;
    collect_targets(&mut rows)
}

pub fn targets_in_group(db: &Connection, group_id: i64) -> Result<Vec<Target>, StoreError> {
    let mut stmt =
        db.prepare(&select_targets("WHERE group_id = ?1 ORDER BY order_index, id"))?;
    let mut rows = stmt.query(params![group_id])?;
    collect_targets(&mut rows)
}

pub fn get_target(db: &Connection, id: i64) -> Result<Option<Target>, StoreError> {
    let mut stmt = db.prepare(&select_targets("WHERE id = ?1"))?;
    let mut rows = stmt.query(params![id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(target_from_row(row)?))
    } else {
        Ok(None)
    }
}

fn select_targets(suffix: &str) -> String {
    format!(
        "SELECT id, group_id, label, url_pattern, bound_app_id, icon_mode,
                label_text, background_color, order_index
         FROM target {suffix}"
    )
}

fn collect_targets(rows: &mut rusqlite::Rows<'_>) -> Result<Vec<Target>, StoreError> {
    let mut targets = Vec::new();
    while let Some(row) = rows.next()? {
        targets.push(target_from_row(row)?);
    }
    Ok(targets)
}

fn target_from_row(row: &Row<'_>) -> Result<Target, rusqlite::Error> {
    let mode_text: String = row.get(5)?;
    let color: i64 = row.get(7)?;
    Ok(Target {
        id: row.get(0)?,
        group_id: row.get(1)?,
        label: row.get(2)?,
        url_pattern: row.get(3)?,
        bound_app_id: row.get(4)?,
        // Unknown mode strings fall back to resolution rather than failing
        // the whole listing.
        icon_mode: IconMode::parse(&mode_text).unwrap_or(IconMode::Resolved),
        label_text: row.get(6)?,
        background_color: color as u32,
        order_index: row.get(8)?,
    })
}
