use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;

use crate::parser::assemble::Incident;

pub const DB_PATH: &str = "data/incidents.sqlite";

pub fn connect() -> Result<Connection> {
    if let Some(dir) = Path::new(DB_PATH).parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            id             INTEGER PRIMARY KEY,
            path           TEXT UNIQUE NOT NULL,
            chars          INTEGER NOT NULL,
            incident_count INTEGER NOT NULL DEFAULT 0,
            processed_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS incidents (
            id           INTEGER PRIMARY KEY,
            document_id  INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            seq          INTEGER NOT NULL,
            title        TEXT NOT NULL,
            body         TEXT NOT NULL,
            date_kind    TEXT CHECK(date_kind IN ('full','year-only')),
            date_text    TEXT,
            year         INTEGER,
            date         TEXT,
            category     TEXT NOT NULL,
            span_start   INTEGER NOT NULL,
            span_end     INTEGER NOT NULL,
            UNIQUE(document_id, seq)
        );
        CREATE INDEX IF NOT EXISTS idx_incidents_category ON incidents(category);
        CREATE INDEX IF NOT EXISTS idx_incidents_year ON incidents(year);
        ",
    )?;
    Ok(())
}

/// Store a document's incidents, replacing whatever an earlier run saved for it.
pub fn save_document(conn: &Connection, path: &str, chars: usize, incidents: &[Incident]) -> Result<i64> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO documents (path, chars, incident_count) VALUES (?1, ?2, ?3)
         ON CONFLICT(path) DO UPDATE SET
             chars = excluded.chars,
             incident_count = excluded.incident_count,
             processed_at = datetime('now')",
        rusqlite::params![path, chars as i64, incidents.len() as i64],
    )?;
    let doc_id: i64 = tx.query_row("SELECT id FROM documents WHERE path = ?1", [path], |r| r.get(0))?;
    tx.execute("DELETE FROM incidents WHERE document_id = ?1", [doc_id])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO incidents (
                document_id, seq, title, body, date_kind, date_text, year, date,
                category, span_start, span_end
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        for (i, inc) in incidents.iter().enumerate() {
            let date = inc.date.as_ref();
            stmt.execute(rusqlite::params![
                doc_id,
                (i + 1) as i64,
                inc.title,
                inc.body,
                date.map(|d| d.kind.as_str()),
                date.map(|d| d.text.as_str()),
                date.map(|d| d.year),
                date.and_then(|d| d.calendar).map(|c| c.to_string()),
                inc.category,
                inc.raw_span.start as i64,
                inc.raw_span.end as i64,
            ])?;
        }
    }
    tx.commit()?;
    Ok(doc_id)
}

// ── Overview ──

pub struct OverviewRow {
    pub document: String,
    pub seq: i64,
    pub date: String,
    pub category: String,
    pub title: String,
}

pub fn fetch_overview(
    conn: &Connection,
    category: Option<&str>,
    year: Option<i32>,
    limit: usize,
) -> Result<Vec<OverviewRow>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(c) = category {
        conditions.push(format!("i.category = ?{}", params.len() + 1));
        params.push(Box::new(c.to_string()));
    }
    if let Some(y) = year {
        conditions.push(format!("i.year = ?{}", params.len() + 1));
        params.push(Box::new(y));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT d.path, i.seq, COALESCE(i.date_text,''), i.category, i.title
         FROM incidents i JOIN documents d ON d.id = i.document_id{}
         ORDER BY d.path, i.seq
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(OverviewRow {
                document: row.get(0)?,
                seq: row.get(1)?,
                date: row.get(2)?,
                category: row.get(3)?,
                title: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub documents: usize,
    pub incidents: usize,
    pub full_dates: usize,
    pub year_only: usize,
    pub undated: usize,
    pub categories: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let documents: usize = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
    let incidents: usize = conn.query_row("SELECT COUNT(*) FROM incidents", [], |r| r.get(0))?;
    let full_dates: usize = conn.query_row(
        "SELECT COUNT(*) FROM incidents WHERE date_kind = 'full'",
        [],
        |r| r.get(0),
    )?;
    let year_only: usize = conn.query_row(
        "SELECT COUNT(*) FROM incidents WHERE date_kind = 'year-only'",
        [],
        |r| r.get(0),
    )?;
    let categories: usize =
        conn.query_row("SELECT COUNT(DISTINCT category) FROM incidents", [], |r| r.get(0))?;
    Ok(Stats {
        documents,
        incidents,
        full_dates,
        year_only,
        undated: incidents - full_dates - year_only,
        categories,
    })
}
