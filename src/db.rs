use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use serp_parser::features::SerpFeatures;
use serp_parser::SerpRecord;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("opening {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS serps (
            id          INTEGER PRIMARY KEY,
            serp_id     TEXT UNIQUE NOT NULL,
            source      TEXT,
            html        TEXT NOT NULL,
            ingested_at TEXT NOT NULL,
            parsed      BOOLEAN NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_serps_parsed ON serps(parsed);

        CREATE TABLE IF NOT EXISTS serp_results (
            id          INTEGER PRIMARY KEY,
            serp_id     TEXT NOT NULL REFERENCES serps(serp_id),
            serp_rank   INTEGER NOT NULL,
            cmpt_rank   INTEGER NOT NULL,
            sub_rank    INTEGER NOT NULL,
            section     TEXT NOT NULL,
            type        TEXT NOT NULL,
            sub_type    TEXT,
            title       TEXT,
            url         TEXT,
            text        TEXT,
            cite        TEXT,
            details     TEXT,
            error       TEXT,
            UNIQUE(serp_id, serp_rank)
        );
        CREATE INDEX IF NOT EXISTS idx_results_type ON serp_results(type);

        CREATE TABLE IF NOT EXISTS serp_features (
            serp_id                TEXT PRIMARY KEY REFERENCES serps(serp_id),
            result_estimate_count  INTEGER,
            result_estimate_time   REAL,
            language               TEXT,
            notice_no_results      BOOLEAN NOT NULL,
            notice_shortened_query BOOLEAN NOT NULL,
            notice_server_error    BOOLEAN NOT NULL,
            infinity_scroll        BOOLEAN NOT NULL
        );
        ",
    )?;
    Ok(())
}

// ── Ingest ──

pub struct NewSerp {
    pub serp_id: String,
    pub source: Option<String>,
    pub html: String,
}

/// Store pages not seen before. Returns the number inserted.
pub fn insert_serps(conn: &Connection, serps: &[NewSerp], ingested_at: &str) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO serps (serp_id, source, html, ingested_at) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for serp in serps {
            count += stmt.execute(params![serp.serp_id, serp.source, serp.html, ingested_at])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Processing ──

pub struct StoredSerp {
    pub serp_id: String,
    pub html: String,
}

pub fn fetch_unparsed(conn: &Connection, limit: Option<usize>) -> Result<Vec<StoredSerp>> {
    let sql = format!(
        "SELECT serp_id, html FROM serps WHERE parsed = 0 ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredSerp {
                serp_id: row.get(0)?,
                html: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct ParsedPage {
    pub serp_id: String,
    pub results: Vec<SerpRecord>,
    pub features: Option<SerpFeatures>,
}

/// Replace the stored results of each page and mark it parsed, in one transaction.
pub fn save_parsed(conn: &Connection, pages: &[ParsedPage]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut clear = tx.prepare("DELETE FROM serp_results WHERE serp_id = ?1")?;
        let mut insert = tx.prepare(
            "INSERT INTO serp_results
                (serp_id, serp_rank, cmpt_rank, sub_rank, section, type, sub_type,
                 title, url, text, cite, details, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )?;
        let mut features = tx.prepare(
            "INSERT OR REPLACE INTO serp_features
                (serp_id, result_estimate_count, result_estimate_time, language,
                 notice_no_results, notice_shortened_query, notice_server_error, infinity_scroll)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        let mut mark = tx.prepare("UPDATE serps SET parsed = 1 WHERE serp_id = ?1")?;

        for page in pages {
            clear.execute(params![page.serp_id])?;
            for r in &page.results {
                let rec = &r.record;
                let details = rec.details.as_ref().map(|d| d.to_string());
                insert.execute(params![
                    page.serp_id,
                    r.serp_rank as i64,
                    r.cmpt_rank as i64,
                    rec.sub_rank as i64,
                    r.section.as_str(),
                    rec.kind.as_str(),
                    rec.sub_type,
                    rec.title,
                    rec.url,
                    rec.text,
                    rec.cite,
                    details,
                    rec.error,
                ])?;
            }
            if let Some(f) = &page.features {
                features.execute(params![
                    page.serp_id,
                    f.result_estimate_count.map(|n| n as i64),
                    f.result_estimate_time,
                    f.language,
                    f.notice_no_results,
                    f.notice_shortened_query,
                    f.notice_server_error,
                    f.infinity_scroll,
                ])?;
            }
            mark.execute(params![page.serp_id])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Stats ──

pub struct Stats {
    pub serps: i64,
    pub parsed: i64,
    pub results: i64,
    pub errors: i64,
    pub unknown: i64,
    pub types: Vec<(String, i64)>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |sql: &str| -> Result<i64> { Ok(conn.query_row(sql, [], |row| row.get(0))?) };
    let mut stmt = conn.prepare(
        "SELECT type, COUNT(*) FROM serp_results GROUP BY type ORDER BY COUNT(*) DESC, type",
    )?;
    let types = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stats {
        serps: count("SELECT COUNT(*) FROM serps")?,
        parsed: count("SELECT COUNT(*) FROM serps WHERE parsed = 1")?,
        results: count("SELECT COUNT(*) FROM serp_results")?,
        errors: count("SELECT COUNT(*) FROM serp_results WHERE error IS NOT NULL")?,
        unknown: count("SELECT COUNT(*) FROM serp_results WHERE type = 'unknown'")?,
        types,
    })
}
