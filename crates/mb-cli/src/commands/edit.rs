//! Editing archived history: rename, annotate and delete.
//!
//! Unknown IDs are reported but are not errors, so repeating a delete is safe.

use std::io::Write;

use anyhow::{Context, Result};

use mb_core::{RecordId, SessionId};
use mb_db::Database;

pub fn rename<W: Write>(writer: &mut W, db: &mut Database, id: &str, title: &str) -> Result<()> {
    let id = SessionId::new(id)?;
    if db
        .rename_session(&id, title)
        .context("failed to rename session")?
    {
        writeln!(writer, "Renamed session {id} to \"{}\"", title.trim())?;
    } else {
        writeln!(writer, "No session {id}")?;
    }
    Ok(())
}

pub fn note<W: Write>(writer: &mut W, db: &mut Database, id: &str, text: &str) -> Result<()> {
    let id = RecordId::new(id)?;
    if db.set_record_note(&id, text)? {
        writeln!(writer, "Updated note on record {id}")?;
    } else {
        writeln!(writer, "No record {id}")?;
    }
    Ok(())
}

pub fn delete_session<W: Write>(writer: &mut W, db: &mut Database, id: &str) -> Result<()> {
    let id = SessionId::new(id)?;
    if db.delete_session(&id)? {
        tracing::info!(session = %id, "session deleted");
        writeln!(writer, "Deleted session {id}")?;
    } else {
        writeln!(writer, "No session {id}")?;
    }
    Ok(())
}

pub fn delete_record<W: Write>(writer: &mut W, db: &mut Database, id: &str) -> Result<()> {
    let id = RecordId::new(id)?;
    if db.delete_record(&id)? {
        tracing::info!(record = %id, "record deleted");
        writeln!(writer, "Deleted record {id}")?;
    } else {
        writeln!(writer, "No record {id}")?;
    }
    Ok(())
}
