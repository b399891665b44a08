//! `murmur cursor` subcommands.

use std::path::Path;

use murmur_core::repository::cursor::CursorStore;
use murmur_infra::filesystem::FileCursorStore;
use murmur_types::event::Cursor;

/// Print the persisted cursor, or a note when none was ever saved.
pub async fn show_cursor(cursor_file: &Path) -> anyhow::Result<()> {
    let store = FileCursorStore::new(cursor_file);
    match store.load().await? {
        Some(cursor) => println!("{cursor}"),
        None => println!("no cursor persisted at {}", cursor_file.display()),
    }
    Ok(())
}

/// Overwrite the persisted cursor. Takes effect on the next start.
pub async fn set_cursor(cursor_file: &Path, value: Cursor) -> anyhow::Result<()> {
    let store = FileCursorStore::new(cursor_file);
    let previous = store.load().await?;
    store.save(value).await?;
    match previous {
        Some(previous) => println!("cursor moved from {previous} to {value}"),
        None => println!("cursor set to {value}"),
    }
    Ok(())
}
