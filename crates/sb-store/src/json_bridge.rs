use std::fs;
use std::path::Path;

use sb_core::{SkillBook, export_json, import_json};

use crate::error::{Result, StoreError};
use crate::store::Store;

impl Store {
    /// Replace the stored book with the contents of an export file.
    /// Accepts both the versioned document and the legacy browser array.
    pub fn import_json_file(&self, path: &Path) -> Result<SkillBook> {
        let json = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        self.import_json_str(&json)
    }

    pub fn import_json_str(&self, json: &str) -> Result<SkillBook> {
        let book =
            import_json(json).map_err(|e| StoreError::InvalidData(format!("invalid JSON: {e}")))?;
        self.save_book(&book)?;
        tracing::info!(habits = book.len(), "imported skill book");
        Ok(book)
    }

    pub fn export_json_file(&self, path: &Path) -> Result<()> {
        let json = self.export_json_string()?;
        fs::write(path, json).map_err(|e| StoreError::io(path, e))
    }

    pub fn export_json_string(&self) -> Result<String> {
        let book = self.load_book()?;
        export_json(&book).map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))
    }
}
