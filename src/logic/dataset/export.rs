use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::record::TrainingRecord;
use super::store::TrainingStore;
use super::StoreError;

/// Dump a user's training vectors as JSON lines
/// Returns the number of records written
pub fn export_jsonl(
    store: &dyn TrainingStore,
    user_id: &str,
    target_path: &Path,
) -> Result<usize, StoreError> {
    let vectors = store.read_all(user_id)?;

    if let Some(parent) = target_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Truncate if exists
    let mut output = BufWriter::new(File::create(target_path)?);
    for (index, vector) in vectors.iter().enumerate() {
        let record = TrainingRecord::new(user_id, index as u64, vector);
        serde_json::to_writer(&mut output, &record)?;
        output.write_all(b"\n")?;
    }
    output.flush()?;

    log::info!(
        "Exported {} training vectors for {} to {}",
        vectors.len(),
        user_id,
        target_path.display()
    );
    Ok(vectors.len())
}
