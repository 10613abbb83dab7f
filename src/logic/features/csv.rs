//! Feature Recordings - Pre-extracted vectors as CSV
//!
//! One row of `FEATURE_COUNT` comma-separated reals per vector, in layout
//! order. A leading header row naming the features is skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{Error, Result};

use super::layout::{FEATURE_COUNT, FEATURE_LAYOUT};
use super::vector::FeatureVector;

pub fn parse_feature_row(line: &str) -> std::result::Result<FeatureVector, String> {
    let values = line
        .split(',')
        .map(|field| {
            let field = field.trim();
            field
                .parse::<f64>()
                .map_err(|_| format!("not a number: {:?}", field))
        })
        .collect::<std::result::Result<Vec<f64>, String>>()?;

    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(format!("non-finite value {}", bad));
    }
    FeatureVector::from_slice(&values)
        .ok_or_else(|| format!("expected {} values, got {}", FEATURE_COUNT, values.len()))
}

fn is_header(line: &str) -> bool {
    line.split(',').next().map(str::trim) == Some(FEATURE_LAYOUT[0])
}

pub fn load_feature_csv(path: &Path) -> Result<Vec<FeatureVector>> {
    let reader = BufReader::new(File::open(path)?);
    let mut vectors = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || (index == 0 && is_header(trimmed)) {
            continue;
        }
        let vector = parse_feature_row(trimmed)
            .map_err(|e| Error::Replay(format!("{}:{}: {}", path.display(), index + 1, e)))?;
        vectors.push(vector);
    }

    log::info!("Loaded {} feature vectors from {}", vectors.len(), path.display());
    Ok(vectors)
}
