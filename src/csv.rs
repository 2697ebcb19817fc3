use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::engine::ValidationError;
use crate::model::{Currency, Entry, Statement};

/// Errors that can occur when parsing csv rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {}: {source}", path.display())]
    Open { path: PathBuf, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized entry type '{entry_type}'")]
    UnrecognizedType { line: usize, entry_type: String },

    #[error("line {line}: {entry_type} missing amount")]
    MissingAmount { line: usize, entry_type: String },

    #[error("line {line}: {source}")]
    Currency {
        line: usize,
        source: ValidationError,
    },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    r#type: String,
    user: String,
    currency: Option<String>,
    amount: Option<f64>,
    name: Option<String>,
    note: Option<String>,
}

#[derive(Debug, Serialize)]
struct OutputRow {
    user: String,
    email: String,
    usd: String,
    cdf: String,
    bonus: String,
    eligible: bool,
}

/// Read ledger entries from a csv file with a
/// `type,user,currency,amount,name,note` header.
pub fn read_entries(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Entry, CsvError>>, CsvError> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            let amount = |entry_type: &str| {
                row.amount.ok_or_else(|| CsvError::MissingAmount {
                    line,
                    entry_type: entry_type.to_string(),
                })
            };
            match row.r#type.as_str() {
                "investment" => {
                    let amount = amount("investment")?;
                    let currency = row
                        .currency
                        .as_deref()
                        .unwrap_or_default()
                        .parse::<Currency>()
                        .map_err(|source| CsvError::Currency { line, source })?;
                    Ok(Entry::Investment {
                        user: row.user.clone(),
                        name: row.name.clone().unwrap_or_default(),
                        currency,
                        amount,
                        note: row.note.clone().unwrap_or_default(),
                    })
                }
                "referral" => Ok(Entry::Referral {
                    sponsor: row.user.clone(),
                    amount: amount("referral")?,
                }),
                other => Err(CsvError::UnrecognizedType {
                    line,
                    entry_type: other.to_string(),
                }),
            }
        }))
}

/// Write statements as csv to `writer`
pub fn write_statements<W: io::Write>(
    writer: W,
    statements: impl IntoIterator<Item = Statement>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);

    for statement in statements {
        let row = OutputRow {
            user: statement.user_id,
            email: statement.email,
            usd: statement.balances.usd.to_string(),
            cdf: statement.balances.cdf.to_string(),
            bonus: statement.balances.bonus.to_string(),
            eligible: statement.eligible,
        };
        writer.serialize(&row)?;
    }

    writer.flush()?;
    Ok(())
}
