//! Receipt metadata and the rules an uploaded receipt must follow.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{ReceiptId, TransactionId},
};

/// The largest receipt accepted, 5 MiB.
pub const MAX_RECEIPT_SIZE: u64 = 5 * 1024 * 1024;

/// The media types a receipt can have.
pub const ALLOWED_MEDIA_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

/// A record of a receipt attached to a transaction.
///
/// Only the metadata is kept, the file itself lives elsewhere under
/// `storage_filename`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// The ID of the receipt.
    pub id: ReceiptId,
    /// The transaction the receipt belongs to.
    pub transaction_id: TransactionId,
    /// The name of the file as uploaded by the user.
    pub filename: String,
    /// The generated name the file is stored under.
    pub storage_filename: String,
    /// The media type of the file, e.g. "image/png".
    pub media_type: String,
    /// When the receipt was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The request body for recording a receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptData {
    /// The name of the uploaded file.
    pub filename: String,
    /// The media type of the uploaded file.
    pub media_type: String,
    /// The size of the uploaded file in bytes.
    pub size: u64,
}

impl ReceiptData {
    /// Check the size, filename and media type of the receipt.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidReceipt] describing the first rule that is broken.
    pub fn validate(&self) -> Result<(), Error> {
        if self.size > MAX_RECEIPT_SIZE {
            return Err(Error::InvalidReceipt(
                "maximum allowed size is 5 MB".to_owned(),
            ));
        }

        if !is_valid_filename(&self.filename) {
            return Err(Error::InvalidReceipt(format!(
                "\"{}\" is not a valid filename",
                self.filename
            )));
        }

        if !ALLOWED_MEDIA_TYPES.contains(&self.media_type.as_str()) {
            return Err(Error::InvalidReceipt(
                "receipt has to be a JPEG, PNG or PDF file".to_owned(),
            ));
        }

        Ok(())
    }
}

/// Filenames may only contain ASCII letters, digits, whitespace, '.', '_' and '-'.
fn is_valid_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename.chars().all(|c| {
            c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || matches!(c, '.' | '_' | '-')
        })
}

fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        _ => "pdf",
    }
}

/// Derive a unique name to store a receipt's file under.
pub fn storage_filename(
    transaction_id: TransactionId,
    data: &ReceiptData,
    created_at: OffsetDateTime,
) -> String {
    let digest = Sha256::digest(format!(
        "{transaction_id}:{}:{}",
        data.filename,
        created_at.unix_timestamp_nanos()
    ));

    format!("{digest:x}.{}", extension_for(&data.media_type))
}
