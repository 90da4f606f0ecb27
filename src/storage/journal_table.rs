use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::models::{provider_format, StoredTransaction};
use crate::storage::{MemoryTable, StoreError, TransactionTable};
use crate::types::{parse_money, RowId};

/// Append target underneath a [`JournalTable`].
pub trait JournalSink: Write + Send + 'static {
    /// Discards everything past the first `len` bytes.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl JournalSink for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        //NOTE: The file is opened in append mode, so later writes land at the new end.
        self.set_len(len)
    }
}

struct JournalWriter<S: JournalSink> {
    sink: S,
    committed: u64
}

/// Durable table backed by an append-only CSV journal.
///
/// The journal is replayed into memory on open; every insert is appended and
/// flushed before the row becomes visible to readers. An append that fails is
/// cut back off the journal, so a rejected insert leaves no trace behind.
pub struct JournalTable<S: JournalSink = File> {
    name: String,
    memory: MemoryTable,
    writer: Mutex<JournalWriter<S>>
}

/// One journal line. Money is written with exactly two fractional digits.
#[derive(Debug, Serialize, Deserialize)]
struct JournalRow {
    id: RowId,
    trx_id: String,
    provider: String,
    amount: String,
    sender_number: String,
    balance: String,
    transaction_date: String,
    transaction_time: String,
    raw_sms: String,
    created_at: Timestamp
}

impl From<&StoredTransaction> for JournalRow {
    fn from(row: &StoredTransaction) -> Self {
        Self {
            id: row.id,
            trx_id: row.external_id.clone(),
            provider: row.provider.clone(),
            amount: row.amount.to_string(),
            sender_number: row.sender_number.clone(),
            balance: row.balance.to_string(),
            transaction_date: provider_format::format_date(row.transaction_date),
            transaction_time: provider_format::format_time(row.transaction_time),
            raw_sms: row.raw_sms.clone(),
            created_at: row.created_at
        }
    }
}

impl JournalRow {
    fn into_stored(self) -> Result<StoredTransaction, String> {
        Ok(StoredTransaction {
            id: self.id,
            amount: parse_money(&self.amount).map_err(|error| format!("amount: {error}"))?,
            balance: parse_money(&self.balance).map_err(|error| format!("balance: {error}"))?,
            transaction_date: provider_format::parse_date(&self.transaction_date)
                .ok_or_else(|| format!("transaction_date: [{}]", self.transaction_date))?,
            transaction_time: provider_format::parse_time(&self.transaction_time)
                .ok_or_else(|| format!("transaction_time: [{}]", self.transaction_time))?,
            external_id: self.trx_id,
            provider: self.provider,
            sender_number: self.sender_number,
            raw_sms: self.raw_sms,
            created_at: self.created_at
        })
    }

    /// Encodes the row as one CSV record, preceded by the header when `with_header` is set.
    fn encode(&self, with_header: bool) -> Result<Vec<u8>, StoreError> {
        let mut writer = WriterBuilder::new().has_headers(with_header).from_writer(Vec::new());

        writer.serialize(self)?;

        writer.into_inner().map_err(|error| StoreError::Io(error.into_error()))
    }
}

impl JournalTable {
    /// Opens the journal at `path`, creating it if needed, and restores its rows.
    ///
    /// # Errors
    /// Returns `StoreError` if the file cannot be read or written, or if a line
    /// cannot be decoded. A repeated external id in the journal keeps the first row.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let memory = MemoryTable::new();
        let committed = if path.exists() { fs::metadata(path)?.len() } else { 0 };

        if committed > 0 {
            let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
            let headers = reader.headers()?.clone();
            let mut record = StringRecord::new();

            while reader.read_record(&mut record)? {
                //NOTE: Records may span several lines when the SMS body contains line breaks.
                let line = record.position().map(|position| position.line()).unwrap_or_default();
                let row = record.deserialize::<JournalRow>(Some(&headers))?.into_stored()
                    .map_err(|reason| StoreError::CorruptRow { line, reason })?;

                match memory.insert(row) {
                    Ok(()) => {},
                    Err(error) if error.is_duplicate_external_id() => {
                        warn!("Journal [{name}] line [{line}] repeats an external id and was skipped: {error}");
                    },
                    Err(error) => return Err(error)
                }
            }

            debug!("Restored [{}] transactions from journal [{name}]", memory.len());
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self::from_parts(name, memory, file, committed))
    }
}

impl<S: JournalSink> JournalTable<S> {
    /// Builds a table over `sink`, which already holds `committed` bytes of journal.
    pub(crate) fn from_parts(name: String, memory: MemoryTable, sink: S, committed: u64) -> Self {
        Self {
            name,
            memory,
            writer: Mutex::new(JournalWriter { sink, committed })
        }
    }

    fn append(&self, row: &StoredTransaction) -> Result<(), StoreError> {
        let mut writer = self.writer.lock()
            .map_err(|_| StoreError::Unavailable(format!("journal writer for [{}] is poisoned", self.name)))?;

        let record = JournalRow::from(row).encode(writer.committed == 0)?;
        let written = writer.sink.write_all(&record).and_then(|()| writer.sink.flush());

        if let Err(cause) = written {
            let committed = writer.committed;

            if let Err(rollback) = writer.sink.truncate(committed) {
                error!("Journal [{}] could not be cut back to [{committed}] bytes after a failed append: {rollback}", self.name);
            }

            return Err(StoreError::Io(cause));
        }

        writer.committed += record.len() as u64;

        Ok(())
    }
}

impl<S: JournalSink> TransactionTable for JournalTable<S> {
    fn find(&self, external_id: &str) -> Result<Option<StoredTransaction>, StoreError> {
        self.memory.find(external_id)
    }

    fn insert(&self, row: StoredTransaction) -> Result<(), StoreError> {
        self.memory.insert_with(row, |row| self.append(row))
    }

    fn rows(&self) -> Result<Vec<StoredTransaction>, StoreError> {
        self.memory.rows()
    }
}
