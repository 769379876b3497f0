//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over any `CsvRow` type (account rows or
//! transfer rows). Delegates CSV format concerns to the csv_format module.
//!
//! # Design
//!
//! The SyncReader uses csv::Reader to read and deserialize CSV records
//! sequentially, converting each one as it is pulled. Records are never
//! buffered beyond the reader's own I/O buffer.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<T::Output, String>` for each CSV row:
//!
//! ```no_run
//! use wallet_ledger::io::csv_format::TransferCsvRecord;
//! use wallet_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::<TransferCsvRecord>::new(Path::new("transfers.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(instruction) => println!("Transfer to {}", instruction.destination),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual record errors are yielded as Err variants in the iterator
//! - Line numbers are included in error messages for debugging

use crate::io::csv_format::CsvRow;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::marker::PhantomData;
use std::path::Path;

/// Synchronous CSV reader
///
/// Provides an iterator interface over converted records of type `T`.
#[derive(Debug)]
pub struct SyncReader<T: CsvRow> {
    reader: csv::Reader<File>,
    line_num: usize,
    _row: PhantomData<T>,
}

impl<T: CsvRow> SyncReader<T> {
    /// Create a new SyncReader from a file path
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (for the optional trailing columns)
    /// - Use an 8KB buffer for efficient I/O
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReader)` if file opened successfully
    /// * `Err(String)` if file could not be opened
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
            _row: PhantomData,
        })
    }
}

impl<T: CsvRow> Iterator for SyncReader<T> {
    type Item = Result<T::Output, String>;

    /// Get the next converted record from the CSV file
    ///
    /// # Returns
    ///
    /// * `Some(Ok(T::Output))` - Successfully parsed record
    /// * `Some(Err(String))` - Parse or conversion error with line number
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<T>();

        let row = deserializer.next()?;
        self.line_num += 1;
        // Line numbers are 1-based and count the header
        let line = self.line_num + 1;

        Some(match row {
            Ok(record) => record.convert().map_err(|e| format!("Line {}: {}", line, e)),
            Err(e) => Err(format!("Line {}: CSV parse error: {}", line, e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::csv_format::{AccountCsvRecord, TransferCsvRecord};
    use crate::types::OriginRef;
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_new_fails_on_missing_file() {
        let result = SyncReader::<AccountCsvRecord>::new(Path::new("nonexistent.csv"));
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_sync_reader_reads_accounts() {
        let file = create_temp_csv(
            "id,cpf,food,meal,cash,credential_hash\n\
             1,12345678901,100.00,50.00,10.00,hash-1\n\
             2,10987654321,0,0,0\n",
        );

        let accounts: Vec<_> = SyncReader::<AccountCsvRecord>::new(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].balances.food, Decimal::new(10000, 2));
        assert!(!accounts[0].credential_hash.is_empty());
        assert_eq!(accounts[1].cpf, "10987654321");
        assert!(accounts[1].credential_hash.is_empty());
    }

    #[test]
    fn test_sync_reader_reads_transfers_with_either_origin() {
        let file = create_temp_csv(
            "origin,origin_cpf,destination,amount,mcc,merchant\n\
             1,,2,50.00,5411,PADARIA DO ZE\n\
             ,12345678901,2,10,5811,RESTAURANTE\n",
        );

        let transfers: Vec<_> = SyncReader::<TransferCsvRecord>::new(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(transfers[0].origin, OriginRef::Id(1));
        assert_eq!(transfers[1].origin, OriginRef::Identifier("12345678901".to_string()));
        assert_eq!(transfers[1].mcc, "5811");
    }

    #[test]
    fn test_sync_reader_includes_line_numbers_in_errors() {
        let file = create_temp_csv(
            "id,cpf,food,meal,cash\n\
             1,12345678901,1,1,1\n\
             2,123,1,1,1\n\
             x,12345678901,1,1,1\n\
             4,12345678904,1,1,1\n",
        );

        let records: Vec<_> = SyncReader::<AccountCsvRecord>::new(file.path())
            .unwrap()
            .collect();

        assert_eq!(records.len(), 4);
        assert!(records[0].is_ok());
        // Line 3 because of header
        let conversion = records[1].as_ref().unwrap_err();
        assert!(conversion.contains("Line 3"));
        assert!(conversion.contains("must have 11 characters"));
        let parse = records[2].as_ref().unwrap_err();
        assert!(parse.contains("Line 4: CSV parse error"));
        assert!(records[3].is_ok());
    }

    #[test]
    fn test_sync_reader_handles_whitespace() {
        let file = create_temp_csv(
            "origin,origin_cpf,destination,amount,mcc,merchant\n  1  ,  ,  2  ,  7.5  , 6011 , ATM \n",
        );

        let transfers: Vec<_> = SyncReader::<TransferCsvRecord>::new(file.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].amount, Decimal::new(75, 1));
        assert_eq!(transfers[0].mcc, "6011");
        assert_eq!(transfers[0].merchant, "ATM");
    }

    #[test]
    fn test_sync_reader_handles_empty_file_after_header() {
        let file = create_temp_csv("id,cpf,food,meal,cash\n");

        let reader = SyncReader::<AccountCsvRecord>::new(file.path()).unwrap();
        assert_eq!(reader.count(), 0);
    }
}
