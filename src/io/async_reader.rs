//! Asynchronous CSV reader with batch interface
//!
//! Reads converted records from an async source in fixed-size batches, feeding
//! the async processing strategy.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of T::Output
//!                  ↓
//!           csv_format module
//!           (CsvRow::convert)
//! ```

use crate::io::csv_format::CsvRow;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use std::marker::PhantomData;

/// Asynchronous CSV reader
///
/// Rows that fail to parse or convert are logged and skipped.
pub struct AsyncReader<R: AsyncRead + Unpin, T> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: usize,
    _row: PhantomData<T>,
}

impl<R, T> AsyncReader<R, T>
where
    R: AsyncRead + Unpin + Send + 'static,
    T: CsvRow + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 0,
            _row: PhantomData,
        }
    }

    /// Read a batch of converted records
    ///
    /// Reads until `batch_size` records converted successfully or the input
    /// ends. Invalid rows do not count towards the batch size.
    ///
    /// # Returns
    ///
    /// A vector of converted records; empty once the end of input is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<T::Output> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<T>();

        while batch.len() < batch_size {
            let Some(row) = records.next().await else {
                break;
            };
            self.line_num += 1;
            let line = self.line_num + 1;

            match row {
                Ok(record) => match record.convert() {
                    Ok(value) => batch.push(value),
                    Err(e) => tracing::warn!(line, error = %e, "Skipping invalid record"),
                },
                Err(e) => tracing::warn!(line, error = %e, "Skipping unparseable CSV row"),
            }
        }

        batch
    }
}
