//! CSV export of filtered tickets.

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

use thiserror::Error;
use tracing::info;

use crate::metrics::EXPORTED_ROWS;
use crate::ticket::{Ticket, TicketError, TicketFilter, TicketQueryService};

/// Header row of every export, in column order.
pub const CSV_HEADER: [&str; 6] = ["ID", "Assignee", "Description", "Status", "Created", "Type"];

/// Default file name offered for exports.
pub const DEFAULT_EXPORT_FILE: &str = "tickets_export.csv";

/// Data rows per chunk when exporting with [`export_csv_chunks`].
pub const EXPORT_CHUNK_ROWS: usize = 500;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Query(#[from] TicketError),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn record(ticket: &Ticket) -> [&str; 6] {
    [
        ticket.id.as_str(),
        ticket.assignee.as_str(),
        ticket.short_description.as_str(),
        ticket.status.as_str(),
        ticket.created_at.as_str(),
        ticket.ticket_type.as_str(),
    ]
}

fn new_csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer)
}

/// Write every ticket matching `filter` as CSV; returns the number of data rows.
///
/// Rows are written as they are read from the store.
pub fn write_csv<W: Write>(
    service: &TicketQueryService,
    filter: &TicketFilter,
    writer: W,
) -> Result<usize, ExportError> {
    let mut csv_writer = new_csv_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    let count = service.export_each(filter, |ticket| {
        csv_writer.write_record(record(&ticket))?;
        Ok::<(), ExportError>(())
    })?;

    csv_writer.flush()?;
    EXPORTED_ROWS.inc_by(count as u64);
    Ok(count)
}

/// Byte sink shared between a CSV writer and the code draining it.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Export as a sequence of CSV chunks handed to `emit`; returns the number of data rows.
///
/// The first chunk starts with the header and every chunk but the last holds
/// `chunk_rows` rows. A query that fails before the first chunk is full emits
/// nothing, so callers can still report the failure cleanly.
pub fn export_csv_chunks<F>(
    service: &TicketQueryService,
    filter: &TicketFilter,
    chunk_rows: usize,
    mut emit: F,
) -> Result<usize, ExportError>
where
    F: FnMut(Vec<u8>) -> Result<(), ExportError>,
{
    let chunk_rows = chunk_rows.max(1);
    let buffer = SharedBuffer::default();
    let mut csv_writer = new_csv_writer(buffer.clone());
    csv_writer.write_record(CSV_HEADER)?;

    let mut buffered = 0;
    let count = service.export_each(filter, |ticket| {
        csv_writer.write_record(record(&ticket))?;
        buffered += 1;
        if buffered == chunk_rows {
            buffered = 0;
            csv_writer.flush()?;
            emit(buffer.take())?;
        }
        Ok::<(), ExportError>(())
    })?;

    csv_writer.flush()?;
    let rest = buffer.take();
    if !rest.is_empty() {
        emit(rest)?;
    }

    EXPORTED_ROWS.inc_by(count as u64);
    Ok(count)
}

/// Export to a file, replacing it if it exists.
pub fn export_to_path(
    service: &TicketQueryService,
    filter: &TicketFilter,
    path: &Path,
) -> Result<usize, ExportError> {
    let file = File::create(path)?;
    let count = write_csv(service, filter, BufWriter::new(file))?;
    info!("Exported {} tickets to {}", count, path.display());
    Ok(count)
}
