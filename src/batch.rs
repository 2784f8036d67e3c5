//! Batch processing: one worker turns a vector of records into four
//! sibling files.
//!
//! Each batch produces `<base>.batch.<n>` (binary index with local term
//! ids), `.documents` and `.urls` sidecars, and `.terms` (the local
//! dictionary in id order). Batches share nothing but the filesystem,
//! partitioned by batch number, so workers need no locking.

use crate::format::{write_header, write_record};
use crate::types::{DocId, DocumentRecord, TermId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write buffer size for batch output files (8 MB).
pub(crate) const WRITE_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// One unit of work for a batch worker.
#[derive(Debug)]
pub struct BatchProcess {
    /// Position of this batch in dispatch order.
    pub batch_number: usize,
    /// Records to index, in source order.
    pub records: Vec<DocumentRecord>,
    /// Document id of the first record in the batch.
    pub first_document: DocId,
    /// Output basename the batch files are derived from.
    pub output: PathBuf,
}

/// Path of a batch's binary index: `<base>.batch.<n>`.
pub fn batch_file(output: &Path, batch_number: usize) -> PathBuf {
    suffixed(output, &format!(".batch.{batch_number}"))
}

/// Append a suffix to a path's final component.
pub fn suffixed(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Process one batch: write the batch index, sidecars, and local term
/// dictionary. Pure function of its inputs and its files.
pub fn process_batch<S, N>(batch: BatchProcess, split: &S, normalize: &N) -> io::Result<()>
where
    S: Fn(String, &mut dyn FnMut(String)) + ?Sized,
    N: Fn(String) -> String + ?Sized,
{
    let base = batch_file(&batch.output, batch.batch_number);
    let mut index = BufWriter::with_capacity(WRITE_BUFFER_SIZE, File::create(&base)?);
    let mut documents = BufWriter::new(File::create(suffixed(&base, ".documents"))?);
    let mut urls = BufWriter::new(File::create(suffixed(&base, ".urls"))?);
    let mut terms = BufWriter::new(File::create(suffixed(&base, ".terms"))?);

    write_header(&mut index, batch.records.len() as u32)?;

    let first = batch.first_document;
    let count = batch.records.len();

    // Local ids are assigned in first-seen order; the .terms file mirrors
    // that order, so it doubles as the id -> term array for the batch.
    let mut dictionary: HashMap<String, TermId> = HashMap::new();
    let mut raw_terms: Vec<String> = Vec::new();
    let mut term_ids: Vec<TermId> = Vec::new();

    for record in batch.records {
        writeln!(documents, "{}", record.trecid)?;
        writeln!(urls, "{}", record.url)?;

        raw_terms.clear();
        split(record.content, &mut |term| raw_terms.push(term));

        term_ids.clear();
        for raw in raw_terms.drain(..) {
            let term = normalize(raw);
            if term.is_empty() {
                continue;
            }
            let next_id = dictionary.len() as TermId;
            let id = match dictionary.entry(term) {
                Entry::Occupied(occupied) => *occupied.get(),
                Entry::Vacant(vacant) => {
                    writeln!(terms, "{}", vacant.key())?;
                    *vacant.insert(next_id)
                }
            };
            term_ids.push(id);
        }
        write_record(&mut index, &term_ids)?;
    }

    index.flush()?;
    documents.flush()?;
    urls.flush()?;
    terms.flush()?;

    tracing::debug!(
        batch = batch.batch_number,
        first_document = first,
        last_document = first as usize + count,
        "batch processed"
    );
    Ok(())
}
