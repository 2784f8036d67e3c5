//! Forward-index builder: ingestion driver and merge pipeline.
//!
//! One thread pulls records from the source and groups them into batches;
//! the remaining threads process batches in parallel, each writing a
//! disjoint set of files. A bounded permit channel is the backpressure
//! gate: the driver deposits a token before dispatching a batch and a
//! worker removes one only after the batch's files are written, so with
//! `T` threads at most `2 * (T - 1)` batches are in flight — queued or
//! executing — and memory stays proportional to the batch size rather
//! than the collection size. Once ingestion drains, the merge, remap, and
//! concatenate phases run sequentially on this thread.

use crate::batch::{batch_file, process_batch, suffixed, BatchProcess, WRITE_BUFFER_SIZE};
use crate::error::{Error, Result};
use crate::format::{read_u32_at, write_header, write_u32_at, HEADER_LEN};
use crate::terms::{reverse_mapping, TermCollector};
use crate::types::{DocId, DocumentRecord, TermId};
use indicatif::{ProgressBar, ProgressStyle};
use memmap2::MmapMut;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use std::thread;

/// Builds a forward index from a record stream.
pub struct ForwardIndexBuilder {
    /// Records per batch.
    batch_size: usize,
    /// Total threads: one reader plus `threads - 1` batch workers.
    threads: usize,
}

impl ForwardIndexBuilder {
    /// Create a builder, validating the numeric configuration.
    pub fn new(batch_size: usize, threads: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::ZeroBatchSize);
        }
        if threads < 2 {
            return Err(Error::NotEnoughThreads(threads));
        }
        Ok(Self {
            batch_size,
            threads,
        })
    }

    /// Run the full pipeline: ingest `input` into per-batch files, merge
    /// the term dictionaries, remap term ids to global ids, concatenate
    /// the batches into `<output>`, and delete the batch artifacts.
    ///
    /// `read_record` pulls the next record from the stream (`Ok(None)` at
    /// end of stream), `split` emits raw terms from a record body, and
    /// `normalize` canonicalizes each term (empty output drops the term).
    pub fn build<R, S, N>(
        &self,
        input: &mut dyn BufRead,
        output: &Path,
        mut read_record: R,
        split: S,
        normalize: N,
    ) -> Result<()>
    where
        R: FnMut(&mut dyn BufRead) -> io::Result<Option<DocumentRecord>>,
        S: Fn(String, &mut dyn FnMut(String)) + Sync,
        N: Fn(String) -> String + Sync,
    {
        let workers = self.threads - 1;

        let (document_count, batch_count) = thread::scope(|scope| -> Result<(DocId, usize)> {
            // Jobs travel unbounded; the bounded token channel is the
            // gate. The driver deposits a token per dispatched batch and
            // a worker removes one only once the batch is fully
            // processed, so tokens count in-flight batches, queued and
            // executing alike.
            let (job_sender, job_receiver) = crossbeam_channel::unbounded::<BatchProcess>();
            let (permit_sender, permit_receiver) = crossbeam_channel::bounded::<()>(2 * workers);

            let mut handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                let job_receiver = job_receiver.clone();
                let permit_receiver = permit_receiver.clone();
                let split = &split;
                let normalize = &normalize;
                handles.push(scope.spawn(move || -> io::Result<()> {
                    for batch in job_receiver {
                        let result = process_batch(batch, split, normalize);
                        let _ = permit_receiver.recv();
                        result?;
                    }
                    Ok(())
                }));
            }
            drop(job_receiver);
            drop(permit_receiver);

            let mut batch_number = 0usize;
            let mut first_document: DocId = 0;
            let mut records = Vec::with_capacity(self.batch_size);
            let mut stream_failure: Option<Error> = None;

            loop {
                match read_record(&mut *input) {
                    Ok(Some(record)) => {
                        if !record.valid {
                            continue;
                        }
                        records.push(record);
                        if records.len() == self.batch_size {
                            let batch = BatchProcess {
                                batch_number,
                                records: std::mem::replace(
                                    &mut records,
                                    Vec::with_capacity(self.batch_size),
                                ),
                                first_document,
                                output: output.to_path_buf(),
                            };
                            first_document += self.batch_size as DocId;
                            batch_number += 1;
                            // Blocks while 2 * workers batches are in
                            // flight. A failed send means every worker is
                            // gone; the join below surfaces its error.
                            if permit_sender.send(()).is_err()
                                || job_sender.send(batch).is_err()
                            {
                                break;
                            }
                        }
                    }
                    Ok(None) => {
                        // The final batch is dispatched even when empty.
                        let batch_len = records.len();
                        let batch = BatchProcess {
                            batch_number,
                            records: std::mem::take(&mut records),
                            first_document,
                            output: output.to_path_buf(),
                        };
                        first_document += batch_len as DocId;
                        batch_number += 1;
                        if permit_sender.send(()).is_ok() {
                            let _ = job_sender.send(batch);
                        }
                        break;
                    }
                    Err(err) => {
                        stream_failure = Some(err.into());
                        break;
                    }
                }
            }
            drop(job_sender);
            drop(permit_sender);

            for handle in handles {
                match handle.join() {
                    Ok(result) => result?,
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            if let Some(err) = stream_failure {
                return Err(err);
            }
            Ok((first_document, batch_number))
        })?;

        tracing::info!(
            documents = document_count,
            batches = batch_count,
            "ingestion complete"
        );

        self.merge(output, document_count, batch_count)?;
        self.remove_batches(output, batch_count)?;
        Ok(())
    }

    /// Sequential post-ingestion phases: sidecar concatenation, term
    /// dictionary merge, id remapping, and index concatenation.
    fn merge(&self, output: &Path, document_count: DocId, batch_count: usize) -> Result<()> {
        tracing::info!("merging document ids");
        concat_sidecars(output, ".documents", batch_count)?;
        tracing::info!("merging urls");
        concat_sidecars(output, ".urls", batch_count)?;

        tracing::info!("collecting terms");
        let progress = merge_progress_bar(batch_count as u64, "collecting terms");
        let mut collector = TermCollector::new();
        for batch in 0..batch_count {
            let file = File::open(suffixed(&batch_file(output, batch), ".terms"))?;
            collector.push_batch(BufReader::new(file))?;
            progress.inc(1);
        }
        progress.finish_and_clear();
        let terms = collector.finish();

        tracing::info!(terms = terms.len(), "writing term dictionary");
        let mut term_os = BufWriter::with_capacity(
            WRITE_BUFFER_SIZE,
            File::create(suffixed(output, ".terms"))?,
        );
        for term in &terms {
            writeln!(term_os, "{term}")?;
        }
        term_os.flush()?;

        let mapping = reverse_mapping(terms);

        tracing::info!("remapping term ids");
        let progress = merge_progress_bar(batch_count as u64, "remapping term ids");
        for batch in 0..batch_count {
            remap_batch(&batch_file(output, batch), &mapping)?;
            progress.inc(1);
        }
        progress.finish_and_clear();
        drop(mapping);

        tracing::info!("concatenating batches");
        let mut index = BufWriter::with_capacity(WRITE_BUFFER_SIZE, File::create(output)?);
        write_header(&mut index, document_count)?;
        for batch in 0..batch_count {
            let mut batch_index = File::open(batch_file(output, batch))?;
            batch_index.seek(SeekFrom::Start(HEADER_LEN))?;
            io::copy(&mut batch_index, &mut index)?;
        }
        index.flush()?;
        Ok(())
    }

    /// Delete the four per-batch files for every batch.
    fn remove_batches(&self, output: &Path, batch_count: usize) -> Result<()> {
        for batch in 0..batch_count {
            let base = batch_file(output, batch);
            fs::remove_file(suffixed(&base, ".documents"))?;
            fs::remove_file(suffixed(&base, ".terms"))?;
            fs::remove_file(suffixed(&base, ".urls"))?;
            fs::remove_file(&base)?;
        }
        Ok(())
    }
}

/// Append each batch's sidecar file to the output sidecar, in batch order.
fn concat_sidecars(output: &Path, suffix: &str, batch_count: usize) -> io::Result<()> {
    let mut writer = BufWriter::with_capacity(
        WRITE_BUFFER_SIZE,
        File::create(suffixed(output, suffix))?,
    );
    for batch in 0..batch_count {
        let mut reader = File::open(suffixed(&batch_file(output, batch), suffix))?;
        io::copy(&mut reader, &mut writer)?;
    }
    writer.flush()
}

/// Rewrite every term id in a batch index from local to global, in place.
///
/// The local `.terms` file is the id -> term array for the batch; looking
/// each term up in the global mapping yields the translation table.
fn remap_batch(path: &Path, mapping: &HashMap<String, TermId>) -> Result<()> {
    let local_terms = fs::read_to_string(suffixed(path, ".terms"))?;
    let table: Vec<TermId> = local_terms.lines().map(|term| mapping[term]).collect();

    let file = OpenOptions::new().read(true).write(true).open(path)?;
    let mut mmap = unsafe { MmapMut::map_mut(&file)? };
    let bytes = &mut mmap[..];

    let mut offset = HEADER_LEN as usize;
    while offset < bytes.len() {
        let length = read_u32_at(bytes, offset) as usize;
        offset += 4;
        for _ in 0..length {
            let local = read_u32_at(bytes, offset) as usize;
            write_u32_at(bytes, offset, table[local]);
            offset += 4;
        }
    }
    mmap.flush()?;
    Ok(())
}

fn merge_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap(),
    );
    pb.set_message(message.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::split_plaintext;
    use crate::record::read_plaintext_record;
    use std::io::Cursor;

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            ForwardIndexBuilder::new(0, 2),
            Err(Error::ZeroBatchSize)
        ));
        assert!(matches!(
            ForwardIndexBuilder::new(10, 1),
            Err(Error::NotEnoughThreads(1))
        ));
        assert!(matches!(
            ForwardIndexBuilder::new(10, 0),
            Err(Error::NotEnoughThreads(0))
        ));
        assert!(ForwardIndexBuilder::new(1, 2).is_ok());
    }

    #[test]
    fn test_build_small_collection() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("fwd");

        let mut input = Cursor::new(b"d0 b a\nd1 c b\n".to_vec());
        let builder = ForwardIndexBuilder::new(1, 2).unwrap();
        builder
            .build(
                &mut input,
                &output,
                read_plaintext_record,
                split_plaintext,
                |t: String| t,
            )
            .unwrap();

        let terms = fs::read_to_string(suffixed(&output, ".terms")).unwrap();
        assert_eq!(terms, "a\nb\nc\n");

        let docs = crate::format::IndexReader::open(&output)
            .unwrap()
            .documents()
            .unwrap();
        assert_eq!(docs, vec![vec![1, 0], vec![2, 1]]);
    }

    #[test]
    fn test_stream_error_is_fatal() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("fwd");

        let mut input = Cursor::new(Vec::new());
        let mut pulls = 0;
        let builder = ForwardIndexBuilder::new(2, 2).unwrap();
        let result = builder.build(
            &mut input,
            &output,
            |_: &mut dyn BufRead| {
                pulls += 1;
                if pulls > 3 {
                    Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream died"))
                } else {
                    Ok(Some(DocumentRecord::new(format!("d{pulls}"), "x")))
                }
            },
            split_plaintext,
            |t: String| t,
        );
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
