//! On-disk binary index format.
//!
//! The index is a flat sequence of length-prefixed records of `u32`
//! little-endian words. The file opens with a header record of exactly one
//! word (the document count), so the whole file is a uniform sequence of
//! `u32 length` followed by `length` words. Byte order is little-endian on
//! disk regardless of host.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

/// Byte length of the index header (`u32 1` followed by `u32 doc_count`).
pub const HEADER_LEN: u64 = 8;

/// Write one length-prefixed record: `u32(ids.len())` then the ids.
pub fn write_record<W: Write>(writer: &mut W, ids: &[u32]) -> io::Result<()> {
    writer.write_all(&(ids.len() as u32).to_le_bytes())?;
    for &id in ids {
        writer.write_all(&id.to_le_bytes())?;
    }
    Ok(())
}

/// Write the index header. The count is framed as a one-element record so
/// the file stays a uniform sequence of length-prefixed records.
pub fn write_header<W: Write>(writer: &mut W, document_count: u32) -> io::Result<()> {
    write_record(writer, &[document_count])
}

/// Read a `u32` from a raw byte buffer at `offset`.
pub fn read_u32_at(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

/// Overwrite a `u32` in a raw byte buffer at `offset`.
pub fn write_u32_at(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Sequential decoder for a binary index file.
///
/// Validates the header on open and then yields one term-id vector per
/// document. The pipeline itself only appends and rewrites in place; this
/// reader exists for consumers and tests.
pub struct IndexReader {
    reader: BufReader<File>,
    document_count: u32,
    remaining: u32,
}

impl IndexReader {
    /// Open an index (or batch index) file and validate its header.
    pub fn open(path: &Path) -> io::Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let header_len = read_u32(&mut reader)?;
        if header_len != 1 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("index header length word is {header_len}, expected 1"),
            ));
        }
        let document_count = read_u32(&mut reader)?;
        Ok(Self {
            reader,
            document_count,
            remaining: document_count,
        })
    }

    /// Document count recorded in the header.
    pub fn document_count(&self) -> u32 {
        self.document_count
    }

    /// Read the next document's term ids, or `None` past the last document.
    pub fn next_document(&mut self) -> io::Result<Option<Vec<u32>>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let length = read_u32(&mut self.reader)? as usize;
        let mut ids = Vec::with_capacity(length);
        for _ in 0..length {
            ids.push(read_u32(&mut self.reader)?);
        }
        Ok(Some(ids))
    }

    /// Decode all remaining documents.
    pub fn documents(mut self) -> io::Result<Vec<Vec<u32>>> {
        let mut docs = Vec::with_capacity(self.remaining as usize);
        while let Some(ids) = self.next_document()? {
            docs.push(ids);
        }
        Ok(docs)
    }
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut word = [0u8; 4];
    reader.read_exact(&mut word)?;
    Ok(u32::from_le_bytes(word))
}
