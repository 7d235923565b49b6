//! Text file loaders.
//!
//! Loading is two passes over the file: [`scan_capacity`] sizes the store,
//! then every non-blank line is ingested in order.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use super::parse::{ParseError, Tokens};
use super::quantize::QuantDict;
use super::storage::{BackingStore, GroupedStore, Ingest, StoreCapacity, TupleStore};

/// Number of header tokens before the first pair (label + three counts).
const HEADER_TOKENS: usize = 4;

/// Errors that can occur when loading a store from a file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },
}

/// Count non-blank lines and an upper bound on their `index:value` pairs.
pub fn scan_capacity<R: BufRead>(reader: R) -> io::Result<StoreCapacity> {
    let mut capacity = StoreCapacity::default();
    for line in reader.lines() {
        let line = line?;
        let tokens = Tokens::new(&line).count();
        if tokens == 0 {
            continue;
        }
        capacity.rows += 1;
        capacity.values += tokens.saturating_sub(HEADER_TOKENS).div_ceil(2);
    }
    Ok(capacity)
}

/// Ingest every non-blank line of `reader` into `store`.
///
/// Returns the number of lines ingested. Stops at the first line that fails
/// to parse; rows ingested before it are kept.
pub fn read_into<S: Ingest, R: BufRead>(store: &mut S, reader: R) -> Result<usize, LoadError> {
    let mut ingested = 0;
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        store
            .ingest(&line)
            .map_err(|source| LoadError::Parse { line: n + 1, source })?;
        ingested += 1;
    }
    Ok(ingested)
}

fn scan_file(path: &Path) -> io::Result<StoreCapacity> {
    scan_capacity(BufReader::new(File::open(path)?))
}

/// Load a grouped-CSR file, storing values as codes when `dict` is given.
pub fn load_grouped(path: impl AsRef<Path>, dict: Option<QuantDict>) -> Result<GroupedStore, LoadError> {
    let path = path.as_ref();
    let capacity = scan_file(path)?;
    let mut store = match dict {
        Some(dict) => GroupedStore::quantized(capacity, dict),
        None => GroupedStore::new(capacity),
    };
    read_into(&mut store, BufReader::new(File::open(path)?))?;
    log::debug!(
        "loaded {} grouped rows ({} values) from {}",
        store.num_rows(),
        store.num_values(),
        path.display()
    );
    Ok(store)
}

/// Load a flat-COO file.
pub fn load_tuples(path: impl AsRef<Path>) -> Result<TupleStore, LoadError> {
    let path = path.as_ref();
    let capacity = scan_file(path)?;
    let mut store = TupleStore::new(capacity);
    read_into(&mut store, BufReader::new(File::open(path)?))?;
    store.shrink_to_fit();
    log::debug!(
        "loaded {} tuple rows ({} nonzeros) from {}",
        store.num_rows(),
        store.num_values(),
        path.display()
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureGroup;

    const GROUPED: &str = "4.5 0 1 2 7:1.0 10:2.0 11:3.0\n\n3 0 1 1 8:1 10:5\n";

    #[test]
    fn scan_counts_rows_and_pairs() {
        let capacity = scan_capacity(GROUPED.as_bytes()).unwrap();
        assert_eq!(capacity, StoreCapacity::new(2, 5));
    }

    #[test]
    fn scan_rounds_dangling_tokens_up() {
        let capacity = scan_capacity("1 0 0 1 3:1 9".as_bytes()).unwrap();
        assert_eq!(capacity.values, 2);
    }

    #[test]
    fn read_skips_blank_lines() {
        let mut store = GroupedStore::new(scan_capacity(GROUPED.as_bytes()).unwrap());
        let n = read_into(&mut store, GROUPED.as_bytes()).unwrap();
        assert_eq!(n, 2);
        assert_eq!(store.label(1), 3.0);
        assert_eq!(store.segment(1, FeatureGroup::Item).values.float_value(0), 5.0);
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let input = "1 0 1 0 1:1\n\n1 0 1 1 1:1\n";
        let mut store = GroupedStore::new(StoreCapacity::new(2, 4));
        let err = read_into(&mut store, input.as_bytes()).unwrap_err();
        match err {
            LoadError::Parse { line, source } => {
                assert_eq!(line, 3);
                assert_eq!(source, ParseError::PairCountMismatch { declared: 2, found: 1 });
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.num_rows(), 1);
    }
}
