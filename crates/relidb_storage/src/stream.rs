//! Lazy row streams and replayable cursors.

use crate::row::Row;
use parking_lot::Mutex;
use std::sync::Arc;

/// A lazy sequence of rows from a backend read.
///
/// Streams may be single-pass over the underlying transport (a cursor, a
/// network stream); dropping the stream releases whatever it holds. Wrap a
/// stream in [`ReplayRows`] when several consumers need to iterate it
/// independently.
pub struct RowStream {
    inner: Box<dyn Iterator<Item = Row> + Send>,
}

impl RowStream {
    /// Wraps an iterator of rows.
    pub fn new(iter: impl Iterator<Item = Row> + Send + 'static) -> Self {
        Self {
            inner: Box::new(iter),
        }
    }

    /// A stream over an already materialized set of rows.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self::new(rows.into_iter())
    }

    /// An empty stream.
    pub fn empty() -> Self {
        Self::from_rows(Vec::new())
    }
}

impl Iterator for RowStream {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.inner.next()
    }
}

impl std::fmt::Debug for RowStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowStream").finish_non_exhaustive()
    }
}

/// Replays a single-pass row stream to any number of cursors.
///
/// Rows are pulled from the source on demand and memoized; every
/// [`ReplayCursor`] walks the shared memo at its own position, so
/// independent consumers never force the backend to re-execute the read.
/// The memo lives as long as any cursor does.
#[derive(Clone)]
pub struct ReplayRows {
    shared: Arc<Mutex<ReplayState>>,
}

struct ReplayState {
    source: RowStream,
    memo: Vec<Row>,
    exhausted: bool,
}

impl ReplayRows {
    /// Wraps a stream for replay.
    pub fn new(source: RowStream) -> Self {
        Self {
            shared: Arc::new(Mutex::new(ReplayState {
                source,
                memo: Vec::new(),
                exhausted: false,
            })),
        }
    }

    /// Opens a cursor at the beginning of the stream.
    pub fn cursor(&self) -> ReplayCursor {
        ReplayCursor {
            shared: Arc::clone(&self.shared),
            position: 0,
        }
    }

    /// Returns the row at `index`, pulling from the source as needed.
    fn row_at(&self, index: usize) -> Option<Row> {
        let mut state = self.shared.lock();
        while state.memo.len() <= index && !state.exhausted {
            match state.source.next() {
                Some(row) => state.memo.push(row),
                None => state.exhausted = true,
            }
        }
        state.memo.get(index).cloned()
    }
}

impl std::fmt::Debug for ReplayRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("ReplayRows")
            .field("memoized", &state.memo.len())
            .field("exhausted", &state.exhausted)
            .finish()
    }
}

/// An independent cursor over a [`ReplayRows`].
#[derive(Clone)]
pub struct ReplayCursor {
    shared: Arc<Mutex<ReplayState>>,
    position: usize,
}

impl ReplayCursor {
    /// Rewinds this cursor to the beginning.
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

impl Iterator for ReplayCursor {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let replay = ReplayRows {
            shared: Arc::clone(&self.shared),
        };
        let row = replay.row_at(self.position);
        if row.is_some() {
            self.position += 1;
        }
        row
    }
}
