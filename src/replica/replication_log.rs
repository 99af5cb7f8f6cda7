use crate::commitlog::{Index, Log};
use crate::replica::log_entry::{LogEntry, Term};
use std::io;

/// ReplicationLog is the order-specific facade over the generic commit log.
///
/// Note: A log entry has 2 states on a follower (not modeled directly in code):
/// 1. Speculative - appended during a replication round whose outcome isn't known yet
/// 2. Committed - the leader has applied it, and the matching order record has been persisted
///
/// The leader only ever appends entries that already reached quorum. Speculative entries are
/// removed with `truncate_from()` when their round fails.
pub(crate) struct ReplicationLog<L>
where
    L: Log<LogEntry>,
{
    logger: slog::Logger,
    log: L,
    // Metadata about the highest log entry that we've locally written. Must be kept in sync with
    // the underlying log.
    latest_entry_metadata: Option<(Term, Index)>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReplicationLogError {
    #[error("Expected to append at index {expected:?}, but entry is for index {found:?}")]
    IndexMismatch { expected: Index, found: Index },
    #[error("Replication log IO failure: {0}")]
    Io(#[from] io::Error),
}

impl<L> ReplicationLog<L>
where
    L: Log<LogEntry>,
{
    /// Wraps an existing (possibly non-empty) log. Fails if a persisted entry doesn't sit at the
    /// index it claims.
    pub(crate) fn open(logger: slog::Logger, log: L) -> Result<Self, ReplicationLogError> {
        let latest_entry_metadata = match log.next_index().checked_minus(1) {
            None => None,
            Some(last_index) => match log.read(last_index)? {
                Some(entry) if entry.index == last_index => Some((entry.term, last_index)),
                Some(entry) => {
                    return Err(ReplicationLogError::IndexMismatch {
                        expected: last_index,
                        found: entry.index,
                    })
                }
                None => {
                    return Err(ReplicationLogError::Io(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Log reports entry {:?} but it can't be read", last_index),
                    )))
                }
            },
        };

        slog::info!(logger, "Opened replication log. Latest entry (term, index): {:?}", latest_entry_metadata);

        Ok(ReplicationLog {
            logger,
            log,
            latest_entry_metadata,
        })
    }

    /// Highest index present, or None when the log is empty.
    pub(crate) fn last_index(&self) -> Option<Index> {
        self.latest_entry_metadata.map(|(_, index)| index)
    }

    pub(crate) fn last_term(&self) -> Term {
        self.latest_entry_metadata
            .map(|(term, _)| term)
            .unwrap_or_default()
    }

    pub(crate) fn next_index(&self) -> Index {
        match self.last_index() {
            None => Index::start_index(),
            Some(index) => index.plus(1),
        }
    }

    pub(crate) fn entry_at(&self, index: Index) -> Result<Option<LogEntry>, ReplicationLogError> {
        Ok(self.log.read(index)?)
    }

    /// Appends at `last_index() + 1`. The entry's own index is the caller's expectation of where it
    /// lands, so two racing proposals for the same slot can't both succeed.
    pub(crate) fn append(&mut self, entry: LogEntry) -> Result<Index, ReplicationLogError> {
        let expected = self.next_index();
        if entry.index != expected {
            return Err(ReplicationLogError::IndexMismatch {
                expected,
                found: entry.index,
            });
        }

        let appended_term = entry.term;
        let appended_index = self.log.append(entry)?;
        assert_eq!(
            appended_index, expected,
            "Underlying log appended at unexpected index"
        );

        // Only update state after log action completes.
        self.latest_entry_metadata = Some((appended_term, appended_index));

        Ok(appended_index)
    }

    /// Remove anything starting at `index` and later.
    pub(crate) fn truncate_from(&mut self, index: Index) -> Result<(), ReplicationLogError> {
        match self.last_index() {
            Some(last_index) if index <= last_index => {}
            _ => return Ok(()),
        }

        let mut new_latest_entry_metadata = None;
        if let Some(new_latest_entry_index) = index.checked_minus(1) {
            new_latest_entry_metadata = self
                .log
                .read(new_latest_entry_index)?
                .map(|latest_entry| (latest_entry.term, new_latest_entry_index));
        }

        self.log.truncate(index)?;

        slog::info!(
            self.logger,
            "Truncated replication log from {:?}. Latest entry is now {:?}",
            index,
            new_latest_entry_metadata
        );
        self.latest_entry_metadata = new_latest_entry_metadata;

        Ok(())
    }
}
