use crate::commitlog::{Entry, Index, Log};
use std::convert::TryFrom;
use std::io;
use std::marker::PhantomData;

/// InMemoryLog keeps every entry in RAM. Used by nodes started without a data directory, and by
/// tests.
pub struct InMemoryLog<E: Entry> {
    // We don't *need* to convert these to bytes. We could just hold the original entry in memory,
    // but we want to exercise the conversion logic.
    log: Vec<Vec<u8>>,
    _pd: PhantomData<E>,
}

impl<E: Entry> InMemoryLog<E> {
    pub fn create() -> Result<Self, io::Error> {
        Ok(InMemoryLog {
            log: vec![],
            _pd: PhantomData::default(),
        })
    }

    fn vec_index(index: Index) -> usize {
        // Log API states that Index starts from 1.
        (index.as_u64() - 1) as usize
    }
}

impl<E: Entry> Log<E> for InMemoryLog<E> {
    fn append(&mut self, entry: E) -> Result<Index, io::Error> {
        self.log.push(entry.into());

        Ok(Index::new_usize(self.log.len()))
    }

    fn read(&self, index: Index) -> Result<Option<E>, io::Error> {
        match self.log.get(Self::vec_index(index)) {
            Some(bytes) => E::try_from(bytes.clone()).map(Some),
            None => Ok(None),
        }
    }

    fn truncate(&mut self, index: Index) -> Result<(), io::Error> {
        self.log.truncate(Self::vec_index(index));
        Ok(())
    }

    fn next_index(&self) -> Index {
        Index::new_usize(self.log.len() + 1)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::InMemoryLog;
    use crate::commitlog::{Entry, Index, Log};
    use std::convert::TryFrom;
    use std::io;

    #[derive(Clone, Debug, PartialEq)]
    pub(crate) struct TestEntry(pub(crate) String);

    impl Entry for TestEntry {}

    impl From<TestEntry> for Vec<u8> {
        fn from(entry: TestEntry) -> Self {
            entry.0.into_bytes()
        }
    }

    impl TryFrom<Vec<u8>> for TestEntry {
        type Error = io::Error;

        fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
            String::from_utf8(bytes)
                .map(TestEntry)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        }
    }

    pub(crate) fn entry(s: &str) -> TestEntry {
        TestEntry(s.to_string())
    }

    #[test]
    fn append_read_truncate() {
        let mut log = InMemoryLog::create().unwrap();
        assert_eq!(Index::start_index(), log.next_index());

        assert_eq!(Index::new(1), log.append(entry("a")).unwrap());
        assert_eq!(Index::new(2), log.append(entry("b")).unwrap());
        assert_eq!(Index::new(3), log.append(entry("c")).unwrap());

        assert_eq!(Some(entry("b")), log.read(Index::new(2)).unwrap());
        assert_eq!(None, log.read(Index::new(4)).unwrap());

        log.truncate(Index::new(2)).unwrap();
        assert_eq!(Index::new(2), log.next_index());
        assert_eq!(Some(entry("a")), log.read(Index::new(1)).unwrap());
        assert_eq!(None, log.read(Index::new(2)).unwrap());

        // Past the end.
        log.truncate(Index::new(9)).unwrap();
        assert_eq!(Index::new(2), log.next_index());
    }
}
