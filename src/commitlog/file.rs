use crate::commitlog::{Entry, Index, Log};
use bytes::{Buf, BufMut, BytesMut};
use std::convert::TryFrom;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

// Every record on disk:
//
// | 0 | 1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 | ... |
// +---+---+---+---+---+---+---+---+---+-...-+
// |  Len (u32 BE) |  CRC32 (u32 BE)|  Data |
// +---------------+---------------+-----...-+
const HEADER_LEN: usize = 8;

/// FileLog is a durable, single-file log. Every append and truncate is fsynced before returning.
///
/// The byte offset of each record is held in memory so reads and truncations can seek directly.
pub struct FileLog<E: Entry> {
    logger: slog::Logger,
    path: PathBuf,
    file: File,
    // offsets[i] is where the record for Index(i + 1) starts.
    offsets: Vec<u64>,
    end_offset: u64,
    _pd: PhantomData<E>,
}

impl<E: Entry> FileLog<E> {
    /// Opens (or creates) the log at `path` and replays its records. A torn or corrupt tail is cut
    /// off, since it can only be the result of a crash mid-append.
    pub fn open(logger: slog::Logger, path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().read(true).write(true).create(true).open(&path)?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;

        let (offsets, valid_len) = Self::scan_records(&contents);
        if valid_len < contents.len() as u64 {
            slog::warn!(
                logger,
                "Cutting off {} trailing bytes of torn/corrupt data from {:?}",
                contents.len() as u64 - valid_len,
                path
            );
            file.set_len(valid_len)?;
            file.sync_data()?;
        }

        slog::debug!(logger, "Opened {:?} with {} records", path, offsets.len());

        Ok(FileLog {
            logger,
            path,
            file,
            offsets,
            end_offset: valid_len,
            _pd: PhantomData::default(),
        })
    }

    fn scan_records(contents: &[u8]) -> (Vec<u64>, u64) {
        let mut offsets = Vec::new();
        let mut position = 0usize;

        while contents.len() - position >= HEADER_LEN {
            let mut header = &contents[position..position + HEADER_LEN];
            let len = header.get_u32() as usize;
            let expected_crc = header.get_u32();

            let data_start = position + HEADER_LEN;
            if contents.len() - data_start < len {
                break;
            }

            let data = &contents[data_start..data_start + len];
            if crc32fast::hash(data) != expected_crc {
                break;
            }

            offsets.push(position as u64);
            position = data_start + len;
        }

        (offsets, position as u64)
    }

    fn vec_index(index: Index) -> usize {
        (index.as_u64() - 1) as usize
    }

    fn read_record(&self, offset: u64) -> Result<Vec<u8>, io::Error> {
        let mut reader = File::open(&self.path)?;
        reader.seek(SeekFrom::Start(offset))?;

        let mut header = [0u8; HEADER_LEN];
        reader.read_exact(&mut header)?;
        let mut header = &header[..];
        let len = header.get_u32() as usize;
        let expected_crc = header.get_u32();

        let mut data = vec![0u8; len];
        reader.read_exact(&mut data)?;

        if crc32fast::hash(&data) != expected_crc {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Checksum mismatch for record at offset {} in {:?}", offset, self.path),
            ));
        }

        Ok(data)
    }
}

impl<E: Entry> Log<E> for FileLog<E> {
    fn append(&mut self, entry: E) -> Result<Index, io::Error> {
        let data: Vec<u8> = entry.into();
        if data.len() > u32::MAX as usize {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "Log entry too large"));
        }

        let mut record = BytesMut::with_capacity(HEADER_LEN + data.len());
        record.put_u32(data.len() as u32);
        record.put_u32(crc32fast::hash(&data));
        record.put_slice(&data);

        self.file.seek(SeekFrom::Start(self.end_offset))?;
        if let Err(e) = self.file.write_all(&record).and_then(|_| self.file.sync_data()) {
            // Don't leave a half written record behind for the next append to land after.
            let _ = self.file.set_len(self.end_offset);
            return Err(e);
        }

        // Only update state after the disk write completes.
        self.offsets.push(self.end_offset);
        self.end_offset += record.len() as u64;

        Ok(Index::new_usize(self.offsets.len()))
    }

    fn read(&self, index: Index) -> Result<Option<E>, io::Error> {
        match self.offsets.get(Self::vec_index(index)) {
            Some(offset) => E::try_from(self.read_record(*offset)?).map(Some),
            None => Ok(None),
        }
    }

    fn truncate(&mut self, index: Index) -> Result<(), io::Error> {
        let vec_index = Self::vec_index(index);
        let new_end_offset = match self.offsets.get(vec_index) {
            Some(offset) => *offset,
            None => return Ok(()),
        };

        self.file.set_len(new_end_offset)?;
        self.file.sync_data()?;

        slog::debug!(
            self.logger,
            "Truncated {:?} from index {:?} ({} records removed)",
            self.path,
            index,
            self.offsets.len() - vec_index
        );
        self.offsets.truncate(vec_index);
        self.end_offset = new_end_offset;

        Ok(())
    }

    fn next_index(&self) -> Index {
        Index::new_usize(self.offsets.len() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::FileLog;
    use crate::commitlog::in_memory::tests::{entry, TestEntry};
    use crate::commitlog::{Index, Log};
    use std::fs::OpenOptions;
    use std::io::Write;

    fn logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");

        {
            let mut log: FileLog<TestEntry> = FileLog::open(logger(), &path).unwrap();
            log.append(entry("one")).unwrap();
            log.append(entry("two")).unwrap();
            log.append(entry("three")).unwrap();
            log.truncate(Index::new(3)).unwrap();
        }

        let mut log: FileLog<TestEntry> = FileLog::open(logger(), &path).unwrap();
        assert_eq!(Index::new(3), log.next_index());
        assert_eq!(Some(entry("one")), log.read(Index::new(1)).unwrap());
        assert_eq!(Some(entry("two")), log.read(Index::new(2)).unwrap());
        assert_eq!(None, log.read(Index::new(3)).unwrap());

        // Appending after a truncate + reopen lands at the truncated position.
        assert_eq!(Index::new(3), log.append(entry("four")).unwrap());
        assert_eq!(Some(entry("four")), log.read(Index::new(3)).unwrap());
    }

    #[test]
    fn torn_tail_is_cut_off() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");

        {
            let mut log: FileLog<TestEntry> = FileLog::open(logger(), &path).unwrap();
            log.append(entry("intact")).unwrap();
        }

        // Simulate a crash halfway through writing the second record.
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&[0, 0, 0, 42, 1, 2]).unwrap();
        }

        let mut log: FileLog<TestEntry> = FileLog::open(logger(), &path).unwrap();
        assert_eq!(Index::new(2), log.next_index());
        assert_eq!(Some(entry("intact")), log.read(Index::new(1)).unwrap());

        assert_eq!(Index::new(2), log.append(entry("after crash")).unwrap());
        drop(log);

        let log: FileLog<TestEntry> = FileLog::open(logger(), &path).unwrap();
        assert_eq!(Some(entry("after crash")), log.read(Index::new(2)).unwrap());
    }

    #[test]
    fn corrupt_record_is_cut_off() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");

        {
            let mut log: FileLog<TestEntry> = FileLog::open(logger(), &path).unwrap();
            log.append(entry("good")).unwrap();
            log.append(entry("bad")).unwrap();
        }

        // Flip the last data byte of the second record.
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        let log: FileLog<TestEntry> = FileLog::open(logger(), &path).unwrap();
        assert_eq!(Index::new(2), log.next_index());
        assert_eq!(Some(entry("good")), log.read(Index::new(1)).unwrap());
    }
}
