use crate::commitlog::{self, Index};
use crate::grpc::{ProtoEventKind, ProtoLogEntry};
use chrono::{DateTime, TimeZone, Utc};
use prost::Message;
use std::convert::TryFrom;
use std::{fmt, io};

/// Term is the election epoch a log entry was proposed in. It only moves forward when a new leader
/// is elected.
#[derive(Copy, Clone, Default, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Term(u64);

impl Term {
    pub fn new(term: u64) -> Self {
        Term(term)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Term {
        Term(self.0 + 1)
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    OrderProposed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderPayload {
    pub item_name: String,
    pub quantity: u64,
}

/// LogEntry is a single replicated operation. Within one node, entries sit at strictly increasing
/// indexes with no gaps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub index: Index,
    pub term: Term,
    pub timestamp: DateTime<Utc>,
    pub event_kind: EventKind,
    pub payload: OrderPayload,
}

impl LogEntry {
    pub fn new_order(index: Index, term: Term, payload: OrderPayload) -> Self {
        LogEntry {
            index,
            term,
            timestamp: now_millis_precision(),
            event_kind: EventKind::OrderProposed,
            payload,
        }
    }
}

// Timestamps travel and persist as millis. Dropping sub-milli precision up front keeps the leader's
// in-memory copy equal to what followers decode.
fn now_millis_precision() -> DateTime<Utc> {
    let now = Utc::now();
    Utc.timestamp_millis_opt(now.timestamp_millis()).single().unwrap_or(now)
}

impl From<LogEntry> for ProtoLogEntry {
    fn from(entry: LogEntry) -> Self {
        let event_kind = match entry.event_kind {
            EventKind::OrderProposed => ProtoEventKind::OrderProposed,
        };

        ProtoLogEntry {
            index: entry.index.as_u64(),
            term: entry.term.as_u64(),
            timestamp_millis: entry.timestamp.timestamp_millis(),
            event_kind: event_kind as i32,
            item_name: entry.payload.item_name,
            quantity: entry.payload.quantity,
        }
    }
}

impl TryFrom<ProtoLogEntry> for LogEntry {
    type Error = &'static str;

    fn try_from(proto: ProtoLogEntry) -> Result<Self, Self::Error> {
        let index = Index::from_u64(proto.index).ok_or("Log entry index must be non-zero")?;
        let timestamp = Utc
            .timestamp_millis_opt(proto.timestamp_millis)
            .single()
            .ok_or("Log entry timestamp out of range")?;
        let event_kind = match ProtoEventKind::from_i32(proto.event_kind) {
            Some(ProtoEventKind::OrderProposed) => EventKind::OrderProposed,
            Some(ProtoEventKind::EventKindUnspecified) | None => return Err("Unknown log entry event kind"),
        };

        Ok(LogEntry {
            index,
            term: Term::new(proto.term),
            timestamp,
            event_kind,
            payload: OrderPayload {
                item_name: proto.item_name,
                quantity: proto.quantity,
            },
        })
    }
}

impl commitlog::Entry for LogEntry {}

impl From<LogEntry> for Vec<u8> {
    fn from(entry: LogEntry) -> Self {
        encode_to_vec(&ProtoLogEntry::from(entry))
    }
}

impl TryFrom<Vec<u8>> for LogEntry {
    type Error = io::Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        let proto = ProtoLogEntry::decode(bytes.as_slice()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        LogEntry::try_from(proto).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

pub(super) fn encode_to_vec<M: Message>(message: &M) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(message.encoded_len());
    message
        .encode(&mut bytes)
        .expect("Vec grows on demand, so encoding can't run out of buffer");
    bytes
}

#[cfg(test)]
mod tests {
    use super::{LogEntry, OrderPayload, Term};
    use crate::commitlog::Index;
    use crate::grpc::ProtoLogEntry;
    use std::convert::TryFrom;

    fn tux(quantity: u64) -> OrderPayload {
        OrderPayload {
            item_name: "Tux".to_string(),
            quantity,
        }
    }

    #[test]
    fn entry_survives_encoding() {
        let entry = LogEntry::new_order(Index::new(3), Term::new(2), tux(5));

        let bytes: Vec<u8> = entry.clone().into();
        assert_eq!(entry, LogEntry::try_from(bytes).unwrap());
    }

    #[test]
    fn rejects_malformed_wire_entries() {
        let valid = ProtoLogEntry::from(LogEntry::new_order(Index::new(1), Term::new(1), tux(1)));

        let zero_index = ProtoLogEntry { index: 0, ..valid.clone() };
        assert!(LogEntry::try_from(zero_index).is_err());

        let unknown_kind = ProtoLogEntry { event_kind: 0, ..valid.clone() };
        assert!(LogEntry::try_from(unknown_kind).is_err());

        assert!(LogEntry::try_from(valid).is_ok());
    }

    #[test]
    fn garbage_bytes_are_invalid_data() {
        let err = LogEntry::try_from(vec![0xFF, 0xFF, 0xFF]).unwrap_err();
        assert_eq!(std::io::ErrorKind::InvalidData, err.kind());
    }
}
