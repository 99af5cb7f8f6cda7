use crate::catalog::{Catalog, CatalogError};
use crate::commitlog::{Index, Log};
use crate::replica::log_entry::LogEntry;
use crate::replica::order_record::OrderRecord;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

/// OrderStateMachine is the committed order table. Order numbers start at 1 and are contiguous, so
/// order `n` is always the `n`th record of the underlying log.
pub(crate) struct OrderStateMachine<T>
where
    T: Log<OrderRecord>,
{
    logger: slog::Logger,
    records: T,
    catalog: Arc<dyn Catalog>,
    order_numbers_by_log_index: HashMap<Index, u64>,
    last_order_number: u64,
    // Log index of the most recently committed entry. None if nothing is committed.
    commit_index: Option<Index>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("Quantity must be greater than 0")]
    InvalidQuantity,
    #[error("Item {0:?} is not in the catalog")]
    UnknownItem(String),
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u64, available: u64 },
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),
    #[error("Expected order number {expected}, found {found}")]
    OrderGap { expected: u64, found: u64 },
    #[error("Order {order_number} conflicts with the order table")]
    RecordConflict { order_number: u64 },
    #[error("Log entry {0:?} is already committed")]
    AlreadyCommitted(Index),
    #[error("Order table IO failure: {0}")]
    Io(#[from] io::Error),
}

impl From<CatalogError> for ApplyError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::UnknownItem(item_name) => ApplyError::UnknownItem(item_name),
            CatalogError::InsufficientStock { requested, available } => {
                ApplyError::InsufficientStock { requested, available }
            }
            CatalogError::Unavailable(message) => ApplyError::CatalogUnavailable(message),
        }
    }
}

impl<T> OrderStateMachine<T>
where
    T: Log<OrderRecord>,
{
    /// Replays every persisted record, so a restarted node continues numbering where it left off.
    pub(crate) fn open(logger: slog::Logger, records: T, catalog: Arc<dyn Catalog>) -> Result<Self, ApplyError> {
        let mut order_numbers_by_log_index = HashMap::new();
        let mut last_order_number = 0;
        let mut commit_index = None;

        let mut next = Index::start_index();
        while next < records.next_index() {
            let record = records.read(next)?.ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Order table is missing record {:?}", next),
                )
            })?;

            if record.order_number != next.as_u64() {
                return Err(ApplyError::OrderGap {
                    expected: next.as_u64(),
                    found: record.order_number,
                });
            }
            if Some(record.log_index) <= commit_index {
                return Err(ApplyError::RecordConflict {
                    order_number: record.order_number,
                });
            }

            order_numbers_by_log_index.insert(record.log_index, record.order_number);
            last_order_number = record.order_number;
            commit_index = Some(record.log_index);
            next = next.plus(1);
        }

        slog::info!(
            logger,
            "Replayed {} orders. Commit index: {:?}",
            last_order_number,
            commit_index
        );

        Ok(OrderStateMachine {
            logger,
            records,
            catalog,
            order_numbers_by_log_index,
            last_order_number,
            commit_index,
        })
    }

    pub(crate) fn last_order_number(&self) -> u64 {
        self.last_order_number
    }

    pub(crate) fn commit_index(&self) -> Option<Index> {
        self.commit_index
    }

    pub(crate) fn get(&self, order_number: u64) -> Result<Option<OrderRecord>, io::Error> {
        match Index::from_u64(order_number) {
            Some(index) => self.records.read(index),
            None => Ok(None),
        }
    }

    pub(crate) fn record_for_log_index(&self, log_index: Index) -> Result<Option<OrderRecord>, io::Error> {
        match self.order_numbers_by_log_index.get(&log_index) {
            Some(order_number) => self.get(*order_number),
            None => Ok(None),
        }
    }

    /// Validates and commits `entry`: checks quantity, decrements stock through the catalog, then
    /// mints the next order number. Only the committing leader calls this. Nothing is minted when
    /// validation fails.
    pub(crate) async fn apply(&mut self, entry: &LogEntry) -> Result<OrderRecord, ApplyError> {
        if entry.payload.quantity == 0 {
            return Err(ApplyError::InvalidQuantity);
        }
        if Some(entry.index) <= self.commit_index {
            return Err(ApplyError::AlreadyCommitted(entry.index));
        }

        self.catalog
            .try_decrement(&entry.payload.item_name, entry.payload.quantity)
            .await?;

        let record = OrderRecord {
            order_number: self.last_order_number + 1,
            item_name: entry.payload.item_name.clone(),
            quantity: entry.payload.quantity,
            log_index: entry.index,
        };

        if let Err(e) = self.persist(record.clone()) {
            slog::error!(
                self.logger,
                "Stock for {:?} was decremented but order {} failed to persist: {:?}",
                record.item_name,
                record.order_number,
                e
            );
            return Err(ApplyError::Io(e));
        }

        Ok(record)
    }

    /// Persists a record the leader already validated. Returns false if the identical record is
    /// already present.
    pub(crate) fn persist_replicated(&mut self, record: OrderRecord) -> Result<bool, ApplyError> {
        if record.order_number <= self.last_order_number {
            return match self.get(record.order_number)? {
                Some(existing) if existing == record => Ok(false),
                _ => Err(ApplyError::RecordConflict {
                    order_number: record.order_number,
                }),
            };
        }

        let expected = self.last_order_number + 1;
        if record.order_number != expected {
            return Err(ApplyError::OrderGap {
                expected,
                found: record.order_number,
            });
        }
        if Some(record.log_index) <= self.commit_index {
            return Err(ApplyError::RecordConflict {
                order_number: record.order_number,
            });
        }

        self.persist(record)?;
        Ok(true)
    }

    fn persist(&mut self, record: OrderRecord) -> Result<(), io::Error> {
        let order_number = record.order_number;
        let log_index = record.log_index;

        let appended_index = self.records.append(record)?;
        assert_eq!(
            appended_index.as_u64(),
            order_number,
            "Order record landed at a position that doesn't match its order number"
        );

        // Only update state after the record is durable.
        self.order_numbers_by_log_index.insert(log_index, order_number);
        self.last_order_number = order_number;
        self.commit_index = Some(log_index);

        slog::debug!(self.logger, "Committed order {} from log index {:?}", order_number, log_index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ApplyError, OrderStateMachine};
    use crate::catalog::{Catalog, InMemoryCatalog};
    use crate::commitlog::{FileLog, InMemoryLog, Index};
    use crate::replica::log_entry::{LogEntry, OrderPayload, Term};
    use crate::replica::order_record::OrderRecord;
    use std::sync::Arc;

    fn logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    fn entry(index: u64, item_name: &str, quantity: u64) -> LogEntry {
        LogEntry::new_order(
            Index::new(index),
            Term::new(1),
            OrderPayload {
                item_name: item_name.to_string(),
                quantity,
            },
        )
    }

    fn record(order_number: u64, log_index: u64) -> OrderRecord {
        OrderRecord {
            order_number,
            item_name: "Tux".to_string(),
            quantity: 1,
            log_index: Index::new(log_index),
        }
    }

    fn new_machine(catalog: Arc<InMemoryCatalog>) -> OrderStateMachine<InMemoryLog<OrderRecord>> {
        OrderStateMachine::open(logger(), InMemoryLog::create().unwrap(), catalog).unwrap()
    }

    #[tokio::test]
    async fn apply_mints_increasing_order_numbers() {
        let catalog = Arc::new(InMemoryCatalog::new(vec![("Tux", 10), ("Fox", 3)]));
        let mut machine = new_machine(catalog.clone());

        let first = machine.apply(&entry(1, "Tux", 5)).await.unwrap();
        let second = machine.apply(&entry(2, "Fox", 1)).await.unwrap();

        assert_eq!(1, first.order_number);
        assert_eq!(2, second.order_number);
        assert_eq!(Some(Index::new(2)), machine.commit_index());
        assert_eq!(Some(5), catalog.quantity("Tux"));
        assert_eq!(Some(first.clone()), machine.get(1).unwrap());
        assert_eq!(Some(second), machine.record_for_log_index(Index::new(2)).unwrap());
        assert_eq!(None, machine.get(0).unwrap());
        assert_eq!(None, machine.get(3).unwrap());
    }

    #[tokio::test]
    async fn rejected_apply_mints_nothing() {
        let catalog = Arc::new(InMemoryCatalog::new(vec![("Tux", 10)]));
        let mut machine = new_machine(catalog.clone());

        assert!(matches!(
            machine.apply(&entry(1, "Tux", 20)).await,
            Err(ApplyError::InsufficientStock {
                requested: 20,
                available: 10
            })
        ));
        assert!(matches!(
            machine.apply(&entry(1, "Tux", 0)).await,
            Err(ApplyError::InvalidQuantity)
        ));
        assert!(matches!(
            machine.apply(&entry(1, "Whale", 1)).await,
            Err(ApplyError::UnknownItem(_))
        ));

        assert_eq!(0, machine.last_order_number());
        assert_eq!(None, machine.commit_index());
        assert_eq!(Ok(10), catalog.available_quantity("Tux").await);

        // The same slot can still commit once stock allows it.
        assert_eq!(1, machine.apply(&entry(1, "Tux", 10)).await.unwrap().order_number);
    }

    #[tokio::test]
    async fn apply_refuses_committed_entry() {
        let catalog = Arc::new(InMemoryCatalog::new(vec![("Tux", 10)]));
        let mut machine = new_machine(catalog.clone());

        machine.apply(&entry(1, "Tux", 1)).await.unwrap();
        assert!(matches!(
            machine.apply(&entry(1, "Tux", 1)).await,
            Err(ApplyError::AlreadyCommitted(_))
        ));
        assert_eq!(Some(9), catalog.quantity("Tux"));
    }

    #[test]
    fn persist_replicated_is_idempotent_and_contiguous() {
        let mut machine = new_machine(Arc::new(InMemoryCatalog::new(vec![("Tux", 1)])));

        assert!(machine.persist_replicated(record(1, 1)).unwrap());
        assert!(!machine.persist_replicated(record(1, 1)).unwrap());

        assert!(matches!(
            machine.persist_replicated(record(3, 3)),
            Err(ApplyError::OrderGap { expected: 2, found: 3 })
        ));
        assert!(matches!(
            machine.persist_replicated(record(1, 2)),
            Err(ApplyError::RecordConflict { order_number: 1 })
        ));

        assert!(machine.persist_replicated(record(2, 2)).unwrap());
        assert_eq!(2, machine.last_order_number());
        assert_eq!(Some(Index::new(2)), machine.commit_index());
    }

    #[test]
    fn reopen_continues_numbering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.log");
        let catalog = Arc::new(InMemoryCatalog::new(vec![("Tux", 1)]));

        {
            let records = FileLog::open(logger(), &path).unwrap();
            let mut machine = OrderStateMachine::open(logger(), records, catalog.clone()).unwrap();
            machine.persist_replicated(record(1, 1)).unwrap();
            machine.persist_replicated(record(2, 3)).unwrap();
        }

        let records = FileLog::open(logger(), &path).unwrap();
        let machine = OrderStateMachine::open(logger(), records, catalog).unwrap();
        assert_eq!(2, machine.last_order_number());
        assert_eq!(Some(Index::new(3)), machine.commit_index());
        assert_eq!(Some(record(2, 3)), machine.record_for_log_index(Index::new(3)).unwrap());
        assert_eq!(None, machine.record_for_log_index(Index::new(2)).unwrap());
    }
}
