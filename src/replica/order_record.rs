use crate::commitlog::{self, Index};
use crate::grpc::ProtoOrderRecord;
use crate::replica::log_entry::encode_to_vec;
use prost::Message;
use std::convert::TryFrom;
use std::io;

/// OrderRecord is a committed order. `order_number` is minted by the leader at commit time and
/// `log_index` points back at the log entry it was committed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderRecord {
    pub order_number: u64,
    pub item_name: String,
    pub quantity: u64,
    pub log_index: Index,
}

impl From<OrderRecord> for ProtoOrderRecord {
    fn from(record: OrderRecord) -> Self {
        ProtoOrderRecord {
            order_number: record.order_number,
            item_name: record.item_name,
            quantity: record.quantity,
            log_index: record.log_index.as_u64(),
        }
    }
}

impl TryFrom<ProtoOrderRecord> for OrderRecord {
    type Error = &'static str;

    fn try_from(proto: ProtoOrderRecord) -> Result<Self, Self::Error> {
        if proto.order_number == 0 {
            return Err("Order number must be non-zero");
        }
        let log_index = Index::from_u64(proto.log_index).ok_or("Order log index must be non-zero")?;

        Ok(OrderRecord {
            order_number: proto.order_number,
            item_name: proto.item_name,
            quantity: proto.quantity,
            log_index,
        })
    }
}

impl commitlog::Entry for OrderRecord {}

impl From<OrderRecord> for Vec<u8> {
    fn from(record: OrderRecord) -> Self {
        encode_to_vec(&ProtoOrderRecord::from(record))
    }
}

impl TryFrom<Vec<u8>> for OrderRecord {
    type Error = io::Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        let proto =
            ProtoOrderRecord::decode(bytes.as_slice()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        OrderRecord::try_from(proto).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
