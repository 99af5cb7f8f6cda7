#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLogEntry {
    #[prost(uint64, tag = "1")]
    pub index: u64,
    #[prost(uint64, tag = "2")]
    pub term: u64,
    #[prost(int64, tag = "3")]
    pub timestamp_millis: i64,
    #[prost(enumeration = "ProtoEventKind", tag = "4")]
    pub event_kind: i32,
    #[prost(string, tag = "5")]
    pub item_name: ::prost::alloc::string::String,
    #[prost(uint64, tag = "6")]
    pub quantity: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoOrderRecord {
    #[prost(uint64, tag = "1")]
    pub order_number: u64,
    #[prost(string, tag = "2")]
    pub item_name: ::prost::alloc::string::String,
    #[prost(uint64, tag = "3")]
    pub quantity: u64,
    /// Index of the log entry this order was committed from.
    #[prost(uint64, tag = "4")]
    pub log_index: u64,
}
// ------- Shared -------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAck {
    #[prost(uint64, tag = "1")]
    pub node_id: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoServerFault {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCatchUpFailed {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoNotFound {}
// ------- ProposeEntry -------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoProposeEntryReq {
    #[prost(uint64, tag = "1")]
    pub leader_id: u64,
    #[prost(message, optional, tag = "2")]
    pub entry: ::core::option::Option<ProtoLogEntry>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoProposeEntryResult {
    #[prost(oneof = "proto_propose_entry_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_propose_entry_result::Result>,
}
/// Nested message and enum types in `ProtoProposeEntryResult`.
pub mod proto_propose_entry_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoAck),
        #[prost(message, tag = "2")]
        Err(super::ProtoProposeEntryError),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoProposeEntryError {
    #[prost(oneof = "proto_propose_entry_error::Err", tags = "1, 2, 3, 4")]
    pub err: ::core::option::Option<proto_propose_entry_error::Err>,
}
/// Nested message and enum types in `ProtoProposeEntryError`.
pub mod proto_propose_entry_error {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Err {
        #[prost(message, tag = "1")]
        StaleTerm(super::ProtoStaleTerm),
        #[prost(message, tag = "2")]
        LogConflict(super::ProtoLogConflict),
        #[prost(message, tag = "3")]
        CatchUpFailed(super::ProtoCatchUpFailed),
        #[prost(message, tag = "4")]
        ServerFault(super::ProtoServerFault),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoStaleTerm {
    #[prost(uint64, tag = "1")]
    pub current_term: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLogConflict {
    #[prost(uint64, tag = "1")]
    pub index: u64,
}
// ------- CommitRecord -------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCommitRecordReq {
    #[prost(uint64, tag = "1")]
    pub leader_id: u64,
    #[prost(message, optional, tag = "2")]
    pub record: ::core::option::Option<ProtoOrderRecord>,
    /// The leader's entry at record.log_index. Followers persist only over an identical entry.
    #[prost(message, optional, tag = "3")]
    pub entry: ::core::option::Option<ProtoLogEntry>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCommitRecordResult {
    #[prost(oneof = "proto_commit_record_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_commit_record_result::Result>,
}
/// Nested message and enum types in `ProtoCommitRecordResult`.
pub mod proto_commit_record_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoAck),
        #[prost(message, tag = "2")]
        Err(super::ProtoCommitRecordError),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCommitRecordError {
    #[prost(oneof = "proto_commit_record_error::Err", tags = "1, 2")]
    pub err: ::core::option::Option<proto_commit_record_error::Err>,
}
/// Nested message and enum types in `ProtoCommitRecordError`.
pub mod proto_commit_record_error {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Err {
        #[prost(message, tag = "1")]
        CatchUpFailed(super::ProtoCatchUpFailed),
        #[prost(message, tag = "2")]
        ServerFault(super::ProtoServerFault),
    }
}
// ------- TruncateFrom -------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoTruncateFromReq {
    #[prost(uint64, tag = "1")]
    pub leader_id: u64,
    #[prost(uint64, tag = "2")]
    pub index: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoTruncateFromResult {
    #[prost(oneof = "proto_truncate_from_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_truncate_from_result::Result>,
}
/// Nested message and enum types in `ProtoTruncateFromResult`.
pub mod proto_truncate_from_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoAck),
        #[prost(message, tag = "2")]
        Err(super::ProtoTruncateFromError),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoTruncateFromError {
    #[prost(oneof = "proto_truncate_from_error::Err", tags = "1, 2")]
    pub err: ::core::option::Option<proto_truncate_from_error::Err>,
}
/// Nested message and enum types in `ProtoTruncateFromError`.
pub mod proto_truncate_from_error {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Err {
        #[prost(message, tag = "1")]
        CommittedEntry(super::ProtoCommittedEntry),
        #[prost(message, tag = "2")]
        ServerFault(super::ProtoServerFault),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCommittedEntry {
    #[prost(uint64, tag = "1")]
    pub commit_index: u64,
}
// ------- FetchEntry -------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFetchEntryReq {
    #[prost(uint64, tag = "1")]
    pub index: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFetchEntryResult {
    #[prost(oneof = "proto_fetch_entry_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_fetch_entry_result::Result>,
}
/// Nested message and enum types in `ProtoFetchEntryResult`.
pub mod proto_fetch_entry_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Found(super::ProtoFetchedEntry),
        #[prost(message, tag = "2")]
        NotFound(super::ProtoNotFound),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFetchedEntry {
    #[prost(message, optional, tag = "1")]
    pub entry: ::core::option::Option<ProtoLogEntry>,
    /// Present iff the entry has been committed into an order.
    #[prost(message, optional, tag = "2")]
    pub committed_record: ::core::option::Option<ProtoOrderRecord>,
}
// ------- LastIndex -------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLastIndexReq {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLastIndexReply {
    #[prost(uint64, tag = "1")]
    pub last_index: u64,
    #[prost(uint64, tag = "2")]
    pub commit_index: u64,
}
// ------- Election -------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPingReq {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPingReply {
    #[prost(uint64, tag = "1")]
    pub node_id: u64,
    #[prost(uint64, tag = "2")]
    pub term: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoElectLeaderReq {
    #[prost(uint64, tag = "1")]
    pub leader_id: u64,
    #[prost(uint64, tag = "2")]
    pub term: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoInformLeaderReq {
    #[prost(uint64, tag = "1")]
    pub leader_id: u64,
    #[prost(uint64, tag = "2")]
    pub term: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLeaderAck {
    #[prost(uint64, tag = "1")]
    pub node_id: u64,
}
// ------- SubmitOrder -------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoSubmitOrderReq {
    #[prost(string, tag = "1")]
    pub item_name: ::prost::alloc::string::String,
    #[prost(sint64, tag = "2")]
    pub quantity: i64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoSubmitOrderResult {
    #[prost(oneof = "proto_submit_order_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_submit_order_result::Result>,
}
/// Nested message and enum types in `ProtoSubmitOrderResult`.
pub mod proto_submit_order_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoOrderPlaced),
        #[prost(message, tag = "2")]
        Err(super::ProtoSubmitOrderError),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoOrderPlaced {
    #[prost(uint64, tag = "1")]
    pub order_number: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoSubmitOrderError {
    #[prost(
        oneof = "proto_submit_order_error::Err",
        tags = "1, 2, 3, 4, 5, 6, 7, 8"
    )]
    pub err: ::core::option::Option<proto_submit_order_error::Err>,
}
/// Nested message and enum types in `ProtoSubmitOrderError`.
pub mod proto_submit_order_error {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Err {
        #[prost(message, tag = "1")]
        InvalidQuantity(super::ProtoInvalidQuantity),
        #[prost(message, tag = "2")]
        UnknownItem(super::ProtoUnknownItem),
        #[prost(message, tag = "3")]
        InsufficientStock(super::ProtoInsufficientStock),
        #[prost(message, tag = "4")]
        QuorumNotReached(super::ProtoQuorumNotReached),
        #[prost(message, tag = "5")]
        LeaderUnknown(super::ProtoLeaderUnknown),
        #[prost(message, tag = "6")]
        NotLeader(super::ProtoNotLeader),
        #[prost(message, tag = "7")]
        ServerFault(super::ProtoServerFault),
        #[prost(message, tag = "8")]
        CommitUnconfirmed(super::ProtoCommitUnconfirmed),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoInvalidQuantity {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoUnknownItem {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoInsufficientStock {
    #[prost(uint64, tag = "1")]
    pub requested: u64,
    #[prost(uint64, tag = "2")]
    pub available: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoQuorumNotReached {
    #[prost(uint64, tag = "1")]
    pub acks: u64,
    #[prost(uint64, tag = "2")]
    pub required: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLeaderUnknown {}
/// The leader committed the order but fewer than a majority confirmed persisting it.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCommitUnconfirmed {
    #[prost(uint64, tag = "1")]
    pub order_number: u64,
    #[prost(uint64, tag = "2")]
    pub acks: u64,
    #[prost(uint64, tag = "3")]
    pub required: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoNotLeader {
    #[prost(uint64, tag = "1")]
    pub leader_id: u64,
    #[prost(string, tag = "2")]
    pub leader_address: ::prost::alloc::string::String,
}
// ------- GetOrder -------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoGetOrderReq {
    #[prost(uint64, tag = "1")]
    pub order_number: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoGetOrderResult {
    #[prost(oneof = "proto_get_order_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_get_order_result::Result>,
}
/// Nested message and enum types in `ProtoGetOrderResult`.
pub mod proto_get_order_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Found(super::ProtoOrderRecord),
        #[prost(message, tag = "2")]
        NotFound(super::ProtoNotFound),
    }
}
// ------- Persisted + replicated records -------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ProtoEventKind {
    EventKindUnspecified = 0,
    OrderProposed = 1,
}
#[doc = r" Generated client implementations."]
pub mod grpc_order_node_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    pub struct GrpcOrderNodeClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcOrderNodeClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> GrpcOrderNodeClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + HttpBody + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as HttpBody>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = tonic::client::Grpc::with_interceptor(inner, interceptor);
            Self { inner }
        }
        #[doc = " Replication plane: leader -> follower."]
        pub async fn propose_entry(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoProposeEntryReq>,
        ) -> Result<tonic::Response<super::ProtoProposeEntryResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/ordernode.GrpcOrderNode/ProposeEntry");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn commit_record(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoCommitRecordReq>,
        ) -> Result<tonic::Response<super::ProtoCommitRecordResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/ordernode.GrpcOrderNode/CommitRecord");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn truncate_from(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoTruncateFromReq>,
        ) -> Result<tonic::Response<super::ProtoTruncateFromResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/ordernode.GrpcOrderNode/TruncateFrom");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Catch-up plane: any -> any."]
        pub async fn fetch_entry(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoFetchEntryReq>,
        ) -> Result<tonic::Response<super::ProtoFetchEntryResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ordernode.GrpcOrderNode/FetchEntry");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn last_index(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoLastIndexReq>,
        ) -> Result<tonic::Response<super::ProtoLastIndexReply>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ordernode.GrpcOrderNode/LastIndex");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Election plane: coordinator -> node."]
        pub async fn ping(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoPingReq>,
        ) -> Result<tonic::Response<super::ProtoPingReply>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ordernode.GrpcOrderNode/Ping");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn elect_leader(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoElectLeaderReq>,
        ) -> Result<tonic::Response<super::ProtoLeaderAck>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ordernode.GrpcOrderNode/ElectLeader");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn inform_leader(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoInformLeaderReq>,
        ) -> Result<tonic::Response<super::ProtoLeaderAck>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/ordernode.GrpcOrderNode/InformLeader");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Client facing."]
        pub async fn submit_order(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoSubmitOrderReq>,
        ) -> Result<tonic::Response<super::ProtoSubmitOrderResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ordernode.GrpcOrderNode/SubmitOrder");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn get_order(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoGetOrderReq>,
        ) -> Result<tonic::Response<super::ProtoGetOrderResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ordernode.GrpcOrderNode/GetOrder");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for GrpcOrderNodeClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for GrpcOrderNodeClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "GrpcOrderNodeClient {{ ... }}")
        }
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_order_node_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcOrderNodeServer."]
    #[async_trait]
    pub trait GrpcOrderNode: Send + Sync + 'static {
        #[doc = " Replication plane: leader -> follower."]
        async fn propose_entry(
            &self,
            request: tonic::Request<super::ProtoProposeEntryReq>,
        ) -> Result<tonic::Response<super::ProtoProposeEntryResult>, tonic::Status>;
        async fn commit_record(
            &self,
            request: tonic::Request<super::ProtoCommitRecordReq>,
        ) -> Result<tonic::Response<super::ProtoCommitRecordResult>, tonic::Status>;
        async fn truncate_from(
            &self,
            request: tonic::Request<super::ProtoTruncateFromReq>,
        ) -> Result<tonic::Response<super::ProtoTruncateFromResult>, tonic::Status>;
        #[doc = " Catch-up plane: any -> any."]
        async fn fetch_entry(
            &self,
            request: tonic::Request<super::ProtoFetchEntryReq>,
        ) -> Result<tonic::Response<super::ProtoFetchEntryResult>, tonic::Status>;
        async fn last_index(
            &self,
            request: tonic::Request<super::ProtoLastIndexReq>,
        ) -> Result<tonic::Response<super::ProtoLastIndexReply>, tonic::Status>;
        #[doc = " Election plane: coordinator -> node."]
        async fn ping(
            &self,
            request: tonic::Request<super::ProtoPingReq>,
        ) -> Result<tonic::Response<super::ProtoPingReply>, tonic::Status>;
        async fn elect_leader(
            &self,
            request: tonic::Request<super::ProtoElectLeaderReq>,
        ) -> Result<tonic::Response<super::ProtoLeaderAck>, tonic::Status>;
        async fn inform_leader(
            &self,
            request: tonic::Request<super::ProtoInformLeaderReq>,
        ) -> Result<tonic::Response<super::ProtoLeaderAck>, tonic::Status>;
        #[doc = " Client facing."]
        async fn submit_order(
            &self,
            request: tonic::Request<super::ProtoSubmitOrderReq>,
        ) -> Result<tonic::Response<super::ProtoSubmitOrderResult>, tonic::Status>;
        async fn get_order(
            &self,
            request: tonic::Request<super::ProtoGetOrderReq>,
        ) -> Result<tonic::Response<super::ProtoGetOrderResult>, tonic::Status>;
    }
    #[derive(Debug)]
    pub struct GrpcOrderNodeServer<T: GrpcOrderNode> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: GrpcOrderNode> GrpcOrderNodeServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, None);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, Some(interceptor.into()));
            Self { inner }
        }
    }
    impl<T, B> Service<http::Request<B>> for GrpcOrderNodeServer<T>
    where
        T: GrpcOrderNode,
        B: HttpBody + Send + Sync + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/ordernode.GrpcOrderNode/ProposeEntry" => {
                    #[allow(non_camel_case_types)]
                    struct ProposeEntrySvc<T: GrpcOrderNode>(pub Arc<T>);
                    impl<T: GrpcOrderNode> tonic::server::UnaryService<super::ProtoProposeEntryReq>
                        for ProposeEntrySvc<T>
                    {
                        type Response = super::ProtoProposeEntryResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoProposeEntryReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).propose_entry(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = ProposeEntrySvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/ordernode.GrpcOrderNode/CommitRecord" => {
                    #[allow(non_camel_case_types)]
                    struct CommitRecordSvc<T: GrpcOrderNode>(pub Arc<T>);
                    impl<T: GrpcOrderNode> tonic::server::UnaryService<super::ProtoCommitRecordReq>
                        for CommitRecordSvc<T>
                    {
                        type Response = super::ProtoCommitRecordResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoCommitRecordReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).commit_record(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = CommitRecordSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/ordernode.GrpcOrderNode/TruncateFrom" => {
                    #[allow(non_camel_case_types)]
                    struct TruncateFromSvc<T: GrpcOrderNode>(pub Arc<T>);
                    impl<T: GrpcOrderNode> tonic::server::UnaryService<super::ProtoTruncateFromReq>
                        for TruncateFromSvc<T>
                    {
                        type Response = super::ProtoTruncateFromResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoTruncateFromReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).truncate_from(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = TruncateFromSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/ordernode.GrpcOrderNode/FetchEntry" => {
                    #[allow(non_camel_case_types)]
                    struct FetchEntrySvc<T: GrpcOrderNode>(pub Arc<T>);
                    impl<T: GrpcOrderNode> tonic::server::UnaryService<super::ProtoFetchEntryReq> for FetchEntrySvc<T> {
                        type Response = super::ProtoFetchEntryResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoFetchEntryReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).fetch_entry(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = FetchEntrySvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/ordernode.GrpcOrderNode/LastIndex" => {
                    #[allow(non_camel_case_types)]
                    struct LastIndexSvc<T: GrpcOrderNode>(pub Arc<T>);
                    impl<T: GrpcOrderNode> tonic::server::UnaryService<super::ProtoLastIndexReq> for LastIndexSvc<T> {
                        type Response = super::ProtoLastIndexReply;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoLastIndexReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).last_index(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = LastIndexSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/ordernode.GrpcOrderNode/Ping" => {
                    #[allow(non_camel_case_types)]
                    struct PingSvc<T: GrpcOrderNode>(pub Arc<T>);
                    impl<T: GrpcOrderNode> tonic::server::UnaryService<super::ProtoPingReq> for PingSvc<T> {
                        type Response = super::ProtoPingReply;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoPingReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).ping(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = PingSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/ordernode.GrpcOrderNode/ElectLeader" => {
                    #[allow(non_camel_case_types)]
                    struct ElectLeaderSvc<T: GrpcOrderNode>(pub Arc<T>);
                    impl<T: GrpcOrderNode> tonic::server::UnaryService<super::ProtoElectLeaderReq>
                        for ElectLeaderSvc<T>
                    {
                        type Response = super::ProtoLeaderAck;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoElectLeaderReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).elect_leader(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = ElectLeaderSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/ordernode.GrpcOrderNode/InformLeader" => {
                    #[allow(non_camel_case_types)]
                    struct InformLeaderSvc<T: GrpcOrderNode>(pub Arc<T>);
                    impl<T: GrpcOrderNode> tonic::server::UnaryService<super::ProtoInformLeaderReq>
                        for InformLeaderSvc<T>
                    {
                        type Response = super::ProtoLeaderAck;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoInformLeaderReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).inform_leader(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = InformLeaderSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/ordernode.GrpcOrderNode/SubmitOrder" => {
                    #[allow(non_camel_case_types)]
                    struct SubmitOrderSvc<T: GrpcOrderNode>(pub Arc<T>);
                    impl<T: GrpcOrderNode> tonic::server::UnaryService<super::ProtoSubmitOrderReq>
                        for SubmitOrderSvc<T>
                    {
                        type Response = super::ProtoSubmitOrderResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoSubmitOrderReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).submit_order(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = SubmitOrderSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/ordernode.GrpcOrderNode/GetOrder" => {
                    #[allow(non_camel_case_types)]
                    struct GetOrderSvc<T: GrpcOrderNode>(pub Arc<T>);
                    impl<T: GrpcOrderNode> tonic::server::UnaryService<super::ProtoGetOrderReq> for GetOrderSvc<T> {
                        type Response = super::ProtoGetOrderResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoGetOrderReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).get_order(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = GetOrderSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(tonic::body::BoxBody::empty())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: GrpcOrderNode> Clone for GrpcOrderNodeServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: GrpcOrderNode> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcOrderNode> tonic::transport::NamedService for GrpcOrderNodeServer<T> {
        const NAME: &'static str = "ordernode.GrpcOrderNode";
    }
}
