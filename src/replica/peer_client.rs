use crate::grpc::grpc_order_node_client::GrpcOrderNodeClient;
use crate::grpc::{
    ProtoCommitRecordReq, ProtoCommitRecordResult, ProtoElectLeaderReq, ProtoFetchEntryReq, ProtoFetchEntryResult,
    ProtoGetOrderReq, ProtoGetOrderResult, ProtoInformLeaderReq, ProtoLastIndexReply, ProtoLastIndexReq,
    ProtoLeaderAck, ProtoPingReply, ProtoPingReq, ProtoProposeEntryReq, ProtoProposeEntryResult,
    ProtoSubmitOrderReq, ProtoSubmitOrderResult, ProtoTruncateFromReq, ProtoTruncateFromResult,
};
use std::future::Future;
use std::net::Ipv4Addr;
use tokio::time::Duration;
use tonic::codegen::http::uri;
use tonic::transport::{Channel, Endpoint};
use tonic::{Response, Status};

/// PeerClient calls another order node. It dials per call, so a node that was down is picked up
/// again as soon as it's back, and every call is bounded by `rpc_timeout` end to end.
#[derive(Clone)]
pub(crate) struct PeerClient {
    endpoint: Endpoint,
    rpc_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    #[error("Failed to connect to peer: {0}")]
    Connect(tonic::transport::Error),
    #[error("Un-modeled failure from peer: {0}")]
    Status(Status),
    #[error("Timed out calling peer")]
    Timeout,
    #[error("Malformed reply from peer: {0}")]
    MalformedReply(&'static str),
}

impl PeerClient {
    pub(crate) fn new(ip: Ipv4Addr, port: u16, rpc_timeout: Duration) -> Result<Self, uri::InvalidUri> {
        let url = format!("http://{}:{}", ip, port);
        let endpoint = Endpoint::from_shared(url)?;

        Ok(PeerClient { endpoint, rpc_timeout })
    }

    pub(crate) async fn propose_entry(&self, req: ProtoProposeEntryReq) -> Result<ProtoProposeEntryResult, PeerError> {
        self.call(move |mut c| async move { c.propose_entry(req).await })
            .await
    }

    pub(crate) async fn commit_record(&self, req: ProtoCommitRecordReq) -> Result<ProtoCommitRecordResult, PeerError> {
        self.call(move |mut c| async move { c.commit_record(req).await })
            .await
    }

    pub(crate) async fn truncate_from(&self, req: ProtoTruncateFromReq) -> Result<ProtoTruncateFromResult, PeerError> {
        self.call(move |mut c| async move { c.truncate_from(req).await })
            .await
    }

    pub(crate) async fn fetch_entry(&self, req: ProtoFetchEntryReq) -> Result<ProtoFetchEntryResult, PeerError> {
        self.call(move |mut c| async move { c.fetch_entry(req).await })
            .await
    }

    pub(crate) async fn last_index(&self) -> Result<ProtoLastIndexReply, PeerError> {
        self.call(move |mut c| async move { c.last_index(ProtoLastIndexReq {}).await })
            .await
    }

    pub(crate) async fn ping(&self) -> Result<ProtoPingReply, PeerError> {
        self.call(move |mut c| async move { c.ping(ProtoPingReq {}).await })
            .await
    }

    pub(crate) async fn elect_leader(&self, req: ProtoElectLeaderReq) -> Result<ProtoLeaderAck, PeerError> {
        self.call(move |mut c| async move { c.elect_leader(req).await })
            .await
    }

    pub(crate) async fn inform_leader(&self, req: ProtoInformLeaderReq) -> Result<ProtoLeaderAck, PeerError> {
        self.call(move |mut c| async move { c.inform_leader(req).await })
            .await
    }

    pub(crate) async fn submit_order(&self, req: ProtoSubmitOrderReq) -> Result<ProtoSubmitOrderResult, PeerError> {
        self.call(move |mut c| async move { c.submit_order(req).await })
            .await
    }

    pub(crate) async fn get_order(&self, req: ProtoGetOrderReq) -> Result<ProtoGetOrderResult, PeerError> {
        self.call(move |mut c| async move { c.get_order(req).await })
            .await
    }

    async fn call<F, Fut, R>(&self, rpc: F) -> Result<R, PeerError>
    where
        F: FnOnce(GrpcOrderNodeClient<Channel>) -> Fut,
        Fut: Future<Output = Result<Response<R>, Status>>,
    {
        let endpoint = self.endpoint.clone();
        let attempt = async move {
            let channel = endpoint.connect().await.map_err(PeerError::Connect)?;
            let reply = rpc(GrpcOrderNodeClient::new(channel))
                .await
                .map_err(PeerError::Status)?;
            Ok(reply.into_inner())
        };

        match tokio::time::timeout(self.rpc_timeout, attempt).await {
            Ok(result) => result,
            Err(_elapsed) => Err(PeerError::Timeout),
        }
    }
}
