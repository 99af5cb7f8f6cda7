use crate::commitlog::{Index, Log};
use crate::grpc::grpc_order_node_server::{GrpcOrderNode, GrpcOrderNodeServer};
use crate::grpc::{
    proto_commit_record_error, proto_commit_record_result, proto_fetch_entry_result, proto_get_order_result,
    proto_propose_entry_error, proto_propose_entry_result, proto_submit_order_error, proto_submit_order_result,
    proto_truncate_from_error, proto_truncate_from_result, ProtoAck, ProtoCatchUpFailed, ProtoCommitRecordError,
    ProtoCommitRecordReq, ProtoCommitRecordResult, ProtoCommitUnconfirmed, ProtoCommittedEntry, ProtoElectLeaderReq,
    ProtoFetchEntryReq, ProtoFetchEntryResult, ProtoFetchedEntry, ProtoGetOrderReq, ProtoGetOrderResult,
    ProtoInformLeaderReq, ProtoInsufficientStock, ProtoInvalidQuantity, ProtoLastIndexReply, ProtoLastIndexReq,
    ProtoLeaderAck, ProtoLeaderUnknown, ProtoLogConflict, ProtoNotFound, ProtoNotLeader, ProtoOrderPlaced,
    ProtoPingReply, ProtoPingReq, ProtoProposeEntryError, ProtoProposeEntryReq, ProtoProposeEntryResult,
    ProtoQuorumNotReached, ProtoServerFault, ProtoStaleTerm, ProtoSubmitOrderError, ProtoSubmitOrderReq,
    ProtoSubmitOrderResult, ProtoTruncateFromError, ProtoTruncateFromReq, ProtoTruncateFromResult, ProtoUnknownItem,
};
use crate::replica::{
    CommitRecordError, CommitRecordInput, LeaderAnnouncement, LeaderAnnouncementError, LogEntry, NodeId,
    OrderRecord, ProposeEntryError, ProposeEntryInput, Replica, SubmitOrderError, SubmitOrderInput,
    SubmitOrderOutput, Term, TruncateFromError, TruncateFromInput,
};
use crate::server::RpcServerShutdownSignal;
use std::convert::TryFrom;
use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// RpcServer is the type that implements the order node gRPC interface.
pub(crate) struct RpcServer<L, T>
where
    L: Log<LogEntry> + Send + Sync + 'static,
    T: Log<OrderRecord> + Send + Sync + 'static,
{
    logger: slog::Logger,
    replica: Arc<Replica<L, T>>,
}

impl<L, T> RpcServer<L, T>
where
    L: Log<LogEntry> + Send + Sync + 'static,
    T: Log<OrderRecord> + Send + Sync + 'static,
{
    pub(crate) fn new(logger: slog::Logger, replica: Arc<Replica<L, T>>) -> Self {
        RpcServer { logger, replica }
    }

    pub(crate) async fn run(self, socket_addr: SocketAddr, shutdown_signal: RpcServerShutdownSignal) {
        let logger = self.logger.clone();
        slog::info!(logger, "Listening on '{:?}'", socket_addr);

        let result = Server::builder()
            .add_service(GrpcOrderNodeServer::new(self))
            .serve_with_shutdown(socket_addr, shutdown_signal)
            .await;

        slog::info!(logger, "Server run() has exited: {:?}", result);
    }

    fn ack(&self) -> ProtoAck {
        ProtoAck {
            node_id: self.replica.my_node_id().as_u64(),
        }
    }

    // ------- ProposeEntry -------

    async fn handle_propose_entry(&self, rpc_request: ProtoProposeEntryReq) -> Result<ProtoProposeEntryResult, Status> {
        let app_input = Self::convert_propose_entry_input(rpc_request)?;
        let app_result = self.replica.server_handle_propose_entry(app_input).await;
        Ok(self.convert_propose_entry_result(app_result))
    }

    fn convert_propose_entry_input(rpc_request: ProtoProposeEntryReq) -> Result<ProposeEntryInput, Status> {
        let proto_entry = rpc_request
            .entry
            .ok_or_else(|| Status::invalid_argument("ProposeEntry is missing its entry"))?;
        let entry = LogEntry::try_from(proto_entry).map_err(Status::invalid_argument)?;

        Ok(ProposeEntryInput {
            leader_id: NodeId::new(rpc_request.leader_id),
            entry,
        })
    }

    fn convert_propose_entry_result(&self, app_result: Result<(), ProposeEntryError>) -> ProtoProposeEntryResult {
        let err = match app_result {
            Ok(()) => {
                return ProtoProposeEntryResult {
                    result: Some(proto_propose_entry_result::Result::Ok(self.ack())),
                }
            }
            Err(ProposeEntryError::StaleTerm { current_term }) => {
                proto_propose_entry_error::Err::StaleTerm(ProtoStaleTerm {
                    current_term: current_term.as_u64(),
                })
            }
            Err(ProposeEntryError::LogConflict { index }) => {
                proto_propose_entry_error::Err::LogConflict(ProtoLogConflict { index: index.as_u64() })
            }
            Err(ProposeEntryError::CatchUpFailed(e)) => {
                proto_propose_entry_error::Err::CatchUpFailed(ProtoCatchUpFailed { message: e.to_string() })
            }
            Err(ProposeEntryError::LogFailure(e)) => {
                proto_propose_entry_error::Err::ServerFault(ProtoServerFault { message: e.to_string() })
            }
        };

        ProtoProposeEntryResult {
            result: Some(proto_propose_entry_result::Result::Err(ProtoProposeEntryError {
                err: Some(err),
            })),
        }
    }

    // ------- CommitRecord -------

    async fn handle_commit_record(&self, rpc_request: ProtoCommitRecordReq) -> Result<ProtoCommitRecordResult, Status> {
        let app_input = Self::convert_commit_record_input(rpc_request)?;
        let app_result = self.replica.server_handle_commit_record(app_input).await;
        Ok(self.convert_commit_record_result(app_result))
    }

    fn convert_commit_record_input(rpc_request: ProtoCommitRecordReq) -> Result<CommitRecordInput, Status> {
        let proto_record = rpc_request
            .record
            .ok_or_else(|| Status::invalid_argument("CommitRecord is missing its record"))?;
        let record = OrderRecord::try_from(proto_record).map_err(Status::invalid_argument)?;
        let proto_entry = rpc_request
            .entry
            .ok_or_else(|| Status::invalid_argument("CommitRecord is missing its entry"))?;
        let entry = LogEntry::try_from(proto_entry).map_err(Status::invalid_argument)?;
        if entry.index != record.log_index {
            return Err(Status::invalid_argument("CommitRecord entry and record disagree on log index"));
        }

        Ok(CommitRecordInput {
            leader_id: NodeId::new(rpc_request.leader_id),
            record,
            entry,
        })
    }

    fn convert_commit_record_result(&self, app_result: Result<(), CommitRecordError>) -> ProtoCommitRecordResult {
        let err = match app_result {
            Ok(()) => {
                return ProtoCommitRecordResult {
                    result: Some(proto_commit_record_result::Result::Ok(self.ack())),
                }
            }
            Err(CommitRecordError::CatchUpFailed(e)) => {
                proto_commit_record_error::Err::CatchUpFailed(ProtoCatchUpFailed { message: e.to_string() })
            }
            Err(CommitRecordError::ApplyFailure(e)) => {
                proto_commit_record_error::Err::ServerFault(ProtoServerFault { message: e.to_string() })
            }
        };

        ProtoCommitRecordResult {
            result: Some(proto_commit_record_result::Result::Err(ProtoCommitRecordError {
                err: Some(err),
            })),
        }
    }

    // ------- TruncateFrom -------

    async fn handle_truncate_from(&self, rpc_request: ProtoTruncateFromReq) -> Result<ProtoTruncateFromResult, Status> {
        let index = Self::convert_index(rpc_request.index)?;
        let app_input = TruncateFromInput {
            leader_id: NodeId::new(rpc_request.leader_id),
            index,
        };
        let app_result = self.replica.server_handle_truncate_from(app_input).await;
        Ok(self.convert_truncate_from_result(app_result))
    }

    fn convert_truncate_from_result(&self, app_result: Result<(), TruncateFromError>) -> ProtoTruncateFromResult {
        let err = match app_result {
            Ok(()) => {
                return ProtoTruncateFromResult {
                    result: Some(proto_truncate_from_result::Result::Ok(self.ack())),
                }
            }
            Err(TruncateFromError::CommittedEntry { commit_index }) => {
                proto_truncate_from_error::Err::CommittedEntry(ProtoCommittedEntry {
                    commit_index: commit_index.as_u64(),
                })
            }
            Err(TruncateFromError::LogFailure(e)) => {
                proto_truncate_from_error::Err::ServerFault(ProtoServerFault { message: e.to_string() })
            }
        };

        ProtoTruncateFromResult {
            result: Some(proto_truncate_from_result::Result::Err(ProtoTruncateFromError {
                err: Some(err),
            })),
        }
    }

    fn convert_index(index: u64) -> Result<Index, Status> {
        Index::from_u64(index).ok_or_else(|| Status::invalid_argument("Log index must be non-zero"))
    }

    // ------- FetchEntry / LastIndex -------

    async fn handle_fetch_entry(&self, rpc_request: ProtoFetchEntryReq) -> Result<ProtoFetchEntryResult, Status> {
        let index = Self::convert_index(rpc_request.index)?;

        let fetched = self
            .replica
            .server_handle_fetch_entry(index)
            .await
            .map_err(|e| Status::internal(e.to_string()))?;

        let result = match fetched {
            Some(output) => proto_fetch_entry_result::Result::Found(ProtoFetchedEntry {
                entry: Some(output.entry.into()),
                committed_record: output.committed_record.map(Into::into),
            }),
            None => proto_fetch_entry_result::Result::NotFound(ProtoNotFound {}),
        };

        Ok(ProtoFetchEntryResult { result: Some(result) })
    }

    async fn handle_last_index(&self) -> ProtoLastIndexReply {
        let output = self.replica.server_handle_last_index().await;

        ProtoLastIndexReply {
            last_index: output.last_index.map_or(0, |index| index.as_u64()),
            commit_index: output.commit_index.map_or(0, |index| index.as_u64()),
        }
    }

    // ------- Election -------

    fn convert_announcement(leader_id: u64, term: u64) -> LeaderAnnouncement {
        LeaderAnnouncement {
            leader_id: NodeId::new(leader_id),
            term: Term::new(term),
        }
    }

    fn convert_announcement_result(&self, app_result: Result<(), LeaderAnnouncementError>) -> Result<ProtoLeaderAck, Status> {
        match app_result {
            Ok(()) => Ok(ProtoLeaderAck {
                node_id: self.replica.my_node_id().as_u64(),
            }),
            Err(e) => Err(Status::invalid_argument(e.to_string())),
        }
    }

    async fn handle_elect_leader(&self, rpc_request: ProtoElectLeaderReq) -> Result<ProtoLeaderAck, Status> {
        let app_input = Self::convert_announcement(rpc_request.leader_id, rpc_request.term);
        let app_result = self.replica.server_handle_elect_leader(app_input).await;
        self.convert_announcement_result(app_result)
    }

    async fn handle_inform_leader(&self, rpc_request: ProtoInformLeaderReq) -> Result<ProtoLeaderAck, Status> {
        let app_input = Self::convert_announcement(rpc_request.leader_id, rpc_request.term);
        let app_result = self.replica.server_handle_inform_leader(app_input).await;
        let rpc_reply = self.convert_announcement_result(app_result)?;

        // Catch up with the new leader without holding up the coordinator.
        let replica = self.replica.clone();
        let logger = self.logger.clone();
        tokio::spawn(async move {
            match replica.sync_with_leader().await {
                Ok(outcome) => slog::debug!(logger, "Synced with new leader: {:?}", outcome),
                Err(e) => slog::warn!(logger, "Failed to sync with new leader: {}", e),
            }
        });

        Ok(rpc_reply)
    }

    // ------- Client facing -------

    async fn handle_submit_order(&self, rpc_request: ProtoSubmitOrderReq) -> ProtoSubmitOrderResult {
        let app_input = SubmitOrderInput {
            item_name: rpc_request.item_name,
            quantity: rpc_request.quantity,
        };
        let app_result = self.replica.handle_submit_order(app_input).await;
        Self::convert_submit_order_result(app_result)
    }

    fn convert_submit_order_result(app_result: Result<SubmitOrderOutput, SubmitOrderError>) -> ProtoSubmitOrderResult {
        let err = match app_result {
            Ok(output) => {
                return ProtoSubmitOrderResult {
                    result: Some(proto_submit_order_result::Result::Ok(ProtoOrderPlaced {
                        order_number: output.order_number,
                    })),
                }
            }
            Err(SubmitOrderError::InvalidQuantity) => {
                proto_submit_order_error::Err::InvalidQuantity(ProtoInvalidQuantity {})
            }
            Err(SubmitOrderError::UnknownItem(_)) => proto_submit_order_error::Err::UnknownItem(ProtoUnknownItem {}),
            Err(SubmitOrderError::InsufficientStock { requested, available }) => {
                proto_submit_order_error::Err::InsufficientStock(ProtoInsufficientStock { requested, available })
            }
            Err(SubmitOrderError::QuorumNotReached { acks, required }) => {
                proto_submit_order_error::Err::QuorumNotReached(ProtoQuorumNotReached {
                    acks: acks as u64,
                    required: required as u64,
                })
            }
            Err(SubmitOrderError::LeaderUnknown) => proto_submit_order_error::Err::LeaderUnknown(ProtoLeaderUnknown {}),
            Err(SubmitOrderError::NotLeader(leader)) => proto_submit_order_error::Err::NotLeader(ProtoNotLeader {
                leader_id: leader.node_id.as_u64(),
                leader_address: format!("{}:{}", leader.ip_addr, leader.rpc_port),
            }),
            Err(SubmitOrderError::CommitUnconfirmed {
                order_number,
                acks,
                required,
            }) => proto_submit_order_error::Err::CommitUnconfirmed(ProtoCommitUnconfirmed {
                order_number,
                acks: acks as u64,
                required: required as u64,
            }),
            Err(e @ SubmitOrderError::LocalIoError(_))
            | Err(e @ SubmitOrderError::CatchUpFailed(_))
            | Err(e @ SubmitOrderError::CatalogUnavailable(_)) => {
                proto_submit_order_error::Err::ServerFault(ProtoServerFault { message: e.to_string() })
            }
        };

        ProtoSubmitOrderResult {
            result: Some(proto_submit_order_result::Result::Err(ProtoSubmitOrderError {
                err: Some(err),
            })),
        }
    }

    async fn handle_get_order(&self, rpc_request: ProtoGetOrderReq) -> Result<ProtoGetOrderResult, Status> {
        let record = self
            .replica
            .handle_get_order(rpc_request.order_number)
            .await
            .map_err(|e| Status::internal(e.to_string()))?;

        let result = match record {
            Some(record) => proto_get_order_result::Result::Found(record.into()),
            None => proto_get_order_result::Result::NotFound(ProtoNotFound {}),
        };

        Ok(ProtoGetOrderResult { result: Some(result) })
    }
}

#[async_trait::async_trait]
impl<L, T> GrpcOrderNode for RpcServer<L, T>
where
    L: Log<LogEntry> + Send + Sync + 'static,
    T: Log<OrderRecord> + Send + Sync + 'static,
{
    async fn propose_entry(
        &self,
        rpc_request_wrapped: Request<ProtoProposeEntryReq>,
    ) -> Result<Response<ProtoProposeEntryResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_propose_entry(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn commit_record(
        &self,
        rpc_request_wrapped: Request<ProtoCommitRecordReq>,
    ) -> Result<Response<ProtoCommitRecordResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_commit_record(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn truncate_from(
        &self,
        rpc_request_wrapped: Request<ProtoTruncateFromReq>,
    ) -> Result<Response<ProtoTruncateFromResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_truncate_from(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn fetch_entry(
        &self,
        rpc_request_wrapped: Request<ProtoFetchEntryReq>,
    ) -> Result<Response<ProtoFetchEntryResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_fetch_entry(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn last_index(
        &self,
        _rpc_request_wrapped: Request<ProtoLastIndexReq>,
    ) -> Result<Response<ProtoLastIndexReply>, Status> {
        let rpc_reply = self.handle_last_index().await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn ping(&self, _rpc_request_wrapped: Request<ProtoPingReq>) -> Result<Response<ProtoPingReply>, Status> {
        let output = self.replica.server_handle_ping().await;

        Ok(Response::new(ProtoPingReply {
            node_id: output.node_id.as_u64(),
            term: output.term.as_u64(),
        }))
    }

    async fn elect_leader(
        &self,
        rpc_request_wrapped: Request<ProtoElectLeaderReq>,
    ) -> Result<Response<ProtoLeaderAck>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_elect_leader(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn inform_leader(
        &self,
        rpc_request_wrapped: Request<ProtoInformLeaderReq>,
    ) -> Result<Response<ProtoLeaderAck>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_inform_leader(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn submit_order(
        &self,
        rpc_request_wrapped: Request<ProtoSubmitOrderReq>,
    ) -> Result<Response<ProtoSubmitOrderResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_reply = self.handle_submit_order(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn get_order(
        &self,
        rpc_request_wrapped: Request<ProtoGetOrderReq>,
    ) -> Result<Response<ProtoGetOrderResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_get_order(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }
}
