use crate::grpc::{ProtoElectLeaderReq, ProtoInformLeaderReq};
use crate::replica::{NodeId, PeerClient, PeerError, Term};
use std::cmp;

/// A member the coordinator may pick as leader.
#[derive(Clone)]
pub(crate) struct Candidate {
    pub(crate) node_id: NodeId,
    pub(crate) client: PeerClient,
}

#[derive(Debug, thiserror::Error)]
pub enum ElectionError {
    #[error("No candidate answered the liveness probe")]
    NoReachableCandidate,
}

/// ElectionCoordinator picks the leader for a static cluster. It doesn't run on any particular
/// node; whoever routes client requests owns one and re-runs `elect()` when the believed leader
/// stops answering.
pub(crate) struct ElectionCoordinator {
    logger: slog::Logger,
    // Sorted by descending node id, which is the priority order.
    candidates: Vec<Candidate>,
    last_term: Term,
    leader: Option<NodeId>,
}

impl ElectionCoordinator {
    pub(crate) fn new(logger: slog::Logger, mut candidates: Vec<Candidate>) -> Self {
        candidates.sort_by(|a, b| b.node_id.cmp(&a.node_id));

        ElectionCoordinator {
            logger,
            candidates,
            last_term: Term::default(),
            leader: None,
        }
    }

    pub(crate) fn current_leader(&self) -> Option<NodeId> {
        self.leader
    }

    /// Forget the current leader. The next caller that needs one will have to `elect()`.
    pub(crate) fn invalidate(&mut self) {
        self.leader = None;
    }

    /// Probes candidates from the highest id down and makes the first live one leader, then tells
    /// everyone else. Deterministic for a fixed reachability pattern: the highest reachable id
    /// always wins.
    pub(crate) async fn elect(&mut self) -> Result<NodeId, ElectionError> {
        self.leader = None;

        let mut winner = None;
        for candidate in self.candidates.iter() {
            match self.try_make_leader(candidate).await {
                Ok(term) => {
                    winner = Some((candidate.node_id, term));
                    break;
                }
                Err(e) => slog::info!(self.logger, "Skipping candidate {:?}: {}", candidate.node_id, e),
            }
        }

        let (leader_id, term) = match winner {
            Some(winner) => winner,
            None => {
                slog::warn!(self.logger, "No reachable candidate. Cluster has no leader.");
                return Err(ElectionError::NoReachableCandidate);
            }
        };

        slog::info!(self.logger, "Elected {:?} on term {:?}", leader_id, term);
        self.last_term = term;
        self.leader = Some(leader_id);
        self.inform_others(leader_id, term).await;

        Ok(leader_id)
    }

    async fn try_make_leader(&self, candidate: &Candidate) -> Result<Term, PeerError> {
        let pong = candidate.client.ping().await?;
        let term = cmp::max(Term::new(pong.term), self.last_term).next();

        candidate
            .client
            .elect_leader(ProtoElectLeaderReq {
                leader_id: candidate.node_id.as_u64(),
                term: term.as_u64(),
            })
            .await?;

        Ok(term)
    }

    // Best effort. A member that misses this learns about the leader from its first proposal.
    async fn inform_others(&self, leader_id: NodeId, term: Term) {
        let mut in_flight = Vec::new();
        for candidate in self.candidates.iter().filter(|c| c.node_id != leader_id) {
            let candidate = candidate.clone();
            let rpc_request = ProtoInformLeaderReq {
                leader_id: leader_id.as_u64(),
                term: term.as_u64(),
            };
            in_flight.push((
                candidate.node_id,
                tokio::task::spawn(async move { candidate.client.inform_leader(rpc_request).await }),
            ));
        }

        for (node_id, handle) in in_flight {
            match handle.await {
                Ok(Ok(_)) => slog::debug!(self.logger, "Informed {:?} of new leader", node_id),
                Ok(Err(e)) => slog::info!(self.logger, "Failed to inform {:?} of new leader: {}", node_id, e),
                Err(join_error) => slog::warn!(self.logger, "InformLeader task failed: {:?}", join_error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Candidate, ElectionCoordinator, ElectionError};
    use crate::replica::{NodeId, PeerClient};
    use std::net::Ipv4Addr;
    use tokio::time::Duration;

    fn unreachable_candidate(id: u64) -> Candidate {
        Candidate {
            node_id: NodeId::new(id),
            // Nothing listens here.
            client: PeerClient::new(Ipv4Addr::LOCALHOST, 1, Duration::from_millis(100)).unwrap(),
        }
    }

    #[test]
    fn candidates_are_probed_highest_first() {
        let coordinator = ElectionCoordinator::new(
            slog::Logger::root(slog::Discard, slog::o!()),
            vec![unreachable_candidate(2), unreachable_candidate(3), unreachable_candidate(1)],
        );

        let order: Vec<_> = coordinator.candidates.iter().map(|c| c.node_id.as_u64()).collect();
        assert_eq!(vec![3, 2, 1], order);
    }

    #[tokio::test]
    async fn no_reachable_candidate_clears_leader() {
        let mut coordinator = ElectionCoordinator::new(
            slog::Logger::root(slog::Discard, slog::o!()),
            vec![unreachable_candidate(1), unreachable_candidate(2)],
        );

        assert!(matches!(
            coordinator.elect().await,
            Err(ElectionError::NoReachableCandidate)
        ));
        assert_eq!(None, coordinator.current_leader());
    }
}
