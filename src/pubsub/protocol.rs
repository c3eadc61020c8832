use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{contracts, files, phases};
use crate::services::summary::ContractSummary;

// ── Server -> Client ──

/// Change notifications fanned out to everyone watching a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContractEvent {
    ContractUpdated {
        contract: contracts::Model,
    },
    PaymentsUpdated {
        contract_id: Uuid,
        payment_id: Uuid,
    },
    PhasesUpdated {
        contract_id: Uuid,
        phases: Vec<phases::Model>,
    },
    SummaryUpdated {
        summary: ContractSummary,
    },
    FileUpdated {
        contract_id: Uuid,
        file: files::Model,
    },
}

impl ContractEvent {
    /// Room the event is published to.
    pub fn contract_id(&self) -> Uuid {
        match self {
            ContractEvent::ContractUpdated { contract } => contract.id,
            ContractEvent::PaymentsUpdated { contract_id, .. }
            | ContractEvent::PhasesUpdated { contract_id, .. }
            | ContractEvent::FileUpdated { contract_id, .. } => *contract_id,
            ContractEvent::SummaryUpdated { summary } => summary.contract_id,
        }
    }
}

/// Direct replies to one subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Summary { summary: Option<ContractSummary> },
    Error { message: String },
}

// ── Client -> Server ──

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for the current summary.
    GetSummary,
}
