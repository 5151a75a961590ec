//! Matterflow: the practice-management engine behind a conveyancing
//! platform. The assignment workflow decides which fee earner should own a
//! matter given workload limits, diary blocks, specialization, and
//! transaction-value bounds.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
