/// Flow session orchestrator
pub mod flow_session;

/// Flow instance delegate
pub mod flow_instance;
