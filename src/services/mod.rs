pub mod agent_service;
pub mod karma_service;
