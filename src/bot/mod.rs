/// Command and link handlers.
pub mod handlers;
/// Transport-agnostic request relay.
pub mod relay;
/// Retrying wrappers for Telegram API operations.
pub mod resilient;
