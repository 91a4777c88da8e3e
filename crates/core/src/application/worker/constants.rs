// Dispatch constants (no magic values in the worker loops)

/// Reply sent when a long-running command cannot be queued
pub const BATCH_QUEUE_FULL_REPLY: &str = "too busy right now, try again later";

/// Reply sent by the fallback handler for unregistered commands
pub const UNKNOWN_COMMAND_REPLY: &str = "unknown command";

/// Reply sent when a privileged command is refused
pub const PERMISSION_DENIED_REPLY: &str = "permission denied";
