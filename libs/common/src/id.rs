use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = taskhub_common::id::prefixed_ulid("task");
/// assert!(id.starts_with("task_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new().to_string())
}

/// Marker trait for types that represent a prefixed ID.
pub trait PrefixedId {
    const PREFIX: &'static str;

    fn generate() -> String {
        prefixed_ulid(Self::PREFIX)
    }
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const TASK: &str = "task";
    pub const COMMENT: &str = "cmt";
    /// Gateway (socket) sessions.
    pub const GATEWAY: &str = "gw";
}
