/// API version segment
pub const API_VERSION: &str = "v0";

/// Prefix every versioned route is mounted under
pub const API_PREFIX: &str = "/api/v0";
