//! Tool domain: what an expert may do outside its own reasoning
//!
//! - [`entities`]: tool definitions, the catalog and tool calls
//! - [`record`]: the [`record::ToolInvocationRecord`] audit entry
//!
//! Every expert action goes through the tool gateway, which looks tools up in
//! a [`entities::ToolCatalog`] and produces one record per call.

pub mod entities;
pub mod record;

/// Canonical tool names.
pub mod names {
    pub const SEARCH_CODE: &str = "search_code";
    pub const GET_SYMBOLS: &str = "get_symbols";
    pub const READ_FILE: &str = "read_file";
    pub const FIND_CALLERS: &str = "find_callers";
    pub const FIND_CALLEES: &str = "find_callees";
    pub const RECALL: &str = "recall";
    pub const WEB_SEARCH: &str = "web_search";
    pub const STORE_FINDING: &str = "store_finding";

    /// Prefix for generic remote-procedure tools (`remote:<procedure>`)
    pub const REMOTE_PREFIX: &str = "remote:";

    /// Code lookup tools every expert gets by default
    pub const CODE_LOOKUP: &[&str] =
        &[SEARCH_CODE, GET_SYMBOLS, READ_FILE, FIND_CALLERS, FIND_CALLEES];

    /// Whether `name` addresses a remote procedure
    pub fn is_remote(name: &str) -> bool {
        name.strip_prefix(REMOTE_PREFIX)
            .is_some_and(|procedure| !procedure.trim().is_empty())
    }
}
