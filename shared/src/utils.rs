//! # Shared Utility Functions
//!
//! Address display helpers used by API consumers and log output.

/// Format a wallet address by showing the first `prefix_len` and last
/// `suffix_len` characters.
///
/// If the address is shorter than `prefix_len + suffix_len`, it is returned
/// as-is.
///
/// # Examples
///
/// ```rust
/// use shared::utils::format_address;
///
/// let addr = "TQn9Y2khEsLJW1ChVWFMSMeRDow5oNDMnt";
/// assert_eq!(format_address(addr, 4, 4), "TQn9...DMnt");
/// assert_eq!(format_address("short", 4, 4), "short");
/// ```
pub fn format_address(address: &str, prefix_len: usize, suffix_len: usize) -> String {
    if address.len() <= prefix_len + suffix_len {
        return address.to_string();
    }
    format!(
        "{}...{}",
        &address[..prefix_len],
        &address[address.len() - suffix_len..]
    )
}

/// Truncate an address with the default 4/4 split.
pub fn truncate_address(address: &str) -> String {
    format_address(address, 4, 4)
}
