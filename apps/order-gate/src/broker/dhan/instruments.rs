//! Static symbol to Dhan security-id mapping.
//!
//! Dhan addresses instruments by numeric security id, not by symbol. The
//! gate trades a fixed NSE equity universe, so the mapping ships as a static
//! table rather than a download of the full scrip master.

/// NSE equity security ids, sorted by symbol.
const NSE_EQ_SECURITY_IDS: &[(&str, &str)] = &[
    ("HDFCBANK", "1333"),
    ("INFY", "1594"),
    ("RELIANCE", "2885"),
    ("SBIN", "3045"),
    ("TCS", "11536"),
];

/// Resolve a symbol to its Dhan security id.
#[must_use]
pub fn resolve_security_id(symbol: &str) -> Option<&'static str> {
    NSE_EQ_SECURITY_IDS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(symbol))
        .map(|(_, id)| *id)
}
