//! Protocol error types.
//!
//! Most failure modes in this stack are deliberately not errors: framing
//! malformation resynchronizes locally, protocol-sequencing violations and
//! unauthenticated messages are silently dropped, and window-contract
//! violations are caller bugs checked by assertion. What remains surfaces
//! here.

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SecureError {
    #[error("no send key installed")]
    MissingSendKey,
}
