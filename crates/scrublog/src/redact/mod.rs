//! Secret classification and structural redaction
//!
//! Two pieces: [`SecretRules`] decides whether a field name or a string
//! value looks like a secret, and [`Redactor`] walks arbitrarily nested
//! JSON values replacing everything the rules flag with a fixed marker
//! while preserving the shape of the input.

mod rules;
mod traverse;

pub use rules::SecretRules;
pub use traverse::{Redactor, DEFAULT_MARKER};
