use std::sync::Arc;

use crate::message::Envelope;

/// One link in the ordered interceptor chain around send/receive (spec
/// §2 component 13, §9 design note: "a function-composition pipeline
/// built at props construction"). Takes an envelope and returns the one
/// to continue processing with; a middleware that wants to short-circuit
/// simply ignores its input's payload and returns a replacement.
pub type Middleware = Arc<dyn Fn(Envelope) -> Envelope + Send + Sync>;

/// Runs an envelope through a chain, skipped entirely when empty so the
/// fast path (no middleware configured) does no allocation beyond the
/// envelope itself, per the same design note.
pub fn run_chain(chain: &[Middleware], envelope: Envelope) -> Envelope {
    if chain.is_empty() {
        return envelope;
    }
    chain.iter().fold(envelope, |e, mw| mw(e))
}
