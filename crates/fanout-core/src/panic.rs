use std::any::Any;
use std::sync::Arc;

use crate::context::RunContext;

/// Receives every recovered panic, at worker scope (task context) or at run
/// scope (job context). Typical use: forward to an error tracker.
///
/// Without a handler, worker panics are still recovered and logged.
pub type PanicHandler = Arc<dyn Fn(&RunContext, &(dyn Any + Send)) + Send + Sync>;

/// Best-effort human readable message of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
