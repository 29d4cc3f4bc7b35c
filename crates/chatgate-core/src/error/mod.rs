//! Error types for chatgate
//!
//! Every failure in the core surfaces as a `GatewayError`. The variants follow
//! the request layer's needs: admission denials carry their headers, stream
//! failures carry a provider-side message that is never forwarded verbatim,
//! and transport failures are treated as cancellation.

mod constructors;
mod conversions;
mod types;
mod unified_error;

pub use types::{GatewayError, GatewayResult, UnifiedError};
