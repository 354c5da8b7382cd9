//! rsharp_core: Core utilities for the rsharp C# front-end.
//!
//! Provides typed index arenas, text spans and line maps,
//! ordered collections, and the cooperative cancellation token used
//! throughout the compiler pipeline.

pub mod arena;
pub mod cancel;
pub mod collections;
pub mod text;

// Re-export commonly used types
pub use arena::{Arena, ArenaIndex};
pub use cancel::{CancellationToken, Cancelled};
pub use text::{LineMap, SourcePosition, TextSpan};
