//! Collection types used throughout the compiler.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// Insertion-ordered map with FxHash hashing. Namespace members, partial
/// parts and using aliases keep declaration order so that diagnostics and
/// graph dumps come out in a stable order.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;
