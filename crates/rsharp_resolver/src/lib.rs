//! rsharp_resolver: binds every type reference of a compilation.
//!
//! Resolution runs after the entity builder. A declare pass builds the
//! lexical scopes (namespace bodies with their using directives, type
//! bodies, generic methods) and a resolve pass binds each type node by
//! walking those scopes innermost-first, falling back to the external
//! scopes of referenced assemblies and compilation units.

mod external;
mod resolver;
pub mod scope;

pub use external::{core_library, AssemblyManifest, AssemblyReference, ExternalScope, ManifestError, ReferencedUnit};
pub use resolver::{resolve, Resolver, Symbol};
