//! rsharp_semantic: Entity graph construction.
//!
//! Builds namespaces, types and members from parsed trees in two phases:
//! a read-only collection walk per tree, then a merge that combines
//! partial types, detects duplicates and checks modifiers. Type
//! references are registered here and resolved by `rsharp_resolver`.

mod builder;
mod checks;
pub mod collect;
mod entity;
mod graph;
pub mod signature;
mod type_ref;

pub use builder::{build, BuildOutput, SemanticBuilder};
pub use checks::{allowed_member_modifiers, allowed_type_modifiers};
pub use entity::{DeclarationRef, Entity, EntityId, EntityKind, FileId, ParameterInfo};
pub use graph::SemanticGraph;
pub use type_ref::{ExternalType, ExternalTypeKind, ResolutionState, TypeRefId, TypeReference, TypeTarget};
