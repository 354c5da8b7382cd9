//! Scopes outside the sources being compiled: referenced assemblies,
//! referenced compilation units and the built-in core library.
//!
//! All of them answer the same two questions: is there a type with this
//! name and arity in this namespace, and does this namespace exist.

use rsharp_semantic::{EntityKind, ExternalType, ExternalTypeKind, SemanticGraph};
use rsharp_syntax::Modifiers;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub trait ExternalScope: Send + Sync + fmt::Debug {
    /// Name shown in messages and recorded on resolved types.
    fn name(&self) -> &str;

    fn lookup_type(&self, namespace: &str, name: &str, arity: u32) -> Option<ExternalType>;

    fn has_namespace(&self, namespace: &str) -> bool;

    /// Arities under which `name` exists in `namespace`.
    fn arities(&self, namespace: &str, name: &str) -> Vec<u32>;
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read assembly manifest '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid assembly manifest '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The JSON form of an assembly reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyManifest {
    pub name: String,
    #[serde(default)]
    pub types: Vec<ExternalType>,
}

/// A flat type-by-name table.
#[derive(Debug, Clone)]
pub struct AssemblyReference {
    name: String,
    types: FxHashMap<(String, String, u32), ExternalType>,
    namespaces: FxHashSet<String>,
}

impl AssemblyReference {
    pub fn from_manifest(manifest: AssemblyManifest) -> Self {
        let mut reference = Self {
            name: manifest.name,
            types: FxHashMap::default(),
            namespaces: FxHashSet::default(),
        };
        for ty in manifest.types {
            reference.insert(ty);
        }
        reference
    }

    pub fn from_json(path: impl Into<PathBuf>, text: &str) -> Result<Self, ManifestError> {
        let manifest: AssemblyManifest =
            serde_json::from_str(text).map_err(|source| ManifestError::Json { path: path.into(), source })?;
        Ok(Self::from_manifest(manifest))
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &text)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn insert(&mut self, mut ty: ExternalType) {
        ty.unit = self.name.clone();
        let mut prefix = String::new();
        for part in ty.namespace.split('.').filter(|p| !p.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(part);
            self.namespaces.insert(prefix.clone());
        }
        self.types
            .insert((ty.namespace.clone(), ty.name.clone(), ty.arity), ty);
    }
}

impl ExternalScope for AssemblyReference {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup_type(&self, namespace: &str, name: &str, arity: u32) -> Option<ExternalType> {
        self.types
            .get(&(namespace.to_string(), name.to_string(), arity))
            .cloned()
    }

    fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }

    fn arities(&self, namespace: &str, name: &str) -> Vec<u32> {
        let mut arities: Vec<u32> = self
            .types
            .keys()
            .filter(|(ns, n, _)| ns == namespace && n == name)
            .map(|(_, _, arity)| *arity)
            .collect();
        arities.sort_unstable();
        arities
    }
}

// ============================================================================
// Core library
// ============================================================================

use ExternalTypeKind::{Class, Delegate, Interface, Struct};

/// (namespace, name, arity, kind, sealed)
const CORE_TYPES: &[(&str, &str, u32, ExternalTypeKind, bool)] = &[
    ("System", "Object", 0, Class, false),
    ("System", "String", 0, Class, true),
    ("System", "ValueType", 0, Class, false),
    ("System", "Enum", 0, Class, false),
    ("System", "Array", 0, Class, false),
    ("System", "Delegate", 0, Class, false),
    ("System", "MulticastDelegate", 0, Class, false),
    ("System", "Type", 0, Class, false),
    ("System", "Attribute", 0, Class, false),
    ("System", "AttributeUsageAttribute", 0, Class, true),
    ("System", "ObsoleteAttribute", 0, Class, true),
    ("System", "SerializableAttribute", 0, Class, true),
    ("System", "FlagsAttribute", 0, Class, false),
    ("System", "Exception", 0, Class, false),
    ("System", "SystemException", 0, Class, false),
    ("System", "ArgumentException", 0, Class, false),
    ("System", "ArgumentNullException", 0, Class, false),
    ("System", "ArgumentOutOfRangeException", 0, Class, false),
    ("System", "InvalidOperationException", 0, Class, false),
    ("System", "NotSupportedException", 0, Class, false),
    ("System", "NotImplementedException", 0, Class, false),
    ("System", "EventArgs", 0, Class, false),
    ("System", "Console", 0, Class, true),
    ("System", "Math", 0, Class, true),
    ("System", "Boolean", 0, Struct, true),
    ("System", "Byte", 0, Struct, true),
    ("System", "SByte", 0, Struct, true),
    ("System", "Char", 0, Struct, true),
    ("System", "Int16", 0, Struct, true),
    ("System", "UInt16", 0, Struct, true),
    ("System", "Int32", 0, Struct, true),
    ("System", "UInt32", 0, Struct, true),
    ("System", "Int64", 0, Struct, true),
    ("System", "UInt64", 0, Struct, true),
    ("System", "Single", 0, Struct, true),
    ("System", "Double", 0, Struct, true),
    ("System", "Decimal", 0, Struct, true),
    ("System", "IntPtr", 0, Struct, true),
    ("System", "UIntPtr", 0, Struct, true),
    ("System", "Void", 0, Struct, true),
    ("System", "DateTime", 0, Struct, true),
    ("System", "TimeSpan", 0, Struct, true),
    ("System", "Guid", 0, Struct, true),
    ("System", "Nullable", 1, Struct, true),
    ("System", "IDisposable", 0, Interface, false),
    ("System", "ICloneable", 0, Interface, false),
    ("System", "IComparable", 0, Interface, false),
    ("System", "IComparable", 1, Interface, false),
    ("System", "IEquatable", 1, Interface, false),
    ("System", "IAsyncResult", 0, Interface, false),
    ("System", "Action", 0, Delegate, true),
    ("System", "Action", 1, Delegate, true),
    ("System", "Action", 2, Delegate, true),
    ("System", "Func", 1, Delegate, true),
    ("System", "Func", 2, Delegate, true),
    ("System", "Func", 3, Delegate, true),
    ("System", "Predicate", 1, Delegate, true),
    ("System", "EventHandler", 0, Delegate, true),
    ("System", "EventHandler", 1, Delegate, true),
    ("System.Collections", "IEnumerable", 0, Interface, false),
    ("System.Collections", "IEnumerator", 0, Interface, false),
    ("System.Collections", "ICollection", 0, Interface, false),
    ("System.Collections", "IList", 0, Interface, false),
    ("System.Collections", "IDictionary", 0, Interface, false),
    ("System.Collections", "ArrayList", 0, Class, false),
    ("System.Collections", "Hashtable", 0, Class, false),
    ("System.Collections.Generic", "IEnumerable", 1, Interface, false),
    ("System.Collections.Generic", "IEnumerator", 1, Interface, false),
    ("System.Collections.Generic", "ICollection", 1, Interface, false),
    ("System.Collections.Generic", "IList", 1, Interface, false),
    ("System.Collections.Generic", "IReadOnlyList", 1, Interface, false),
    ("System.Collections.Generic", "IDictionary", 2, Interface, false),
    ("System.Collections.Generic", "IComparer", 1, Interface, false),
    ("System.Collections.Generic", "IEqualityComparer", 1, Interface, false),
    ("System.Collections.Generic", "List", 1, Class, false),
    ("System.Collections.Generic", "Dictionary", 2, Class, false),
    ("System.Collections.Generic", "HashSet", 1, Class, false),
    ("System.Collections.Generic", "Queue", 1, Class, false),
    ("System.Collections.Generic", "Stack", 1, Class, false),
    ("System.Collections.Generic", "LinkedList", 1, Class, false),
    ("System.Collections.Generic", "SortedDictionary", 2, Class, false),
    ("System.Collections.Generic", "KeyValuePair", 2, Struct, true),
    ("System.Linq", "Enumerable", 0, Class, true),
    ("System.Linq", "IGrouping", 2, Interface, false),
    ("System.Linq", "IOrderedEnumerable", 1, Interface, false),
    ("System.Linq", "IQueryable", 1, Interface, false),
    ("System.Text", "StringBuilder", 0, Class, true),
    ("System.Threading.Tasks", "Task", 0, Class, false),
    ("System.Threading.Tasks", "Task", 1, Class, false),
    ("System.IO", "Stream", 0, Class, false),
    ("System.IO", "TextReader", 0, Class, false),
    ("System.IO", "TextWriter", 0, Class, false),
    ("System.IO", "File", 0, Class, true),
    ("System.IO", "Path", 0, Class, true),
];

/// The built-in `mscorlib` scope used unless `noStdLib` is set.
pub fn core_library() -> AssemblyReference {
    let types = CORE_TYPES
        .iter()
        .map(|&(namespace, name, arity, kind, sealed)| ExternalType {
            unit: String::new(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            arity,
            kind,
            sealed,
        })
        .collect();
    AssemblyReference::from_manifest(AssemblyManifest {
        name: "mscorlib".to_string(),
        types,
    })
}

// ============================================================================
// Referenced compilation units
// ============================================================================

/// The semantic graph of another compilation, seen from outside: only
/// public and internal top-level and nested-by-namespace types.
#[derive(Debug, Clone)]
pub struct ReferencedUnit {
    name: String,
    graph: SemanticGraph,
}

impl ReferencedUnit {
    pub fn new(name: impl Into<String>, graph: SemanticGraph) -> Self {
        Self {
            name: name.into(),
            graph,
        }
    }

    fn visible(&self, namespace: &str, name: &str, arity: u32) -> Option<rsharp_semantic::EntityId> {
        let ns = self.graph.namespace(namespace)?;
        let id = self.graph.lookup_type(ns, name, arity)?;
        let entity = self.graph.entity(id);
        let hidden = entity.modifiers.intersects(Modifiers::PRIVATE | Modifiers::PROTECTED)
            && !entity.modifiers.contains(Modifiers::INTERNAL);
        (!hidden && !entity.invalid).then_some(id)
    }
}

impl ExternalScope for ReferencedUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup_type(&self, namespace: &str, name: &str, arity: u32) -> Option<ExternalType> {
        let id = self.visible(namespace, name, arity)?;
        let entity = self.graph.entity(id);
        let kind = match entity.kind {
            EntityKind::Class => ExternalTypeKind::Class,
            EntityKind::Struct => ExternalTypeKind::Struct,
            EntityKind::Interface => ExternalTypeKind::Interface,
            EntityKind::Enum => ExternalTypeKind::Enum,
            EntityKind::Delegate => ExternalTypeKind::Delegate,
            _ => return None,
        };
        Some(ExternalType {
            unit: self.name.clone(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            arity,
            kind,
            sealed: entity.modifiers.intersects(Modifiers::SEALED | Modifiers::STATIC),
        })
    }

    fn has_namespace(&self, namespace: &str) -> bool {
        !namespace.is_empty() && self.graph.namespace(namespace).is_some()
    }

    fn arities(&self, namespace: &str, name: &str) -> Vec<u32> {
        let Some(ns) = self.graph.namespace(namespace) else {
            return Vec::new();
        };
        self.graph
            .arities(ns, name)
            .into_iter()
            .filter(|&arity| self.visible(namespace, name, arity).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_library_lookup() {
        let core = core_library();
        let list = core.lookup_type("System.Collections.Generic", "List", 1).unwrap();
        assert_eq!(list.unit, "mscorlib");
        assert_eq!(list.kind, ExternalTypeKind::Class);
        assert!(core.lookup_type("System.Collections.Generic", "List", 0).is_none());
        assert_eq!(core.arities("System", "Action"), vec![0, 1, 2]);
        assert!(core.has_namespace("System"));
        assert!(core.has_namespace("System.Collections"));
        assert!(!core.has_namespace("Sys"));
    }

    #[test]
    fn test_manifest_from_json() {
        let text = r#"{
            "name": "Shop.Contracts",
            "types": [
                { "namespace": "Shop.Contracts", "name": "IOrder", "kind": "interface" },
                { "namespace": "Shop.Contracts", "name": "Money", "kind": "struct", "sealed": true }
            ]
        }"#;
        let reference = AssemblyReference::from_json("contracts.json", text).unwrap();
        assert_eq!(reference.name(), "Shop.Contracts");
        assert_eq!(reference.len(), 2);
        assert!(reference.has_namespace("Shop"));
        let money = reference.lookup_type("Shop.Contracts", "Money", 0).unwrap();
        assert!(money.sealed);
        assert_eq!(money.unit, "Shop.Contracts");
    }

    #[test]
    fn test_manifest_errors() {
        let err = AssemblyReference::from_json("bad.json", "{ \"types\": 3 }").unwrap_err();
        assert!(matches!(err, ManifestError::Json { .. }));
        let err = AssemblyReference::load(Path::new("/nonexistent/manifest.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/manifest.json"));
    }

    #[test]
    fn test_referenced_unit_hides_private_types() {
        let mut graph = SemanticGraph::new();
        let ns = graph.namespace_or_insert("Lib");
        for (name, modifiers) in [("Open", Modifiers::PUBLIC), ("Hidden", Modifiers::PRIVATE)] {
            let mut entity = rsharp_semantic::Entity::new(EntityKind::Class, name, Some(ns));
            entity.modifiers = modifiers;
            let id = graph.add_entity(entity);
            graph.entity_mut(ns).types.insert((name.to_string(), 0), id);
        }
        let unit = ReferencedUnit::new("lib", graph);
        assert!(unit.lookup_type("Lib", "Open", 0).is_some());
        assert!(unit.lookup_type("Lib", "Hidden", 0).is_none());
        assert!(unit.has_namespace("Lib"));
        assert_eq!(unit.arities("Lib", "Hidden"), Vec::<u32>::new());
    }
}
