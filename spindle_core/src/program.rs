use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Instruction;

/// Source origin of a localisable string, used by localisation tooling.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct LineInfo {
    pub node_name: String,
    pub line_number: u32,
}

/// A single compiled node: a linear instruction sequence plus its label table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledNode {
    pub name: String,
    pub tags: Vec<String>,
    pub instructions: Vec<Instruction>,
    /// Jump table mapping label names to instruction indices.
    pub labels: HashMap<String, usize>,
    /// For `rawText` nodes, the string-table key holding the node's source
    /// text verbatim.
    pub source_text_string_id: Option<String>,
}

impl fmt::Display for CompiledNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "node {} [{}]", self.name, self.tags.join(" "))?;
        for (index, instruction) in self.instructions.iter().enumerate() {
            match instruction {
                Instruction::Label(_) => writeln!(f, "{}", instruction)?,
                _ => writeln!(f, "    {:3}  {}", index, instruction)?,
            }
        }
        Ok(())
    }
}

/// Raised when merging programs with overlapping node names.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("node `{name}` is already defined")]
pub struct NodeCollision {
    pub name: String,
}

/// Raised when a compiled container cannot be read or written.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("malformed compiled container: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported container version `{found}` (expected `{expected}`)")]
    Version {
        found: String,
        expected: &'static str,
    },
}

/// A compiled program: nodes, the localisable string table, and per-string
/// source origins. Immutable once compiled; execution state lives in the VM.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub nodes: HashMap<String, CompiledNode>,
    pub strings: HashMap<String, String>,
    pub line_info: HashMap<String, LineInfo>,
}

const CONTAINER_VERSION: &str = "V1";

/// Serialised form of a [`Program`]. Only `nodes` and `strings` are carried;
/// `line_info` does not survive a save/load cycle.
#[derive(Serialize, Deserialize)]
struct Container {
    version: String,
    nodes: HashMap<String, CompiledNode>,
    strings: HashMap<String, String>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a string-table entry.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.strings.get(key).map(String::as_str)
    }

    /// Returns the source text of a node, if it was interned (`rawText`
    /// nodes).
    pub fn text_for_node(&self, name: &str) -> Option<&str> {
        let node = self.nodes.get(name)?;
        let key = node.source_text_string_id.as_deref()?;
        self.string(key)
    }

    /// Merges `other` into `self`. Node names must be disjoint; on collision
    /// neither program is modified.
    pub fn merge(&mut self, other: Program) -> Result<(), NodeCollision> {
        if let Some(name) = other.nodes.keys().find(|name| self.nodes.contains_key(*name)) {
            return Err(NodeCollision { name: name.clone() });
        }

        self.nodes.extend(other.nodes);
        self.strings.extend(other.strings);
        self.line_info.extend(other.line_info);
        Ok(())
    }

    /// Serialises the program into the `V1` container.
    ///
    /// Only `nodes` and `strings` are written: `line_info` is localisation
    /// tooling context and is intentionally dropped, so a save/load round
    /// trip is lossy in that respect.
    pub fn save(&self) -> Result<Vec<u8>, ContainerError> {
        let container = Container {
            version: CONTAINER_VERSION.to_string(),
            nodes: self.nodes.clone(),
            strings: self.strings.clone(),
        };

        Ok(serde_json::to_vec(&container)?)
    }

    /// Reads a program back from a `V1` container produced by [`save`].
    ///
    /// [`save`]: Program::save
    pub fn load(bytes: &[u8]) -> Result<Program, ContainerError> {
        let container: Container = serde_json::from_slice(bytes)?;

        if container.version != CONTAINER_VERSION {
            return Err(ContainerError::Version {
                found: container.version,
                expected: CONTAINER_VERSION,
            });
        }

        Ok(Program {
            nodes: container.nodes,
            strings: container.strings,
            line_info: HashMap::new(),
        })
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.nodes.keys().collect::<Vec<_>>();
        names.sort();

        for name in names {
            write!(f, "{}", self.nodes[name])?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn node(name: &str) -> CompiledNode {
        CompiledNode {
            name: name.to_string(),
            tags: Vec::new(),
            instructions: vec![Instruction::Stop],
            labels: HashMap::new(),
            source_text_string_id: None,
        }
    }

    fn program(names: &[&str]) -> Program {
        let mut program = Program::new();
        for name in names {
            program.nodes.insert(name.to_string(), node(name));
            program
                .strings
                .insert(format!("{}-0", name), format!("text of {}", name));
        }
        program
    }

    #[test]
    fn merge_is_commutative_for_disjoint_programs() {
        let mut ab = program(&["A"]);
        ab.merge(program(&["B"])).unwrap();

        let mut ba = program(&["B"]);
        ba.merge(program(&["A"])).unwrap();

        assert_eq!(ab, ba);
    }

    #[test]
    fn merge_collisions_fail_symmetrically() {
        let mut a = program(&["A", "B"]);
        let err = a.merge(program(&["B", "C"])).unwrap_err();
        assert_eq!(err.name, "B");

        let mut b = program(&["B", "C"]);
        let err = b.merge(program(&["A", "B"])).unwrap_err();
        assert_eq!(err.name, "B");
    }

    #[test]
    fn container_round_trips_nodes_and_strings() {
        let original = program(&["A", "B"]);
        let bytes = original.save().unwrap();
        let loaded = Program::load(&bytes).unwrap();

        assert_eq!(original.nodes, loaded.nodes);
        assert_eq!(original.strings, loaded.strings);
        assert!(loaded.line_info.is_empty());
    }

    #[test]
    fn container_rejects_unknown_versions() {
        let bytes = br#"{"version":"V2","nodes":{},"strings":{}}"#;
        match Program::load(bytes) {
            Err(ContainerError::Version { found, .. }) => assert_eq!(found, "V2"),
            other => panic!("expected version error, got {:?}", other),
        }
    }
}
