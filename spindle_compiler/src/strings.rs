use hashbrown::HashMap;

use spindle_core::LineInfo;

use crate::CompileError;

/// Builds a program's string table.
///
/// The auto-key counter is owned by the builder, so independent programs can
/// be compiled concurrently; keys are `line:<id>`-pinned or generated as
/// `<nodeName>-<n>` with `n` monotonically increasing per program.
#[derive(Debug, Default)]
pub struct StringTableBuilder {
    strings: HashMap<String, String>,
    line_info: HashMap<String, LineInfo>,
    auto_key_count: u32,
}

impl StringTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `text` and returns its key. `line_id` pins the key (from a
    /// `#line:<id>` tag); otherwise a `<nodeName>-<n>` key is generated.
    /// Localisable strings additionally record their source origin.
    pub fn register(
        &mut self,
        text: &str,
        node_name: &str,
        line_id: Option<&str>,
        line_number: u32,
        localisable: bool,
    ) -> Result<String, CompileError> {
        let key = match line_id {
            Some(id) => id.to_string(),
            None => {
                let key = format!("{}-{}", node_name, self.auto_key_count);
                self.auto_key_count += 1;
                key
            }
        };

        if self.strings.contains_key(&key) {
            return Err(CompileError::DuplicateStringKey { key });
        }

        self.strings.insert(key.clone(), text.to_string());

        if localisable {
            self.line_info.insert(
                key.clone(),
                LineInfo {
                    node_name: node_name.to_string(),
                    line_number,
                },
            );
        }

        Ok(key)
    }

    pub fn finish(self) -> (HashMap<String, String>, HashMap<String, LineInfo>) {
        (self.strings, self.line_info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_keys_are_monotonic_per_program() {
        let mut builder = StringTableBuilder::new();

        let a = builder.register("one", "Start", None, 1, true).unwrap();
        let b = builder.register("two", "Start", None, 2, true).unwrap();
        let c = builder.register("three", "Other", None, 1, true).unwrap();

        assert_eq!(a, "Start-0");
        assert_eq!(b, "Start-1");
        assert_eq!(c, "Other-2");
    }

    #[test]
    fn line_ids_pin_keys() {
        let mut builder = StringTableBuilder::new();

        let key = builder
            .register("Hello", "Start", Some("greet"), 1, true)
            .unwrap();
        assert_eq!(key, "greet");

        let (strings, line_info) = builder.finish();
        assert_eq!(strings["greet"], "Hello");
        assert_eq!(line_info["greet"].node_name, "Start");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut builder = StringTableBuilder::new();

        builder
            .register("Hello", "Start", Some("greet"), 1, true)
            .unwrap();
        let err = builder
            .register("Howdy", "Start", Some("greet"), 2, true)
            .unwrap_err();

        assert_eq!(
            err,
            CompileError::DuplicateStringKey {
                key: "greet".to_string()
            }
        );
    }

    #[test]
    fn non_localisable_strings_have_no_line_info() {
        let mut builder = StringTableBuilder::new();

        let key = builder.register("literal", "Start", None, 4, false).unwrap();

        let (strings, line_info) = builder.finish();
        assert!(strings.contains_key(&key));
        assert!(!line_info.contains_key(&key));
    }
}
