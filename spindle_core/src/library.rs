use std::fmt;

use hashbrown::HashMap;

use crate::{TypeError, Value};

/// Parameter count marking a function as variadic: the caller pushes the
/// argument count on top of the arguments.
pub const VARIADIC: i32 = -1;

pub type FunctionBody = Box<dyn Fn(&[Value]) -> Result<Value, TypeError>>;

/// A host- or library-provided function callable from compiled dialogue.
pub struct Function {
    param_count: i32,
    returns_value: bool,
    body: FunctionBody,
}

impl Function {
    /// Expected argument count, or [`VARIADIC`].
    pub fn param_count(&self) -> i32 {
        self.param_count
    }

    /// Whether an invocation pushes a result onto the stack.
    pub fn returns_value(&self) -> bool {
        self.returns_value
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Value, TypeError> {
        (self.body)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("param_count", &self.param_count)
            .field("returns_value", &self.returns_value)
            .finish()
    }
}

/// Registry mapping function names to implementations. Operator names used by
/// `CallFunc` live here alongside host-registered functions.
#[derive(Debug, Default)]
pub struct Library {
    functions: HashMap<String, Function>,
}

impl Library {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a library preloaded with the operator functions the compiler
    /// emits: arithmetic, comparison, and logic over [`Value`].
    pub fn standard_library() -> Self {
        let mut library = Library::new();

        library.register("Add", 2, true, |args| args[0].add(&args[1]));
        library.register("Minus", 2, true, |args| args[0].sub(&args[1]));
        library.register("Multiply", 2, true, |args| args[0].mul(&args[1]));
        library.register("Divide", 2, true, |args| args[0].div(&args[1]));
        library.register("Modulo", 2, true, |args| args[0].modulo(&args[1]));
        library.register("UnaryMinus", 1, true, |args| args[0].neg());

        library.register("EqualTo", 2, true, |args| {
            Ok(Value::Bool(args[0] == args[1]))
        });
        library.register("NotEqualTo", 2, true, |args| {
            Ok(Value::Bool(args[0] != args[1]))
        });
        library.register("GreaterThan", 2, true, |args| {
            Ok(args[0].greater_than(&args[1]))
        });
        library.register("GreaterThanOrEqualTo", 2, true, |args| {
            Ok(args[0].greater_than_or_equal(&args[1]))
        });
        library.register("LessThan", 2, true, |args| Ok(args[0].less_than(&args[1])));
        library.register("LessThanOrEqualTo", 2, true, |args| {
            Ok(args[0].less_than_or_equal(&args[1]))
        });

        library.register("And", 2, true, |args| Ok(args[0].and(&args[1])));
        library.register("Or", 2, true, |args| Ok(args[0].or(&args[1])));
        library.register("Xor", 2, true, |args| Ok(args[0].xor(&args[1])));
        library.register("Not", 1, true, |args| Ok(args[0].not()));

        library
    }

    /// Registers a function. An existing registration under the same name is
    /// replaced.
    pub fn register<F>(&mut self, name: &str, param_count: i32, returns_value: bool, body: F)
    where
        F: Fn(&[Value]) -> Result<Value, TypeError> + 'static,
    {
        self.functions.insert(
            name.to_string(),
            Function {
                param_count,
                returns_value,
                body: Box::new(body),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_library_covers_all_operator_names() {
        let library = Library::standard_library();

        for name in &[
            "Add",
            "Minus",
            "UnaryMinus",
            "Multiply",
            "Divide",
            "Modulo",
            "EqualTo",
            "NotEqualTo",
            "GreaterThan",
            "GreaterThanOrEqualTo",
            "LessThan",
            "LessThanOrEqualTo",
            "And",
            "Or",
            "Xor",
            "Not",
        ] {
            let function = library
                .get(name)
                .unwrap_or_else(|| panic!("`{}` should be registered", name));
            assert!(function.returns_value());
        }
    }

    #[test]
    fn registered_functions_invoke() {
        let mut library = Library::new();
        library.register("double", 1, true, |args| {
            Ok(Value::Number(args[0].as_number() * 2.0))
        });

        let function = library.get("double").unwrap();
        let result = function.invoke(&[Value::Number(4.0)]).unwrap();
        assert_eq!(result, Value::Number(8.0));
    }

    #[test]
    fn variadic_marker_is_negative_one() {
        let mut library = Library::new();
        library.register("pick", VARIADIC, true, |args| {
            Ok(args.first().cloned().unwrap_or(Value::Null))
        });

        assert_eq!(library.get("pick").unwrap().param_count(), VARIADIC);
    }
}
