use std::fmt;

use serde::{Deserialize, Serialize};

/// A single bytecode instruction.
///
/// Each opcode carries exactly the operand payload it needs, so invalid
/// operand shapes cannot be constructed. Branch targets are instruction
/// indices, resolved at compile time; the symbolic label names survive in
/// [`crate::CompiledNode::labels`] for disassembly and for the stack-driven
/// [`Instruction::Jump`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Marks a jump target. No-op at runtime; kept for disassembly.
    Label(String),
    /// Jump to an instruction index in the current node.
    JumpTo(usize),
    /// Peek a label name from the top of the stack (without popping) and jump
    /// to it.
    Jump,
    /// Deliver the line with the given string-table key to the host.
    RunLine(String),
    /// Deliver a client command to the host.
    RunCommand(String),
    /// Add an entry to the pending option list (see `ShowOptions`).
    AddOption {
        /// String-table key of the option label.
        line: String,
        /// Label or node the option jumps to when selected.
        destination: String,
    },
    /// Present the pending options to the host and block until one is
    /// selected. The selected destination is pushed onto the stack.
    ShowOptions,
    /// Push the string with the given string-table key.
    PushString(String),
    PushNumber(f32),
    PushBool(bool),
    PushNull,
    /// Jump to an instruction index if the top of the stack is falsy. The
    /// tested value stays on the stack either way.
    JumpIfFalse(usize),
    /// Discard the top of the stack.
    Pop,
    /// Call a library function. Fixed-arity functions pop their argument
    /// count; variadic functions find the argument count on top of the stack.
    CallFunc(String),
    /// Push the value of a variable; missing variables push `Null`.
    PushVariable(String),
    /// Store the top of the stack (peeked, not popped) into a variable.
    StoreVariable(String),
    /// Stop execution of the program.
    Stop,
    /// Pop a node name off the stack and run that node.
    RunNode,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction as I;

        match self {
            I::Label(name) => write!(f, "{}:", name),
            I::JumpTo(target) => write!(f, "JumpTo @{}", target),
            I::Jump => write!(f, "Jump"),
            I::RunLine(key) => write!(f, "RunLine \"{}\"", key),
            I::RunCommand(text) => write!(f, "RunCommand \"{}\"", text),
            I::AddOption { line, destination } => {
                write!(f, "AddOption \"{}\" -> {}", line, destination)
            }
            I::ShowOptions => write!(f, "ShowOptions"),
            I::PushString(key) => write!(f, "PushString \"{}\"", key),
            I::PushNumber(value) => write!(f, "PushNumber {}", value),
            I::PushBool(value) => write!(f, "PushBool {}", value),
            I::PushNull => write!(f, "PushNull"),
            I::JumpIfFalse(target) => write!(f, "JumpIfFalse @{}", target),
            I::Pop => write!(f, "Pop"),
            I::CallFunc(name) => write!(f, "CallFunc {}", name),
            I::PushVariable(name) => write!(f, "PushVariable {}", name),
            I::StoreVariable(name) => write!(f, "StoreVariable {}", name),
            I::Stop => write!(f, "Stop"),
            I::RunNode => write!(f, "RunNode"),
        }
    }
}
