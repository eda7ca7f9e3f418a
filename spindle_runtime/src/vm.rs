use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use thiserror::Error;
use tracing::debug;

use spindle_core::{Instruction, Library, Program, TypeError, Value, VARIADIC};

use crate::VariableStorage;

/// Fatal and recoverable runtime failures. Every fatal error transitions the
/// VM to `Stopped`; a missing variable read is the one recoverable case and
/// never surfaces here (it reads as `Null`).
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("no program is loaded")]
    NoProgramLoaded,
    #[error("no dialogue is currently running")]
    NotRunning,
    #[error("node `{name}` does not exist")]
    NodeNotFound { name: String },
    #[error("node `{name}` is a raw-text node and cannot be run")]
    RawTextNode { name: String },
    #[error("label `{label}` does not exist in node `{node}`")]
    LabelNotFound { label: String, node: String },
    #[error("string `{key}` is missing from the string table")]
    StringNotFound { key: String },
    #[error("function `{name}` is not in the library")]
    FunctionNotFound { name: String },
    #[error("stack underflow (this indicates a compiler bug)")]
    StackUnderflow,
    #[error("instruction {index} is out of range in node `{node}`")]
    InstructionOutOfRange { index: usize, node: String },
    #[error("an option must be selected before continuing")]
    WaitingForOption,
    #[error("no option selection is pending")]
    NotWaitingForOption,
    #[error("option index {index} is out of range (there are {count} options)")]
    InvalidOption { index: usize, count: usize },
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Current execution state of a [`VirtualMachine`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ExecutionState {
    /// Not executing; a new `start` is required to run again.
    Stopped,
    /// Executing instructions.
    Running,
    /// An event was delivered; execution resumes on the next step.
    Suspended,
    /// Blocked until the host calls `select_option`.
    WaitingOnOptionSelection,
}

/// A single entry of an option prompt.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OptionChoice {
    /// String-table key of the option label.
    pub line_id: String,
    /// The option label text.
    pub text: String,
    /// Label or node jumped to when this option is selected.
    pub destination: String,
}

/// An event delivered to the host.
///
/// Hosts presenting an `Options` event may consult the reserved
/// `SHUFFLE_OPTIONS` variable to decide whether to randomise display order.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogueEvent {
    /// A player-visible line. `id` is the localisation key.
    Line { id: String, text: String },
    /// A client command to interpret.
    Command { text: String },
    /// An option prompt. The VM blocks until a selection is made.
    Options(Vec<OptionChoice>),
    /// A node finished. `next_node` names the node execution continues in, or
    /// `None` when the dialogue stopped.
    NodeComplete { next_node: Option<String> },
}

/// The dialogue stack machine.
///
/// Execution is a cooperatively-suspending state machine: [`run_next`]
/// executes one instruction and delivers at most one event. The program and
/// the visit-count table are shared (`Rc`); the library and variable storage
/// are passed in per step so hosts keep ownership of both.
///
/// [`run_next`]: VirtualMachine::run_next
#[derive(Debug)]
pub struct VirtualMachine {
    program: Rc<Program>,
    visited: Rc<RefCell<HashMap<String, u32>>>,

    state: ExecutionState,
    current_node: String,
    program_counter: usize,
    stack: Vec<Value>,
    /// Options accumulated by `AddOption`, drained by `ShowOptions`.
    option_accumulator: Vec<OptionChoice>,
    /// Options shown to the host, pending a `select_option` call.
    pending_options: Vec<OptionChoice>,
}

impl VirtualMachine {
    /// Creates a VM positioned at the start of `start_node`.
    pub fn new(
        program: Rc<Program>,
        visited: Rc<RefCell<HashMap<String, u32>>>,
        start_node: &str,
    ) -> Result<Self, RuntimeError> {
        let node = program
            .nodes
            .get(start_node)
            .ok_or_else(|| RuntimeError::NodeNotFound {
                name: start_node.to_string(),
            })?;

        if node.source_text_string_id.is_some() && node.instructions.is_empty() {
            return Err(RuntimeError::RawTextNode {
                name: start_node.to_string(),
            });
        }

        debug!(node = %start_node, "starting dialogue");

        Ok(VirtualMachine {
            program,
            visited,
            state: ExecutionState::Running,
            current_node: start_node.to_string(),
            program_counter: 0,
            stack: Vec::new(),
            option_accumulator: Vec::new(),
            pending_options: Vec::new(),
        })
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn current_node(&self) -> &str {
        &self.current_node
    }

    /// Cancels execution. The next [`run_next`] returns no event.
    ///
    /// [`run_next`]: VirtualMachine::run_next
    pub fn stop(&mut self) {
        self.state = ExecutionState::Stopped;
    }

    /// Executes one instruction. Returns the event that instruction emitted,
    /// if any. Once `Stopped`, returns `None` forever.
    ///
    /// # Errors
    ///
    /// Calling this while an option selection is pending is an error. All
    /// fatal runtime failures stop the VM.
    pub fn run_next(
        &mut self,
        library: &Library,
        storage: &mut dyn VariableStorage,
    ) -> Result<Option<DialogueEvent>, RuntimeError> {
        match self.state {
            ExecutionState::Stopped => return Ok(None),
            ExecutionState::WaitingOnOptionSelection => {
                return Err(RuntimeError::WaitingForOption)
            }
            ExecutionState::Running | ExecutionState::Suspended => {
                self.state = ExecutionState::Running;
            }
        }

        match self.step(library, storage) {
            Ok(event) => Ok(event),
            Err(error) => {
                self.state = ExecutionState::Stopped;
                Err(error)
            }
        }
    }

    /// Resumes a VM blocked on an option prompt by selecting option `index`.
    pub fn select_option(&mut self, index: usize) -> Result<(), RuntimeError> {
        if self.state != ExecutionState::WaitingOnOptionSelection {
            return Err(RuntimeError::NotWaitingForOption);
        }

        if index >= self.pending_options.len() {
            return Err(RuntimeError::InvalidOption {
                index,
                count: self.pending_options.len(),
            });
        }

        let destination = self.pending_options[index].destination.clone();
        self.pending_options.clear();
        self.stack.push(Value::String(destination));
        self.state = ExecutionState::Suspended;
        Ok(())
    }

    fn step(
        &mut self,
        library: &Library,
        storage: &mut dyn VariableStorage,
    ) -> Result<Option<DialogueEvent>, RuntimeError> {
        use Instruction as I;

        let node = self
            .program
            .nodes
            .get(&self.current_node)
            .ok_or_else(|| RuntimeError::NodeNotFound {
                name: self.current_node.clone(),
            })?;

        let instruction = node
            .instructions
            .get(self.program_counter)
            .ok_or_else(|| RuntimeError::InstructionOutOfRange {
                index: self.program_counter,
                node: self.current_node.clone(),
            })?
            .clone();

        let mut next = self.program_counter + 1;
        let mut event = None;

        match instruction {
            I::Label(_) => {}

            I::JumpTo(target) => {
                next = target;
            }

            I::Jump => {
                let label = self.peek()?.as_string();
                next = *node
                    .labels
                    .get(&label)
                    .ok_or_else(|| RuntimeError::LabelNotFound {
                        label,
                        node: self.current_node.clone(),
                    })?;
            }

            I::RunLine(key) => {
                let text = self.string(&key)?.to_string();
                self.state = ExecutionState::Suspended;
                event = Some(DialogueEvent::Line { id: key, text });
            }

            I::RunCommand(text) => {
                // The `stop` command behaves exactly like a `Stop` opcode.
                if text == "stop" {
                    return self.complete_and_stop().map(Some);
                }

                self.state = ExecutionState::Suspended;
                event = Some(DialogueEvent::Command { text });
            }

            I::AddOption { line, destination } => {
                let text = self.string(&line)?.to_string();
                self.option_accumulator.push(OptionChoice {
                    line_id: line,
                    text,
                    destination,
                });
            }

            I::ShowOptions => {
                let options = std::mem::replace(&mut self.option_accumulator, Vec::new());
                self.pending_options = options.clone();
                self.state = ExecutionState::WaitingOnOptionSelection;
                event = Some(DialogueEvent::Options(options));
            }

            I::PushString(key) => {
                let text = self.string(&key)?.to_string();
                self.stack.push(Value::String(text));
            }

            I::PushNumber(value) => self.stack.push(Value::Number(value)),
            I::PushBool(value) => self.stack.push(Value::Bool(value)),
            I::PushNull => self.stack.push(Value::Null),

            I::PushVariable(name) => {
                // Missing variables are recoverable and read as Null.
                let value = storage.get_value(&name).unwrap_or(Value::Null);
                self.stack.push(value);
            }

            I::StoreVariable(name) => {
                let value = self.peek()?.clone();
                storage.set_value(&name, value);
            }

            I::Pop => {
                self.pop()?;
            }

            I::JumpIfFalse(target) => {
                if !self.peek()?.as_bool() {
                    next = target;
                }
            }

            I::CallFunc(name) => {
                let function =
                    library
                        .get(&name)
                        .ok_or_else(|| RuntimeError::FunctionNotFound {
                            name: name.clone(),
                        })?;

                let count = if function.param_count() == VARIADIC {
                    self.pop()?.as_number() as usize
                } else {
                    function.param_count() as usize
                };

                if self.stack.len() < count {
                    return Err(RuntimeError::StackUnderflow);
                }
                let args = self.stack.split_off(self.stack.len() - count);

                let result = function.invoke(&args)?;
                if function.returns_value() {
                    self.stack.push(result);
                }
            }

            I::RunNode => {
                let destination = self.pop()?.as_string();

                if !self.program.nodes.contains_key(&destination) {
                    return Err(RuntimeError::NodeNotFound { name: destination });
                }

                self.record_visit();
                debug!(from = %self.current_node, to = %destination, "running node");

                event = Some(DialogueEvent::NodeComplete {
                    next_node: Some(destination.clone()),
                });

                self.current_node = destination;
                next = 0;
                self.stack.clear();
                self.option_accumulator.clear();
                self.state = ExecutionState::Suspended;
            }

            I::Stop => {
                return self.complete_and_stop().map(Some);
            }
        }

        self.program_counter = next;
        Ok(event)
    }

    fn complete_and_stop(&mut self) -> Result<DialogueEvent, RuntimeError> {
        self.record_visit();
        self.state = ExecutionState::Stopped;
        Ok(DialogueEvent::NodeComplete { next_node: None })
    }

    fn record_visit(&mut self) {
        let mut visited = self.visited.borrow_mut();
        *visited.entry(self.current_node.clone()).or_insert(0) += 1;
    }

    fn string(&self, key: &str) -> Result<&str, RuntimeError> {
        self.program
            .string(key)
            .ok_or_else(|| RuntimeError::StringNotFound {
                key: key.to_string(),
            })
    }

    fn peek(&self) -> Result<&Value, RuntimeError> {
        self.stack.last().ok_or(RuntimeError::StackUnderflow)
    }

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }
}
