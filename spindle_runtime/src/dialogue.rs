use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use hashbrown::HashMap;
use tracing::warn;

use spindle_core::{Library, LineInfo, Program, Value};

use crate::loader::{self, LoadError, SourceFormat};
use crate::storage::{MemoryVariableStorage, VariableStorage};
use crate::vm::{DialogueEvent, ExecutionState, RuntimeError, VirtualMachine};

/// The node `start` runs when no name is given.
pub const DEFAULT_START_NODE: &str = "Start";

type VisitCounts = Rc<RefCell<HashMap<String, u32>>>;
type ProgramHandle = Rc<RefCell<Option<Rc<Program>>>>;

/// The host-facing dialogue session.
///
/// A `Dialogue` owns the function library, the variable storage, the loaded
/// program, and at most one running VM. Hosts pull events in a loop:
///
/// ```no_run
/// # use spindle_runtime::{Dialogue, DialogueEvent, SourceFormat};
/// # fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let mut dialogue = Dialogue::new();
/// dialogue.load_string("title: Start\n---\nHi\n===\n", "demo", SourceFormat::Text)?;
///
/// dialogue.start()?;
/// while let Some(event) = dialogue.next_event()? {
///     match event {
///         DialogueEvent::Line { text, .. } => println!("{}", text),
///         DialogueEvent::Options(options) => {
///             println!("{} choices", options.len());
///             dialogue.select_option(0)?;
///         }
///         DialogueEvent::Command { text } => println!("<<{}>>", text),
///         DialogueEvent::NodeComplete { .. } => {}
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct Dialogue {
    library: Library,
    storage: Box<dyn VariableStorage>,
    visited: VisitCounts,
    program: ProgramHandle,
    vm: Option<VirtualMachine>,
}

impl Dialogue {
    /// Creates a dialogue with in-memory variable storage.
    pub fn new() -> Self {
        Self::with_storage(Box::new(MemoryVariableStorage::new()))
    }

    /// Creates a dialogue backed by host-owned variable storage.
    pub fn with_storage(storage: Box<dyn VariableStorage>) -> Self {
        let visited: VisitCounts = Rc::new(RefCell::new(HashMap::new()));
        let program: ProgramHandle = Rc::new(RefCell::new(None));

        let mut library = Library::standard_library();
        register_visit_functions(&mut library, &visited, &program);

        Dialogue {
            library,
            storage,
            visited,
            program,
            vm: None,
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Host functions must be registered before the scripts calling them are
    /// loaded; the compiler checks names and arity against the library.
    pub fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    pub fn storage(&self) -> &dyn VariableStorage {
        &*self.storage
    }

    pub fn storage_mut(&mut self) -> &mut dyn VariableStorage {
        &mut *self.storage
    }

    /// Loads a source document and merges it into the loaded program.
    pub fn load_string(
        &mut self,
        source: &str,
        name: &str,
        format: SourceFormat,
    ) -> Result<(), LoadError> {
        let program = loader::load_string(source, name, format, &self.library)?;
        self.merge_program(program)
    }

    /// Loads a file, picking the format from its suffix or content.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let program = loader::load_path(path.as_ref(), &self.library)?;
        self.merge_program(program)
    }

    /// Loads a compiled `V1` container produced by [`save_compiled`].
    ///
    /// [`save_compiled`]: Dialogue::save_compiled
    pub fn load_compiled(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        let program = Program::load(bytes)?;
        self.merge_program(program)
    }

    /// Serialises the loaded program. Returns `None` when nothing is loaded.
    pub fn save_compiled(&self) -> Option<Result<Vec<u8>, spindle_core::ContainerError>> {
        self.program.borrow().as_ref().map(|program| program.save())
    }

    fn merge_program(&mut self, new: Program) -> Result<(), LoadError> {
        let mut handle = self.program.borrow_mut();

        let mut base = match handle.take() {
            Some(program) => (*program).clone(),
            None => Program::new(),
        };

        match base.merge(new) {
            Ok(()) => {
                *handle = Some(Rc::new(base));
                Ok(())
            }
            Err(collision) => {
                // Restore the pre-merge program untouched.
                *handle = Some(Rc::new(base));
                Err(collision.into())
            }
        }
    }

    /// Unloads all programs. Optionally clears the visit counters as well.
    pub fn unload_all(&mut self, clear_visited: bool) {
        self.vm = None;
        *self.program.borrow_mut() = None;
        if clear_visited {
            self.visited.borrow_mut().clear();
        }
    }

    pub fn node_exists(&self, name: &str) -> bool {
        self.program
            .borrow()
            .as_ref()
            .map(|program| program.nodes.contains_key(name))
            .unwrap_or(false)
    }

    /// Returns the interned source text of a node (`rawText` nodes).
    pub fn text_for_node(&self, name: &str) -> Option<String> {
        self.program
            .borrow()
            .as_ref()
            .and_then(|program| program.text_for_node(name).map(String::from))
    }

    /// Returns a copy of the localisation line-info table.
    pub fn string_info_table(&self) -> HashMap<String, LineInfo> {
        self.program
            .borrow()
            .as_ref()
            .map(|program| program.line_info.clone())
            .unwrap_or_default()
    }

    /// The number of times `name` has reached completion.
    pub fn visit_count(&self, name: &str) -> u32 {
        self.visited.borrow().get(name).copied().unwrap_or(0)
    }

    /// Begins execution at [`DEFAULT_START_NODE`].
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        self.start_at(DEFAULT_START_NODE)
    }

    /// Begins execution at the named node.
    pub fn start_at(&mut self, node: &str) -> Result<(), RuntimeError> {
        let program = self
            .program
            .borrow()
            .as_ref()
            .cloned()
            .ok_or(RuntimeError::NoProgramLoaded)?;

        self.vm = Some(VirtualMachine::new(
            program,
            Rc::clone(&self.visited),
            node,
        )?);
        Ok(())
    }

    /// Pulls the next event, running instructions until one is produced.
    /// Returns `None` once the dialogue has stopped.
    pub fn next_event(&mut self) -> Result<Option<DialogueEvent>, RuntimeError> {
        let vm = self.vm.as_mut().ok_or(RuntimeError::NotRunning)?;

        loop {
            if vm.state() == ExecutionState::Stopped {
                return Ok(None);
            }

            if let Some(event) = vm.run_next(&self.library, &mut *self.storage)? {
                return Ok(Some(event));
            }
        }
    }

    /// Answers a pending [`DialogueEvent::Options`] prompt.
    pub fn select_option(&mut self, index: usize) -> Result<(), RuntimeError> {
        let vm = self.vm.as_mut().ok_or(RuntimeError::NotRunning)?;
        vm.select_option(index)
    }

    /// Cancels the running dialogue, if any.
    pub fn stop(&mut self) {
        if let Some(vm) = self.vm.as_mut() {
            vm.stop();
        }
    }

    /// The execution state of the current run.
    pub fn state(&self) -> ExecutionState {
        self.vm
            .as_ref()
            .map(VirtualMachine::state)
            .unwrap_or(ExecutionState::Stopped)
    }
}

impl Default for Dialogue {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers `visited` and `visitCount` over the shared visit table.
fn register_visit_functions(library: &mut Library, visited: &VisitCounts, program: &ProgramHandle) {
    let counts = Rc::clone(visited);
    library.register("visited", 1, true, move |args| {
        let name = args[0].as_string();
        let count = counts.borrow().get(&name).copied().unwrap_or(0);
        Ok(Value::Bool(count > 0))
    });

    let counts = Rc::clone(visited);
    let programs = Rc::clone(program);
    library.register("visitCount", 1, true, move |args| {
        let name = args[0].as_string();

        let node_exists = programs
            .borrow()
            .as_ref()
            .map(|program| program.nodes.contains_key(&name))
            .unwrap_or(false);

        if !node_exists {
            warn!(node = %name, "visitCount called with unknown node");
            return Ok(Value::Number(0.0));
        }

        let count = counts.borrow().get(&name).copied().unwrap_or(0);
        Ok(Value::Number(count as f32))
    });
}
