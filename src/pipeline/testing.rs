//! Recording stages shared by the pipeline tests.

use crate::pipeline::{Stage, StageStatus};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Initialize(String),
    Process(String, u64),
    Reset(String),
    Finalize(String),
}

/// Shared call log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<Call>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Event indices processed by the named stage, in order.
    pub fn processed_by(&self, stage: &str) -> Vec<u64> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Process(name, event) if name == stage => Some(*event),
                _ => None,
            })
            .collect()
    }
}

/// Stage whose behavior per event is scripted up front.
pub struct ScriptedStage {
    name: String,
    recorder: Recorder,
    fail_initialize: bool,
    fail_finalize: bool,
    fail_on: HashSet<u64>,
    skip_on: HashSet<u64>,
    panic_on: HashSet<u64>,
}

impl ScriptedStage {
    pub fn new(name: &str, recorder: &Recorder) -> Self {
        Self {
            name: name.to_string(),
            recorder: recorder.clone(),
            fail_initialize: false,
            fail_finalize: false,
            fail_on: HashSet::new(),
            skip_on: HashSet::new(),
            panic_on: HashSet::new(),
        }
    }

    pub fn fail_initialize(mut self) -> Self {
        self.fail_initialize = true;
        self
    }

    pub fn fail_finalize(mut self) -> Self {
        self.fail_finalize = true;
        self
    }

    pub fn fail_on(mut self, event: u64) -> Self {
        self.fail_on.insert(event);
        self
    }

    pub fn skip_on(mut self, event: u64) -> Self {
        self.skip_on.insert(event);
        self
    }

    pub fn panic_on(mut self, event: u64) -> Self {
        self.panic_on.insert(event);
        self
    }
}

impl Stage for ScriptedStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self) -> anyhow::Result<()> {
        self.recorder.record(Call::Initialize(self.name.clone()));
        if self.fail_initialize {
            anyhow::bail!("{} cannot start", self.name);
        }
        Ok(())
    }

    fn process(&mut self, event: u64) -> anyhow::Result<StageStatus> {
        self.recorder.record(Call::Process(self.name.clone(), event));
        if self.panic_on.contains(&event) {
            panic!("{} blew up on event {}", self.name, event);
        }
        if self.fail_on.contains(&event) {
            anyhow::bail!("{} rejected event {}", self.name, event);
        }
        if self.skip_on.contains(&event) {
            return Ok(StageStatus::SkipEvent);
        }
        Ok(StageStatus::Continue)
    }

    fn reset(&mut self) {
        self.recorder.record(Call::Reset(self.name.clone()));
    }

    fn finalize(&mut self) -> anyhow::Result<()> {
        self.recorder.record(Call::Finalize(self.name.clone()));
        if self.fail_finalize {
            anyhow::bail!("{} could not flush", self.name);
        }
        Ok(())
    }
}
