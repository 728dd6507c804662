//! Call accounting and fault injection around the loopback backend.
//!
//! `RecordingEngine` counts every flowsheet it opens and closes and can be
//! told to fail a given call on a given flowsheet. Sweep and application
//! tests use it to check failure isolation and resource release.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{EngineError, EngineResult};
use crate::loopback::LoopbackEngine;
use crate::session::{
    EngineSession, Flowsheet, ObjectKind, ObjectRef, Property, PropertyValue, ReactionRef,
    ReactionSpec,
};

/// Engine call at which a fault fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    OpenFlowsheet,
    AddCompound,
    SetProperty,
    Solve,
    GetProperty,
    Close,
}

/// A scripted failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub at: FaultPoint,
    /// 1-based ordinal of the `open_flowsheet` call the fault applies to.
    pub flowsheet: usize,
    pub message: String,
}

impl Fault {
    pub fn new(at: FaultPoint, flowsheet: usize, message: impl Into<String>) -> Self {
        Self {
            at,
            flowsheet,
            message: message.into(),
        }
    }
}

/// Counters shared between the engine and its flowsheets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineStats {
    /// Every `open_flowsheet` call, successful or not.
    pub attempts: usize,
    pub opened: usize,
    pub closed: usize,
    pub solves: usize,
    /// One entry per engine call, e.g. `"3:solve"`.
    pub calls: Vec<String>,
}

impl EngineStats {
    /// Flowsheets opened but never closed.
    pub fn leaked(&self) -> usize {
        self.opened.saturating_sub(self.closed)
    }
}

pub struct RecordingEngine {
    inner: LoopbackEngine,
    faults: Vec<Fault>,
    stats: Rc<RefCell<EngineStats>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            inner: LoopbackEngine::new(),
            faults: Vec::new(),
            stats: Rc::new(RefCell::new(EngineStats::default())),
        }
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    pub fn stats(&self) -> EngineStats {
        self.stats.borrow().clone()
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn fire(faults: &[Fault], at: FaultPoint, flowsheet: usize) -> EngineResult<()> {
    match faults
        .iter()
        .find(|f| f.at == at && f.flowsheet == flowsheet)
    {
        Some(fault) => Err(EngineError::Backend {
            message: fault.message.clone(),
        }),
        None => Ok(()),
    }
}

impl EngineSession for RecordingEngine {
    fn backend_name(&self) -> &str {
        "recording"
    }

    fn open_flowsheet(&mut self) -> EngineResult<Box<dyn Flowsheet>> {
        let ordinal = {
            let mut stats = self.stats.borrow_mut();
            stats.attempts += 1;
            stats.attempts
        };
        fire(&self.faults, FaultPoint::OpenFlowsheet, ordinal)?;

        let inner = self.inner.open_flowsheet()?;
        {
            let mut stats = self.stats.borrow_mut();
            stats.opened += 1;
            stats.calls.push(format!("{}:open", ordinal));
        }
        Ok(Box::new(RecordingFlowsheet {
            inner,
            ordinal,
            faults: self
                .faults
                .iter()
                .filter(|f| f.flowsheet == ordinal)
                .cloned()
                .collect(),
            stats: Rc::clone(&self.stats),
        }))
    }
}

struct RecordingFlowsheet {
    inner: Box<dyn Flowsheet>,
    ordinal: usize,
    faults: Vec<Fault>,
    stats: Rc<RefCell<EngineStats>>,
}

impl RecordingFlowsheet {
    fn record(&self, call: &str, at: Option<FaultPoint>) -> EngineResult<()> {
        self.stats
            .borrow_mut()
            .calls
            .push(format!("{}:{}", self.ordinal, call));
        match at {
            Some(at) => fire(&self.faults, at, self.ordinal),
            None => Ok(()),
        }
    }
}

impl Flowsheet for RecordingFlowsheet {
    fn add_compound(&mut self, name: &str) -> EngineResult<()> {
        self.record("add_compound", Some(FaultPoint::AddCompound))?;
        self.inner.add_compound(name)
    }

    fn compounds(&self) -> Vec<String> {
        self.inner.compounds()
    }

    fn set_property_package(&mut self, name: &str) -> EngineResult<()> {
        self.record("set_property_package", None)?;
        self.inner.set_property_package(name)
    }

    fn add_object(&mut self, kind: ObjectKind, tag: &str) -> EngineResult<ObjectRef> {
        self.record("add_object", None)?;
        self.inner.add_object(kind, tag)
    }

    fn set_property(
        &mut self,
        object: &ObjectRef,
        property: Property,
        value: PropertyValue,
    ) -> EngineResult<()> {
        self.record("set_property", Some(FaultPoint::SetProperty))?;
        self.inner.set_property(object, property, value)
    }

    fn get_property(&self, object: &ObjectRef, property: Property) -> EngineResult<PropertyValue> {
        self.record("get_property", Some(FaultPoint::GetProperty))?;
        self.inner.get_property(object, property)
    }

    fn connect(
        &mut self,
        from: &ObjectRef,
        to: &ObjectRef,
        from_port: usize,
        to_port: usize,
    ) -> EngineResult<()> {
        self.record("connect", None)?;
        self.inner.connect(from, to, from_port, to_port)
    }

    fn add_reaction(&mut self, spec: &ReactionSpec) -> EngineResult<ReactionRef> {
        self.record("add_reaction", None)?;
        self.inner.add_reaction(spec)
    }

    fn attach_reaction(&mut self, unit: &ObjectRef, reaction: &ReactionRef) -> EngineResult<()> {
        self.record("attach_reaction", None)?;
        self.inner.attach_reaction(unit, reaction)
    }

    fn solve(&mut self) -> EngineResult<()> {
        self.stats.borrow_mut().solves += 1;
        self.record("solve", Some(FaultPoint::Solve))?;
        self.inner.solve()
    }

    fn close(self: Box<Self>) -> EngineResult<()> {
        // The engine releases the flowsheet even when it reports a close error.
        self.stats.borrow_mut().closed += 1;
        let result = self.record("close", Some(FaultPoint::Close));
        let RecordingFlowsheet { inner, .. } = *self;
        inner.close()?;
        result
    }
}
