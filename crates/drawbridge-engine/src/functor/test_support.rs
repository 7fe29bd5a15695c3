//! Instrumented collaborators shared by the bridge tests.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::coords::Transform;
use crate::render::GpuState;

use super::{
    AllocError, Functor, FunctorError, FunctorRequest, InvocationContext, LifecycleListener,
    OffscreenSurface, SurfaceAllocator, SurfaceDescriptor, SurfaceId,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    Allocated(SurfaceId, SurfaceDescriptor),
    Released(SurfaceId),
    Referenced,
    Dereferenced,
    Invoked(FunctorRequest),
}

/// Ordered record of everything the collaborators observed.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub(crate) fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

#[derive(Debug)]
pub(crate) struct MockSurface {
    id: SurfaceId,
    descriptor: SurfaceDescriptor,
    log: EventLog,
}

impl OffscreenSurface for MockSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn descriptor(&self) -> &SurfaceDescriptor {
        &self.descriptor
    }
}

impl Drop for MockSurface {
    fn drop(&mut self) {
        self.log.push(Event::Released(self.id));
    }
}

pub(crate) struct MockAllocator {
    log: EventLog,
    fail_next: Mutex<Option<AllocError>>,
    allocations: AtomicU64,
}

impl MockAllocator {
    pub(crate) fn new(log: EventLog) -> Self {
        Self {
            log,
            fail_next: Mutex::new(None),
            allocations: AtomicU64::new(0),
        }
    }

    /// Makes the next allocation fail with `err`.
    pub(crate) fn fail_next(&self, err: AllocError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    pub(crate) fn allocations(&self) -> u64 {
        self.allocations.load(Ordering::SeqCst)
    }
}

impl SurfaceAllocator for MockAllocator {
    fn allocate(&self, desc: &SurfaceDescriptor) -> Result<Box<dyn OffscreenSurface>, AllocError> {
        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }
        let id = SurfaceId::next();
        self.allocations.fetch_add(1, Ordering::SeqCst);
        self.log.push(Event::Allocated(id, *desc));
        Ok(Box::new(MockSurface {
            id,
            descriptor: *desc,
            log: self.log.clone(),
        }))
    }
}

pub(crate) struct RecordingListener {
    log: EventLog,
    refs: AtomicI64,
}

impl RecordingListener {
    pub(crate) fn new(log: EventLog) -> Self {
        Self { log, refs: AtomicI64::new(0) }
    }

    pub(crate) fn outstanding(&self) -> i64 {
        self.refs.load(Ordering::SeqCst)
    }
}

impl LifecycleListener for RecordingListener {
    fn on_functor_referenced(&self) {
        self.refs.fetch_add(1, Ordering::SeqCst);
        self.log.push(Event::Referenced);
    }

    fn on_functor_dereferenced(&self) {
        self.refs.fetch_sub(1, Ordering::SeqCst);
        self.log.push(Event::Dereferenced);
    }
}

#[derive(Debug, Copy, Clone)]
pub(crate) enum Behavior {
    Succeed,
    Fail,
    Panic,
    /// Leaves a recording open and rebinds the target.
    CorruptState,
}

#[derive(Debug, Default)]
struct Seen {
    requests: Vec<FunctorRequest>,
    state: Option<GpuState>,
    transform: Option<Transform>,
}

pub(crate) struct RecordingFunctor {
    log: EventLog,
    behavior: Behavior,
    seen: Mutex<Seen>,
}

impl RecordingFunctor {
    pub(crate) fn new(log: EventLog, behavior: Behavior) -> Self {
        Self { log, behavior, seen: Mutex::new(Seen::default()) }
    }

    pub(crate) fn calls(&self) -> usize {
        self.seen.lock().unwrap().requests.len()
    }

    pub(crate) fn requests(&self) -> Vec<FunctorRequest> {
        self.seen.lock().unwrap().requests.clone()
    }

    /// Native state as handed over on the most recent call.
    pub(crate) fn last_seen_state(&self) -> Option<GpuState> {
        self.seen.lock().unwrap().state
    }

    pub(crate) fn last_transform(&self) -> Option<Transform> {
        self.seen.lock().unwrap().transform
    }
}

impl Functor for RecordingFunctor {
    fn invoke(
        &self,
        request: FunctorRequest,
        ctx: &mut InvocationContext<'_>,
    ) -> Result<(), FunctorError> {
        self.log.push(Event::Invoked(request));
        {
            let mut seen = self.seen.lock().unwrap();
            seen.requests.push(request);
            seen.state = Some(*ctx.state());
            seen.transform = Some(ctx.transform());
        }

        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(FunctorError::Failed("simulated failure".into())),
            Behavior::Panic => panic!("functor exploded"),
            Behavior::CorruptState => {
                let state = ctx.state();
                state.recording = !state.recording;
                state.bound_target = Some(SurfaceId(u64::MAX));
                Ok(())
            }
        }
    }
}
