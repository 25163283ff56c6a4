use crate::config::LifeConfig;
use crate::error::{Error, Result};
use crate::field::{FieldStore, FieldView};
use crate::kernel::SpectralKernel;
use crate::patterns::Pattern;
use crate::stepper::{StepOutcome, Stepper};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Control flags shared between the owner, handles and the loop thread.
struct Control {
    running: AtomicBool,
    abort_requested: AtomicBool,
    randomize_requested: AtomicBool,
    /// Held by whoever may write the back buffer: the loop for its whole
    /// lifetime, or an idle-time mutation for its duration.
    writer: AtomicBool,
    interval_ms: AtomicU64,
    pacing: Mutex<()>,
    wake: Condvar,
}

struct Shared {
    field: FieldStore,
    control: Control,
}

struct WriterClaim<'a> {
    shared: &'a Shared,
}

impl Drop for WriterClaim<'_> {
    fn drop(&mut self) {
        self.shared.release();
    }
}

/// Clears the loop's flags on every exit path, including unwinding.
struct LoopExit<'a> {
    shared: &'a Shared,
}

impl Drop for LoopExit<'_> {
    fn drop(&mut self) {
        self.shared.release();
        self.shared.control.running.store(false, Ordering::Release);
    }
}

impl Shared {
    fn try_claim(&self) -> bool {
        self.control
            .writer
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn claim(&self) -> Option<WriterClaim<'_>> {
        self.try_claim().then(|| WriterClaim { shared: self })
    }

    fn release(&self) {
        self.control.writer.store(false, Ordering::Release);
    }

    fn abort_requested(&self) -> bool {
        self.control.abort_requested.load(Ordering::Acquire)
    }

    /// Apply pending randomize requests now if nobody else is writing.
    /// While the loop owns the field the request stays pending for it.
    fn drain_randomize(&self) {
        while self.control.randomize_requested.load(Ordering::Acquire) {
            let Some(_claim) = self.claim() else {
                return;
            };
            if self.control.randomize_requested.swap(false, Ordering::AcqRel) {
                let epoch = self.field.randomize(&mut rand::thread_rng());
                debug!(epoch, "randomized idle field");
            }
        }
    }

    /// Sleep for the configured interval; an abort cuts the sleep short.
    fn pace(&self) {
        let ms = self.control.interval_ms.load(Ordering::Relaxed);
        if ms == 0 {
            return;
        }
        let guard = self
            .control
            .pacing
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let _ = self
            .control
            .wake
            .wait_timeout_while(guard, Duration::from_millis(ms), |_| {
                !self.abort_requested()
            });
    }
}

fn run_loop(shared: Arc<Shared>, mut stepper: Stepper) -> Stepper {
    let _exit = LoopExit { shared: &shared };
    let field = &shared.field;
    let abort = &shared.control.abort_requested;
    let mut rng = rand::thread_rng();

    info!(
        width = field.width(),
        height = field.height(),
        interval_ms = shared.control.interval_ms.load(Ordering::Relaxed),
        "simulation loop started"
    );

    while !shared.abort_requested() {
        shared.pace();
        if shared.abort_requested() {
            break;
        }

        if shared.control.randomize_requested.swap(false, Ordering::AcqRel) {
            let epoch = field.randomize(&mut rng);
            debug!(epoch, "applied deferred randomize");
        }

        if stepper.step(field, abort) == StepOutcome::Aborted {
            break;
        }
    }

    info!(epoch = field.epoch(), "simulation loop stopped");
    stepper
}

/// Read and control access to a running or idle engine.
///
/// Handles can be cloned and sent to other threads. They share the field
/// but never own the transform state, so they cannot tear it down.
#[derive(Clone)]
pub struct EngineHandle {
    shared: Arc<Shared>,
}

impl EngineHandle {
    pub fn width(&self) -> usize {
        self.shared.field.width()
    }

    pub fn height(&self) -> usize {
        self.shared.field.height()
    }

    /// Published cell at `(x, y)`, or `None` outside the grid.
    pub fn at(&self, x: i32, y: i32) -> Option<bool> {
        self.shared.field.at(x, y)
    }

    /// Copy the published generation for a render pass.
    pub fn view(&self) -> FieldView {
        self.shared.field.view()
    }

    pub fn epoch(&self) -> u64 {
        self.shared.field.epoch()
    }

    pub fn is_running(&self) -> bool {
        self.shared.control.running.load(Ordering::Acquire)
    }

    /// Request the loop to stop. Does not wait; see [`Engine::wait`].
    pub fn abort(&self) {
        self.shared
            .control
            .abort_requested
            .store(true, Ordering::Release);
        let _guard = self
            .shared
            .control
            .pacing
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.shared.control.wake.notify_all();
        debug!("abort requested");
    }

    /// Re-seed every cell with random bits: immediately when idle, at the
    /// next generation boundary when the loop is running.
    pub fn randomize(&self) {
        self.shared
            .control
            .randomize_requested
            .store(true, Ordering::Release);
        self.shared.drain_randomize();
    }

    pub fn is_randomize_pending(&self) -> bool {
        self.shared
            .control
            .randomize_requested
            .load(Ordering::Acquire)
    }

    /// Pause between generations in milliseconds, 0 for unthrottled.
    pub fn set_interval(&self, ms: u64) {
        self.shared.control.interval_ms.store(ms, Ordering::Relaxed);
    }

    pub fn interval(&self) -> u64 {
        self.shared.control.interval_ms.load(Ordering::Relaxed)
    }
}

/// Owner of the field, kernel, scratch buffers and simulation thread.
///
/// Dropping the engine aborts the loop and joins it before any buffer is
/// released.
pub struct Engine {
    handle: EngineHandle,
    stepper: Option<Stepper>,
    worker: Option<JoinHandle<Stepper>>,
}

impl Engine {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let field = FieldStore::new(width, height)?;
        let stepper = Stepper::new(width, height)?;
        let shared = Shared {
            field,
            control: Control {
                running: AtomicBool::new(false),
                abort_requested: AtomicBool::new(false),
                randomize_requested: AtomicBool::new(false),
                writer: AtomicBool::new(false),
                interval_ms: AtomicU64::new(0),
                pacing: Mutex::new(()),
                wake: Condvar::new(),
            },
        };
        Ok(Self {
            handle: EngineHandle {
                shared: Arc::new(shared),
            },
            stepper: Some(stepper),
            worker: None,
        })
    }

    /// Build, pace and seed an engine from a validated config.
    pub fn from_config(config: &LifeConfig) -> Result<Self> {
        config.validate()?;
        let mut engine = Self::new(config.width, config.height)?;
        engine.set_interval(config.interval_ms);
        engine.seed(config.pattern)?;
        Ok(engine)
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    pub fn width(&self) -> usize {
        self.handle.width()
    }

    pub fn height(&self) -> usize {
        self.handle.height()
    }

    pub fn at(&self, x: i32, y: i32) -> Option<bool> {
        self.handle.at(x, y)
    }

    pub fn view(&self) -> FieldView {
        self.handle.view()
    }

    pub fn epoch(&self) -> u64 {
        self.handle.epoch()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn randomize(&self) {
        self.handle.randomize();
    }

    pub fn set_interval(&self, ms: u64) {
        self.handle.set_interval(ms);
    }

    pub fn interval(&self) -> u64 {
        self.handle.interval()
    }

    /// Spectral kernel, available while the loop is not holding it.
    pub fn kernel(&self) -> Option<&SpectralKernel> {
        self.stepper.as_ref().map(Stepper::kernel)
    }

    /// Start the continuous loop on its own thread.
    pub fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            if self.is_running() {
                return Err(Error::Busy);
            }
            self.wait()?;
        }
        self.ensure_stepper()?;

        let shared = Arc::clone(&self.handle.shared);
        if !shared.try_claim() {
            return Err(Error::Busy);
        }
        let Some(stepper) = self.stepper.take() else {
            shared.release();
            return Err(Error::Busy);
        };

        shared.control.abort_requested.store(false, Ordering::Release);
        shared.control.running.store(true, Ordering::Release);

        let loop_shared = Arc::clone(&shared);
        let spawned = thread::Builder::new()
            .name("life-sim".into())
            .spawn(move || run_loop(loop_shared, stepper));

        match spawned {
            Ok(worker) => {
                self.worker = Some(worker);
                Ok(())
            }
            Err(err) => {
                shared.control.running.store(false, Ordering::Release);
                shared.release();
                warn!(error = %err, "failed to spawn simulation thread");
                // The stepper went down with the closure.
                if let Err(rebuild) = self.ensure_stepper() {
                    warn!(error = %rebuild, "could not rebuild stepper; retrying on next use");
                }
                Err(Error::Spawn(err))
            }
        }
    }

    /// Rebuild the transform state if a failed spawn or a panicked loop
    /// took it down.
    fn ensure_stepper(&mut self) -> Result<()> {
        if self.stepper.is_some() {
            return Ok(());
        }
        if self.worker.is_some() {
            return Err(Error::Busy);
        }
        let stepper = Stepper::new(self.width(), self.height())?;
        debug!("rebuilt stepper");
        self.stepper = Some(stepper);
        Ok(())
    }

    /// Block until the loop thread has exited, then take back its state and
    /// apply any randomize request that arrived after its last boundary.
    pub fn wait(&mut self) -> Result<()> {
        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(stepper) => self.stepper = Some(stepper),
                Err(_) => {
                    // The stepper is rebuilt on next use.
                    warn!("simulation thread panicked");
                    return Err(Error::LoopPanicked);
                }
            }
        }
        self.handle.shared.drain_randomize();
        Ok(())
    }

    /// Abort and join.
    pub fn stop(&mut self) -> Result<()> {
        self.abort();
        self.wait()
    }

    /// Advance one generation on the calling thread.
    pub fn step(&mut self) -> Result<StepOutcome> {
        self.ensure_stepper()?;
        let shared = &self.handle.shared;
        let stepper = self.stepper.as_mut().ok_or(Error::Busy)?;
        let claim = shared.claim().ok_or(Error::Busy)?;
        let outcome = stepper.step(&shared.field, &AtomicBool::new(false));
        drop(claim);
        shared.drain_randomize();
        Ok(outcome)
    }

    /// Replace the field with `pattern` centred on the grid, as a new generation.
    pub fn seed(&mut self, pattern: Pattern) -> Result<()> {
        self.publish_cells(pattern.offsets())
    }

    /// Publish an all-dead generation.
    pub fn clear(&mut self) -> Result<()> {
        self.publish_cells(&[])
    }

    fn publish_cells(&mut self, offsets: &[(i64, i64)]) -> Result<()> {
        let shared = &self.handle.shared;
        let claim = shared.claim().ok_or(Error::Busy)?;
        let field = &shared.field;
        let cx = (field.width() / 2) as i64;
        let cy = (field.height() / 2) as i64;

        let back = field.back_buffer();
        back.clear();
        for &(dx, dy) in offsets {
            back.set_alive(cx + dx, cy + dy);
        }
        field.publish();
        drop(claim);
        shared.drain_randomize();
        Ok(())
    }

    /// Force one cell alive in the published generation (wraps toroidally).
    pub fn set_bit(&mut self, x: i32, y: i32) -> Result<()> {
        let shared = &self.handle.shared;
        let claim = shared.claim().ok_or(Error::Busy)?;
        shared.field.set_bit(x as i64, y as i64);
        drop(claim);
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(err) = self.stop() {
                warn!(error = %err, "simulation loop did not shut down cleanly");
            }
        }
    }
}
