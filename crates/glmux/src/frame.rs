//! Frame-callback driver that flushes pending composites after every callback.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use glmux_gl::PhysicalGl;
use tracing::trace;

use crate::virtualizer::{FlushReport, Virtualizer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameRequestId(u64);

type FrameCallback = Box<dyn FnOnce(f64)>;

#[derive(Default)]
struct FrameQueue {
    next_id: u64,
    /// Callbacks for the next tick.
    queued: VecDeque<(FrameRequestId, FrameCallback)>,
    /// Callbacks of the tick in progress that have not run yet.
    running: VecDeque<(FrameRequestId, FrameCallback)>,
}

/// Runs frame callbacks the way a host's animation-frame loop would, flushing the virtualizer
/// after each one so every callback's drawing reaches its surface.
pub struct FrameDriver<G: PhysicalGl> {
    virtualizer: Virtualizer<G>,
    queue: Rc<RefCell<FrameQueue>>,
}

impl<G: PhysicalGl> Clone for FrameDriver<G> {
    fn clone(&self) -> Self {
        Self {
            virtualizer: self.virtualizer.clone(),
            queue: Rc::clone(&self.queue),
        }
    }
}

impl<G: PhysicalGl> fmt::Debug for FrameDriver<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameDriver")
            .field("pending", &self.pending())
            .finish()
    }
}

impl<G: PhysicalGl> FrameDriver<G> {
    pub fn new(virtualizer: Virtualizer<G>) -> Self {
        Self {
            virtualizer,
            queue: Rc::new(RefCell::new(FrameQueue::default())),
        }
    }

    /// Queues `callback` for the next [`FrameDriver::tick`]. Requests made from inside a
    /// callback run on the following tick.
    pub fn request_animation_frame(&self, callback: impl FnOnce(f64) + 'static) -> FrameRequestId {
        let mut queue = self.queue.borrow_mut();
        queue.next_id += 1;
        let id = FrameRequestId(queue.next_id);
        queue.queued.push_back((id, Box::new(callback)));
        id
    }

    /// Returns whether the request was still waiting to run.
    pub fn cancel_animation_frame(&self, id: FrameRequestId) -> bool {
        let mut queue = self.queue.borrow_mut();
        let before = queue.queued.len() + queue.running.len();
        queue.queued.retain(|(queued, _)| *queued != id);
        queue.running.retain(|(queued, _)| *queued != id);
        before != queue.queued.len() + queue.running.len()
    }

    /// Callbacks waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.queue.borrow().queued.len()
    }

    /// Runs every callback queued before this call, flushing after each.
    pub fn tick(&self, time_ms: f64) -> FlushReport {
        {
            let mut queue = self.queue.borrow_mut();
            let batch = std::mem::take(&mut queue.queued);
            queue.running.extend(batch);
        }
        let mut report = FlushReport::default();
        loop {
            let next = self.queue.borrow_mut().running.pop_front();
            let Some((id, callback)) = next else {
                break;
            };
            trace!(request = ?id, time_ms, "frame callback");
            callback(time_ms);
            report.merge(self.virtualizer.flush());
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glmux_gl::SoftGl;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    #[test]
    fn callbacks_run_once_in_order() {
        let driver = FrameDriver::new(Virtualizer::new(SoftGl::new(4, 4)));
        let log = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let log = Rc::clone(&log);
            driver.request_animation_frame(move |t| log.borrow_mut().push((n, t)));
        }
        assert_eq!(driver.pending(), 3);
        driver.tick(16.0);
        driver.tick(32.0);
        assert_eq!(*log.borrow(), vec![(0, 16.0), (1, 16.0), (2, 16.0)]);
    }

    #[test]
    fn requests_from_a_callback_wait_for_the_next_tick() {
        let driver = FrameDriver::new(Virtualizer::new(SoftGl::new(4, 4)));
        let runs = Rc::new(Cell::new(0));
        let (inner_driver, inner_runs) = (driver.clone(), Rc::clone(&runs));
        driver.request_animation_frame(move |_| {
            inner_runs.set(inner_runs.get() + 1);
            let again = Rc::clone(&inner_runs);
            inner_driver.request_animation_frame(move |_| again.set(again.get() + 10));
        });
        driver.tick(0.0);
        assert_eq!(runs.get(), 1);
        assert_eq!(driver.pending(), 1);
        driver.tick(16.0);
        assert_eq!(runs.get(), 11);
    }

    #[test]
    fn cancelled_requests_do_not_run() {
        let driver = FrameDriver::new(Virtualizer::new(SoftGl::new(4, 4)));
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        let id = driver.request_animation_frame(move |_| flag.set(true));
        assert!(driver.cancel_animation_frame(id));
        assert!(!driver.cancel_animation_frame(id));
        driver.tick(0.0);
        assert!(!ran.get());
    }
}
