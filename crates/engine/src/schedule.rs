//! Frame-counted deferred and repeating tasks.
//!
//! Tasks run with exclusive access to the [`Engine`], so they can create or
//! destroy entities, change rooms or register further tasks.

use thiserror::Error;
use tracing::trace;

use crate::app::Engine;

pub trait ScheduledTask {
    fn run(&mut self, engine: &mut Engine);
}

impl<F> ScheduledTask for F
where
    F: FnMut(&mut Engine),
{
    fn run(&mut self, engine: &mut Engine) {
        self(engine)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("task {0:?} is not registered (finished or already cancelled)")]
    NotRegistered(TaskId),
}

struct Entry {
    id: TaskId,
    task: Option<Box<dyn ScheduledTask>>,
    remaining: i64,
    interval: Option<u32>,
    cancelled: bool,
}

#[derive(Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
    next_id: u64,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(
        &mut self,
        task: Box<dyn ScheduledTask>,
        frames: u32,
        interval: Option<u32>,
    ) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push(Entry {
            id,
            task: Some(task),
            remaining: i64::from(frames),
            interval: interval.map(|frames| frames.max(1)),
            cancelled: false,
        });
        id
    }

    /// Marks the task cancelled; it is purged on the next pass and never fires
    /// again.
    pub fn cancel(&mut self, id: TaskId) -> Result<(), ScheduleError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id && !entry.cancelled)
            .ok_or(ScheduleError::NotRegistered(id))?;
        entry.cancelled = true;
        Ok(())
    }

    pub fn cancel_all(&mut self) {
        for entry in &mut self.entries {
            entry.cancelled = true;
        }
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.id == id && !entry.cancelled)
    }

    /// Live tasks, cancelled ones excluded.
    pub fn pending(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.cancelled).count()
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }
}

impl Engine {
    /// Runs `task` once after `frames` update ticks; `0` means the next tick.
    pub fn delay(&mut self, task: impl ScheduledTask + 'static, frames: u32) -> TaskId {
        self.scheduler.push(Box::new(task), frames, None)
    }

    /// Runs `task` every `frames` ticks until cancelled. With
    /// `fire_immediately` it also runs once right now, before this returns.
    pub fn repeat(
        &mut self,
        task: impl ScheduledTask + 'static,
        frames: u32,
        fire_immediately: bool,
    ) -> TaskId {
        let frames = frames.max(1);
        let id = self.scheduler.push(Box::new(task), frames, Some(frames));
        if fire_immediately {
            self.run_task_now(id);
        }
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> Result<(), ScheduleError> {
        self.scheduler.cancel(id)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    fn run_task_now(&mut self, id: TaskId) {
        let Some(mut task) = self
            .scheduler
            .position(id)
            .and_then(|index| self.scheduler.entries[index].task.take())
        else {
            return;
        };
        task.run(self);
        if let Some(index) = self.scheduler.position(id) {
            self.scheduler.entries[index].task = Some(task);
        }
    }

    /// One scheduler pass. Walks the entries present at the start of the pass
    /// from last to first; only this pass removes entries, so indices below
    /// the cursor stay valid while tasks run.
    pub(crate) fn run_scheduler(&mut self) {
        let pass_len = self.scheduler.entries.len();
        for index in (0..pass_len).rev() {
            let Some(entry) = self.scheduler.entries.get_mut(index) else {
                continue;
            };
            if entry.cancelled {
                self.scheduler.entries.remove(index);
                continue;
            }
            entry.remaining -= 1;
            if entry.remaining > 0 {
                continue;
            }
            let id = entry.id;
            let Some(mut task) = entry.task.take() else {
                continue;
            };

            trace!(task = ?id, "scheduled_task_fired");
            task.run(self);

            let Some(entry) = self.scheduler.entries.get_mut(index) else {
                continue;
            };
            match entry.interval {
                Some(interval) if !entry.cancelled => {
                    entry.task = Some(task);
                    entry.remaining = i64::from(interval);
                }
                _ => {
                    self.scheduler.entries.remove(index);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn engine() -> Engine {
        Engine::headless(64, 64)
    }

    fn record(log: &Log, label: &'static str) -> impl FnMut(&mut Engine) + 'static {
        let log = Rc::clone(log);
        move |_: &mut Engine| log.borrow_mut().push(label)
    }

    #[test]
    fn delay_zero_fires_on_next_tick_once() {
        let mut engine = engine();
        let log: Log = Rc::default();
        engine.delay(record(&log, "a"), 0);
        assert!(log.borrow().is_empty());
        engine.run_scheduler();
        engine.run_scheduler();
        assert_eq!(*log.borrow(), ["a"]);
        assert_eq!(engine.scheduler().pending(), 0);
    }

    #[test]
    fn delay_counts_frames() {
        let mut engine = engine();
        let log: Log = Rc::default();
        engine.delay(record(&log, "a"), 3);
        engine.run_scheduler();
        engine.run_scheduler();
        assert!(log.borrow().is_empty());
        engine.run_scheduler();
        assert_eq!(*log.borrow(), ["a"]);
    }

    #[test]
    fn due_tasks_fire_in_reverse_registration_order() {
        let mut engine = engine();
        let log: Log = Rc::default();
        engine.delay(record(&log, "first"), 1);
        engine.delay(record(&log, "second"), 1);
        engine.run_scheduler();
        assert_eq!(*log.borrow(), ["second", "first"]);
    }

    #[test]
    fn repeat_rearms_and_can_fire_immediately() {
        let mut engine = engine();
        let log: Log = Rc::default();
        let id = engine.repeat(record(&log, "tick"), 2, true);
        assert_eq!(log.borrow().len(), 1);
        for _ in 0..4 {
            engine.run_scheduler();
        }
        assert_eq!(log.borrow().len(), 3);
        engine.cancel(id).expect("cancel");
        engine.run_scheduler();
        engine.run_scheduler();
        assert_eq!(log.borrow().len(), 3);
        assert_eq!(engine.cancel(id), Err(ScheduleError::NotRegistered(id)));
    }

    #[test]
    fn cancel_by_earlier_callback_in_same_pass_prevents_firing() {
        let mut engine = engine();
        let log: Log = Rc::default();
        let victim = engine.delay(record(&log, "victim"), 1);
        let killer_log = Rc::clone(&log);
        engine.delay(
            move |engine: &mut Engine| {
                killer_log.borrow_mut().push("killer");
                engine.cancel(victim).expect("cancel victim");
            },
            1,
        );
        engine.run_scheduler();
        assert_eq!(*log.borrow(), ["killer"]);
        assert_eq!(engine.scheduler().pending(), 0);
    }

    #[test]
    fn tasks_registered_during_a_pass_wait_for_the_next_tick() {
        let mut engine = engine();
        let log: Log = Rc::default();
        let inner_log = Rc::clone(&log);
        engine.delay(
            move |engine: &mut Engine| {
                inner_log.borrow_mut().push("outer");
                engine.delay(record(&inner_log, "inner"), 0);
            },
            1,
        );
        engine.run_scheduler();
        assert_eq!(*log.borrow(), ["outer"]);
        engine.run_scheduler();
        assert_eq!(*log.borrow(), ["outer", "inner"]);
    }

    #[test]
    fn repeating_task_can_cancel_itself() {
        let mut engine = engine();
        let count = Rc::new(RefCell::new(0u32));
        let own_id: Rc<RefCell<Option<TaskId>>> = Rc::default();
        let (task_count, task_id) = (Rc::clone(&count), Rc::clone(&own_id));
        let id = engine.repeat(
            move |engine: &mut Engine| {
                *task_count.borrow_mut() += 1;
                if *task_count.borrow() == 3 {
                    if let Some(id) = *task_id.borrow() {
                        engine.cancel(id).expect("self cancel");
                    }
                }
            },
            1,
            false,
        );
        *own_id.borrow_mut() = Some(id);
        for _ in 0..6 {
            engine.run_scheduler();
        }
        assert_eq!(*count.borrow(), 3);
        assert!(!engine.scheduler().is_pending(id));
    }

    #[test]
    fn cancel_all_stops_everything() {
        let mut engine = engine();
        let log: Log = Rc::default();
        engine.delay(record(&log, "a"), 1);
        engine.repeat(record(&log, "b"), 1, false);
        engine.scheduler.cancel_all();
        engine.run_scheduler();
        assert!(log.borrow().is_empty());
        assert_eq!(engine.scheduler().pending(), 0);
    }
}
