//! One-shot deferred tasks that can be cancelled synchronously.

use std::cell::RefCell;
use std::time::Duration;

use log::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use super::cancel::CancellationToken;

/// Handle to a scheduled task. Cancelling guarantees the task body never
/// runs, even if the underlying timer already fired into the event queue.
pub struct ScheduledTask {
	token: CancellationToken,
	timer: Option<i32>,
}

impl ScheduledTask {
	pub fn cancel(self) {
		self.token.cancel();
		if let Some(handle) = self.timer {
			if let Some(window) = web_sys::window() {
				window.clear_timeout_with_handle(handle);
			}
		}
	}

	pub fn is_cancelled(&self) -> bool {
		self.token.is_cancelled()
	}
}

pub trait Scheduler {
	fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> ScheduledTask;
}

fn guarded(token: &CancellationToken, task: Box<dyn FnOnce()>) -> impl FnOnce() + 'static {
	let token = token.clone();
	move || {
		if !token.is_cancelled() {
			// Fired tasks count as consumed.
			token.cancel();
			task();
		}
	}
}

/// `window.setTimeout` backed scheduler.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
	fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> ScheduledTask {
		let token = CancellationToken::new();
		let callback = Closure::once_into_js(guarded(&token, task));
		let timer = web_sys::window().and_then(|window| {
			window
				.set_timeout_with_callback_and_timeout_and_arguments_0(
					callback.unchecked_ref(),
					delay.as_millis().min(i32::MAX as u128) as i32,
				)
				.map_err(|e| warn!("setTimeout failed: {e:?}"))
				.ok()
		});
		ScheduledTask { token, timer }
	}
}

/// Scheduler that only runs tasks when told to. Used to drive deferred work
/// deterministically outside the browser.
#[derive(Default)]
pub struct ManualScheduler {
	queue: RefCell<Vec<(Duration, Box<dyn FnOnce()>)>>,
}

impl ManualScheduler {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn pending(&self) -> usize {
		self.queue.borrow().len()
	}

	/// Runs every queued task in order of delay. Cancelled tasks are
	/// consumed without running.
	pub fn run_all(&self) {
		let mut queue = std::mem::take(&mut *self.queue.borrow_mut());
		queue.sort_by_key(|(delay, _)| *delay);
		for (_, task) in queue {
			task();
		}
	}
}

impl Scheduler for ManualScheduler {
	fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> ScheduledTask {
		let token = CancellationToken::new();
		self.queue
			.borrow_mut()
			.push((delay, Box::new(guarded(&token, task))));
		ScheduledTask { token, timer: None }
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use super::*;

	#[test]
	fn runs_in_delay_order() {
		let scheduler = ManualScheduler::new();
		let order = Rc::new(RefCell::new(Vec::new()));
		for (delay, tag) in [(30, "late"), (10, "early")] {
			let order = order.clone();
			scheduler.schedule(
				Duration::from_millis(delay),
				Box::new(move || order.borrow_mut().push(tag)),
			);
		}
		scheduler.run_all();
		assert_eq!(*order.borrow(), ["early", "late"]);
		assert_eq!(scheduler.pending(), 0);
	}

	#[test]
	fn cancelled_task_never_runs() {
		let scheduler = ManualScheduler::new();
		let ran = Rc::new(Cell::new(false));
		let flag = ran.clone();
		let task = scheduler.schedule(Duration::from_millis(5), Box::new(move || flag.set(true)));
		task.cancel();
		scheduler.run_all();
		assert!(!ran.get());
	}

	#[test]
	fn fired_task_reports_consumed() {
		let scheduler = ManualScheduler::new();
		let task = scheduler.schedule(Duration::ZERO, Box::new(|| {}));
		assert!(!task.is_cancelled());
		scheduler.run_all();
		assert!(task.is_cancelled());
	}
}
