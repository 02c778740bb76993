use std::cell::Cell;
use std::rc::Rc;

/// Cooperative cancellation flag. Clones share the same flag; the owner of
/// an async operation checks it at every resumption point before applying
/// side effects.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
	cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.cancelled.set(true);
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancelled.get()
	}
}
