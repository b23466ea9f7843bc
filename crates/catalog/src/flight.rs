//! Single-flight execution of detached background work.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

/// Receiver side of an in-flight run. Resolves to `Some` once the run finishes.
pub(crate) type Flight<T> = watch::Receiver<Option<T>>;

/// Ensures at most one instance of a piece of work runs at a time.
///
/// The first caller becomes the leader and spawns the work on a detached task, so dropping or
/// cancelling the caller never aborts it. Callers arriving while it runs receive the same
/// [`Flight`]. The slot is cleared before the result is published, so the work itself must
/// commit any shared state it produces before returning.
pub(crate) struct SingleFlight<T> {
	slot: Arc<Mutex<Option<Flight<T>>>>,
}

impl<T> Clone for SingleFlight<T> {
	fn clone(&self) -> Self {
		Self { slot: self.slot.clone() }
	}
}

impl<T> Default for SingleFlight<T> {
	fn default() -> Self {
		Self {
			slot: Arc::new(Mutex::new(None)),
		}
	}
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
	/// Joins the current run, or starts `work` if nothing is in flight.
	///
	/// Returns the flight and whether this call started it.
	pub fn join_or_start<F>(&self, work: impl FnOnce() -> F) -> (Flight<T>, bool)
	where
		F: Future<Output = T> + Send + 'static,
	{
		let mut slot = self.slot.lock();
		if let Some(flight) = slot.as_ref() {
			return (flight.clone(), false);
		}

		let (tx, rx) = watch::channel(None);
		*slot = Some(rx.clone());
		drop(slot);

		let fut = work();
		let this = self.clone();
		tokio::spawn(async move {
			let value = fut.await;
			this.slot.lock().take();
			let _ = tx.send(Some(value));
		});

		(rx, true)
	}

	/// Whether a run is currently in flight.
	pub fn is_running(&self) -> bool {
		self.slot.lock().is_some()
	}
}

/// Waits for a flight to land. `None` if the task died without a result.
pub(crate) async fn land<T: Clone>(mut flight: Flight<T>) -> Option<T> {
	flight.wait_for(Option::is_some).await.ok().and_then(|value| value.clone())
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use tokio::sync::Notify;

	use super::*;

	#[tokio::test]
	async fn concurrent_callers_share_one_run() {
		let flight = SingleFlight::<usize>::default();
		let runs = Arc::new(AtomicUsize::new(0));
		let gate = Arc::new(Notify::new());

		let start = |runs: Arc<AtomicUsize>, gate: Arc<Notify>| {
			move || async move {
				gate.notified().await;
				runs.fetch_add(1, Ordering::SeqCst) + 41
			}
		};

		let (first, led) = flight.join_or_start(start(runs.clone(), gate.clone()));
		let (second, joined_led) = flight.join_or_start(start(runs.clone(), gate.clone()));
		assert!(led);
		assert!(!joined_led);
		assert!(flight.is_running());

		gate.notify_one();
		assert_eq!(land(first).await, Some(41));
		assert_eq!(land(second).await, Some(41));
		assert_eq!(runs.load(Ordering::SeqCst), 1);
		assert!(!flight.is_running());
	}

	#[tokio::test]
	async fn finished_run_allows_a_new_one() {
		let flight = SingleFlight::<u8>::default();
		let (rx, _) = flight.join_or_start(|| async { 1 });
		assert_eq!(land(rx).await, Some(1));

		let (rx, led) = flight.join_or_start(|| async { 2 });
		assert!(led);
		assert_eq!(land(rx).await, Some(2));
	}
}
