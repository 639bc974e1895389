use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{Event, Level};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Counts warning-level events.
struct WarnCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
	fn on_event(&self, event: &Event<'_>, _cx: Context<'_, S>) {
		if *event.metadata().level() == Level::WARN {
			self.0.fetch_add(1, Ordering::SeqCst);
		}
	}
}

/// Runs `f` and returns its result with the number of warnings it logged on
/// this thread.
pub(crate) fn count_warnings<R>(f: impl FnOnce() -> R) -> (R, usize) {
	let count = Arc::new(AtomicUsize::new(0));
	let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&count)));
	let result = tracing::subscriber::with_default(subscriber, f);
	(result, count.load(Ordering::SeqCst))
}
