use wasm_bindgen::prelude::*;

/// Coalescing timer: at most one pending callback. Scheduling again before
/// the timer fires cancels the previous call instead of queueing a second.
#[derive(Default)]
pub struct Debouncer {
	handle: Option<i32>,
	// Keeps the scheduled closure alive until it fires or is superseded.
	closure: Option<Closure<dyn FnMut()>>,
}

impl Debouncer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn schedule(&mut self, delay_ms: i32, f: impl FnOnce() + 'static) {
		self.cancel();
		let mut f = Some(f);
		let closure = Closure::new(move || {
			if let Some(f) = f.take() {
				f();
			}
		});
		let window = web_sys::window().unwrap();
		if let Ok(handle) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
			closure.as_ref().unchecked_ref(),
			delay_ms,
		) {
			self.handle = Some(handle);
		}
		self.closure = Some(closure);
	}

	pub fn cancel(&mut self) {
		if let Some(handle) = self.handle.take() {
			if let Some(window) = web_sys::window() {
				window.clear_timeout_with_handle(handle);
			}
		}
		self.closure = None;
	}
}

impl Drop for Debouncer {
	fn drop(&mut self) {
		self.cancel();
	}
}
