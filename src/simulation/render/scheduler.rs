use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

type FrameClosure = Closure<dyn FnMut(f64)>;

/// `requestAnimationFrame` loop.
///
/// The callback receives the frame timestamp and returns whether it wants
/// another frame. Returning `false` (or `stop`) ends the loop and drops the
/// closure.
pub struct FrameScheduler {
    slot: Rc<RefCell<Option<FrameClosure>>>,
    handle: Rc<RefCell<Option<i32>>>,
}

impl FrameScheduler {
    pub fn start<F>(mut on_frame: F) -> Result<Self, JsValue>
    where
        F: FnMut(f64) -> bool + 'static,
    {
        let slot: Rc<RefCell<Option<FrameClosure>>> = Rc::new(RefCell::new(None));
        let handle: Rc<RefCell<Option<i32>>> = Rc::new(RefCell::new(None));

        let next_slot = slot.clone();
        let next_handle = handle.clone();
        *slot.borrow_mut() = Some(Closure::wrap(Box::new(move |now_ms: f64| {
            next_handle.borrow_mut().take();
            if !on_frame(now_ms) {
                // Breaks the closure's reference cycle.
                next_slot.borrow_mut().take();
                return;
            }
            match request_frame(&next_slot) {
                Ok(id) => *next_handle.borrow_mut() = Some(id),
                Err(err) => {
                    console_warn!("requestAnimationFrame failed: {:?}", err);
                    next_slot.borrow_mut().take();
                }
            }
        }) as Box<dyn FnMut(f64)>));

        let id = request_frame(&slot)?;
        *handle.borrow_mut() = Some(id);
        Ok(Self { slot, handle })
    }

    pub fn is_active(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Cancels the pending frame, if any, and drops the callback.
    pub fn stop(&self) {
        if let Some(id) = self.handle.borrow_mut().take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        self.slot.borrow_mut().take();
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn request_frame(slot: &Rc<RefCell<Option<FrameClosure>>>) -> Result<i32, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let borrowed = slot.borrow();
    let closure = borrowed
        .as_ref()
        .ok_or_else(|| JsValue::from_str("frame callback dropped"))?;
    window.request_animation_frame(closure.as_ref().unchecked_ref())
}
