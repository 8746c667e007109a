//! Browser glue: boots the controller into the page and routes DOM events,
//! `setTimeout` callbacks and animation frames back into it.
//!
//! All state lives in the `APP` thread-local; every callback re-enters through
//! `with_app`. Nothing here makes decisions, it only forwards.
use std::cell::{Cell, RefCell};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Window, window};

use crate::config::LuckyConfig;
use crate::controller::{Controller, Scheduler, Step, TimerHandle};
use crate::rng::XorShift;

mod view;

pub use view::DomView;

type App = Controller<DomView, BrowserScheduler, XorShift>;

thread_local! {
    static APP: RefCell<Option<App>> = RefCell::new(None);
    static LISTENERS_INSTALLED: Cell<bool> = Cell::new(false);
    static FRAME_LOOP_RUNNING: Cell<bool> = Cell::new(false);
    static FRAME_CALLBACK: RefCell<Option<Closure<dyn FnMut(f64)>>> = RefCell::new(None);
}

fn with_app(f: impl FnOnce(&mut App)) {
    APP.with(|cell| {
        if let Some(app) = cell.borrow_mut().as_mut() {
            f(app);
        }
    });
}

pub fn boot(config: LuckyConfig) -> Result<(), JsValue> {
    config.validate()?;
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    // A second boot replaces the first; its timers must not leak into the new session.
    if let Some(mut previous) = APP.with(|cell| cell.borrow_mut().take()) {
        previous.reset();
    }

    let view = DomView::attach(&win, &doc, &config)?;
    let mut app = Controller::new(config, view, BrowserScheduler, XorShift::from_entropy());
    app.init();
    APP.with(|cell| cell.replace(Some(app)));

    if !LISTENERS_INSTALLED.with(|flag| flag.replace(true)) {
        install_listeners(&win, &doc)?;
    }
    Ok(())
}

pub fn reset() {
    with_app(|app| app.reset());
}

/// Keys that open a focused envelope, like a native button.
fn activates_envelope(key: &str) -> bool {
    matches!(key, "Enter" | " ")
}

/// Index of the envelope an event landed on, via its `data-index` attribute.
fn envelope_index(evt: &web_sys::Event) -> Option<usize> {
    evt.target()
        .and_then(|t| t.dyn_into::<Element>().ok())
        .and_then(|el| el.closest(".envelope").ok().flatten())
        .and_then(|el| el.get_attribute("data-index"))
        .and_then(|raw| raw.parse::<usize>().ok())
}

fn install_listeners(win: &Window, doc: &Document) -> Result<(), JsValue> {
    // Envelope clicks are delegated to the container, which survives re-renders.
    {
        let container = view::envelope_container(doc)?;
        let closure = Closure::wrap(Box::new(move |evt: web_sys::MouseEvent| {
            if let Some(index) = envelope_index(&evt) {
                with_app(|app| {
                    app.click(index);
                });
            }
        }) as Box<dyn FnMut(_)>);
        container.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();

        // Envelopes are focusable role="button" divs, so Enter / Space open them too.
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            if !activates_envelope(&evt.key()) {
                return;
            }
            if let Some(index) = envelope_index(&evt) {
                // Space would otherwise scroll the page.
                evt.prevent_default();
                with_app(|app| {
                    app.click(index);
                });
            }
        }) as Box<dyn FnMut(_)>);
        container.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Reset control
    if let Some(button) = doc.get_element_by_id(view::RESET_ID) {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            with_app(|app| app.reset());
        }) as Box<dyn FnMut(_)>);
        button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Clicking the modal backdrop (not its content) dismisses the result.
    if let Some(modal) = doc.get_element_by_id(view::MODAL_ID) {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::MouseEvent| {
            let on_backdrop = evt
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .map(|el| el.id() == view::MODAL_ID)
                .unwrap_or(false);
            if on_backdrop {
                with_app(|app| app.dismiss_result());
            }
        }) as Box<dyn FnMut(_)>);
        modal.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            if evt.key() == "Escape" {
                with_app(|app| app.dismiss_result());
            }
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    {
        let closure = Closure::wrap(Box::new(move || {
            with_app(|app| app.view_mut().resize_surface());
        }) as Box<dyn FnMut()>);
        win.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

// --- Timers -----------------------------------------------------------------

/// `setTimeout` / `clearTimeout` backed scheduler. Steps re-enter through `APP`.
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn after(&mut self, delay_ms: u32, step: Step) -> Option<TimerHandle> {
        let win = window()?;
        let callback = Closure::once_into_js(move || with_app(|app| app.on_step(step)));
        match win.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            delay_ms as i32,
        ) {
            Ok(id) => Some(TimerHandle(id)),
            Err(err) => {
                log::warn!("setTimeout failed: {:?}", err);
                None
            }
        }
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(win) = window() {
            win.clear_timeout_with_handle(handle.0);
        }
    }
}

// --- Animation loop ---------------------------------------------------------

/// Start the frame loop unless it is already running. The loop stops itself
/// once the controller reports nothing left to draw.
pub(crate) fn start_frame_loop() {
    if FRAME_LOOP_RUNNING.with(|running| running.replace(true)) {
        return;
    }
    request_frame();
}

fn request_frame() {
    FRAME_CALLBACK.with(|cell| {
        let mut cell = cell.borrow_mut();
        let callback = cell
            .get_or_insert_with(|| Closure::wrap(Box::new(on_frame) as Box<dyn FnMut(f64)>));
        let requested = window()
            .map(|w| w.request_animation_frame(callback.as_ref().unchecked_ref()).is_ok())
            .unwrap_or(false);
        if !requested {
            FRAME_LOOP_RUNNING.with(|running| running.set(false));
        }
    });
}

fn on_frame(ts: f64) {
    let mut keep_going = false;
    with_app(|app| keep_going = app.frame(ts));
    if keep_going {
        request_frame();
    } else {
        FRAME_LOOP_RUNNING.with(|running| running.set(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_and_space_activate() {
        assert!(activates_envelope("Enter"));
        assert!(activates_envelope(" "));
        assert!(!activates_envelope("Escape"));
        assert!(!activates_envelope("Tab"));
        assert!(!activates_envelope("a"));
    }
}
