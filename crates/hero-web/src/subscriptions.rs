use crate::{dom, Shared};
use std::rc::Weak;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

struct Listener {
    target: web::EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(web::Event)>,
}

/// Every host listener a mounted renderer installs. Teardown walks the same
/// list so none can outlive `dispose`.
#[derive(Default)]
pub struct Subscriptions {
    listeners: Vec<Listener>,
}

impl Subscriptions {
    pub fn attach(shared: &Weak<Shared>, canvas: &web::HtmlCanvasElement) -> Self {
        let mut subs = Self::default();

        if let Some(window) = web::window() {
            let s = shared.clone();
            subs.listen(&window, "resize", move |_| {
                if let Some(shared) = s.upgrade() {
                    shared.request_resize();
                }
            });

            if let Some(query) = dom::reduced_motion_query() {
                let s = shared.clone();
                let q = query.clone();
                subs.listen(&query, "change", move |_| {
                    if let Some(shared) = s.upgrade() {
                        shared.with_controller(|c| c.set_reduced_motion(q.matches()));
                    }
                });
            }
        }

        if let Some(document) = dom::window_document() {
            let s = shared.clone();
            subs.listen(&document, "visibilitychange", move |_| {
                if let Some(shared) = s.upgrade() {
                    shared.with_controller(|c| c.set_hidden(dom::document_hidden()));
                }
            });
        }

        let s = shared.clone();
        subs.listen(canvas, "webglcontextlost", move |event| {
            // without this the browser never restores the context
            event.prevent_default();
            if let Some(shared) = s.upgrade() {
                shared.with_controller(|c| c.context_lost());
            }
        });

        let s = shared.clone();
        subs.listen(canvas, "webglcontextrestored", move |_| {
            if let Some(shared) = s.upgrade() {
                shared.rebuild_after_restore();
            }
        });

        subs
    }

    fn listen(
        &mut self,
        target: &web::EventTarget,
        event: &'static str,
        handler: impl FnMut(web::Event) + 'static,
    ) {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web::Event)>);
        match target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref()) {
            Ok(()) => self.listeners.push(Listener {
                target: target.clone(),
                event,
                callback,
            }),
            Err(e) => log::warn!("could not subscribe to {event}: {e:?}"),
        }
    }

    pub fn detach_all(&mut self) {
        for listener in self.listeners.drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.event,
                listener.callback.as_ref().unchecked_ref(),
            );
        }
    }

    pub fn count(&self) -> usize {
        self.listeners.len()
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.detach_all();
    }
}
