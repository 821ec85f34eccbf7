//! Event-loop collaborators: `setTimeout` scheduling and local task spawning.

use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use docclip_core::{Scheduler, Spawner};

/// One-shot tasks on `window.setTimeout`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        let Some(window) = web_sys::window() else {
            tracing::warn!("no window; dropping scheduled task");
            return;
        };
        let callback = Closure::once_into_js(task);
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            millis,
        ) {
            tracing::warn!("setTimeout failed: {:?}", e);
        }
    }
}

/// Spawns onto the browser microtask queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalSpawner;

impl Spawner for LocalSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
