//! RT-safe garbage collection for effect waveforms
//!
//! Provides a global `basedrop` collector for deferred deallocation. Voices
//! hold `Shared<SoundEffect>` references; when the last reference to a long
//! waveform is dropped inside the audio callback, the pointer is enqueued for
//! a background GC thread instead of freeing the buffer on the RT path.
//!
//! Dropping on the RT thread is ~50ns (an enqueue); the actual free happens
//! on the GC thread where latency doesn't matter.

use basedrop::{Collector, Handle};
use std::sync::mpsc;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

/// Global handle for creating `Shared<T>` allocations.
///
/// Initialized once; clones are cheap. The Collector itself lives on a
/// dedicated GC thread (it is `!Sync`).
static GC_HANDLE: OnceLock<Handle> = OnceLock::new();

/// Spawn the collector thread and return a handle to it.
fn init_gc() -> Handle {
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("deepvox-gc".to_string())
        .spawn(move || {
            let mut collector = Collector::new();

            let handle = collector.handle();
            tx.send(handle).expect("Failed to send GC handle");

            log::info!("Waveform GC thread started");

            loop {
                collector.collect();
                // 100ms is fast enough for memory reclamation
                thread::sleep(Duration::from_millis(100));
            }
        })
        .expect("Failed to spawn waveform GC thread");

    rx.recv().expect("Failed to receive GC handle")
}

/// Get a handle for wrapping values in `Shared<T>`.
pub fn gc_handle() -> Handle {
    GC_HANDLE.get_or_init(init_gc).clone()
}
