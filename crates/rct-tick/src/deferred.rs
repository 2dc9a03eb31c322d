//! Unrelated work joined at the end of a tick (deferred spawning and the like).

use std::thread::JoinHandle;

use crossbeam_channel::Receiver;

use crate::error::{TickError, TickResult, panic_message};

/// Concurrent work the tick waits for before returning.
pub trait DeferredTask {
    /// Block until the work is done.
    fn join(self) -> TickResult<()>;
}

/// Nothing to wait for.
impl DeferredTask for () {
    fn join(self) -> TickResult<()> {
        Ok(())
    }
}

impl<T> DeferredTask for JoinHandle<T> {
    fn join(self) -> TickResult<()> {
        JoinHandle::join(self)
            .map(drop)
            .map_err(|payload| TickError::DeferredTaskPanicked(panic_message(&*payload)))
    }
}

/// Completes on the first message or when every sender is dropped.
impl DeferredTask for Receiver<()> {
    fn join(self) -> TickResult<()> {
        // A disconnect means the producer finished without signalling
        let _ = self.recv();
        Ok(())
    }
}

impl<D: DeferredTask> DeferredTask for Option<D> {
    fn join(self) -> TickResult<()> {
        self.map_or(Ok(()), DeferredTask::join)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[test]
    fn test_join_handle_waits() {
        let done = Arc::new(AtomicBool::new(false));
        let handle = {
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                done.store(true, Ordering::SeqCst);
            })
        };

        DeferredTask::join(handle).unwrap();
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn test_join_handle_panic_reported() {
        let handle = std::thread::spawn(|| panic!("spawner failed"));
        let err = DeferredTask::join(handle).unwrap_err();
        assert!(matches!(err, TickError::DeferredTaskPanicked(ref m) if m == "spawner failed"));
    }

    #[test]
    fn test_receiver_signal_and_disconnect() {
        let (tx, rx) = crossbeam_channel::bounded::<()>(1);
        tx.send(()).unwrap();
        rx.join().unwrap();

        let (tx, rx) = crossbeam_channel::bounded::<()>(1);
        drop(tx);
        rx.join().unwrap();
    }

    #[test]
    fn test_none_and_unit() {
        ().join().unwrap();
        None::<JoinHandle<()>>.join().unwrap();
    }
}
