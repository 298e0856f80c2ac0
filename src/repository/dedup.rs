use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;

/// Collapses concurrent lookups for the same key into a single in-flight
/// resolution. The first caller for a key (the pioneer) runs `work` and
/// broadcasts completion to every waiter; waiters get neither the
/// pioneer's data nor its error back directly — `work` only runs once for
/// them combined, so a woken waiter is expected to re-check the cache
/// itself.
///
/// Grounded on `original_source/deduper.go`'s `sync.Mutex` +
/// `map[string]*sync.WaitGroup`, and on the in-flight-query broadcast
/// channel used by the `RoeeJ-heimdall` reference resolver. A broadcast
/// channel is used instead of `tokio::sync::Notify` because `subscribe()`
/// registers a waiter immediately under the same lock that guards the
/// ticket map, closing the lost-wakeup window a bare `Notify` would leave
/// between creating and first polling its `Notified` future.
#[derive(Default)]
pub struct Deduper {
    tickets: Mutex<HashMap<String, broadcast::Sender<()>>>,
}

impl Deduper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Either becomes the pioneer for `key` and runs `work`, or waits for
    /// the current pioneer to finish and returns `None`.
    pub async fn run<F, Fut, T>(&self, key: &str, work: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        enum Role {
            Pioneer(broadcast::Sender<()>),
            Waiter(broadcast::Receiver<()>),
        }

        let role = {
            let mut tickets = self.tickets.lock().unwrap();
            if let Some(sender) = tickets.get(key) {
                Role::Waiter(sender.subscribe())
            } else {
                let (sender, _) = broadcast::channel(1);
                tickets.insert(key.to_string(), sender.clone());
                Role::Pioneer(sender)
            }
        };

        match role {
            Role::Waiter(mut receiver) => {
                let _ = receiver.recv().await;
                None
            }
            Role::Pioneer(sender) => {
                let _guard = TicketGuard { tickets: &self.tickets, key, sender };
                Some(work().await)
            }
        }
    }
}

/// Removes the pioneer's ticket and wakes any waiters on drop, including
/// when `work` unwinds — a waiter blocked on `receiver.recv().await` must
/// never hang just because the pioneer panicked instead of returning.
struct TicketGuard<'a> {
    tickets: &'a Mutex<HashMap<String, broadcast::Sender<()>>>,
    key: &'a str,
    sender: broadcast::Sender<()>,
}

impl Drop for TicketGuard<'_> {
    fn drop(&mut self) {
        self.tickets.lock().unwrap().remove(self.key);
        let _ = self.sender.send(());
    }
}
