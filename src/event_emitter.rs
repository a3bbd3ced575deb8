use log::*;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Fans events out to every live subscriber without blocking the emitter.
///
/// Subscribers that fall more than `buffer` events behind lose the overflow;
/// subscribers whose receiver was dropped are forgotten on the next emit.
pub struct EventEmitter<T> {
    buffer: usize,
    subscribers: Vec<mpsc::Sender<T>>,
}

impl<T> EventEmitter<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<T> {
        let (sender, receiver) = mpsc::channel(self.buffer);
        self.subscribers.push(sender);
        receiver
    }

    pub fn emit(&mut self, event: T) {
        self.subscribers.retain(|subscriber| {
            match subscriber.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    debug!("Dropping event for a slow subscriber");
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            }
        });
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
