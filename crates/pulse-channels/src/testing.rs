//! Scripted adapter double for engine and service tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use pulse_entity::{Channel, DeliveryOutcome, Notification};

use crate::adapter::ChannelAdapter;

/// An adapter that replays a fixed script of outcomes.
///
/// Once the script runs dry every further dispatch is a transient
/// failure, which surfaces unexpected extra calls in assertions.
#[derive(Debug)]
pub struct ScriptedAdapter {
    channel: Channel,
    script: Mutex<VecDeque<DeliveryOutcome>>,
    calls: AtomicUsize,
}

impl ScriptedAdapter {
    /// Build a scripted adapter for one channel.
    pub fn new(channel: Channel, outcomes: Vec<DeliveryOutcome>) -> Self {
        Self {
            channel,
            script: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `dispatch` ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelAdapter for ScriptedAdapter {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn dispatch(&self, _notification: &Notification) -> DeliveryOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| DeliveryOutcome::Transient("script exhausted".to_string()))
    }
}
