//! Asynchronous uniqueness checks for form fields.
//!
//! Every `(entity_id, field_name)` pair is its own channel with its own
//! debounce window and token ledger. A form asks for a verdict with
//! [`ValidationGate::validate`] and watches the returned receiver: it reads
//! [`Verdict::Pending`] right away and the settled verdict once the latest
//! check for that field comes back.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, warn};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};

use crate::domain::validation::{ChannelKey, ValidationIntent, Verdict};
use crate::gate::{Channel, Debounce, GateError, RequestToken};
use crate::repository::{ApiResult, DupeProbe};

/// Published verdict of one field plus the number of the submission it
/// answers. Results for older submissions are never published.
#[derive(Debug)]
struct VerdictSlot {
    submitted: AtomicU64,
    verdict: watch::Sender<Verdict>,
}

impl VerdictSlot {
    fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            verdict: watch::Sender::new(Verdict::Pending),
        }
    }

    fn submit(&self) -> u64 {
        let seq = self.submitted.fetch_add(1, Ordering::SeqCst) + 1;
        self.verdict.send_replace(Verdict::Pending);
        seq
    }

    fn publish(&self, seq: u64, verdict: Verdict) {
        self.verdict.send_if_modified(|current| {
            if self.submitted.load(Ordering::SeqCst) != seq || *current == verdict {
                return false;
            }
            *current = verdict;
            true
        });
    }
}

struct Submit<V> {
    intent: ValidationIntent<V>,
    seq: u64,
    slot: Arc<VerdictSlot>,
}

type InFlight = FuturesUnordered<BoxFuture<'static, (ChannelKey, RequestToken, ApiResult<bool>)>>;

enum Event<V> {
    Submit(Option<Submit<V>>),
    Due,
    Settled(ChannelKey, RequestToken, ApiResult<bool>),
}

/// Handle to the uniqueness checks of one form. Dropping it cancels every
/// outstanding check.
pub struct ValidationGate<V> {
    commands: mpsc::UnboundedSender<Submit<V>>,
    slots: HashMap<ChannelKey, Arc<VerdictSlot>>,
}

impl<V> ValidationGate<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// Starts the gate. `window` is the quiet period applied per field.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(probe: Arc<dyn DupeProbe<V>>, window: Duration) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let actor = ValidationActor {
            probe,
            window,
            fields: HashMap::new(),
        };
        tokio::spawn(actor.run(receiver));

        Self {
            commands,
            slots: HashMap::new(),
        }
    }

    /// Submits a new value for a field. The returned receiver holds
    /// [`Verdict::Pending`] until the check for this value settles.
    pub fn validate(
        &mut self,
        intent: ValidationIntent<V>,
    ) -> Result<watch::Receiver<Verdict>, GateError> {
        let slot = self
            .slots
            .entry(intent.key())
            .or_insert_with(|| Arc::new(VerdictSlot::new()))
            .clone();
        let seq = slot.submit();
        let receiver = slot.verdict.subscribe();

        self.commands
            .send(Submit { intent, seq, slot })
            .map_err(|_| GateError::Closed)?;
        Ok(receiver)
    }

    /// Latest published verdict of a field, `None` if it was never checked.
    pub fn verdict(&self, key: &ChannelKey) -> Option<Verdict> {
        self.slots
            .get(key)
            .map(|slot| slot.verdict.borrow().clone())
    }

    /// Tears the gate down; outstanding checks are discarded.
    pub fn close(self) {
        drop(self.commands);
    }
}

struct FieldChannel<V> {
    slot: Arc<VerdictSlot>,
    debounce: Debounce<(ValidationIntent<V>, u64)>,
    channel: Channel<V>,
    /// Submission the in-flight or last settled request answers.
    answering: u64,
    resolved: Option<Verdict>,
}

struct ValidationActor<V> {
    probe: Arc<dyn DupeProbe<V>>,
    window: Duration,
    fields: HashMap<ChannelKey, FieldChannel<V>>,
}

impl<V> ValidationActor<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Submit<V>>) {
        let mut in_flight: InFlight = FuturesUnordered::new();

        loop {
            let deadline = self.next_deadline();
            let event = tokio::select! {
                submit = commands.recv() => Event::Submit(submit),
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    Event::Due
                }
                Some((key, token, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    Event::Settled(key, token, result)
                }
            };

            match event {
                Event::Submit(Some(submit)) => self.accept(submit),
                Event::Submit(None) => break,
                Event::Due => self.dispatch_due(&mut in_flight),
                Event::Settled(key, token, result) => self.settle(key, token, result),
            }
        }

        for (key, field) in &mut self.fields {
            field.debounce.clear();
            if let Some(token) = field.channel.in_flight() {
                debug!("Abandoning check {token} for {key}");
            }
            field.channel.cancel();
        }
        debug!(
            "validation gate closed with {} check(s) abandoned",
            in_flight.len()
        );
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.fields
            .values()
            .filter_map(|field| field.debounce.deadline())
            .min()
    }

    fn accept(&mut self, submit: Submit<V>) {
        let Submit { intent, seq, slot } = submit;
        let window = self.window;
        let field = self
            .fields
            .entry(intent.key())
            .or_insert_with(|| FieldChannel {
                slot,
                debounce: Debounce::new(window),
                channel: Channel::default(),
                answering: 0,
                resolved: None,
            });
        field.debounce.push((intent, seq), Instant::now());
    }

    fn dispatch_due(&mut self, in_flight: &mut InFlight) {
        let now = Instant::now();
        for (key, field) in &mut self.fields {
            let Some((intent, seq)) = field.debounce.take_due(now) else {
                continue;
            };

            let Some(token) = field.channel.begin(&intent.field_value) else {
                field.answering = seq;
                if field.channel.is_settled()
                    && let Some(verdict) = field.resolved.clone()
                {
                    debug!("Reusing verdict for unchanged {key}");
                    field.slot.publish(seq, verdict);
                } else {
                    debug!("Unchanged {key} is still being checked");
                }
                continue;
            };

            debug!("Checking {key} as {token}");
            field.answering = seq;
            field.resolved = None;
            let request = self.probe.is_dupe(&intent);
            let key = key.clone();
            in_flight.push(async move { (key, token, request.await) }.boxed());
        }
    }

    fn settle(&mut self, key: ChannelKey, token: RequestToken, result: ApiResult<bool>) {
        let Some(field) = self.fields.get_mut(&key) else {
            return;
        };
        if !field.channel.settle(token, result.is_ok()) {
            debug!("Discarding stale check {token} for {key}");
            return;
        }

        let verdict = match result {
            Ok(is_dupe) => Verdict::from_dupe_flag(is_dupe),
            Err(err) => {
                warn!("Uniqueness check for {key} failed: {err}");
                Verdict::Failed(err.to_string())
            }
        };
        field.resolved = Some(verdict.clone());
        field.slot.publish(field.answering, verdict);
    }
}
