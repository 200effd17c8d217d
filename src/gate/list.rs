//! Server-paginated listing controller.
//!
//! [`ListHandle::spawn`] starts one actor task per listing screen. The view
//! layer feeds it intents (filter text, paginator and sort clicks) and reads
//! back two watches: the [`ListView`] snapshot and the [`FetchStatus`] of the
//! list channel.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, warn};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};

use crate::gate::{Channel, DEFAULT_DEBOUNCE, Debounce, GateError, RequestToken};
use crate::pagination::{
    DEFAULT_PAGE_SIZE, PageQuery, PageResult, QueryError, QueryPatch, SortOrder, page_links,
};
use crate::repository::{ApiError, ApiResult, PageSource};

/// Defaults of one listing screen.
#[derive(Clone, Debug)]
pub struct ListSettings {
    pub page_size: u32,
    pub sort_column: String,
    pub sort_order: SortOrder,
    /// Column the free-text filter applies to.
    pub filter_column: String,
    pub debounce: Duration,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            sort_column: "name".to_string(),
            sort_order: SortOrder::Asc,
            filter_column: "name".to_string(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Current state of the sortable header, when the view renders one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortBinding {
    pub active: String,
    pub direction: SortOrder,
}

/// Current state of the paginator widget, when the view renders one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginatorBinding {
    pub page_size: u32,
}

/// Widgets the view has bound to the listing. Missing widgets fall back to
/// the [`ListSettings`] defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewBinding {
    pub sort: Option<SortBinding>,
    pub paginator: Option<PaginatorBinding>,
}

/// Paginator values echoed from the last applied page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaginatorState {
    pub length: u64,
    pub page_index: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// Rows currently displayed by a listing.
#[derive(Clone, Debug, PartialEq)]
pub struct ListView<T> {
    pub rows: Vec<T>,
    pub total_count: u64,
    pub hidden: bool,
    pub paginator: PaginatorState,
}

impl<T> ListView<T> {
    fn empty(page_size: u32) -> Self {
        Self {
            rows: Vec::new(),
            total_count: 0,
            hidden: true,
            paginator: PaginatorState {
                page_size,
                ..PaginatorState::default()
            },
        }
    }

    /// Replaces every displayed value with the content of `result`.
    pub fn apply(&mut self, result: PageResult<T>) {
        self.hidden = result.data.is_empty();
        self.total_count = result.total_count;
        self.paginator = PaginatorState {
            length: result.total_count,
            page_index: result.page_index,
            page_size: result.page_size,
            total_pages: result.total_pages,
        };
        self.rows = result.data;
    }

    /// Page links for the paginator, see [`page_links`].
    pub fn page_links(&self) -> Vec<Option<usize>> {
        page_links(self.paginator.total_pages, self.paginator.page_index)
    }
}

/// Phase of the list channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Pending(RequestToken),
    /// The latest request failed; the view still shows the last good page.
    Failed(ApiError),
}

#[derive(Debug)]
enum Command {
    FilterText(String),
    Apply(QueryPatch),
    Reload,
    Close,
}

type InFlight<T> = FuturesUnordered<BoxFuture<'static, (RequestToken, ApiResult<PageResult<T>>)>>;

enum Event<T> {
    Command(Option<Command>),
    FilterDue,
    Settled(RequestToken, ApiResult<PageResult<T>>),
}

/// Handle to a running listing controller. Dropping it tears the controller
/// down.
pub struct ListHandle<T> {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<ListView<T>>,
    status: watch::Receiver<FetchStatus>,
    query: watch::Receiver<PageQuery>,
}

impl<T> ListHandle<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Starts the controller and issues the initial page request.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        source: Arc<dyn PageSource<T>>,
        settings: ListSettings,
        binding: Option<ViewBinding>,
    ) -> Result<Self, QueryError> {
        let binding = binding.unwrap_or_default();
        let page_size = binding
            .paginator
            .map_or(settings.page_size, |paginator| paginator.page_size);
        let (sort_column, sort_order) = match binding.sort {
            Some(sort) => (sort.active, sort.direction),
            None => (settings.sort_column.clone(), settings.sort_order),
        };
        let query = PageQuery::first_page(page_size, sort_column, sort_order)?;

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(ListView::empty(page_size));
        let (status_tx, status_rx) = watch::channel(FetchStatus::Idle);
        let (query_tx, query_rx) = watch::channel(query.clone());

        let actor = ListActor {
            source,
            filter_column: settings.filter_column,
            query,
            debounce: Debounce::new(settings.debounce),
            channel: Channel::default(),
            view: view_tx,
            status: status_tx,
            query_tx,
        };
        tokio::spawn(actor.run(commands_rx));

        Ok(Self {
            commands: commands_tx,
            view: view_rx,
            status: status_rx,
            query: query_rx,
        })
    }

    /// Free-text filter input. Debounced.
    pub fn filter_text_changed(&self, text: impl Into<String>) -> Result<(), GateError> {
        self.send(Command::FilterText(text.into()))
    }

    /// Paginator click. Applied immediately.
    pub fn page_changed(&self, page_index: i64, page_size: i64) -> Result<(), GateError> {
        self.apply(QueryPatch::page(page_index, page_size))
    }

    /// Sort header click. Applied immediately and resets to the first page.
    pub fn sort_changed(
        &self,
        column: impl Into<String>,
        order: SortOrder,
    ) -> Result<(), GateError> {
        self.apply(QueryPatch::sort(column, order))
    }

    /// Re-fetches the current query even if it was already fetched.
    pub fn reload(&self) -> Result<(), GateError> {
        self.send(Command::Reload)
    }

    pub fn view(&self) -> watch::Receiver<ListView<T>> {
        self.view.clone()
    }

    pub fn status(&self) -> watch::Receiver<FetchStatus> {
        self.status.clone()
    }

    /// Query the controller currently wants displayed.
    pub fn query(&self) -> PageQuery {
        self.query.borrow().clone()
    }

    /// Tears the controller down; in-flight results are discarded.
    pub fn close(self) {
        let _ = self.commands.send(Command::Close);
    }

    fn apply(&self, patch: QueryPatch) -> Result<(), GateError> {
        // Reject malformed input here so the caller sees it synchronously.
        self.query.borrow().build(patch.clone())?;
        self.send(Command::Apply(patch))
    }

    fn send(&self, command: Command) -> Result<(), GateError> {
        self.commands.send(command).map_err(|_| GateError::Closed)
    }
}

struct ListActor<T> {
    source: Arc<dyn PageSource<T>>,
    filter_column: String,
    query: PageQuery,
    debounce: Debounce<String>,
    channel: Channel<PageQuery>,
    view: watch::Sender<ListView<T>>,
    status: watch::Sender<FetchStatus>,
    query_tx: watch::Sender<PageQuery>,
}

impl<T> ListActor<T>
where
    T: Send + Sync + 'static,
{
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut in_flight: InFlight<T> = FuturesUnordered::new();
        self.dispatch(&mut in_flight, false);

        loop {
            let deadline = self.debounce.deadline();
            let event = tokio::select! {
                command = commands.recv() => Event::Command(command),
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    Event::FilterDue
                }
                Some((token, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    Event::Settled(token, result)
                }
            };

            match event {
                Event::Command(Some(Command::FilterText(text))) => {
                    self.debounce.push(text, Instant::now());
                }
                Event::Command(Some(Command::Apply(patch))) => {
                    if self.rebuild(patch) {
                        self.dispatch(&mut in_flight, false);
                    }
                }
                Event::Command(Some(Command::Reload)) => self.dispatch(&mut in_flight, true),
                Event::Command(Some(Command::Close) | None) => break,
                Event::FilterDue => {
                    if let Some(text) = self.debounce.take_due(Instant::now()) {
                        let patch = QueryPatch::filter(self.filter_column.clone(), text);
                        if self.rebuild(patch) {
                            self.dispatch(&mut in_flight, false);
                        }
                    }
                }
                Event::Settled(token, result) => self.settle(token, result),
            }
        }

        self.debounce.clear();
        if let Some(token) = self.channel.in_flight() {
            debug!("Abandoning list request {token}");
        }
        self.channel.cancel();
        debug!("list controller closed with {} request(s) abandoned", in_flight.len());
    }

    fn rebuild(&mut self, patch: QueryPatch) -> bool {
        match self.query.build(patch) {
            Ok(query) => {
                self.query = query;
                self.query_tx.send_replace(self.query.clone());
                true
            }
            Err(err) => {
                warn!("Ignoring list intent: {err}");
                false
            }
        }
    }

    fn dispatch(&mut self, in_flight: &mut InFlight<T>, force: bool) {
        let token = if force {
            Some(self.channel.force(&self.query))
        } else {
            self.channel.begin(&self.query)
        };
        let Some(token) = token else {
            debug!("Suppressing repeated list query {:?}", self.query);
            return;
        };

        debug!("Fetching page {} as {token}", self.query.page_index);
        let request = self.source.fetch_page(&self.query);
        in_flight.push(async move { (token, request.await) }.boxed());
        self.status.send_replace(FetchStatus::Pending(token));
    }

    fn settle(&mut self, token: RequestToken, result: ApiResult<PageResult<T>>) {
        if !self.channel.settle(token, result.is_ok()) {
            debug!("Discarding stale list response {token}");
            return;
        }
        match result {
            Ok(page) => {
                self.view.send_modify(|view| view.apply(page));
                self.status.send_replace(FetchStatus::Idle);
            }
            Err(err) => {
                warn!("Failed to load page for {token}: {err}");
                self.status.send_replace(FetchStatus::Failed(err));
            }
        }
    }
}
