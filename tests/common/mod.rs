//! Scripted in-memory backends for the gate integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use cities_admin::domain::validation::ValidationIntent;
use cities_admin::pagination::{PageQuery, PageResult};
use cities_admin::repository::{ApiError, ApiFuture, DupeProbe, PageSource};
use futures::FutureExt;
use tokio::time::{Instant, sleep};

pub const TOTAL_ROWS: u64 = 30;

/// How the next call answers: after `delay`, with success or a transport
/// failure.
#[derive(Clone, Copy, Debug)]
pub enum Reply {
    Ok(u64),
    Fail(u64),
}

impl Reply {
    fn split(self) -> (Duration, bool) {
        match self {
            Reply::Ok(ms) => (Duration::from_millis(ms), true),
            Reply::Fail(ms) => (Duration::from_millis(ms), false),
        }
    }
}

/// List endpoint serving `TOTAL_ROWS` rows named `p{page}-r{row}`.
#[derive(Default)]
pub struct FakeSource {
    calls: Mutex<Vec<(Instant, PageQuery)>>,
    plan: Mutex<VecDeque<Reply>>,
}

impl FakeSource {
    pub fn with_plan(plan: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            calls: Mutex::default(),
            plan: Mutex::new(plan.into_iter().collect()),
        }
    }

    pub fn calls(&self) -> Vec<(Instant, PageQuery)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<PageQuery> {
        self.calls().into_iter().map(|(_, query)| query).collect()
    }
}

pub fn page_for(query: &PageQuery) -> PageResult<String> {
    let size = u64::from(query.page_size);
    let start = u64::from(query.page_index) * size;
    let data = (start..TOTAL_ROWS.min(start + size))
        .map(|row| format!("p{}-r{row}", query.page_index))
        .collect();
    PageResult {
        data,
        page_index: query.page_index,
        page_size: query.page_size,
        total_count: TOTAL_ROWS,
        total_pages: TOTAL_ROWS.div_ceil(size) as u32,
        sort_column: Some(query.sort_column.clone()),
        sort_order: Some(query.sort_order),
        filter_column: query.filter_column.clone(),
        filter_query: query.filter_query.clone(),
    }
}

impl PageSource<String> for FakeSource {
    fn fetch_page(&self, query: &PageQuery) -> ApiFuture<PageResult<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), query.clone()));
        let (delay, ok) = self
            .plan
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Ok(0))
            .split();
        let page = page_for(query);
        async move {
            sleep(delay).await;
            if ok {
                Ok(page)
            } else {
                Err(ApiError::Transport("connection refused".to_string()))
            }
        }
        .boxed()
    }
}

/// Uniqueness endpoint treating every value listed in `taken` as a dupe.
#[derive(Default)]
pub struct FakeProbe {
    pub taken: Vec<String>,
    calls: Mutex<Vec<(Instant, ValidationIntent)>>,
    plan: Mutex<VecDeque<Reply>>,
}

impl FakeProbe {
    pub fn new(taken: &[&str], plan: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            taken: taken.iter().map(|value| value.to_string()).collect(),
            calls: Mutex::default(),
            plan: Mutex::new(plan.into_iter().collect()),
        }
    }

    pub fn calls(&self) -> Vec<(Instant, ValidationIntent)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn values(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(_, intent)| intent.field_value)
            .collect()
    }
}

impl DupeProbe<String> for FakeProbe {
    fn is_dupe(&self, intent: &ValidationIntent) -> ApiFuture<bool> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), intent.clone()));
        let (delay, ok) = self
            .plan
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Ok(0))
            .split();
        let is_dupe = self.taken.contains(&intent.field_value);
        async move {
            sleep(delay).await;
            if ok {
                Ok(is_dupe)
            } else {
                Err(ApiError::Transport("connection refused".to_string()))
            }
        }
        .boxed()
    }
}

/// Lets spawned actors run and the paused clock move forward by `ms`.
pub async fn advance(ms: u64) {
    sleep(Duration::from_millis(ms)).await;
}
