//! Daily trigger for the KPI pipeline
//!
//! A poll-and-sleep loop: every `poll_interval` the trigger is checked and the
//! pipeline runs when its wall-clock time has passed. Times are naive UTC.

use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime, Utc};

use crate::pipeline::{AnalyticsSource, Pipeline, SheetWriter};

/// Next occurrence of a fixed daily time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTrigger {
    at: NaiveTime,
    next_run: NaiveDateTime,
}

/// First occurrence of `at` strictly after `now`
fn next_occurrence(at: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        return today;
    }
    match now.date().succ_opt() {
        Some(tomorrow) => tomorrow.and_time(at),
        None => today,
    }
}

impl DailyTrigger {
    pub fn new(at: NaiveTime, now: NaiveDateTime) -> Self {
        Self {
            at,
            next_run: next_occurrence(at, now),
        }
    }

    pub fn next_run(&self) -> NaiveDateTime {
        self.next_run
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.next_run
    }

    /// Record a run at `now` and move to the following occurrence
    pub fn mark_run(&mut self, now: NaiveDateTime) {
        self.next_run = next_occurrence(self.at, now);
    }
}

/// Run the pipeline whenever the trigger is due; never returns
pub async fn run_daily<S, W>(pipeline: &Pipeline<S, W>, mut trigger: DailyTrigger, poll_interval: Duration)
where
    S: AnalyticsSource,
    W: SheetWriter,
{
    tracing::info!("Next pipeline run at {} UTC", trigger.next_run());
    loop {
        let now = Utc::now().naive_utc();
        if trigger.is_due(now) {
            pipeline.run().await;
            trigger.mark_run(Utc::now().naive_utc());
            tracing::info!("Next pipeline run at {} UTC", trigger.next_run());
        }
        tokio::time::sleep(poll_interval).await;
    }
}
