// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use docket_app::{DateRange, FetchTicket, Record, RecordId, RecordTicket};
use docket_testkit::InMemorySource;
use docket_tui::{InternalEvent, ReviewRuntime};
use std::sync::mpsc::Sender;
use std::thread;
use time::Date;

const DEMO_SEED: u64 = 0x0D0C_CE7;
const DEMO_RECORDS: usize = 120;

/// Fetches over HTTP, one worker thread per request.
pub struct HttpRuntime {
    client: docket_http::Client,
}

impl HttpRuntime {
    pub fn new(client: docket_http::Client) -> Self {
        Self { client }
    }
}

impl ReviewRuntime for HttpRuntime {
    fn fetch_records(&mut self, range: DateRange) -> Result<Vec<Record>> {
        self.client.fetch_records(range)
    }

    fn fetch_record(&mut self, id: RecordId) -> Result<Option<Record>> {
        self.client.fetch_record(id)
    }

    fn spawn_fetch_records(&mut self, ticket: FetchTicket, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name("docket-fetch".to_owned())
            .spawn(move || {
                let result = client
                    .fetch_records(ticket.range)
                    .map_err(|error| format!("{error:#}"));
                let _ = tx.send(InternalEvent::RecordsLoaded { ticket, result });
            })
            .map_err(|error| anyhow!("spawn fetch worker: {error}"))?;
        Ok(())
    }

    fn spawn_fetch_record(&mut self, ticket: RecordTicket, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name("docket-refresh".to_owned())
            .spawn(move || {
                let result = client
                    .fetch_record(ticket.id)
                    .map_err(|error| format!("{error:#}"));
                let _ = tx.send(InternalEvent::RecordLoaded { ticket, result });
            })
            .map_err(|error| anyhow!("spawn refresh worker: {error}"))?;
        Ok(())
    }
}

/// Seeded in-memory records for `--demo`; no server involved.
pub struct DemoRuntime {
    source: InMemorySource,
}

impl DemoRuntime {
    pub fn seeded(today: Date) -> Self {
        Self {
            source: InMemorySource::seeded(DEMO_SEED, DEMO_RECORDS, today),
        }
    }

    pub fn source(&self) -> &InMemorySource {
        &self.source
    }
}

impl ReviewRuntime for DemoRuntime {
    fn fetch_records(&mut self, range: DateRange) -> Result<Vec<Record>> {
        Ok(self.source.fetch_records(range))
    }

    fn fetch_record(&mut self, id: RecordId) -> Result<Option<Record>> {
        Ok(self.source.fetch_record(id))
    }
}
