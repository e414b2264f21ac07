// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use docket_app::{DateRange, RecordId, RecordStatus};
use docket_http::Client;
use std::thread;
use std::time::Duration;
use time::{Date, Month};
use tiny_http::{Header, Response, Server};

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

fn mock_server() -> Result<(Server, String)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api", server.server_addr());
    Ok((server, addr))
}

#[test]
fn unreachable_server_error_names_the_setting() {
    let client = Client::new("http://127.0.0.1:1/api", Duration::from_millis(50))
        .expect("client should initialize");

    let error = client
        .fetch_records(DateRange::UNBOUNDED)
        .expect_err("fetch should fail for unreachable endpoint");
    assert!(error.to_string().contains("[server]"));
}

#[test]
fn fetch_records_sends_the_date_range() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(
            request.url(),
            "/api/records?startDate=2026-05-19&endDate=2026-05-27"
        );
        let body = r#"[
            {"id": 1, "status": "pending", "scheduled_on": "2026-05-20",
             "requester": {"first_name": "Ada"},
             "location": {"id": 3, "name": "North Hall", "city": "Lyon"}},
            {"id": 2, "status": "approved"}
        ]"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let range = DateRange::new(
        Some(Date::from_calendar_date(2026, Month::May, 19)?),
        Some(Date::from_calendar_date(2026, Month::May, 27)?),
    );
    let records = client.fetch_records(range)?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].requester.first_name, "Ada");
    assert_eq!(
        records[0].scheduled_on,
        Some(Date::from_calendar_date(2026, Month::May, 20)?)
    );
    assert_eq!(
        records[0].location.as_ref().map(|location| location.city.as_str()),
        Some("Lyon")
    );
    assert_eq!(records[1].status, RecordStatus::Approved);
    assert_eq!(records[1].scheduled_on, None);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn fetch_record_maps_not_found_to_none() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/records/7");
        request
            .respond(json_response(r#"{"data":{"id":7,"status":"completed"}}"#, 200))
            .expect("response should succeed");

        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/records/8");
        request
            .respond(json_response(r#"{"error":"not found"}"#, 404))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let found = client.fetch_record(RecordId::new(7))?;
    assert_eq!(found.map(|record| record.status), Some(RecordStatus::Completed));
    assert!(client.fetch_record(RecordId::new(8))?.is_none());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn server_errors_surface_the_message() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(
                r#"{"error":{"message":"startDate is after endDate"}}"#,
                400,
            ))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .fetch_records(DateRange::UNBOUNDED)
        .expect_err("bad request should fail");
    assert_eq!(
        error.to_string(),
        "server error (400): startDate is after endDate"
    );

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn malformed_payloads_fail_with_context() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(r#"{"records": "nope"}"#, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .fetch_records(DateRange::UNBOUNDED)
        .expect_err("payload should not decode");
    assert!(format!("{error:#}").contains("decode record list"));

    handle.join().expect("server thread should join");
    Ok(())
}
