//! The whole wizard and posting run over SQLite and a mocked Service Layer.

mod support;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use grnflow_core::{FixedClock, LineSubmission, PostingOrchestrator, SubmittedLine, WizardService};
use grnflow_domain::{
    Actor, BatchStatus, GrnFlowError, LinkStatus, NewPoLink, PostingConfig, UserRole,
};
use grnflow_infra::{RolePermissionGate, ServiceLayerClient};
use rust_decimal_macros::dec;
use serde_json::json;
use support::{erp_config, mount_login, open_line_json, purchase_order_json, sap_error, TestDatabase};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct App {
    _db: TestDatabase,
    wizard: WizardService,
    orchestrator: PostingOrchestrator,
}

fn app(server: &MockServer) -> App {
    let db = TestDatabase::new();
    let store = Arc::new(db.store());
    let erp = Arc::new(ServiceLayerClient::new(erp_config(server)).unwrap());
    let permissions = Arc::new(RolePermissionGate::new());
    let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 6, 2, 9, 30, 0).unwrap()));

    App {
        wizard: WizardService::new(store.clone(), erp.clone(), permissions.clone()),
        orchestrator: PostingOrchestrator::new(
            store,
            erp,
            permissions,
            clock,
            PostingConfig::default(),
        ),
        _db: db,
    }
}

async fn mount_purchase_orders(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/b1s/v1/PurchaseOrders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                purchase_order_json(501, "C-NORTHWIND", json!([
                    open_line_json(0, "RM-100", 6.0),
                    open_line_json(1, "RM-200", 2.0)
                ])),
                purchase_order_json(502, "C-NORTHWIND", json!([open_line_json(0, "RM-300", 5.0)]))
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn two_orders_one_rejected_completes_with_one_delivery_note() {
    let server = MockServer::start().await;
    mount_login(&server, "sess-1").await;
    mount_purchase_orders(&server).await;
    Mock::given(method("POST"))
        .and(path("/b1s/v1/PurchaseDeliveryNotes"))
        .and(body_partial_json(json!({
            "NumAtCard": "BATCH-1-PO-4501",
            "DocDate": "2025-06-02",
            "DocumentLines": [
                { "BaseType": 22, "BaseEntry": 501, "BaseLine": 0, "Quantity": 6.0, "WarehouseCode": "01" },
                { "BaseType": 22, "BaseEntry": 501, "BaseLine": 1, "Quantity": 1.5 }
            ]
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "DocEntry": 9001, "DocNum": 5001 })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/b1s/v1/PurchaseDeliveryNotes"))
        .and(body_partial_json(json!({ "NumAtCard": "BATCH-1-PO-4502" })))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(sap_error("Warehouse 01 is locked")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server);
    let actor = Actor::new(7, UserRole::User);

    let batch = app.wizard.start_batch(&actor, "C-NORTHWIND", "Northwind Traders").await.unwrap();
    assert_eq!(batch.id, 1);

    let orders = app.wizard.purchase_order_candidates(&actor, batch.id).await.unwrap();
    assert_eq!(orders.len(), 2);
    let links = app
        .wizard
        .select_purchase_orders(&actor, batch.id, orders.iter().map(NewPoLink::from).collect())
        .await
        .unwrap();
    assert_eq!(links.len(), 2);

    let candidates = app.wizard.line_candidates(&actor, batch.id).await.unwrap();
    let submissions: Vec<LineSubmission> = candidates
        .into_iter()
        .map(|c| LineSubmission {
            link_id: c.link.id,
            lines: c
                .lines
                .into_iter()
                .map(|line| {
                    // Untouched quantity resolves to the open quantity.
                    let quantity = if line.line_num == 1 { Some(dec!(1.5)) } else { None };
                    SubmittedLine { line, quantity }
                })
                .collect(),
        })
        .collect();
    assert_eq!(app.wizard.select_lines(&actor, batch.id, submissions).await.unwrap(), 3);

    let review = app.wizard.review(&actor, batch.id).await.unwrap();
    assert_eq!(review.total_lines(), 3);
    app.wizard.confirm_review(&actor, batch.id).await.unwrap();

    let report = app.orchestrator.post(&actor, batch.id).await.unwrap();
    assert_eq!(report.status, BatchStatus::Completed);
    assert_eq!(report.total_success, 1);
    assert_eq!(report.total_failed, 1);
    assert_eq!(report.results[0].grn_num, Some(5001));
    assert_eq!(report.results[1].error.as_deref(), Some("Warehouse 01 is locked"));

    let detail = app.wizard.view_batch(&actor, batch.id).await.unwrap();
    assert_eq!(detail.batch.status, BatchStatus::Completed);
    assert_eq!(detail.batch.total_grns_created, 1);
    assert_eq!(detail.batch.posted_at, Some(1_748_856_600));
    assert_eq!(detail.links[0].link.status, LinkStatus::Posted);
    assert_eq!(detail.links[0].link.sap_grn_doc_entry, Some(9001));
    assert_eq!(detail.links[1].link.status, LinkStatus::Failed);
    assert_eq!(detail.links[1].link.error_message.as_deref(), Some("Warehouse 01 is locked"));

    let again = app.orchestrator.post(&actor, batch.id).await.unwrap_err();
    assert!(matches!(again, GrnFlowError::InvalidState { status: BatchStatus::Completed, .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn every_order_rejected_fails_the_batch() {
    let server = MockServer::start().await;
    mount_login(&server, "sess-1").await;
    mount_purchase_orders(&server).await;
    Mock::given(method("POST"))
        .and(path("/b1s/v1/PurchaseDeliveryNotes"))
        .respond_with(ResponseTemplate::new(400).set_body_json(sap_error("Period is locked")))
        .expect(2)
        .mount(&server)
        .await;

    let app = app(&server);
    let actor = Actor::new(7, UserRole::User);
    let batch = app.wizard.start_batch(&actor, "C-NORTHWIND", "Northwind Traders").await.unwrap();
    let orders = app.wizard.purchase_order_candidates(&actor, batch.id).await.unwrap();
    app.wizard
        .select_purchase_orders(&actor, batch.id, orders.iter().map(NewPoLink::from).collect())
        .await
        .unwrap();
    let submissions = app
        .wizard
        .line_candidates(&actor, batch.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| LineSubmission {
            link_id: c.link.id,
            lines: c.lines.into_iter().map(|line| SubmittedLine { line, quantity: None }).collect(),
        })
        .collect();
    app.wizard.select_lines(&actor, batch.id, submissions).await.unwrap();
    app.wizard.confirm_review(&actor, batch.id).await.unwrap();

    let report = app.orchestrator.post(&actor, batch.id).await.unwrap();

    assert_eq!(report.status, BatchStatus::Failed);
    assert_eq!(report.total_success, 0);
    let detail = app.wizard.view_batch(&actor, batch.id).await.unwrap();
    assert_eq!(detail.batch.status, BatchStatus::Failed);
    assert_eq!(detail.batch.total_grns_created, 0);
    assert!(detail.links.iter().all(|l| l.link.status == LinkStatus::Failed));
}

#[tokio::test]
async fn viewer_role_is_denied_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/b1s/v1/Login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = app(&server);
    let viewer = Actor::new(9, UserRole::Viewer);

    let err = app.wizard.customers(&viewer).await.unwrap_err();
    assert!(matches!(err, GrnFlowError::AccessDenied(_)));
    assert!(app.wizard.list_batches(&Actor::new(7, UserRole::User)).await.unwrap().is_empty());
}
