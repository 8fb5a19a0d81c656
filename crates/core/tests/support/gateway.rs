//! Scripted `ErpGateway`

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use grnflow_core::ErpGateway;
use grnflow_domain::{
    CreatedDocument, Customer, DeliveryNote, PartnerType, PurchaseOrder, Result as DomainResult,
};
use tokio::sync::Notify;

/// Serves canned master data and replays scripted delivery-note results.
///
/// Unscripted creations succeed with sequential document numbers starting
/// at 5001.
#[derive(Default)]
pub struct ScriptedErp {
    pub customers: Vec<Customer>,
    pub suppliers: Vec<Customer>,
    pub purchase_orders: Vec<PurchaseOrder>,
    create_results: Mutex<VecDeque<DomainResult<CreatedDocument>>>,
    created: Mutex<Vec<DeliveryNote>>,
    partner_calls: AtomicUsize,
    order_calls: AtomicUsize,
    pause: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl ScriptedErp {
    pub fn with_orders(purchase_orders: Vec<PurchaseOrder>) -> Self {
        Self { purchase_orders, ..Self::default() }
    }

    /// Queue the result of the next `create_delivery_note` call.
    pub fn then_create(self, result: DomainResult<CreatedDocument>) -> Self {
        self.create_results.lock().unwrap().push_back(result);
        self
    }

    /// Block every creation: `entered` fires on arrival, then it waits for `release`.
    pub fn paused(mut self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.pause = Some((entered, release));
        self
    }

    pub fn created_notes(&self) -> Vec<DeliveryNote> {
        self.created.lock().unwrap().clone()
    }

    pub fn partner_calls(&self) -> usize {
        self.partner_calls.load(Ordering::SeqCst)
    }

    pub fn order_calls(&self) -> usize {
        self.order_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ErpGateway for ScriptedErp {
    async fn fetch_valid_customers(&self) -> DomainResult<Vec<Customer>> {
        self.partner_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.customers.clone())
    }

    async fn fetch_business_partners(
        &self,
        partner_type: PartnerType,
    ) -> DomainResult<Vec<Customer>> {
        self.partner_calls.fetch_add(1, Ordering::SeqCst);
        Ok(match partner_type {
            PartnerType::Supplier => self.suppliers.clone(),
            PartnerType::Customer => self.customers.clone(),
        })
    }

    async fn fetch_open_purchase_orders(
        &self,
        customer_code: &str,
    ) -> DomainResult<Vec<PurchaseOrder>> {
        self.order_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .purchase_orders
            .iter()
            .filter(|po| po.card_code == customer_code)
            .cloned()
            .collect())
    }

    async fn create_delivery_note(&self, note: &DeliveryNote) -> DomainResult<CreatedDocument> {
        if let Some((entered, release)) = &self.pause {
            entered.notify_one();
            release.notified().await;
        }

        let scripted = self.create_results.lock().unwrap().pop_front();
        let mut created = self.created.lock().unwrap();
        let result = scripted.unwrap_or_else(|| {
            let n = created.len() as i64;
            Ok(CreatedDocument { doc_entry: 9000 + n, doc_num: 5001 + n })
        });
        if result.is_ok() {
            created.push(note.clone());
        }
        result
    }
}
