//! SAP Business One Service Layer client
use std::time::Duration;

use async_trait::async_trait;
use grnflow_core::ErpGateway;
use grnflow_domain::constants::ERP_CONNECT_TIMEOUT_SECS;
use grnflow_domain::{
    CreatedDocument, Customer, DeliveryNote, ErpConfig, GrnFlowError, PartnerType, PurchaseOrder,
    Result,
};
use reqwest::header::COOKIE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::session::SessionCache;
use super::wire::{
    error_message, odata_literal, BusinessPartnerRow, CreatedDocumentRow, LoginRequest,
    LoginResponse, ODataList, PurchaseOrderRow,
};
use crate::errors::InfraError;
use crate::http::HttpClient;

const SERVICE_ROOT: &str = "b1s/v1";
const PARTNER_FIELDS: &str = "CardCode,CardName";
const ORDER_FIELDS: &str =
    "DocEntry,DocNum,CardCode,CardName,DocDate,DocDueDate,DocTotal,DocumentStatus,DocumentLines";

/// Gateway to the SAP B1 Service Layer.
///
/// Holds one lazily created session shared by all callers. Every operation
/// that receives `401 Unauthorized` drops the session, logs in again and
/// repeats the request exactly once.
pub struct ServiceLayerClient {
    config: ErpConfig,
    http: HttpClient,
    session: SessionCache,
}

struct Credentials<'a> {
    base_url: &'a str,
    username: &'a str,
    password: &'a str,
    company_db: &'a str,
}

impl ServiceLayerClient {
    /// Create a client. Credentials are only checked when a login is needed.
    pub fn new(config: ErpConfig) -> Result<Self> {
        if !config.verify_ssl {
            warn!("SAP B1 TLS certificate verification is DISABLED");
        }

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .connect_timeout(Duration::from_secs(ERP_CONNECT_TIMEOUT_SECS))
            .accept_invalid_certs(!config.verify_ssl)
            .build()?;

        Ok(Self { config, http, session: SessionCache::default() })
    }

    /// Log in now and replace any cached session.
    ///
    /// # Errors
    /// `Config` when connection parameters are missing, `Auth` when the
    /// Service Layer rejects the credentials, `Connectivity` on transport
    /// failure.
    pub async fn authenticate(&self) -> Result<()> {
        let session_id = self.login().await?;
        self.session.store(session_id).await;
        Ok(())
    }

    /// Current session id, logging in first when there is none.
    pub async fn ensure_session(&self) -> Result<String> {
        self.session.get_or_login(|| self.login()).await
    }

    fn credentials(&self) -> Result<Credentials<'_>> {
        let missing = self.config.missing_fields();
        if !missing.is_empty() {
            warn!(missing = ?missing, "SAP B1 configuration incomplete");
            return Err(GrnFlowError::Config(format!(
                "SAP B1 connection parameters missing: {}",
                missing.join(", ")
            )));
        }

        Ok(Credentials {
            base_url: field(&self.config.base_url),
            username: field(&self.config.username),
            password: field(&self.config.password),
            company_db: field(&self.config.company_db),
        })
    }

    fn url(&self, base_url: &str, resource: &str) -> String {
        format!("{}/{SERVICE_ROOT}/{resource}", base_url.trim_end_matches('/'))
    }

    async fn login(&self) -> Result<String> {
        let creds = self.credentials()?;
        let body = LoginRequest {
            user_name: creds.username,
            password: creds.password,
            company_db: creds.company_db,
        };

        let request = self.http.request(Method::POST, self.url(creds.base_url, "Login")).json(&body);
        let response = self.http.send(request).await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), company_db = creds.company_db, "SAP B1 login failed");
            return Err(GrnFlowError::Auth(format!(
                "SAP B1 login rejected (HTTP {}): {}",
                status.as_u16(),
                error_message(&text)
            )));
        }

        let login: LoginResponse = parse_json(response).await?;
        info!(company_db = creds.company_db, "SAP B1 login successful");
        Ok(login.session_id)
    }

    /// Send a request with the session cookie, re-logging in once on 401.
    async fn execute<F>(&self, operation: &'static str, build: F) -> Result<Response>
    where
        F: Fn(&HttpClient, &str) -> RequestBuilder,
    {
        let base_url = self.credentials()?.base_url;
        let session = self.ensure_session().await?;
        let response = self.http.send(with_session(build(&self.http, base_url), &session)).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!(operation, "SAP B1 session rejected, logging in again");
        self.session.invalidate(&session).await;
        let session = self.ensure_session().await?;
        let response = self.http.send(with_session(build(&self.http, base_url), &session)).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            self.session.invalidate(&session).await;
            warn!(operation, "SAP B1 still unauthorized after re-login");
            return Err(GrnFlowError::Auth(format!("{operation}: unauthorized after re-login")));
        }
        Ok(response)
    }

    /// GET an OData collection with the whole result set on one page.
    async fn query<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        resource: &'static str,
        filter: &str,
        select: &'static str,
    ) -> Result<Vec<T>> {
        let response = self
            .execute(operation, |http, base_url| {
                http.request(Method::GET, self.url(base_url, resource))
                    .query(&[("$filter", filter), ("$select", select)])
                    .header("Prefer", "odata.maxpagesize=0")
            })
            .await?;

        let response = ensure_status(response, StatusCode::OK, operation).await?;
        let list: ODataList<T> = parse_json(response).await?;
        Ok(list.value)
    }
}

#[async_trait]
impl ErpGateway for ServiceLayerClient {
    async fn fetch_valid_customers(&self) -> Result<Vec<Customer>> {
        let rows: Vec<BusinessPartnerRow> = self
            .query("fetch customers", "BusinessPartners", "Valid eq 'tYES'", PARTNER_FIELDS)
            .await?;

        let mut customers: Vec<Customer> = rows.into_iter().map(Customer::from).collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name));
        info!(count = customers.len(), "fetched valid customers");
        Ok(customers)
    }

    async fn fetch_business_partners(&self, partner_type: PartnerType) -> Result<Vec<Customer>> {
        let filter = format!("Valid eq 'tYES' and CardType eq '{}'", partner_type.card_type());
        let rows: Vec<BusinessPartnerRow> = self
            .query("fetch business partners", "BusinessPartners", &filter, PARTNER_FIELDS)
            .await?;

        info!(count = rows.len(), card_type = partner_type.card_type(), "fetched business partners");
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn fetch_open_purchase_orders(&self, customer_code: &str) -> Result<Vec<PurchaseOrder>> {
        let filter = format!(
            "CardCode eq '{}' and DocumentStatus eq 'bost_Open'",
            odata_literal(customer_code)
        );
        let rows: Vec<PurchaseOrderRow> =
            self.query("fetch purchase orders", "PurchaseOrders", &filter, ORDER_FIELDS).await?;

        let fetched = rows.len();
        let orders: Vec<PurchaseOrder> =
            rows.into_iter().filter_map(PurchaseOrderRow::into_open_order).collect();
        info!(customer_code, fetched, open = orders.len(), "fetched open purchase orders");
        Ok(orders)
    }

    async fn create_delivery_note(&self, note: &DeliveryNote) -> Result<CreatedDocument> {
        let timeout = Duration::from_secs(self.config.create_timeout_secs);
        let response = self
            .execute("create delivery note", |http, base_url| {
                http.request(Method::POST, self.url(base_url, "PurchaseDeliveryNotes"))
                    .timeout(timeout)
                    .json(note)
            })
            .await?;

        let response = ensure_status(response, StatusCode::CREATED, "create delivery note").await?;
        let created: CreatedDocumentRow = parse_json(response).await?;
        info!(
            doc_num = created.doc_num,
            doc_entry = created.doc_entry,
            num_at_card = %note.num_at_card,
            "delivery note created in SAP B1"
        );
        Ok(CreatedDocument { doc_entry: created.doc_entry, doc_num: created.doc_num })
    }
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

fn with_session(request: RequestBuilder, session_id: &str) -> RequestBuilder {
    request.header(COOKIE, format!("B1SESSION={session_id}"))
}

/// Turn any status other than `expected` into an `Erp` error carrying the
/// Service Layer's message.
async fn ensure_status(
    response: Response,
    expected: StatusCode,
    operation: &'static str,
) -> Result<Response> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    warn!(operation, status = status.as_u16(), error = %message, "SAP B1 request failed");
    Err(GrnFlowError::Erp { status: status.as_u16(), message })
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let parsed = response.json::<T>().await.map_err(|err| GrnFlowError::from(InfraError::from(err)));
    if let Err(err) = &parsed {
        debug!(error = %err, "could not decode SAP B1 response");
    }
    parsed
}
