//! Plain data records consumed by the report composers. Fields arrive
//! display-ready: dates, folios and statuses are already formatted strings,
//! only amounts stay numeric so the composers can total and format them.

/// Issuing company identity shared by every document. The logo is an image
/// payload (data URI or bare base64), embedded when present.
#[derive(Debug, Clone, Default)]
pub struct CompanyConfig {
    pub name: String,
    pub tax_id: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub logo: Option<String>,
}

/// One billable line of an invoice.
#[derive(Debug, Clone, Default)]
pub struct InvoiceConcept {
    pub description: String,
    pub quantity: String,
    pub unit_price: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceData {
    pub folio: String,
    pub date: String,
    pub client_name: String,
    pub client_tax_id: String,
    pub client_address: String,
    pub concepts: Vec<InvoiceConcept>,
    pub subtotal: f64,
    /// Tax percentage over the subtotal, e.g. 16 for 16%.
    pub tax_rate: f64,
    pub notes: Option<String>,
}

/// Field report for a single crane service. Signature payloads are optional;
/// missing ones render the placeholder.
#[derive(Debug, Clone, Default)]
pub struct ServiceReportData {
    pub folio: String,
    pub date: String,
    pub client_name: String,
    pub service_type: String,
    pub crane: String,
    pub operator_name: String,
    pub location: String,
    pub maneuver_description: String,
    pub status: String,
    pub operator_signature: Option<String>,
    pub client_signature: Option<String>,
}

/// Periodic crane inspection. Checklist entries arrive pre-formatted
/// ("Frenos: OK"); photos are image payloads in capture order.
#[derive(Debug, Clone, Default)]
pub struct InspectionData {
    pub folio: String,
    pub date: String,
    pub crane: String,
    pub inspector_name: String,
    pub responsible_name: String,
    pub result: String,
    pub checklist: Vec<String>,
    pub photos: Vec<String>,
    pub observations: String,
    pub inspector_signature: Option<String>,
    pub responsible_signature: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientRow {
    pub name: String,
    pub contact: String,
    pub phone: String,
    pub email: String,
    pub status: String,
}

#[derive(Debug, Clone, Default)]
pub struct ClientsReportData {
    pub period: String,
    pub clients: Vec<ClientRow>,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceRow {
    pub folio: String,
    pub date: String,
    pub client: String,
    pub service_type: String,
    pub crane: String,
    pub status: String,
}

#[derive(Debug, Clone, Default)]
pub struct ServicesReportData {
    pub period: String,
    pub services: Vec<ServiceRow>,
}

/// One month of the financial breakdown; margin is derived at compose time.
#[derive(Debug, Clone, Default)]
pub struct MonthlyBreakdownRow {
    pub month: String,
    pub income: f64,
    pub costs: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FinancialReportData {
    pub period: String,
    pub income: f64,
    pub costs: f64,
    pub monthly: Vec<MonthlyBreakdownRow>,
}

#[derive(Debug, Clone, Default)]
pub struct OperatorRow {
    pub name: String,
    pub license: String,
    pub license_expiry: String,
    pub status: String,
}

#[derive(Debug, Clone, Default)]
pub struct OperatorsReportData {
    pub period: String,
    pub operators: Vec<OperatorRow>,
}

#[derive(Debug, Clone, Default)]
pub struct CraneRow {
    pub unit: String,
    pub model: String,
    pub capacity: String,
    pub status: String,
}

#[derive(Debug, Clone, Default)]
pub struct CranesReportData {
    pub period: String,
    pub cranes: Vec<CraneRow>,
}
